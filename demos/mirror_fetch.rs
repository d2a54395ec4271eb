use b3_scraper::mirror;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("info,b3_scraper=debug")
        .init();

    let setor = std::env::var("B3_SETOR").unwrap_or_else(|_| "IDIV".to_string());

    println!("=== Mirror fetch: {} ===", setor);
    match mirror::get_codigos(&setor).await {
        Ok(codigos) => println!("{} códigos: {:?}", codigos.len(), codigos),
        Err(e) => eprintln!("Code list failed: {}", e),
    }

    match mirror::get_tabela_setor(&setor).await {
        Ok(table) => println!("Tabela: {} linhas", table.rows.len()),
        Err(e) => eprintln!("Table failed: {}", e),
    }

    match mirror::horario_mercado_a_vista().await {
        Ok(hours) => println!("Pregão à vista: {} - {}", hours.inicio, hours.fim),
        Err(e) => eprintln!("Schedule failed: {}", e),
    }
}
