//! Clinic Access Service - 服务入口

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config_dir = std::env::var("CLINIC_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    clinic_bootstrap::run(&config_dir, clinic_access::build_app).await?;

    Ok(())
}
