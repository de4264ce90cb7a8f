use log::{error, info, warn};

use pallet_stacker::api;
use pallet_stacker::config::AppConfig;

#[tokio::main]
async fn main() {
    let env_result = dotenvy::dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = env_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();

    info!("🚀 Pallet layout service starting...");
    let AppConfig {
        api: api_config,
        pallet,
        optimizer,
    } = app_config;
    if let Err(err) = api::start_api_server(api_config, pallet, optimizer).await {
        error!("❌ Server stopped: {}", err);
        std::process::exit(1);
    }
}
