use sitegrade::api::{self, AppState};
use sitegrade::config::AppConfig;
use sitegrade::lifecycle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    lifecycle::init_logging();

    let config = AppConfig::from_env();
    let analyzer = lifecycle::build_analyzer(&config)?;
    let state = AppState::new(analyzer.clone(), config.max_competitors);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    api::serve(listener, state, lifecycle::shutdown_signal()).await?;

    lifecycle::shutdown_services(&analyzer).await;
    Ok(())
}
