//! Service lifecycle: logging, wiring the analyzer from config, shutdown.

use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::domain::models::AnalysisSource;
use crate::service::fetch::{AuditFetcher, SiteProbe};
use crate::service::{
    AnalysisMode, Analyzer, Auditor, BrowserFetcher, BrowserSettings, HttpPageFetcher,
    LiveAuditor, PageSpeedClient, ResourceChecker, StaggeredAudit, StaticAuditor,
};

/// Initialize logging with tracing_subscriber.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chromiumoxide=warn".parse().unwrap())
                .add_directive("hyper=warn".parse().unwrap())
                .add_directive("sitegrade=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .compact()
        .with_target(false)
        .with_ansi(true)
        .try_init();
}

/// Build the tier chain for the configured mode.
///
/// - Mock: static only
/// - Real: headless browser, then plain HTTP, then static
pub fn build_analyzer(config: &AppConfig) -> anyhow::Result<Arc<Analyzer>> {
    let mode = config.mode();
    let tiers: Vec<Arc<dyn Auditor>> = match mode {
        AnalysisMode::Mock => vec![Arc::new(StaticAuditor)],
        AnalysisMode::Real => {
            let pagespeed = PageSpeedClient::new(
                config.pagespeed_endpoint.clone(),
                config.pagespeed_api_key.clone(),
                config.audit_timeout,
            )
            .context("failed to build audit client")?;
            let audits: Arc<dyn AuditFetcher> =
                Arc::new(StaggeredAudit::new(Arc::new(pagespeed), config.audit_stagger));
            let probe: Arc<dyn SiteProbe> = Arc::new(
                ResourceChecker::new(config.http_timeout).context("failed to build probe client")?,
            );

            let browser = BrowserFetcher::new(BrowserSettings {
                chrome_path: config.chrome_path.clone(),
                navigation_timeout: config.navigation_timeout,
                max_sessions: config.max_concurrency,
                axe_script_url: config.axe_script_url.clone(),
            });
            let http = HttpPageFetcher::new(config.http_timeout)
                .context("failed to build page client")?;

            if config.pagespeed_api_key.is_none() {
                log::warn!("[ANALYZER] PAGESPEED_API_KEY not set; audit calls may be rate limited");
            }

            vec![
                Arc::new(LiveAuditor::new(
                    Arc::new(browser),
                    audits.clone(),
                    probe.clone(),
                    AnalysisSource::Headless,
                )),
                Arc::new(LiveAuditor::new(
                    Arc::new(http),
                    audits,
                    probe,
                    AnalysisSource::Api,
                )),
                Arc::new(StaticAuditor),
            ]
        }
    };

    log::info!(
        "[ANALYZER] {} mode with {} tier(s), concurrency {}",
        mode.as_str(),
        tiers.len(),
        config.max_concurrency
    );
    Ok(Arc::new(Analyzer::new(tiers, mode, config.max_concurrency)))
}

/// Resolves on Ctrl-C (and SIGTERM on unix).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutdown signal received");
}

/// Gracefully shutdown long-lived services.
pub async fn shutdown_services(analyzer: &Analyzer) {
    log::info!("Shutting down services...");
    analyzer.shutdown().await;
    log::info!("Services shut down");
}
