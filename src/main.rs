use api_rest::{router, AppState};
use drjira_core::{
    config::{jira_config_from_values, resolve_data_dir},
    CoreConfig, DisabledGateway, FileStore, IssueGateway, JiraGateway, SuggestionService,
    SuggestionStore,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Dr. Jira service
///
/// Serves the REST API (with Swagger UI at `/swagger-ui`) on `DRJIRA_REST_ADDR`.
///
/// # Environment Variables
/// - `DRJIRA_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `DRJIRA_DATA_DIR`: Directory for the key-value store (default: "drjira_data")
/// - `JIRA_BASE_URL`, `JIRA_EMAIL`, `JIRA_API_TOKEN`: Issue tracker credentials; applying
///   suggestions fails until all three are set
/// - `N8N_WEBHOOK_URL`, `WEBTRIGGER_API_KEY`: Default automation workflow URL and bearer token
/// - `DRJIRA_WEBHOOK_API_KEY`: Shared secret required on `/webhook` (optional)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("drjira_run=info".parse()?)
                .add_directive("drjira_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("DRJIRA_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let jira = jira_config_from_values(
        std::env::var("JIRA_BASE_URL").ok(),
        std::env::var("JIRA_EMAIL").ok(),
        std::env::var("JIRA_API_TOKEN").ok(),
    )?;
    let cfg = Arc::new(CoreConfig::new(
        resolve_data_dir(std::env::var("DRJIRA_DATA_DIR").ok()),
        jira,
        std::env::var("N8N_WEBHOOK_URL").ok(),
        std::env::var("WEBTRIGGER_API_KEY").ok(),
        std::env::var("DRJIRA_WEBHOOK_API_KEY").ok(),
    )?);

    let gateway: Arc<dyn IssueGateway> = match cfg.jira() {
        Some(jira) => {
            tracing::info!("issue tracker at {}", jira.base_url());
            Arc::new(JiraGateway::new(jira.clone()))
        }
        None => {
            tracing::warn!("JIRA_BASE_URL/JIRA_EMAIL/JIRA_API_TOKEN not set; apply is disabled");
            Arc::new(DisabledGateway)
        }
    };
    if cfg.automation_url().is_none() {
        tracing::warn!("N8N_WEBHOOK_URL not set; issue events are skipped unless configured via /config");
    }

    let store = FileStore::open(cfg.data_dir())?;
    tracing::info!("++ Using data directory {}", cfg.data_dir().display());

    let service = SuggestionService::new(cfg, SuggestionStore::new(Arc::new(store)), gateway);
    let app = router(AppState::new(service));

    tracing::info!("++ Starting Dr. Jira REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
