//! HTTP service in front of the portal's aggregation endpoints.
//!
//! Returns ready-to-render pieces to the pages:
//! - Chart options for the indicators page, with share and percentage views
//! - Applied-filter panels and search chips as escaped HTML
//! - Search result fragments
//! - The journal profile summary and charts

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::client::PortalClient;
use crate::config::Settings;
use crate::labels::LabelStandardizer;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<PortalClient>,
    pub labels: LabelStandardizer,
    pub default_data_source: String,
    pub chart_width_px: u32,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let client = PortalClient::new(settings)?;

        Ok(Self {
            client: Arc::new(client),
            labels: LabelStandardizer::default(),
            default_data_source: settings.default_data_source.clone(),
            chart_width_px: settings.chart_width_px,
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!(
        "Starting server at http://{} (upstream {})",
        addr,
        settings.base_url
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
