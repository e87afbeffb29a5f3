use std::sync::Arc;

use tokio::net::TcpListener;

use mealhub_sdk::MealHub;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::rejections::{NoOpRejectionLog, RejectionLog};
use crate::router::build_router;

/// MealHub HTTP server.
pub struct MealHubServer {
    config: ServerConfig,
    state: AppState,
}

impl MealHubServer {
    pub fn new(config: ServerConfig, hub: MealHub) -> Self {
        Self {
            config,
            state: AppState {
                hub: Arc::new(hub),
                rejections: Arc::new(NoOpRejectionLog),
            },
        }
    }

    /// Record refused write requests in `log`.
    pub fn with_rejection_log(mut self, log: Arc<dyn RejectionLog>) -> Self {
        self.state.rejections = log;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> ServerResult<axum::Router> {
        build_router(self.state.clone(), &self.config)
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router()?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("MealHub server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealhub_sdk::HubConfig;

    #[test]
    fn server_construction() {
        let server = MealHubServer::new(ServerConfig::default(), MealHub::in_memory(&HubConfig::default()));
        assert_eq!(server.config().bind_addr, "127.0.0.1:7071".parse().unwrap());
    }

    #[test]
    fn router_builds() {
        let server = MealHubServer::new(ServerConfig::default(), MealHub::in_memory(&HubConfig::default()));
        assert!(server.router().is_ok());
    }

    #[test]
    fn bad_cors_origin_fails_router() {
        let config = ServerConfig {
            cors_origin: "bad\norigin".into(),
            ..ServerConfig::default()
        };
        let server = MealHubServer::new(config, MealHub::in_memory(&HubConfig::default()));
        assert!(matches!(server.router(), Err(ServerError::Config(_))));
    }
}
