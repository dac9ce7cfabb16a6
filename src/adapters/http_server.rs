use std::{future::IntoFuture, sync::Arc};

use eyre::{Result, WrapErr};
use tokio::net::TcpListener;

use crate::{
    adapters::http_handler::HttpHandler,
    config::models::ServerConfig,
    ports::http_server::HttpServer,
    utils::graceful_shutdown::GracefulShutdown,
};

/// Serves an [`HttpHandler`] with axum over plain TCP.
pub struct AxumServer {
    handler: Arc<HttpHandler>,
    config: Arc<ServerConfig>,
    shutdown: GracefulShutdown,
}

impl AxumServer {
    pub fn new(handler: Arc<HttpHandler>, config: Arc<ServerConfig>) -> Self {
        let shutdown = GracefulShutdown::with_timeout(std::time::Duration::from_secs(
            config.shutdown_timeout_secs,
        ));
        Self {
            handler,
            config,
            shutdown,
        }
    }

    /// Handle for stopping the server from elsewhere, e.g. a test.
    pub fn shutdown_handle(&self) -> GracefulShutdown {
        self.shutdown.clone()
    }

    /// Serve on an already bound listener until shutdown is triggered.
    ///
    /// In-flight requests get `shutdown_timeout_secs` to finish; connections
    /// still open after that are dropped.
    pub async fn run_with_listener(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener
            .local_addr()
            .wrap_err("Failed to get local addr")?;
        tracing::info!(
            "Strider server starting on {} (debug: {})",
            local_addr,
            self.config.debug
        );

        let app = self.handler.clone().router();
        let graceful_token = self.shutdown.shutdown_token();
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let reason = graceful_token.wait_for_shutdown().await;
                tracing::info!("Shutdown signal received: {:?}", reason);
            })
            .into_future();

        let deadline_token = self.shutdown.shutdown_token();
        let drain_timeout = self.shutdown.shutdown_timeout();
        let deadline = async move {
            deadline_token.wait_for_shutdown().await;
            tokio::time::sleep(drain_timeout).await;
        };

        tokio::select! {
            result = server => {
                result.wrap_err("Server error")?;
                tracing::info!("Strider server on {} stopped", local_addr);
            }
            _ = deadline => {
                tracing::warn!(
                    "Connections still open after {:?}, forcing shutdown",
                    drain_timeout
                );
            }
        }
        Ok(())
    }
}

impl HttpServer for AxumServer {
    async fn run(&self) -> Result<()> {
        let addr = self
            .config
            .socket_addr()
            .wrap_err("Failed to parse listen address")?;
        let listener = TcpListener::bind(addr)
            .await
            .wrap_err_with(|| format!("Failed to bind to address {addr}"))?;

        let signal_handler_shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = signal_handler_shutdown.run_signal_handler().await {
                tracing::error!("Signal handler error: {}", e);
            }
        });

        self.run_with_listener(listener).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        core::{Args, Handler, HandlerResult, Member, Response, RouteTable},
        utils::graceful_shutdown::ShutdownReason,
    };

    struct Ping;

    impl Ping {
        fn pong(&self, _args: &Args) -> HandlerResult {
            Ok(Response::text("pong").into())
        }
    }

    impl Handler for Ping {
        fn routes(table: &mut RouteTable<Self>) {
            table.member(Member::method("pong", Ping::pong).as_default());
        }
    }

    #[tokio::test]
    async fn test_server_stops_when_triggered() {
        let config = Arc::new(ServerConfig {
            shutdown_timeout_secs: 1,
            ..ServerConfig::default()
        });
        let handler = Arc::new(HttpHandler::new(Ping, config.clone()).unwrap());
        let server = Arc::new(AxumServer::new(handler, config));
        let shutdown = server.shutdown_handle();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let task = tokio::spawn({
            let server = server.clone();
            async move { server.run_with_listener(listener).await }
        });

        shutdown.trigger_shutdown(ShutdownReason::Requested).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
