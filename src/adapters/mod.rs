pub mod http_handler;
pub mod http_server;
pub mod render;

/// Re-export commonly used types from adapters
pub use http_handler::HttpHandler;
pub use http_server::AxumServer;
