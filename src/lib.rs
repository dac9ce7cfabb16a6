//! Strider - an object-traversal request dispatcher.
//!
//! Strider maps request paths onto a tree of application objects. Each path
//! segment selects a method on the current object; the method either returns a
//! terminal [`Response`] or another object, on which traversal continues with
//! the remaining segments. Only methods explicitly marked traversable can be
//! reached from a URL.
//!
//! # Features
//! - Per-type traversal maps built once from an explicit registration table
//! - Default (index) routes for an exhausted path
//! - Declared parameters bound from query string and form data, with defaults
//! - Catch-all methods that receive every request parameter plus the raw request
//! - `plaintext` / `html` / `json` / `template` response wrappers
//! - axum serving with structured tracing and graceful shutdown
//!
//! # Quick Example
//! ```no_run
//! use strider::{Args, DispatchError, Handler, Member, Param, RouteTable, config::ServerConfig, render};
//!
//! struct Root;
//!
//! impl Root {
//!     fn hello(&self, args: &Args) -> Result<String, DispatchError> {
//!         Ok(format!("Hello, {}!", args.require("name")?))
//!     }
//! }
//!
//! impl Handler for Root {
//!     fn routes(table: &mut RouteTable<Self>) {
//!         table.member(
//!             Member::method("hello", render::plaintext(Root::hello))
//!                 .traversable()
//!                 .param(Param::optional("name").with_default("world")),
//!         );
//!     }
//! }
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! strider::serve(Root, ServerConfig::default()).await
//! # }
//! ```
//!
//! # Architecture
//! Dispatch logic lives in `core` and knows nothing about HTTP. `adapters`
//! connect it to axum, `ports` hold the traits adapters implement.
//!
//! # Error Handling
//! Dispatch failures are [`DispatchError`]s, mapped to status codes at the HTTP
//! boundary. Registration mistakes are [`ConfigError`]s reported at startup.
//! Application level APIs return `eyre::Result<T>`.
//!
//! # Concurrency & Data Structures
//! Traversal maps are cached in an `scc::HashMap` keyed by `TypeId`; dispatch
//! runs on tokio's blocking pool so handlers may block.
use std::sync::Arc;

use eyre::WrapErr;

pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

pub use crate::{
    adapters::{AxumServer, HttpHandler, render},
    core::{
        Args, ConfigError, DispatchError, Dispatcher, FormData, Handler, HandlerResult, Member,
        Outcome, Param, ParamValue, RequestInfo, RequestParams, Resource, Response, RouteMeta,
        RouteTable, TraversalMap,
    },
    ports::http_server::HttpServer,
    utils::GracefulShutdown,
};

/// Serve `root` at `/` on `config.host:config.port` until SIGINT or SIGTERM.
pub async fn serve<R: Resource>(root: R, config: config::ServerConfig) -> eyre::Result<()> {
    let config = Arc::new(config);
    let handler =
        HttpHandler::new(root, config.clone()).wrap_err("Invalid handler registration")?;
    AxumServer::new(Arc::new(handler), config).run().await
}
