pub mod http_server;
pub mod template;

pub use http_server::HttpServer;
pub use template::{Template, TemplateEnvironment, TemplateVars};
