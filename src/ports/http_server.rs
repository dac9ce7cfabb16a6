use eyre::Result;

/// HttpServer defines the port (interface) for serving a dispatcher over HTTP
pub trait HttpServer: Send + Sync + 'static {
    /// Run the HTTP server
    ///
    /// # Returns
    /// A future that resolves when the server shuts down or encounters an error
    fn run(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}
