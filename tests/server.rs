// Serving over a real TCP socket
use std::{sync::Arc, time::Duration};

use strider::{
    Args, AxumServer, DispatchError, Handler, HttpHandler, Member, Param, RouteTable,
    config::ServerConfig, render, utils::ShutdownReason,
};
use tokio::net::TcpListener;

struct HelloWorld;

impl HelloWorld {
    fn hello(&self, args: &Args) -> Result<String, DispatchError> {
        Ok(format!("Hello, {}!", args.require("name")?))
    }
}

impl Handler for HelloWorld {
    fn routes(table: &mut RouteTable<Self>) {
        table.member(
            Member::method("hello", render::plaintext(HelloWorld::hello))
                .traversable()
                .param(Param::optional("name").with_default("world")),
        );
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_hello_over_tcp() {
    let config = Arc::new(ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        shutdown_timeout_secs: 1,
        ..ServerConfig::default()
    });
    let handler = Arc::new(HttpHandler::new(HelloWorld, config.clone()).unwrap());
    let server = Arc::new(AxumServer::new(handler, config));
    let shutdown = server.shutdown_handle();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn({
        let server = server.clone();
        async move { server.run_with_listener(listener).await }
    });

    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{addr}/hello"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "Hello, world!");

    let response = client
        .get(format!("http://{addr}/hello?name=Daniel"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "Hello, Daniel!");

    let response = client
        .get(format!("http://{addr}/goodbye"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    shutdown.trigger_shutdown(ShutdownReason::Requested).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
