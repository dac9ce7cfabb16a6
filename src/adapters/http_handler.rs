use std::{error::Error as _, sync::Arc, time::Instant};

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::{FromRequest, Multipart, Request},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::any,
};
use bytes::Bytes;
use eyre::WrapErr;
use http_body_util::LengthLimitError;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    config::models::ServerConfig,
    core::{
        ConfigError, DispatchError, Dispatcher, ErrorKind, FormData, Handler, RequestInfo,
        RequestParams, Resource, Response, TraversalMap, split_path,
    },
    tracing_setup::create_request_span,
};

/// Bridges axum requests to the object dispatcher.
pub struct HttpHandler {
    root: Arc<dyn Resource>,
    dispatcher: Dispatcher,
    config: Arc<ServerConfig>,
}

impl HttpHandler {
    /// Wraps `root`, building its traversal map up front so registration
    /// mistakes surface at startup instead of on the first request.
    pub fn new<R: Resource>(root: R, config: Arc<ServerConfig>) -> Result<Self, ConfigError> {
        let root: Arc<dyn Resource> = Arc::new(root);
        let map = root.traversal_map()?;
        tracing::info!(
            "Mounted {} at / with segments {:?}",
            map.type_name(),
            map.traversable_segments()
        );

        Ok(Self {
            root,
            dispatcher: Dispatcher::new(config.dispatch.max_depth),
            config,
        })
    }

    /// Builds the traversal map of a handler type that is only reachable
    /// further down the tree.
    pub fn preload<H: Handler>() -> Result<Arc<TraversalMap>, ConfigError> {
        TraversalMap::for_type::<H>()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Main request handler: dispatch, then map failures to status codes.
    pub async fn handle_request(&self, req: Request<Body>) -> axum::response::Response {
        let request_id = Uuid::new_v4().to_string();
        let span = create_request_span(req.method().as_str(), req.uri().path(), &request_id);
        let start = Instant::now();

        let response = match self.dispatch_request(req).instrument(span.clone()).await {
            Ok(response) => response,
            Err(error) => span.in_scope(|| self.error_response(&error)),
        };

        span.record("http.status_code", response.status().as_u16());
        span.record("duration_ms", start.elapsed().as_millis() as u64);

        let mut response = response.into_response();
        if let Ok(value) = request_id.parse() {
            response.headers_mut().insert("x-request-id", value);
        }
        response
    }

    async fn dispatch_request(&self, req: Request<Body>) -> Result<Response, DispatchError> {
        let (parts, body) = req.into_parts();
        let path = parts.uri.path().to_string();
        tracing::info!("Handling {} request to {}", parts.method, path);

        let form = match form_encoding(&parts.headers) {
            Some(FormEncoding::Urlencoded) => self.read_form(body).await?,
            Some(FormEncoding::Multipart(content_type)) => {
                self.read_multipart(content_type, body).await?
            }
            None => FormData::new(),
        };

        let segments = split_path(&path)?;
        let request = RequestInfo::new(
            parts.method,
            path,
            parts.uri.query().map(str::to_string),
            parts.headers,
            form,
        );
        let params = RequestParams::from_request(request);

        let root = self.root.clone();
        let dispatcher = self.dispatcher;
        let span = tracing::Span::current();
        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            dispatcher.dispatch(root.as_ref(), &segments, &params)
        })
        .await
        .wrap_err("Dispatch task failed")?
    }

    /// Buffers a form body, refusing anything over `request.max_form_bytes`.
    async fn read_body(&self, body: Body) -> Result<Bytes, DispatchError> {
        let limit = self.config.request.max_form_bytes;
        to_bytes(body, limit).await.map_err(|e| {
            let inner = e.into_inner();
            if inner.downcast_ref::<LengthLimitError>().is_some() {
                DispatchError::status(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!("Form body exceeds {limit} bytes"),
                )
            } else {
                DispatchError::bad_request(format!("Failed to read form body: {inner}"))
            }
        })
    }

    async fn read_form(&self, body: Body) -> Result<FormData, DispatchError> {
        let bytes = self.read_body(body).await?;
        Ok(FormData::from_urlencoded(&bytes))
    }

    /// Collects the text fields of a multipart body. File parts are skipped.
    async fn read_multipart(
        &self,
        content_type: HeaderValue,
        body: Body,
    ) -> Result<FormData, DispatchError> {
        let bytes = self.read_body(body).await?;
        let mut request = Request::new(Body::from(bytes));
        request
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);

        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| DispatchError::status(e.status(), e.body_text()))?;

        let mut form = FormData::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| DispatchError::status(e.status(), e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if field.file_name().is_some() {
                tracing::debug!("Skipping file part \"{}\" of multipart form", name);
                continue;
            }
            let value = field
                .text()
                .await
                .map_err(|e| DispatchError::status(e.status(), e.body_text()))?;
            form.push(name, value);
        }
        Ok(form)
    }

    fn error_response(&self, error: &DispatchError) -> Response {
        match error.kind() {
            ErrorKind::NotFound => {
                tracing::info!("404 Not Found: {}", error);
                Response::text("Not Found").with_status(StatusCode::NOT_FOUND)
            }
            ErrorKind::BadRequest => {
                tracing::info!("400 Bad Request: {}", error);
                Response::text(error.to_string()).with_status(StatusCode::BAD_REQUEST)
            }
            ErrorKind::Status(status) => {
                tracing::info!("{} returned by handler: {}", status, error);
                let body = match error {
                    DispatchError::Status { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                Response::text(body).with_status(status)
            }
            ErrorKind::Internal => {
                tracing::error!("Request handling error: {:?}", error);
                let body = if self.config.debug {
                    format!("Internal Server Error\n\n{}", error_chain(error))
                } else {
                    "Internal Server Error".to_string()
                };
                Response::text(body).with_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Axum router sending every path and method to this handler.
    pub fn router(self: Arc<Self>) -> Router {
        let make_request_route = |handler: Arc<HttpHandler>| {
            any(move |req: Request| {
                let handler = handler.clone();
                async move { handler.handle_request(req).await }
            })
        };

        Router::new()
            .route("/", make_request_route(self.clone()))
            .route("/{*path}", make_request_route(self))
            .layer(TraceLayer::new_for_http())
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let (status, headers, body) = self.into_parts();
        (status, headers, body).into_response()
    }
}

enum FormEncoding {
    Urlencoded,
    Multipart(HeaderValue),
}

/// Form encoding of the body, if any. Media types compare case-insensitively.
fn form_encoding(headers: &HeaderMap) -> Option<FormEncoding> {
    let value = headers.get(header::CONTENT_TYPE)?;
    let media_type = value.to_str().ok()?.to_ascii_lowercase();
    if media_type.starts_with("application/x-www-form-urlencoded") {
        Some(FormEncoding::Urlencoded)
    } else if media_type.starts_with("multipart/form-data") {
        Some(FormEncoding::Multipart(value.clone()))
    } else {
        None
    }
}

fn error_chain(error: &DispatchError) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str(&format!("\nCaused by: {cause}"));
        source = cause.source();
    }
    chain
}
