use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging. `RUST_LOG` takes precedence over `level` when set.
///
/// `json_format` selects JSON lines with the span list attached; otherwise the
/// pretty console format is used.
pub fn init_tracing_with_config(level: &str, json_format: bool) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            EnvFilter::try_new(level).wrap_err_with(|| format!("Invalid log level: {level}"))?
        }
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if json_format {
        Registry::default()
            .with(env_filter)
            .with(
                fmt_layer
                    .json()
                    .with_current_span(false)
                    .with_span_list(true),
            )
            .try_init()
            .wrap_err("Failed to install JSON tracing subscriber")?;
    } else {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.pretty().with_ansi(true))
            .try_init()
            .wrap_err("Failed to install console tracing subscriber")?;
    }

    tracing::info!(log_level = level, json = json_format, "Strider logging initialized");
    Ok(())
}

/// Create a request-scoped tracing span
pub fn create_request_span(method: &str, path: &str, request_id: &str) -> tracing::Span {
    tracing::info_span!(
        "request",
        http.method = method,
        http.path = path,
        request.id = request_id,
        http.status_code = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_span() {
        let span = create_request_span("GET", "/spam", "req-123");
        // spans are disabled without a subscriber, metadata may be absent
        if let Some(metadata) = span.metadata() {
            assert_eq!(metadata.name(), "request");
        }
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let err = init_tracing_with_config("info,[", false).unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }
}
