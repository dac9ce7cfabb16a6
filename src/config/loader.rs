use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::ServerConfig;

/// Prefix of environment variables that override file settings, e.g.
/// `STRIDER__PORT=9000` or `STRIDER__LOGGING__JSON=true`.
pub const ENV_PREFIX: &str = "STRIDER";

/// Load configuration from an optional file plus `STRIDER__*` environment
/// variables. Without a file every setting starts from its default.
pub fn load_config(config_path: Option<&str>) -> Result<ServerConfig> {
    let mut builder = Config::builder();

    if let Some(config_path) = config_path {
        let path = Path::new(config_path);
        builder = builder.add_source(File::new(config_path, file_format(path)).required(true));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| match config_path {
            Some(path) => format!("Failed to build config from {path}"),
            None => "Failed to build config from environment".to_string(),
        })?;

    let server_config: ServerConfig = settings
        .try_deserialize()
        .wrap_err("Failed to deserialize server configuration")?;

    Ok(server_config)
}

/// Determine file format based on extension
fn file_format(path: &Path) -> FileFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Toml, // Default to TOML
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_load_toml_config() {
        let toml_content = r#"
host = "127.0.0.1"
port = 9000
debug = false

[dispatch]
max_depth = 16

[logging]
json = true
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config(temp_file.path().to_str()).unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:9000");
        assert!(!config.debug);
        assert_eq!(config.dispatch.max_depth, 16);
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_yaml_config() {
        let yaml_content = r#"
port: 8181
request:
  max_form_bytes: 2048
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = load_config(temp_file.path().to_str()).unwrap();
        assert_eq!(config.port, 8181);
        assert_eq!(config.request.max_form_bytes, 2048);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_config(Some("/nonexistent/strider.toml")).is_err());
    }

    #[test]
    fn test_file_format_by_extension() {
        assert_eq!(file_format(Path::new("a.yml")), FileFormat::Yaml);
        assert_eq!(file_format(Path::new("a.json")), FileFormat::Json);
        assert_eq!(file_format(Path::new("a.conf")), FileFormat::Toml);
    }
}
