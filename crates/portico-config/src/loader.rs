//! Configuration loading

use crate::{Config, ConfigFormat};
use portico_core::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::Path;

/// Load configuration from a file
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    let content = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file '{}': {e}", path.display()))
    })?;

    let format = ConfigFormat::from_path(path)?;

    load_from_str(&content, format)
}

/// Expand environment variables in a configuration string.
/// Supports `${VAR}` and `${VAR:-default}`.
fn expand_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}")
        .map_err(|e| Error::Config(format!("Invalid regex: {e}")))?;

    let mut result = String::with_capacity(content.len());
    let mut last_match = 0;

    for cap in re.captures_iter(content) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let var_name = var_name.as_str();
        let default_value = cap.get(3).map(|m| m.as_str());

        let value = match (env::var(var_name), default_value) {
            (Ok(val), _) => val,
            (Err(_), Some(default)) => default.to_string(),
            (Err(_), None) => {
                return Err(Error::Config(format!(
                    "Environment variable '{var_name}' not set and no default provided"
                )));
            }
        };

        result.push_str(&content[last_match..full_match.start()]);
        result.push_str(&value);
        last_match = full_match.end();
    }

    result.push_str(&content[last_match..]);

    Ok(result)
}

/// Load configuration from a string
pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<Config> {
    let expanded_content = expand_env_vars(content)?;

    let config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse YAML: {e}")))?,
        ConfigFormat::Toml => toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {e}")))?,
        ConfigFormat::Json => serde_json::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse JSON: {e}")))?,
    };

    Ok(config)
}

/// Load and validate configuration
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config = load_from_file(path)?;
    crate::validator::validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    const YAML_CONFIG: &str = r#"
gateway:
  public_tag: "gateway"
  ignore_hidden: true
  default_limit:
    max: 3000

refresh:
  interval: "30s"
  routes_file: "routes.json"

http_client:
  request_timeout: "5s"

services:
  - host: "http://users:3000"
    gw_base_url: "/users/"
    hit_limit:
      max: 10
      time_window: "10s"
  - host: "http://orders:3000"
    openapi_url: "/docs/json"
    tag: "orders-public"

observability:
  logging:
    level: "debug"
    format: "json"
"#;

    #[test]
    fn test_load_yaml() {
        let config = load_from_str(YAML_CONFIG, ConfigFormat::Yaml).unwrap();

        assert_eq!(config.gateway.public_tag, "gateway");
        assert!(config.gateway.ignore_hidden);
        assert_eq!(
            config.gateway.default_limit.unwrap().time_window,
            Duration::from_secs(60)
        );
        assert_eq!(config.refresh.interval, Some(Duration::from_secs(30)));
        assert_eq!(config.http_client.request_timeout, Duration::from_secs(5));
        assert_eq!(config.services.len(), 2);
        assert_eq!(
            config.services[0].hit_limit.unwrap().time_window,
            Duration::from_secs(10)
        );
        assert_eq!(config.services[1].openapi_url, "/docs/json");
        assert_eq!(config.services[1].tag.as_deref(), Some("orders-public"));
        assert_eq!(config.observability.logging.format, crate::LogFormat::Json);
    }

    #[test]
    fn test_load_toml() {
        let content = r#"
[refresh]
fetch_concurrency = 2

[[services]]
host = "http://users:3000"
require_auth = true
"#;
        let config = load_from_str(content, ConfigFormat::Toml).unwrap();
        assert_eq!(config.refresh.fetch_concurrency, 2);
        assert_eq!(config.services[0].require_auth, Some(true));
    }

    #[test]
    fn test_invalid_yaml() {
        let result = load_from_str("services: [yaml", ConfigFormat::Yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        env::set_var("PORTICO_TEST_USERS_HOST", "users.internal");
        env::set_var("PORTICO_TEST_USERS_PORT", "9090");

        let content = r#"
services:
  - host: "http://${PORTICO_TEST_USERS_HOST}:${PORTICO_TEST_USERS_PORT}"
"#;
        let config = load_from_str(content, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.services[0].host, "http://users.internal:9090");

        env::remove_var("PORTICO_TEST_USERS_HOST");
        env::remove_var("PORTICO_TEST_USERS_PORT");
    }

    #[test]
    fn test_env_var_with_default() {
        env::remove_var("PORTICO_TEST_UNDEFINED");

        let content = r#"
refresh:
  interval: "${PORTICO_TEST_UNDEFINED:-2m}"
"#;
        let config = load_from_str(content, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.refresh.interval, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_missing_env_var_no_default() {
        env::remove_var("PORTICO_TEST_MISSING");

        let result = load_from_str("services: ${PORTICO_TEST_MISSING}", ConfigFormat::Yaml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("PORTICO_TEST_MISSING"));
    }

    #[test]
    fn test_expand_without_variables_is_identity() {
        let content = "gateway:\n  body_limit: 10\n";
        assert_eq!(expand_env_vars(content).unwrap(), content);
    }

    #[test]
    fn test_load_config_from_file_validates() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(b"services:\n  - host: \"http://users:3000\"\n").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.services.len(), 1);

        let mut empty = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        empty.write_all(b"services: []\n").unwrap();
        assert!(load_config(empty.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = load_from_file("/nonexistent/portico.yaml");
        assert!(result.unwrap_err().to_string().contains("portico.yaml"));
    }
}
