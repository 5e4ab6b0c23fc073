//! Configuration validation

use crate::Config;
use portico_core::{Error, RateLimit, Result, ServiceEntry};
use std::collections::HashSet;
use url::Url;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_gateway(config)?;
    validate_refresh(config)?;
    validate_services(config)?;
    Ok(())
}

fn validate_gateway(config: &Config) -> Result<()> {
    let gateway = &config.gateway;

    if gateway.public_tag.is_empty() {
        return Err(Error::Config("gateway public_tag cannot be empty".to_string()));
    }
    if gateway.hidden_tag.is_empty() {
        return Err(Error::Config("gateway hidden_tag cannot be empty".to_string()));
    }
    if gateway.hidden_marker.is_empty() {
        return Err(Error::Config("gateway hidden_marker cannot be empty".to_string()));
    }
    if gateway.public_tag.eq_ignore_ascii_case(&gateway.hidden_tag) {
        return Err(Error::Config(
            "gateway public_tag and hidden_tag must differ".to_string(),
        ));
    }
    if gateway.body_limit == 0 {
        return Err(Error::Config("gateway body_limit must be > 0".to_string()));
    }
    if let Some(limit) = &gateway.default_limit {
        validate_limit(limit, "gateway default_limit")?;
    }

    Ok(())
}

fn validate_refresh(config: &Config) -> Result<()> {
    let refresh = &config.refresh;

    if refresh.fetch_concurrency == 0 {
        return Err(Error::Config("refresh fetch_concurrency must be > 0".to_string()));
    }

    if let Some(interval) = refresh.interval {
        if interval.is_zero() {
            return Err(Error::Config("refresh interval must be > 0".to_string()));
        }
        if interval.as_secs() < 1 {
            tracing::warn!(?interval, "Refresh interval is very low (<1s)");
        }
    }

    if refresh.ephemeral_routes_file && refresh.routes_file.is_none() {
        tracing::warn!("ephemeral_routes_file is set but no routes_file is configured");
    }

    if config.http_client.request_timeout.is_zero() {
        return Err(Error::Config("http_client request_timeout must be > 0".to_string()));
    }

    Ok(())
}

fn validate_services(config: &Config) -> Result<()> {
    if config.services.is_empty() {
        return Err(Error::Config("at least one service must be configured".to_string()));
    }

    let mut hosts = HashSet::new();
    for service in &config.services {
        validate_service(service)?;

        if !hosts.insert(service.host.trim_end_matches('/')) {
            return Err(Error::Config(format!(
                "Duplicate service host: {}",
                service.host
            )));
        }
    }

    Ok(())
}

fn validate_service(service: &ServiceEntry) -> Result<()> {
    if service.host.is_empty() {
        return Err(Error::Config("service host cannot be empty".to_string()));
    }

    let url = Url::parse(&service.host)
        .map_err(|e| Error::Config(format!("Invalid service host '{}': {e}", service.host)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "Service host '{}' must use http or https",
            service.host
        )));
    }

    if !service.openapi_url.starts_with('/') {
        return Err(Error::Config(format!(
            "openapi_url of '{}' must start with '/'",
            service.host
        )));
    }

    for (field, tag) in [("tag", &service.tag), ("hidden_tag", &service.hidden_tag)] {
        if tag.as_deref().is_some_and(str::is_empty) {
            return Err(Error::Config(format!(
                "{field} of '{}' cannot be empty",
                service.host
            )));
        }
    }

    if service.body_limit == Some(0) {
        return Err(Error::Config(format!(
            "body_limit of '{}' must be > 0",
            service.host
        )));
    }

    if let Some(limit) = &service.hit_limit {
        validate_limit(limit, &format!("hit_limit of '{}'", service.host))?;
    }

    for (field, prefix) in [
        ("gw_base_url", &service.gw_base_url),
        ("remote_base_url", &service.remote_base_url),
    ] {
        if prefix.as_deref().is_some_and(|p| !p.starts_with('/')) {
            return Err(Error::Config(format!(
                "{field} of '{}' must start with '/'",
                service.host
            )));
        }
    }

    Ok(())
}

fn validate_limit(limit: &RateLimit, what: &str) -> Result<()> {
    if limit.max == 0 {
        return Err(Error::Config(format!("{what} max must be > 0")));
    }
    if limit.time_window.is_zero() {
        return Err(Error::Config(format!("{what} time_window must be > 0")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn minimal_config() -> Config {
        Config {
            gateway: Default::default(),
            refresh: Default::default(),
            http_client: Default::default(),
            services: vec![ServiceEntry::new("http://users:3000")],
            observability: Default::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&minimal_config()).is_ok());
    }

    #[test]
    fn test_no_services() {
        let mut config = minimal_config();
        config.services.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_host() {
        let mut config = minimal_config();
        config.services[0].host = "users:3000/api".to_string();
        assert!(validate_config(&config).is_err());

        config.services[0].host = "ftp://users".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_duplicate_hosts() {
        let mut config = minimal_config();
        config.services.push(ServiceEntry::new("http://users:3000/"));
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_openapi_url_must_be_absolute_path() {
        let mut config = minimal_config();
        config.services[0].openapi_url = "open-api/json".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_tag_override() {
        let mut config = minimal_config();
        config.services[0].hidden_tag = Some(String::new());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_limits() {
        let mut config = minimal_config();
        config.services[0].hit_limit = Some(RateLimit::per_minute(0));
        assert!(validate_config(&config).is_err());

        let mut config = minimal_config();
        config.gateway.default_limit = Some(RateLimit {
            max: 10,
            time_window: Duration::ZERO,
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_refresh_settings() {
        let mut config = minimal_config();
        config.refresh.fetch_concurrency = 0;
        assert!(validate_config(&config).is_err());

        let mut config = minimal_config();
        config.refresh.interval = Some(Duration::ZERO);
        assert!(validate_config(&config).is_err());

        let mut config = minimal_config();
        config.refresh.ephemeral_routes_file = true;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_same_public_and_hidden_tag() {
        let mut config = minimal_config();
        config.gateway.hidden_tag = "PUBLIC-API".to_string();
        assert!(validate_config(&config).is_err());
    }
}
