//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
///
/// A missing API key is accepted; it surfaces as an upstream authorization
/// failure instead.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.upstream.api_base.trim().is_empty() {
        errors.push("upstream.api_base must not be empty".to_string());
    }
    if config.upstream.model.trim().is_empty() {
        errors.push("upstream.model must not be empty".to_string());
    }
    if config.upstream.max_tokens == 0 {
        errors.push("upstream.max_tokens must be > 0".to_string());
    }
    if !(0.0..=2.0).contains(&config.upstream.temperature) {
        errors.push("upstream.temperature must be in [0.0, 2.0]".to_string());
    }

    if config.server.host.trim().is_empty() {
        errors.push("server.host must not be empty".to_string());
    }
    if config.server.port == 0 {
        errors.push("server.port must be > 0".to_string());
    }

    if config.client.relay_url.trim().is_empty() {
        errors.push("client.relay_url must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
