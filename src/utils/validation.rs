use crate::utils::error::{AggregatorError, Result};
use std::net::SocketAddr;
use url::Url;

/// Placeholder substituted with the pet id in the visits path template.
pub const PET_ID_PLACEHOLDER: &str = "{petId}";

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: &str, reason: impl Into<String>) -> AggregatorError {
    AggregatorError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_http_url(field_name: &str, url_str: &str) -> Result<Url> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(invalid(
            field_name,
            url_str,
            format!("Unsupported URL scheme: {}", scheme),
        )),
    }
}

/// Upstream paths are absolute and replace any path on the base URL, so the
/// base must address the upstream root.
pub fn validate_base_url(field_name: &str, url_str: &str) -> Result<()> {
    let url = parse_http_url(field_name, url_str)?;
    if url.path() != "/" {
        return Err(invalid(
            field_name,
            url_str,
            "Base URL cannot carry a path; put the prefix in owners_path and visits_path",
        ));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid(
            field_name,
            url_str,
            "Base URL cannot carry a query or fragment",
        ));
    }
    Ok(())
}

pub fn validate_socket_addr(field_name: &str, addr: &str) -> Result<()> {
    addr.parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|e| invalid(field_name, addr, format!("Invalid socket address: {}", e)))
}

/// Upstream paths are resolved against the base URL, so they must be absolute.
pub fn validate_upstream_path(field_name: &str, path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(invalid(field_name, path, "Path must start with '/'"));
    }
    if path.chars().any(char::is_whitespace) {
        return Err(invalid(field_name, path, "Path cannot contain whitespace"));
    }
    Ok(())
}

pub fn validate_path_template(field_name: &str, template: &str) -> Result<()> {
    validate_upstream_path(field_name, template)?;
    if !template.contains(PET_ID_PLACEHOLDER) {
        return Err(invalid(
            field_name,
            template,
            format!("Template must contain {}", PET_ID_PLACEHOLDER),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            &value.to_string(),
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

/// An owner id becomes exactly one segment of the upstream path.
pub fn validate_owner_id(owner_id: &str) -> Result<()> {
    let rejected = |reason: &str| AggregatorError::InvalidOwnerId {
        id: owner_id.to_string(),
        reason: reason.to_string(),
    };

    if owner_id.trim().is_empty() {
        return Err(rejected("id cannot be empty"));
    }
    if owner_id == "." || owner_id == ".." {
        return Err(rejected("dot segments are not owner ids"));
    }
    if let Some(c) = owner_id
        .chars()
        .find(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_control())
    {
        return Err(rejected(&format!("character {:?} is not allowed", c)));
    }
    Ok(())
}
