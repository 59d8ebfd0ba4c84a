//! Shared field checks for the configuration domains

use std::fmt::Display;

use crate::error::{ConfigError, ConfigResult};

/// A configuration domain that can check its own fields
pub trait Validatable {
    fn validate(&self) -> ConfigResult<()>;

    /// Name used as the error prefix, e.g. `generate`
    fn domain_name(&self) -> &'static str;

    fn validation_error(&self, message: impl Into<String>) -> ConfigError
    where
        Self: Sized,
    {
        domain_error(self.domain_name(), message)
    }
}

fn domain_error(domain: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::DomainError {
        domain: domain.to_string(),
        message: message.into(),
    }
}

pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(domain_error(domain, format!("{} must not be empty", field_name)));
    }
    Ok(())
}

/// Reject zero and negative values. Durations are checked via `as_millis()`.
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + Display,
{
    if value > T::default() {
        return Ok(());
    }
    Err(domain_error(domain, format!("{} must be positive (got {})", field_name, value)))
}

/// Case-insensitive membership check against a closed set of names
pub fn validate_enum_choice<T>(value: &str, choices: &[T], field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: AsRef<str>,
{
    if choices.iter().any(|c| c.as_ref().eq_ignore_ascii_case(value)) {
        return Ok(());
    }

    let names: Vec<&str> = choices.iter().map(AsRef::as_ref).collect();
    Err(domain_error(
        domain,
        format!("unsupported {} '{}' (expected one of: {})", field_name, value, names.join(", ")),
    ))
}
