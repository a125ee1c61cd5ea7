//! Request body validation
//!
//! Handlers collect every failing field into a [`Validator`] and reject the
//! request once, so clients see all problems at the same time.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ApiError, FieldError};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("valid regex")
});

/// Trimmed, lower-cased email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Absolute `http`/`https` URL with a host
pub fn is_http_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some(),
        Err(_) => false,
    }
}

/// Accumulates field errors
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `field` unless `ok`
    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    /// Field must be present and non-blank
    pub fn required(&mut self, value: Option<&str>, field: &str, message: &str) -> &mut Self {
        let present = value.map(|v| !v.trim().is_empty()).unwrap_or(false);
        self.check(present, field, message)
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}
