use std::cell::Cell;
use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::config::SUBMIT_THROTTLE_MS;
use crate::contact::sanitize::sanitize;
use crate::error::FormError;

pub const ALLOWED_FIELDS: &[&str] = &[
    "name",
    "email",
    "phone",
    "message",
    "subject",
    "company",
    "access_key",
];
pub const REQUIRED_FIELDS: &[&str] = &["name", "email", "message"];
/// Hidden input real visitors never fill in.
pub const HONEYPOT_FIELD: &str = "website";

const MESSAGE_MIN_CHARS: usize = 10;
const MESSAGE_MAX_CHARS: usize = 1000;
const EMAIL_MAX_CHARS: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactSubmission {
    fields: BTreeMap<String, String>,
}

impl ContactSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: &str) {
        self.fields.insert(field.to_string(), value.to_string());
    }

    pub fn get(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn is_bot(&self) -> bool {
        !self.get(HONEYPOT_FIELD).trim().is_empty()
    }

    /// Allowed fields only, each sanitized.
    pub fn cleaned(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter(|(key, _)| ALLOWED_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), sanitize(value)))
            .collect()
    }

    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let mut fail = |field: &str, message| {
            errors.push(FieldError {
                field: field.to_string(),
                message,
            })
        };

        for &field in REQUIRED_FIELDS {
            if sanitize(self.get(field)).trim().is_empty() {
                fail(field, "This field is required");
            }
        }

        let email = sanitize(self.get("email"));
        if email.chars().count() > EMAIL_MAX_CHARS {
            fail("email", "Please enter a valid email address");
        }

        let message = sanitize(self.get("message"));
        let length = message.chars().count();
        if length > 0 && length < MESSAGE_MIN_CHARS {
            fail("message", "Message must be at least 10 characters long");
        } else if length > MESSAGE_MAX_CHARS {
            fail("message", "Message cannot exceed 1000 characters");
        }

        errors
    }
}

/// Minimum spacing between two sends from the same page.
#[derive(Default)]
pub struct SubmitThrottle {
    last: Cell<Option<DateTime<Utc>>>,
}

impl SubmitThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_throttled(&self, now: DateTime<Utc>) -> bool {
        match self.last.get() {
            Some(last) => now - last < Duration::milliseconds(SUBMIT_THROTTLE_MS),
            None => false,
        }
    }

    pub fn acquire(&self, now: DateTime<Utc>) -> Result<(), FormError> {
        if self.is_throttled(now) {
            return Err(FormError::Throttled);
        }
        self.last.set(Some(now));
        Ok(())
    }
}
