//! Origin gate: decides whether a cross-origin request may proceed.
//!
//! Responsibility:
//! - Build the allow-list once from configuration (`CORS_ORIGIN`).
//! - Evaluate a request's `Origin` against it (pure, no I/O).
//!
//! The gate knows nothing about axum; `middleware::cors` translates a
//! [`Decision`] into HTTP behavior.

use std::fmt;

use thiserror::Error;
use url::Url;

/// Used when `CORS_ORIGIN` is unset or empty.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Credentialed CORS is a process-wide policy, not a per-request decision.
pub const CREDENTIALS_SUPPORTED: bool = true;

/// Request-path rejection: the origin failed the allow-list check.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("origin not permitted: {origin}")]
pub struct OriginNotPermitted {
    pub origin: String,
}

/// Startup-only: the allow-list resolved to empty. Not fatal.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cors allow-list is empty; every request carrying an Origin header will be denied")]
pub struct ConfigurationDegraded;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    OriginNotPermitted,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::OriginNotPermitted => f.write_str("origin not permitted"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow { credentialed: bool },
    Deny { reason: DenyReason },
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow { .. })
    }

    /// Convert into a `Result` for layers that propagate failures with `?`.
    pub fn into_result(self, origin: Option<&str>) -> Result<(), OriginNotPermitted> {
        match self {
            Decision::Allow { .. } => Ok(()),
            Decision::Deny {
                reason: DenyReason::OriginNotPermitted,
            } => Err(OriginNotPermitted {
                origin: origin.unwrap_or_default().to_string(),
            }),
        }
    }
}

/// Origins allowed to read responses cross-origin (with credentials).
///
/// Entries are trimmed and never empty. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    origins: Vec<String>,
}

impl AllowList {
    /// Parse a comma-separated configuration value.
    ///
    /// - `None` or `""` falls back to [`DEFAULT_ALLOWED_ORIGIN`].
    /// - Anything else is split on `,`, trimmed, and empty segments dropped.
    ///   A value made only of separators yields an empty list.
    pub fn from_config(raw: Option<&str>) -> Self {
        let raw = match raw {
            Some(s) if !s.is_empty() => s,
            _ => DEFAULT_ALLOWED_ORIGIN,
        };

        Self::new(raw.split(','))
    }

    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let origins = origins
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self { origins }
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.origins
    }

    pub fn ensure_usable(&self) -> Result<(), ConfigurationDegraded> {
        if self.is_empty() {
            return Err(ConfigurationDegraded);
        }
        Ok(())
    }

    /// Entries that a browser can never send as an `Origin` header
    /// (paths, trailing slashes, unparsable values). They stay in the list;
    /// this is only used for startup diagnostics.
    pub fn non_origin_entries(&self) -> Vec<&str> {
        self.origins
            .iter()
            .filter(|entry| !is_serialized_origin(entry))
            .map(String::as_str)
            .collect()
    }
}

fn is_serialized_origin(entry: &str) -> bool {
    match Url::parse(entry) {
        Ok(url) => url.origin().ascii_serialization() == entry,
        Err(_) => false,
    }
}

/// Decide whether a request carrying `request_origin` may proceed.
///
/// Requests without an origin (same-origin, curl, server-to-server) always pass.
pub fn evaluate(request_origin: Option<&str>, allow_list: &AllowList) -> Decision {
    match request_origin {
        None => Decision::Allow {
            credentialed: CREDENTIALS_SUPPORTED,
        },
        Some(origin) if allow_list.contains(origin) => Decision::Allow {
            credentialed: CREDENTIALS_SUPPORTED,
        },
        Some(_) => Decision::Deny {
            reason: DenyReason::OriginNotPermitted,
        },
    }
}
