//! Cart session identity, kept independent of any transport.
//!
//! The client carries its cart id as an opaque token. The service only ever
//! receives the token as a parameter and hands back a [`SessionGrant`] when a
//! new one must be stored client side; translating grants into cookies is the
//! web layer's job.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use myshop_core::config::CartConfig;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session expiry overflows: {issued_at} + {ttl_hours}h")]
    ExpiryOutOfRange { issued_at: DateTime<Utc>, ttl_hours: i64 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionPolicy {
    pub name: String,
    pub ttl: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self { name: "eCommerceCart".to_string(), ttl: Duration::days(1) }
    }
}

impl SessionPolicy {
    pub fn from_config(config: &CartConfig) -> Self {
        Self {
            name: config.session_name.clone(),
            ttl: Duration::hours(i64::from(config.session_ttl_hours)),
        }
    }

    pub fn grant(
        &self,
        token: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<SessionGrant, SessionError> {
        let expires_at = now.checked_add_signed(self.ttl).ok_or(SessionError::ExpiryOutOfRange {
            issued_at: now,
            ttl_hours: self.ttl.num_hours(),
        })?;
        Ok(SessionGrant { name: self.name.clone(), token: token.into(), expires_at })
    }
}

/// A freshly issued session token the caller must persist client side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionGrant {
    pub name: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Absent and empty tokens are the same thing.
pub(crate) fn token(session: Option<&str>) -> Option<&str> {
    session.filter(|value| !value.is_empty())
}
