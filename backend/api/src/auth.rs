//! Caller identity — the verified-user boundary of every procedure.
//!
//! Authentication proper (sessions, KYC) terminates upstream of this service;
//! the gateway injects the verified user id as an `x-user-id` header. The
//! extractor resolves that id against the users table on every request, so
//! handlers receive a [`Caller`] whose id and role are known-good.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::db;
use crate::errors::{ApiError, Result};
use crate::AppState;

/// Platform role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Rider,
    Driver,
    Admin,
}

impl UserRole {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rider" => Some(Self::Rider),
            "driver" => Some(Self::Driver),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rider => "rider",
            Self::Driver => "driver",
            Self::Admin => "admin",
        }
    }
}

/// The authenticated caller of the current request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: i64,
    pub role: UserRole,
}

impl Caller {
    /// Admin-only procedures call this first.
    pub fn require_admin(&self) -> Result<()> {
        if self.role == UserRole::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("admin role required".to_string()))
        }
    }

    /// Ownership gate: the caller must be the user in question or an admin.
    pub fn require_self_or_admin(&self, user_id: i64) -> Result<()> {
        if self.id == user_id || self.role == UserRole::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "not authorized for this user's records".to_string(),
            ))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self> {
        let raw = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Forbidden("missing x-user-id header".to_string()))?;

        let id: i64 = raw
            .parse()
            .map_err(|_| ApiError::Forbidden("invalid x-user-id header".to_string()))?;

        let user = db::users::get_user(&state.pool, id)
            .await
            .map_err(|e| match e {
                ApiError::NotFound(_) => ApiError::Forbidden("unknown user".to_string()),
                other => other,
            })?;

        let role = UserRole::parse(&user.role)
            .ok_or_else(|| ApiError::StateParse(format!("unknown user role: {}", user.role)))?;

        Ok(Caller { id: user.id, role })
    }
}
