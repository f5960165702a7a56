use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::core::{AppError, Result};

/// Authorization tier, ordered from least to most privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Master,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
            Role::Master => write!(f, "master"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "master" => Ok(Role::Master),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// Caller identity resolved by the auth middleware.
///
/// Handlers pull `company_id` out of this and pass it down explicitly;
/// nothing below the controller layer reads request state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub company_id: i64,
    pub user_id: i64,
    pub role: Role,
}

impl TenantContext {
    pub fn new(company_id: i64, user_id: i64, role: Role) -> Self {
        Self {
            company_id,
            user_id,
            role,
        }
    }

    /// Fail with `Forbidden` unless the caller holds at least `required`
    pub fn require_role(&self, required: Role) -> Result<()> {
        if self.role < required {
            return Err(AppError::forbidden(format!(
                "Role '{}' or higher required, caller is '{}'",
                required, self.role
            )));
        }
        Ok(())
    }
}

impl FromRequest for TenantContext {
    type Error = AppError;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let ctx = req
            .extensions()
            .get::<TenantContext>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Missing tenant context"));
        ready(ctx)
    }
}
