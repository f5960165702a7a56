use crate::core::{AppError, Role, TenantContext};
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use futures_util::future::LocalBoxFuture;
use sqlx::MySqlPool;
use std::future::{ready, Ready};
use std::rc::Rc;

/// Paths served without credentials
const PUBLIC_PATHS: &[&str] = &["/health", "/ready"];

/// API key authentication middleware.
///
/// Expects `X-API-Key: <key_id>.<secret>`. The secret is checked against
/// the argon2 hash stored for `key_id`, and on success a [`TenantContext`]
/// is placed in the request extensions.
pub struct ApiKeyAuth {
    pool: MySqlPool,
}

impl ApiKeyAuth {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyAuthMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyAuthMiddleware {
            service: Rc::new(service),
            pool: self.pool.clone(),
        }))
    }
}

pub struct ApiKeyAuthMiddleware<S> {
    service: Rc<S>,
    pool: MySqlPool,
}

impl<S, B> Service<ServiceRequest> for ApiKeyAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let pool = self.pool.clone();

        Box::pin(async move {
            if PUBLIC_PATHS.contains(&req.path()) {
                return svc.call(req).await;
            }

            let header = req
                .headers()
                .get("X-API-Key")
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| Error::from(AppError::unauthorized("Missing X-API-Key header")))?;

            let (key_id, secret) = split_api_key(header).map_err(Error::from)?;
            let tenant = authenticate(&pool, key_id, secret)
                .await
                .map_err(Error::from)?;

            tracing::debug!(
                key_id = %key_id,
                company_id = tenant.company_id,
                role = %tenant.role,
                "API key accepted"
            );

            req.extensions_mut().insert(tenant);
            svc.call(req).await
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKeyRecord {
    pub key_id: String,
    pub key_hash: String,
    pub company_id: i64,
    pub user_id: i64,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub is_active: bool,
}

/// Split `<key_id>.<secret>`; both halves must be non-empty
pub fn split_api_key(header: &str) -> crate::core::Result<(&str, &str)> {
    match header.split_once('.') {
        Some((key_id, secret)) if !key_id.is_empty() && !secret.is_empty() => {
            Ok((key_id, secret))
        }
        _ => Err(AppError::unauthorized("Malformed API key")),
    }
}

async fn authenticate(
    pool: &MySqlPool,
    key_id: &str,
    secret: &str,
) -> crate::core::Result<TenantContext> {
    let record = sqlx::query_as::<_, ApiKeyRecord>(
        r#"
        SELECT key_id, key_hash, company_id, user_id, role, is_active
        FROM api_keys
        WHERE key_id = ?
        LIMIT 1
        "#,
    )
    .bind(key_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(|| AppError::unauthorized("Invalid API key"))?;

    if !record.is_active {
        return Err(AppError::unauthorized("API key is inactive"));
    }

    if !verify_api_key(secret, &record.key_hash)? {
        tracing::warn!(key_id = %key_id, "API key secret mismatch");
        return Err(AppError::unauthorized("Invalid API key"));
    }

    Ok(TenantContext::new(record.company_id, record.user_id, record.role))
}

/// Hash an API key secret with Argon2 for storage in `api_keys.key_hash`
pub fn hash_api_key(api_key: &str) -> crate::core::Result<String> {
    use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};

    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(api_key.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Failed to hash API key: {}", e)))
}

pub fn verify_api_key(api_key: &str, hash: &str) -> crate::core::Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("Invalid hash format: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(api_key.as_bytes(), &parsed_hash)
        .is_ok())
}
