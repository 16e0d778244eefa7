//! Request identity.
//!
//! The gateway sits behind the platform's routing and policy layer, which
//! authenticates the caller and injects identity headers before the request
//! reaches us. Two identities exist: a tenant member (headers injected by the
//! fronting layer) and the master key (presented directly, compared in
//! constant time). Endpoints that mutate or enumerate storage are master-only.

use std::sync::Arc;

use assetgate_core::{AppError, ErrorMetadata};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::error::ErrorResponse;

/// Header carrying the master API key.
pub const MASTER_KEY_HEADER: &str = "x-api-key";
/// Tenant namespace, injected by the fronting layer (or sent with the master key).
pub const TENANT_HEADER: &str = "x-gateway-tenant";
/// Acting user id, injected by the fronting layer. Informational only.
pub const ACTOR_HEADER: &str = "x-gateway-actor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayRole {
    Master,
    Member,
}

/// Resolved caller identity, stored in request extensions by the middleware.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub namespace: String,
    pub actor: Option<String>,
    pub role: GatewayRole,
}

impl TenantContext {
    /// Gate for master-only endpoints.
    pub fn require_master(&self) -> Result<(), AppError> {
        match self.role {
            GatewayRole::Master => Ok(()),
            GatewayRole::Member => Err(AppError::Unauthorized(
                "This endpoint requires the master API key".to_string(),
            )),
        }
    }
}

/// Middleware state: the master key loaded at startup.
#[derive(Clone)]
pub struct AuthState {
    pub master_api_key: String,
}

impl AuthState {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let master_api_key = std::env::var("MASTER_API_KEY")
            .map_err(|_| anyhow::anyhow!("MASTER_API_KEY environment variable not set"))?;
        if master_api_key.len() < 32 {
            anyhow::bail!("MASTER_API_KEY must be at least 32 characters long");
        }
        Ok(AuthState { master_api_key })
    }
}

/// Resolve the caller identity from request headers.
pub fn context_from_headers(
    headers: &HeaderMap,
    auth: &AuthState,
) -> Result<TenantContext, AppError> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let namespace = header(TENANT_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing tenant namespace".to_string()))?;
    let actor = header(ACTOR_HEADER);

    if let Some(presented) = header(MASTER_KEY_HEADER) {
        if presented
            .as_bytes()
            .ct_eq(auth.master_api_key.as_bytes())
            .unwrap_u8()
            == 1
        {
            return Ok(TenantContext {
                namespace,
                actor,
                role: GatewayRole::Master,
            });
        }
        return Err(AppError::Unauthorized("Invalid API key".to_string()));
    }

    // No key presented: trust the identity the fronting layer injected.
    match actor {
        Some(actor) => Ok(TenantContext {
            namespace,
            actor: Some(actor),
            role: GatewayRole::Member,
        }),
        None => Err(AppError::Unauthorized("Missing caller identity".to_string())),
    }
}

/// Attach a `TenantContext` to the request or reject it with 401.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match context_from_headers(request.headers(), &auth) {
        Ok(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(err) => {
            tracing::warn!(error = %err, "Rejected unauthenticated request");
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(err.client_message(), err.error_code())),
            )
                .into_response()
        }
    }
}

// Extracted from request parts rather than Extension so handlers taking
// Multipart can still use it.
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new(
                        "Missing tenant context",
                        "unauthorized",
                    )),
                )
            })
    }
}
