//! Bearer token authentication.
//!
//! Tokens are HS256 JWTs minted by the platform's identity provider. The
//! `sub` claim is the student id and scopes every query.

use crate::AppState;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

#[derive(Clone)]
pub struct JwtVerifier {
    inner: Arc<JwtKeys>,
}

struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: Option<String>,
}

impl JwtVerifier {
    pub fn new(secret: &str, issuer: Option<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        if let Some(iss) = &issuer {
            validation.set_issuer(&[iss]);
        }

        Self {
            inner: Arc::new(JwtKeys {
                encoding_key: EncodingKey::from_secret(secret.as_bytes()),
                decoding_key: DecodingKey::from_secret(secret.as_bytes()),
                validation,
                issuer,
            }),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.inner.decoding_key, &self.inner.validation)?;
        Ok(data.claims)
    }

    /// Mint a token for `student_id`. Used by local tooling and tests.
    pub fn issue(
        &self,
        student_id: Uuid,
        email: Option<String>,
        ttl_seconds: i64,
    ) -> Result<String, AppError> {
        let claims = Claims {
            sub: student_id,
            exp: Utc::now().timestamp() + ttl_seconds,
            email,
            iss: self.inner.issuer.clone(),
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.inner.encoding_key,
        )?)
    }
}

/// Middleware to require a valid bearer token.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })?;

    let claims = state.jwt.verify(token.trim()).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token"))
    })?;

    // Store claims in request extensions so handlers can access them
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extractor for the authenticated student.
#[derive(Debug, Clone)]
pub struct AuthStudent(pub Claims);

impl AuthStudent {
    pub fn id(&self) -> Uuid {
        self.0.sub
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthStudent
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<Claims>().ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Auth claims missing from request"))
        })?;

        Ok(AuthStudent(claims.clone()))
    }
}
