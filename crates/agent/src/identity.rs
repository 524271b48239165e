use std::time::Duration;

use async_trait::async_trait;
use cartscout_core::config::IdentityConfig;
use cartscout_core::domain::checkout::ANONYMOUS_USER;
use cartscout_core::policy::SHOPPER_ROLE;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedIdentity {
    pub user_id: String,
    pub role: String,
    pub verified: bool,
}

impl ResolvedIdentity {
    pub fn anonymous() -> Self {
        Self { user_id: ANONYMOUS_USER.to_string(), role: SHOPPER_ROLE.to_string(), verified: false }
    }
}

/// Maps a bearer token to a user. Never fails: anything unusable resolves to anonymous.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: Option<&str>) -> ResolvedIdentity;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AnonymousResolver;

#[async_trait]
impl IdentityResolver for AnonymousResolver {
    async fn resolve(&self, _token: Option<&str>) -> ResolvedIdentity {
        ResolvedIdentity::anonymous()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iss: String,
    pub exp: u64,
    #[serde(default)]
    pub iat: Option<u64>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub scp: Vec<String>,
    #[serde(default)]
    pub sid: Option<String>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("no signing secret is configured")]
    MissingSecret,
    #[error("token rejected: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),
    #[error("token subject is empty")]
    EmptySubject,
}

/// HS256 session tokens issued by `issuer`.
pub struct SignedTokenResolver {
    secret: Option<SecretString>,
    issuer: String,
    allow_unverified_fallback: bool,
}

impl SignedTokenResolver {
    pub fn new(secret: Option<SecretString>, issuer: impl Into<String>) -> Self {
        Self { secret, issuer: issuer.into(), allow_unverified_fallback: false }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(config.signing_secret.clone(), config.issuer.clone())
            .with_unverified_fallback(config.allow_unverified_fallback)
    }

    /// Accepts the subject of a token whose signature or expiry does not check out.
    /// Such identities are marked unverified and always get the shopper role.
    pub fn with_unverified_fallback(mut self, allow: bool) -> Self {
        self.allow_unverified_fallback = allow;
        self
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, IdentityError> {
        let secret = self.secret.as_ref().ok_or(IdentityError::MissingSecret)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.validate_aud = false;

        let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
        let claims = decode::<TokenClaims>(token, &key, &validation)?.claims;
        non_empty_subject(claims)
    }

    fn read_unverified(&self, token: &str) -> Result<TokenClaims, IdentityError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["sub"]);

        let claims = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)?.claims;
        non_empty_subject(claims)
    }
}

fn non_empty_subject(claims: TokenClaims) -> Result<TokenClaims, IdentityError> {
    if claims.sub.trim().is_empty() {
        return Err(IdentityError::EmptySubject);
    }
    Ok(claims)
}

#[async_trait]
impl IdentityResolver for SignedTokenResolver {
    async fn resolve(&self, token: Option<&str>) -> ResolvedIdentity {
        let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) else {
            return ResolvedIdentity::anonymous();
        };

        let error = match self.verify(token) {
            Ok(claims) => {
                return ResolvedIdentity {
                    user_id: claims.sub,
                    role: claims.role.unwrap_or_else(|| SHOPPER_ROLE.to_string()),
                    verified: true,
                };
            }
            Err(error) => error,
        };

        if self.allow_unverified_fallback {
            if let Ok(claims) = self.read_unverified(token) {
                warn!(
                    event_name = "identity.fallback_unverified",
                    user_id = %claims.sub,
                    error = %error,
                    "using unverified token subject"
                );
                return ResolvedIdentity {
                    user_id: claims.sub,
                    role: SHOPPER_ROLE.to_string(),
                    verified: false,
                };
            }
        }

        debug!(event_name = "identity.anonymous", error = %error, "token not accepted");
        ResolvedIdentity::anonymous()
    }
}

/// Runs `resolver` under `timeout`; a slow resolver yields the anonymous identity.
pub async fn resolve_within(
    resolver: &dyn IdentityResolver,
    token: Option<&str>,
    timeout: Duration,
) -> ResolvedIdentity {
    match tokio::time::timeout(timeout, resolver.resolve(token)).await {
        Ok(identity) => identity,
        Err(_) => {
            warn!(
                event_name = "identity.timeout",
                timeout_ms = timeout.as_millis() as u64,
                "identity resolution timed out"
            );
            ResolvedIdentity::anonymous()
        }
    }
}
