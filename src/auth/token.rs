//! Static bearer tokens and HS256-signed JWTs.

use arc_swap::ArcSwapOption;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::{strip_bearer, AuthError, AuthGate};
use crate::config::{IncomingConfig, OutgoingConfig};

type HmacSha256 = Hmac<Sha256>;

const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Serialize, Deserialize)]
struct JwtHeader {
    alg: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
    iat: i64,
}

#[derive(Debug)]
struct CachedToken {
    token: String,
    refresh_at: i64,
}

/// [`AuthGate`] backed by configured static tokens and shared secrets.
pub struct TokenAuth {
    incoming_token: Option<String>,
    incoming_secret: Option<String>,
    outgoing_token: Option<String>,
    outgoing_secret: Option<String>,
    expiry_secs: i64,
    cached: ArcSwapOption<CachedToken>,
}

impl TokenAuth {
    pub fn new(incoming: &IncomingConfig, outgoing: &OutgoingConfig) -> Self {
        Self {
            incoming_token: incoming.token.clone(),
            incoming_secret: incoming.secret.clone(),
            outgoing_token: outgoing.token.clone(),
            outgoing_secret: outgoing.secret.clone(),
            expiry_secs: outgoing.expiry_secs as i64,
            cached: ArcSwapOption::empty(),
        }
    }

    fn sign(secret: &str, claims: &Claims) -> Result<String, AuthError> {
        let payload = serde_json::to_vec(claims).map_err(|_| AuthError::InvalidKey)?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(JWT_HEADER),
            URL_SAFE_NO_PAD.encode(payload)
        );
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidKey)?;
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
    }

    fn verify_jwt(secret: &str, token: &str) -> bool {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };

        let Ok(signature) = URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        if mac.verify_slice(&signature).is_err() {
            return false;
        }

        let header: Option<JwtHeader> = URL_SAFE_NO_PAD
            .decode(header)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok());
        if header.map(|h| h.alg) != Some("HS256".to_string()) {
            return false;
        }

        let claims: Option<Claims> = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok());
        match claims {
            Some(Claims { exp: Some(exp), .. }) => exp > Utc::now().timestamp(),
            Some(_) => true,
            None => false,
        }
    }
}

impl AuthGate for TokenAuth {
    fn verify_incoming(&self, header: Option<&str>) -> bool {
        let Some(token) = header.and_then(strip_bearer) else {
            return false;
        };
        if token.is_empty() {
            return false;
        }

        if let Some(expected) = &self.incoming_token {
            if bool::from(token.as_bytes().ct_eq(expected.as_bytes())) {
                return true;
            }
        }
        match &self.incoming_secret {
            Some(secret) => Self::verify_jwt(secret, token),
            None => false,
        }
    }

    fn produce_outgoing(&self) -> Result<String, AuthError> {
        if let Some(token) = &self.outgoing_token {
            return Ok(token.clone());
        }
        let secret = self.outgoing_secret.as_deref().ok_or(AuthError::MissingSecret)?;

        let now = Utc::now().timestamp();
        if let Some(cached) = self.cached.load_full() {
            if now < cached.refresh_at {
                return Ok(cached.token.clone());
            }
        }

        let claims = Claims {
            exp: Some(now + self.expiry_secs),
            iat: now,
        };
        let token = Self::sign(secret, &claims)?;
        self.cached.store(Some(Arc::new(CachedToken {
            token: token.clone(),
            refresh_at: now + self.expiry_secs * 9 / 10,
        })));
        tracing::debug!(expiry_secs = self.expiry_secs, "Signed new outgoing token");
        Ok(token)
    }
}

impl std::fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuth")
            .field("incoming_token", &self.incoming_token.is_some())
            .field("incoming_secret", &self.incoming_secret.is_some())
            .field("outgoing_token", &self.outgoing_token.is_some())
            .field("outgoing_secret", &self.outgoing_secret.is_some())
            .field("expiry_secs", &self.expiry_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret_auth(secret: &str) -> TokenAuth {
        let incoming = IncomingConfig {
            secret: Some(secret.to_string()),
            token: None,
        };
        let outgoing = OutgoingConfig {
            secret: Some(secret.to_string()),
            ..OutgoingConfig::default()
        };
        TokenAuth::new(&incoming, &outgoing)
    }

    #[test]
    fn test_signed_token_verifies_with_same_secret() {
        let auth = secret_auth("shh");
        let token = auth.produce_outgoing().unwrap();
        assert!(auth.verify_incoming(Some(&format!("Bearer {}", token))));
    }

    #[test]
    fn test_signed_token_fails_with_other_secret() {
        let signer = secret_auth("one");
        let verifier = secret_auth("two");
        let token = signer.produce_outgoing().unwrap();
        assert!(!verifier.verify_incoming(Some(&format!("Bearer {}", token))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims {
            exp: Some(Utc::now().timestamp() - 10),
            iat: 0,
        };
        let token = TokenAuth::sign("shh", &claims).unwrap();
        assert!(!secret_auth("shh").verify_incoming(Some(&format!("Bearer {}", token))));
    }

    #[test]
    fn test_outgoing_token_is_cached() {
        let auth = secret_auth("shh");
        let first = auth.produce_outgoing().unwrap();
        let second = auth.produce_outgoing().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_static_tokens() {
        let incoming = IncomingConfig {
            secret: None,
            token: Some("letmein".to_string()),
        };
        let outgoing = OutgoingConfig {
            token: Some("outbound".to_string()),
            ..OutgoingConfig::default()
        };
        let auth = TokenAuth::new(&incoming, &outgoing);
        assert!(auth.verify_incoming(Some("Bearer letmein")));
        assert!(!auth.verify_incoming(Some("Bearer letmeinx")));
        assert!(!auth.verify_incoming(Some("letmein")));
        assert!(!auth.verify_incoming(None));
        assert_eq!(auth.produce_outgoing().unwrap(), "outbound");
    }

    #[test]
    fn test_garbage_tokens_rejected() {
        let auth = secret_auth("shh");
        for header in ["Bearer ", "Bearer a.b", "Bearer a.b.c", "Bearer ...."] {
            assert!(!auth.verify_incoming(Some(header)), "{header}");
        }
    }

    #[test]
    fn test_missing_outgoing_material() {
        let auth = TokenAuth::new(&IncomingConfig::default(), &OutgoingConfig::default());
        assert_eq!(auth.produce_outgoing(), Err(AuthError::MissingSecret));
        assert!(!auth.verify_incoming(Some("Bearer anything")));
    }
}
