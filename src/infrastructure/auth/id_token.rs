//! Identity provider ID token verification
//!
//! The login callback only trusts claims carried by an ID token whose
//! signature, issuer, audience and expiry check out against the configured
//! provider.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Signature algorithm the provider signs ID tokens with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum IdTokenAlgorithm {
    #[default]
    #[serde(rename = "RS256", alias = "rs256")]
    Rs256,
    #[serde(rename = "HS256", alias = "hs256")]
    Hs256,
}

/// Trust settings for the identity provider
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdTokenConfig {
    /// Expected `iss` claim
    pub issuer: String,
    /// Client id registered with the provider, expected in `aud`
    pub client_id: String,
    pub algorithm: IdTokenAlgorithm,
    /// PEM encoded RSA public key for RS256, shared secret for HS256
    pub verification_key: Option<String>,
}

impl Debug for IdTokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdTokenConfig")
            .field("issuer", &self.issuer)
            .field("client_id", &self.client_id)
            .field("algorithm", &self.algorithm)
            .field(
                "verification_key",
                &self.verification_key.as_ref().map(|_| "[hidden]"),
            )
            .finish()
    }
}

impl IdTokenConfig {
    /// Whether an issuer has been set at all
    pub fn is_configured(&self) -> bool {
        !self.issuer.is_empty()
    }
}

/// Checks an ID token and hands back its claim set
pub trait IdTokenVerifier: Send + Sync + Debug {
    fn verify(&self, id_token: &str) -> Result<Value, DomainError>;
}

/// Verifier for signed JWT ID tokens
#[derive(Clone)]
pub struct JwtIdTokenVerifier {
    issuer: String,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Debug for JwtIdTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdTokenVerifier")
            .field("issuer", &self.issuer)
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl JwtIdTokenVerifier {
    pub fn new(config: &IdTokenConfig) -> Result<Self, DomainError> {
        if config.issuer.is_empty() {
            return Err(DomainError::configuration("ID token issuer must be set"));
        }
        if config.client_id.is_empty() {
            return Err(DomainError::configuration("ID token client_id must be set"));
        }

        let key = config
            .verification_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| DomainError::configuration("ID token verification_key must be set"))?;

        let (algorithm, decoding_key) = match config.algorithm {
            IdTokenAlgorithm::Rs256 => {
                let key = DecodingKey::from_rsa_pem(key.as_bytes()).map_err(|e| {
                    DomainError::configuration(format!("Invalid RS256 verification key: {}", e))
                })?;
                (Algorithm::RS256, key)
            }
            IdTokenAlgorithm::Hs256 => (Algorithm::HS256, DecodingKey::from_secret(key.as_bytes())),
        };

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.client_id]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Ok(Self {
            issuer: config.issuer.clone(),
            decoding_key,
            validation,
        })
    }
}

impl IdTokenVerifier for JwtIdTokenVerifier {
    fn verify(&self, id_token: &str) -> Result<Value, DomainError> {
        let token_data = decode::<Value>(id_token, &self.decoding_key, &self.validation)
            .map_err(|e| DomainError::access_denied(format!("Invalid ID token: {}", e)))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const ISSUER: &str = "https://idp.example.com";
    const CLIENT_ID: &str = "registry";
    const SECRET: &str = "idp-signing-secret";

    fn config() -> IdTokenConfig {
        IdTokenConfig {
            issuer: ISSUER.to_string(),
            client_id: CLIENT_ID.to_string(),
            algorithm: IdTokenAlgorithm::Hs256,
            verification_key: Some(SECRET.to_string()),
        }
    }

    fn verifier() -> JwtIdTokenVerifier {
        JwtIdTokenVerifier::new(&config()).unwrap()
    }

    fn claims(sub: &str) -> Value {
        json!({
            "iss": ISSUER,
            "aud": CLIENT_ID,
            "sub": sub,
            "exp": Utc::now().timestamp() + 600,
            "groups": ["ops"],
        })
    }

    fn sign(claims: &Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_yields_claims() {
        let token = sign(&claims("user-1"), SECRET);

        let verified = verifier().verify(&token).unwrap();
        assert_eq!(verified["sub"], "user-1");
        assert_eq!(verified["groups"], json!(["ops"]));
    }

    #[test]
    fn test_token_signed_with_other_key_rejected() {
        let token = sign(&claims("user-1"), "attacker-secret");

        let err = verifier().verify(&token).unwrap_err();
        assert!(matches!(err, DomainError::AccessDenied { .. }));
    }

    #[test]
    fn test_unsigned_token_rejected() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims("user-1").to_string());
        let token = format!("{}.{}.", header, payload);

        assert!(verifier().verify(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let mut forged = claims("user-1");
        forged["iss"] = json!("https://evil.example.com");

        assert!(verifier().verify(&sign(&forged, SECRET)).is_err());
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let mut forged = claims("user-1");
        forged["aud"] = json!("another-client");

        assert!(verifier().verify(&sign(&forged, SECRET)).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut stale = claims("user-1");
        stale["exp"] = json!(Utc::now().timestamp() - 3600);

        assert!(verifier().verify(&sign(&stale, SECRET)).is_err());
    }

    #[test]
    fn test_missing_subject_rejected() {
        let mut anonymous = claims("user-1");
        anonymous.as_object_mut().unwrap().remove("sub");

        assert!(verifier().verify(&sign(&anonymous, SECRET)).is_err());
    }

    #[test]
    fn test_incomplete_config_rejected() {
        let mut missing_key = config();
        missing_key.verification_key = None;
        assert!(JwtIdTokenVerifier::new(&missing_key).is_err());

        let mut missing_client = config();
        missing_client.client_id.clear();
        assert!(JwtIdTokenVerifier::new(&missing_client).is_err());

        let mut bad_pem = config();
        bad_pem.algorithm = IdTokenAlgorithm::Rs256;
        let err = JwtIdTokenVerifier::new(&bad_pem).unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
    }

    #[test]
    fn test_debug_hides_key() {
        assert!(!format!("{:?}", config()).contains(SECRET));
    }
}
