use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Claims - data stored in the token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (login email, the chat caller identity)
    pub exp: i64,    // Expiration timestamp
    pub iat: i64,    // Issued at timestamp
    pub iss: String, // Issuer
    pub jti: String, // JWT ID (unique token identifier)
}

/// JWT Service - creates and verifies bearer tokens
///
/// Tokens are issued by the login system; this service only needs to issue
/// them for tooling and tests.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Create a token for `email`, valid for 24 hours
    pub fn create_token(&self, email: &str) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(24);

        let claims = Claims {
            sub: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify signature, expiry and issuer, returning the claims
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_verify_token() {
        let service = JwtService::new("test_secret_key", "dealroom".to_string());

        let token = service.create_token("buyer@example.com").unwrap();

        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "buyer@example.com");
        assert_eq!(claims.iss, "dealroom");
    }

    #[test]
    fn test_invalid_token() {
        let service = JwtService::new("test_secret_key", "dealroom".to_string());
        assert!(service.verify_token("invalid_token").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let issuer = JwtService::new("secret1", "dealroom".to_string());
        let verifier = JwtService::new("secret2", "dealroom".to_string());

        let token = issuer.create_token("buyer@example.com").unwrap();

        assert!(verifier.verify_token(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let issuer = JwtService::new("shared", "someone-else".to_string());
        let verifier = JwtService::new("shared", "dealroom".to_string());

        let token = issuer.create_token("buyer@example.com").unwrap();

        assert!(verifier.verify_token(&token).is_err());
    }

    #[test]
    fn test_expiry_is_one_day() {
        let service = JwtService::new("test_secret_key", "dealroom".to_string());
        let token = service.create_token("buyer@example.com").unwrap();

        let claims = service.verify_token(&token).unwrap();

        let expires_in = claims.exp - chrono::Utc::now().timestamp();
        assert!(expires_in > 23 * 3600);
        assert!(expires_in <= 24 * 3600);
    }
}
