//! Session token issuance, validation, and claims.

pub mod claims;
pub mod issuer;
pub mod validator;

pub use claims::Claims;
pub use issuer::{IssuedToken, TokenIssuer};
pub use validator::TokenValidator;

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use serde_json::json;

    use recipes_core::config::{AuthConfig, SecretString};
    use recipes_core::types::UserId;
    use recipes_entity::user::User;

    use super::*;
    use crate::error::TokenRejection;

    const SECRET: &str = "unit-test-signing-secret-0123456789";

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: SecretString::new(SECRET),
            token_ttl_minutes: 30,
            ..AuthConfig::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap()
    }

    fn ana() -> User {
        User {
            id: UserId::new(),
            username: "ana".to_string(),
            email: "ana@x.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn authorities(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn sign_raw(payload: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_then_validate_returns_issued_claims() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let validator = TokenValidator::new(&config());
        let user = ana();
        let roles = authorities(&["standard-user", "administrator"]);

        let issued = issuer.issue(&user, &roles, now()).unwrap();
        let claims = validator.validate(&issued.token, now()).unwrap();

        assert_eq!(claims.user_id(), user.id);
        assert_eq!(claims.username, "ana");
        assert_eq!(claims.authorities, roles);
        assert_eq!(claims.issued_at(), now());
        assert_eq!(claims.expires_at(), issued.expires_at);
        assert_eq!(issued.expires_at - now(), Duration::minutes(30));

        let again = validator.validate(&issued.token, now()).unwrap();
        assert_eq!(claims, again);
    }

    #[test]
    fn test_issuance_is_deterministic() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let user = ana();
        let roles = authorities(&["standard-user"]);

        let a = issuer.issue(&user, &roles, now()).unwrap();
        let b = issuer.issue(&user, &roles, now()).unwrap();
        let c = issuer
            .issue(&user, &roles, now() + Duration::seconds(1))
            .unwrap();
        assert_eq!(a.token, b.token);
        assert_ne!(a.token, c.token);
    }

    #[test]
    fn test_expiry_boundary() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let validator = TokenValidator::new(&config());
        let issued = issuer
            .issue(&ana(), &authorities(&["standard-user"]), now())
            .unwrap();

        assert!(validator.validate(&issued.token, issued.expires_at).is_ok());
        assert!(
            validator
                .validate(&issued.token, issued.expires_at - Duration::seconds(1))
                .is_ok()
        );
        assert_eq!(
            validator.validate(&issued.token, issued.expires_at + Duration::seconds(1)),
            Err(TokenRejection::Expired)
        );
    }

    #[test]
    fn test_any_altered_byte_is_tampered() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let validator = TokenValidator::new(&config());
        let issued = issuer
            .issue(&ana(), &authorities(&["standard-user"]), now())
            .unwrap();

        let bytes = issued.token.as_bytes();
        for i in 0..bytes.len() {
            let mut altered = bytes.to_vec();
            altered[i] ^= 0x01;
            let altered = String::from_utf8(altered).unwrap();
            assert_eq!(
                validator.validate(&altered, now()),
                Err(TokenRejection::Tampered),
                "byte {i} altered"
            );
        }
    }

    #[test]
    fn test_garbage_and_foreign_tokens_are_tampered() {
        let validator = TokenValidator::new(&config());
        assert_eq!(validator.validate("", now()), Err(TokenRejection::Tampered));
        assert_eq!(
            validator.validate("not.a.token", now()),
            Err(TokenRejection::Tampered)
        );

        let foreign = encode(
            &Header::new(Algorithm::HS512),
            &json!({ "sub": UserId::new().to_string(), "exp": now().timestamp() + 60 }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(
            validator.validate(&foreign, now()),
            Err(TokenRejection::Tampered)
        );
    }

    #[test]
    fn test_authentic_but_incomplete_claims_are_malformed() {
        let validator = TokenValidator::new(&config());
        let exp = now().timestamp() + 60;
        let iat = now().timestamp();

        let missing_sub = sign_raw(json!({
            "username": "ana", "authorities": ["standard-user"], "iat": iat, "exp": exp
        }));
        assert_eq!(
            validator.validate(&missing_sub, now()),
            Err(TokenRejection::Malformed)
        );

        let bad_sub = sign_raw(json!({
            "sub": "not-a-uuid", "username": "ana",
            "authorities": ["standard-user"], "iat": iat, "exp": exp
        }));
        assert_eq!(
            validator.validate(&bad_sub, now()),
            Err(TokenRejection::Malformed)
        );

        let missing_exp = sign_raw(json!({
            "sub": UserId::new().to_string(), "username": "ana",
            "authorities": ["standard-user"], "iat": iat
        }));
        assert_eq!(
            validator.validate(&missing_exp, now()),
            Err(TokenRejection::Malformed)
        );

        let wrong_type = sign_raw(json!({ "sub": 7, "exp": exp }));
        assert_eq!(
            validator.validate(&wrong_type, now()),
            Err(TokenRejection::Malformed)
        );
    }

    #[test]
    fn test_expiry_is_checked_before_structure() {
        let validator = TokenValidator::new(&config());
        let expired_and_incomplete = sign_raw(json!({ "exp": now().timestamp() - 10 }));
        assert_eq!(
            validator.validate(&expired_and_incomplete, now()),
            Err(TokenRejection::Expired)
        );

        let expired_and_ill_typed = sign_raw(json!({
            "sub": UserId::new().to_string(), "username": 42,
            "authorities": ["standard-user"],
            "iat": now().timestamp() - 100, "exp": now().timestamp() - 10
        }));
        assert_eq!(
            validator.validate(&expired_and_ill_typed, now()),
            Err(TokenRejection::Expired)
        );

        let live_and_ill_typed = sign_raw(json!({
            "sub": UserId::new().to_string(), "username": 42,
            "authorities": ["standard-user"],
            "iat": now().timestamp(), "exp": now().timestamp() + 60
        }));
        assert_eq!(
            validator.validate(&live_and_ill_typed, now()),
            Err(TokenRejection::Malformed)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_validation_agrees() {
        let issuer = TokenIssuer::new(&config()).unwrap();
        let validator = Arc::new(TokenValidator::new(&config()));
        let issued = issuer
            .issue(&ana(), &authorities(&["standard-user"]), now())
            .unwrap();
        let expected = validator.validate(&issued.token, now()).unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let validator = Arc::clone(&validator);
            let token = issued.token.clone();
            handles.push(tokio::spawn(async move {
                validator.validate(&token, now())
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), expected);
        }
    }
}
