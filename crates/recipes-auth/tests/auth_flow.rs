//! End-to-end identity flows over the in-memory credential store.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use recipes_auth::{
    AuthError, AuthService, IdentityContext, LoginRequest, RegisterRequest, TokenRejection,
};
use recipes_core::config::{AuthConfig, SecretString};
use recipes_database::store::{CredentialStore, MemoryCredentialStore};
use recipes_entity::user::{ADMINISTRATOR, NewUser, STANDARD_USER};

const TTL_MINUTES: u64 = 60;

fn config() -> AuthConfig {
    AuthConfig {
        jwt_secret: SecretString::new("test-signing-secret-0123456789abcdef"),
        token_ttl_minutes: TTL_MINUTES,
        ..AuthConfig::default()
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn setup() -> (AuthService, MemoryCredentialStore) {
    let store = MemoryCredentialStore::with_default_roles();
    let service = AuthService::new(&config(), Arc::new(store.clone())).unwrap();
    (service, store)
}

fn register_req(username: &str, email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn login_req(login: &str, password: &str) -> LoginRequest {
    LoginRequest {
        login: login.to_string(),
        password: password.to_string(),
    }
}

fn standard_only() -> BTreeSet<String> {
    BTreeSet::from([STANDARD_USER.to_string()])
}

#[tokio::test]
async fn test_register_login_expire_scenario() {
    let (service, _) = setup();

    let t1 = service
        .register_at(register_req("ana", "ana@x.com", "s3cr3t"), t0())
        .await
        .unwrap();
    assert_eq!(t1.token_type, "Bearer");
    assert_eq!(t1.user.roles, standard_only());
    assert_eq!(t1.expires_in, (TTL_MINUTES * 60) as i64);
    let claims = service.validate_token(&t1.token, t0()).unwrap();
    assert_eq!(claims.authorities, standard_only());

    let wrong = service
        .login_at(login_req("ana", "wrong"), t0() + Duration::seconds(5))
        .await;
    assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

    let t2 = service
        .login_at(login_req("ana", "s3cr3t"), t0() + Duration::seconds(5))
        .await
        .unwrap();
    assert_ne!(t1.token, t2.token);
    let claims2 = service
        .validate_token(&t2.token, t0() + Duration::seconds(6))
        .unwrap();
    assert_eq!(claims2.authorities, claims.authorities);
    assert!(claims2.iat > claims.iat);

    let after_lifetime = t1.expires_at + Duration::seconds(1);
    let expired = service.validate_token(&t1.token, after_lifetime);
    assert!(matches!(
        expired,
        Err(AuthError::InvalidToken(TokenRejection::Expired))
    ));
}

#[tokio::test]
async fn test_login_by_email() {
    let (service, _) = setup();
    service
        .register_at(register_req("ana", "ana@x.com", "s3cr3t"), t0())
        .await
        .unwrap();

    let resp = service
        .login_at(login_req("ANA@x.com", "s3cr3t"), t0())
        .await
        .unwrap();
    assert_eq!(resp.user.username, "ana");
}

#[tokio::test]
async fn test_unknown_identity_and_wrong_password_look_alike() {
    let (service, _) = setup();
    service
        .register_at(register_req("ana", "ana@x.com", "s3cr3t"), t0())
        .await
        .unwrap();

    let unknown = service
        .login_at(login_req("nobody", "s3cr3t"), t0())
        .await
        .unwrap_err();
    let mismatch = service
        .login_at(login_req("ana", "nope!!"), t0())
        .await
        .unwrap_err();
    assert!(matches!(unknown, AuthError::InvalidCredentials));
    assert_eq!(unknown.to_string(), mismatch.to_string());
}

#[tokio::test]
async fn test_duplicate_registration_keeps_one_identity() {
    let (service, store) = setup();
    service
        .register_at(register_req("ana", "ana@x.com", "s3cr3t"), t0())
        .await
        .unwrap();

    let dup_name = service
        .register_at(register_req("ana", "other@x.com", "s3cr3t"), t0())
        .await;
    assert!(matches!(dup_name, Err(AuthError::DuplicateUsername(ref n)) if n == "ana"));

    let dup_email = service
        .register_at(register_req("bob", "ana@x.com", "s3cr3t"), t0())
        .await;
    assert!(matches!(dup_email, Err(AuthError::DuplicateEmail)));

    assert_eq!(store.user_count().await, 1);
}

#[tokio::test]
async fn test_concurrent_duplicate_registrations() {
    let (service, store) = setup();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .register_at(register_req("ana", "ana@x.com", "s3cr3t"), t0())
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(AuthError::DuplicateUsername(_)) => {}
            Err(other) => panic!("unexpected outcome: {other}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(store.user_count().await, 1);
}

#[tokio::test]
async fn test_registration_policy_rejections() {
    let (service, store) = setup();

    let short = service
        .register_at(register_req("ana", "ana@x.com", "abc"), t0())
        .await;
    assert!(matches!(short, Err(AuthError::Validation(_))));

    let bad_email = service
        .register_at(register_req("ana", "not-an-email", "s3cr3t"), t0())
        .await;
    assert!(matches!(bad_email, Err(AuthError::Validation(_))));

    let bad_name = service
        .register_at(register_req("a b", "ana@x.com", "s3cr3t"), t0())
        .await;
    assert!(matches!(bad_name, Err(AuthError::Validation(_))));

    assert_eq!(store.user_count().await, 0);
}

#[tokio::test]
async fn test_identity_without_roles_cannot_login() {
    let (service, store) = setup();
    let hasher = recipes_auth::PasswordHasher::new();
    store
        .insert_unbound(NewUser {
            username: "legacy".to_string(),
            email: "legacy@x.com".to_string(),
            password_hash: hasher.hash_password("s3cr3t").unwrap(),
        })
        .await
        .unwrap();

    let err = service
        .login_at(login_req("legacy", "s3cr3t"), t0())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NoRolesAssigned(_)));
    assert!(err.is_integrity_fault());
}

#[tokio::test]
async fn test_role_grant_only_affects_new_tokens() {
    let (service, _) = setup();
    let before = service
        .register_at(register_req("ana", "ana@x.com", "s3cr3t"), t0())
        .await
        .unwrap();

    let roles = service.assign_role("ana", ADMINISTRATOR).await.unwrap();
    assert_eq!(
        roles,
        BTreeSet::from([ADMINISTRATOR.to_string(), STANDARD_USER.to_string()])
    );

    let old_ctx = service.current_identity_at(Some(&before.token), t0());
    assert!(!old_ctx.has_authority(ADMINISTRATOR));

    let after = service
        .login_at(login_req("ana", "s3cr3t"), t0() + Duration::seconds(1))
        .await
        .unwrap();
    let new_ctx = service.current_identity_at(Some(&after.token), t0() + Duration::seconds(1));
    assert!(new_ctx.has_authority(ADMINISTRATOR));
    assert!(new_ctx.authorize(ADMINISTRATOR).is_ok());
}

#[tokio::test]
async fn test_current_identity_states() {
    let (service, store) = setup();
    let resp = service
        .register_at(register_req("ana", "ana@x.com", "s3cr3t"), t0())
        .await
        .unwrap();

    assert_eq!(service.current_identity_at(None, t0()), IdentityContext::Anonymous);
    assert_eq!(service.current_identity_at(Some("  "), t0()), IdentityContext::Anonymous);
    assert_eq!(
        service.current_identity_at(Some("garbage"), t0()),
        IdentityContext::Rejected(TokenRejection::Tampered)
    );

    let ctx = service.current_identity_at(Some(&resp.token), t0());
    assert_eq!(ctx.current_subject_id(), Some(resp.user.id));
    assert_eq!(ctx.current_username(), Some("ana"));
    assert!(ctx.has_authority(STANDARD_USER));
    assert!(matches!(
        ctx.authorize(ADMINISTRATOR),
        Err(AuthError::Forbidden { .. })
    ));

    let stored = store.find_by_id(resp.user.id).await.unwrap().unwrap();
    assert_eq!(stored.username, "ana");
}

#[tokio::test]
async fn test_token_issued_by_other_secret_is_tampered() {
    let (service, _) = setup();
    let resp = service
        .register_at(register_req("ana", "ana@x.com", "s3cr3t"), t0())
        .await
        .unwrap();

    let other = AuthService::new(
        &AuthConfig {
            jwt_secret: SecretString::new("another-signing-secret-abcdef012345"),
            ..config()
        },
        Arc::new(MemoryCredentialStore::with_default_roles()),
    )
    .unwrap();

    let err = other.validate_token(&resp.token, t0()).unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken(TokenRejection::Tampered)));
}

#[test]
fn test_out_of_range_token_lifetime_is_refused_at_startup() {
    for minutes in [0, 1 << 60, u64::MAX] {
        let result = AuthService::new(
            &AuthConfig {
                token_ttl_minutes: minutes,
                ..config()
            },
            Arc::new(MemoryCredentialStore::with_default_roles()),
        );
        let err = result.unwrap_err();
        assert_eq!(err.kind, recipes_core::error::ErrorKind::Configuration);
    }
}

#[tokio::test]
async fn test_longest_lifetime_yields_live_token() {
    let store = MemoryCredentialStore::with_default_roles();
    let service = AuthService::new(
        &AuthConfig {
            token_ttl_minutes: recipes_core::config::auth::MAX_TOKEN_TTL_MINUTES,
            ..config()
        },
        Arc::new(store),
    )
    .unwrap();

    let resp = service
        .register_at(register_req("ana", "ana@x.com", "s3cr3t"), t0())
        .await
        .unwrap();
    assert!(resp.expires_in > 0);
    assert!(service.validate_token(&resp.token, t0()).is_ok());
}
