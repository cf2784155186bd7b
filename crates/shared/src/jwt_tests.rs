//! Unit tests for identity claims and token handling.

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};

use crate::auth::Claims;
use crate::jwt::{JwtConfig, JwtError, JwtService};
use crate::types::{BranchId, CompanyId, UserId};

fn create_test_service() -> JwtService {
    JwtService::new(JwtConfig {
        secret: "test-secret-key-for-testing".to_string(),
        access_token_expires_minutes: 15,
    })
}

#[test]
fn test_claims_new_sets_identity() {
    let user_id = UserId::new();
    let company_id = CompanyId::new();
    let branch_id = BranchId::new();
    let expires_at = Utc::now() + Duration::hours(1);

    let claims = Claims::new(user_id, "kasir.jkt", company_id, branch_id, expires_at);

    assert_eq!(claims.user_id(), user_id);
    assert_eq!(claims.username, "kasir.jkt");
    assert_eq!(claims.company_id(), company_id);
    assert_eq!(claims.branch_id(), branch_id);
    assert!(claims.iat <= Utc::now().timestamp());
    assert_eq!(claims.exp, expires_at.timestamp());
}

#[test]
fn test_claims_serialize_with_id_suffix() {
    let claims = Claims::new(
        UserId::new(),
        "kasir",
        CompanyId::new(),
        BranchId::new(),
        Utc::now(),
    );
    let value = serde_json::to_value(&claims).unwrap();
    assert!(value.get("company_id").is_some());
    assert!(value.get("branch_id").is_some());
    assert!(value.get("company").is_none());
}

#[test]
fn test_token_round_trip() {
    let service = create_test_service();
    let company_id = CompanyId::new();
    let branch_id = BranchId::new();

    let token = service
        .generate_access_token(UserId::new(), "admin", company_id, branch_id)
        .unwrap();
    let claims = service.validate_token(&token).unwrap();

    assert_eq!(claims.username, "admin");
    assert_eq!(claims.company_id(), company_id);
    assert_eq!(claims.branch_id(), branch_id);
}

#[test]
fn test_invalid_token() {
    let service = create_test_service();
    let result = service.validate_token("invalid.token.here");
    assert!(matches!(result, Err(JwtError::DecodingError(_))));
}

#[test]
fn test_token_signed_with_other_secret_rejected() {
    let other = JwtService::new(JwtConfig {
        secret: "another-secret".to_string(),
        access_token_expires_minutes: 15,
    });
    let token = other
        .generate_access_token(UserId::new(), "admin", CompanyId::new(), BranchId::new())
        .unwrap();

    assert!(create_test_service().validate_token(&token).is_err());
}

#[test]
fn test_expired_token() {
    let claims = Claims::new(
        UserId::new(),
        "admin",
        CompanyId::new(),
        BranchId::new(),
        Utc::now() - Duration::hours(2),
    );
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-secret-key-for-testing"),
    )
    .unwrap();

    let result = create_test_service().validate_token(&token);
    assert!(matches!(result, Err(JwtError::Expired)));
}
