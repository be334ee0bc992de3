//! Integration tests for the authentication system.
//!
//! Tests registration, login, token validation, expiry and revocation flows.
//! Each test runs against its own in-memory database.

use chrono::Duration;
use envkeep::auth::{AuthError, AuthManager, MAX_TOKEN_EXPIRY_HOURS};
use envkeep::db::{Database, DatabaseConfig};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Helper to create an isolated, migrated test database pool
async fn setup_test_db() -> Arc<SqlitePool> {
    let db = Database::new(&DatabaseConfig::in_memory())
        .await
        .expect("Failed to create test database");
    db.migrate().await.expect("Failed to migrate test database");

    Arc::new(db.pool().clone())
}

/// Helper to create test auth manager
async fn setup_auth_manager() -> (AuthManager, Arc<SqlitePool>) {
    let pool = setup_test_db().await;
    (AuthManager::new(pool.clone()), pool)
}

#[tokio::test]
async fn test_create_user_then_authenticate() {
    let (auth, _) = setup_auth_manager().await;

    let user_id = auth
        .create_user("alice", "hunter2pass")
        .await
        .expect("Registration should succeed");
    assert!(user_id > 0, "User ID should be positive");

    let token = auth
        .authenticate("alice", "hunter2pass")
        .await
        .expect("Authentication should not error");
    assert!(token.is_some(), "Correct credentials should yield a token");
}

#[tokio::test]
async fn test_password_is_not_stored_in_plaintext() {
    let (auth, pool) = setup_auth_manager().await;
    auth.create_user("bob", "PlainTextSecret").await.unwrap();

    let stored: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE username = 'bob'")
        .fetch_one(pool.as_ref())
        .await
        .unwrap();
    assert_ne!(stored, "PlainTextSecret");
    assert!(!stored.contains("PlainTextSecret"));
    assert_eq!(stored.len(), 64);
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let (auth, _) = setup_auth_manager().await;

    let first_id = auth
        .create_user("carol", "Password123")
        .await
        .expect("First registration should succeed");

    let result = auth.create_user("carol", "Password456").await;
    assert!(
        matches!(result, Err(AuthError::DuplicateUsername)),
        "Should return DuplicateUsername error"
    );

    // The original account is untouched
    let user = auth.get_user_by_id(first_id).await.unwrap().unwrap();
    assert_eq!(user.username, "carol");
    assert!(auth.authenticate("carol", "Password123").await.unwrap().is_some());
    assert!(auth.authenticate("carol", "Password456").await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_duplicate_registrations() {
    let (auth, pool) = setup_auth_manager().await;
    let auth = Arc::new(auth);

    let mut handles = vec![];
    for i in 0..10 {
        let auth_clone = Arc::clone(&auth);
        handles.push(tokio::spawn(async move {
            auth_clone.create_user("racer", &format!("Password{i}")).await
        }));
    }

    let mut success_count = 0;
    let mut duplicate_count = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => success_count += 1,
            Err(AuthError::DuplicateUsername) => duplicate_count += 1,
            Err(e) => panic!("Unexpected error: {e}"),
        }
    }

    assert_eq!(success_count, 1, "Exactly one registration should win");
    assert_eq!(duplicate_count, 9);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = 'racer'")
        .fetch_one(pool.as_ref())
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user_look_the_same() {
    let (auth, _) = setup_auth_manager().await;
    auth.create_user("dave", "CorrectPass123").await.unwrap();

    let wrong_password = auth.authenticate("dave", "WrongPass123").await;
    let unknown_user = auth.authenticate("nobody", "CorrectPass123").await;

    assert!(matches!(wrong_password, Ok(None)));
    assert!(matches!(unknown_user, Ok(None)));
}

#[tokio::test]
async fn test_authenticate_is_case_and_whitespace_exact() {
    let (auth, _) = setup_auth_manager().await;
    auth.create_user("erin", "Secret").await.unwrap();

    assert!(auth.authenticate("erin", "secret").await.unwrap().is_none());
    assert!(auth.authenticate("erin", "Secret ").await.unwrap().is_none());
    assert!(auth.authenticate("erin", "").await.unwrap().is_none());
}

#[tokio::test]
async fn test_each_login_issues_a_new_token() {
    let (auth, _) = setup_auth_manager().await;
    let user_id = auth.create_user("frank", "SecurePass123").await.unwrap();

    let first = auth.authenticate("frank", "SecurePass123").await.unwrap().unwrap();
    let second = auth.authenticate("frank", "SecurePass123").await.unwrap().unwrap();
    assert_ne!(first, second);

    // Both sessions stay valid concurrently
    assert_eq!(auth.validate_token(&first).await.unwrap().unwrap().id, user_id);
    assert_eq!(auth.validate_token(&second).await.unwrap().unwrap().id, user_id);
}

#[tokio::test]
async fn test_validate_token_returns_user() {
    let (auth, _) = setup_auth_manager().await;
    let user_id = auth.create_user("grace", "SecurePass123").await.unwrap();
    let token = auth.authenticate("grace", "SecurePass123").await.unwrap().unwrap();

    let user = auth
        .validate_token(&token)
        .await
        .unwrap()
        .expect("Token should be valid");
    assert_eq!(user.id, user_id);
    assert_eq!(user.username, "grace");

    // Validation does not consume or extend the token
    assert!(auth.validate_token(&token).await.unwrap().is_some());
}

#[tokio::test]
async fn test_unissued_token_is_invalid() {
    let (auth, _) = setup_auth_manager().await;
    auth.create_user("heidi", "SecurePass123").await.unwrap();
    auth.authenticate("heidi", "SecurePass123").await.unwrap();

    let zeros = "0".repeat(64);
    for candidate in ["", "invalid", zeros.as_str(), "' OR '1'='1"] {
        assert!(
            auth.validate_token(candidate).await.unwrap().is_none(),
            "{candidate:?} should not validate"
        );
    }
}

#[tokio::test]
async fn test_revoke_token() {
    let (auth, _) = setup_auth_manager().await;
    auth.create_user("ivan", "SecurePass123").await.unwrap();
    let token = auth.authenticate("ivan", "SecurePass123").await.unwrap().unwrap();
    let other = auth.authenticate("ivan", "SecurePass123").await.unwrap().unwrap();

    auth.revoke_token(&token).await.expect("Revoke should succeed");
    assert!(auth.validate_token(&token).await.unwrap().is_none());

    // Only the presented token is revoked
    assert!(auth.validate_token(&other).await.unwrap().is_some());

    // Revoking again, or revoking garbage, is a no-op
    auth.revoke_token(&token).await.expect("Second revoke should succeed");
    auth.revoke_token("never-issued").await.expect("Unknown revoke should succeed");
}

#[tokio::test]
async fn test_expired_token_is_invalid() {
    let pool = setup_test_db().await;
    let auth = AuthManager::with_token_expiry(pool.clone(), Duration::seconds(-1));
    auth.create_user("judy", "SecurePass123").await.unwrap();

    let token = auth.authenticate("judy", "SecurePass123").await.unwrap().unwrap();
    assert!(auth.validate_token(&token).await.unwrap().is_none());

    // Revoking an expired token is still a silent success
    auth.revoke_token(&token).await.unwrap();
}

#[tokio::test]
async fn test_expiry_uses_store_clock() {
    let (auth, pool) = setup_auth_manager().await;
    let user_id = auth.create_user("ken", "SecurePass123").await.unwrap();

    sqlx::query(
        "INSERT INTO tokens (user_id, token, expires_at) VALUES
            (?1, 'past', strftime('%Y-%m-%d %H:%M:%f', 'now', '-1 minute')),
            (?1, 'future', strftime('%Y-%m-%d %H:%M:%f', 'now', '+1 minute'))",
    )
    .bind(user_id)
    .execute(pool.as_ref())
    .await
    .unwrap();

    assert!(auth.validate_token("past").await.unwrap().is_none());
    assert!(auth.validate_token("future").await.unwrap().is_some());
}

#[tokio::test]
async fn test_default_token_expiry_is_one_day() {
    let (auth, pool) = setup_auth_manager().await;
    assert_eq!(auth.token_expiry(), Duration::hours(24));

    auth.create_user("leo", "SecurePass123").await.unwrap();
    let token = auth.authenticate("leo", "SecurePass123").await.unwrap().unwrap();

    let seconds_left: f64 = sqlx::query_scalar(
        "SELECT (julianday(expires_at) - julianday('now')) * 86400.0 FROM tokens WHERE token = ?1",
    )
    .bind(&token)
    .fetch_one(pool.as_ref())
    .await
    .unwrap();
    assert!(seconds_left > 86_000.0 && seconds_left <= 86_400.0);
}

#[tokio::test]
async fn test_oversized_expiry_is_clamped() {
    let pool = setup_test_db().await;
    let auth = AuthManager::with_token_expiry(pool.clone(), Duration::hours(80_000_000));
    assert_eq!(auth.token_expiry(), Duration::hours(MAX_TOKEN_EXPIRY_HOURS));

    auth.create_user("nora", "SecurePass123").await.unwrap();
    let token = auth
        .authenticate("nora", "SecurePass123")
        .await
        .expect("Valid credentials should not fail with a huge expiry")
        .expect("Valid credentials should issue a token");
    assert!(auth.validate_token(&token).await.unwrap().is_some());

    let days_left: f64 = sqlx::query_scalar(
        "SELECT julianday(expires_at) - julianday('now') FROM tokens WHERE token = ?1",
    )
    .bind(&token)
    .fetch_one(pool.as_ref())
    .await
    .unwrap();
    assert!(days_left > 3649.0 && days_left <= 3650.0);
}

#[tokio::test]
async fn test_expiry_at_limit_is_kept() {
    let pool = setup_test_db().await;
    let limit = Duration::hours(MAX_TOKEN_EXPIRY_HOURS);
    let auth = AuthManager::with_token_expiry(pool, limit);
    assert_eq!(auth.token_expiry(), limit);

    auth.create_user("omar", "SecurePass123").await.unwrap();
    assert!(auth.authenticate("omar", "SecurePass123").await.unwrap().is_some());
}

#[tokio::test]
async fn test_login_returns_user_with_token() {
    let (auth, _) = setup_auth_manager().await;
    let user_id = auth.create_user("paula", "SecurePass123").await.unwrap();

    let (user, token) = auth
        .login("paula", "SecurePass123")
        .await
        .unwrap()
        .expect("Valid credentials should log in");
    assert_eq!(user.id, user_id);
    assert_eq!(user.username, "paula");
    assert_eq!(auth.validate_token(&token).await.unwrap(), Some(user));

    assert!(auth.login("paula", "wrong").await.unwrap().is_none());
    assert!(auth.login("nobody", "SecurePass123").await.unwrap().is_none());
}

#[tokio::test]
async fn test_purge_expired_tokens_keeps_live_ones() {
    let pool = setup_test_db().await;
    let expired_auth = AuthManager::with_token_expiry(pool.clone(), Duration::seconds(-1));
    let auth = AuthManager::new(pool.clone());
    auth.create_user("mallory", "SecurePass123").await.unwrap();

    expired_auth.authenticate("mallory", "SecurePass123").await.unwrap();
    expired_auth.authenticate("mallory", "SecurePass123").await.unwrap();
    let live = auth.authenticate("mallory", "SecurePass123").await.unwrap().unwrap();

    assert_eq!(auth.purge_expired_tokens().await.unwrap(), 2);
    assert_eq!(auth.purge_expired_tokens().await.unwrap(), 0);
    assert!(auth.validate_token(&live).await.unwrap().is_some());
}

#[tokio::test]
async fn test_revoke_all_tokens() {
    let (auth, _) = setup_auth_manager().await;
    let user_id = auth.create_user("niaj", "SecurePass123").await.unwrap();
    let other_id = auth.create_user("olivia", "SecurePass123").await.unwrap();

    let t1 = auth.authenticate("niaj", "SecurePass123").await.unwrap().unwrap();
    let t2 = auth.authenticate("niaj", "SecurePass123").await.unwrap().unwrap();
    let kept = auth.authenticate("olivia", "SecurePass123").await.unwrap().unwrap();

    assert_eq!(auth.revoke_all_tokens(user_id).await.unwrap(), 2);
    assert!(auth.validate_token(&t1).await.unwrap().is_none());
    assert!(auth.validate_token(&t2).await.unwrap().is_none());
    assert_eq!(auth.validate_token(&kept).await.unwrap().unwrap().id, other_id);
    assert_eq!(auth.revoke_all_tokens(user_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_get_user_lookups() {
    let (auth, _) = setup_auth_manager().await;
    let user_id = auth.create_user("peggy", "SecurePass123").await.unwrap();

    let by_id = auth.get_user_by_id(user_id).await.unwrap().unwrap();
    let by_name = auth.get_user_by_username("peggy").await.unwrap().unwrap();
    assert_eq!(by_id, by_name);
    assert_eq!(by_id.username, "peggy");

    assert!(auth.get_user_by_id(user_id + 1000).await.unwrap().is_none());
    assert!(auth.get_user_by_username("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_deleting_user_invalidates_tokens() {
    let (auth, pool) = setup_auth_manager().await;
    let user_id = auth.create_user("quentin", "SecurePass123").await.unwrap();
    let token = auth.authenticate("quentin", "SecurePass123").await.unwrap().unwrap();

    sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(user_id)
        .execute(pool.as_ref())
        .await
        .unwrap();

    assert!(auth.validate_token(&token).await.unwrap().is_none());
    let tokens: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tokens")
        .fetch_one(pool.as_ref())
        .await
        .unwrap();
    assert_eq!(tokens, 0);
}

#[tokio::test]
async fn test_storage_failure_propagates() {
    let (auth, pool) = setup_auth_manager().await;
    sqlx::query("DROP TABLE tokens").execute(pool.as_ref()).await.unwrap();
    sqlx::query("DROP TABLE users").execute(pool.as_ref()).await.unwrap();

    let result = auth.create_user("rupert", "SecurePass123").await;
    assert!(matches!(result, Err(AuthError::Storage(_))));
    assert!(matches!(
        auth.validate_token("anything").await,
        Err(AuthError::Storage(_))
    ));
}
