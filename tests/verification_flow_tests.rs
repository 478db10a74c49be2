use careerquest::{
    config::VerificationConfig,
    models::{registration::RegisterForm, user::UserRole, verification::RegistrationDraft},
    repositories::{
        SqliteUserRepository, SqliteVerificationRepository, UserRepository,
        VerificationRepository,
    },
    services::{password::verify_password, RegistrationError, VerificationError},
    test_utils::test_helpers,
    AppState,
};
use chrono::{Duration, Utc};

fn form(user_id: &str, email: &str) -> RegisterForm {
    RegisterForm {
        user_id: user_id.to_string(),
        password: "testPassword".to_string(),
        user_name: "testName".to_string(),
        email: email.to_string(),
        phone_num: "010-1111-2222".to_string(),
    }
}

fn draft(user_id: &str, email: &str) -> RegistrationDraft {
    RegistrationDraft {
        user_id: user_id.to_string(),
        password_hash: "hash".to_string(),
        user_name: "testName".to_string(),
        email: email.to_string(),
        phone_num: "010-1111-2222".to_string(),
    }
}

#[tokio::test]
async fn test_register_then_confirm_end_to_end() {
    let (state, mailer) = test_helpers::create_test_state(VerificationConfig::default())
        .await
        .unwrap();
    let pending_store = SqliteVerificationRepository::new(state.pool.clone());
    let users = SqliteUserRepository::new(state.pool.clone());

    let before = Utc::now();
    let expires_at = state
        .registration_service
        .register(&form("testId", "test@email.com"))
        .await
        .unwrap();
    assert!(expires_at > before);

    let pending = pending_store.get("test@email.com").await.unwrap().unwrap();
    assert_eq!(pending.user_id, "testId");
    assert_eq!(pending.expires_at, expires_at);
    assert!(users.find_by_user_id("testId").await.unwrap().is_none());

    let code = mailer.last_code_for("test@email.com").unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    let user = state
        .verification_service
        .confirm("test@email.com", &code)
        .await
        .unwrap();
    assert_eq!(user.role, UserRole::User);

    let stored = users.find_by_email("test@email.com").await.unwrap().unwrap();
    assert_eq!(stored.user_id, "testId");
    assert_eq!(stored.role, UserRole::User);
    assert!(verify_password("testPassword", &stored.password_hash));
    assert!(pending_store.get("test@email.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_second_code_confirms_after_two_requests() {
    let (state, mailer) = test_helpers::create_test_state(VerificationConfig::default())
        .await
        .unwrap();
    let service = &state.verification_service;

    service.request(draft("testId", "test@email.com")).await.unwrap();
    service.request(draft("testId", "test@email.com")).await.unwrap();
    let second = mailer.last_code_for("test@email.com").unwrap();

    let user = service.confirm("test@email.com", &second).await.unwrap();
    assert_eq!(user.user_id, "testId");
}

#[tokio::test]
async fn test_first_code_stops_working_after_second_request() {
    let (state, mailer) = test_helpers::create_test_state(VerificationConfig::default())
        .await
        .unwrap();
    let service = &state.verification_service;

    service.request(draft("testId", "test@email.com")).await.unwrap();
    let first = mailer.last_code_for("test@email.com").unwrap();

    // Re-request until the stored code differs from the first one.
    loop {
        service.request(draft("testId", "test@email.com")).await.unwrap();
        if mailer.last_code_for("test@email.com").unwrap() != first {
            break;
        }
    }

    let result = service.confirm("test@email.com", &first).await;
    assert!(matches!(result, Err(VerificationError::Mismatch(_))));
}

#[tokio::test]
async fn test_confirm_after_ttl_is_expired() {
    let (state, mailer) = test_helpers::create_test_state(VerificationConfig::default())
        .await
        .unwrap();
    let service = &state.verification_service;

    let expires_at = service
        .request(draft("testId", "test@email.com"))
        .await
        .unwrap();
    let code = mailer.last_code_for("test@email.com").unwrap();

    let result = service
        .confirm_at("test@email.com", &code, expires_at + Duration::seconds(1))
        .await;
    match result {
        Err(VerificationError::Expired(pending)) => assert_eq!(pending.user_id, "testId"),
        other => panic!("expected Expired, got {:?}", other),
    }

    let users = SqliteUserRepository::new(state.pool.clone());
    assert!(!users.exists_by_user_id("testId").await.unwrap());
}

#[tokio::test]
async fn test_confirm_at_exact_expiry_still_succeeds() {
    let (state, mailer) = test_helpers::create_test_state(VerificationConfig::default())
        .await
        .unwrap();
    let service = &state.verification_service;

    let expires_at = service
        .request(draft("testId", "test@email.com"))
        .await
        .unwrap();
    let code = mailer.last_code_for("test@email.com").unwrap();

    assert!(service
        .confirm_at("test@email.com", &code, expires_at)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_confirm_twice_second_is_not_found() {
    let (state, mailer) = test_helpers::create_test_state(VerificationConfig::default())
        .await
        .unwrap();
    let service = &state.verification_service;

    service.request(draft("testId", "test@email.com")).await.unwrap();
    let code = mailer.last_code_for("test@email.com").unwrap();

    assert!(service.confirm("test@email.com", &code).await.is_ok());
    assert!(matches!(
        service.confirm("test@email.com", &code).await,
        Err(VerificationError::NotFound)
    ));
}

#[tokio::test]
async fn test_confirm_without_request_is_not_found() {
    let (state, _mailer) = test_helpers::create_test_state(VerificationConfig::default())
        .await
        .unwrap();

    assert!(matches!(
        state
            .verification_service
            .confirm("nobody@email.com", "123456")
            .await,
        Err(VerificationError::NotFound)
    ));
}

#[tokio::test]
async fn test_register_existing_user_id_creates_no_pending_entry() {
    let (state, mailer) = test_helpers::create_test_state(VerificationConfig::default())
        .await
        .unwrap();
    test_helpers::insert_test_user(&state.pool, "testId", "taken@email.com", "password123")
        .await
        .unwrap();

    let result = state
        .registration_service
        .register(&form("testId", "fresh@email.com"))
        .await;
    assert!(matches!(result, Err(RegistrationError::DuplicateUserId)));

    let pending_store = SqliteVerificationRepository::new(state.pool.clone());
    assert!(pending_store.get("fresh@email.com").await.unwrap().is_none());
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_register_existing_email_is_rejected() {
    let (state, mailer) = test_helpers::create_test_state(VerificationConfig::default())
        .await
        .unwrap();
    test_helpers::insert_test_user(&state.pool, "ownerId", "test@email.com", "password123")
        .await
        .unwrap();

    let result = state
        .registration_service
        .register(&form("otherId", "test@email.com"))
        .await;
    assert!(matches!(result, Err(RegistrationError::DuplicateEmail)));
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_confirm_loses_race_to_direct_insert() {
    let (state, mailer) = test_helpers::create_test_state(VerificationConfig::default())
        .await
        .unwrap();
    let service = &state.verification_service;

    service.request(draft("testId", "test@email.com")).await.unwrap();
    let code = mailer.last_code_for("test@email.com").unwrap();

    // Someone else claimed the user id while the code was in flight.
    test_helpers::insert_test_user(&state.pool, "testId", "other@email.com", "password123")
        .await
        .unwrap();

    assert!(matches!(
        service.confirm("test@email.com", &code).await,
        Err(VerificationError::Duplicate(_))
    ));

    let users = SqliteUserRepository::new(state.pool.clone());
    let owner = users.find_by_user_id("testId").await.unwrap().unwrap();
    assert_eq!(owner.email, "other@email.com");
}

#[tokio::test]
async fn test_delivery_failure_leaves_no_entry_and_retry_succeeds() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let failing = AppState::new(
        pool.clone(),
        Box::new(test_helpers::FailingEmailService),
        VerificationConfig::default(),
    );

    let result = failing
        .registration_service
        .register(&form("testId", "test@email.com"))
        .await;
    assert!(matches!(
        result,
        Err(RegistrationError::Verification(VerificationError::Delivery(_)))
    ));

    let pending_store = SqliteVerificationRepository::new(pool.clone());
    assert!(pending_store.get("test@email.com").await.unwrap().is_none());

    let mailer = test_helpers::RecordingEmailService::new();
    let working = AppState::new(pool, Box::new(mailer.clone()), VerificationConfig::default());
    working
        .registration_service
        .register(&form("testId", "test@email.com"))
        .await
        .unwrap();

    let code = mailer.last_code_for("test@email.com").unwrap();
    assert!(working
        .verification_service
        .confirm("test@email.com", &code)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_concurrent_confirms_consume_entry_once() {
    let (pool, _file) = test_helpers::create_test_db_file().await.unwrap();
    let mailer = test_helpers::RecordingEmailService::new();
    let state = AppState::new(pool, Box::new(mailer.clone()), VerificationConfig::default());
    let service = &state.verification_service;

    service.request(draft("testId", "test@email.com")).await.unwrap();
    let code = mailer.last_code_for("test@email.com").unwrap();

    let (a, b) = tokio::join!(
        service.confirm("test@email.com", &code),
        service.confirm("test@email.com", &code)
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);
    assert!(
        matches!(a, Err(VerificationError::NotFound)) || matches!(b, Err(VerificationError::NotFound))
    );
}

#[tokio::test]
async fn test_purge_expired_removes_only_stale_entries() {
    let config = VerificationConfig {
        ttl: Duration::minutes(1),
        ..VerificationConfig::default()
    };
    let (state, _mailer) = test_helpers::create_test_state(config).await.unwrap();
    let pending_store = SqliteVerificationRepository::new(state.pool.clone());

    state
        .verification_service
        .request_at(draft("staleId", "stale@email.com"), Utc::now() - Duration::minutes(10))
        .await
        .unwrap();
    state
        .verification_service
        .request(draft("freshId", "fresh@email.com"))
        .await
        .unwrap();

    assert_eq!(state.verification_service.purge_expired().await.unwrap(), 1);
    assert!(pending_store.get("stale@email.com").await.unwrap().is_none());
    assert!(pending_store.get("fresh@email.com").await.unwrap().is_some());
}

#[tokio::test]
async fn test_configured_code_length_is_used() {
    let config = VerificationConfig {
        code_length: 8,
        ..VerificationConfig::default()
    };
    let (state, mailer) = test_helpers::create_test_state(config).await.unwrap();

    state
        .verification_service
        .request(draft("testId", "test@email.com"))
        .await
        .unwrap();
    assert_eq!(mailer.last_code_for("test@email.com").unwrap().len(), 8);
}
