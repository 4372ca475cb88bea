use serde_json::json;
use std::sync::Arc;

use app_config::{Argon2Config, JwtConfig};
use app_database::{db_connect::initialize_isolated_memory_db, service::DbService};
use app_error::AppError;
use app_middleware::JwtService;
use app_models::{LoginInput, SignupInput, User};

use crate::service::{AccountService, ItemService};

struct TestContext {
    accounts: Arc<AccountService>,
    items: Arc<ItemService>,
    user_db: Arc<DbService<User>>,
    jwt: Arc<JwtService>,
}

// Cheap argon2 cost so the suite stays fast
fn test_argon2() -> Argon2Config {
    Argon2Config {
        memory: 8192,
        iterations: 1,
        parallelism: 1,
    }
}

async fn setup() -> TestContext {
    let db = initialize_isolated_memory_db("test_namespace", "test_db")
        .await
        .expect("in-memory store should initialize");

    let user_db = Arc::new(DbService::<User>::new(db, "users"));
    let jwt_config = JwtConfig::new(b"test_jwt_secret", 24);

    let accounts = Arc::new(AccountService::new(
        &jwt_config,
        test_argon2(),
        Arc::clone(&user_db),
    ));
    let jwt = accounts.get_jwt_service();
    let items = Arc::new(ItemService::new(Arc::clone(&user_db)));

    TestContext {
        accounts,
        items,
        user_db,
        jwt,
    }
}

fn signup_input(email: &str, user_name: &str, password: &str) -> SignupInput {
    SignupInput {
        email: email.to_string(),
        user_name: user_name.to_string(),
        password: password.to_string(),
    }
}

fn login_input(email: &str, password: &str) -> LoginInput {
    LoginInput {
        email: email.to_string(),
        password: password.to_string(),
    }
}

/// Signs up and returns the verified token subject.
async fn signup_subject(ctx: &TestContext, email: &str, name: &str, password: &str) -> String {
    let token = ctx
        .accounts
        .signup(signup_input(email, name, password))
        .await
        .expect("signup should succeed");

    ctx.jwt
        .validate_token(&token)
        .expect("signup token should verify")
        .sub
}

#[tokio::test]
async fn signup_then_login_yields_tokens_for_the_same_user() {
    let ctx = setup().await;

    let signup_sub = signup_subject(&ctx, "a@x.com", "Al", "pw1").await;

    let stored = ctx
        .user_db
        .get_records_by_field("email", "a@x.com".to_string())
        .await
        .expect("store lookup should succeed");
    assert_eq!(stored.len(), 1, "signup persists exactly one record");
    assert_eq!(signup_sub, stored[0].record_key());

    let login_token = ctx
        .accounts
        .login(login_input("a@x.com", "pw1"))
        .await
        .expect("login with the same credentials should succeed");
    let login_sub = ctx
        .jwt
        .validate_token(&login_token)
        .expect("login token should verify")
        .sub;

    assert_eq!(login_sub, signup_sub);
}

#[tokio::test]
async fn signup_never_stores_the_plaintext_password() {
    let ctx = setup().await;
    signup_subject(&ctx, "a@x.com", "Al", "pw1").await;

    let stored = ctx
        .user_db
        .get_records_by_field("email", "a@x.com".to_string())
        .await
        .unwrap();
    assert_ne!(stored[0].password, "pw1");
    assert!(stored[0].password.starts_with("$argon2"));
}

#[tokio::test]
async fn duplicate_email_is_rejected_without_a_second_write() {
    let ctx = setup().await;
    signup_subject(&ctx, "a@x.com", "Al", "pw1").await;

    let result = ctx
        .accounts
        .signup(signup_input("a@x.com", "Other", "pw2"))
        .await;
    assert!(matches!(result, Err(AppError::DuplicateEmail(_))));

    let stored = ctx
        .user_db
        .get_records_by_field("email", "a@x.com".to_string())
        .await
        .unwrap();
    assert_eq!(stored.len(), 1, "no new record may be created");
}

#[tokio::test]
async fn signup_requires_user_name_and_password() {
    let ctx = setup().await;

    let result = ctx.accounts.signup(signup_input("a@x.com", "", "pw1")).await;
    assert!(matches!(result, Err(AppError::MissingField(_))));

    let result = ctx.accounts.signup(signup_input("a@x.com", "Al", "")).await;
    assert!(matches!(result, Err(AppError::MissingField(_))));
}

#[tokio::test]
async fn signup_rejects_a_malformed_email() {
    let ctx = setup().await;

    let result = ctx
        .accounts
        .signup(signup_input("not-an-email", "Al", "pw1"))
        .await;
    assert!(matches!(result, Err(AppError::ValidationFailed(_))));
}

#[tokio::test]
async fn login_with_unknown_email_fails() {
    let ctx = setup().await;

    let result = ctx.accounts.login(login_input("ghost@x.com", "pw1")).await;
    assert!(matches!(result, Err(AppError::UserNotFound(_))));
}

#[tokio::test]
async fn login_with_wrong_password_fails_and_changes_nothing() {
    let ctx = setup().await;
    signup_subject(&ctx, "a@x.com", "Al", "pw1").await;

    let before = ctx
        .user_db
        .get_records_by_field("email", "a@x.com".to_string())
        .await
        .unwrap();

    let result = ctx.accounts.login(login_input("a@x.com", "wrong")).await;
    assert!(matches!(result, Err(AppError::WrongCredentials)));

    let after = ctx
        .user_db
        .get_records_by_field("email", "a@x.com".to_string())
        .await
        .unwrap();
    assert_eq!(before[0].password, after[0].password);
    assert_eq!(after.len(), 1);
}

#[tokio::test]
async fn the_full_item_lifecycle_works() {
    let ctx = setup().await;
    let subject = signup_subject(&ctx, "a@x.com", "Al", "pw1").await;

    let (items, name) = ctx.items.list(&subject).await.unwrap();
    assert!(items.is_empty());
    assert_eq!(name, "Al");

    let items = ctx
        .items
        .append(&subject, Some(json!({"text": "buy milk"})))
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].get("text"), Some(&json!("buy milk")));

    let items = ctx.items.toggle_done(&subject, 0).await.unwrap();
    assert_eq!(items[0].get("done"), Some(&json!(true)));
    assert_eq!(items[0].get("text"), Some(&json!("buy milk")));

    let items = ctx.items.remove(&subject, 0).await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn appended_payload_fields_survive_verbatim() {
    let ctx = setup().await;
    let subject = signup_subject(&ctx, "a@x.com", "Al", "pw1").await;

    let payload = json!({
        "text": "call mom",
        "priority": 3,
        "tags": ["family", "urgent"],
        "meta": {"added_from": "phone"}
    });

    ctx.items
        .append(&subject, Some(payload.clone()))
        .await
        .unwrap();

    let (items, _) = ctx.items.list(&subject).await.unwrap();
    assert_eq!(serde_json::to_value(&items[0]).unwrap(), payload);
}

#[tokio::test]
async fn append_rejects_missing_and_non_object_payloads() {
    let ctx = setup().await;
    let subject = signup_subject(&ctx, "a@x.com", "Al", "pw1").await;

    let result = ctx.items.append(&subject, None).await;
    assert!(matches!(result, Err(AppError::EmptyBody)));

    let result = ctx.items.append(&subject, Some(json!("bare string"))).await;
    assert!(matches!(result, Err(AppError::EmptyBody)));

    let (items, _) = ctx.items.list(&subject).await.unwrap();
    assert!(items.is_empty(), "rejected payloads must not be stored");
}

#[tokio::test]
async fn toggling_twice_restores_the_original_state() {
    let ctx = setup().await;
    let subject = signup_subject(&ctx, "a@x.com", "Al", "pw1").await;

    ctx.items
        .append(&subject, Some(json!({"text": "buy milk", "done": false})))
        .await
        .unwrap();

    let items = ctx.items.toggle_done(&subject, 0).await.unwrap();
    assert_eq!(items[0].get("done"), Some(&json!(true)));

    let items = ctx.items.toggle_done(&subject, 0).await.unwrap();
    assert_eq!(items[0].get("done"), Some(&json!(false)));
}

#[tokio::test]
async fn toggle_touches_only_the_addressed_item() {
    let ctx = setup().await;
    let subject = signup_subject(&ctx, "a@x.com", "Al", "pw1").await;

    for text in ["one", "two", "three"] {
        ctx.items
            .append(&subject, Some(json!({"text": text})))
            .await
            .unwrap();
    }

    let items = ctx.items.toggle_done(&subject, 1).await.unwrap();
    assert_eq!(items[0].get("done"), None);
    assert_eq!(items[1].get("done"), Some(&json!(true)));
    assert_eq!(items[2].get("done"), None);
}

#[tokio::test]
async fn remove_shifts_later_items_down() {
    let ctx = setup().await;
    let subject = signup_subject(&ctx, "a@x.com", "Al", "pw1").await;

    for text in ["one", "two", "three"] {
        ctx.items
            .append(&subject, Some(json!({"text": text})))
            .await
            .unwrap();
    }

    let items = ctx.items.remove(&subject, 1).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].get("text"), Some(&json!("one")));
    assert_eq!(items[1].get("text"), Some(&json!("three")));
}

#[tokio::test]
async fn out_of_range_indices_fail_and_leave_the_list_alone() {
    let ctx = setup().await;
    let subject = signup_subject(&ctx, "a@x.com", "Al", "pw1").await;

    ctx.items
        .append(&subject, Some(json!({"text": "only"})))
        .await
        .unwrap();

    let result = ctx.items.toggle_done(&subject, 1).await;
    assert!(matches!(result, Err(AppError::IndexOutOfRange { .. })));

    let result = ctx.items.remove(&subject, 5).await;
    assert!(matches!(result, Err(AppError::IndexOutOfRange { .. })));

    let (items, _) = ctx.items.list(&subject).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].get("text"), Some(&json!("only")));
}

#[tokio::test]
async fn item_operations_fail_for_a_subject_that_no_longer_resolves() {
    let ctx = setup().await;

    let result = ctx.items.list("no-such-record").await;
    assert!(matches!(result, Err(AppError::UserNotFound(_))));
}
