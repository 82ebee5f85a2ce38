//! Tests for registration, login, and token resolution.

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::ports::{MockAccountRepository, StoredCredentials};
use crate::domain::{AccountId, ErrorCode};
use crate::test_support::{account, credential_service};

fn make_service(repo: MockAccountRepository) -> AccountService<MockAccountRepository> {
    AccountService::new(Arc::new(repo), Arc::new(credential_service()))
}

fn registration() -> Registration {
    Registration::try_from_parts("alice@example.com", "alice", "hunter2222")
        .expect("valid registration")
}

#[tokio::test]
async fn register_hashes_password_before_insert() {
    let mut repo = MockAccountRepository::new();
    repo.expect_find_by_email()
        .times(1)
        .return_once(|_| Ok(None));
    repo.expect_find_by_username()
        .times(1)
        .return_once(|_| Ok(None));
    repo.expect_create()
        .withf(|new_account| {
            new_account.username.as_ref() == "alice"
                && new_account.password_hash.starts_with("$argon2id$")
                && !new_account.password_hash.contains("hunter2222")
        })
        .times(1)
        .return_once(|_| Ok(account(1, "alice")));

    let created = make_service(repo)
        .register(registration())
        .await
        .expect("registration succeeds");
    assert_eq!(created.id, AccountId::new(1));
}

#[rstest]
#[case(true, false, "email", "Email already registered")]
#[case(false, true, "username", "Username already taken")]
#[tokio::test]
async fn register_rejects_existing_identity(
    #[case] email_taken: bool,
    #[case] username_taken: bool,
    #[case] field: &str,
    #[case] message: &str,
) {
    let mut repo = MockAccountRepository::new();
    repo.expect_find_by_email()
        .returning(move |_| Ok(email_taken.then(|| account(9, "existing"))));
    repo.expect_find_by_username()
        .returning(move |_| Ok(username_taken.then(|| account(9, "existing"))));
    repo.expect_create().times(0);

    let error = make_service(repo)
        .register(registration())
        .await
        .expect_err("duplicate identity");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(error.message(), message);
    let details = error.details().expect("details present");
    assert_eq!(details["field"], field);
    assert_eq!(details["code"], "duplicate_identity");
}

#[tokio::test]
async fn register_maps_unique_violation_raced_past_precheck() {
    let mut repo = MockAccountRepository::new();
    repo.expect_find_by_email().return_once(|_| Ok(None));
    repo.expect_find_by_username().return_once(|_| Ok(None));
    repo.expect_create()
        .return_once(|_| Err(AccountRepositoryError::duplicate_identity(IdentityField::Email)));

    let error = make_service(repo)
        .register(registration())
        .await
        .expect_err("duplicate identity");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(error.message(), "Email already registered");
}

#[rstest]
#[case(AccountRepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
#[case(AccountRepositoryError::query("syntax"), ErrorCode::InternalError)]
#[tokio::test]
async fn register_maps_infrastructure_errors(
    #[case] failure: AccountRepositoryError,
    #[case] expected: ErrorCode,
) {
    let mut repo = MockAccountRepository::new();
    repo.expect_find_by_email().return_once(move |_| Err(failure));

    let error = make_service(repo)
        .register(registration())
        .await
        .expect_err("infrastructure failure");
    assert_eq!(error.code(), expected);
}

fn stored_credentials(password: &str) -> StoredCredentials {
    let hash = credential_service()
        .hash_password(password)
        .expect("hashing succeeds");
    StoredCredentials {
        account: account(3, "bob"),
        password_hash: hash,
    }
}

#[tokio::test]
async fn login_issues_token_for_matching_password() {
    let stored = stored_credentials("correct horse");
    let mut repo = MockAccountRepository::new();
    repo.expect_find_credentials()
        .withf(|username| username == "bob")
        .return_once(move |_| Ok(Some(stored)));

    let service = make_service(repo);
    let creds = LoginCredentials::try_from_parts("bob", "correct horse").expect("valid");
    let token = service.login(&creds).await.expect("login succeeds");

    assert_eq!(
        credential_service().verify(token.as_str()),
        Ok(AccountId::new(3))
    );
}

#[rstest]
#[case(Some("other password"))]
#[case(None)]
#[tokio::test]
async fn login_failures_share_one_message(#[case] stored_password: Option<&'static str>) {
    let stored = stored_password.map(stored_credentials);
    let mut repo = MockAccountRepository::new();
    repo.expect_find_credentials()
        .return_once(move |_| Ok(stored));

    let creds = LoginCredentials::try_from_parts("bob", "correct horse").expect("valid");
    let error = make_service(repo)
        .login(&creds)
        .await
        .expect_err("login fails");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert_eq!(error.message(), INVALID_LOGIN_MESSAGE);
}

#[tokio::test]
async fn authenticate_resolves_token_subject() {
    let token = credential_service()
        .issue(AccountId::new(3))
        .expect("token issued");
    let mut repo = MockAccountRepository::new();
    repo.expect_find_by_id()
        .withf(|id| *id == AccountId::new(3))
        .return_once(|_| Ok(Some(account(3, "bob"))));

    let resolved = make_service(repo)
        .authenticate(token.as_str())
        .await
        .expect("token accepted");
    assert_eq!(resolved.username.as_ref(), "bob");
}

#[tokio::test]
async fn authenticate_rejects_garbage_without_touching_store() {
    let mut repo = MockAccountRepository::new();
    repo.expect_find_by_id().times(0);

    let error = make_service(repo)
        .authenticate("not.a.token")
        .await
        .expect_err("garbage rejected");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert_eq!(error.message(), INVALID_TOKEN_MESSAGE);
}

#[tokio::test]
async fn authenticate_rejects_tokens_for_deleted_accounts() {
    let token = credential_service()
        .issue(AccountId::new(77))
        .expect("token issued");
    let mut repo = MockAccountRepository::new();
    repo.expect_find_by_id().return_once(|_| Ok(None));

    let error = make_service(repo)
        .authenticate(token.as_str())
        .await
        .expect_err("unknown subject rejected");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
}
