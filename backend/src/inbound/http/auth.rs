//! Account API handlers.
//!
//! ```text
//! POST /auth/register {"email":"alice@example.com","username":"alice","password":"hunter22"}
//! POST /auth/login    username=alice&password=hunter22   (form encoded)
//! GET  /auth/me       Authorization: Bearer <token>
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    AccessToken, Account, AccountValidationError, Error, LoginCredentials, LoginValidationError,
    Registration,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::CurrentAccount;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Registration request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "hunter22")]
    pub password: String,
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = AccountValidationError;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.username, &value.password)
    }
}

/// Form body for `POST /auth/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl TryFrom<LoginForm> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginForm) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AccountResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "alice")]
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.get(),
            email: account.email.to_string(),
            username: account.username.to_string(),
            created_at: account.created_at,
        }
    }
}

/// Bearer token issued by `POST /auth/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
}

impl From<AccessToken> for TokenResponse {
    fn from(token: AccessToken) -> Self {
        Self {
            access_token: token.as_str().to_owned(),
            token_type: AccessToken::TOKEN_TYPE.to_owned(),
        }
    }
}

fn map_registration_validation_error(err: AccountValidationError) -> Error {
    Error::invalid_request(err.to_string())
        .with_details(json!({ "field": err.field(), "code": err.code() }))
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyUsername => Error::invalid_request("username must not be empty")
            .with_details(json!({ "field": "username", "code": "empty_username" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Invalid or duplicate identity", body = ErrorSchema),
        (status = 503, description = "Account store unavailable", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration =
        Registration::try_from(payload.into_inner()).map_err(map_registration_validation_error)?;
    let account = state.registration.register(registration).await?;
    Ok(HttpResponse::Created().json(AccountResponse::from(account)))
}

/// Exchange a username and password for a bearer token.
///
/// Unknown usernames and wrong passwords produce the same 401 response.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    form: web::Form<LoginForm>,
) -> ApiResult<web::Json<TokenResponse>> {
    let credentials =
        LoginCredentials::try_from(form.into_inner()).map_err(map_login_validation_error)?;
    let token = state.login.login(&credentials).await?;
    Ok(web::Json(TokenResponse::from(token)))
}

/// Return the account that owns the presented bearer token.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "currentAccount"
)]
#[get("/me")]
pub async fn me(current: CurrentAccount) -> web::Json<AccountResponse> {
    web::Json(AccountResponse::from(current.into_inner()))
}
