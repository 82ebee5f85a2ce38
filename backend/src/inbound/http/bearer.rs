//! Bearer-token extraction for authenticated handlers.
//!
//! Handlers that require an actor take a [`CurrentAccount`] argument; the
//! extractor reads `Authorization: Bearer <token>` and resolves it through
//! the [`TokenAuthenticator`](crate::domain::ports::TokenAuthenticator) port
//! held in [`HttpState`].

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Account, Error};
use crate::inbound::http::state::HttpState;

pub(crate) const NOT_AUTHENTICATED_MESSAGE: &str = "Not authenticated";

/// Account resolved from the request's bearer token.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

impl CurrentAccount {
    pub fn into_inner(self) -> Account {
        self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_owned())
}

impl FromRequest for CurrentAccount {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = bearer_token(req);
        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not registered"))?;
            let token = token.ok_or_else(|| Error::unauthorized(NOT_AUTHENTICATED_MESSAGE))?;
            state.authenticator.authenticate(&token).await.map(Self)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test};
    use rstest::rstest;

    use crate::inbound::http::test_utils::{StatePorts, state_data};
    use crate::test_support::account;

    async fn whoami(current: CurrentAccount) -> HttpResponse {
        HttpResponse::Ok().body(current.into_inner().username.to_string())
    }

    async fn call(ports: StatePorts, header: Option<&str>) -> (StatusCode, String) {
        let app = test::init_service(
            App::new()
                .app_data(state_data(ports))
                .route("/", web::get().to(whoami)),
        )
        .await;
        let mut req = test::TestRequest::get().uri("/");
        if let Some(value) = header {
            req = req.insert_header((AUTHORIZATION, value));
        }
        let res = test::call_service(&app, req.to_request()).await;
        let status = res.status();
        let body = test::read_body(res).await;
        (
            status,
            String::from_utf8(body.to_vec()).expect("utf8 response body"),
        )
    }

    #[rstest]
    #[case("Bearer good-token")]
    #[case("bearer good-token")]
    #[case("  Bearer   good-token ")]
    #[actix_web::test]
    async fn resolves_account_from_bearer_header(#[case] header: &str) {
        let mut ports = StatePorts::default();
        ports
            .authenticator
            .expect_authenticate()
            .withf(|token| token == "good-token")
            .return_once(|_| Ok(account(1, "alice")));

        let (status, body) = call(ports, Some(header)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alice");
    }

    #[rstest]
    #[case(None)]
    #[case(Some("Basic YWxpY2U6cHc="))]
    #[case(Some("Bearer"))]
    #[case(Some("Bearer    "))]
    #[actix_web::test]
    async fn missing_or_foreign_scheme_is_unauthorised(#[case] header: Option<&str>) {
        let mut ports = StatePorts::default();
        ports.authenticator.expect_authenticate().times(0);

        let (status, body) = call(ports, header).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains(NOT_AUTHENTICATED_MESSAGE));
    }

    #[actix_web::test]
    async fn rejected_token_surfaces_authenticator_error() {
        let mut ports = StatePorts::default();
        ports
            .authenticator
            .expect_authenticate()
            .return_once(|_| Err(Error::unauthorized("Could not validate credentials")));

        let (status, body) = call(ports, Some("Bearer stale")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Could not validate credentials"));
    }
}
