//! Landing endpoint.

use actix_web::{get, web};
use serde::{Deserialize, Serialize};

pub(crate) const WELCOME_MESSAGE: &str = "Welcome to the upvote API";

/// Body of `GET /`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct WelcomeResponse {
    #[schema(example = "Welcome to the upvote API")]
    pub message: String,
}

/// Greet clients and confirm the API is reachable.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Welcome message", body = WelcomeResponse)),
    tags = ["root"],
    operation_id = "root",
    security([])
)]
#[get("/")]
pub async fn root() -> web::Json<WelcomeResponse> {
    web::Json(WelcomeResponse {
        message: WELCOME_MESSAGE.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn root_returns_welcome_message() {
        let app = test::init_service(App::new().service(root)).await;
        let body: WelcomeResponse =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request())
                .await;
        assert_eq!(body.message, WELCOME_MESSAGE);
    }
}
