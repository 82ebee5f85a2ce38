//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every handler in the inbound HTTP layer, the request
//! and response DTOs, the [`ErrorSchema`] wrapper for the domain error, and
//! the bearer token security scheme. Public endpoints opt out of the default
//! security requirement in their own `#[utoipa::path]` attributes.
//!
//! Swagger UI serves the document in debug builds; `openapi-dump` prints it.

use crate::inbound::http::auth::{AccountResponse, LoginForm, RegisterRequest, TokenResponse};
use crate::inbound::http::health::{ProbeReport, ProbeStatus, StorageBackend};
use crate::inbound::http::posts::{CreatePostRequest, PostResponse, UpdatePostRequest};
use crate::inbound::http::root::WelcomeResponse;
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::votes::{BallotStateResponse, VoteBody, VoteResponse};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Security scheme name referenced by authenticated paths.
pub const BEARER_SCHEME: &str = "BearerAuth";

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.bearer_format = Some("HS256".to_owned());
        bearer.description = Some("Access token issued by POST /auth/login.".to_owned());
        components.add_security_scheme(BEARER_SCHEME, SecurityScheme::Http(bearer));
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Upvote API",
        description = "Accounts, posts, and one-vote-per-account ballots over bearer tokens."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::root::root,
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::me,
        crate::inbound::http::posts::create_post,
        crate::inbound::http::posts::list_posts,
        crate::inbound::http::posts::get_post,
        crate::inbound::http::posts::list_posts_by_owner,
        crate::inbound::http::posts::update_post,
        crate::inbound::http::posts::delete_post,
        crate::inbound::http::votes::vote,
        crate::inbound::http::votes::vote_count,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        WelcomeResponse,
        RegisterRequest,
        LoginForm,
        AccountResponse,
        TokenResponse,
        CreatePostRequest,
        UpdatePostRequest,
        PostResponse,
        VoteBody,
        VoteResponse,
        BallotStateResponse,
        ProbeReport,
        ProbeStatus,
        StorageBackend,
    )),
    tags(
        (name = "root", description = "Service greeting"),
        (name = "auth", description = "Registration, login, and the current account"),
        (name = "posts", description = "Publishing and reading posts"),
        (name = "votes", description = "Casting and counting votes"),
        (name = "health", description = "Readiness and liveness probes")
    )
)]
pub struct ApiDoc;
