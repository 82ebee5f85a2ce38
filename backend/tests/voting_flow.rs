//! End-to-end voting scenario over the HTTP layer and in-memory repositories.
//!
//! Alice and Bob register, Alice publishes a post, and Bob votes on it. The
//! scenario walks every ballot transition and checks the stored count after
//! each one.

use std::sync::Arc;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test as actix_test, web};
use argon2::Params;
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Value, json};

use upvote::Trace;
use upvote::domain::{
    AccountService, CredentialService, PostService, TokenAlgorithm, TokenSettings, VoteService,
};
use upvote::inbound::http::auth::{login, me, register};
use upvote::inbound::http::error::ExtractorConfig;
use upvote::inbound::http::posts::{
    create_post, delete_post, get_post, list_posts, list_posts_by_owner, update_post,
};
use upvote::inbound::http::state::HttpState;
use upvote::inbound::http::votes::{vote, vote_count};
use upvote::outbound::memory::InMemoryStore;

fn state() -> web::Data<HttpState> {
    let store = Arc::new(InMemoryStore::default());
    let settings = TokenSettings::new(vec![b's'; 32], TokenAlgorithm::Hs256, 30)
        .expect("valid token settings");
    let params = Params::new(8, 1, 1, None).expect("cheap argon2 params");
    let credentials = Arc::new(CredentialService::with_hash_params(
        settings,
        Arc::new(DefaultClock),
        params,
    ));
    web::Data::new(HttpState::from_services(
        Arc::new(AccountService::new(store.clone(), credentials)),
        Arc::new(PostService::new(store.clone())),
        Arc::new(VoteService::new(store.clone(), store)),
    ))
}

async fn app() -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
{
    let extractors = ExtractorConfig::default();
    actix_test::init_service(
        App::new()
            .app_data(state())
            .app_data(extractors.json)
            .app_data(extractors.form)
            .app_data(extractors.query)
            .app_data(extractors.path)
            .wrap(Trace)
            .service(web::scope("/auth").service(register).service(login).service(me))
            .service(
                web::scope("/posts")
                    .service(create_post)
                    .service(list_posts)
                    .service(list_posts_by_owner)
                    .service(get_post)
                    .service(update_post)
                    .service(delete_post),
            )
            .service(web::scope("/vote").service(vote).service(vote_count)),
    )
    .await
}

async fn send<S>(app: &S, request: actix_test::TestRequest) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = actix_test::call_service(app, request.to_request()).await;
    let status = response.status();
    let body = actix_test::read_body(response).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };
    (status, value)
}

async fn register_and_login<S>(app: &S, username: &str) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, _) = send(
        app,
        actix_test::TestRequest::post().uri("/auth/register").set_json(json!({
            "email": format!("{username}@example.com"),
            "username": username,
            "password": "hunter22",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register {username}");

    let (status, body) = send(
        app,
        actix_test::TestRequest::post()
            .uri("/auth/login")
            .set_form([("username", username), ("password", "hunter22")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login {username}");
    assert_eq!(body["token_type"], "bearer");
    body["access_token"]
        .as_str()
        .expect("token string")
        .to_owned()
}

fn bearer(request: actix_test::TestRequest, token: &str) -> actix_test::TestRequest {
    request.insert_header((AUTHORIZATION, format!("Bearer {token}")))
}

fn cast(post_id: i64, dir: i64) -> actix_test::TestRequest {
    actix_test::TestRequest::post()
        .uri("/vote/")
        .set_json(json!({ "post_id": post_id, "dir": dir }))
}

async fn stored_votes<S>(app: &S, post_id: i64) -> (i64, i64)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (_, count) = send(
        app,
        actix_test::TestRequest::get().uri(&format!("/vote/{post_id}/count")),
    )
    .await;
    let (_, post) = send(
        app,
        actix_test::TestRequest::get().uri(&format!("/posts/{post_id}")),
    )
    .await;
    (
        count.as_i64().expect("integer count"),
        post["votes"].as_i64().expect("integer votes"),
    )
}

#[rstest]
#[actix_web::test]
async fn alice_and_bob_vote_lifecycle() {
    let app = app().await;
    let alice = register_and_login(&app, "alice").await;
    let bob = register_and_login(&app, "bob").await;

    let (status, post) = send(
        &app,
        bearer(actix_test::TestRequest::post().uri("/posts/"), &alice).set_json(json!({
            "title": "Hello world",
            "content": "Alice writes her first post.",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post["owner_username"], "alice");
    assert_eq!(post["votes"], 0);
    let post_id = post["id"].as_i64().expect("post id");

    let (status, body) = send(&app, bearer(cast(post_id, 1), &alice)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You cannot vote on your own post");

    let (status, body) = send(&app, bearer(cast(post_id, 1), &bob)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Successfully added vote");
    assert_eq!(stored_votes(&app, post_id).await, (1, 1));

    let (status, _) = send(&app, bearer(cast(post_id, 1), &bob)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(stored_votes(&app, post_id).await, (1, 1));

    let (status, body) = send(&app, bearer(cast(post_id, 0), &bob)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Successfully deleted vote");
    assert_eq!(stored_votes(&app, post_id).await, (0, 0));

    let (status, body) = send(&app, bearer(cast(post_id, 0), &bob)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Vote does not exist");
}

#[rstest]
#[actix_web::test]
async fn only_the_owner_may_change_a_post() {
    let app = app().await;
    let alice = register_and_login(&app, "alice").await;
    let bob = register_and_login(&app, "bob").await;
    let (_, post) = send(
        &app,
        bearer(actix_test::TestRequest::post().uri("/posts/"), &alice).set_json(json!({
            "title": "Mine alone",
            "content": "Only Alice may edit this.",
        })),
    )
    .await;
    let post_id = post["id"].as_i64().expect("post id");
    send(&app, bearer(cast(post_id, 1), &bob)).await;

    let (status, _) = send(
        &app,
        bearer(
            actix_test::TestRequest::put().uri(&format!("/posts/{post_id}")),
            &bob,
        )
        .set_json(json!({ "title": "Stolen" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        bearer(
            actix_test::TestRequest::delete().uri(&format!("/posts/{post_id}")),
            &bob,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = send(
        &app,
        bearer(
            actix_test::TestRequest::put().uri(&format!("/posts/{post_id}")),
            &alice,
        )
        .set_json(json!({ "title": "Still mine" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Still mine");
    assert_eq!(updated["votes"], 1);

    let (status, _) = send(
        &app,
        bearer(
            actix_test::TestRequest::delete().uri(&format!("/posts/{post_id}")),
            &alice,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        actix_test::TestRequest::get().uri(&format!("/posts/{post_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        actix_test::TestRequest::get().uri(&format!("/vote/{post_id}/count")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[rstest]
#[actix_web::test]
async fn registration_and_login_reject_bad_identities() {
    let app = app().await;
    let alice = register_and_login(&app, "alice").await;

    let (status, body) = send(
        &app,
        actix_test::TestRequest::post().uri("/auth/register").set_json(json!({
            "email": "ALICE@example.com",
            "username": "alice2",
            "password": "hunter22",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], "duplicate_identity");

    let (status, _) = send(
        &app,
        actix_test::TestRequest::post()
            .uri("/auth/login")
            .set_form([("username", "alice"), ("password", "wrong-pass")]),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, me_body) = send(
        &app,
        bearer(actix_test::TestRequest::get().uri("/auth/me"), &alice),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me_body["username"], "alice");
    assert!(me_body.get("password_hash").is_none());

    let (status, _) = send(
        &app,
        bearer(actix_test::TestRequest::get().uri("/auth/me"), "not.a.token"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
