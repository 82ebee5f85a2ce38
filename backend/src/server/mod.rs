//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod settings;
mod state_builders;

pub use config::ServerConfig;
pub use settings::{ServerSettings, SettingsError};

#[cfg(feature = "metrics")]
use metrics::RequestMetrics;
use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use upvote::Trace;
#[cfg(debug_assertions)]
use upvote::doc::ApiDoc;
use upvote::inbound::http::auth::{login, me, register};
use upvote::inbound::http::error::ExtractorConfig;
use upvote::inbound::http::health::{HealthState, StorageBackend, live, ready};
use upvote::inbound::http::posts::{
    create_post, delete_post, get_post, list_posts, list_posts_by_owner, update_post,
};
use upvote::inbound::http::root::root;
use upvote::inbound::http::state::HttpState;
use upvote::inbound::http::votes::{vote, vote_count};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
    } = deps;
    let extractors = ExtractorConfig::default();

    // `/posts/user/{user_id}` must be registered before `/posts/{id}`.
    let posts = web::scope("/posts")
        .service(create_post)
        .service(list_posts)
        .service(list_posts_by_owner)
        .service(get_post)
        .service(update_post)
        .service(delete_post);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(extractors.json)
        .app_data(extractors.form)
        .app_data(extractors.query)
        .app_data(extractors.path)
        .wrap(Trace)
        .service(root)
        .service(web::scope("/auth").service(register).service(login).service(me))
        .service(posts)
        .service(web::scope("/vote").service(vote).service(vote_count))
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// Readiness flips to healthy once the listener is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let storage = if config.db_pool.is_some() {
        StorageBackend::Postgres
    } else {
        StorageBackend::Memory
    };
    let http_state = build_http_state(&config);
    let ServerConfig {
        bind_addr,
        #[cfg(feature = "metrics")]
        prometheus,
        ..
    } = config;

    #[cfg(feature = "metrics")]
    let metrics_layer = RequestMetrics::from(prometheus);
    #[cfg(feature = "metrics")]
    tracing::info!(enabled = metrics_layer.is_enabled(), "request metrics");

    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready(storage);
    Ok(server)
}
