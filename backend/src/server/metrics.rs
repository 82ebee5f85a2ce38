//! Request metrics middleware for the `metrics` feature.
//!
//! The server always wraps the app in [`RequestMetrics`]; when Prometheus
//! failed to initialise the layer only boxes response bodies, so the app's
//! service type is the same either way.

use std::sync::Arc;

use actix_service::boxed::{self, BoxService};
use actix_service::{Service, ServiceExt as _, Transform};
use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Compat;
use actix_web_prom::PrometheusMetrics;
use futures_util::future::LocalBoxFuture;

type BoxedApp = BoxService<ServiceRequest, ServiceResponse<BoxBody>, actix_web::Error>;

/// Optional Prometheus instrumentation shared by every worker.
#[derive(Clone, Default)]
pub(crate) struct RequestMetrics {
    prometheus: Option<Arc<PrometheusMetrics>>,
}

impl RequestMetrics {
    pub(crate) fn is_enabled(&self) -> bool {
        self.prometheus.is_some()
    }
}

impl From<Option<PrometheusMetrics>> for RequestMetrics {
    fn from(prometheus: Option<PrometheusMetrics>) -> Self {
        Self {
            prometheus: prometheus.map(Arc::new),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestMetrics
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = BoxedApp;
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let Some(prometheus) = self.prometheus.clone() else {
            let passthrough = service.map(|res: ServiceResponse<B>| res.map_into_boxed_body());
            return Box::pin(async move { Ok(boxed::service(passthrough)) });
        };

        let instrumented =
            Compat::new(PrometheusMetrics::clone(&prometheus)).new_transform(service);
        Box::pin(async move { Ok(boxed::service(instrumented.await?)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test, web};
    use actix_web_prom::PrometheusMetricsBuilder;

    async fn pong() -> HttpResponse {
        HttpResponse::Ok().body("pong")
    }

    fn get(uri: &str) -> actix_http::Request {
        actix_test::TestRequest::get().uri(uri).to_request()
    }

    #[actix_web::test]
    async fn disabled_layer_passes_responses_through() {
        let layer = RequestMetrics::from(None);
        assert!(!layer.is_enabled());
        let app =
            actix_test::init_service(App::new().wrap(layer).route("/ping", web::get().to(pong)))
                .await;

        let res = actix_test::call_service(&app, get("/ping")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(res).await, "pong");

        let res = actix_test::call_service(&app, get("/metrics")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn enabled_layer_serves_the_scrape_endpoint() {
        let prometheus = PrometheusMetricsBuilder::new("upvote_test")
            .endpoint("/metrics")
            .build()
            .expect("metrics builder");
        let layer = RequestMetrics::from(Some(prometheus));
        assert!(layer.is_enabled());
        let app =
            actix_test::init_service(App::new().wrap(layer).route("/ping", web::get().to(pong)))
                .await;

        let res = actix_test::call_service(&app, get("/ping")).await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = actix_test::call_service(&app, get("/metrics")).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = actix_test::read_body(res).await;
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("upvote_test_http_requests_total"), "scrape output: {text}");
    }
}
