//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while allowing Actix
//! handlers to turn domain failures into consistent JSON responses and status
//! codes. Extractor failures (bad JSON, form, query, or path input) are routed
//! through the same envelope.

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError, UrlencodedError};
use actix_web::http::header::WWW_AUTHENTICATE;
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode, web};
use serde_json::json;
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

pub use crate::domain::ApiResult;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) {
        let mut redacted = Error::internal("Internal server error");
        if let Some(id) = error.trace_id() {
            redacted = redacted.with_trace_id(id.to_owned());
        }
        redacted
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self.code(), ErrorCode::InternalError) {
            error!(
                trace_id = self.trace_id().unwrap_or("-"),
                message = self.message(),
                "request failed with internal error"
            );
        }

        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        if matches!(self.code(), ErrorCode::Unauthorized) {
            builder.insert_header((WWW_AUTHENTICATE, "Bearer"));
        }

        builder.json(redact_if_internal(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        // Do not leak implementation details to clients.
        error!(error = %err, "actix error promoted to domain error");
        Error::internal("Internal server error")
    }
}

fn malformed(source: &'static str, detail: String) -> actix_web::Error {
    Error::invalid_request(format!("Malformed {source}"))
        .with_details(json!({ "code": "malformed_input", "reason": detail }))
        .into()
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    malformed("JSON body", err.to_string())
}

fn form_error_handler(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    malformed("form body", err.to_string())
}

fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    malformed("query string", err.to_string())
}

fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    malformed("path parameter", err.to_string())
}

/// Extractor configurations that render input errors as domain errors.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use upvote::inbound::http::error::ExtractorConfig;
///
/// let config = ExtractorConfig::default();
/// let _app = App::new()
///     .app_data(config.json)
///     .app_data(config.form)
///     .app_data(config.query)
///     .app_data(config.path);
/// ```
pub struct ExtractorConfig {
    pub json: web::JsonConfig,
    pub form: web::FormConfig,
    pub query: web::QueryConfig,
    pub path: web::PathConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            json: web::JsonConfig::default().error_handler(json_error_handler),
            form: web::FormConfig::default().error_handler(form_error_handler),
            query: web::QueryConfig::default().error_handler(query_error_handler),
            path: web::PathConfig::default().error_handler(path_error_handler),
        }
    }
}

#[cfg(test)]
mod tests;
