// Extractor error handlers
//
// Malformed bodies, query strings and path segments are reported in the
// same JSON error shape as every other `AppError`.

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError},
    Error, HttpRequest,
};

use crate::core::AppError;

pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> Error {
    log_error(req, &err);
    AppError::validation(format!("Invalid request body: {}", err)).into()
}

pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> Error {
    log_error(req, &err);
    AppError::validation(format!("Invalid query string: {}", err)).into()
}

pub fn path_error_handler(err: PathError, req: &HttpRequest) -> Error {
    log_error(req, &err);
    AppError::validation(format!("Invalid path parameter: {}", err)).into()
}

pub fn log_error(req: &HttpRequest, err: &dyn std::fmt::Display) {
    tracing::debug!(
        method = %req.method(),
        path = %req.path(),
        error = %err,
        "Rejected malformed request"
    );
}
