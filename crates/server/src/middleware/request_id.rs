//! Request correlation ids.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// Header carrying the correlation id in both directions.
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Tag each request with an id, reusing one set by an upstream proxy.
///
/// The id is written back onto the request (so later layers see it),
/// recorded on the current span, set as a Sentry tag and echoed in the
/// response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);

    let header = HeaderValue::from_str(&request_id).ok();
    if let Some(value) = &header {
        request
            .headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), value.clone());
    }

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));

    let mut response = next.run(request).await;
    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }
    response
}
