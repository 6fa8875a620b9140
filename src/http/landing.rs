//! Static informational page served at `/` and `/index.html`.

use axum::{
    body::Body,
    http::{header, HeaderValue, Method},
    response::Response,
};

use crate::http::cors;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// True for requests the landing page answers.
pub fn is_landing_request(method: &Method, path: &str) -> bool {
    (method == Method::GET || method == Method::HEAD) && (path == "/" || path == "/index.html")
}

pub fn landing_response(method: &Method) -> Response {
    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        Body::from(INDEX_HTML)
    };
    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    cors::apply(headers);
    response
}
