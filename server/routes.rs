use std::io::Cursor;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use weight_helper::api::API_PREFIX;

use crate::handlers;
use crate::state::SharedState;
use crate::util::form::parse_query;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn header(name: &str, value: &str) -> Header {
    // Names and values are ASCII constants or sanitized content types.
    Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("static header is valid")
}

pub fn json_response<T: serde::Serialize>(status: u16, body: &T) -> Response<Cursor<Vec<u8>>> {
    let bytes = match serde_json::to_vec(body) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("failed to serialize response: {}", e);
            return error_response(500, "failed to serialize response");
        }
    };
    let len = bytes.len();
    Response::new(
        StatusCode(status),
        vec![header("Content-Type", "application/json")],
        Cursor::new(bytes),
        Some(len),
        None,
    )
}

pub fn error_response(status: u16, detail: &str) -> Response<Cursor<Vec<u8>>> {
    let bytes = serde_json::json!({ "detail": detail }).to_string().into_bytes();
    let len = bytes.len();
    Response::new(
        StatusCode(status),
        vec![header("Content-Type", "application/json")],
        Cursor::new(bytes),
        Some(len),
        None,
    )
}

pub fn bytes_response(bytes: Vec<u8>, content_type: &str) -> Response<Cursor<Vec<u8>>> {
    let len = bytes.len();
    Response::new(
        StatusCode(200),
        vec![
            header("Content-Type", content_type),
            header("Cache-Control", "max-age=3600"),
        ],
        Cursor::new(bytes),
        Some(len),
        None,
    )
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    error_response(404, "Not Found")
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Dispatches incoming requests to the appropriate handler and responds.
pub fn dispatch(request: Request, state: SharedState) {
    let method = request.method().clone();
    let url = request.url().to_owned();

    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path.to_owned(), query.to_owned()),
        None => (url.clone(), String::new()),
    };
    let pairs = parse_query(&query);

    let endpoint = path.strip_prefix(API_PREFIX).unwrap_or("");
    let response = match (&method, endpoint, path.as_str()) {
        (Method::Post, "/get_metadata", _) => handlers::metadata::handle(&pairs, &state),
        (Method::Post, "/get_preview_info", _) => handlers::preview::handle(&pairs, &state),
        (Method::Get | Method::Post, "/get_settings", _) => handlers::settings::handle(&state),
        (Method::Get, _, "/sd_extra_networks/thumb") => handlers::thumb::handle(&pairs, &state),
        _ => not_found(),
    };

    tracing::debug!("{} {} -> {}", method, path, response.status_code().0);
    if let Err(e) = request.respond(response) {
        tracing::warn!("failed to send response for {}: {}", path, e);
    }
}
