use std::io::Cursor;
use tiny_http::Response;

use crate::routes::json_response;
use crate::state::SharedState;

/// GET|POST /whapi/v1/get_settings
pub fn handle(state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    json_response(200, &state.settings)
}
