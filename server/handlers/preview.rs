use std::io::Cursor;
use tiny_http::Response;

use weight_helper::get_preview_info;

use crate::handlers::required_key;
use crate::routes::json_response;
use crate::state::SharedState;

/// POST /whapi/v1/get_preview_info?key=<name>
pub fn handle(pairs: &[(String, String)], state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let key = match required_key(pairs) {
        Ok(key) => key,
        Err(response) => return response,
    };

    let body = get_preview_info(state.registry.as_ref(), &state.settings, key);
    json_response(200, &body)
}
