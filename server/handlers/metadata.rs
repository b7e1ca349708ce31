use std::io::Cursor;
use tiny_http::Response;

use weight_helper::get_metadata;

use crate::handlers::required_key;
use crate::routes::json_response;
use crate::state::SharedState;
use crate::util::form::query_flag;

/// POST /whapi/v1/get_metadata?key=<name>&force=<bool>
pub fn handle(pairs: &[(String, String)], state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let key = match required_key(pairs) {
        Ok(key) => key,
        Err(response) => return response,
    };
    let force = query_flag(pairs, "force");

    let body = get_metadata(state.registry.as_ref(), &state.settings, key, force);
    json_response(200, &body)
}
