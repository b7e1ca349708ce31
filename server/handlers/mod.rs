pub mod metadata;
pub mod preview;
pub mod settings;
pub mod thumb;

use std::io::Cursor;
use tiny_http::Response;

use crate::routes::error_response;
use crate::util::form::query_get;

/// Pulls the required `key` parameter, or the 422 response sent when it is missing.
pub(crate) fn required_key<'a>(
    pairs: &'a [(String, String)],
) -> Result<&'a str, Response<Cursor<Vec<u8>>>> {
    query_get(pairs, "key")
        .filter(|k| !k.is_empty())
        .ok_or_else(|| error_response(422, "missing query parameter: key"))
}
