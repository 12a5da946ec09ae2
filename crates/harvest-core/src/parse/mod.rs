//! Helpers turning raw browser payload fragments into HAR fields.
//!
//! Everything here is a pure function of its input: header objects become
//! ordered name/value lists, cookie headers become [`Cookie`](crate::har::Cookie)
//! lists, request bodies become [`PostData`](crate::har::PostData) descriptors.

mod cookies;
mod header_size;
mod headers;
mod params;

pub use cookies::{parse_request_cookies, parse_response_cookies, parse_set_cookie};
pub use header_size::{is_http1x, request_header_size, response_header_size};
pub use headers::{RawHeaders, get_header_value, parse_headers};
pub use params::{parse_post_data, query_params};
