use crate::har::{Header, Request};

/// True for the text-framed HTTP/1.x protocols, where header byte counts
/// can be derived from header text
pub fn is_http1x(version: &str) -> bool {
    version.to_ascii_lowercase().starts_with("http/1.")
}

/// Estimated size of the request head as it would appear on the wire
pub fn request_header_size(request: &Request) -> i64 {
    let start_line = format!(
        "{} {} {}\r\n",
        request.method, request.url, request.http_version
    );
    head_size(start_line, &request.headers)
}

/// Estimated size of a response head as it would appear on the wire
pub fn response_header_size(
    protocol: &str,
    status: i64,
    status_text: &str,
    headers: &[Header],
) -> i64 {
    let status_line = format!("{} {} {}\r\n", protocol, status, status_text);
    head_size(status_line, headers)
}

fn head_size(start_line: String, headers: &[Header]) -> i64 {
    let header_lines: usize = headers
        .iter()
        .map(|h| h.name.len() + ": ".len() + h.value.len() + "\r\n".len())
        .sum();
    (start_line.len() + header_lines + "\r\n".len()) as i64
}
