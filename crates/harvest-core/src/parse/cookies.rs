use crate::har::Cookie;
use chrono::{NaiveDateTime, SecondsFormat};

const EXPIRES_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S GMT",
    "%a, %d-%b-%y %H:%M:%S GMT",
    "%A, %d-%b-%y %H:%M:%S GMT",
    "%a, %d-%b-%Y %H:%M:%S GMT",
];

/// Parse a `Cookie` request header (`a=1; b=2`)
pub fn parse_request_cookies(header: &str) -> Vec<Cookie> {
    header
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = split_pair(pair);
            Cookie::new(name, value)
        })
        .collect()
}

/// Parse a folded `Set-Cookie` response header, one cookie per line
pub fn parse_response_cookies(header: &str) -> Vec<Cookie> {
    header.lines().filter_map(parse_set_cookie).collect()
}

/// Parse a single `Set-Cookie` value with its attributes
pub fn parse_set_cookie(line: &str) -> Option<Cookie> {
    let mut parts = line.split(';').map(str::trim);
    let pair = parts.next().filter(|p| !p.is_empty())?;

    let (name, value) = split_pair(pair);
    let mut cookie = Cookie::new(name, value);

    for attribute in parts {
        let (key, val) = match attribute.split_once('=') {
            Some((key, val)) => (key.trim(), Some(val.trim())),
            None => (attribute, None),
        };

        match key.to_ascii_lowercase().as_str() {
            "path" => cookie.path = val.filter(|v| !v.is_empty()).map(str::to_string),
            "domain" => cookie.domain = val.filter(|v| !v.is_empty()).map(str::to_string),
            "expires" => cookie.expires = val.and_then(parse_expires),
            "httponly" => cookie.http_only = Some(true),
            "secure" => cookie.secure = Some(true),
            _ => {}
        }
    }

    Some(cookie)
}

fn split_pair(pair: &str) -> (&str, &str) {
    match pair.split_once('=') {
        Some((name, value)) => (name.trim(), value.trim()),
        None => ("", pair),
    }
}

fn parse_expires(value: &str) -> Option<String> {
    let parsed = EXPIRES_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok());

    match parsed {
        Some(when) => Some(when.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => {
            tracing::debug!("Ignoring unparseable cookie expiry: {}", value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_cookies() {
        let cookies = parse_request_cookies("sid=abc123; theme=dark;;  lang = en ");
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies[0], Cookie::new("sid", "abc123"));
        assert_eq!(cookies[2].name, "lang");
        assert_eq!(cookies[2].value, "en");
    }

    #[test]
    fn test_parse_request_cookie_without_equals() {
        let cookies = parse_request_cookies("flag");
        assert_eq!(cookies, vec![Cookie::new("", "flag")]);
    }

    #[test]
    fn test_parse_set_cookie_attributes() {
        let cookie = parse_set_cookie(
            "id=a3fWa; Expires=Wed, 21 Oct 2015 07:28:00 GMT; Path=/docs; Domain=example.com; Secure; HttpOnly",
        )
        .unwrap();

        assert_eq!(cookie.name, "id");
        assert_eq!(cookie.value, "a3fWa");
        assert_eq!(cookie.path.as_deref(), Some("/docs"));
        assert_eq!(cookie.domain.as_deref(), Some("example.com"));
        assert_eq!(cookie.expires.as_deref(), Some("2015-10-21T07:28:00.000Z"));
        assert_eq!(cookie.secure, Some(true));
        assert_eq!(cookie.http_only, Some(true));
    }

    #[test]
    fn test_parse_response_cookies_one_per_line() {
        let cookies = parse_response_cookies("a=1; Path=/\nb=2; Expires=Thu, 01-Jan-70 00:00:01 GMT\n");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[1].name, "b");
        assert_eq!(cookies[1].expires.as_deref(), Some("1970-01-01T00:00:01.000Z"));
    }

    #[test]
    fn test_bad_expiry_is_dropped() {
        let cookie = parse_set_cookie("a=1; Expires=someday").unwrap();
        assert_eq!(cookie.expires, None);
    }
}
