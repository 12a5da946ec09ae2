use crate::har::{Param, PostData, QueryParam};
use crate::{Error, Result};
use mime::Mime;
use serde_json::Value;
use url::Url;

/// Decoded query-string pairs in URL order
pub fn query_params(url: &Url) -> Vec<QueryParam> {
    url.query_pairs()
        .map(|(name, value)| QueryParam {
            name: name.into_owned(),
            value: value.into_owned(),
        })
        .collect()
}

/// Describe a request body.
///
/// Form and JSON bodies are broken into params; anything else is kept as
/// text. A JSON body that does not parse is an error.
pub fn parse_post_data(content_type: Option<&str>, body: Option<&str>) -> Result<Option<PostData>> {
    let (Some(content_type), Some(body)) = (content_type, body) else {
        return Ok(None);
    };
    if content_type.is_empty() || body.is_empty() {
        return Ok(None);
    }

    let params = match content_type.parse::<Mime>() {
        Ok(mime) if is_form(&mime) => Some(form_params(body)),
        Ok(mime) if is_json(&mime) => json_params(content_type, body)?,
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Unrecognised content type {:?}: {}", content_type, e);
            None
        }
    };

    let post_data = match params {
        Some(params) => PostData {
            mime_type: content_type.to_string(),
            params: Some(params),
            text: None,
        },
        None => PostData {
            mime_type: content_type.to_string(),
            params: None,
            text: Some(body.to_string()),
        },
    };

    Ok(Some(post_data))
}

fn is_form(mime: &Mime) -> bool {
    mime.type_() == mime::APPLICATION && mime.subtype() == mime::WWW_FORM_URLENCODED
}

fn is_json(mime: &Mime) -> bool {
    mime.type_() == mime::APPLICATION && mime.subtype() == mime::JSON
}

fn form_params(body: &str) -> Vec<Param> {
    url::form_urlencoded::parse(body.as_bytes())
        .map(|(name, value)| Param {
            name: name.into_owned(),
            value: Some(Value::String(value.into_owned())),
        })
        .collect()
}

fn json_params(content_type: &str, body: &str) -> Result<Option<Vec<Param>>> {
    let parsed: Value = serde_json::from_str(body).map_err(|e| Error::MalformedPostData {
        mime_type: content_type.to_string(),
        reason: e.to_string(),
    })?;

    let Value::Object(members) = parsed else {
        return Ok(None);
    };

    let mut params = Vec::with_capacity(members.len());
    for (name, value) in members {
        match value {
            Value::Array(items) => params.extend(items.into_iter().map(|item| Param {
                name: name.clone(),
                value: Some(item),
            })),
            other => params.push(Param {
                name,
                value: Some(other),
            }),
        }
    }

    Ok(Some(params))
}
