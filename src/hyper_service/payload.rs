use std::borrow::Cow;

use http::request::Parts;
use http::HeaderMap;
use hyper::body::Bytes;

/// The request data handed to handlers as the context payload.
#[derive(Debug)]
pub struct HttpPayload {
    pub parts: Parts,
    pub body: Bytes,
}

impl HttpPayload {
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn query(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Looks up `name` in the query string. Keys and values are percent-decoded
    /// and `+` reads as a space.
    pub fn query_param(&self, name: &str) -> Option<Cow<'_, str>> {
        self.query()?.split('&').find_map(|pair| {
            let mut kv = pair.splitn(2, '=');
            if decode(kv.next()?) == name {
                Some(decode(kv.next().unwrap_or("")))
            } else {
                None
            }
        })
    }
}

fn decode(raw: &str) -> Cow<'_, str> {
    if raw.contains('+') {
        return Cow::Owned(decode_lossy(&raw.replace('+', " ")).into_owned());
    }
    decode_lossy(raw)
}

fn decode_lossy(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or_else(|_| {
        let bytes = urlencoding::decode_binary(raw.as_bytes());
        Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
    })
}
