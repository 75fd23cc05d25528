//! OAuth 1.0a request signing (HMAC-SHA1) for CHPP.
//!
//! CHPP only supports the 1.0a three-legged flow with HMAC-SHA1 signatures,
//! so the signing primitives live here rather than behind a provider crate.
//! Nonce and timestamp are injected by the caller, which keeps the base
//! string and header construction deterministic under test.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use secrecy::ExposeSecret;
use sha1::Sha1;

use crate::config::ChppConfig;

/// RFC 3986 unreserved characters pass through; everything else is escaped.
const OAUTH_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a string the way OAuth 1.0a requires.
pub fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE).to_string()
}

/// Build the signature base string: `METHOD&encode(url)&encode(sorted params)`.
///
/// Parameter pairs are encoded first and then sorted by encoded key, then
/// encoded value, as RFC 5849 requires.
pub fn signature_base_string(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();
    let joined = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}&{}&{}", method.to_uppercase(), encode(url), encode(&joined))
}

/// HMAC-SHA1 over the base string, keyed by the two secrets, base64-encoded.
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> String {
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    let mut mac =
        Hmac::<Sha1>::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(base_string.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Produce the `Authorization: OAuth ...` header value for one request.
///
/// `query` must be exactly the query parameters the request will carry; they
/// are folded into the signature together with the oauth_* protocol
/// parameters.
pub fn authorization_header(
    config: &ChppConfig,
    method: &str,
    url: &str,
    query: &[(String, String)],
    nonce: &str,
    timestamp: i64,
) -> String {
    let oauth_params = [
        ("oauth_consumer_key", config.consumer_key.clone()),
        ("oauth_nonce", nonce.to_string()),
        ("oauth_signature_method", "HMAC-SHA1".to_string()),
        ("oauth_timestamp", timestamp.to_string()),
        ("oauth_token", config.access_token.clone()),
        ("oauth_version", "1.0".to_string()),
    ];

    let mut all: Vec<(String, String)> = query.to_vec();
    all.extend(oauth_params.iter().map(|(k, v)| (k.to_string(), v.clone())));

    let base = signature_base_string(method, url, &all);
    let signature = sign(
        &base,
        config.consumer_secret.expose_secret(),
        config.access_token_secret.expose_secret(),
    );

    let mut header_params: Vec<(String, String)> = oauth_params
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    header_params.push(("oauth_signature".to_string(), signature));

    let rendered = header_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {rendered}")
}
