//! HTTP liveness probe run before the first WebSocket connection.

use kotatsu_shared::protocol::{HELLO_PATH, SESSION_COOKIE, session_from_set_cookie};
use reqwest::header;

use crate::{error::ClientError, transport::SessionJar};

/// GET `/hello` on `http_base` and return the body.
///
/// Any session cookie the server issues is stored in `jar`, so the first
/// WebSocket connection already presents an identity.
pub async fn probe(http_base: &str, jar: &SessionJar) -> Result<String, ClientError> {
    let url = format!("{}{}", http_base.trim_end_matches('/'), HELLO_PATH);
    let mut request = reqwest::Client::new().get(&url);
    if let Some(token) = jar.get() {
        request = request.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token));
    }

    let response = request.send().await?.error_for_status()?;
    jar.remember(
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(session_from_set_cookie),
    );

    let body = response.text().await?;
    tracing::debug!("Probe {} answered '{}'", url, body);
    Ok(body)
}

/// Derive the HTTP origin from a WebSocket URL.
///
/// `ws://host:port/ws` becomes `http://host:port`, `wss://` becomes `https://`.
pub fn http_base_from_ws(url: &str) -> Result<String, ClientError> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| ClientError::InvalidUrl(url.to_string()))?;
    let scheme = match scheme {
        "ws" => "http",
        "wss" => "https",
        _ => return Err(ClientError::InvalidUrl(url.to_string())),
    };
    let authority = rest.split(['/', '?']).next().unwrap_or_default();
    if authority.is_empty() {
        return Err(ClientError::InvalidUrl(url.to_string()));
    }
    Ok(format!("{}://{}", scheme, authority))
}
