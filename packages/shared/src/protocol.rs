//! Wire-level constants agreed on by the server and the client.
//!
//! The protocol itself is plain UTF-8 text frames; the only structure is the
//! `/command` prefix grammar interpreted by the server.

use std::time::Duration;

/// Upgrade path for the persistent chat connection.
pub const WS_PATH: &str = "/ws";

/// Plain-text liveness probe.
pub const HELLO_PATH: &str = "/hello";

/// Body returned by [`HELLO_PATH`].
pub const HELLO_BODY: &str = "HELLO WORLD!";

/// JSON health check.
pub const HEALTH_PATH: &str = "/api/health";

/// Cookie carrying the opaque session identity.
pub const SESSION_COOKIE: &str = "SESSION";

/// Upper bound for a display name, in characters.
pub const MAX_NAME_CHARS: usize = 50;

/// WebSocket close code sent when no identity can be bound (policy violation).
pub const POLICY_VIOLATION: u16 = 1008;

/// Delay between a lost connection and the next connect attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(5000);

/// Extract the session token from a `Cookie` request header value.
///
/// Returns `None` when the cookie is absent or empty.
pub fn session_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Extract the session token from a `Set-Cookie` response header value.
pub fn session_from_set_cookie(header: &str) -> Option<&str> {
    let first = header.split(';').next()?;
    let (name, value) = first.trim().split_once('=')?;
    (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_cookie_header_among_other_cookies() {
        // テスト項目: 複数の Cookie の中から SESSION を取り出せる
        // given (前提条件):
        let header = "theme=dark; SESSION=0123abcd; lang=ja";

        // when (操作):
        let result = session_from_cookie_header(header);

        // then (期待する結果):
        assert_eq!(result, Some("0123abcd"));
    }

    #[test]
    fn test_session_from_cookie_header_missing_or_empty() {
        // テスト項目: SESSION が無い、または空の場合は None
        assert_eq!(session_from_cookie_header("theme=dark"), None);
        assert_eq!(session_from_cookie_header("SESSION="), None);
        assert_eq!(session_from_cookie_header(""), None);
    }

    #[test]
    fn test_session_from_set_cookie_ignores_attributes() {
        // テスト項目: Set-Cookie の属性部分を無視して値だけを取り出す
        // given (前提条件):
        let header = "SESSION=feedbeef; Path=/; HttpOnly; SameSite=Lax";

        // when (操作):
        let result = session_from_set_cookie(header);

        // then (期待する結果):
        assert_eq!(result, Some("feedbeef"));
        assert_eq!(session_from_set_cookie("OTHER=1; Path=/"), None);
    }
}
