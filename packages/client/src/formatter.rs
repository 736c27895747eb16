//! Message formatting utilities for client display.

use kotatsu_shared::time::format_clock;

use crate::manager::Notice;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a line received from the server
    ///
    /// # Arguments
    ///
    /// * `text` - The text exactly as the server sent it
    /// * `received_at` - Unix timestamp when it arrived (milliseconds)
    pub fn format_message(text: &str, received_at: i64) -> String {
        format!("\n[{}] {}\n", format_clock(received_at), text)
    }

    /// Format a connection notice
    pub fn format_notice(notice: &Notice, at: i64) -> String {
        format!("\n[{}] * {}\n", format_clock(at), notice)
    }

    /// Format the warning shown when input is typed while offline
    pub fn format_dropped(text: &str) -> String {
        format!("\n(not connected, dropped: {})\n", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_message_keeps_server_text() {
        // テスト項目: 受信したテキストはそのまま時刻付きで表示される
        // given (前提条件):
        let text = "[Alice] hello";

        // when (操作):
        let result = MessageFormatter::format_message(text, 0);

        // then (期待する結果):
        assert!(result.ends_with("] [Alice] hello\n"));
        assert!(result.starts_with("\n["));
    }

    #[test]
    fn test_format_notice() {
        // テスト項目: 通知は * 付きで表示される
        // given (前提条件):
        let notice = Notice::Disconnected("connection closed".to_string());

        // when (操作):
        let result = MessageFormatter::format_notice(&notice, 0);

        // then (期待する結果):
        assert!(result.contains("* Disconnected. connection closed."));
    }
}
