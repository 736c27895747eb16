//! Logging setup utilities for the Kotatsu chat application.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Both the library crates and the binary log at `default_log_level` unless
/// the `RUST_LOG` environment variable says otherwise.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "kotatsu-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info")
///
/// # Examples
///
/// ```no_run
/// use kotatsu_shared::logger::setup_logger;
///
/// setup_logger("kotatsu-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the fallback filter used when `RUST_LOG` is not set.
///
/// Every workspace crate gets the same level so that the server binary also
/// sees what `kotatsu_server` logs, and likewise for the client.
fn default_directives(binary_name: &str, level: &str) -> String {
    ["kotatsu_shared", "kotatsu_server", "kotatsu_client"]
        .iter()
        .map(|krate| format!("{}={}", krate, level))
        .chain(std::iter::once(format!(
            "{}={}",
            binary_name.replace('-', "_"),
            level
        )))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_workspace_and_binary() {
        // テスト項目: RUST_LOG 未設定時のフィルタにワークスペースのクレートとバイナリが含まれる
        // given (前提条件):
        let binary = "kotatsu-server";

        // when (操作):
        let directives = default_directives(binary, "debug");

        // then (期待する結果):
        assert!(directives.contains("kotatsu_server=debug"));
        assert!(directives.contains("kotatsu_client=debug"));
        assert!(directives.ends_with("kotatsu_server=debug"));
        assert!(!directives.contains('-'));
    }
}
