//! UseCase: コマンド実行（Command Router の dispatch 部分）
//!
//! `Command::classify` が決めた種類ごとに、レジストリ操作・送信者への返信・
//! 他のメンバーへのブロードキャストを行う。エラーはこの中で完結し、
//! 接続の状態遷移は起こさない。

use std::sync::Arc;

use crate::domain::{
    Command, InvalidName, MemberRegistry, MessagePusher, RenameError, SessionId, first_token,
};

use super::error::CommandError;

/// Reply to `/help`.
pub const HELP_TEXT: &str = "Possible commands are: /user, /help and /who";

const ROSTER_PREFIX: &str = "[server::who] ";

/// コマンド実行のユースケース
pub struct DispatchCommandUseCase {
    registry: Arc<dyn MemberRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DispatchCommandUseCase {
    /// 新しい DispatchCommandUseCase を作成
    pub fn new(registry: Arc<dyn MemberRegistry>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// コマンドを実行
    ///
    /// 返信は送信者にだけ届く。他のメンバーに届くのは
    /// [`Command::PlainMessage`] だけ。
    ///
    /// # Arguments
    ///
    /// * `sender` - コマンドを送ったメンバーのセッション ID
    /// * `command` - `Command::classify` で分類済みのコマンド
    ///
    /// # Returns
    ///
    /// * `Ok(())` - コマンドが反映された（返信・ブロードキャスト済み）
    /// * `Err(CommandError)` - 不正な名前や未知のコマンド。送信者にはヒントを返信済み
    pub async fn execute(&self, sender: &SessionId, command: Command) -> Result<(), CommandError> {
        match command {
            Command::Who => {
                let roster = self.registry.roster();
                self.reply(sender, &format_roster(&roster)).await;
                Ok(())
            }
            Command::SetName(new_name) => self.rename(sender, &new_name).await,
            Command::Help => {
                self.reply(sender, HELP_TEXT).await;
                Ok(())
            }
            Command::UnknownCommand(raw) => {
                let token = first_token(&raw).to_string();
                self.reply(sender, &format!("Unknown command {}", token))
                    .await;
                Err(CommandError::UnknownCommand(token))
            }
            Command::PlainMessage(text) => self.message(sender, &text).await,
        }
    }

    async fn rename(&self, sender: &SessionId, new_name: &str) -> Result<(), CommandError> {
        match self.registry.rename(sender, new_name) {
            Ok(name) => {
                // Silent to everyone else, including the sender.
                tracing::info!("Session '{}' is now '{}'", sender, name.as_str());
                Ok(())
            }
            Err(RenameError::Invalid(reason)) => {
                self.reply(sender, &name_hint(&reason)).await;
                Err(CommandError::InvalidName(reason))
            }
            Err(RenameError::NotJoined(id)) => Err(CommandError::NotJoined(id)),
        }
    }

    async fn message(&self, sender: &SessionId, text: &str) -> Result<(), CommandError> {
        let label = self
            .registry
            .lookup(sender)
            .map(|member| member.label())
            .ok_or_else(|| CommandError::NotJoined(sender.to_string()))?;

        let line = format!("[{}] {}", label, text);
        let delivered = self.message_pusher.broadcast(&line, Some(sender)).await;
        tracing::info!("Broadcast from '{}' reached {} members", label, delivered);
        Ok(())
    }

    async fn reply(&self, recipient: &SessionId, text: &str) {
        // Delivery failures surface later as the recipient's own disconnect.
        if let Err(e) = self.message_pusher.send_to(recipient, text).await {
            tracing::debug!("Reply to '{}' dropped: {}", recipient, e);
        }
    }
}

fn format_roster(labels: &[String]) -> String {
    format!("{}{}", ROSTER_PREFIX, labels.join(", "))
}

fn name_hint(reason: &InvalidName) -> String {
    match reason {
        InvalidName::Empty => "/user [newName]".to_string(),
        InvalidName::TooLong { limit, .. } => {
            format!("new name is too long: {} characters limit", limit)
        }
    }
}
