//! メッセージ送信（通知）の実装
//!
//! - `broadcaster`: レジストリのスナップショットに対して配送する実装

pub mod broadcaster;

pub use broadcaster::RegistryBroadcaster;
