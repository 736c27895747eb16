//! UseCase layer: one struct per user-visible operation.

mod connect_member;
mod disconnect_member;
mod dispatch_command;
mod error;

pub use connect_member::ConnectMemberUseCase;
pub use disconnect_member::DisconnectMemberUseCase;
pub use dispatch_command::{DispatchCommandUseCase, HELP_TEXT};
pub use error::CommandError;
