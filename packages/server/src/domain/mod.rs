//! Domain layer: value objects, the command grammar, and the traits the
//! outer layers implement.

mod command;
mod error;
mod identity;
mod member;
mod message_pusher;
mod registry;

pub use command::{Command, first_token};
pub use error::{DeliveryError, IdentityError, InvalidName, RenameError};
pub use identity::{Binding, IdentityStore, SessionId};
pub use member::{DisplayName, Member};
pub use message_pusher::{ConnectionHandle, ConnectionId, MessagePusher};
pub use registry::MemberRegistry;

#[cfg(test)]
pub use registry::MockMemberRegistry;
