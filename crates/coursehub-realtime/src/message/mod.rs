//! Wire protocol: frame codec, client commands, and server messages.
//!
//! A frame is a list of space-separated fields. No field but the last may
//! start with a colon; a field introduced by ` :` runs to the end of the
//! frame and may contain spaces. For example `SQUISH POP :cat purr!!`
//! carries the fields `SQUISH`, `POP`, and `cat purr!!`.

pub mod codec;
pub mod command;
pub mod types;

pub use codec::MessageCodec;
pub use command::ClientCommand;
pub use types::ServerMessage;
