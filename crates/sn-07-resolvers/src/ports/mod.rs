//! # Ports
//!
//! - `Messenger`: topic transport (driven)
//! - `MessageProcessor`, `Resolver`: handlers attached to topics (driving)

pub mod messenger;
pub mod resolver;

pub use messenger::{Message, MessageProcessor, Messenger, PeerId};
pub use resolver::Resolver;
