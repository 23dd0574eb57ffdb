//! Canned chat assistant
//!
//! Keyword intent scoring picks a template per user mode; there is no
//! language model behind it. [`Conversation`] adds the simulated typing.

mod classifier;
mod conversation;
mod responder;

pub use classifier::{Intent, IntentClassifier, UserMode};
pub use conversation::{Conversation, ConversationState, TypingSettings};
pub use responder::{CannedResponder, ResponseGenerator};
