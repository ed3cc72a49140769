//! Core types for gner.

mod message;

pub use message::{Message, MessageRole};
