//! Core types for weft.

pub mod document;
pub mod event;
pub mod message;

pub use document::*;
pub use event::*;
pub use message::*;
