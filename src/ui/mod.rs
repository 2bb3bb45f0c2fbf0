//! Terminal UI layer.
//!
//! - [`chat_loop`]: terminal lifecycle, the event loop and key handling.
//! - [`renderer`]: frame layout and transcript composition.
//! - [`markdown`]: the pure Markdown to [`ratatui`] line renderer.
//! - [`history`]: the session history listing.
//! - [`theme`]: the fixed theme lookup table.
//!
//! This layer only presents state. [`crate::core`] owns the conversation.

pub mod chat_loop;
pub mod history;
pub mod markdown;
pub mod renderer;
pub mod theme;
