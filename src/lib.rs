//! purrchat is a full-screen terminal chat client for OpenAI-compatible
//! completion endpoints.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the send pipeline: the credential pool, the failover
//!   dispatcher, the completion client, session persistence and the
//!   conversation controller that ties them together.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop.
//! - [`api`] defines the completion request/response payloads.
//! - [`cli`] parses arguments and wires the layers together at startup.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
