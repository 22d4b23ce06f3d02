//! This library crate contains the real-time notification pipeline of a chat service.
//!
//! Submodules have been introduced to split responsibilities. Each module has a specific focus
//! and they together form a chain of dependencies from the low-level [`library`], over the chat [`domain`]
//! specific logic, through the executable [`harness`], up to the high-level [`modules`](module) running the
//! stream consumers.

#![warn(missing_docs)]

pub mod domain;
pub mod harness;
pub mod library;
pub mod module;
