//! Independent and project agnostic libraries
//!
//! Libraries in this module have been developed with the chat pipeline in mind and are powering
//! core functionalities, however, they are in no way bound to the project and everything domain
//! specific has been extracted into the [`domain`](super::domain) module.

pub mod communication;
pub mod helpers;

/// Generic error type
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result with no value and a [`BoxedError`]
pub type EmptyResult = Result<(), BoxedError>;
