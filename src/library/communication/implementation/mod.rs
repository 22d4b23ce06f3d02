//! Implementations of the communication traits

pub mod json;
pub mod redis;

#[cfg(test)]
pub mod mock;

mod publisher;

pub use publisher::StreamPublisher;
