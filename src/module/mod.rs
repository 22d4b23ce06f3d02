//! Runnable modules each bundling multiple consumer services and providing a unified configuration

pub mod options;

pub mod counter;
pub mod janitor;
