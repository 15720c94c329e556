//! Flash file system engine

pub mod builder;
pub mod config;
pub mod dir;
pub mod error;
pub mod file;
pub mod filesystem;
pub mod format;
pub mod locator;
pub mod pool;
pub mod shared;
pub mod table;

#[cfg(test)]
mod integration_tests;

pub use filesystem::FlashFileSystem;
