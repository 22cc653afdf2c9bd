//! Configuration file sources.

pub mod global_file;
pub mod repo_file;
