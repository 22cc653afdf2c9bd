//! Property-based tests for classification, encoding and sealing

mod codec;
mod determinism;
