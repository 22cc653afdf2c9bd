//! Integration tests for the filechain history engine

mod checkpoint_scenarios;
mod concurrency;
mod config_integration;
mod history_continuity;
