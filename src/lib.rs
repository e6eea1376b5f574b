//! Userstore - pooled, transactional access to a users table
//!
//! This library crate exposes configuration loading and logging setup for the
//! `userstore` binary and for integration testing.

pub mod config;
pub mod logging;
