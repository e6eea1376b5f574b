//! Database query modules.
//!
//! - users: statement-level operations on the `users` table

pub mod users;
