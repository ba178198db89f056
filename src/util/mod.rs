//! Shared utilities

pub mod periodic;
pub mod rate_limit;
pub mod time;
