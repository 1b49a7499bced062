//! HTTP route handlers

pub mod intake;
pub mod prometheus;
