//! HTTP handlers

pub mod health;
pub mod lookup;
pub mod threats;
