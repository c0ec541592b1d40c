//! Core types, classification and the scan engine.

pub mod engine;
pub mod error;
pub mod hash;
pub mod input;
pub mod output;
pub mod time;
pub mod types;
