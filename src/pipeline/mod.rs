//! Stages between raw findings and a finished report.

pub mod collector;
pub mod metadata;
pub mod scorer;
pub mod timeline;
