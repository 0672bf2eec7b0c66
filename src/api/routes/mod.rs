//! API route modules.

pub mod meeting;
pub mod overlay;
pub mod recording;
