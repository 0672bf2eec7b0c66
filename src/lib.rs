pub mod api;
pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod global;
pub mod host;
pub mod meeting;
pub mod overlay;
pub mod persistence;
pub mod recording;

#[cfg(test)]
mod test_support;
