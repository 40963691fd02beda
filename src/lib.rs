// Utakata Ephemeral Image Link Library

pub mod config;
pub mod constants;
pub mod logging;
pub mod render;
pub mod serve;
pub mod store;
