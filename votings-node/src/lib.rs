pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod journal;
pub mod logging;
