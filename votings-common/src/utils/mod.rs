//! Small helpers shared across the workspace: clock access and key material.

pub mod security;
pub mod time;
