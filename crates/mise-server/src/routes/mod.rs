pub mod config;
pub mod events;
pub mod health;
pub mod manifest;
pub mod panel;
