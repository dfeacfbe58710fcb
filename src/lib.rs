pub mod api;
pub mod commands;
pub mod config;
pub mod models;
pub mod scoring;
pub mod validation;
