//! Command handlers

pub mod book;
pub mod config;
pub mod status;
pub mod transfer;
