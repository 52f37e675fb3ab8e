//! Webmail Launcher server library.
//!
//! Stores mail-account credentials sealed under a master key, manages
//! email/password sessions, and hands accounts off to webmail front ends
//! with one-time launch tokens.

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
