/*
 * Responsibility
 * - モジュールの公開 (main.rs と tests/ の両方から使う)
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod services;
pub mod state;
