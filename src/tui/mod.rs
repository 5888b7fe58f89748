//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides a health-themed interface for:
//! - Answering the lifestyle questionnaire
//! - Viewing the risk gauge, advice and feature contributions

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::HealthTheme;
