//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides the patient form and the prediction result view:
//! - Patient data input with range-checked numbers and cycled selections
//! - Risk headline, probability, and derived features
//! - Reference model evaluation on demand

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::MedicalTheme;
