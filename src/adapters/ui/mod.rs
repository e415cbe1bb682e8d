pub mod tui;

pub use tui::{TuiInputPort, UiServices};

/// Prints the version line and applies the theme for all subsequent inquire prompts.
/// Call once at startup (e.g. in main after tracing init).
pub fn init_ui() {
    println!("jobfinder v{}", env!("CARGO_PKG_VERSION"));
    tui::apply_theme();
}
