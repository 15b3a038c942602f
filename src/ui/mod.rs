//! Terminal UI for the create flow.

pub mod icons;
mod progress;

pub use progress::StepsUi;

/// Wrap assistant prose to the terminal width for display.
pub fn wrap_prose(text: &str) -> String {
    let width = terminal_size::terminal_size()
        .map(|(w, _)| (w.0 as usize).clamp(40, 100))
        .unwrap_or(80);
    textwrap::fill(text, width)
}
