//! Shared helper functions for CLI commands

use dialoguer::{theme::ColorfulTheme, Input};

/// Hold the console open until the user presses Enter
///
/// Failures (no terminal attached, closed stdin) end the wait silently.
pub fn wait_for_enter() {
    let theme = ColorfulTheme::default();
    let _: Result<String, _> = Input::with_theme(&theme)
        .with_prompt("Press Enter to continue...")
        .allow_empty(true)
        .interact_text();
}
