//! ANSI color helpers for CLI output.
//!
//! `--no-color`/`--force-color` (spec'd CLI flags) and a non-terminal stdout
//! both flow through [`set_enabled`] before any of these are called; once
//! disabled, every helper here is a no-op passthrough.

use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};

static ENABLED: AtomicBool = AtomicBool::new(true);

/// Decide color on/off from the `--no-color`/`--force-color` flags, falling
/// back to whether stdout is a terminal when neither is given.
pub fn init(no_color: bool, force_color: bool) {
    let enabled = if no_color {
        false
    } else if force_color {
        true
    } else {
        std::io::stdout().is_terminal()
    };
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

fn wrap(code: &str, s: &str) -> String {
    if enabled() {
        format!("\x1b[{code}m{s}\x1b[0m")
    } else {
        s.to_string()
    }
}

/// Format text in green.
pub fn green(s: &str) -> String {
    wrap("32", s)
}

/// Format text in red.
pub fn red(s: &str) -> String {
    wrap("31", s)
}

/// Format text in yellow.
pub fn yellow(s: &str) -> String {
    wrap("33", s)
}

/// Format text in cyan.
pub fn cyan(s: &str) -> String {
    wrap("36", s)
}

/// Format text in bold.
pub fn bold(s: &str) -> String {
    wrap("1", s)
}

/// Format text in gray.
pub fn gray(s: &str) -> String {
    wrap("90", s)
}

/// Format a status label (right-aligned, green, bold).
pub fn status_label(label: &str) -> String {
    if enabled() {
        format!("\x1b[1;32m{:>12}\x1b[0m", label)
    } else {
        format!("{:>12}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn disabled_colors_pass_text_through_unchanged() {
        init(true, false);
        assert_eq!(green("ok"), "ok");
        assert_eq!(status_label("Running"), format!("{:>12}", "Running"));
    }

    #[test]
    #[serial]
    fn force_color_wraps_even_off_a_terminal() {
        init(false, true);
        assert!(green("ok").contains("\x1b[32m"));
    }
}
