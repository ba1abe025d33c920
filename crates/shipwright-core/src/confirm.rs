//! Confirmation gates
//!
//! Destructive operations and file writes block on a [`ConfirmationGate`].
//! Non-interactive runs must decline rather than silently confirm, so the
//! gate is injected everywhere instead of reading stdin ad hoc.

use colored::Colorize;
use std::io::{BufRead, Write};

/// Answers yes/no questions before side effects happen.
pub trait ConfirmationGate: Send + Sync {
    fn confirm(&self, message: &str, default: bool) -> bool;
}

/// Interactive prompt on the local terminal.
pub struct TerminalGate;

impl ConfirmationGate for TerminalGate {
    fn confirm(&self, message: &str, default: bool) -> bool {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        print!("{} {} ", message.yellow(), hint);
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        match answer.trim().to_ascii_lowercase().as_str() {
            "" => default,
            "y" | "yes" => true,
            _ => false,
        }
    }
}

/// Confirms everything. Only constructed from an explicit `--yes` flag.
pub struct AssumeYes;

impl ConfirmationGate for AssumeYes {
    fn confirm(&self, _message: &str, _default: bool) -> bool {
        true
    }
}

/// Declines everything, regardless of the suggested default. Used when no
/// terminal is attached.
pub struct NonInteractive;

impl ConfirmationGate for NonInteractive {
    fn confirm(&self, message: &str, _default: bool) -> bool {
        tracing::warn!(prompt = %message, "Confirmation required but running non-interactively, declining");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assume_yes_confirms() {
        assert!(AssumeYes.confirm("drop database?", false));
        assert!(AssumeYes.confirm("drop database?", true));
    }

    #[test]
    fn test_non_interactive_declines_even_with_true_default() {
        assert!(!NonInteractive.confirm("download backup?", true));
        assert!(!NonInteractive.confirm("download backup?", false));
    }
}
