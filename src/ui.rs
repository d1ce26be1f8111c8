//! Log-line formatting for CI output.
//!
//! Plain line-oriented printers; styling degrades to plain text when the
//! stream is not a terminal (CI log collectors).

use console::style;

/// Print an error message in red to stderr
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Print a success message with a green checkmark
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Print a status message with a yellow arrow
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Print a non-fatal warning
pub fn display_warning(message: &str) {
    println!("{} {}", style("WARNING:").yellow().bold(), message);
}

/// Print an informational message without decoration
pub fn display_info(message: &str) {
    println!("{}", message);
}
