//! Styled terminal output for the plansight CLI
//!
//! Small helpers over `owo-colors` with a consistent pastel palette. This is
//! the CLI's only logging surface; the compiler itself never prints.

use owo_colors::OwoColorize;

/// Print a success message with a green checkmark
pub fn success(message: &str) {
    // Pastel mint green: RGB(152, 225, 152)
    println!(
        "{} {}",
        "✓".truecolor(152, 225, 152).bold(),
        message.bright_white()
    );
}

/// Print a success message with additional details in dim text
pub fn success_with_details(message: &str, details: &str) {
    println!(
        "{} {} {}",
        "✓".truecolor(152, 225, 152).bold(),
        message.bright_white(),
        details.truecolor(160, 160, 160)
    );
}

/// Print an error message with a red X
pub fn error(message: &str) {
    // Pastel coral: RGB(255, 160, 160)
    eprintln!(
        "{} {}",
        "✗".truecolor(255, 160, 160).bold(),
        message.bright_white()
    );
}

/// Print a warning message with a yellow warning symbol
pub fn warning(message: &str) {
    // Pastel cream/yellow: RGB(255, 230, 160)
    println!(
        "{} {}",
        "⚠".truecolor(255, 230, 160).bold(),
        message.bright_white()
    );
}

/// Print a dimmed/muted message
pub fn dimmed(message: &str) {
    println!("{}", message.truecolor(160, 160, 160));
}

/// Print a blank line
pub fn blank() {
    println!();
}
