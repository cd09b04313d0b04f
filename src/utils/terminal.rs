//! Terminal output utilities

use std::time::Duration;

use anyhow::Result;
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{}: {}", style("error").red().bold(), message);
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{}: {}", style("warning").yellow().bold(), message);
}

/// Print a bold warning headline to stderr
pub fn print_warning_headline(message: &str) {
    eprintln!("{}: {}", style("warning").yellow().bold(), style(message).bold());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{}: {}", style("success").green().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{}: {}", style("info").blue().bold(), message);
}

/// Print an info message only in verbose mode
pub fn print_verbose(verbose: bool, message: &str) {
    if verbose {
        println!("{}: {}", style("debug").dim(), style(message).dim());
    }
}

/// Create a spinner progress bar
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.blue} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Whether a person is attached to the terminal (stdin and stdout are ttys)
pub fn is_interactive() -> bool {
    console::user_attended()
}

/// Ask a yes/no question on stderr. Anything but `y`/`yes` declines.
pub fn confirm(message: &str) -> Result<bool> {
    let term = Term::stderr();
    term.write_str(&format!(
        "{} {} {} ",
        style("?").cyan().bold(),
        style(message).bold(),
        style("(y/N)").dim()
    ))?;
    let input = term.read_line()?;
    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
