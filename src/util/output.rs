use std::io::{self, Write};

use console::style;

pub fn info(message: &str) {
    let _ = writeln!(io::stderr(), "{}", message);
}

pub fn warn(message: &str) {
    let _ = writeln!(io::stderr(), "{}", style(message).yellow());
}

pub fn error(message: &str) {
    let _ = writeln!(io::stderr(), "{}", style(message).red());
}

/// Rewrites the current stderr line with a progress counter.
pub fn progress(label: &str, done: usize, total: usize) {
    let percent = if total == 0 {
        100.0
    } else {
        done as f64 / total as f64 * 100.0
    };
    let _ = write!(
        io::stderr(),
        "\r\x1b[2K{label}: {percent:.1}% ({done} / {total})"
    );
    let _ = io::stderr().flush();
}

/// Ends a progress line so later output starts on a fresh one.
pub fn progress_done() {
    let _ = writeln!(io::stderr());
}
