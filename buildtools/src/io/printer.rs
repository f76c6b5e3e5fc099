//! Line-oriented sink for progress and diagnostic messages.
//!
//! This is product output meant for the person running the build. Developer
//! tracing goes through `tracing` instead (see `logging`).

use crate::core::output::eat_trailing_eol;

pub trait Printer {
    /// Print a progress line or captured tool output.
    fn println(&self, line: &str);

    /// Print a diagnostic to the error stream.
    fn eprintln(&self, line: &str);
}

/// [`Printer`] writing to the process's stdout and stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutPrinter;

impl Printer for StdoutPrinter {
    fn println(&self, line: &str) {
        println!("{line}");
    }

    fn eprintln(&self, line: &str) {
        eprintln!("{line}");
    }
}

/// Print captured output without its trailing line endings; print nothing if
/// that leaves it empty.
pub fn print_buffer(printer: &dyn Printer, buffer: &[u8]) {
    let text = String::from_utf8_lossy(buffer);
    let text = eat_trailing_eol(&text);
    if !text.is_empty() {
        printer.println(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingPrinter;

    #[test]
    fn empty_buffer_prints_nothing() {
        let printer = RecordingPrinter::default();
        print_buffer(&printer, b"");
        print_buffer(&printer, b"\r\n\n");
        assert!(printer.lines().is_empty());
    }

    #[test]
    fn trailing_line_endings_are_trimmed() {
        let printer = RecordingPrinter::default();
        print_buffer(&printer, b"ok  \tpkg\t0.1s\ncoverage: 80%\r\n");
        assert_eq!(printer.lines(), vec!["ok  \tpkg\t0.1s\ncoverage: 80%"]);
    }
}
