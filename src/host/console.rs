use std::io::{self, Write};

const BOLD_GREEN: &str = "\x1b[1;32m";
const BOLD_YELLOW: &str = "\x1b[1;33m";
const BOLD_BLUE: &str = "\x1b[1;34m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Kinds of status messages emitted by the built-ins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Heading announcing a built-in step, e.g. `Step: Creating table`.
    Step,
    /// Completion banner, e.g. `Connected to database: app.db`.
    Done,
}

/// Formatted sink for program output and status banners.
pub trait Console {
    /// Program output: one line per `print` call.
    fn print(&mut self, line: &str);

    /// A row produced by `db_query`.
    fn row(&mut self, line: &str) {
        self.print(line);
    }

    fn notice(&mut self, kind: Notice, message: &str);
}

/// Writes program output to stdout and notices to stderr.
#[derive(Debug, Clone, Copy)]
pub struct StdoutConsole {
    color: bool,
}

impl StdoutConsole {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.color {
            format!("{style}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

impl Console for StdoutConsole {
    fn print(&mut self, line: &str) {
        let line = self.paint(BOLD_GREEN, line);
        if let Err(error) = writeln!(io::stdout().lock(), "{line}") {
            log::warn!("failed to write program output: {error}");
        }
    }

    fn row(&mut self, line: &str) {
        let line = self.paint(BOLD_YELLOW, line);
        if let Err(error) = writeln!(io::stdout().lock(), "{line}") {
            log::warn!("failed to write query row: {error}");
        }
    }

    fn notice(&mut self, kind: Notice, message: &str) {
        let text = match kind {
            Notice::Step => self.paint(RED, &format!("── {message} ──")),
            Notice::Done => self.paint(BOLD_BLUE, message),
        };
        if let Err(error) = writeln!(io::stderr().lock(), "{text}") {
            log::warn!("failed to write notice: {error}");
        }
    }
}

/// In-memory console used by tests and benchmarks.
#[derive(Debug, Default, Clone)]
pub struct CapturedConsole {
    pub lines: Vec<String>,
    pub notices: Vec<(Notice, String)>,
}

impl CapturedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Program output joined with newlines.
    pub fn output(&self) -> String {
        self.lines.join("\n")
    }
}

impl Console for CapturedConsole {
    fn print(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn notice(&mut self, kind: Notice, message: &str) {
        self.notices.push((kind, message.to_string()));
    }
}
