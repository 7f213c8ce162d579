/// Where a [`Report`] ends up.
///
/// Reports call these in order; the sink picks the formatting.
pub trait Output {
    /// A labelled fact, e.g. a written path and its status.
    fn field(&mut self, label: &str, value: &str);

    fn warn(&mut self, message: &str);

    /// Introduces the block that follows.
    fn heading(&mut self, title: &str);

    /// Text emitted exactly as given.
    fn verbatim(&mut self, text: &str);
}

pub trait Report {
    fn render(&self, out: &mut dyn Output);
}

/// Prints to the terminal: warnings to stderr, everything else to stdout,
/// so a `--dry-run` preview can be piped into a file.
#[derive(Debug, Default)]
pub struct TerminalOutput;

impl TerminalOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Output for TerminalOutput {
    fn field(&mut self, label: &str, value: &str) {
        println!("{}: {}", label, value);
    }

    fn warn(&mut self, message: &str) {
        eprintln!("warning: {}", message);
    }

    fn heading(&mut self, title: &str) {
        println!("// ---- {} ----", title);
    }

    fn verbatim(&mut self, text: &str) {
        print!("{}", text);
    }
}
