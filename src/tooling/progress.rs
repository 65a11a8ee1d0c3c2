//! Terminal progress bar on stderr
//!
//! Draws only when stderr is a terminal and the shown value changes, so
//! piped output and log files stay clean.

use std::io::{IsTerminal, Write};

const BAR_WIDTH: usize = 30;

pub struct ProgressBar {
    label: String,
    total: Option<usize>,
    enabled: bool,
    shown: Option<usize>,
}

impl ProgressBar {
    /// `total` known up front renders a bar and percentage, otherwise a counter
    pub fn new(label: &str, total: Option<usize>) -> Self {
        Self {
            label: label.to_string(),
            total: total.filter(|t| *t > 0),
            enabled: std::io::stderr().is_terminal(),
            shown: None,
        }
    }

    #[cfg(test)]
    fn hidden(label: &str, total: Option<usize>) -> Self {
        let mut bar = Self::new(label, total);
        bar.enabled = false;
        bar
    }

    pub fn update(&mut self, current: usize) {
        let value = match self.total {
            Some(total) => current.min(total) * 100 / total,
            None => current,
        };
        if self.shown == Some(value) {
            return;
        }
        self.shown = Some(value);
        if self.enabled {
            let mut stderr = std::io::stderr().lock();
            let _ = write!(stderr, "\r{}", self.render(current));
            let _ = stderr.flush();
        }
    }

    pub fn finish(&mut self) {
        if self.enabled && self.shown.is_some() {
            eprintln!();
        }
        self.shown = None;
    }

    fn render(&self, current: usize) -> String {
        match self.total {
            Some(total) => {
                let current = current.min(total);
                let filled = current * BAR_WIDTH / total;
                format!(
                    "{} [{}{}] {:>3}%",
                    self.label,
                    "=".repeat(filled),
                    " ".repeat(BAR_WIDTH - filled),
                    current * 100 / total
                )
            }
            None => format!("{}: {}", self.label, current),
        }
    }
}

impl Drop for ProgressBar {
    fn drop(&mut self) {
        self.finish();
    }
}
