//! Output rendering for the CLI.
//!
//! A [`Renderer`] is built once per invocation from the global flags and
//! owns both the format dispatch and the quiet-mode suppression. Table
//! views come from `tabled` rows, JSON serializes the original data via
//! serde, and plain emits one identifier per line for scripting.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{GlobalOpts, OutputFormat};

pub struct Renderer {
    format: OutputFormat,
    quiet: bool,
}

impl Renderer {
    pub fn from_opts(global: &GlobalOpts) -> Self {
        Self {
            format: global.output,
            quiet: global.quiet,
        }
    }

    /// Emit a list. `to_row` shapes the table view, `id_of` the
    /// one-per-line plain view; the JSON formats serialize `data` itself.
    pub fn list<T, R>(&self, data: &[T], to_row: impl Fn(&T) -> R, id_of: impl Fn(&T) -> String)
    where
        T: serde::Serialize,
        R: Tabled,
    {
        match self.format {
            OutputFormat::Table => self.emit(
                &Table::new(data.iter().map(to_row))
                    .with(Style::rounded())
                    .to_string(),
            ),
            OutputFormat::Json => self.emit(&json(data, true)),
            OutputFormat::JsonCompact => self.emit(&json(data, false)),
            OutputFormat::Plain => {
                let lines: Vec<String> = data.iter().map(id_of).collect();
                self.emit(&lines.join("\n"));
            }
        }
    }

    /// Emit a single item. Table output uses the pre-formatted `detail`
    /// view, since detail screens don't go through the `Tabled` derive.
    pub fn single<T>(&self, data: &T, detail: impl Fn(&T) -> String, id_of: impl Fn(&T) -> String)
    where
        T: serde::Serialize,
    {
        match self.format {
            OutputFormat::Table => self.emit(&detail(data)),
            OutputFormat::Json => self.emit(&json(data, true)),
            OutputFormat::JsonCompact => self.emit(&json(data, false)),
            OutputFormat::Plain => self.emit(&id_of(data)),
        }
    }

    fn emit(&self, rendered: &str) {
        if self.quiet || rendered.is_empty() {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{rendered}");
    }
}

fn json<T: serde::Serialize + ?Sized>(data: &T, pretty: bool) -> String {
    let result = if pretty {
        serde_json::to_string_pretty(data)
    } else {
        serde_json::to_string(data)
    };
    result.expect("serialization should not fail")
}

/// Dim a label when stdout is an interactive terminal.
pub fn label(text: &str) -> String {
    if io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err() {
        text.dimmed().to_string()
    } else {
        text.to_owned()
    }
}
