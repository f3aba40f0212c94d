//! Output formatting and writing utilities
//!
//! This module formats responses, configuration and status messages in the
//! selected output format, and owns the upload progress bar.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use rebound_core::{ProgressEvent, Response};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{self, Write};
use tracing::trace;

/// Serializable view of a response
#[derive(Debug, Serialize)]
pub struct ResponseSummary {
    pub status: u16,
    pub status_text: String,
    pub ok: bool,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl ResponseSummary {
    pub fn from_response(response: &Response) -> Self {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers().iter() {
            headers
                .entry(name.to_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        // JSON bodies are embedded as JSON; anything else as text
        let body = response
            .json::<Value>()
            .unwrap_or_else(|_| Value::String(response.text()));

        Self {
            status: response.status(),
            status_text: response.status_text().to_string(),
            ok: response.ok(),
            headers,
            body,
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    #[cfg(test)]
    pub fn with_writer(format: OutputFormat, use_color: bool, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color,
            show_progress: false, // No progress bars with custom writers
            quiet,
            writer,
        }
    }

    /// Disable progress bars regardless of the terminal
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = match self.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::JsonPretty | OutputFormat::Human => serde_json::to_string_pretty(value)?,
        };
        trace!(bytes = formatted.len(), "Outputting data");
        self.writeln(&formatted)
    }

    /// Write a response: status line, optional headers, then the body
    pub fn response(&mut self, response: &Response, include_headers: bool) -> Result<()> {
        if self.format != OutputFormat::Human {
            return self.data(&ResponseSummary::from_response(response));
        }

        if !self.quiet {
            let status_line = format!("HTTP {} {}", response.status(), response.status_text());
            let status_line = match (self.use_color, response.ok()) {
                (false, _) => status_line,
                (true, true) => status_line.green().bold().to_string(),
                (true, false) => status_line.red().bold().to_string(),
            };
            self.writeln(&status_line)?;
        }

        if include_headers {
            let lines: Vec<String> = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    if self.use_color {
                        format!("{}: {}", name.cyan(), value)
                    } else {
                        format!("{}: {}", name, value)
                    }
                })
                .collect();
            for line in lines {
                self.writeln(&line)?;
            }
        }

        if !self.quiet {
            self.writeln("")?;
        }
        self.writeln(&format_body(response))
    }

    /// Create a progress bar for an upload of `total` bytes
    pub fn upload_bar(&self, total: u64) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(upload_progress_style());
        pb.set_message("uploading");
        Some(pb)
    }
}

/// Move an upload bar to the position an event reports
pub fn apply_progress(bar: &ProgressBar, event: &ProgressEvent) {
    // A retried upload starts again from zero
    if event.sent_bytes < bar.position() {
        bar.reset();
    }
    bar.set_length(event.total_bytes);
    bar.set_position(event.sent_bytes);
    bar.set_message(format!("{}/s", HumanBytes(event.speed_bytes_per_sec as u64)));
}

/// Helper function to create the upload progress bar style
pub fn upload_progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// Pretty-print JSON bodies; pass anything else through as text
fn format_body(response: &Response) -> String {
    let is_json = response
        .headers()
        .get("content-type")
        .is_some_and(|ct| ct.contains("json"));

    if is_json {
        if let Ok(value) = response.json::<Value>() {
            if let Ok(pretty) = serde_json::to_string_pretty(&value) {
                return pretty;
            }
        }
    }
    response.text()
}

#[cfg(test)]
mod tests;
