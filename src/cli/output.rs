use std::fmt::Write as FmtWrite;

use clap::ValueEnum;
use serde::Serialize;

use crate::services::PopulateStats;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub index_url: String,
    pub connected: bool,
}

pub trait Formatter {
    fn format_populate_stats(&self, stats: &PopulateStats) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_populate_stats(&self, stats: &PopulateStats) -> String {
        let mut output = String::new();
        writeln!(output, "Populate complete").unwrap();
        writeln!(output, "-----------------").unwrap();
        writeln!(output, "Documents:  {}", stats.documents).unwrap();
        writeln!(output, "Passages:   {}", stats.passages).unwrap();
        writeln!(output, "Records:    {}", stats.records).unwrap();
        writeln!(output, "Flushes:    {}", stats.flushes).unwrap();
        writeln!(output, "Duration:   {}ms", stats.duration_ms).unwrap();
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();
        let connection = if status.connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(output, "Index:  {} {}", status.index_url, connection).unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}

pub struct JsonFormatter;

impl JsonFormatter {
    fn to_json(value: &impl Serialize) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Formatter for JsonFormatter {
    fn format_populate_stats(&self, stats: &PopulateStats) -> String {
        Self::to_json(stats)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        Self::to_json(status)
    }

    fn format_message(&self, message: &str) -> String {
        Self::to_json(&serde_json::json!({ "message": message }))
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}
