// Output formatting for CLI

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use super::config::OutputFormat;

/// Format and output data
pub struct OutputFormatter {
    format: OutputFormat,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    /// Output any serializable summary
    pub fn output<T: Serialize>(&self, value: &T, writer: &mut impl Write) -> Result<()> {
        let value = serde_json::to_value(value)?;
        match self.format {
            OutputFormat::Pretty => writeln!(writer, "{}", serde_json::to_string_pretty(&value)?)?,
            OutputFormat::Json => writeln!(writer, "{}", serde_json::to_string(&value)?)?,
            OutputFormat::KeyValue => self.output_key_value("", &value, writer)?,
        }
        Ok(())
    }

    /// Output as flattened `path: value` lines
    fn output_key_value(&self, prefix: &str, value: &serde_json::Value, writer: &mut impl Write) -> Result<()> {
        match value {
            serde_json::Value::Object(obj) => {
                for (key, value) in obj {
                    self.output_key_value(&join_key(prefix, key), value, writer)?;
                }
            }
            serde_json::Value::Array(arr) if arr.iter().any(is_nested) => {
                for (index, value) in arr.iter().enumerate() {
                    self.output_key_value(&join_key(prefix, &index.to_string()), value, writer)?;
                }
            }
            other => writeln!(writer, "{}: {}", prefix, format_value(other))?,
        }
        Ok(())
    }

    /// Print success message
    pub fn print_success(&self, message: &str) {
        if !self.quiet {
            println!("✓ {}", message);
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn is_nested(value: &serde_json::Value) -> bool {
    matches!(value, serde_json::Value::Object(_) | serde_json::Value::Array(_))
}

/// Format a scalar JSON value for display
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "(null)".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        serde_json::Value::Object(obj) => format!("{{{} items}}", obj.len()),
    }
}
