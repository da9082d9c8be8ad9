//! Output formatting for bms-cli (table, json, csv)

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print a section heading (table format only)
    pub fn heading(&self, title: &str) {
        if self.format == OutputFormat::Table && !self.quiet {
            println!("\n{}", title.bold());
        }
    }

    /// Print data in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    let table = Table::new(data).to_string();
                    println!("{}", table);
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
            OutputFormat::Csv => {
                print!("{}", to_csv(data));
            }
        }
    }

    /// Print key-value pairs
    pub fn print_kv(&self, pairs: &[(&str, String)]) {
        match self.format {
            OutputFormat::Table => {
                for (key, value) in pairs {
                    println!("{}: {}", key.bold(), value);
                }
            }
            OutputFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&map).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Csv => {
                let keys: Vec<String> = pairs.iter().map(|(k, _)| escape_csv(k)).collect();
                println!("{}", keys.join(","));
                let values: Vec<String> = pairs.iter().map(|(_, v)| escape_csv(v)).collect();
                println!("{}", values.join(","));
            }
        }
    }
}

/// Render data as CSV, using the table headers as column names
fn to_csv<T: Tabled>(data: &[T]) -> String {
    let mut out = String::new();
    if data.is_empty() {
        return out;
    }

    let headers: Vec<String> = T::headers().iter().map(|h| escape_csv(h)).collect();
    out.push_str(&headers.join(","));
    out.push('\n');

    for item in data {
        let values: Vec<String> = item.fields().iter().map(|v| escape_csv(v)).collect();
        out.push_str(&values.join(","));
        out.push('\n');
    }
    out
}

/// Escape a value for CSV output
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Fault bit display for decode and flags commands
#[derive(Debug, Tabled, Serialize)]
pub struct FlagRow {
    #[tabled(rename = "Bit")]
    pub bit: u8,
    #[tabled(rename = "Value")]
    pub value: u32,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Description")]
    pub description: String,
}

impl From<&bms_core::FaultType> for FlagRow {
    fn from(t: &bms_core::FaultType) -> Self {
        Self {
            bit: t.bit,
            value: t.value,
            name: t.name.to_string(),
            description: t.description.to_string(),
        }
    }
}

/// Grouped count display for summary command
#[derive(Debug, Tabled, Serialize)]
pub struct CountRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Count")]
    pub count: usize,
}

/// Fault description count display for summary command
#[derive(Debug, Tabled, Serialize)]
pub struct DescriptionRow {
    #[tabled(rename = "Fault")]
    pub fault: String,
    #[tabled(rename = "Count")]
    pub count: usize,
}

/// Detected fault display for detect command
#[derive(Debug, Tabled, Serialize)]
pub struct DetectionRow {
    #[tabled(rename = "Device")]
    pub device_type: String,
    #[tabled(rename = "Flags")]
    pub fault_flags: u32,
    #[tabled(rename = "Faults")]
    pub names: String,
    #[tabled(rename = "Severity")]
    pub severity: i32,
}
