//! Report exporters - CSV, JSON, Markdown

/// Renders a report into one output format
pub trait ReportExporter {
    fn export(&self, report: &dyn ReportData) -> String;

    /// File extension without the dot
    fn extension(&self) -> &'static str;

    fn mime_type(&self) -> &'static str;
}

/// Tabular data with a title and key/value summary
pub trait ReportData {
    fn title(&self) -> &str;

    fn headers(&self) -> Vec<String>;

    fn rows(&self) -> Vec<Vec<String>>;

    fn summary(&self) -> Vec<(String, String)>;
}

/// Exporter for a format name (`csv`, `json`, `md`/`markdown`)
pub fn exporter_for(format: &str) -> Option<Box<dyn ReportExporter>> {
    match format.to_ascii_lowercase().as_str() {
        "csv" => Some(Box::new(CsvExporter::new())),
        "json" => Some(Box::new(JsonExporter::new())),
        "md" | "markdown" => Some(Box::new(MarkdownExporter::new())),
        _ => None,
    }
}

// ============================================================================
// CSV Exporter
// ============================================================================

pub struct CsvExporter {
    delimiter: char,
    include_header: bool,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            delimiter: ',',
            include_header: true,
        }
    }
}

impl CsvExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn without_header(mut self) -> Self {
        self.include_header = false;
        self
    }

    fn field(&self, value: &str) -> String {
        let needs_quotes = value
            .chars()
            .any(|c| c == self.delimiter || c == '"' || c == '\n' || c == '\r');
        if needs_quotes {
            format!("\"{}\"", value.replace('"', "\"\""))
        } else {
            value.to_string()
        }
    }

    fn line(&self, fields: &[String]) -> String {
        let cells: Vec<String> = fields.iter().map(|f| self.field(f)).collect();
        let mut line = cells.join(&self.delimiter.to_string());
        line.push('\n');
        line
    }
}

impl ReportExporter for CsvExporter {
    fn export(&self, report: &dyn ReportData) -> String {
        let mut output = String::new();
        if self.include_header {
            output.push_str(&self.line(&report.headers()));
        }
        for row in report.rows() {
            output.push_str(&self.line(&row));
        }
        output
    }

    fn extension(&self) -> &'static str {
        "csv"
    }

    fn mime_type(&self) -> &'static str {
        "text/csv"
    }
}

// ============================================================================
// JSON Exporter
// ============================================================================

pub struct JsonExporter {
    pretty: bool,
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl JsonExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }
}

impl ReportExporter for JsonExporter {
    fn export(&self, report: &dyn ReportData) -> String {
        use serde_json::{Map, Value};

        let headers = report.headers();
        let rows: Vec<Value> = report
            .rows()
            .into_iter()
            .map(|row| {
                let record: Map<String, Value> = headers
                    .iter()
                    .cloned()
                    .zip(row.into_iter().map(Value::String))
                    .collect();
                Value::Object(record)
            })
            .collect();

        let summary: Map<String, Value> = report
            .summary()
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();

        let document = serde_json::json!({
            "title": report.title(),
            "summary": summary,
            "rows": rows,
        });

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        };
        rendered.unwrap_or_default()
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }
}

// ============================================================================
// Markdown Exporter
// ============================================================================

pub struct MarkdownExporter {
    include_summary: bool,
}

impl Default for MarkdownExporter {
    fn default() -> Self {
        Self {
            include_summary: true,
        }
    }
}

impl MarkdownExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_summary(mut self) -> Self {
        self.include_summary = false;
        self
    }

    fn row(cells: &[String]) -> String {
        let escaped: Vec<String> = cells
            .iter()
            .map(|c| c.replace('|', "\\|").replace('\n', " "))
            .collect();
        format!("| {} |\n", escaped.join(" | "))
    }
}

impl ReportExporter for MarkdownExporter {
    fn export(&self, report: &dyn ReportData) -> String {
        let mut output = format!("# {}\n\n", report.title());

        if self.include_summary {
            for (key, value) in report.summary() {
                output.push_str(&format!("- **{}**: {}\n", key, value));
            }
            output.push('\n');
        }

        let headers = report.headers();
        if headers.is_empty() {
            return output;
        }
        output.push_str(&Self::row(&headers));
        output.push_str(&Self::row(&vec!["---".to_string(); headers.len()]));
        for row in report.rows() {
            output.push_str(&Self::row(&row));
        }
        output
    }

    fn extension(&self) -> &'static str {
        "md"
    }

    fn mime_type(&self) -> &'static str {
        "text/markdown"
    }
}
