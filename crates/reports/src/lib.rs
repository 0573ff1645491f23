//! # CivicDesk Reports
//!
//! Complaint statistics and status histories rendered as CSV, JSON or Markdown.
//!
//! ## Exporters
//!
//! - [`CsvExporter`] - CSV with quoting for delimiters, quotes and newlines
//! - [`JsonExporter`] - JSON, pretty or compact
//! - [`MarkdownExporter`] - Markdown tables
//!
//! ## Reports
//!
//! - [`StatsReport`] - one row per status for a [`civicdesk_core::StatsSummary`]
//! - [`HistoryReport`] - the status trail of one complaint
//! - [`ComplaintListReport`] - one row per complaint
//!
//! ## Example
//!
//! ```rust,ignore
//! use civicdesk_reports::{CsvExporter, ReportExporter, StatsReport};
//!
//! let report = StatsReport::new(&summary);
//! let csv = CsvExporter::new().export(&report);
//! ```

pub mod complaint_reports;
pub mod exporters;

pub use complaint_reports::{ComplaintListReport, HistoryReport, StatsReport};
pub use exporters::{
    exporter_for, CsvExporter, JsonExporter, MarkdownExporter, ReportData, ReportExporter,
};
