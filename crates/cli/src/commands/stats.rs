//! Stats and Report commands

use anyhow::{bail, Context, Result};
use civicdesk_core::{ComplaintStatus, StatsScope};
use civicdesk_reports::{
    exporter_for, ComplaintListReport, HistoryReport, ReportData, StatsReport,
};
use civicdesk_service::{ComplaintService, ServiceContext, StatsService};
use std::fs;
use std::path::PathBuf;

use crate::{ReportFormat, ReportKind, ScopeArgs};

impl ScopeArgs {
    pub fn to_core_scope(&self) -> StatsScope {
        if let Some(reporter) = &self.reporter {
            StatsScope::Reporter(reporter.clone())
        } else if let Some(department) = &self.department {
            StatsScope::Department(department.clone())
        } else if let Some(kind) = self.reporter_type {
            StatsScope::ReporterType(kind.to_core_type())
        } else {
            StatsScope::Global
        }
    }
}

/// Print summary counts for `scope`
pub async fn show_stats(
    ctx: &ServiceContext,
    scope: StatsScope,
    refresh: bool,
    json: bool,
) -> Result<()> {
    let stats = StatsService::new(ctx);
    let summary = if refresh {
        stats.refresh(&scope).await?
    } else {
        stats.summary(&scope).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("📊 Complaint Statistics ({})", summary.scope);
    println!("   Total: {}", summary.total);
    println!("   Open:  {}", summary.open());
    println!(
        "   Resolution rate: {:.1}%",
        summary.resolution_rate() * 100.0
    );
    println!();
    for status in ComplaintStatus::ALL {
        println!("   {:<13} {}", status.as_str(), summary.count(status));
    }
    Ok(())
}

/// Export a report to stdout or a file
pub async fn generate_report(
    ctx: &ServiceContext,
    kind: ReportKind,
    id: Option<String>,
    format: ReportFormat,
    output: Option<PathBuf>,
    scope: StatsScope,
) -> Result<()> {
    let report: Box<dyn ReportData> = match kind {
        ReportKind::Stats => {
            let summary = StatsService::new(ctx).summary(&scope).await?;
            Box::new(StatsReport::new(&summary))
        }
        ReportKind::History => {
            let Some(id) = id else {
                bail!("--id is required for history reports");
            };
            let complaint = ComplaintService::new(ctx).get(&id).await?;
            Box::new(HistoryReport::new(&complaint))
        }
        ReportKind::List => {
            let complaints = ComplaintService::new(ctx)
                .list()
                .await?
                .into_iter()
                .filter(|c| scope.matches(c))
                .collect();
            Box::new(ComplaintListReport::new(&format!("Complaints ({})", scope), complaints))
        }
    };

    let exporter = exporter_for(format.as_str())
        .with_context(|| format!("No exporter for format {}", format.as_str()))?;
    let content = exporter.export(report.as_ref());

    match output {
        Some(path) => {
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write report to {:?}", path))?;
            println!(
                "✅ Report written to {:?} ({})",
                path,
                exporter.mime_type()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}
