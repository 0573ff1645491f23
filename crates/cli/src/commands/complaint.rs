//! Complaint commands - submit, transition, show

use anyhow::Result;
use civicdesk_core::{Complaint, ComplaintStatus, IdentityClaim, NewComplaint, Transition};
use civicdesk_service::{ComplaintService, ServiceContext};

use crate::SubmitArgs;

/// Submit a complaint
pub async fn submit(ctx: &ServiceContext, args: SubmitArgs) -> Result<()> {
    let identity = args.national_id.map(|id| IdentityClaim {
        national_id: id,
        holder_name: args.holder,
        region: args.region,
    });

    let fields = NewComplaint {
        title: args.title,
        category: args.category,
        description: args.description,
        priority: Some(args.priority.to_core_type()),
        reporter_type: Some(args.reporter_type.to_core_type()),
        reporter_id: args.reporter_id,
        identity,
        location: args.location,
        handler_id: args.handler,
        department_id: args.department,
    };

    let result = ComplaintService::new(ctx)
        .submit(fields, args.actor.as_deref())
        .await?;
    let c = &result.complaint;

    println!("✅ Complaint submitted");
    println!("   ID:       {}", c.id());
    println!("   Category: {}", c.category.label());
    println!("   Priority: {}", c.priority);
    println!("   Reporter: {}", c.reporter_type);
    if let Some(identity) = c.identity_verification() {
        println!("   Identity: {} (verified)", identity.masked_id());
    }
    println!("   Event:    {}", result.event_id);
    Ok(())
}

/// Move a complaint to `status`
pub async fn transition(
    ctx: &ServiceContext,
    id: &str,
    status: ComplaintStatus,
    note: Option<&str>,
    actor: Option<&str>,
) -> Result<()> {
    let result = ComplaintService::new(ctx)
        .transition(id, status, note, actor)
        .await?;

    match result.transition {
        Transition::Applied { from, to } => {
            println!("✅ {}: {} → {}", id, from, to);
        }
        Transition::Unchanged(status) => {
            println!("ℹ️  {} is already {}, nothing recorded", id, status);
        }
    }
    Ok(())
}

/// Print a complaint and its history
pub async fn show(ctx: &ServiceContext, id: &str, with_audit: bool) -> Result<()> {
    let service = ComplaintService::new(ctx);
    let complaint = service.get(id).await?;
    print_complaint(&complaint);

    if with_audit {
        let events = service.audit_trail(id)?;
        println!();
        println!("--- Audit Feed ({}) ---", events.len());
        for e in events {
            println!(
                "{} | {} | {} | {} → {}",
                e.event_id,
                e.timestamp.format("%Y-%m-%d %H:%M:%S"),
                e.kind,
                e.from.map_or_else(|| "-".to_string(), |s| s.to_string()),
                e.to
            );
        }
    }
    Ok(())
}

fn print_complaint(c: &Complaint) {
    println!("📄 {}", c);
    println!("   Title:       {}", c.title);
    println!("   Category:    {}", c.category.label());
    println!("   Priority:    {}", c.priority);
    println!("   Status:      {}", c.status());
    println!("   Reporter:    {}", c.reporter_type);
    if let Some(identity) = c.identity_verification() {
        println!("   Identity:    {}", identity.masked_id());
    }
    if let Some(department) = &c.department_id {
        println!("   Department:  {}", department);
    }
    if let Some(location) = &c.location {
        println!("   Location:    {}", location);
    }
    println!("   Description: {}", c.description);
    println!();
    println!("--- Status History ---");
    println!(
        "{:<20} | {:<13} | {:<12} | Note",
        "Recorded At", "Status", "Actor"
    );
    println!("{}", "-".repeat(64));
    for entry in c.status_history() {
        println!(
            "{:<20} | {:<13} | {:<12} | {}",
            entry.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            entry.status.as_str(),
            entry.actor.as_deref().unwrap_or("-"),
            entry.note.as_deref().unwrap_or("")
        );
    }
}
