//! Scan command implementation

use std::sync::Arc;

use colored::Colorize;
use fileinstall_core::PropertyContext;

use crate::context;
use crate::error::{CliError, Result};
use crate::pipeline::CollectingPipeline;

/// Poll every configured directory once and list what would be registered.
pub fn run_scan(properties: &PropertyContext, json: bool) -> Result<()> {
    let (service, host) = context::service(properties)?;
    if !service.has_configurations() {
        return Err(CliError::user(
            "No directories configured (use --dir or set fileinstall.dir)",
        ));
    }

    let pipeline = Arc::new(CollectingPipeline::new());
    service.attach(pipeline.clone(), &host);
    service.poll();
    let records = pipeline.take();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for (root, scheme) in service.roots().iter().zip(service.schemes()) {
        println!("{} {}", root.to_string().bold(), scheme.dimmed());
    }
    println!();
    if records.is_empty() {
        println!("  {}", "No installable files".dimmed());
    } else {
        for record in &records {
            let kind = record.resource_type.map(|t| t.to_string()).unwrap_or_default();
            println!("  {} {} ({})", "+".green(), record.id.cyan(), kind);
        }
    }
    println!();
    println!("{} resource(s)", records.len());
    Ok(())
}
