//! Apply command - resolve imports and write generated regions

use super::WorkspaceArgs;
use anyhow::{Result, bail};
use computed_settings_core::{Cancellation, PassReport};
use std::io::IsTerminal;
use tracing::info;

pub async fn execute(args: &WorkspaceArgs, dry_run: bool, json: bool) -> Result<()> {
    let service = args.service(dry_run)?;
    let report = service.run_pass(&Cancellation::new()).await?;
    print_report(&report, json)?;

    if report.has_errors() {
        bail!("some targets could not be updated");
    }
    info!(
        written = report.targets.iter().filter(|t| t.written).count(),
        "done"
    );
    Ok(())
}

/// Print `report` to stdout as text or JSON.
pub fn print_report(report: &PassReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    } else {
        print!("{}", report.to_text(std::io::stdout().is_terminal()));
    }
    Ok(())
}
