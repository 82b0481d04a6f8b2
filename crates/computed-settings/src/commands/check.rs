//! Check command - report stale regions and host mismatches

use super::WorkspaceArgs;
use super::apply::print_report;
use anyhow::{Result, bail};
use computed_settings_core::Cancellation;
use computed_settings_error_reporting::ErrorKind;

pub async fn execute(args: &WorkspaceArgs) -> Result<()> {
    let service = args.service(true)?;
    let report = service.run_pass(&Cancellation::new()).await?;
    print_report(&report, false)?;

    let stale = report.targets.iter().filter(|t| t.changed).count();
    let mismatches = report
        .all_diagnostics()
        .filter(|d| d.error_kind() == Some(ErrorKind::ImportsMismatch))
        .count();

    if report.has_errors() {
        bail!("the import settings have errors");
    }
    if stale > 0 || mismatches > 0 {
        bail!("{stale} target(s) out of date, {mismatches} mismatch(es) with the settings files");
    }
    Ok(())
}
