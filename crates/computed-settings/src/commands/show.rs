//! Show command - print computed values without writing

use super::WorkspaceArgs;
use anyhow::Result;
use computed_settings_config::{to_json, to_pretty_string};
use computed_settings_core::Cancellation;
use serde_json::json;

pub async fn execute(args: &WorkspaceArgs, json: bool) -> Result<()> {
    let service = args.service(true)?;
    let report = service.run_pass(&Cancellation::new()).await?;

    if json {
        let targets: Vec<_> = report
            .targets
            .iter()
            .map(|target| {
                json!({
                    "scope": target.scope.to_string(),
                    "destination": target.destination.as_str(),
                    "property": target.property.segments(),
                    "value": to_json(&target.value),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&targets)?);
        return Ok(());
    }

    for target in &report.targets {
        let property = if target.property.is_root() {
            String::new()
        } else {
            format!(" {}", target.property)
        };
        println!("# {} {}{property}", target.scope, target.destination);
        println!("{}", to_pretty_string(&target.value, "  "));
    }
    for diagnostic in report.all_diagnostics() {
        eprint!("{}", diagnostic.to_text(Some(&report.sources)));
    }
    Ok(())
}
