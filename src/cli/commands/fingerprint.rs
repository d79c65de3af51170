//! Fingerprint command - print a role's fingerprint

use crate::cli::args::{FingerprintArgs, OutputFormat};
use crate::cli::commands::ProjectContext;
use crate::config::Config;
use crate::error::StrataResult;
use crate::fingerprint::FingerprintReport;
use crate::ui::{self, UiContext};
use console::style;
use tokio_util::sync::CancellationToken;

/// Execute the fingerprint command
pub async fn execute(
    args: FingerprintArgs,
    config: &Config,
    project: &ProjectContext,
) -> StrataResult<()> {
    let engine = project.fingerprint_engine(config);
    let report = engine
        .fingerprint_closure(&args.role, &CancellationToken::new())
        .await?;

    match args.format {
        OutputFormat::Plain => println!("{}", report.fingerprint),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_table(&args.role, &report),
    }

    Ok(())
}

fn print_table(role: &str, report: &FingerprintReport) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, &format!("Role {}", role));
    ui::key_value(&ctx, "fingerprint", report.fingerprint.as_str());
    println!();

    println!(
        "{:<24} {:<30} {}",
        style("ROLE").bold(),
        style("DEPENDENCIES").bold(),
        style("PATH").bold()
    );
    println!("{}", "-".repeat(80));

    for resolved in &report.roles {
        let deps = if resolved.dependencies.is_empty() {
            "-".to_string()
        } else {
            resolved.dependencies.join(",")
        };
        println!(
            "{:<24} {:<30} {}",
            resolved.name,
            deps,
            resolved.path.display()
        );
    }

    println!();
    println!("{} role(s)", report.roles.len());
}
