//! Build command - ensure a role layer exists

use crate::build::{
    BuildOptions, BuildOutcome, BuildState, Conductor, ContainerRoleBuilder, RoleBuildSettings,
};
use crate::cache::ImageCache;
use crate::cli::args::{BuildArgs, OutputFormat};
use crate::cli::commands::ProjectContext;
use crate::config::Config;
use crate::error::StrataResult;
use crate::orchestration::{create_engine, ContainerEngine};
use crate::ui::{self, UiContext};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Execute the build command
pub async fn execute(
    args: BuildArgs,
    config: &Config,
    project: &ProjectContext,
) -> StrataResult<()> {
    let engine = create_engine(config.engine.runtime).await?;

    let settings = RoleBuildSettings {
        base_image: args
            .base_image
            .clone()
            .unwrap_or_else(|| config.build.base_image.clone()),
        command: config.build.command.clone(),
        workdir: config.build.workdir.clone(),
    };
    let options = BuildOptions {
        repository: args
            .repository
            .clone()
            .or_else(|| config.build.repository.clone()),
        tag_latest: config.build.tag_latest && !args.no_latest,
    };

    let conductor = Conductor::new(
        project.fingerprint_engine(config),
        ImageCache::new(engine.clone()),
        options,
    );
    let builder = ContainerRoleBuilder::new(engine.clone(), settings);

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling build");
                cancel.cancel();
            }
        })
    };

    let result = conductor.ensure_built(&args.role, &builder, &cancel).await;
    interrupt.abort();
    let outcome = result?;

    match args.format {
        OutputFormat::Plain => println!("{}", outcome.image_id),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Table => print_outcome(&args.role, engine.engine_name(), &outcome),
    }

    Ok(())
}

fn print_outcome(role: &str, engine: &str, outcome: &BuildOutcome) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, &format!("Layer for role {}", role));
    ui::key_value(&ctx, "engine", engine);
    ui::key_value(&ctx, "fingerprint", outcome.fingerprint.as_str());

    match outcome.state {
        BuildState::Cached => ui::step_info(&ctx, &format!("Cached: {}", outcome.image_id)),
        _ => ui::step_ok_detail(&ctx, "Built", &outcome.image_id),
    }

    for tag in &outcome.tags {
        ui::step_ok_detail(&ctx, "Tagged", tag);
    }
}
