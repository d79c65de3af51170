//! Lookup command - find the image built for a fingerprint

use crate::cache::ImageCache;
use crate::cli::args::{LookupArgs, OutputFormat};
use crate::cli::commands::ProjectContext;
use crate::config::Config;
use crate::error::{StrataError, StrataResult};
use crate::fingerprint::Fingerprint;
use crate::orchestration::create_engine;
use crate::ui::{self, UiContext};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Serialize)]
struct LookupResult<'a> {
    fingerprint: &'a Fingerprint,
    image_id: Option<&'a str>,
}

/// Execute the lookup command
pub async fn execute(
    args: LookupArgs,
    config: &Config,
    project: &ProjectContext,
) -> StrataResult<()> {
    let fingerprint = match (&args.fingerprint, &args.role) {
        (Some(hex), _) => hex.parse::<Fingerprint>()?,
        (None, Some(role)) => {
            project
                .fingerprint_engine(config)
                .fingerprint(role, &CancellationToken::new())
                .await?
        }
        (None, None) => {
            return Err(StrataError::User(
                "Specify a role or --fingerprint".to_string(),
            ))
        }
    };

    let engine = create_engine(config.engine.runtime).await?;
    let cache = ImageCache::new(engine);
    let image_id = cache.lookup(&fingerprint).await?;

    match args.format {
        OutputFormat::Json => {
            let result = LookupResult {
                fingerprint: &fingerprint,
                image_id: image_id.as_deref(),
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Table => {
            let ctx = UiContext::detect();
            ui::key_value(&ctx, "fingerprint", fingerprint.as_str());
            match &image_id {
                Some(id) => ui::step_ok_detail(&ctx, "Cached", id),
                None => ui::step_warn_hint(&ctx, "Not cached", "Run: strata build <ROLE>"),
            }
        }
        OutputFormat::Plain => match &image_id {
            Some(id) => println!("{}", id),
            None => {
                return Err(StrataError::User(format!(
                    "No image for fingerprint {}",
                    fingerprint
                )))
            }
        },
    }

    Ok(())
}
