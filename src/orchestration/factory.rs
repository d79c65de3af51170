//! Engine factory
//!
//! Picks the engine binary from configuration, probing for one when the
//! selection is `auto`.

use crate::config::schema::EngineSelection;
use crate::error::{StrataError, StrataResult};
use crate::orchestration::cli_engine::{CliEngine, EngineKind};
use std::sync::Arc;
use tracing::debug;

/// Probe order for `auto`
const AUTO_ORDER: [EngineKind; 2] = [EngineKind::Podman, EngineKind::Docker];

/// Map an explicit selection to an engine kind (`None` for `auto`)
pub fn selected_kind(selection: EngineSelection) -> Option<EngineKind> {
    match selection {
        EngineSelection::Auto => None,
        EngineSelection::Podman => Some(EngineKind::Podman),
        EngineSelection::Docker => Some(EngineKind::Docker),
    }
}

/// Create the engine for the configured selection
///
/// # Returns
/// * `Ok(Arc<CliEngine>)` - usable as both engine and image store
/// * `Err(EngineNotFound)` - no candidate binary is installed
pub async fn create_engine(selection: EngineSelection) -> StrataResult<Arc<CliEngine>> {
    let candidates: Vec<EngineKind> = match selected_kind(selection) {
        Some(kind) => vec![kind],
        None => AUTO_ORDER.to_vec(),
    };

    for kind in candidates {
        if kind.installed().await {
            debug!("Using container engine: {}", kind.name());
            return Ok(Arc::new(CliEngine::new(kind)));
        }
    }

    Err(StrataError::EngineNotFound)
}
