//! CLI command implementations

pub mod build;
pub mod config;
pub mod fingerprint;
pub mod lookup;

pub use build::execute as build;
pub use config::execute as config;
pub use fingerprint::execute as fingerprint;
pub use lookup::execute as lookup;

use crate::config::Config;
use crate::fingerprint::FingerprintEngine;
use crate::role::{DependencyResolver, SearchPathLocator};
use std::path::PathBuf;
use std::sync::Arc;

/// Where roles are looked up for this invocation
#[derive(Debug, Clone)]
pub struct ProjectContext {
    /// Project directory; relative search paths resolve against it
    pub dir: PathBuf,

    /// `--roles-path` directories, searched before configured ones
    pub extra_roles_paths: Vec<PathBuf>,
}

impl ProjectContext {
    pub fn new(dir: PathBuf, extra_roles_paths: Vec<PathBuf>) -> Self {
        Self {
            dir,
            extra_roles_paths,
        }
    }

    /// Role locator over the command line, configured and standard paths
    pub fn locator(&self, config: &Config) -> SearchPathLocator {
        let configured: Vec<PathBuf> = self
            .extra_roles_paths
            .iter()
            .chain(config.roles.search_paths.iter())
            .cloned()
            .collect();
        SearchPathLocator::with_defaults(&self.dir, &configured)
    }

    pub fn fingerprint_engine(&self, config: &Config) -> FingerprintEngine {
        let locator = Arc::new(self.locator(config));
        FingerprintEngine::new(DependencyResolver::new(locator))
    }
}
