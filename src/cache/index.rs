//! Fingerprint to image lookup

use crate::cache::labels;
use crate::error::{StrataError, StrataResult};
use crate::fingerprint::Fingerprint;
use crate::orchestration::{Capability, ImageStore};
use std::sync::Arc;
use tracing::debug;

/// Looks up layers by fingerprint label in an image store
#[derive(Clone)]
pub struct ImageCache {
    store: Arc<dyn ImageStore>,
}

impl ImageCache {
    pub fn new(store: Arc<dyn ImageStore>) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &dyn ImageStore {
        self.store.as_ref()
    }

    /// Find the image built for `fingerprint`.
    ///
    /// Intermediate (untagged) images count. More than one match is
    /// reported as `CacheInconsistency` rather than picking one.
    pub async fn lookup(&self, fingerprint: &Fingerprint) -> StrataResult<Option<String>> {
        self.store
            .capabilities()
            .require(self.store.store_name(), Capability::Query)?;

        let mut images = self
            .store
            .images_by_label(labels::FINGERPRINT, fingerprint.as_str())
            .await?;

        match images.len() {
            0 => {
                debug!("Cache miss for {}", fingerprint.short());
                Ok(None)
            }
            1 => {
                let image = images.remove(0);
                debug!("Cache hit for {}: {}", fingerprint.short(), image.id);
                Ok(Some(image.id))
            }
            _ => Err(StrataError::CacheInconsistency {
                fingerprint: fingerprint.to_string(),
                images: images.into_iter().map(|img| img.id).collect(),
            }),
        }
    }
}
