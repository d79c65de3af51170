//! Content-addressed image cache
//!
//! Images built from a role are labelled with the role's fingerprint, so
//! the store itself is the index: looking up a fingerprint is a label
//! query. Same fingerprint = same image.
//!
//! # Lookup Results
//!
//! | Matches | Result |
//! |---------|--------|
//! | 0 | miss (`None`) |
//! | 1 | hit (image ID) |
//! | 2+ | `CacheInconsistency` error |

pub mod index;

pub use index::ImageCache;

/// Image label keys used to track layer metadata
pub mod labels {
    /// Fingerprint of the role closure the layer was built from
    pub const FINGERPRINT: &str = "io.strata.fingerprint";
    /// Root role name
    pub const ROLE: &str = "io.strata.role";
    /// Commit timestamp (RFC3339)
    pub const BUILT_AT: &str = "io.strata.built_at";
}

/// Commit message recorded on every layer
pub const LAYER_COMMENT: &str = "Built with strata";
