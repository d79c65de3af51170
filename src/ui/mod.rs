//! Terminal output helpers
//!
//! Styled symbols on an interactive terminal, bracketed plain markers when
//! output is piped or running under CI.
//!
//! ```rust,ignore
//! use strata::ui::{self, UiContext};
//!
//! let ctx = UiContext::detect();
//! ui::intro(&ctx, "Build web");
//! ui::step_ok_detail(&ctx, "Layer built", "sha256:4f2a");
//! ```

mod context;
mod output;

pub use context::UiContext;
pub use output::{intro, key_value, step_info, step_ok_detail, step_warn_hint};
