//! Output functions for consistent CLI formatting

use super::context::UiContext;
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓", "[OK]");
static INFO: Emoji<'_, '_> = Emoji("●", "[INFO]");
static WARN: Emoji<'_, '_> = Emoji("⚠", "[WARN]");

/// Display a heading
pub fn intro(ctx: &UiContext, title: &str) {
    if ctx.use_fancy_output() {
        println!("{}", style(title).cyan().bold());
    } else {
        println!("{}", title);
    }
}

/// Display a success step with detail
pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    if ctx.use_fancy_output() {
        println!(
            "  {} {} ({})",
            style(CHECK).green(),
            message,
            style(detail).dim()
        );
    } else {
        println!("  [OK] {} ({})", message, detail);
    }
}

/// Display an info step
pub fn step_info(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        println!("  {} {}", style(INFO).cyan(), message);
    } else {
        println!("  [INFO] {}", message);
    }
}

/// Display a warning step with hint
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    if ctx.use_fancy_output() {
        println!(
            "  {} {} - {}",
            style(WARN).yellow(),
            message,
            style(hint).dim()
        );
    } else {
        println!("  [WARN] {} - {}", message, hint);
    }
}

/// Print styled key-value pair
pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), value);
    } else {
        println!("  {}: {}", key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_non_interactive() {
        let ctx = UiContext::non_interactive();
        intro(&ctx, "Test");
        step_ok_detail(&ctx, "Layer built", "sha256:abc");
        step_info(&ctx, "Nothing to do");
        step_warn_hint(&ctx, "Cache miss", "Run: strata build web");
        key_value(&ctx, "fingerprint", "abc");
    }
}
