//! Terminal output
//!
//! Uses `cliclack` for interactive terminals with automatic fallback to
//! plain tagged lines in CI.
//!
//! ```rust,ignore
//! use bcsched::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//! ui::intro(&ctx, "bcsched build");
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Resolving build configs...");
//! spinner.stop("3 build configs");
//!
//! ui::outro_success(&ctx, "All builds complete");
//! ```

mod context;
mod output;
mod progress;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_success, outro_warn, remark, step_error_detail, step_info,
    step_ok_detail, step_warn_hint,
};
pub use progress::{BuildProgress, TaskSpinner};
pub use theme::{init_theme, BcschedTheme};
