//! UI module for consistent CLI output
//!
//! Uses `cliclack` for banners, step lines and spinners, with automatic
//! fallback to plain output in CI/non-interactive environments.
//!
//! # Example
//!
//! ```rust,ignore
//! use sdb::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//!
//! ui::intro(&ctx, "sdb build");
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Checking image...");
//! spinner.stop("Image web:3ec05fad exists");
//!
//! ui::step_ok_detail(&ctx, "Tagged", "web:1.0");
//! ui::outro_success(&ctx, "Done");
//! ```

mod context;
mod output;
mod progress;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_success, outro_warn, section, step_error_detail, step_info, step_ok,
    step_ok_detail, step_warn,
};
pub use progress::{BuildProgress, TaskSpinner};
pub use theme::{init_theme, SdbTheme};
