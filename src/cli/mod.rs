//! CLI command handling

pub mod notifications;
pub mod output;
pub mod toast;

pub use notifications::*;
pub use output::*;
pub use toast::*;
