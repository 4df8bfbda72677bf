//! CLI command handlers, one file per command.

mod add;
mod completions;
mod fetch_headers;
mod import;
mod status;

pub use add::run_add;
pub use completions::{run_completions, run_man};
pub use fetch_headers::{run_fetch_headers, FetchArgs};
pub use import::run_import;
pub use status::run_status;
