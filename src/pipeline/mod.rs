//! Pipeline entry points.
//!
//! - `run_pipeline`: Poll, write outputs, notify on new matches
//! - `run_validate`: Check config, keywords and ledger
//! - `run_info`: Show ledger status

mod classify;
mod info;
#[allow(clippy::module_inception)]
mod pipeline;
mod poll;
mod validate;

pub use classify::{Classification, classify};
pub use info::run_info;
pub use pipeline::{RunOptions, RunReport, run_pipeline, run_pipeline_with};
pub use poll::{PollOptions, run_poll};
pub use validate::run_validate;
