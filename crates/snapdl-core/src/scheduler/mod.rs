//! Worker pool shared by the extraction and download phases.
//!
//! Each phase hands its whole item list to [`run_bounded`] and returns only
//! once every item has been handled: the phases never overlap.

mod choose;
mod pool;

pub use choose::choose_worker_count;
pub use pool::{run_bounded, JobPanicked};
