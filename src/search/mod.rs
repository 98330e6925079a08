//! Search orchestration module
//!
//! Pages through each SearXNG instance and merges the results of many
//! instances into one stream.

mod orchestrator;
mod pager;

pub use orchestrator::{Orchestrator, SearchRun};
pub use pager::{InstancePager, PageError, PagerState};
