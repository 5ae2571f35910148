//! Data model shared across the crawl frontier: [`Task`], [`ScoredTask`],
//! and [`BufferState`]. No I/O, no concurrency — pure types.

mod buffer;
mod task;

pub use buffer::BufferState;
pub use task::{ScoredTask, Task, origin_of};
