pub mod compaction;
pub mod invocations;

pub use compaction::CompactionPlan;
pub use invocations::{call_tools, CHAT_ENDPOINT};
