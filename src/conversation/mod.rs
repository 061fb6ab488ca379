pub mod errors;
pub mod messages;
pub mod stats;
pub mod summary;

pub use errors::LogError;
pub use messages::ChatMessages;
pub use stats::ConversationStats;
