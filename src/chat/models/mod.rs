mod chat;
mod chat_builder;
mod configs;
mod error;

pub use chat::*;
pub use chat_builder::*;
pub use configs::*;
pub use error::*;
