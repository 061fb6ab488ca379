pub mod base;
pub mod chat;
pub mod errors;
pub mod options;

pub use base::*;
pub use chat::*;
pub use errors::*;
pub use options::*;
