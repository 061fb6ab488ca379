mod models;
pub mod util;

pub use models::*;

#[cfg(test)]
pub(crate) mod test_support;
