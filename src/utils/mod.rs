pub mod error;
pub mod logger;
pub(crate) mod traits;
