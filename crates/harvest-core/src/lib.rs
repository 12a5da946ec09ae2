pub mod error;
pub mod har;
pub mod parse;

pub use error::{Error, Result};
