pub mod client;
pub mod error;
pub mod source;

pub use client::{classify_response, FboxClient};
pub use error::FetchError;
pub use source::UnitSource;
