pub mod error;
pub mod files;
pub mod store;

pub use error::StoreError;
pub use files::StoreFile;
pub use store::StateStore;
