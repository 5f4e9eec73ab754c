// Adapters layer: spreadsheet reading/writing and local file storage.

pub mod reader;
pub mod storage;
pub mod writer;

pub use storage::LocalStorage;
