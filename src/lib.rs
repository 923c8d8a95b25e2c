pub mod decoder;
pub mod error;
pub mod reader;

// --- Library API for embedding ---

pub use decoder::decode;
pub use error::DecodeError;
pub use reader::{decode_pages, extract_reader_blob, parse_payload, ReaderPayload};
