//! Integer and string encodings applied inside a column chunk.
pub mod dict;
pub mod rle;

pub use dict::{Dictionary, HashTableDictionary};
pub use rle::RunLenIntEncoder;
