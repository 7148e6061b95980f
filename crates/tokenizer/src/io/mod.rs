//! Serialization and deserialization of trained tokenizers.

pub mod format;
pub mod load;
pub mod save;

pub use format::{SerializedMerge, SerializedTokenizer, FORMAT_VERSION, TOKENIZER_FILE};
pub use load::TokenizerLoader;
pub use save::TokenizerSaver;
