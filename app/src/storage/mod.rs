//! Local storage boundary: key-value persistence and the audio asset area.

mod assets;
mod kv;

pub use assets::AudioAssets;
pub use kv::{FileStorage, KeyValueStorage, MemoryStorage};
