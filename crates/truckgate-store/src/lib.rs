//! File storage for documents, captured plate frames and audio artifacts

pub mod audio;
pub mod documents;
pub mod filename;

pub use audio::AudioStore;
pub use documents::{DocumentKind, DocumentStore};
pub use filename::secure_filename;
