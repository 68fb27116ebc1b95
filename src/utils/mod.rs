pub mod text;

pub use text::{excerpt, redact, MAX_EXCERPT_CHARS};
