//! Rendering module for converting documents to various output formats.

mod json;
mod markdown;
mod options;
mod text;

pub use json::{chunks_to_json, to_json, JsonFormat};
pub use markdown::{csv_to_markdown, to_markdown};
pub use options::{PageSelection, RenderOptions, TableFallback};
pub use text::to_text;
