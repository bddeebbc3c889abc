//! Error reporting: located errors, snippet rendering and the source map
//! that traces expanded text back to the files it came from.

pub mod error;
pub mod render;
pub mod source_map;

pub use error::{CompileError, ErrorKind, ErrorReason};
pub use render::{render_header, render_snippet, Snippet};
pub use source_map::{BlockInfo, MapRange, MappedPosition, OffsetRange, SourceMap};

pub type CompileResult<T> = Result<T, CompileError>;
