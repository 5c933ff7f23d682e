//! Source module — where raw log lines come from.

pub mod fake;
pub mod file;
pub mod line;

pub use file::FileTailer;
pub use line::{LineSource, RawLine};
