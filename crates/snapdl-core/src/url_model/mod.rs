//! Input URL validation and output filename derivation.

mod filename;
mod source;

pub use filename::FilenameGenerator;
pub use source::SourceUrl;
