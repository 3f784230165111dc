//! Reading sources and writing merged output.

pub mod reader;
pub mod writer;

pub use reader::SourceReader;
pub use writer::{DocumentWriter, WriteOptions};
