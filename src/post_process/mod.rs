pub mod extractor;

pub use extractor::{ExtractTask, ExtractorCommand, SLIDES_FILE_NAME};
