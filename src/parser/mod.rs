pub mod errors;
pub mod index;

pub use errors::ParseError;
pub use index::{parse_sources, resolve_source};
