pub mod document;
#[doc(hidden)]
pub mod fixture;
pub mod text;

pub use document::SourceDocument;
