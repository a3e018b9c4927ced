pub mod content;
pub mod document;
pub mod extractor;
pub mod fetcher;
pub mod structured;

pub use document::Document;
pub use extractor::HtmlExtractor;
pub use fetcher::ReqwestFetcher;
