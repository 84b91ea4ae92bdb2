pub mod backfill;
pub mod extract;
pub mod feed;
pub mod fetcher;
pub mod pipeline;
pub mod scheduler;
pub mod scrape;
pub mod seed;

pub use extract::{ContentExtractor, ExtractError, Extracted};
pub use feed::ParseError;
pub use fetcher::{FetchError, Fetcher};
pub use pipeline::{IngestionPipeline, PipelineDeps};
pub use scheduler::Scheduler;
