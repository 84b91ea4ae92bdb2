pub mod answerer;
pub mod brief;
pub mod chunker;
pub mod embedder;
pub mod retriever;

pub use answerer::{AnswerError, Answerer, ChatOutcome, Citation};
pub use brief::{BriefGenerator, BriefOutcome, BriefRequest};
pub use chunker::{Chunk, Chunker};
pub use embedder::{EmbedError, EmbeddingService};
pub use retriever::{Confidence, Retrieval, RetrievalMode, Retriever};
