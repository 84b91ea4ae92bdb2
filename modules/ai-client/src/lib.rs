pub mod error;
pub mod fake;
pub mod openai;
pub mod traits;

pub use error::AiClientError;
pub use fake::{FakeChat, FakeEmbedder};
pub use openai::OpenAi;
pub use traits::{ChatModel, Embedder, Message, MessageRole};
