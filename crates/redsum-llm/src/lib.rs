pub mod config;
pub mod openai;
pub mod traits;
pub mod types;

pub use config::{OpenAIConfig, OPENAI_API_BASE};
pub use openai::OpenAIClient;
pub use traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, TokenUsage};
pub use types::{Content, ContentPart, Message};
