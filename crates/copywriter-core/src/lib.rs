pub mod ai;
pub mod config;
pub mod copy_log;
pub mod error;
pub mod extract;
pub mod generator;
pub mod prompt;
pub mod provider;
pub mod state;

// Re-export main types for convenience
pub use ai::{ChatClient, CompletionBackend, CompletionFailure, CompletionResult};
pub use config::Config;
pub use copy_log::{export, CopyLog, LogError};
pub use error::GenerateError;
pub use extract::{extract, read_example, ExampleDocument, ExtractionError, ExtractionResult};
pub use generator::{Copywriter, Generation, LogStatus};
pub use prompt::{assemble_prompt, AssembledPrompt, Format, GenerationRequest, Tone};
pub use provider::Provider;
pub use state::{GeneratedCopy, Session};
