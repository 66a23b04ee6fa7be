pub mod chat;

pub use chat::{
    ChatClient, CompletionBackend, CompletionFailure, CompletionResult, DEFAULT_MAX_TOKENS,
    DEFAULT_TIMEOUT_SECS,
};
