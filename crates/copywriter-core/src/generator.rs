use std::path::PathBuf;

use crate::ai::{CompletionBackend, CompletionResult};
use crate::copy_log::{CopyLog, LogError};
use crate::prompt::{AssembledPrompt, GenerationRequest};

/// What happened to the copy log after a generation.
#[derive(Debug)]
pub enum LogStatus {
    /// Logging disabled, or nothing to log because the completion failed.
    NotRequested,
    Saved(PathBuf),
    Failed(LogError),
}

/// Everything produced by one generate action.
#[derive(Debug)]
pub struct Generation {
    pub prompt: AssembledPrompt,
    pub result: CompletionResult,
    pub log_status: LogStatus,
}

/// Assemble -> complete -> log, once per call.
#[derive(Clone)]
pub struct Copywriter<B> {
    backend: B,
    log: Option<CopyLog>,
}

impl<B: CompletionBackend> Copywriter<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, log: None }
    }

    pub fn with_log(mut self, log: CopyLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Generation {
        let prompt = request.assemble();
        let result = self.backend.complete(&prompt).await;

        let log_status = match (&result, &self.log) {
            (CompletionResult::Success(text), Some(log)) => {
                match log.append(request, &prompt, text) {
                    Ok(()) => LogStatus::Saved(log.path().to_path_buf()),
                    Err(e) => {
                        tracing::error!(error = %e, "Could not append to copy log");
                        LogStatus::Failed(e)
                    }
                }
            }
            _ => LogStatus::NotRequested,
        };

        Generation {
            prompt,
            result,
            log_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::CompletionFailure;
    use crate::prompt::{Format, Tone};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Replays a canned result and records every prompt it was given.
    struct MockBackend {
        reply: CompletionResult,
        seen: Mutex<Vec<AssembledPrompt>>,
    }

    impl MockBackend {
        fn new(reply: CompletionResult) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionBackend for MockBackend {
        async fn complete(&self, prompt: &AssembledPrompt) -> CompletionResult {
            self.seen.lock().unwrap().push(prompt.clone());
            self.reply.clone()
        }

        fn model(&self) -> &str {
            "mock"
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("coffee", Tone::Casual, Format::Email).unwrap()
    }

    #[tokio::test]
    async fn test_success_is_logged() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("generated_copy.txt");
        let copywriter = Copywriter::new(MockBackend::new(CompletionResult::Success(
            "Great coffee.".to_string(),
        )))
        .with_log(CopyLog::new(&log_path));

        let generation = copywriter.generate(&request()).await;

        assert_eq!(generation.result.text(), Some("Great coffee."));
        assert!(matches!(generation.log_status, LogStatus::Saved(ref p) if p == &log_path));
        assert!(std::fs::read_to_string(&log_path)
            .unwrap()
            .contains("Great coffee."));
    }

    #[tokio::test]
    async fn test_backend_called_once_with_assembled_prompt() {
        let copywriter = Copywriter::new(MockBackend::new(CompletionResult::Success(
            "ok".to_string(),
        )));
        let req = request();
        let generation = copywriter.generate(&req).await;

        let seen = copywriter.backend().seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], req.assemble());
        assert_eq!(generation.prompt, req.assemble());
        assert!(matches!(generation.log_status, LogStatus::NotRequested));
    }

    #[tokio::test]
    async fn test_failure_is_not_logged() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("generated_copy.txt");
        let copywriter = Copywriter::new(MockBackend::new(CompletionResult::Failure(
            CompletionFailure::NoChoices,
        )))
        .with_log(CopyLog::new(&log_path));

        let generation = copywriter.generate(&request()).await;

        assert!(!generation.result.is_success());
        assert!(matches!(generation.log_status, LogStatus::NotRequested));
        assert!(!log_path.exists());
    }

    #[tokio::test]
    async fn test_log_failure_keeps_result() {
        let dir = tempdir().unwrap();
        let copywriter = Copywriter::new(MockBackend::new(CompletionResult::Success(
            "Still here.".to_string(),
        )))
        .with_log(CopyLog::new(dir.path()));

        let generation = copywriter.generate(&request()).await;

        assert_eq!(generation.result.text(), Some("Still here."));
        assert!(matches!(generation.log_status, LogStatus::Failed(_)));
    }
}
