//! Append-only, human-readable record of every successful generation.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::prompt::{AssembledPrompt, GenerationRequest};

pub const RECORD_SEPARATOR_WIDTH: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Failed to save copy to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct CopyLog {
    path: PathBuf,
}

impl CopyLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. Existing records are never rewritten.
    pub fn append(
        &self,
        request: &GenerationRequest,
        prompt: &AssembledPrompt,
        generated: &str,
    ) -> Result<(), LogError> {
        let record = format_record(request, prompt, generated);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.write_error(source))?;
        file.write_all(record.as_bytes())
            .map_err(|source| self.write_error(source))?;

        tracing::debug!(path = %self.path.display(), "Appended generation to copy log");
        Ok(())
    }

    fn write_error(&self, source: std::io::Error) -> LogError {
        LogError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

fn format_record(request: &GenerationRequest, prompt: &AssembledPrompt, generated: &str) -> String {
    let mut record = format!(
        "Prompt: {}\nTone: {}\nFormat: {}\n",
        prompt.user_message,
        request.tone(),
        request.format()
    );
    if let Some(personal) = request.personal_context() {
        record.push_str(&format!("Personal Context: {}\n", personal));
    }
    if let Some(content) = request.content_context() {
        record.push_str(&format!("Content Context: {}\n", content));
    }
    if !request.reference_examples().is_empty() {
        record.push_str(&format!(
            "Reference Examples: {}\n",
            request.reference_examples().len()
        ));
    }
    record.push_str(&format!("Generated Copy:\n{}\n", generated));
    record.push_str(&"=".repeat(RECORD_SEPARATOR_WIDTH));
    record.push_str("\n\n");
    record
}

/// Write a single result to its own file, replacing that file if it exists.
pub fn export(path: &Path, generated: &str) -> Result<(), LogError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| LogError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, generated).map_err(|source| LogError::Write {
        path: path.to_path_buf(),
        source,
    })
}
