//! UI-agnostic session state
//!
//! A [`Session`] lives from the moment a front end opens until it closes. It
//! holds the writing samples the user has loaded and the most recent result,
//! and is passed by reference wherever a request is built.

use std::path::Path;

use crate::error::GenerateError;
use crate::extract::{self, ExampleDocument, ExtractionError, MAX_EXAMPLE_FILES};
use crate::prompt::{Format, GenerationRequest, Tone};

/// The last successful generation, kept for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCopy {
    pub topic: String,
    pub tone: Tone,
    pub format: Format,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct Session {
    examples: Vec<ExampleDocument>,
    last_generation: Option<GeneratedCopy>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn examples(&self) -> &[ExampleDocument] {
        &self.examples
    }

    pub fn add_example(&mut self, document: ExampleDocument) {
        self.examples.push(document);
        if self.examples.len() > MAX_EXAMPLE_FILES {
            tracing::warn!(
                count = self.examples.len(),
                limit = MAX_EXAMPLE_FILES,
                "More example files loaded than the advertised limit"
            );
        }
    }

    /// Extract a file and keep it as a writing sample.
    ///
    /// Returns the stored document, or why it was skipped.
    pub fn add_example_file(&mut self, path: &Path) -> Result<&ExampleDocument, ExtractionError> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let text = extract::read_example(path).into_result()?;
        self.add_example(ExampleDocument { filename, text });
        let index = self.examples.len() - 1;
        Ok(&self.examples[index])
    }

    pub fn remove_example(&mut self, index: usize) -> Option<ExampleDocument> {
        (index < self.examples.len()).then(|| self.examples.remove(index))
    }

    /// Start a request for this session, carrying its writing samples in upload order.
    pub fn request(
        &self,
        topic: &str,
        tone: Tone,
        format: Format,
    ) -> Result<GenerationRequest, GenerateError> {
        Ok(GenerationRequest::new(topic, tone, format)?
            .with_reference_examples(self.examples.iter().map(|doc| doc.text.clone())))
    }

    pub fn record_generation(&mut self, copy: GeneratedCopy) {
        self.last_generation = Some(copy);
    }

    pub fn last_generation(&self) -> Option<&GeneratedCopy> {
        self.last_generation.as_ref()
    }

    /// End of session: drop samples and results.
    pub fn clear(&mut self) {
        self.examples.clear();
        self.last_generation = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn doc(name: &str, text: &str) -> ExampleDocument {
        ExampleDocument {
            filename: name.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_request_carries_examples_in_order() {
        let mut session = Session::new();
        session.add_example(doc("a.txt", "first sample"));
        session.add_example(doc("b.txt", "second sample"));

        let request = session.request("coffee", Tone::Casual, Format::Email).unwrap();
        assert_eq!(
            request.reference_examples(),
            &["first sample".to_string(), "second sample".to_string()]
        );

        let system = request.assemble().system_message;
        assert!(system.find("first sample").unwrap() < system.find("second sample").unwrap());
    }

    #[test]
    fn test_add_example_file_skips_unsupported() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("voice.txt");
        let bad = dir.path().join("voice.rtf");
        std::fs::write(&good, "hello").unwrap();
        std::fs::write(&bad, "hello").unwrap();

        let mut session = Session::new();
        assert_eq!(session.add_example_file(&good).unwrap().filename, "voice.txt");
        let error = session.add_example_file(&bad).unwrap_err();
        assert_eq!(
            error,
            ExtractionError::Unsupported {
                extension: "rtf".to_string()
            }
        );
        assert_eq!(session.examples().len(), 1);
    }

    #[test]
    fn test_limits_are_not_enforced() {
        let mut session = Session::new();
        for i in 0..MAX_EXAMPLE_FILES + 2 {
            session.add_example(doc(&format!("{}.txt", i), "sample"));
        }
        assert_eq!(session.examples().len(), MAX_EXAMPLE_FILES + 2);
    }

    #[test]
    fn test_remove_example() {
        let mut session = Session::new();
        session.add_example(doc("a.txt", "a"));
        assert_eq!(session.remove_example(3), None);
        assert_eq!(session.remove_example(0).unwrap().filename, "a.txt");
        assert!(session.examples().is_empty());
    }

    #[test]
    fn test_clear_resets_session() {
        let mut session = Session::new();
        session.add_example(doc("a.txt", "a"));
        session.record_generation(GeneratedCopy {
            topic: "coffee".to_string(),
            tone: Tone::Casual,
            format: Format::Email,
            text: "copy".to_string(),
        });
        assert!(session.last_generation().is_some());

        session.clear();
        assert!(session.examples().is_empty());
        assert!(session.last_generation().is_none());
    }

    #[test]
    fn test_request_rejects_empty_topic() {
        let session = Session::new();
        assert!(session.request("", Tone::Casual, Format::Email).is_err());
    }
}
