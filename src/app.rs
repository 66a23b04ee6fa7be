use std::path::{Path, PathBuf};

use copywriter_core::{
    export, ChatClient, Config, CopyLog, Copywriter, Format, GenerateError, GeneratedCopy,
    Generation, GenerationRequest, LogStatus, CompletionResult, Session, Tone,
};
use tokio::task::JoinHandle;

pub const DEFAULT_EXPORT_FILE: &str = "copy_export.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Form rows, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Topic,
    Tone,
    Format,
    PersonalContext,
    ContentContext,
    ExamplePath,
    Generate,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Topic,
        Field::Tone,
        Field::Format,
        Field::PersonalContext,
        Field::ContentContext,
        Field::ExamplePath,
        Field::Generate,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Topic => "Topic",
            Field::Tone => "Tone",
            Field::Format => "Format",
            Field::PersonalContext => "Personal context",
            Field::ContentContext => "Content context",
            Field::ExamplePath => "Add example file",
            Field::Generate => "Generate",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Field::Topic | Field::PersonalContext | Field::ContentContext | Field::ExamplePath
        )
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line text box with a character-indexed cursor.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize,
}

impl TextInput {
    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.value, self.cursor);
        self.value.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn optional(&self) -> Option<&str> {
        Some(self.value.as_str()).filter(|v| !v.trim().is_empty())
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: Field,

    // Form
    pub topic: TextInput,
    pub tone: Tone,
    pub format: Format,
    pub personal_context: TextInput,
    pub content_context: TextInput,
    pub example_path: TextInput,

    // Generation
    pub copywriter: Option<Copywriter<ChatClient>>,
    pub credential_error: Option<GenerateError>,
    pub model: String,
    pub generate_task: Option<JoinHandle<(GenerationRequest, Generation)>>,
    pub output: Option<String>,
    pub output_scroll: u16,
    pub export_path: PathBuf,

    // Feedback
    pub status: Option<StatusMessage>,
    pub animation_frame: u8,

    pub session: Session,
}

impl App {
    pub fn new(config: &Config, log_enabled: bool) -> Self {
        let model = config.model();
        let (copywriter, credential_error) = match ChatClient::from_config(config) {
            Ok(client) => {
                let copywriter = Copywriter::new(client);
                let copywriter = if log_enabled {
                    copywriter.with_log(CopyLog::new(config.log_path()))
                } else {
                    copywriter
                };
                (Some(copywriter), None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Generation disabled");
                (None, Some(e))
            }
        };

        let status = credential_error.as_ref().map(|e| StatusMessage {
            kind: StatusKind::Error,
            text: e.to_string(),
        });

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: Field::Topic,

            topic: TextInput::default(),
            tone: Tone::Professional,
            format: Format::Email,
            personal_context: TextInput::default(),
            content_context: TextInput::default(),
            example_path: TextInput::default(),

            copywriter,
            credential_error,
            model,
            generate_task: None,
            output: None,
            output_scroll: 0,
            export_path: PathBuf::from(DEFAULT_EXPORT_FILE),

            status,
            animation_frame: 0,

            session: Session::new(),
        }
    }

    pub fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            kind,
            text: text.into(),
        });
    }

    pub fn is_generating(&self) -> bool {
        self.generate_task.is_some()
    }

    /// The text box behind the focused row, if it is a text row.
    pub fn focused_input(&mut self) -> Option<&mut TextInput> {
        match self.focus {
            Field::Topic => Some(&mut self.topic),
            Field::PersonalContext => Some(&mut self.personal_context),
            Field::ContentContext => Some(&mut self.content_context),
            Field::ExamplePath => Some(&mut self.example_path),
            Field::Tone | Field::Format | Field::Generate => None,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Left/Right on a choice row.
    pub fn cycle_choice(&mut self, forward: bool) {
        match self.focus {
            Field::Tone => {
                self.tone = if forward { self.tone.next() } else { self.tone.prev() };
            }
            Field::Format => {
                self.format = if forward { self.format.next() } else { self.format.prev() };
            }
            _ => {}
        }
    }

    pub fn load_example(&mut self) {
        let raw = self.example_path.value.trim().to_string();
        if raw.is_empty() {
            return;
        }

        let path = expand_home(&raw);
        match self.session.add_example_file(&path) {
            Ok(doc) => {
                let message = if doc.text.trim().is_empty() {
                    format!("Loaded {} but found no text in it", doc.filename)
                } else {
                    format!("Loaded {} ({} characters)", doc.filename, doc.text.chars().count())
                };
                self.set_status(StatusKind::Success, message);
                self.example_path.clear();
            }
            Err(reason) => {
                self.set_status(StatusKind::Warning, format!("Skipped {}: {}", raw, reason));
            }
        }
    }

    pub fn remove_last_example(&mut self) {
        let count = self.session.examples().len();
        if let Some(doc) = count.checked_sub(1).and_then(|i| self.session.remove_example(i)) {
            self.set_status(StatusKind::Info, format!("Removed {}", doc.filename));
        }
    }

    pub fn start_generation(&mut self) {
        if self.generate_task.is_some() {
            return;
        }

        let Some(copywriter) = self.copywriter.clone() else {
            let message = self
                .credential_error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Generation is not configured".to_string());
            self.set_status(StatusKind::Error, message);
            return;
        };

        let request = match self.session.request(&self.topic.value, self.tone, self.format) {
            Ok(request) => request
                .with_personal_context(self.personal_context.optional())
                .with_content_context(self.content_context.optional()),
            Err(e) => {
                self.set_status(StatusKind::Warning, e.to_string());
                self.focus = Field::Topic;
                return;
            }
        };

        tracing::info!(
            tone = %request.tone(),
            format = %request.format(),
            examples = request.reference_examples().len(),
            "Starting generation"
        );

        self.status = None;
        self.animation_frame = 0;
        self.generate_task = Some(tokio::spawn(async move {
            let generation = copywriter.generate(&request).await;
            (request, generation)
        }));
    }

    /// Abort the in-flight request, if any.
    pub fn cancel_generation(&mut self) {
        if let Some(task) = self.generate_task.take() {
            task.abort();
            self.set_status(StatusKind::Info, "Generation cancelled");
        }
    }

    /// Collect the result of a finished request. Called once per loop iteration.
    pub async fn poll_generation(&mut self) {
        let finished = self
            .generate_task
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        let Some(task) = self.generate_task.take() else {
            return;
        };

        match task.await {
            Ok((request, generation)) => self.finish_generation(request, generation),
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                tracing::error!(error = %e, "Generation task failed");
                self.set_status(StatusKind::Error, format!("Generation failed: {}", e));
            }
        }
    }

    fn finish_generation(&mut self, request: GenerationRequest, generation: Generation) {
        match generation.result {
            CompletionResult::Success(text) => {
                self.session.record_generation(GeneratedCopy {
                    topic: request.topic().to_string(),
                    tone: request.tone(),
                    format: request.format(),
                    text: text.clone(),
                });
                self.output = Some(text);
                self.output_scroll = 0;

                match generation.log_status {
                    LogStatus::Saved(path) => self.set_status(
                        StatusKind::Success,
                        format!("Copy saved to {}", path.display()),
                    ),
                    LogStatus::Failed(e) => self.set_status(StatusKind::Error, e.to_string()),
                    LogStatus::NotRequested => {
                        self.set_status(StatusKind::Success, "Copy generated")
                    }
                }
            }
            CompletionResult::Failure(failure) => {
                self.set_status(StatusKind::Error, failure.to_string());
            }
        }
    }

    pub fn export_last(&mut self) {
        let Some(copy) = self.session.last_generation() else {
            self.set_status(StatusKind::Warning, "Nothing to export yet");
            return;
        };

        match export(&self.export_path, &copy.text) {
            Ok(()) => {
                let message = format!("Exported to {}", self.export_path.display());
                self.set_status(StatusKind::Success, message);
            }
            Err(e) => self.set_status(StatusKind::Error, e.to_string()),
        }
    }

    pub fn scroll_output_down(&mut self) {
        self.output_scroll = self.output_scroll.saturating_add(1);
    }

    pub fn scroll_output_up(&mut self) {
        self.output_scroll = self.output_scroll.saturating_sub(1);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_generating() {
            self.animation_frame = (self.animation_frame + 1) % 4;
        }
    }

    /// End of session.
    pub fn shutdown(&mut self) {
        self.cancel_generation();
        self.session.clear();
    }
}

/// Expand a leading `~/` so pasted paths behave like they do in a shell.
pub fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| Path::new(raw).to_path_buf()),
        None => PathBuf::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::tempdir;

    fn app_without_key() -> App {
        let config = Config {
            base_url: Some("http://127.0.0.1:9".to_string()),
            ..Config::new()
        };
        let mut app = App::new(&config, false);
        // Environment keys would enable generation; force the unconfigured path.
        app.copywriter = None;
        app.credential_error = Some(GenerateError::MissingCredential(config.provider()));
        app
    }

    #[test]
    fn test_text_input_is_utf8_safe() {
        let mut input = TextInput::default();
        for c in "café".chars() {
            input.insert(c);
        }
        input.left();
        input.insert('x');
        assert_eq!(input.value, "cafxé");
        input.backspace();
        input.delete();
        assert_eq!(input.value, "caf");
        input.home();
        input.delete();
        assert_eq!(input.value, "af");
        input.end();
        assert_eq!(input.cursor, 2);
    }

    #[test]
    fn test_optional_ignores_blank() {
        let mut input = TextInput::default();
        assert_eq!(input.optional(), None);
        input.value = "  ".to_string();
        assert_eq!(input.optional(), None);
        input.value = "brand".to_string();
        assert_eq!(input.optional(), Some("brand"));
    }

    #[test]
    fn test_field_navigation_wraps() {
        assert_eq!(Field::Topic.prev(), Field::Generate);
        assert_eq!(Field::Generate.next(), Field::Topic);
        assert!(Field::ExamplePath.is_text());
        assert!(!Field::Tone.is_text());
    }

    #[tokio::test]
    async fn test_missing_key_blocks_generation() {
        let mut app = app_without_key();
        app.topic.value = "coffee".to_string();
        app.start_generation();

        assert!(!app.is_generating());
        let status = app.status.unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.contains("API key"));
    }

    #[test]
    fn test_cycle_choice() {
        let mut app = app_without_key();
        app.focus = Field::Tone;
        app.cycle_choice(true);
        assert_eq!(app.tone, Tone::Casual);
        app.focus = Field::Format;
        app.cycle_choice(false);
        assert_eq!(app.format, Format::AdCopy);
    }

    #[test]
    fn test_load_example_updates_session() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("voice.txt");
        std::fs::write(&path, "I write short sentences.").unwrap();

        let mut app = app_without_key();
        app.example_path.value = path.display().to_string();
        app.load_example();

        assert_eq!(app.session.examples().len(), 1);
        assert!(app.example_path.value.is_empty());
        assert_eq!(app.status.as_ref().unwrap().kind, StatusKind::Success);

        app.remove_last_example();
        assert!(app.session.examples().is_empty());
    }

    #[test]
    fn test_export_without_result_warns() {
        let mut app = app_without_key();
        app.export_last();
        assert_eq!(app.status.unwrap().kind, StatusKind::Warning);
    }

    /// App wired to an endpoint that accepts connections and never answers.
    async fn app_with_silent_backend() -> (App, Arc<AtomicUsize>, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));

        let counter = connections.clone();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                held.push(socket);
            }
        });

        let mut app = app_without_key();
        app.copywriter = Some(Copywriter::new(ChatClient::new(
            &format!("http://{}", addr),
            "test-key",
            "test-model",
        )));
        app.credential_error = None;
        app.topic.value = "coffee".to_string();
        (app, connections, server)
    }

    #[tokio::test]
    async fn test_second_generate_is_refused_while_running() {
        let (mut app, connections, server) = app_with_silent_backend().await;

        app.start_generation();
        assert!(app.is_generating());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(connections.load(Ordering::SeqCst), 1);

        app.start_generation();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(app.is_generating());
        assert!(app.status.is_none());
        assert_eq!(connections.load(Ordering::SeqCst), 1);

        app.cancel_generation();
        server.abort();
    }

    #[tokio::test]
    async fn test_cancel_aborts_running_request() {
        let (mut app, _connections, server) = app_with_silent_backend().await;

        app.start_generation();
        assert!(app.is_generating());

        app.cancel_generation();
        assert!(!app.is_generating());
        let status = app.status.clone().unwrap();
        assert_eq!(status.kind, StatusKind::Info);

        // Nothing comes back from the aborted task.
        app.poll_generation().await;
        assert!(app.output.is_none());
        assert!(app.session.last_generation().is_none());
        assert_eq!(app.status.unwrap().kind, StatusKind::Info);

        server.abort();
    }
}
