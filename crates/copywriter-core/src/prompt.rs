//! Prompt assembly
//!
//! Turns a validated [`GenerationRequest`] into the system/user message pair
//! sent to the chat-completion endpoint. Everything here is pure: the same
//! request always renders to byte-identical messages.

use std::fmt;
use std::str::FromStr;

use crate::error::GenerateError;

/// Number of characters of each reference example embedded in the system message.
pub const EXAMPLE_EXCERPT_CHARS: usize = 500;

const PERSONA: &str = "You are an expert copywriter.";

/// Voice the generated copy should be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Professional,
    Casual,
    Persuasive,
    Friendly,
    Witty,
    Inspirational,
}

impl Tone {
    pub const ALL: [Tone; 6] = [
        Tone::Professional,
        Tone::Casual,
        Tone::Persuasive,
        Tone::Friendly,
        Tone::Witty,
        Tone::Inspirational,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tone::Professional => "Professional",
            Tone::Casual => "Casual",
            Tone::Persuasive => "Persuasive",
            Tone::Friendly => "Friendly",
            Tone::Witty => "Witty",
            Tone::Inspirational => "Inspirational",
        }
    }

    /// Lowercase form used inside the user message.
    pub fn prompt_word(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Persuasive => "persuasive",
            Tone::Friendly => "friendly",
            Tone::Witty => "witty",
            Tone::Inspirational => "inspirational",
        }
    }

    pub fn next(&self) -> Self {
        cycle(&Self::ALL, *self, 1)
    }

    pub fn prev(&self) -> Self {
        cycle(&Self::ALL, *self, Self::ALL.len() - 1)
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tone {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_choice(s);
        Self::ALL
            .into_iter()
            .find(|tone| tone.prompt_word() == wanted)
            .ok_or_else(|| unknown_choice("tone", s, Self::ALL.iter().map(Tone::label)))
    }
}

/// Kind of copy to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Email,
    SocialMediaPost,
    BlogPost,
    ProductDescription,
    Newsletter,
    AdCopy,
}

impl Format {
    pub const ALL: [Format; 6] = [
        Format::Email,
        Format::SocialMediaPost,
        Format::BlogPost,
        Format::ProductDescription,
        Format::Newsletter,
        Format::AdCopy,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Format::Email => "Email",
            Format::SocialMediaPost => "Social Media Post",
            Format::BlogPost => "Blog Post",
            Format::ProductDescription => "Product Description",
            Format::Newsletter => "Newsletter",
            Format::AdCopy => "Ad Copy",
        }
    }

    pub fn prompt_word(&self) -> &'static str {
        match self {
            Format::Email => "email",
            Format::SocialMediaPost => "social media post",
            Format::BlogPost => "blog post",
            Format::ProductDescription => "product description",
            Format::Newsletter => "newsletter",
            Format::AdCopy => "ad copy",
        }
    }

    pub fn next(&self) -> Self {
        cycle(&Self::ALL, *self, 1)
    }

    pub fn prev(&self) -> Self {
        cycle(&Self::ALL, *self, Self::ALL.len() - 1)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Format {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_choice(s);
        Self::ALL
            .into_iter()
            .find(|format| format.prompt_word() == wanted)
            .ok_or_else(|| unknown_choice("format", s, Self::ALL.iter().map(Format::label)))
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, step: usize) -> T {
    let idx = all.iter().position(|v| *v == current).unwrap_or(0);
    all[(idx + step) % all.len()]
}

/// Lowercase, treat `-`/`_` as spaces and collapse runs of whitespace.
fn normalize_choice(s: &str) -> String {
    s.replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn unknown_choice<'a>(
    field: &str,
    given: &str,
    accepted: impl Iterator<Item = &'a str>,
) -> GenerateError {
    GenerateError::InvalidInput(format!(
        "Unknown {} '{}'. Choose one of: {}",
        field,
        given.trim(),
        accepted.collect::<Vec<_>>().join(", ")
    ))
}

/// Everything the user supplied for one generate action.
///
/// Built through [`GenerationRequest::new`], which rejects an empty topic and
/// normalizes blank optional fields to absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    topic: String,
    tone: Tone,
    format: Format,
    personal_context: Option<String>,
    content_context: Option<String>,
    reference_examples: Vec<String>,
}

impl GenerationRequest {
    pub fn new(topic: &str, tone: Tone, format: Format) -> Result<Self, GenerateError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(GenerateError::InvalidInput(
                "Please enter a topic.".to_string(),
            ));
        }

        Ok(Self {
            topic: topic.to_string(),
            tone,
            format,
            personal_context: None,
            content_context: None,
            reference_examples: Vec::new(),
        })
    }

    /// Who is writing: voice, brand, recurring quirks.
    pub fn with_personal_context(mut self, context: Option<&str>) -> Self {
        self.personal_context = non_blank(context);
        self
    }

    /// What this particular piece is for.
    pub fn with_content_context(mut self, context: Option<&str>) -> Self {
        self.content_context = non_blank(context);
        self
    }

    pub fn with_reference_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reference_examples = examples
            .into_iter()
            .map(Into::into)
            .filter(|text: &String| !text.trim().is_empty())
            .collect();
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn personal_context(&self) -> Option<&str> {
        self.personal_context.as_deref()
    }

    pub fn content_context(&self) -> Option<&str> {
        self.content_context.as_deref()
    }

    pub fn reference_examples(&self) -> &[String] {
        &self.reference_examples
    }

    pub fn assemble(&self) -> AssembledPrompt {
        assemble_prompt(self)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// System/user message pair ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub system_message: String,
    pub user_message: String,
}

pub fn assemble_prompt(request: &GenerationRequest) -> AssembledPrompt {
    AssembledPrompt {
        system_message: build_system_message(request),
        user_message: build_user_message(request),
    }
}

fn build_user_message(request: &GenerationRequest) -> String {
    let tone = request.tone.prompt_word();
    format!(
        "Write {} {} {} about {}.",
        indefinite_article(tone),
        tone,
        request.format.prompt_word(),
        request.topic
    )
}

fn indefinite_article(word: &str) -> &'static str {
    match word.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

fn build_system_message(request: &GenerationRequest) -> String {
    let mut sections = vec![PERSONA.to_string()];

    if let Some(personal) = &request.personal_context {
        sections.push(format!("Personal style and brand context:\n{}", personal));
    }

    if let Some(content) = &request.content_context {
        sections.push(format!("Context for this piece:\n{}", content));
    }

    if !request.reference_examples.is_empty() {
        let mut block = String::from("Reference examples of the author's writing:");
        for (i, example) in request.reference_examples.iter().enumerate() {
            block.push_str(&format!(
                "\n\nExample {}:\n{}",
                i + 1,
                excerpt(example.trim(), EXAMPLE_EXCERPT_CHARS)
            ));
        }
        sections.push(block);
    }

    let mut guidelines = String::from(
        "Guidelines:\n\
         - Keep the writing conversational.\n\
         - Do not use emojis.\n\
         - Sound authentic, never generic.",
    );
    if !request.reference_examples.is_empty() {
        guidelines.push_str("\n- Match the voice and rhythm of the reference examples.");
    }
    sections.push(guidelines);

    sections.join("\n\n")
}

/// First `max_chars` characters of `text`, never splitting a code point.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
