use serde::{Deserialize, Serialize};

use crate::error::{Result, TranslateError};

/// Models the backend is allowed to serve. Anything else is rejected before a
/// request is made.
pub const SUPPORTED_MODELS: &[&str] = &["google/gemini-2.0-flash-001", "google/gemma-3-12b-it"];

pub const MIN_CHUNK_SIZE: usize = 500;
pub const MAX_CHUNK_SIZE: usize = 4000;
pub const DEFAULT_CHUNK_SIZE: usize = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    English,
    Spanish,
    German,
    Vietnamese,
}

impl Language {
    pub const ALL: &'static [Language] = &[
        Language::English,
        Language::Spanish,
        Language::German,
        Language::Vietnamese,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::German => "German",
            Language::Vietnamese => "Vietnamese",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a chunk within the full document, used to frame the
/// translation instruction so parts stay coherent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkRole {
    Only,
    First,
    Middle,
    Last,
}

impl ChunkRole {
    pub fn of(index: usize, total: usize) -> Self {
        if total == 1 {
            ChunkRole::Only
        } else if index == 0 {
            ChunkRole::First
        } else if index == total - 1 {
            ChunkRole::Last
        } else {
            ChunkRole::Middle
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub role: ChunkRole,
    pub content: String,
}

/// One translation invocation. All fields live only for the duration of the
/// call; nothing is persisted.
#[derive(Debug, Clone)]
pub struct TranslationJob {
    pub text: String,
    pub source: Language,
    pub target: Language,
    pub model: String,
    pub max_chunk_size: usize,
}

impl TranslationJob {
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(TranslateError::EmptyInput);
        }
        if self.source == self.target {
            return Err(TranslateError::SameLanguage);
        }
        if !SUPPORTED_MODELS.contains(&self.model.as_str()) {
            return Err(TranslateError::UnsupportedModel(self.model.clone()));
        }
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.max_chunk_size) {
            return Err(TranslateError::ChunkSizeOutOfRange(self.max_chunk_size));
        }
        Ok(())
    }
}

/// Per-chunk result. A failed chunk never masquerades as translated text; the
/// presentation layer decides how to render the gap.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkPart {
    Translated { text: String },
    Failed { status: Option<u16>, message: String },
}

impl ChunkPart {
    pub fn is_translated(&self) -> bool {
        matches!(self, ChunkPart::Translated { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Complete,
    Partial,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOutcome {
    pub status: JobStatus,
    pub parts: Vec<ChunkPart>,
}

impl TranslationOutcome {
    pub fn from_parts(parts: Vec<ChunkPart>) -> Self {
        let ok = parts.iter().filter(|p| p.is_translated()).count();
        let status = if ok == parts.len() {
            JobStatus::Complete
        } else if ok > 0 {
            JobStatus::Partial
        } else {
            JobStatus::Failed
        };
        Self { status, parts }
    }

    /// Translated parts joined in document order. Failed parts are omitted;
    /// callers wanting visible gaps walk `parts` themselves.
    pub fn combined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ChunkPart::Translated { text } => Some(text.as_str()),
                ChunkPart::Failed { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub source_lang: Language,
    pub target_lang: Language,
    pub model: String,
    #[serde(default = "default_chunk_size")]
    pub max_chunk_size: usize,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub status: JobStatus,
    pub translated_text: String,
    pub parts: Vec<PartReport>,
    pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct PartReport {
    pub index: usize,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PartReport {
    pub fn from_parts(parts: &[ChunkPart]) -> Vec<PartReport> {
        parts
            .iter()
            .enumerate()
            .map(|(index, part)| match part {
                ChunkPart::Translated { .. } => PartReport {
                    index,
                    ok: true,
                    status: None,
                    error: None,
                },
                ChunkPart::Failed { status, message } => PartReport {
                    index,
                    ok: false,
                    status: *status,
                    error: Some(message.clone()),
                },
            })
            .collect()
    }
}
