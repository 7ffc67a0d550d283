use std::time::Duration;

use tokio::time::Instant;

use crate::error::{Result, TranslateError};
use crate::models::{
    ChunkPart, ChunkRole, Language, TranslationJob, TranslationOutcome,
};
use crate::services::chunker;
use crate::services::llm::TranslationBackend;

/// Progress signal emitted while a multi-chunk job runs. Single-chunk jobs
/// are silent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressUpdate {
    /// Emitted before a chunk's request goes out. `current` is 1-based.
    PartStarted { current: usize, total: usize },
    /// Emitted after a chunk's result (success or failure) is recorded.
    PartDone { completed: usize, total: usize },
}

impl ProgressUpdate {
    pub fn fraction(&self) -> f64 {
        match self {
            ProgressUpdate::PartStarted { current, total } => (current - 1) as f64 / *total as f64,
            ProgressUpdate::PartDone { completed, total } => *completed as f64 / *total as f64,
        }
    }
}

/// Observer for progress updates. The translator never talks to a UI
/// directly; the caller supplies whatever sink it wants.
pub trait ProgressSink: Send {
    fn report(&mut self, update: ProgressUpdate);
}

impl<F: FnMut(ProgressUpdate) + Send> ProgressSink for F {
    fn report(&mut self, update: ProgressUpdate) {
        self(update);
    }
}

/// Client-side rate limiter: enforces a minimum interval between consecutive
/// backend requests, sleeping only the remainder. The first request is never
/// delayed.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    pub async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// Builds the system instruction for one chunk. Wording tracks the chunk's
/// position so the backend keeps parts of a long document coherent.
pub fn system_prompt(source: Language, target: Language, role: ChunkRole) -> String {
    let mut prompt = format!(
        "You are a professional translator. Translate the following text from {source} to {target}. "
    );

    match role {
        ChunkRole::Only => {}
        ChunkRole::First => {
            prompt.push_str("This is the BEGINNING of a longer document. ");
        }
        ChunkRole::Middle => {
            prompt.push_str(
                "This is a MIDDLE part of a longer document. Maintain coherence with previous parts. ",
            );
        }
        ChunkRole::Last => {
            prompt.push_str(
                "This is the FINAL part of a longer document. Maintain coherence with previous parts. ",
            );
        }
    }

    prompt.push_str(
        "Maintain the original formatting and translate everything completely. \
         Only provide the translation, no explanations.",
    );
    prompt
}

/// Translates a document chunk by chunk, strictly in ordinal order, one
/// request at a time.
pub struct ChunkTranslator<B> {
    backend: B,
    pacer: Pacer,
}

impl<B: TranslationBackend> ChunkTranslator<B> {
    pub fn new(backend: B, min_interval: Duration) -> Self {
        Self {
            backend,
            pacer: Pacer::new(min_interval),
        }
    }

    /// Runs one translation job. Validation failures short-circuit before
    /// any backend call; a failed chunk is recorded as a typed part and the
    /// job keeps going.
    pub async fn translate(
        &mut self,
        job: &TranslationJob,
        progress: &mut dyn ProgressSink,
    ) -> Result<TranslationOutcome> {
        job.validate()?;

        let chunks = chunker::chunk(&job.text, job.max_chunk_size);
        let total = chunks.len();

        if total == 1 {
            let prompt = system_prompt(job.source, job.target, ChunkRole::Only);
            let part = self.translate_chunk(job, &prompt, &chunks[0].content).await;
            return Ok(TranslationOutcome::from_parts(vec![part]));
        }

        tracing::info!(
            total_chunks = total,
            chars = job.text.chars().count(),
            "Text exceeds chunk size, translating in parts"
        );

        let mut parts = Vec::with_capacity(total);
        for chunk in &chunks {
            progress.report(ProgressUpdate::PartStarted {
                current: chunk.index + 1,
                total,
            });

            self.pacer.wait().await;

            let prompt = system_prompt(job.source, job.target, chunk.role);
            let part = self.translate_chunk(job, &prompt, &chunk.content).await;
            parts.push(part);

            progress.report(ProgressUpdate::PartDone {
                completed: chunk.index + 1,
                total,
            });
        }

        Ok(TranslationOutcome::from_parts(parts))
    }

    async fn translate_chunk(
        &self,
        job: &TranslationJob,
        prompt: &str,
        content: &str,
    ) -> ChunkPart {
        match self.backend.complete(&job.model, prompt, content).await {
            Ok(text) => ChunkPart::Translated { text },
            Err(e) => {
                tracing::warn!(error = %e, "Chunk translation failed, continuing");
                let status = match &e {
                    TranslateError::Backend { status, .. } => Some(*status),
                    _ => None,
                };
                ChunkPart::Failed {
                    status,
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DEFAULT_CHUNK_SIZE, JobStatus, SUPPORTED_MODELS};
    use std::sync::Mutex;

    /// Backend that replies with a canned result per call, in order, and
    /// records the system prompt it was given.
    struct ScriptedBackend {
        replies: Mutex<Vec<Result<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn echo(calls: usize) -> Self {
            Self::new((0..calls).map(|i| Ok(format!("part-{i}"))).collect())
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl TranslationBackend for ScriptedBackend {
        async fn complete(&self, _model: &str, system: &str, _user: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(system.to_string());
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn job(text: &str) -> TranslationJob {
        TranslationJob {
            text: text.to_string(),
            source: Language::English,
            target: Language::Vietnamese,
            model: SUPPORTED_MODELS[0].to_string(),
            max_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    fn translator(backend: &ScriptedBackend) -> ChunkTranslator<&ScriptedBackend> {
        ChunkTranslator::new(backend, Duration::ZERO)
    }

    fn silent() -> impl ProgressSink {
        |_: ProgressUpdate| {}
    }

    #[tokio::test]
    async fn single_chunk_translates_without_progress() {
        let backend = ScriptedBackend::new(vec![Ok("Chào thế giới.".to_string())]);
        let mut events = Vec::new();
        let mut sink = |u: ProgressUpdate| events.push(u);

        let outcome = translator(&backend)
            .translate(&job("Hello world."), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome.status, JobStatus::Complete);
        assert_eq!(outcome.combined_text(), "Chào thế giới.");
        assert!(events.is_empty(), "single-chunk jobs emit no progress");

        let prompts = backend.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(!prompts[0].contains("longer document"));
        assert!(prompts[0].contains("from English to Vietnamese"));
    }

    #[tokio::test]
    async fn two_chunk_job_reports_progress_and_roles() {
        let text = format!("{}\n\n{}", "a".repeat(1000), "b".repeat(1000));
        let backend = ScriptedBackend::echo(2);
        let mut events = Vec::new();
        let mut sink = |u: ProgressUpdate| events.push(u);

        let outcome = translator(&backend)
            .translate(&job(&text), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome.status, JobStatus::Complete);
        assert_eq!(outcome.combined_text(), "part-0\n\npart-1");

        let fractions: Vec<f64> = events
            .iter()
            .filter(|u| matches!(u, ProgressUpdate::PartDone { .. }))
            .map(|u| u.fraction())
            .collect();
        assert_eq!(fractions, vec![0.5, 1.0]);

        let started: Vec<&ProgressUpdate> = events
            .iter()
            .filter(|u| matches!(u, ProgressUpdate::PartStarted { .. }))
            .collect();
        assert_eq!(started.len(), 2);
        assert_eq!(
            *started[0],
            ProgressUpdate::PartStarted {
                current: 1,
                total: 2
            }
        );

        let prompts = backend.prompts();
        assert!(prompts[0].contains("BEGINNING"));
        assert!(prompts[1].contains("FINAL part"));
        assert!(!prompts.iter().any(|p| p.contains("MIDDLE")));
    }

    #[tokio::test]
    async fn middle_chunks_get_middle_framing() {
        let text = format!(
            "{}\n\n{}\n\n{}",
            "a".repeat(1000),
            "b".repeat(1000),
            "c".repeat(1000)
        );
        let backend = ScriptedBackend::echo(3);

        translator(&backend)
            .translate(&job(&text), &mut silent())
            .await
            .unwrap();

        let prompts = backend.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("BEGINNING"));
        assert!(prompts[1].contains("MIDDLE part"));
        assert!(prompts[2].contains("FINAL part"));
    }

    #[tokio::test]
    async fn backend_failure_mid_sequence_yields_partial_outcome() {
        let text = format!(
            "{}\n\n{}\n\n{}",
            "a".repeat(1000),
            "b".repeat(1000),
            "c".repeat(1000)
        );
        let backend = ScriptedBackend::new(vec![
            Ok("one".to_string()),
            Err(TranslateError::Backend {
                status: 401,
                body: "No auth credentials found".to_string(),
            }),
            Ok("three".to_string()),
        ]);
        let mut events = Vec::new();
        let mut sink = |u: ProgressUpdate| events.push(u);

        let outcome = translator(&backend)
            .translate(&job(&text), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome.status, JobStatus::Partial);
        assert_eq!(outcome.parts.len(), 3);
        assert!(outcome.parts[0].is_translated());
        assert!(matches!(
            &outcome.parts[1],
            ChunkPart::Failed {
                status: Some(401),
                ..
            }
        ));
        assert!(outcome.parts[2].is_translated());

        // The error never leaks into the translated text.
        assert_eq!(outcome.combined_text(), "one\n\nthree");

        // A failed chunk still advances progress; the job runs to the end.
        let last = events.last().unwrap();
        assert_eq!(last.fraction(), 1.0);
    }

    #[tokio::test]
    async fn all_chunks_failing_yields_failed_outcome() {
        let text = format!("{}\n\n{}", "a".repeat(1000), "b".repeat(1000));
        let backend = ScriptedBackend::new(vec![
            Err(TranslateError::Backend {
                status: 429,
                body: "rate limited".to_string(),
            }),
            Err(TranslateError::Backend {
                status: 429,
                body: "rate limited".to_string(),
            }),
        ]);

        let outcome = translator(&backend)
            .translate(&job(&text), &mut silent())
            .await
            .unwrap();

        assert_eq!(outcome.status, JobStatus::Failed);
        assert_eq!(outcome.combined_text(), "");
    }

    #[tokio::test]
    async fn validation_failure_never_reaches_the_backend() {
        let backend = ScriptedBackend::echo(0);
        let mut j = job("Hello world.");
        j.target = Language::English;

        let err = translator(&backend)
            .translate(&j, &mut silent())
            .await
            .unwrap_err();

        assert!(matches!(err, TranslateError::SameLanguage));
        assert!(backend.prompts().is_empty());
    }

    #[tokio::test]
    async fn pacer_spaces_out_consecutive_requests() {
        tokio::time::pause();

        let mut pacer = Pacer::new(Duration::from_millis(500));
        let start = Instant::now();

        pacer.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[test]
    fn progress_fraction_is_exact() {
        let done = ProgressUpdate::PartDone {
            completed: 4,
            total: 4,
        };
        assert_eq!(done.fraction(), 1.0);

        let started = ProgressUpdate::PartStarted {
            current: 1,
            total: 4,
        };
        assert_eq!(started.fraction(), 0.0);
    }
}
