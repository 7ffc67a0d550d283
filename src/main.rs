mod config;
mod error;
mod models;
mod services;
mod utils;

use axum::{
    Router,
    extract::{Json, State},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, fmt};

use config::Config;
use error::TranslateError;
use models::{
    ChunkPart, JobStatus, Language, PartReport, SUPPORTED_MODELS, TranslateRequest,
    TranslateResponse, TranslationJob, TranslationOutcome,
};
use services::llm::LlmClient;
use services::translator::{ChunkTranslator, ProgressUpdate};

#[derive(Clone)]
struct AppState {
    llm_client: Arc<LlmClient>,
    config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    // A missing API key aborts here, before anything is served.
    let config = Arc::new(Config::from_env()?);
    let llm_client = Arc::new(LlmClient::new(&config));

    let app_state = AppState {
        llm_client,
        config: config.clone(),
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/translate", post(translate))
        .route("/translate/file", post(translate_file))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::AllowMethods::any())
                .allow_headers(tower_http::cors::AllowHeaders::any()),
        );

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index() -> Html<String> {
    let languages = Language::ALL
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let models = SUPPORTED_MODELS.join(", ");

    Html(format!(
        r#"
    <!DOCTYPE html>
    <html>
    <head>
        <title>GenAI Translator Service</title>
        <meta charset="utf-8">
        <style>
            body {{ font-family: Arial, sans-serif; margin: 40px; }}
            .endpoint {{ background-color: #f5f5f5; padding: 10px; margin: 10px 0; border-radius: 4px; font-family: monospace; }}
        </style>
    </head>
    <body>
        <h1>GenAI Translator Service</h1>

        <p>Translates long texts by splitting them into chunks at paragraph and
        sentence boundaries and translating each chunk with position-aware
        instructions through OpenRouter.</p>

        <h2>Available Endpoints:</h2>
        <div class="endpoint">GET / - This information page</div>
        <div class="endpoint">GET /health - Health check</div>
        <div class="endpoint">POST /translate - Translate a JSON body, returns JSON</div>
        <div class="endpoint">POST /translate/file - Same body, returns a downloadable .txt</div>

        <h2>Request Body:</h2>
        <div class="endpoint">{{ "text": "...", "source_lang": "English", "target_lang": "German", "model": "...", "max_chunk_size": 1500 }}</div>

        <p>Languages: {languages}</p>
        <p>Models: {models}</p>
    </body>
    </html>
    "#
    ))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn translate(
    State(state): State<AppState>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, TranslateError> {
    let job = job_from_request(request);
    let file_name = utils::download_file_name(job.source, job.target);

    let outcome = run_job(&state, &job).await?;

    Ok(Json(TranslateResponse {
        status: outcome.status,
        translated_text: display_text(&outcome),
        parts: PartReport::from_parts(&outcome.parts),
        file_name,
    }))
}

async fn translate_file(
    State(state): State<AppState>,
    Json(request): Json<TranslateRequest>,
) -> Result<Response, TranslateError> {
    let job = job_from_request(request);
    let file_name = utils::download_file_name(job.source, job.target);

    let outcome = run_job(&state, &job).await?;

    let headers = [
        (
            http::header::CONTENT_TYPE,
            "text/plain; charset=utf-8".to_string(),
        ),
        (
            http::header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ),
    ];
    Ok((headers, display_text(&outcome)).into_response())
}

fn job_from_request(request: TranslateRequest) -> TranslationJob {
    TranslationJob {
        text: utils::strip_bom(&request.text).to_string(),
        source: request.source_lang,
        target: request.target_lang,
        model: request.model,
        max_chunk_size: request.max_chunk_size,
    }
}

async fn run_job(state: &AppState, job: &TranslationJob) -> error::Result<TranslationOutcome> {
    let mut translator = ChunkTranslator::new(
        state.llm_client.clone(),
        state.config.request_interval,
    );

    // This service's presentation collaborator is the log.
    let mut sink = |update: ProgressUpdate| match update {
        ProgressUpdate::PartStarted { current, total } => {
            tracing::info!(current, total, "Translating part {current} of {total}");
        }
        ProgressUpdate::PartDone { .. } => {
            tracing::info!(progress = update.fraction(), "Part done");
        }
    };

    translator.translate(job, &mut sink).await
}

/// Rendering policy for failed chunks: a visible placeholder in the output,
/// while the structured per-part report carries the actual error.
fn display_text(outcome: &TranslationOutcome) -> String {
    if outcome.status == JobStatus::Complete {
        return outcome.combined_text();
    }

    outcome
        .parts
        .iter()
        .enumerate()
        .map(|(i, part)| match part {
            ChunkPart::Translated { text } => text.clone(),
            ChunkPart::Failed { .. } => format!("[part {} could not be translated]", i + 1),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
