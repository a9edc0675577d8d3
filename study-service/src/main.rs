mod config;
mod generator;
mod interaction_log;
mod pipeline;
mod session;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use synopsis_core::{CatalogStore, Language, PreferenceProfile, SimilarityIndex};

use config::ServiceConfig;
use generator::{OpenRouterGenerator, SynopsisGenerator};
use interaction_log::{timestamp, FinalRecord, InteractionLog, RunRecord};
use pipeline::{RecommendationPipeline, RunOutcome};
use session::{
    InMemorySessionStore, PhaseError, SessionStore, StudyPhase, StudySession,
};

#[derive(Clone)]
struct AppState {
    catalog: Arc<CatalogStore>,
    pipeline: Arc<RecommendationPipeline>,
    sessions: Arc<dyn SessionStore>,
    log: Arc<InteractionLog>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct CreateSessionRequest {
    #[serde(default)]
    language: Language,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    session_id: String,
    language: Language,
    phase: StudyPhase,
    run_count: u32,
}

impl From<&StudySession> for SessionResponse {
    fn from(session: &StudySession) -> Self {
        Self {
            session_id: session.id.clone(),
            language: session.language,
            phase: session.phase,
            run_count: session.run_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RunRequest {
    watched_title: String,
    #[serde(default)]
    tone: String,
    #[serde(default)]
    style: String,
    #[serde(default)]
    genre_preferences: Vec<String>,
    #[serde(default)]
    likes: String,
    #[serde(default)]
    avoid: String,
}

#[derive(Debug, Serialize)]
struct RunResponse {
    session_id: String,
    phase: StudyPhase,
    status: String,
    outcome: Option<RunOutcome>,
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    rating_match: u8,
    rating_engagement: u8,
    would_watch: bool,
    #[serde(default)]
    comment: String,
}

#[derive(Debug, Serialize)]
struct FeedbackResponse {
    session_id: String,
    phase: StudyPhase,
    run_count: u32,
}

#[derive(Debug, Deserialize)]
struct FinalFeedbackRequest {
    #[serde(default)]
    feedback: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn internal_error(message: &str) -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn phase_error(e: PhaseError) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

async fn health_check() -> &'static str {
    "OK"
}

async fn list_titles(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.titles().to_vec())
}

async fn list_genres(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.genre_tags())
}

async fn load_session(state: &AppState, id: &str) -> Result<StudySession, HandlerError> {
    match state.sessions.get(id).await {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("session {id} not found"),
            }),
        )),
        Err(e) => {
            error!("failed to load session: {e}");
            Err(internal_error("failed to load session"))
        }
    }
}

async fn save_session(state: &AppState, session: StudySession) -> Result<(), HandlerError> {
    state.sessions.save(session).await.map_err(|e| {
        error!("failed to save session: {e}");
        internal_error("failed to save session")
    })
}

async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<SessionResponse>, HandlerError> {
    let session_id = Uuid::new_v4().to_string();
    let session = StudySession::new(session_id.clone(), request.language);
    let response = SessionResponse::from(&session);

    save_session(&state, session).await?;
    info!(session_id = %session_id, language = ?request.language, "session created");
    Ok(Json(response))
}

async fn get_session(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, HandlerError> {
    let session = load_session(&state, &session_id).await?;
    Ok(Json(SessionResponse::from(&session)))
}

async fn give_consent(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, HandlerError> {
    let mut session = load_session(&state, &session_id).await?;
    session.give_consent().map_err(phase_error)?;
    let response = SessionResponse::from(&session);

    save_session(&state, session).await?;
    info!(session_id = %session_id, "consent given");
    Ok(Json(response))
}

async fn run_pipeline(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>, HandlerError> {
    let mut session = load_session(&state, &session_id).await?;
    // Reject before the generation call, not after.
    if session.phase != StudyPhase::AwaitingInput {
        return Err(phase_error(PhaseError::WrongPhase {
            action: "run",
            phase: session.phase,
        }));
    }

    let profile = PreferenceProfile::new(
        &request.tone,
        &request.style,
        &request.genre_preferences,
        &request.likes,
        &request.avoid,
    );
    info!(
        session_id = %session_id,
        watched_title = %request.watched_title,
        completed_runs = session.run_count,
        "starting pipeline run"
    );

    match state
        .pipeline
        .run(&request.watched_title, profile, session.language)
        .await
    {
        Some(outcome) => {
            session.attach_run(outcome.clone()).map_err(phase_error)?;
            let phase = session.phase;
            save_session(&state, session).await?;
            Ok(Json(RunResponse {
                session_id,
                phase,
                status: "ok".to_string(),
                outcome: Some(outcome),
            }))
        }
        None => {
            info!(session_id = %session_id, watched_title = %request.watched_title, "no recommendation available");
            Ok(Json(RunResponse {
                phase: session.phase,
                session_id,
                status: "no_recommendation".to_string(),
                outcome: None,
            }))
        }
    }
}

async fn submit_feedback(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, HandlerError> {
    let mut session = load_session(&state, &session_id).await?;
    let (outcome, run_number) = session.complete_run().map_err(phase_error)?;

    state.log.append(&RunRecord {
        timestamp: timestamp(),
        session_id: &session_id,
        language: session.language,
        movie_watched: &outcome.watched_title,
        user_profile: &outcome.profile,
        skipped_fields: &outcome.skipped_fields,
        watched_synopsis: &outcome.watched_synopsis,
        recommended_movie: &outcome.recommended_title,
        recommended_synopsis: &outcome.recommended_synopsis,
        personalized_synopsis: &outcome.personalized_synopsis,
        top_n_recommendations: &outcome.recommendations,
        rating_match: request.rating_match,
        rating_engagement: request.rating_engagement,
        would_watch: request.would_watch,
        user_feedback_text: &request.comment,
        run_number,
    });

    let response = FeedbackResponse {
        session_id: session_id.clone(),
        phase: session.phase,
        run_count: session.run_count,
    };
    save_session(&state, session).await?;
    info!(session_id = %session_id, run_number, "feedback recorded");
    Ok(Json(response))
}

async fn submit_final_feedback(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<FinalFeedbackRequest>,
) -> Result<Json<SessionResponse>, HandlerError> {
    let session = load_session(&state, &session_id).await?;
    session.accept_final_feedback().map_err(phase_error)?;

    state.log.append(&FinalRecord {
        timestamp: timestamp(),
        session_id: &session_id,
        final_feedback: &request.feedback,
    });

    info!(session_id = %session_id, "final feedback recorded");
    Ok(Json(SessionResponse::from(&session)))
}

/// Initialize structured tracing based on environment variables
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "study_service=debug,synopsis_core=debug,tower_http=debug".into());

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/titles", get(list_titles))
        .route("/genres", get(list_genres))
        .route("/session", post(create_session))
        .route("/session/{id}", get(get_session))
        .route("/session/{id}/consent", post(give_consent))
        .route("/session/{id}/run", post(run_pipeline))
        .route("/session/{id}/feedback", post(submit_feedback))
        .route("/session/{id}/final", post(submit_final_feedback))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting synopsis study service");

    let config = ServiceConfig::from_env()?;

    // Both stores are required; a missing or malformed source aborts startup.
    let catalog = Arc::new(CatalogStore::load(&config.catalog_path)?);
    let similarity = Arc::new(SimilarityIndex::load(&config.similarity_path)?);
    info!(
        titles = catalog.len(),
        entries = similarity.len(),
        "data sources loaded"
    );

    let generator: Arc<dyn SynopsisGenerator> = Arc::new(OpenRouterGenerator::new(
        &config.openrouter_api_key,
        &config.generation_model,
    ));
    let pipeline = Arc::new(RecommendationPipeline::new(
        catalog.clone(),
        similarity,
        generator,
    ));

    let state = AppState {
        catalog,
        pipeline,
        sessions: Arc::new(InMemorySessionStore::new()),
        log: Arc::new(InteractionLog::new(&config.interaction_log_path)),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    info!("Server running on http://0.0.0.0:3000");

    axum::serve(listener, app).await?;

    Ok(())
}
