use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use papervoice_core::VoiceError;
use papervoice_explain::{ExplainPipeline, SessionStatus};
use papervoice_logging::redact_sensitive_data;
use papervoice_speech::{NormalizeOptions, Normalizer};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Session key for requests that do not name their section.
const ANONYMOUS_SECTION: &str = "#anonymous";

/// Shared state for API handlers.
pub struct AppState {
    pub pipeline: ExplainPipeline,
    pub normalize: NormalizeOptions,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(pipeline: ExplainPipeline, normalize: NormalizeOptions) -> Self {
        Self {
            pipeline,
            normalize,
            started_at: Utc::now(),
        }
    }
}

/// Build the API router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/normalize", post(normalize))
        .route("/api/explain", post(explain))
        .route("/api/explain/text", post(explain_text))
        .route("/api/sessions/:id", get(session_status))
        .route("/api/sessions/:id/toggle", post(toggle_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the page script: any origin when the list is empty.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return base.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid allowed origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A [`VoiceError`] rendered as an HTTP status and a redacted JSON body.
#[derive(Debug)]
pub struct ApiError(VoiceError);

impl From<VoiceError> for ApiError {
    fn from(err: VoiceError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            VoiceError::EmptyInput(_) => StatusCode::BAD_REQUEST,
            VoiceError::RequestInFlight(_) => StatusCode::CONFLICT,
            VoiceError::ExplanationUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            VoiceError::Provider { .. } | VoiceError::Other(_) => StatusCode::BAD_GATEWAY,
            VoiceError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = redact_sensitive_data(&format!("{:#}", anyhow::Error::from(self.0)));
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %message, "Request rejected");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "papervoice",
        "version": env!("CARGO_PKG_VERSION"),
        "startedAt": state.started_at,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NormalizeBody {
    markdown: String,
    #[serde(default)]
    strip_citations: Option<bool>,
}

async fn normalize(State(state): State<Arc<AppState>>, Json(body): Json<NormalizeBody>) -> Json<Value> {
    let options = NormalizeOptions {
        strip_citations: body.strip_citations.unwrap_or(state.normalize.strip_citations),
        ..state.normalize
    };
    let spoken = Normalizer::new(options).normalize(&body.markdown);
    Json(json!({ "spoken": spoken, "chars": spoken.char_count() }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplainBody {
    #[serde(default)]
    section_id: Option<String>,
    section_text: String,
}

async fn explain(State(state): State<Arc<AppState>>, Json(body): Json<ExplainBody>) -> Result<Response, ApiError> {
    let key = body.section_id.as_deref().unwrap_or(ANONYMOUS_SECTION);
    let audio = state.pipeline.explain_audio(key, &body.section_text).await?;
    let mime_type = state.pipeline.format().mime_type();
    Ok(([(header::CONTENT_TYPE, mime_type)], audio).into_response())
}

async fn explain_text(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ExplainBody>,
) -> Result<Json<Value>, ApiError> {
    let explanation = state.pipeline.explain_text(&body.section_text).await?;
    Ok(Json(json!({
        "explanation": explanation.explanation,
        "spoken": explanation.spoken,
    })))
}

async fn session_status(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Json<SessionStatus> {
    Json(state.pipeline.sessions().status(&id))
}

/// Play/pause for a section whose audio is ready.
async fn toggle_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.pipeline.sessions().toggle(&id) {
        Some(playing) => Ok(Json(json!({ "playing": playing }))),
        None => Err(StatusCode::CONFLICT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use papervoice_explain::{ExplainSettings, Explainer, MockProvider};
    use papervoice_tts::MockTts;

    fn state(llm: MockProvider, tts: MockTts) -> Arc<AppState> {
        let explainer = Explainer::new(Arc::new(llm), ExplainSettings::default());
        let pipeline = ExplainPipeline::new(explainer, Arc::new(tts));
        Arc::new(AppState::new(pipeline, NormalizeOptions::default()))
    }

    fn ok_state() -> Arc<AppState> {
        state(
            MockProvider::new("mock").with_response("It adds $x+y$."),
            MockTts::new().with_audio(b"ID3audio".to_vec()),
        )
    }

    fn explain_body(id: Option<&str>, text: &str) -> Json<ExplainBody> {
        Json(ExplainBody {
            section_id: id.map(str::to_string),
            section_text: text.to_string(),
        })
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_service() {
        let Json(body) = health(State(ok_state())).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "papervoice");
        assert!(body["startedAt"].is_string());
    }

    #[tokio::test]
    async fn normalize_is_offline() {
        let Json(body) = normalize(
            State(ok_state()),
            Json(NormalizeBody {
                markdown: "Let $x^2$ grow [3].".into(),
                strip_citations: Some(true),
            }),
        )
        .await;
        assert_eq!(body["spoken"], "Let x squared grow.\n");
        assert_eq!(body["chars"], 20);
    }

    #[tokio::test]
    async fn explain_returns_audio_and_marks_session_ready() {
        let state = ok_state();
        let response = explain(State(state.clone()), explain_body(Some("S1"), "x+y"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
        let audio = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&audio[..], b"ID3audio");

        let Json(status) = session_status(State(state.clone()), Path("S1".into())).await;
        assert!(matches!(status, SessionStatus::Ready { playing: true, .. }));
        let Json(toggled) = toggle_session(State(state), Path("S1".into())).await.unwrap();
        assert_eq!(toggled["playing"], false);
    }

    #[tokio::test]
    async fn in_flight_section_is_a_conflict() {
        let state = ok_state();
        state.pipeline.sessions().begin("S1").unwrap();
        let err = explain(State(state.clone()), explain_body(Some("S1"), "x+y"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        // Other sections are unaffected.
        assert!(explain(State(state), explain_body(Some("S2"), "x+y")).await.is_ok());
    }

    #[tokio::test]
    async fn error_statuses() {
        let unavailable = state(MockProvider::new("mock").without_choices(), MockTts::new());
        let err = explain(State(unavailable), explain_body(None, "x")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let upstream = state(
            MockProvider::new("mock").with_response("ok"),
            MockTts::new().failing("speech endpoint down"),
        );
        let err = explain(State(upstream.clone()), explain_body(None, "x")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert!(matches!(
            upstream.pipeline.sessions().status(ANONYMOUS_SECTION),
            SessionStatus::Idle
        ));

        let err = explain_text(State(ok_state()), explain_body(None, "  ")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn error_body_is_redacted() {
        let failing = state(
            MockProvider::new("mock").failing("401 for key sk-abcdefghijklmnopqrstuvwx"),
            MockTts::new(),
        );
        let err = explain_text(State(failing), explain_body(None, "x")).await.unwrap_err();
        let body = body_json(err.into_response()).await;
        let message = body["error"].as_str().unwrap();
        assert!(!message.contains("abcdefghijklmnop"), "{message}");
    }

    #[tokio::test]
    async fn explain_text_returns_both_forms() {
        let Json(body) = explain_text(State(ok_state()), explain_body(None, "x+y")).await.unwrap();
        assert_eq!(body["explanation"], "It adds $x+y$.");
        assert_eq!(body["spoken"], "It adds x plus y.\n");
    }

    #[tokio::test]
    async fn toggle_without_audio_conflicts() {
        let err = toggle_session(State(ok_state()), Path("S9".into())).await.unwrap_err();
        assert_eq!(err, StatusCode::CONFLICT);
    }

    #[test]
    fn cors_accepts_origin_lists() {
        let _any = cors_layer(&[]);
        let _some = cors_layer(&["https://arxiv.org".to_string(), "bad\norigin".to_string()]);
    }
}
