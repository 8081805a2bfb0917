//! HTTP API server: axum router and request handlers.
//!
//! The server runs on the tokio async runtime while the render thread
//! runs on a plain `std::thread`. Communication is via `std::sync::mpsc`.
//! Handlers validate input and forward a `RenderCommand`; they never touch
//! the panel.
//!
//! ## Rust concepts
//! - `async fn` and `.await` for non-blocking I/O
//! - axum extractors: `State`, `Json`
//! - `Arc` for sharing state across async tasks
//! - `tower-http` middleware for CORS and request tracing

use crate::render::{DisplayStatus, RenderCommand};
use crate::scheduler::DisplayMode;
use crate::settings::MIN_BRIGHTNESS;
use crate::views::WeatherReport;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use serde::Deserialize;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

type ApiResult = Result<StatusCode, (StatusCode, String)>;

// ── App State ────────────────────────────────────────────────────────

/// Shared application state, passed to every handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Channel to send commands to the render thread
    pub command_tx: Sender<RenderCommand>,
    /// Shared display status (render thread writes, handlers read)
    pub status: Arc<Mutex<DisplayStatus>>,
}

// ── OpenAPI Documentation ────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(
        get_status,
        post_mode,
        post_next_mode,
        post_brightness,
        post_weather,
        post_signal,
    ),
    components(schemas(
        DisplayStatus,
        DisplayMode,
        WeatherReport,
        ModeRequest,
        BrightnessRequest,
        SignalRequest,
    )),
    tags(
        (name = "display", description = "Display control endpoints"),
        (name = "data", description = "Data pushed to the static faces"),
        (name = "system", description = "System status endpoints"),
    ),
    info(
        title = "LED Clock API",
        version = env!("CARGO_PKG_VERSION"),
        description = "HTTP API for a 16x16 monochrome LED clock"
    )
)]
pub struct ApiDoc;

// ── Request types ────────────────────────────────────────────────────

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ModeRequest {
    /// Display mode to switch to
    #[schema(example = "life")]
    mode: DisplayMode,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct BrightnessRequest {
    /// Brightness level (10-255)
    #[schema(example = 128, minimum = 10, maximum = 255)]
    value: u16,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SignalRequest {
    /// RSSI in dBm. Omit or send null when disconnected.
    #[serde(default)]
    #[schema(example = -62)]
    dbm: Option<i32>,
}

// ── Router ───────────────────────────────────────────────────────────

/// Build the axum router with all API endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
                .config(utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).validator_url("none")),
        )
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/mode", post(post_mode))
        .route("/api/v1/mode/next", post(post_next_mode))
        .route("/api/v1/brightness", post(post_brightness))
        .route("/api/v1/weather", post(post_weather))
        .route("/api/v1/signal", post(post_signal))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn send(state: &AppState, cmd: RenderCommand) -> ApiResult {
    state.command_tx.send(cmd).map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Render thread gone".to_string(),
        )
    })?;
    Ok(StatusCode::OK)
}

// ── Handlers ─────────────────────────────────────────────────────────

/// GET /api/v1/status: return current display state
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "system",
    responses(
        (status = 200, description = "Current display status", body = DisplayStatus)
    )
)]
async fn get_status(State(state): State<AppState>) -> Json<DisplayStatus> {
    let status = state
        .status
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    Json(status)
}

/// POST /api/v1/mode: switch to a display mode
#[utoipa::path(
    post,
    path = "/api/v1/mode",
    tag = "display",
    request_body = ModeRequest,
    responses(
        (status = 200, description = "Mode change queued"),
        (status = 422, description = "Unknown mode")
    )
)]
async fn post_mode(State(state): State<AppState>, Json(req): Json<ModeRequest>) -> ApiResult {
    send(&state, RenderCommand::SetMode(req.mode))
}

/// POST /api/v1/mode/next: advance to the next mode, like the button
#[utoipa::path(
    post,
    path = "/api/v1/mode/next",
    tag = "display",
    responses(
        (status = 200, description = "Mode change queued"),
    )
)]
async fn post_next_mode(State(state): State<AppState>) -> ApiResult {
    send(&state, RenderCommand::NextMode)
}

/// POST /api/v1/brightness: set display brightness (10-255)
#[utoipa::path(
    post,
    path = "/api/v1/brightness",
    tag = "display",
    request_body = BrightnessRequest,
    responses(
        (status = 200, description = "Brightness updated"),
        (status = 400, description = "Brightness out of range")
    )
)]
async fn post_brightness(State(state): State<AppState>, Json(req): Json<BrightnessRequest>) -> ApiResult {
    let value = u8::try_from(req.value)
        .ok()
        .filter(|v| *v >= MIN_BRIGHTNESS)
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("Brightness must be between {} and 255, got {}", MIN_BRIGHTNESS, req.value),
            )
        })?;
    send(&state, RenderCommand::SetBrightness(value))
}

/// POST /api/v1/weather: push the latest weather reading
#[utoipa::path(
    post,
    path = "/api/v1/weather",
    tag = "data",
    request_body = WeatherReport,
    responses(
        (status = 200, description = "Weather stored"),
        (status = 400, description = "Temperature is not a number")
    )
)]
async fn post_weather(State(state): State<AppState>, Json(report): Json<WeatherReport>) -> ApiResult {
    if !report.temperature.is_finite() {
        return Err((StatusCode::BAD_REQUEST, "Temperature must be finite".to_string()));
    }
    send(&state, RenderCommand::SetWeather(report))
}

/// POST /api/v1/signal: push the current Wi-Fi signal strength
#[utoipa::path(
    post,
    path = "/api/v1/signal",
    tag = "data",
    request_body = SignalRequest,
    responses(
        (status = 200, description = "Signal stored"),
    )
)]
async fn post_signal(State(state): State<AppState>, Json(req): Json<SignalRequest>) -> ApiResult {
    send(&state, RenderCommand::SetSignal(req.dbm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::mpsc::{self, Receiver};

    fn app() -> (AppState, Receiver<RenderCommand>) {
        let (command_tx, rx) = mpsc::channel();
        let status = Arc::new(Mutex::new(DisplayStatus::new(&Settings::default())));
        (AppState { command_tx, status }, rx)
    }

    #[tokio::test]
    async fn status_reflects_shared_snapshot() {
        let (state, _rx) = app();
        state.status.lock().unwrap().mode = DisplayMode::Pong;
        let Json(status) = get_status(State(state)).await;
        assert_eq!(status.mode, DisplayMode::Pong);
        assert_eq!(status.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn mode_is_forwarded() {
        let (state, rx) = app();
        let result = post_mode(
            State(state),
            Json(ModeRequest {
                mode: DisplayMode::Rain,
            }),
        )
        .await;
        assert_eq!(result, Ok(StatusCode::OK));
        assert_eq!(rx.try_recv().unwrap(), RenderCommand::SetMode(DisplayMode::Rain));
    }

    #[tokio::test]
    async fn next_mode_is_forwarded() {
        let (state, rx) = app();
        assert_eq!(post_next_mode(State(state)).await, Ok(StatusCode::OK));
        assert_eq!(rx.try_recv().unwrap(), RenderCommand::NextMode);
    }

    #[rstest]
    #[case(10, true)]
    #[case(255, true)]
    #[case(9, false)]
    #[case(0, false)]
    #[case(256, false)]
    #[tokio::test]
    async fn brightness_is_range_checked(#[case] value: u16, #[case] accepted: bool) {
        let (state, rx) = app();
        let result = post_brightness(State(state), Json(BrightnessRequest { value })).await;
        if accepted {
            assert_eq!(result, Ok(StatusCode::OK));
            assert_eq!(rx.try_recv().unwrap(), RenderCommand::SetBrightness(value as u8));
        } else {
            assert_eq!(result.unwrap_err().0, StatusCode::BAD_REQUEST);
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn weather_must_be_finite() {
        let (state, rx) = app();
        let bad = WeatherReport {
            temperature: f32::NAN,
            condition: "Rain".into(),
        };
        let result = post_weather(State(state.clone()), Json(bad)).await;
        assert_eq!(result.unwrap_err().0, StatusCode::BAD_REQUEST);

        let good = WeatherReport {
            temperature: -4.5,
            condition: "Snow".into(),
        };
        assert_eq!(post_weather(State(state), Json(good.clone())).await, Ok(StatusCode::OK));
        assert_eq!(rx.try_recv().unwrap(), RenderCommand::SetWeather(good));
    }

    #[tokio::test]
    async fn signal_accepts_missing_reading() {
        let (state, rx) = app();
        let req: SignalRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(post_signal(State(state), Json(req)).await, Ok(StatusCode::OK));
        assert_eq!(rx.try_recv().unwrap(), RenderCommand::SetSignal(None));
    }

    #[tokio::test]
    async fn dead_render_thread_is_a_server_error() {
        let (state, rx) = app();
        drop(rx);
        let result = post_next_mode(State(state)).await;
        assert_eq!(result.unwrap_err().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for path in [
            "/api/v1/status",
            "/api/v1/mode",
            "/api/v1/mode/next",
            "/api/v1/brightness",
            "/api/v1/weather",
            "/api/v1/signal",
        ] {
            assert!(paths.iter().any(|p| p == path), "missing {path}");
        }
    }
}
