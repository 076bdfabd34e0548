//! HTTP + Socket.IO control surface: axum router and request handlers,
//! with a `socketioxide` namespace layered on top for the same state,
//! streamed live instead of polled.
//!
//! ## Rust concepts
//! - `async fn` and `.await` for non-blocking I/O
//! - axum extractors: `State`, `Json`, `Path`
//! - `Arc` for sharing state across async tasks
//! - Serde `Deserialize` for parsing JSON request bodies
//! - `tower-http` middleware for CORS, tracing, and static files

use crate::broadcast::FrameBroadcaster;
use crate::effects::EffectId;
use crate::errors::EngineError;
use crate::layout::{Layout, LayoutDescriptor};
use crate::params::{ParamKind, ParamSpec, ParamValue, ParamValues};
use crate::persistence::{self, ConfigBlob};
use crate::preset::Preset;
use crate::state::{GlobalState, PowerState, RenderStatus};
use axum::Router;
use axum::extract::{Path as AxPath, State};
use axum::response::Json;
use axum::routing::{delete, get, post};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use socketioxide::SocketIo;
use socketioxide::extract::SocketRef;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Everything `create_router` needs before it can stand up the Socket.IO
/// layer and the shared application state together.
pub struct AppStateInit {
    pub state: Arc<Mutex<GlobalState>>,
    pub render_status: Arc<Mutex<RenderStatus>>,
    pub layout: Arc<dyn Layout>,
    pub broadcaster: FrameBroadcaster,
    pub config_path: PathBuf,
}

#[derive(Clone)]
pub struct AppState {
    pub state: Arc<Mutex<GlobalState>>,
    pub render_status: Arc<Mutex<RenderStatus>>,
    pub layout: Arc<dyn Layout>,
    pub broadcaster: FrameBroadcaster,
    pub config_path: PathBuf,
    pub io: SocketIo,
    /// Connected Socket.IO client count, maintained by connect/disconnect
    /// hooks rather than queried per-frame — the frame relay checks this
    /// to skip serialization entirely when nobody is listening (spec.md
    /// §4.6's "zero cost in the no-viewer case").
    pub viewer_count: Arc<AtomicUsize>,
}

impl AppState {
    /// Persist the full config blob after every mutating request.
    /// Best-effort: a persistence failure is logged and surfaced as a 500
    /// to the mutating request, but never corrupts in-memory state.
    fn persist(&self) -> Result<(), EngineError> {
        let blob = {
            let guard = self.state.lock().unwrap();
            ConfigBlob {
                current_effect: Some(guard.effect),
                parameters_by_effect: guard.params_map(),
                brightness: Some(guard.brightness),
                power_state: Some(guard.power_state),
                active_preset_id: guard.active_preset_id,
                presets: guard.presets.clone(),
            }
        };
        persistence::save(&self.config_path, &blob).inspect_err(|e| {
            tracing::error!("Failed to persist config: {}", e);
        })
    }

    fn broadcast_effects(&self) {
        let _ = self.io.emit("effects_update", &effects_response(self));
    }

    fn broadcast_state(&self) {
        let _ = self.io.emit("state_update", &state_response(self));
    }

    fn broadcast_presets(&self) {
        let guard = self.state.lock().unwrap();
        let presets: Vec<Preset> = guard.presets.list().into_iter().cloned().collect();
        drop(guard);
        let _ = self.io.emit("presets_update", &presets);
    }
}

// ── OpenAPI documentation ────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(
        get_effects,
        post_effects,
        get_state,
        post_state,
        get_presets,
        post_presets,
        delete_preset,
        post_presets_apply,
        get_config,
    ),
    components(schemas(
        EffectsResponse,
        StateResponse,
        StateUpdateRequest,
        PostEffectsRequest,
        crate::preset::Preset,
        SavePresetRequest,
        ApplyPresetRequest,
    )),
    tags(
        (name = "effects", description = "Effect catalog"),
        (name = "state", description = "Live engine state"),
        (name = "presets", description = "Saved presets"),
        (name = "config", description = "Layout / geometry"),
    ),
    info(
        title = "LED Scales API",
        version = env!("CARGO_PKG_VERSION"),
        description = "HTTP + Socket.IO control surface for an addressable RGBW LED array"
    )
)]
pub struct ApiDoc;

// ── Wire types ───────────────────────────────────────────────────────

/// One parameter as reported by `GET /effects`: the declared shape plus
/// the value currently stored for that effect (spec.md §4.5: "parameter
/// 'value' fields reflect the live values").
#[derive(Serialize, utoipa::ToSchema)]
struct ParamWithValue {
    name: String,
    label: String,
    #[schema(value_type = Object)]
    kind: ParamKind,
    #[schema(value_type = Object)]
    value: ParamValue,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EffectsResponse {
    effect_parameters: HashMap<String, Vec<ParamWithValue>>,
    effect_names: HashMap<String, String>,
    current_effect: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct PostEffectsRequest {
    effect_name: Option<String>,
    #[serde(default)]
    parameters: HashMap<String, ParamValue>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StateResponse {
    power_state: PowerState,
    target_power_state: PowerState,
    brightness: f64,
    active_preset_id: Option<u64>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct StateUpdateRequest {
    /// `true` = on, `false` = off — matches the literal scenarios in
    /// spec.md §8 (`{"power_state": false}`), distinct from the *response*
    /// shape which reports the settled `PowerState` enum as a string.
    power_state: Option<bool>,
    brightness: Option<f64>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SavePresetRequest {
    id: Option<u64>,
    name: Option<String>,
    #[serde(rename = "effect_class", default)]
    effect_class: Option<String>,
    brightness: Option<f64>,
    #[serde(default)]
    parameters: HashMap<String, ParamValue>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ApplyPresetRequest {
    id: Option<u64>,
    effect: String,
    brightness: Option<f64>,
    #[serde(default)]
    parameters: HashMap<String, ParamValue>,
}

fn state_response(app: &AppState) -> StateResponse {
    let guard = app.state.lock().unwrap();
    StateResponse {
        power_state: guard.power_state,
        target_power_state: guard.target_power_state,
        brightness: guard.brightness,
        active_preset_id: guard.active_preset_id,
    }
}

fn effects_response(app: &AppState) -> EffectsResponse {
    let guard = app.state.lock().unwrap();
    let mut effect_parameters = HashMap::new();
    let mut effect_names = HashMap::new();
    for id in EffectId::ALL {
        let instance = id.instance();
        let values = guard.materialized_params(id);
        let params = instance
            .param_spec()
            .into_iter()
            .map(|spec| {
                let value = values.get(&spec.name).cloned().unwrap_or_else(|| spec.default_value());
                ParamWithValue {
                    name: spec.name.clone(),
                    label: spec.label.clone(),
                    kind: spec.kind,
                    value,
                }
            })
            .collect();
        effect_parameters.insert(id.class_name().to_string(), params);
        effect_names.insert(id.class_name().to_string(), instance.display_name().to_string());
    }
    EffectsResponse {
        effect_parameters,
        effect_names,
        current_effect: guard.effect.class_name().to_string(),
    }
}

fn success(ok: bool) -> Json<Value> {
    Json(json!({ "success": ok }))
}

// ── Router ───────────────────────────────────────────────────────────

pub fn create_router(app_state: AppState, static_dir: Option<PathBuf>, io_layer: socketioxide::layer::SocketIoLayer) -> Router {
    let router = Router::new()
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
                .config(utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).validator_url("none")),
        )
        .route("/effects", get(get_effects).post(post_effects))
        .route("/state", get(get_state).post(post_state))
        .route("/presets", get(get_presets).post(post_presets))
        .route("/presets/apply", post(post_presets_apply))
        .route("/presets/{id}", delete(delete_preset))
        .route("/config", get(get_config));

    let router = if let Some(dir) = static_dir {
        router.fallback_service(ServeDir::new(dir))
    } else {
        router
    };

    router
        .layer(io_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Wire up the Socket.IO namespace: on connect, push the three summary
/// events spec.md §6 requires, and track connect/disconnect for the
/// viewer-count gate the frame relay uses.
pub fn register_socket_handlers(app_state: &AppState) {
    let viewer_count = app_state.viewer_count.clone();
    let app_for_socket = app_state.clone();
    app_state.io.ns("/", move |socket: SocketRef| {
        viewer_count.fetch_add(1, Ordering::SeqCst);
        tracing::info!("Socket.IO client connected: {}", socket.id);

        let _ = socket.emit("effects_update", &effects_response(&app_for_socket));
        let _ = socket.emit("state_update", &state_response(&app_for_socket));
        let presets: Vec<Preset> = app_for_socket
            .state
            .lock()
            .unwrap()
            .presets
            .list()
            .into_iter()
            .cloned()
            .collect();
        let _ = socket.emit("presets_update", &presets);

        let viewer_count = viewer_count.clone();
        socket.on_disconnect(move |_: SocketRef| {
            viewer_count.fetch_sub(1, Ordering::SeqCst);
        });
    });

    spawn_frame_relay(app_state.clone());
}

/// Rate cap applied to `led_update` emission, independent of render rate.
const VIEWER_FRAME_MIN_INTERVAL: Duration = Duration::from_millis(33);

/// Whether the frame relay should serialize and emit a frame right now.
/// Pulled out of [`spawn_frame_relay`] as a pure function so the
/// zero-viewer-skip and rate-cap rules are each directly testable without
/// a running Socket.IO server (spec.md §8 scenario 5).
fn should_relay_frame(viewer_count: usize, now: Instant, last_sent: Instant) -> bool {
    viewer_count > 0 && now.duration_since(last_sent) >= VIEWER_FRAME_MIN_INTERVAL
}

/// Relay published frames to connected Socket.IO clients as `led_update`
/// events, rate-capped at ~30 Hz. Skips serialization and sending entirely
/// when no viewer is connected — the render loop publishes unconditionally
/// and this task is the only place that cost can be avoided.
fn spawn_frame_relay(app: AppState) {
    let mut rx = app.broadcaster.subscribe();
    tokio::spawn(async move {
        let mut last_sent = Instant::now() - VIEWER_FRAME_MIN_INTERVAL;
        while rx.changed().await.is_ok() {
            let viewer_count = app.viewer_count.load(Ordering::SeqCst);
            let now = Instant::now();
            if !should_relay_frame(viewer_count, now, last_sent) {
                continue;
            }
            last_sent = now;
            let frame = rx.borrow_and_update().clone();
            let pixels: Vec<[u8; 4]> = frame.pixels.iter().map(|p| [p.r, p.g, p.b, p.w]).collect();
            let _ = app.io.emit(
                "led_update",
                &json!({ "leds": pixels.iter().map(|p| json!({"r": p[0], "g": p[1], "b": p[2], "w": p[3]})).collect::<Vec<_>>() }),
            );
        }
    });
}

// ── Handlers ─────────────────────────────────────────────────────────

/// GET /effects — the closed catalog of effect classes, their declared
/// parameters (with live values), and the currently active one.
#[utoipa::path(
    get,
    path = "/effects",
    tag = "effects",
    responses((status = 200, description = "Effect catalog", body = EffectsResponse))
)]
async fn get_effects(State(app): State<AppState>) -> Json<EffectsResponse> {
    Json(effects_response(&app))
}

/// POST /effects — switch the active effect and/or overlay parameter
/// values. Clears `active_preset_id`. Unknown parameter names are ignored.
/// Rejects a hex-only effect on a scale layout with 400.
#[utoipa::path(
    post,
    path = "/effects",
    tag = "effects",
    request_body = PostEffectsRequest,
    responses(
        (status = 200, description = "Effect updated"),
        (status = 400, description = "effect_name missing, or effect unsuitable for this layout"),
        (status = 404, description = "Unknown effect")
    )
)]
async fn post_effects(
    State(app): State<AppState>,
    Json(req): Json<PostEffectsRequest>,
) -> Result<Json<Value>, EngineError> {
    let name = req
        .effect_name
        .ok_or_else(|| EngineError::Client("effect_name is required".to_string()))?;
    let id = EffectId::by_name(&name).ok_or_else(|| EngineError::NotFound(format!("unknown effect: {name}")))?;

    if id.instance().requires_hex() && !app.layout.is_hex() {
        return Err(EngineError::State(format!(
            "effect {name} requires a hex layout, but this server is running a scale layout"
        )));
    }

    {
        let mut guard = app.state.lock().unwrap();
        guard.set_effect(id);
        for (name, value) in req.parameters {
            guard.set_param(&name, value);
        }
    }

    app.persist()?;
    app.broadcast_effects();
    app.broadcast_state();
    Ok(success(true))
}

/// GET /state — power state, target power state, brightness, and the
/// active preset id (if any).
#[utoipa::path(
    get,
    path = "/state",
    tag = "state",
    responses((status = 200, description = "Current engine state", body = StateResponse))
)]
async fn get_state(State(app): State<AppState>) -> Json<StateResponse> {
    Json(state_response(&app))
}

/// POST /state — apply a partial update to brightness and/or power.
/// Brightness is clamped to `[0, 1]`, not rejected; setting either field
/// clears `active_preset_id`. Returns the resulting state.
#[utoipa::path(
    post,
    path = "/state",
    tag = "state",
    request_body = StateUpdateRequest,
    responses((status = 200, description = "Updated state", body = StateResponse))
)]
async fn post_state(
    State(app): State<AppState>,
    Json(req): Json<StateUpdateRequest>,
) -> Result<Json<StateResponse>, EngineError> {
    {
        let mut guard = app.state.lock().unwrap();
        if let Some(brightness) = req.brightness {
            guard.set_brightness(brightness);
        }
        if let Some(on) = req.power_state {
            let target = if on { PowerState::On } else { PowerState::Off };
            guard.set_power(target, Instant::now());
        }
    }

    app.persist()?;
    app.broadcast_state();
    Ok(Json(state_response(&app)))
}

/// GET /presets — list saved presets.
#[utoipa::path(
    get,
    path = "/presets",
    tag = "presets",
    responses((status = 200, description = "Saved presets", body = Vec<crate::preset::Preset>))
)]
async fn get_presets(State(app): State<AppState>) -> Json<Vec<Preset>> {
    let guard = app.state.lock().unwrap();
    Json(guard.presets.list().into_iter().cloned().collect())
}

/// POST /presets — save a preset. With an `id` that already names a
/// preset, updates it in place; with no `id`, creates a new one. Fields
/// omitted from the body (`effect_class`, `brightness`, `parameters`) fall
/// back to the live engine state at the time of the call.
#[utoipa::path(
    post,
    path = "/presets",
    tag = "presets",
    request_body = SavePresetRequest,
    responses(
        (status = 200, description = "Preset saved", body = crate::preset::Preset),
        (status = 400, description = "Unknown effect_class")
    )
)]
async fn post_presets(
    State(app): State<AppState>,
    Json(req): Json<SavePresetRequest>,
) -> Result<Json<Preset>, EngineError> {
    let preset = {
        let mut guard = app.state.lock().unwrap();

        let effect = match req.effect_class {
            Some(name) => {
                EffectId::by_name(&name).ok_or_else(|| EngineError::Client(format!("unknown effect: {name}")))?
            }
            None => guard.effect,
        };

        let brightness = req.brightness.unwrap_or(guard.brightness).clamp(0.0, 1.0);

        let mut overrides = guard.materialized_params(effect);
        for (name, value) in req.parameters {
            overrides.0.insert(name, value);
        }
        let param_spec = effect.instance().param_spec();
        let parameters = ParamValues::from_spec_with_overrides(&param_spec, &overrides);

        let name = req
            .name
            .unwrap_or_else(|| effect.instance().display_name().to_string());

        guard.presets.upsert(req.id, name, effect, brightness, parameters)
    };

    app.persist()?;
    app.broadcast_presets();
    Ok(Json(preset))
}

/// DELETE /presets/{id} — remove a saved preset.
#[utoipa::path(
    delete,
    path = "/presets/{id}",
    tag = "presets",
    responses(
        (status = 200, description = "Preset deleted"),
        (status = 404, description = "No such preset")
    )
)]
async fn delete_preset(State(app): State<AppState>, AxPath(id): AxPath<u64>) -> Result<Json<Value>, EngineError> {
    let removed = {
        let mut guard = app.state.lock().unwrap();
        guard.presets.remove(id)
    };
    match removed {
        Some(_) => {
            app.persist()?;
            app.broadcast_presets();
            Ok(success(true))
        }
        None => Err(EngineError::NotFound(format!("no preset with id {id}"))),
    }
}

/// POST /presets/apply — apply an effect/brightness/parameters bundle as
/// the live state in one batch, optionally marking it as the active
/// preset. If the requested effect is unknown or unsuitable for the
/// active layout (e.g. a hex-only effect on a scale layout), falls back
/// to the default effect and reports `success: false` rather than
/// mutating into a broken state (spec.md §8).
#[utoipa::path(
    post,
    path = "/presets/apply",
    tag = "presets",
    request_body = ApplyPresetRequest,
    responses((status = 200, description = "Preset applied"))
)]
async fn post_presets_apply(State(app): State<AppState>, Json(req): Json<ApplyPresetRequest>) -> Json<Value> {
    let effect_id = EffectId::by_name(&req.effect);
    let unsuitable = match effect_id {
        Some(id) => id.instance().requires_hex() && !app.layout.is_hex(),
        None => true,
    };

    {
        let mut guard = app.state.lock().unwrap();
        if unsuitable {
            guard.set_effect(EffectId::default());
        } else {
            let id = effect_id.unwrap();
            guard.set_effect(id);
            for (name, value) in req.parameters {
                guard.set_param(&name, value);
            }
            if let Some(brightness) = req.brightness {
                guard.set_brightness(brightness);
            }
            if let Some(id) = req.id {
                guard.active_preset_id = Some(id);
            }
        }
    }

    let _ = app.persist();
    app.broadcast_effects();
    app.broadcast_state();
    success(!unsuitable)
}

/// GET /config — the active layout's geometry, for clients that need to
/// render a matching preview.
#[utoipa::path(
    get,
    path = "/config",
    tag = "config",
    responses((status = 200, description = "Layout geometry", body = Object))
)]
async fn get_config(State(app): State<AppState>) -> Json<LayoutDescriptor> {
    Json(app.layout.descriptor())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::scale::{ScaleConfig, ScaleLayout};

    fn sample_app() -> AppState {
        let layout: Arc<dyn Layout> = Arc::new(ScaleLayout::new(ScaleConfig::default()));
        let (broadcaster, _rx) = FrameBroadcaster::new();
        let (_layer, io) = SocketIo::new_layer();
        AppState {
            state: Arc::new(Mutex::new(GlobalState::new())),
            render_status: Arc::new(Mutex::new(RenderStatus::default())),
            layout,
            broadcaster,
            config_path: std::env::temp_dir().join("led-scales-test-config.json"),
            io,
            viewer_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[test]
    fn state_response_reflects_the_default_effect() {
        let app = sample_app();
        let response = state_response(&app);
        assert_eq!(response.power_state, PowerState::On);
        assert_eq!(response.brightness, 1.0);
    }

    #[test]
    fn effects_response_covers_every_effect() {
        let app = sample_app();
        let response = effects_response(&app);
        assert_eq!(response.effect_parameters.len(), EffectId::ALL.len());
        assert_eq!(response.effect_names.len(), EffectId::ALL.len());
        assert_eq!(response.current_effect, EffectId::SingleColor.class_name());
    }

    #[test]
    fn success_helper_round_trips_the_flag() {
        let Json(value) = success(false);
        assert_eq!(value, json!({ "success": false }));
    }

    /// spec.md §8 scenario 5: with zero connected viewers the relay must do
    /// no serialization work at all, regardless of how much time has
    /// passed since the last send.
    #[test]
    fn relay_skips_entirely_with_no_viewers() {
        let now = Instant::now();
        let long_ago = now - Duration::from_secs(10);
        assert!(!should_relay_frame(0, now, long_ago));
    }

    #[test]
    fn relay_sends_to_at_least_one_viewer_once_the_interval_elapses() {
        let now = Instant::now();
        let long_ago = now - Duration::from_secs(10);
        assert!(should_relay_frame(1, now, long_ago));
    }

    #[test]
    fn relay_caps_the_rate_even_with_viewers_connected() {
        let now = Instant::now();
        let just_sent = now - Duration::from_millis(5);
        assert!(!should_relay_frame(3, now, just_sent));
    }

    // ── Router-level tests, driving the real HTTP surface end to end ────

    mod http {
        use super::*;
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use std::sync::atomic::AtomicU64;
        use tower::ServiceExt;

        static NEXT_TEST_ID: AtomicU64 = AtomicU64::new(0);

        /// `persistence::save` recreates its parent directory on every
        /// call, so the config path doesn't need a `TempDir` guard kept
        /// alive for the test's duration — a unique path under the system
        /// temp dir is enough.
        fn test_app(pixel_count_layout: Arc<dyn Layout>) -> (Router, PathBuf) {
            let config_path = std::env::temp_dir().join(format!(
                "led-scales-http-test-{}-{}.json",
                std::process::id(),
                NEXT_TEST_ID.fetch_add(1, Ordering::SeqCst)
            ));

            let (broadcaster, _rx) = FrameBroadcaster::new();
            let (io_layer, io) = SocketIo::new_layer();
            let app_state = AppState {
                state: Arc::new(Mutex::new(GlobalState::new())),
                render_status: Arc::new(Mutex::new(RenderStatus::default())),
                layout: pixel_count_layout,
                broadcaster,
                config_path: config_path.clone(),
                io,
                viewer_count: Arc::new(AtomicUsize::new(0)),
            };
            (create_router(app_state, None, io_layer), config_path)
        }

        fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        }

        async fn body_json(response: axum::response::Response) -> Value {
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            serde_json::from_slice(&bytes).unwrap()
        }

        fn scale_layout() -> Arc<dyn Layout> {
            Arc::new(ScaleLayout::new(ScaleConfig::default()))
        }

        /// Scenario 1: `POST /effects` with `SingleColor` switches the
        /// active effect and is reflected by a subsequent `GET /effects`.
        #[tokio::test]
        async fn post_effects_switches_the_active_effect() {
            let (app, _path) = test_app(scale_layout());

            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/effects",
                    json!({
                        "effect_name": "SingleColor",
                        "parameters": { "color": { "r": 255, "g": 128, "b": 0 } }
                    }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let response = app.oneshot(Request::get("/effects").body(Body::empty()).unwrap()).await.unwrap();
            let body = body_json(response).await;
            assert_eq!(body["current_effect"], "SingleColor");
        }

        /// `POST /effects` with a missing `effect_name` is a 400.
        #[tokio::test]
        async fn post_effects_without_name_is_bad_request() {
            let (app, _path) = test_app(scale_layout());
            let response = app
                .oneshot(json_request("POST", "/effects", json!({})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        /// `POST /effects` with an unknown name is a 404.
        #[tokio::test]
        async fn post_effects_unknown_effect_is_not_found() {
            let (app, _path) = test_app(scale_layout());
            let response = app
                .oneshot(json_request("POST", "/effects", json!({ "effect_name": "NoSuchEffect" })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        /// `POST /effects` with a hex-only effect on a scale layout is a
        /// 400, per spec.md §7's StateError, and leaves the active effect
        /// untouched.
        #[tokio::test]
        async fn post_effects_hex_only_on_scale_layout_is_bad_request() {
            let (app, _path) = test_app(scale_layout());
            let response = app
                .clone()
                .oneshot(json_request("POST", "/effects", json!({ "effect_name": "RandomColorHex" })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);

            let response = app.oneshot(Request::get("/effects").body(Body::empty()).unwrap()).await.unwrap();
            let body = body_json(response).await;
            assert_eq!(body["current_effect"], EffectId::default().class_name());
        }

        /// Scenario 2: setting brightness clears `active_preset_id` and is
        /// clamped rather than rejected when out of range.
        #[tokio::test]
        async fn post_state_clamps_brightness_and_clears_active_preset() {
            let (app, _path) = test_app(scale_layout());

            let response = app
                .clone()
                .oneshot(json_request("POST", "/state", json!({ "brightness": 5.0 })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = body_json(response).await;
            assert_eq!(body["brightness"], 1.0);
            assert!(body["active_preset_id"].is_null());
        }

        /// Scenario 4: applying a preset sets `active_preset_id`; a later
        /// brightness change clears it again.
        #[tokio::test]
        async fn apply_preset_then_change_brightness_clears_it() {
            let (app, _path) = test_app(scale_layout());

            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/presets",
                    json!({
                        "name": "orange",
                        "effect_class": "SingleColor",
                        "brightness": 0.6,
                        "parameters": { "color": { "r": 255, "g": 128, "b": 0 } }
                    }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let preset = body_json(response).await;
            let preset_id = preset["id"].as_u64().unwrap();

            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/presets/apply",
                    json!({ "id": preset_id, "effect": "SingleColor", "brightness": 0.6 }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let applied = body_json(response).await;
            assert_eq!(applied["success"], true);

            let response = app.clone().oneshot(Request::get("/state").body(Body::empty()).unwrap()).await.unwrap();
            let state = body_json(response).await;
            assert_eq!(state["active_preset_id"], preset_id);

            let response = app
                .clone()
                .oneshot(json_request("POST", "/state", json!({ "brightness": 0.7 })))
                .await
                .unwrap();
            let state = body_json(response).await;
            assert!(state["active_preset_id"].is_null());
            assert_eq!(state["brightness"], 0.7);
        }

        /// Deleting an unknown preset id is a 404, not a silent success.
        #[tokio::test]
        async fn delete_unknown_preset_is_not_found() {
            let (app, _path) = test_app(scale_layout());
            let response = app
                .oneshot(Request::delete("/presets/999999").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        /// Applying a hex-only effect on a scale layout falls back to the
        /// default effect and reports `success: false`, per spec.md §8.
        #[tokio::test]
        async fn apply_preset_unsuitable_for_layout_falls_back() {
            let (app, _path) = test_app(scale_layout());
            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/presets/apply",
                    json!({ "effect": "RandomColorHex" }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = body_json(response).await;
            assert_eq!(body["success"], false);

            let response = app.oneshot(Request::get("/effects").body(Body::empty()).unwrap()).await.unwrap();
            let body = body_json(response).await;
            assert_eq!(body["current_effect"], EffectId::default().class_name());
        }

        /// Scenario 6: `GET /config` on a hex layout returns `type: "hex"`
        /// and a flattened `ordered_leds` permutation of `[0, N)`.
        #[tokio::test]
        async fn get_config_on_hex_layout_reports_hex_type() {
            use crate::layout::hex::{HexCell, HexLayout};
            let layout: Arc<dyn Layout> = Arc::new(HexLayout::new(vec![
                HexCell { x: 0.0, y: 0.0, ordered_leds: vec![0, 1, 2] },
                HexCell { x: 1.0, y: 0.0, ordered_leds: vec![3, 4, 5] },
            ]));
            let (app, _path) = test_app(layout);
            let response = app.oneshot(Request::get("/config").body(Body::empty()).unwrap()).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = body_json(response).await;
            assert_eq!(body["type"], "hex");
            let mut leds: Vec<u64> = body["hexagons"]
                .as_array()
                .unwrap()
                .iter()
                .flat_map(|h| h["ordered_leds"].as_array().unwrap().clone())
                .map(|v| v.as_u64().unwrap())
                .collect();
            leds.sort_unstable();
            assert_eq!(leds, vec![0, 1, 2, 3, 4, 5]);
        }

        /// Every mutation persists the config blob to disk, so a restart
        /// would pick the same state back up.
        #[tokio::test]
        async fn post_state_persists_the_config_blob() {
            let (app, path) = test_app(scale_layout());
            let response = app
                .oneshot(json_request("POST", "/state", json!({ "brightness": 0.25 })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let loaded = crate::persistence::load(&path).unwrap();
            assert_eq!(loaded.brightness, Some(0.25));
        }
    }
}
