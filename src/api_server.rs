// Axum API server: observation CRUD, map pins, leaderboard, and QnA.
//
// JSON-only surface; the map SDK, submission form, and chat UI are external
// clients of these endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};

use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use moka::future::Cache;

use rustc_hash::FxHashSet;

use std::sync::Arc;
use std::time::Duration;

use crate::geo::simulated_coords;
use crate::llm::LlmClient;
use crate::model::{NewObservation, Observation};
use crate::qna;
use crate::store::{ObservationStore, StoreError};

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObservationStore>,
    pub llm: Arc<LlmClient>,
    pub cache: Cache<String, serde_json::Value>,
}

impl AppState {
    pub fn new(store: Arc<dyn ObservationStore>, llm: Arc<LlmClient>) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(300)) // 5 min TTL
            .build();

        Self { store, llm, cache }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Observation endpoints
        .route(
            "/api/observations",
            post(create_observation).get(list_observations),
        )
        .route("/api/observations/species", get(list_species))
        // Map pins (simulated coordinates per observation)
        .route("/api/map/pins", get(map_pins))
        // Leaderboard
        .route("/api/observers/top", get(top_observers))
        // Chat and species suggestion
        .route("/api/qna", post(ask_question))
        .route("/api/species/suggest", post(suggest_species_names))
        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new()) // gzip + brotli compression
        .layer(CorsLayer::permissive()) // Allow all origins (adjust for production)
        .layer(TraceLayer::new_for_http()) // Request logging
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn create_observation(
    State(state): State<AppState>,
    Json(payload): Json<NewObservation>,
) -> Result<(StatusCode, Json<Observation>), AppError> {
    let validated = payload
        .validated()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let record = state.store.create(validated).await?;
    tracing::info!("Created observation {} at {}", record.id, record.location);

    // List, pin, species, and leaderboard caches are all stale now
    state.cache.invalidate_all();

    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, serde::Deserialize)]
struct ObservationFilters {
    /// Exact species match (case-insensitive) against the reported name or
    /// any AI suggestion.
    species: Option<String>,
    /// Case-insensitive substring of the location text.
    location: Option<String>,
}

async fn list_observations(
    State(state): State<AppState>,
    Query(filters): Query<ObservationFilters>,
) -> Result<Json<serde_json::Value>, AppError> {
    let cache_key = format!("observations:{:?}", filters);

    if let Some(cached) = state.cache.get(&cache_key).await {
        tracing::debug!("Cache hit for observation list");
        return Ok(Json(cached));
    }

    let observations = state.store.list().await?;
    let filtered: Vec<&Observation> = observations
        .iter()
        .filter(|obs| matches_filters(obs, &filters))
        .collect();

    let result = serde_json::json!({
        "rows": filtered.len(),
        "data": filtered,
    });

    state.cache.insert(cache_key, result.clone()).await;

    Ok(Json(result))
}

fn matches_filters(obs: &Observation, filters: &ObservationFilters) -> bool {
    let species_match = match filters.species.as_deref().filter(|s| !s.is_empty()) {
        None => true,
        Some(wanted) => {
            obs.species_name
                .as_deref()
                .is_some_and(|name| name.eq_ignore_ascii_case(wanted))
                || obs
                    .ai_suggested_species
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(wanted))
        }
    };

    let location_match = match filters.location.as_deref().filter(|s| !s.is_empty()) {
        None => true,
        Some(wanted) => obs
            .location
            .to_lowercase()
            .contains(&wanted.to_lowercase()),
    };

    species_match && location_match
}

/// Distinct species names across reported names and AI suggestions, sorted.
/// Feeds the list page's species filter dropdown.
async fn list_species(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let cache_key = "species:all".to_string();

    if let Some(cached) = state.cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let observations = state.store.list().await?;
    let mut species: FxHashSet<String> = FxHashSet::default();
    for obs in &observations {
        if let Some(name) = &obs.species_name {
            species.insert(name.clone());
        }
        for name in &obs.ai_suggested_species {
            species.insert(name.clone());
        }
    }

    let mut sorted: Vec<String> = species.into_iter().collect();
    sorted.sort();

    let result = serde_json::json!({
        "rows": sorted.len(),
        "data": sorted,
    });

    state.cache.insert(cache_key, result.clone()).await;

    Ok(Json(result))
}

async fn map_pins(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let cache_key = "map:pins".to_string();

    if let Some(cached) = state.cache.get(&cache_key).await {
        tracing::debug!("Cache hit for map pins");
        return Ok(Json(cached));
    }

    let observations = state.store.list().await?;
    let pins: Vec<serde_json::Value> = observations
        .iter()
        .map(|obs| {
            let coords = simulated_coords(&obs.location);
            serde_json::json!({
                "id": obs.id,
                "speciesName": obs.species_name,
                "location": obs.location,
                "latitude": coords.latitude,
                "longitude": coords.longitude,
                "dateObserved": obs.date_observed,
                "imageUrl": obs.image_url,
            })
        })
        .collect();

    let result = serde_json::json!({
        "rows": pins.len(),
        "data": pins,
    });

    state.cache.insert(cache_key, result.clone()).await;

    Ok(Json(result))
}

/// Observers with five or more sightings get the leaderboard badge.
const TOP_OBSERVER_THRESHOLD: u64 = 5;

async fn top_observers(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let cache_key = "observers:top".to_string();

    if let Some(cached) = state.cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let counts = state.store.count_by_observer().await?;
    let rows: Vec<serde_json::Value> = counts
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            serde_json::json!({
                "rank": idx + 1,
                "observerName": row.observer_name,
                "count": row.count,
                "topObserver": row.count >= TOP_OBSERVER_THRESHOLD,
            })
        })
        .collect();

    let result = serde_json::json!({
        "rows": rows.len(),
        "data": rows,
    });

    state.cache.insert(cache_key, result.clone()).await;

    Ok(Json(result))
}

#[derive(Debug, serde::Deserialize)]
struct QnARequest {
    question: String,
}

async fn ask_question(
    State(state): State<AppState>,
    Json(request): Json<QnARequest>,
) -> Result<Json<qna::QnAnswer>, AppError> {
    // Blank input is rejected here; the matcher itself is only defined over
    // non-empty questions
    if request.question.trim().is_empty() {
        return Err(AppError::Validation("Question is required.".to_string()));
    }

    let reply = qna::answer_question(&state.llm, &request.question).await;
    Ok(Json(reply))
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestSpeciesRequest {
    image_data_uri: String,
}

async fn suggest_species_names(
    State(state): State<AppState>,
    Json(request): Json<SuggestSpeciesRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !request.image_data_uri.starts_with("data:") {
        return Err(AppError::Validation(
            "imageDataUri must be a base64 data URI.".to_string(),
        ));
    }

    let names = qna::suggest_species(&state.llm, &request.image_data_uri).await;
    Ok(Json(serde_json::json!({ "speciesNames": names })))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum AppError {
    Validation(String),
    Store(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Store(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
