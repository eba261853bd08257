//! BioScout Islamabad
//!
//! Community wildlife observation logging for the Islamabad region: submit
//! sightings, browse and filter them, place them on a map, chat about
//! biodiversity, and rank top observers.
//!
//! Layout:
//! - `geo`: deterministic simulated coordinates for location labels
//! - `knowledge`: keyword-matched canned answers (LLM fallback)
//! - `model`: observation records and submission validation
//! - `store`: persistence capability with memory and JSON-lines backends
//! - `llm` / `qna`: provider client and the QnA / species-suggestion flows
//! - `api_server`: axum routes and application state

pub mod api_server;
pub mod geo;
pub mod knowledge;
pub mod llm;
pub mod model;
pub mod qna;
pub mod store;

// Re-export commonly used types
pub use api_server::{create_router, AppState};
pub use geo::{simulated_coords, SimulatedCoords};
pub use llm::{LlmClient, LlmConfig};
pub use model::{NewObservation, Observation, ObserverCount};
pub use store::{JsonlStore, MemoryStore, ObservationStore};
