//! The five-step map provisioning sequence, modeled as an explicit state
//! machine so every failure lands the form back in an actionable state.

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use plume_shared::MapId;

use crate::api;
use crate::route::{self, Route};

#[derive(Debug, Clone, PartialEq)]
pub enum CreationPhase {
    Idle,
    CreatingMap,
    UploadingPoints,
    UploadingCadastre,
    Processing,
    FetchingTimestamps,
    Failed(String),
}

impl CreationPhase {
    /// A run is in progress; submission is refused until it settles.
    pub fn is_busy(&self) -> bool {
        !matches!(self, CreationPhase::Idle | CreationPhase::Failed(_))
    }

    /// Progress text shown while the sequence runs.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            CreationPhase::Idle | CreationPhase::Failed(_) => None,
            CreationPhase::CreatingMap => Some("Creating map..."),
            CreationPhase::UploadingPoints => Some("Uploading point sources..."),
            CreationPhase::UploadingCadastre => Some("Uploading areal sources..."),
            CreationPhase::Processing => {
                Some("Processing the map (this can take a while, keep the page open)...")
            }
            CreationPhase::FetchingTimestamps => Some("Fetching available timestamps..."),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CreationPhase::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

pub struct CreationRequest {
    pub lbx: f64,
    pub lby: f64,
    pub point_file: web_sys::File,
    pub cadastre_file: web_sys::File,
}

/// Renderer route for a freshly provisioned map: its id plus the first
/// available timestamp. `None` when the backend produced no timestamps.
pub fn success_route(map_id: MapId, timestamps: &[String]) -> Option<Route> {
    timestamps.first().map(|timestamp| Route::MapView {
        map_id,
        timestamp: Some(timestamp.clone()),
    })
}

/// Run the full provisioning sequence. Refuses re-entry while busy, so a
/// second click cannot start a concurrent run or double-navigate.
pub fn run(phase: RwSignal<CreationPhase>, request: CreationRequest) {
    if phase.get_untracked().is_busy() {
        return;
    }
    phase.set(CreationPhase::CreatingMap);

    spawn_local(async move {
        match run_steps(phase, request).await {
            Ok(target) => route::navigate(&target),
            Err(reason) => {
                web_sys::console::warn_1(&format!("map creation failed: {reason}").into());
                phase.set(CreationPhase::Failed(reason));
            }
        }
    });
}

async fn run_steps(
    phase: RwSignal<CreationPhase>,
    request: CreationRequest,
) -> Result<Route, String> {
    let map_id = api::create_map(request.lbx, request.lby)
        .await
        .map_err(|e| format!("map creation: {e}"))?;

    phase.set(CreationPhase::UploadingPoints);
    api::upload_point_sources(map_id, &request.point_file)
        .await
        .map_err(|e| format!("point-source upload: {e}"))?;

    phase.set(CreationPhase::UploadingCadastre);
    api::upload_cadastre_sources(map_id, &request.cadastre_file)
        .await
        .map_err(|e| format!("cadastre upload: {e}"))?;

    phase.set(CreationPhase::Processing);
    api::start_processing(map_id)
        .await
        .map_err(|e| format!("processing: {e}"))?;

    phase.set(CreationPhase::FetchingTimestamps);
    let timestamps = api::fetch_timestamps(map_id)
        .await
        .map_err(|e| format!("timestamp fetch: {e}"))?;

    success_route(map_id, &timestamps)
        .ok_or_else(|| "backend returned no timestamps".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_route_targets_the_first_timestamp() {
        let route = success_route(42, &["2024-01-01T00:00".to_string()]).unwrap();
        assert_eq!(route.path(), "/map/42/2024-01-01T00:00");
    }

    #[test]
    fn success_route_refuses_an_empty_timestamp_list() {
        assert_eq!(success_route(42, &[]), None);
    }

    #[test]
    fn busy_covers_every_running_step() {
        assert!(!CreationPhase::Idle.is_busy());
        assert!(!CreationPhase::Failed("HTTP 500".into()).is_busy());
        for phase in [
            CreationPhase::CreatingMap,
            CreationPhase::UploadingPoints,
            CreationPhase::UploadingCadastre,
            CreationPhase::Processing,
            CreationPhase::FetchingTimestamps,
        ] {
            assert!(phase.is_busy(), "{phase:?} should be busy");
        }
    }

    #[test]
    fn running_steps_have_labels() {
        assert!(CreationPhase::Idle.label().is_none());
        assert!(CreationPhase::Processing.label().is_some());
        assert_eq!(
            CreationPhase::Failed("x".into()).error(),
            Some("x")
        );
    }
}
