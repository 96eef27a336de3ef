//! Typed wrappers over the dispersion backend's REST endpoints.

use gloo_net::http::Request;

use plume_shared::{FeatureCollection, MapId, MapList, NewMap, TimestampList};

use crate::config;

/// `GET /all_maps`
pub async fn fetch_all_maps() -> Result<Vec<MapId>, String> {
    let url = format!("{}/all_maps", config::backend_url());
    let resp = Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    let list: MapList = resp
        .json()
        .await
        .map_err(|e| format!("parse error: {e}"))?;
    Ok(list.maps)
}

/// `POST /new_map` — provision a map for a bounding origin.
pub async fn create_map(lbx: f64, lby: f64) -> Result<MapId, String> {
    let url = format!("{}/new_map?lbx={lbx}&lby={lby}", config::backend_url());
    let resp = Request::post(&url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    let new_map: NewMap = resp
        .json()
        .await
        .map_err(|e| format!("parse error: {e}"))?;
    Ok(new_map.map_id)
}

/// `POST /upload_point` — point-source CSV, uploaded verbatim.
pub async fn upload_point_sources(map_id: MapId, file: &web_sys::File) -> Result<(), String> {
    upload("upload_point", map_id, file).await
}

/// `POST /upload_cadastre` — areal-source CSV, uploaded verbatim.
pub async fn upload_cadastre_sources(map_id: MapId, file: &web_sys::File) -> Result<(), String> {
    upload("upload_cadastre", map_id, file).await
}

async fn upload(endpoint: &str, map_id: MapId, file: &web_sys::File) -> Result<(), String> {
    let form = web_sys::FormData::new().map_err(|_| "could not build form data".to_string())?;
    form.append_with_blob("file", file)
        .map_err(|_| "could not attach file".to_string())?;

    let url = format!("{}/{endpoint}?map_id={map_id}", config::backend_url());
    let resp = Request::post(&url)
        .body(form)
        .map_err(|e| format!("request error: {e}"))?
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    Ok(())
}

/// `GET /process` — kick off grid generation for an uploaded map.
pub async fn start_processing(map_id: MapId) -> Result<(), String> {
    let url = format!("{}/process?map_id={map_id}", config::backend_url());
    let resp = Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    Ok(())
}

/// `GET /available_timestamps`
pub async fn fetch_timestamps(map_id: MapId) -> Result<Vec<String>, String> {
    let url = format!(
        "{}/available_timestamps?map_id={map_id}",
        config::backend_url()
    );
    let resp = Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    let list: TimestampList = resp
        .json()
        .await
        .map_err(|e| format!("parse error: {e}"))?;
    Ok(list.timestamps)
}

/// `GET /generate_geojson_timestamp` — one time slice of concentration
/// cells plus both source layers.
pub async fn fetch_geojson(map_id: MapId, timestamp: &str) -> Result<FeatureCollection, String> {
    let url = format!(
        "{}/generate_geojson_timestamp?timestamp={timestamp}&map_id={map_id}",
        config::backend_url()
    );
    let resp = Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json()
        .await
        .map_err(|e| format!("parse error: {e}"))
}
