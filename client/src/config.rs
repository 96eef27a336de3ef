use js_sys::Reflect;
use wasm_bindgen::JsValue;

/// Local development backend. Deployments define `window.__PLUME_BACKEND_URL`
/// before the bundle loads to point the client at the hosted backend.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const BACKEND_URL_GLOBAL: &str = "__PLUME_BACKEND_URL";

/// Raster basemap tile template (slippy XYZ).
pub const TILE_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_FETCH_CONCURRENCY: usize = 6;
pub const MAX_TILE_ZOOM: u8 = 19;

/// Base URL of the dispersion backend, without a trailing slash.
pub fn backend_url() -> String {
    let raw = web_sys::window().and_then(|window| {
        Reflect::get(window.as_ref(), &JsValue::from_str(BACKEND_URL_GLOBAL))
            .ok()
            .and_then(|value| value.as_string())
    });
    normalize_backend_url(raw)
}

fn normalize_backend_url(raw: Option<String>) -> String {
    raw.map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_override() {
        assert_eq!(normalize_backend_url(None), DEFAULT_BACKEND_URL);
        assert_eq!(normalize_backend_url(Some("  ".into())), DEFAULT_BACKEND_URL);
    }

    #[test]
    fn strips_trailing_slash() {
        assert_eq!(
            normalize_backend_url(Some("https://visback.example.dev/".into())),
            "https://visback.example.dev"
        );
    }
}
