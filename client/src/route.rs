use plume_shared::MapId;

/// Client-side screens, addressed by `location.pathname`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Selector,
    CreateMap,
    MapView {
        map_id: MapId,
        timestamp: Option<String>,
    },
}

impl Route {
    /// Parse a pathname. Unknown or malformed paths fall back to the selector.
    pub fn parse(path: &str) -> Route {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Selector,
            ["create_map"] => Route::CreateMap,
            ["map", id] => match id.parse() {
                Ok(map_id) => Route::MapView {
                    map_id,
                    timestamp: None,
                },
                Err(_) => Route::Selector,
            },
            ["map", id, timestamp] => match id.parse() {
                Ok(map_id) => Route::MapView {
                    map_id,
                    timestamp: Some((*timestamp).to_string()),
                },
                Err(_) => Route::Selector,
            },
            _ => Route::Selector,
        }
    }

    /// Canonical pathname for this route.
    pub fn path(&self) -> String {
        match self {
            Route::Selector => "/".to_string(),
            Route::CreateMap => "/create_map".to_string(),
            Route::MapView {
                map_id,
                timestamp: None,
            } => format!("/map/{map_id}"),
            Route::MapView {
                map_id,
                timestamp: Some(timestamp),
            } => format!("/map/{map_id}/{timestamp}"),
        }
    }
}

/// Route of the current document, read from `location.pathname`.
pub fn current() -> Route {
    let path = web_sys::window()
        .and_then(|window| window.location().pathname().ok())
        .unwrap_or_default();
    Route::parse(&path)
}

/// Navigate with a full document load. Every screen mounts fresh.
pub fn navigate(route: &Route) {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_href(&route.path());
    }
}

/// Rewrite the address bar without reloading. Used by the renderer's
/// in-place timestamp switch.
pub fn replace(route: &Route) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Ok(history) = window.history() {
        let _ = history.replace_state_with_url(
            &wasm_bindgen::JsValue::NULL,
            "",
            Some(&route.path()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_selector() {
        assert_eq!(Route::parse("/"), Route::Selector);
        assert_eq!(Route::parse(""), Route::Selector);
    }

    #[test]
    fn parses_create_map() {
        assert_eq!(Route::parse("/create_map"), Route::CreateMap);
    }

    #[test]
    fn parses_map_view_with_timestamp() {
        assert_eq!(
            Route::parse("/map/42/2024-01-01T00:00"),
            Route::MapView {
                map_id: 42,
                timestamp: Some("2024-01-01T00:00".to_string()),
            }
        );
    }

    #[test]
    fn tolerates_missing_timestamp_segment() {
        let expected = Route::MapView {
            map_id: 7,
            timestamp: None,
        };
        assert_eq!(Route::parse("/map/7"), expected);
        assert_eq!(Route::parse("/map/7/"), expected);
    }

    #[test]
    fn malformed_map_id_falls_back_to_selector() {
        assert_eq!(Route::parse("/map/abc"), Route::Selector);
        assert_eq!(Route::parse("/map"), Route::Selector);
    }

    #[test]
    fn unknown_path_falls_back_to_selector() {
        assert_eq!(Route::parse("/nope/nope"), Route::Selector);
    }

    #[test]
    fn renders_paths() {
        assert_eq!(Route::Selector.path(), "/");
        assert_eq!(Route::CreateMap.path(), "/create_map");
        assert_eq!(
            Route::MapView {
                map_id: 42,
                timestamp: Some("2024-01-01T00:00".to_string()),
            }
            .path(),
            "/map/42/2024-01-01T00:00"
        );
        assert_eq!(
            Route::MapView {
                map_id: 42,
                timestamp: None,
            }
            .path(),
            "/map/42"
        );
    }

    #[test]
    fn path_parse_roundtrip() {
        let route = Route::MapView {
            map_id: 3,
            timestamp: Some("2024-06-01T12:00".to_string()),
        };
        assert_eq!(Route::parse(&route.path()), route);
    }
}
