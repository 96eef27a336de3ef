use serde::{Deserialize, Serialize};

/// Backend-assigned map identifier. Opaque to the client: displayed and
/// routed on, never inspected.
pub type MapId = u64;

/// Response of `GET /all_maps`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapList {
    #[serde(default)]
    pub maps: Vec<MapId>,
}

/// Response of `POST /new_map`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMap {
    pub map_id: MapId,
}

/// Response of `GET /available_timestamps`. Tokens are opaque; order is the
/// backend's and the first entry is the default time slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampList {
    #[serde(default)]
    pub timestamps: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_map_list() {
        let list: MapList = serde_json::from_str(r#"{"maps":[3,1,42]}"#).unwrap();
        assert_eq!(list.maps, vec![3, 1, 42]);
    }

    #[test]
    fn map_list_tolerates_missing_field() {
        let list: MapList = serde_json::from_str("{}").unwrap();
        assert!(list.maps.is_empty());
    }

    #[test]
    fn parses_new_map() {
        let new_map: NewMap = serde_json::from_str(r#"{"map_id":42}"#).unwrap();
        assert_eq!(new_map.map_id, 42);
    }

    #[test]
    fn parses_timestamp_list() {
        let list: TimestampList =
            serde_json::from_str(r#"{"timestamps":["2024-01-01T00:00","2024-01-01T01:00"]}"#)
                .unwrap();
        assert_eq!(list.timestamps.len(), 2);
        assert_eq!(list.timestamps[0], "2024-01-01T00:00");
    }
}
