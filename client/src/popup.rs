use leptos::prelude::*;

use plume_shared::FeatureProperties;

/// Content and screen anchor of the feature popup.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupInfo {
    pub title: &'static str,
    pub lines: Vec<String>,
    pub x: f64,
    pub y: f64,
}

/// Summarize a clicked feature's properties. Unknown feature kinds get no
/// popup at all.
pub fn describe(properties: &FeatureProperties) -> Option<(&'static str, Vec<String>)> {
    match properties {
        FeatureProperties::ConcentrationCell { value, timestamp } => Some((
            "Concentration",
            vec![
                format!("value: {}", value.unwrap_or(0.0)),
                format!(
                    "timestamp: {}",
                    timestamp.as_deref().unwrap_or("N/A")
                ),
            ],
        )),
        FeatureProperties::PointSource { h2s_kg_h } => {
            Some(("Source", source_lines("point_source", *h2s_kg_h)))
        }
        FeatureProperties::CadastreSource { h2s_kg_h } => {
            Some(("Source", source_lines("cadastre_source", *h2s_kg_h)))
        }
        FeatureProperties::Unknown => None,
    }
}

fn source_lines(kind: &str, h2s_kg_h: Option<f64>) -> Vec<String> {
    vec![
        format!("type: {kind}"),
        format!(
            "h2s: {}",
            h2s_kg_h
                .map(|v| v.to_string())
                .unwrap_or_else(|| "N/A".to_string())
        ),
    ]
}

/// Small anchored card summarizing the clicked feature.
#[component]
pub fn FeaturePopup(popup: RwSignal<Option<PopupInfo>>) -> impl IntoView {
    view! {
        {move || {
            let Some(info) = popup.get() else {
                return view! { <div style="display:none;" /> }.into_any();
            };
            view! {
                <div
                    style:left=format!("{}px", info.x + 12.0)
                    style:top=format!("{}px", info.y - 12.0)
                    style="position: fixed; z-index: 20; background: #ffffff; border: 1px solid #c6ccd4; border-radius: 4px; box-shadow: 0 4px 16px rgba(0,0,0,0.25); padding: 8px 12px; font-family: system-ui, sans-serif; font-size: 0.8rem; color: #1c2733; min-width: 140px;"
                >
                    <button
                        style="position: absolute; top: 2px; right: 6px; border: none; background: none; cursor: pointer; color: #5a6572; font-size: 0.9rem;"
                        on:click=move |_| popup.set(None)
                    >
                        "\u{00D7}"
                    </button>
                    <div style="font-weight: 700; margin-bottom: 4px;">{info.title}</div>
                    {info
                        .lines
                        .into_iter()
                        .map(|line| view! { <div>{line}</div> })
                        .collect_view()}
                </div>
            }
            .into_any()
        }}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concentration_popup_defaults_missing_fields() {
        let (title, lines) = describe(&FeatureProperties::ConcentrationCell {
            value: None,
            timestamp: None,
        })
        .unwrap();
        assert_eq!(title, "Concentration");
        assert_eq!(lines, vec!["value: 0", "timestamp: N/A"]);
    }

    #[test]
    fn concentration_popup_shows_value_and_timestamp() {
        let (_, lines) = describe(&FeatureProperties::ConcentrationCell {
            value: Some(5.0),
            timestamp: Some("2024-01-01T00:00".to_string()),
        })
        .unwrap();
        assert_eq!(lines, vec!["value: 5", "timestamp: 2024-01-01T00:00"]);
    }

    #[test]
    fn source_popup_names_its_kind() {
        let (title, lines) = describe(&FeatureProperties::CadastreSource {
            h2s_kg_h: Some(1.5),
        })
        .unwrap();
        assert_eq!(title, "Source");
        assert_eq!(lines, vec!["type: cadastre_source", "h2s: 1.5"]);
    }

    #[test]
    fn unknown_features_get_no_popup() {
        assert!(describe(&FeatureProperties::Unknown).is_none());
    }
}
