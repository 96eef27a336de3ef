use gloo_storage::Storage;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

use crate::workflow::{self, CreationPhase, CreationRequest};

const FORM_STORAGE_KEY: &str = "plume_create_form";

/// Last submitted bounding origin, restored as the form default.
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct FormDefaults {
    lbx: f64,
    lby: f64,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            lbx: 58.0,
            lby: 56.0,
        }
    }
}

/// Parse the bounding-origin inputs; non-finite or unparseable values are
/// rejected here instead of being forwarded to the backend.
fn parse_origin(lbx: &str, lby: &str) -> Result<(f64, f64), String> {
    let parse = |label: &str, raw: &str| -> Result<f64, String> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| format!("{label} must be a finite number"))
    };
    Ok((parse("X", lbx)?, parse("Y", lby)?))
}

fn file_from_input(e: &web_sys::Event) -> Option<web_sys::File> {
    e.target()
        .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        .and_then(|input| input.files())
        .and_then(|files| files.get(0))
}

fn text_from_input(e: &web_sys::Event) -> Option<String> {
    e.target()
        .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        .map(|input| input.value())
}

/// Map creation form: bounding origin plus the two source CSVs, driving the
/// five-step provisioning workflow.
#[component]
pub fn CreateMap() -> impl IntoView {
    let saved: FormDefaults = gloo_storage::LocalStorage::get(FORM_STORAGE_KEY).unwrap_or_default();
    let lbx_text = RwSignal::new(saved.lbx.to_string());
    let lby_text = RwSignal::new(saved.lby.to_string());
    // File handles are JS objects; keep them on local (same-thread) storage.
    let point_file: RwSignal<Option<web_sys::File>, LocalStorage> = RwSignal::new_local(None);
    let cadastre_file: RwSignal<Option<web_sys::File>, LocalStorage> = RwSignal::new_local(None);
    let phase: RwSignal<CreationPhase> = RwSignal::new(CreationPhase::Idle);

    let submit = move |_| {
        if phase.get_untracked().is_busy() {
            return;
        }

        let origin = parse_origin(&lbx_text.get_untracked(), &lby_text.get_untracked());
        let (lbx, lby) = match origin {
            Ok(origin) => origin,
            Err(reason) => {
                phase.set(CreationPhase::Failed(reason));
                return;
            }
        };
        let Some(point) = point_file.get_untracked() else {
            phase.set(CreationPhase::Failed(
                "choose a point-source file first".to_string(),
            ));
            return;
        };
        let Some(cadastre) = cadastre_file.get_untracked() else {
            phase.set(CreationPhase::Failed(
                "choose a cadastre file first".to_string(),
            ));
            return;
        };

        let _ = gloo_storage::LocalStorage::set(FORM_STORAGE_KEY, &FormDefaults { lbx, lby });
        workflow::run(
            phase,
            CreationRequest {
                lbx,
                lby,
                point_file: point,
                cadastre_file: cadastre,
            },
        );
    };

    let file_label = |file: RwSignal<Option<web_sys::File>, LocalStorage>, fallback: &'static str| {
        move || {
            file.with(|f| {
                f.as_ref()
                    .map(|f| f.name())
                    .unwrap_or_else(|| fallback.to_string())
            })
        }
    };

    view! {
        <div style="display: flex; justify-content: center; align-items: center; height: 100vh; width: 100vw; font-family: system-ui, sans-serif;">
            <form
                style="display: flex; flex-direction: column; gap: 5px; min-width: 320px;"
                on:submit=move |e| e.prevent_default()
            >
                {move || {
                    phase.with(|p| p.label().map(|label| view! { <p>{label}</p> }))
                }}
                {move || {
                    phase.with(|p| {
                        p.error().map(|reason| {
                            let reason = reason.to_string();
                            view! { <p style="color: #b3261e;">{reason}</p> }
                        })
                    })
                }}
                <label>
                    "Lower-left X (WGS84)"
                    <input
                        style="width: 100%;"
                        prop:value=move || lbx_text.get()
                        on:input=move |e| {
                            if let Some(value) = text_from_input(&e) {
                                lbx_text.set(value);
                            }
                        }
                    />
                </label>
                <label>
                    "Lower-left Y (WGS84)"
                    <input
                        style="width: 100%;"
                        prop:value=move || lby_text.get()
                        on:input=move |e| {
                            if let Some(value) = text_from_input(&e) {
                                lby_text.set(value);
                            }
                        }
                    />
                </label>
                <label>
                    {file_label(point_file, "Point sources (point.csv)")}
                    <input
                        type="file"
                        accept=".csv"
                        on:change=move |e| point_file.set(file_from_input(&e))
                    />
                </label>
                <label>
                    {file_label(cadastre_file, "Areal sources (cadastre.csv)")}
                    <input
                        type="file"
                        accept=".csv"
                        on:change=move |e| cadastre_file.set(file_from_input(&e))
                    />
                </label>
                <button
                    type="button"
                    prop:disabled=move || phase.with(|p| p.is_busy())
                    on:click=submit
                >
                    "Create"
                </button>
            </form>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::parse_origin;

    #[test]
    fn parses_plain_numbers() {
        assert_eq!(parse_origin("58", "56.5"), Ok((58.0, 56.5)));
        assert_eq!(parse_origin(" 58 ", "56"), Ok((58.0, 56.0)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_origin("abc", "56").is_err());
        assert!(parse_origin("58", "").is_err());
    }

    #[test]
    fn rejects_non_finite_values() {
        assert!(parse_origin("inf", "56").is_err());
        assert!(parse_origin("58", "NaN").is_err());
    }
}
