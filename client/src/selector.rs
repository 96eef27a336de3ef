use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use plume_shared::MapId;

use crate::api;
use crate::resource::ResourceState;
use crate::route::{self, Route};

fn default_selection(maps: &[MapId]) -> Option<MapId> {
    maps.first().copied()
}

fn load_maps(maps: RwSignal<ResourceState<Vec<MapId>>>, selected: RwSignal<Option<MapId>>) {
    let mut claimed = false;
    maps.update(|state| claimed = state.begin());
    if !claimed {
        return;
    }

    spawn_local(async move {
        match api::fetch_all_maps().await {
            Ok(list) => {
                selected.set(default_selection(&list));
                maps.set(ResourceState::Ready(list));
            }
            Err(reason) => {
                web_sys::console::warn_1(&format!("map list fetch failed: {reason}").into());
                maps.set(ResourceState::Failed(reason));
            }
        }
    });
}

/// Landing screen: pick an existing map or start creating one. The map list
/// is fetched exactly once per mount.
#[component]
pub fn Selector() -> impl IntoView {
    let maps: RwSignal<ResourceState<Vec<MapId>>> = RwSignal::new(ResourceState::Idle);
    let selected: RwSignal<Option<MapId>> = RwSignal::new(None);

    Effect::new(move || {
        load_maps(maps, selected);
    });

    let on_change = move |e: web_sys::Event| {
        let value = e
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlSelectElement>().ok())
            .map(|el| el.value());
        if let Some(map_id) = value.and_then(|v| v.parse::<MapId>().ok()) {
            selected.set(Some(map_id));
        }
    };

    let open_selected = move |_| {
        if let Some(map_id) = selected.get_untracked() {
            route::navigate(&Route::MapView {
                map_id,
                timestamp: None,
            });
        }
    };

    let retry = move |_| {
        maps.update(|state| {
            state.retry();
        });
        load_maps(maps, selected);
    };

    view! {
        <div style="display: flex; justify-content: center; align-items: center; height: 100vh; width: 100vw; font-family: system-ui, sans-serif;">
            {move || maps.with(|state| match state {
                ResourceState::Idle | ResourceState::Loading => {
                    view! { <p>"Loading maps..."</p> }.into_any()
                }
                ResourceState::Failed(reason) => {
                    let reason = reason.clone();
                    view! {
                        <div style="display: flex; flex-direction: column; gap: 8px; align-items: center;">
                            <p style="color: #b3261e;">{format!("Could not load maps: {reason}")}</p>
                            <button on:click=retry>"Retry"</button>
                        </div>
                    }
                    .into_any()
                }
                ResourceState::Ready(list) => {
                    let options = list
                        .iter()
                        .map(|id| {
                            let id = id.to_string();
                            view! { <option value=id.clone()>{id.clone()}</option> }
                        })
                        .collect_view();
                    let have_maps = !list.is_empty();
                    view! {
                        <div style="display: flex; flex-direction: column; gap: 5px; min-width: 220px;">
                            <select on:change=on_change>{options}</select>
                            <button disabled=!have_maps on:click=open_selected>
                                "Open the selected map"
                            </button>
                            <button on:click=move |_| route::navigate(&Route::CreateMap)>
                                "Create a new map"
                            </button>
                            {(!have_maps)
                                .then(|| view! { <p style="color: #5a6572;">"No maps yet — create one."</p> })}
                        </div>
                    }
                    .into_any()
                }
            })}
        </div>
    }
}
