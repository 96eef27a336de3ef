use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use plume_shared::{FeatureCollection, MapId};

use crate::api;
use crate::canvas::MapCanvas;
use crate::popup::{FeaturePopup, PopupInfo};
use crate::resource::ResourceState;
use crate::route::{self, Route};
use crate::scene::MapScene;
use crate::time_format::timestamp_label;
use leptos::tachys::either::Either;

/// `leptos::AnyView` / the dynamic-child `ReactiveFunction` bound require
/// `Send` unconditionally, even in CSR-only builds where nothing ever
/// crosses a real thread (wasm32 is single-threaded). This wrapper lets a
/// `Rc<RefCell<MapScene>>` handle pass through that bound without changing
/// how it's used; `get()` is the only access path so precise closure
/// capture always picks up the whole wrapper, not the inner `Rc`.
struct SendableScene(Rc<RefCell<MapScene>>);
unsafe impl Send for SendableScene {}
impl SendableScene {
    fn get(&self) -> Rc<RefCell<MapScene>> {
        self.0.clone()
    }
}

/// Fetch one time slice of geometry. A newer request supersedes an older
/// in-flight one via the nonce, so rapid timestamp switches cannot apply a
/// stale payload.
fn load_geometry(
    map_id: MapId,
    timestamp: String,
    geometry: RwSignal<ResourceState<FeatureCollection>>,
    nonce: RwSignal<u64>,
    loaded_once: RwSignal<bool>,
) {
    let request_nonce = nonce.get_untracked().wrapping_add(1);
    nonce.set(request_nonce);
    geometry.set(ResourceState::Loading);

    spawn_local(async move {
        let result = api::fetch_geojson(map_id, &timestamp).await;
        if nonce.get_untracked() != request_nonce {
            return;
        }
        match result {
            Ok(data) => {
                loaded_once.set(true);
                geometry.set(ResourceState::Ready(data));
            }
            Err(reason) => {
                web_sys::console::warn_1(&format!("geometry fetch failed: {reason}").into());
                geometry.set(ResourceState::Failed(reason));
            }
        }
    });
}

/// Renderer screen for one `(map, timestamp)` pair. Fetches the timestamp
/// list and the geometry, shows a placeholder until the first payload is in,
/// and switches timestamps in place by updating the scene's source data.
#[component]
pub fn MapView(map_id: MapId, timestamp: Option<String>) -> impl IntoView {
    let timestamps: RwSignal<ResourceState<Vec<String>>> = RwSignal::new(ResourceState::Idle);
    let geometry: RwSignal<ResourceState<FeatureCollection>> = RwSignal::new(ResourceState::Idle);
    let active_timestamp: RwSignal<Option<String>> = RwSignal::new(timestamp);
    let geometry_nonce: RwSignal<u64> = RwSignal::new(0);
    let loaded_once: RwSignal<bool> = RwSignal::new(false);
    let popup: RwSignal<Option<PopupInfo>> = RwSignal::new(None);
    let scene: Rc<RefCell<MapScene>> = Rc::new(RefCell::new(MapScene::new()));

    // Mount-time fetches, claimed exactly once through the timestamps state.
    Effect::new(move || {
        let mut claimed = false;
        timestamps.update(|state| claimed = state.begin());
        if !claimed {
            return;
        }

        match active_timestamp.get_untracked() {
            Some(token) => {
                // The route carried a timestamp: both fetches run concurrently.
                load_geometry(map_id, token, geometry, geometry_nonce, loaded_once);
                spawn_local(async move {
                    match api::fetch_timestamps(map_id).await {
                        Ok(list) => timestamps.set(ResourceState::Ready(list)),
                        Err(reason) => {
                            web_sys::console::warn_1(
                                &format!("timestamp fetch failed: {reason}").into(),
                            );
                            timestamps.set(ResourceState::Failed(reason));
                        }
                    }
                });
            }
            None => {
                // No timestamp segment: resolve the default (first) one before
                // fetching geometry, and reflect it in the address bar.
                spawn_local(async move {
                    match api::fetch_timestamps(map_id).await {
                        Ok(list) => {
                            let first = list.first().cloned();
                            timestamps.set(ResourceState::Ready(list));
                            match first {
                                Some(token) => {
                                    active_timestamp.set(Some(token.clone()));
                                    route::replace(&Route::MapView {
                                        map_id,
                                        timestamp: Some(token.clone()),
                                    });
                                    load_geometry(
                                        map_id,
                                        token,
                                        geometry,
                                        geometry_nonce,
                                        loaded_once,
                                    );
                                }
                                None => geometry.set(ResourceState::Failed(
                                    "map has no timestamps".to_string(),
                                )),
                            }
                        }
                        Err(reason) => {
                            timestamps.set(ResourceState::Failed(reason.clone()));
                            geometry.set(ResourceState::Failed(reason));
                        }
                    }
                });
            }
        }
    });

    let reload = move |_| {
        route::navigate(&Route::MapView {
            map_id,
            timestamp: active_timestamp.get_untracked(),
        });
    };

    let scene_canvas = SendableScene(scene.clone());
    view! {
        {move || {
            if !loaded_once.get() {
                return Either::Left(view! {
                    <div style="display: flex; justify-content: center; align-items: center; height: 100vh; width: 100vw; font-family: system-ui, sans-serif;">
                        {move || geometry.with(|state| match state.error() {
                            None => view! { <p>"Loading map..."</p> }.into_any(),
                            Some(reason) => {
                                let reason = reason.to_string();
                                view! {
                                    <div style="display: flex; flex-direction: column; gap: 8px; align-items: center;">
                                        <p style="color: #b3261e;">{format!("Could not load the map: {reason}")}</p>
                                        <button on:click=reload>"Retry"</button>
                                    </div>
                                }
                                .into_any()
                            }
                        })}
                    </div>
                });
            }

            let scene = scene_canvas.get();
            Either::Right(view! {
                <div style="position: relative; height: 100vh; width: 100vw; overflow: hidden;">
                    <MapCanvas scene=scene geometry=geometry popup=popup />
                    <div style="position: absolute; top: 8px; left: 8px; z-index: 10; display: flex; gap: 5px; flex-wrap: wrap; max-width: calc(100vw - 16px); font-family: system-ui, sans-serif;">
                        {move || timestamps.with(|state| match state {
                            ResourceState::Ready(list) => list
                                .iter()
                                .map(|token| {
                                    let token = token.clone();
                                    let label = timestamp_label(&token);
                                    let is_active = {
                                        let token = token.clone();
                                        move || {
                                            active_timestamp.with(|active| {
                                                active.as_deref() == Some(token.as_str())
                                            })
                                        }
                                    };
                                    let is_active_fg = is_active.clone();
                                    let token_for_click = token.clone();
                                    view! {
                                        <button
                                            style="padding: 4px 8px; border: 1px solid #c6ccd4; border-radius: 4px; cursor: pointer;"
                                            style:background=move || {
                                                if is_active() { "#1c4e80" } else { "#ffffff" }
                                            }
                                            style:color=move || {
                                                if is_active_fg() { "#ffffff" } else { "#1c2733" }
                                            }
                                            on:click=move |_| {
                                                let token = token_for_click.clone();
                                                if active_timestamp.get_untracked().as_deref()
                                                    == Some(token.as_str())
                                                {
                                                    return;
                                                }
                                                active_timestamp.set(Some(token.clone()));
                                                popup.set(None);
                                                route::replace(&Route::MapView {
                                                    map_id,
                                                    timestamp: Some(token.clone()),
                                                });
                                                load_geometry(
                                                    map_id,
                                                    token,
                                                    geometry,
                                                    geometry_nonce,
                                                    loaded_once,
                                                );
                                            }
                                        >
                                            {label}
                                        </button>
                                    }
                                })
                                .collect_view()
                                .into_any(),
                            ResourceState::Failed(_) | ResourceState::Idle | ResourceState::Loading => {
                                ().into_any()
                            }
                        })}
                    </div>
                    {move || {
                        geometry.with(|state| {
                            state.is_loading().then(|| {
                                view! {
                                    <div style="position: absolute; bottom: 12px; left: 12px; z-index: 10; background: rgba(255,255,255,0.9); border-radius: 4px; padding: 4px 10px; font-family: system-ui, sans-serif; font-size: 0.8rem;">
                                        "Loading timestamp..."
                                    </div>
                                }
                            })
                        })
                    }}
                    {move || {
                        geometry.with(|state| {
                            state.error().map(|reason| {
                                let reason = reason.to_string();
                                view! {
                                    <div style="position: absolute; bottom: 12px; left: 12px; z-index: 10; background: rgba(255,240,240,0.95); border: 1px solid #b3261e; border-radius: 4px; padding: 4px 10px; font-family: system-ui, sans-serif; font-size: 0.8rem; color: #b3261e;">
                                        {format!("Timestamp load failed: {reason}")}
                                    </div>
                                }
                            })
                        })
                    }}
                    <FeaturePopup popup=popup />
                </div>
            })
        }}
    }
}
