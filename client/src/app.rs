use leptos::prelude::*;

use crate::create::CreateMap;
use crate::map_view::MapView;
use crate::route::{self, Route};
use crate::selector::Selector;

/// Root component: one screen per route. The route is resolved once per
/// document load; moving between screens is a full page load.
#[component]
pub fn App() -> impl IntoView {
    match route::current() {
        Route::Selector => view! { <Selector /> }.into_any(),
        Route::CreateMap => view! { <CreateMap /> }.into_any(),
        Route::MapView { map_id, timestamp } => {
            view! { <MapView map_id=map_id timestamp=timestamp /> }.into_any()
        }
    }
}
