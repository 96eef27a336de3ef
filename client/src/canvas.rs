use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, PointerEvent, WheelEvent};

use plume_shared::{FeatureCollection, FeatureProperties, Geometry, looks_latlon_swapped};

use crate::popup::{PopupInfo, describe};
use crate::projection;
use crate::render_loop::RenderScheduler;
use crate::resource::ResourceState;
use crate::scene::{CircleStyle, LayerKind, MapScene};
use crate::spatial;
use crate::style;
use crate::tiles::{self, LoadedTile, TileLoader};
use crate::viewport::Viewport;

const BACKGROUND: &str = "#dfe8ef";
/// Clicks that dragged farther than this are pans, not selections.
const CLICK_SLOP_PX: f64 = 5.0;
/// Offscreen culling margin so stroked shapes at the edge still draw.
const CULL_MARGIN_PX: f64 = 32.0;

fn canvas_dimensions() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (1200.0, 800.0);
    };
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1200.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    (w, h)
}

fn render_scale() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
        .max(1.0)
}

/// Interactive dispersion map: raster basemap plus the scene's vector
/// layers on one Canvas 2D surface, with drag-pan, wheel-zoom, hover
/// cursor and click popups.
#[component]
pub fn MapCanvas(
    scene: Rc<RefCell<MapScene>>,
    geometry: RwSignal<ResourceState<FeatureCollection>>,
    popup: RwSignal<Option<PopupInfo>>,
) -> impl IntoView {
    let viewport: RwSignal<Viewport> = RwSignal::new(Viewport::default());
    // Tile images are JS handles, so this signal stays on local storage.
    let loaded_tiles: RwSignal<Vec<LoadedTile>, LocalStorage> = RwSignal::new_local(Vec::new());
    let loader = Rc::new(TileLoader::new(loaded_tiles));

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    // Track drag state
    let is_dragging = Rc::new(Cell::new(false));
    let drag_start_x = Rc::new(Cell::new(0.0f64));
    let drag_start_y = Rc::new(Cell::new(0.0f64));
    let last_x = Rc::new(Cell::new(0.0f64));
    let last_y = Rc::new(Cell::new(0.0f64));

    // Fit the viewport to data once per mount
    let fitted = Rc::new(Cell::new(false));

    // Cached Canvas 2D context (invalidated on canvas resize)
    let cached_ctx: Rc<RefCell<Option<CanvasRenderingContext2d>>> = Rc::new(RefCell::new(None));

    let scene_render = scene.clone();
    let cached_ctx_render = cached_ctx.clone();
    let scheduler = Rc::new(RenderScheduler::new(move || {
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let canvas: &HtmlCanvasElement = &canvas;

        let Some(parent) = canvas.parent_element() else {
            return;
        };
        let w = parent.client_width() as f64;
        let h = parent.client_height() as f64;
        if w <= 0.0 || h <= 0.0 {
            return;
        }

        let scale = render_scale();
        let device_w = (w * scale).round() as u32;
        let device_h = (h * scale).round() as u32;
        if canvas.width() != device_w || canvas.height() != device_h {
            canvas.set_width(device_w);
            canvas.set_height(device_h);
            // Canvas resize resets 2D context state — invalidate cache
            *cached_ctx_render.borrow_mut() = None;
        }

        let ctx = {
            let mut ctx_cache = cached_ctx_render.borrow_mut();
            if ctx_cache.is_none() {
                let Some(ctx) = canvas
                    .get_context("2d")
                    .ok()
                    .flatten()
                    .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
                else {
                    return;
                };
                *ctx_cache = Some(ctx);
            }
            let Some(ctx) = ctx_cache.clone() else {
                return;
            };
            ctx
        };

        let _ = ctx.set_transform(scale, 0.0, 0.0, scale, 0.0, 0.0);
        ctx.set_fill_style_str(BACKGROUND);
        ctx.fill_rect(0.0, 0.0, w, h);

        let vp = viewport.get_untracked();
        let scene = scene_render.borrow();
        loaded_tiles.with_untracked(|tiles| {
            for layer in scene.layers() {
                match &layer.kind {
                    LayerKind::Basemap => draw_tiles(&ctx, &vp, tiles, w, h),
                    LayerKind::Fill => {
                        if let Some((data, kind)) = layer.source.zip(layer.filter).and_then(
                            |(source, kind)| scene.source(source).map(|data| (data, kind)),
                        ) {
                            for feature in &data.features {
                                if feature.properties.kind() == kind {
                                    draw_fill(&ctx, &vp, feature_fill_style(&feature.properties), &feature.geometry, w, h);
                                }
                            }
                        }
                    }
                    LayerKind::Circle(circle) => {
                        if let Some((data, kind)) = layer.source.zip(layer.filter).and_then(
                            |(source, kind)| scene.source(source).map(|data| (data, kind)),
                        ) {
                            for feature in &data.features {
                                if feature.properties.kind() == kind {
                                    draw_circle(&ctx, &vp, circle, &feature.geometry, w, h);
                                }
                            }
                        }
                    }
                }
            }
        });
    }));

    // New geometry: refresh the scene in place, fit the view once, repaint.
    let scene_install = scene.clone();
    let fitted_install = fitted.clone();
    let sched_install = scheduler.clone();
    Effect::new(move || {
        geometry.with(|state| {
            let Some(data) = state.ready() else {
                return;
            };
            scene_install
                .borrow_mut()
                .install_dispersion_layers(data.clone());
            if !fitted_install.get() {
                fitted_install.set(true);
                fit_to_data(viewport, data);
            }
            sched_install.mark_dirty();
        });
    });

    // Keep basemap tiles in step with the viewport.
    let loader_vp = loader.clone();
    Effect::new(move || {
        let vp = viewport.get();
        let (w, h) = canvas_dimensions();
        loader_vp.request(&tiles::visible_tiles(&vp, w, h));
    });

    // Repaint on pan/zoom or tile arrival.
    let sched_vp = scheduler.clone();
    Effect::new(move || {
        viewport.track();
        loaded_tiles.track();
        sched_vp.mark_dirty();
    });

    // --- Input handlers ---

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let delta = e.delta_y();
        let x = e.offset_x() as f64;
        let y = e.offset_y() as f64;
        viewport.update(|vp| vp.zoom_at(delta, x, y));
    };

    let on_pointer_down = {
        let is_dragging = is_dragging.clone();
        let drag_start_x = drag_start_x.clone();
        let drag_start_y = drag_start_y.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        move |e: PointerEvent| {
            is_dragging.set(true);
            drag_start_x.set(e.client_x() as f64);
            drag_start_y.set(e.client_y() as f64);
            last_x.set(e.client_x() as f64);
            last_y.set(e.client_y() as f64);

            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
                el.style().set_property("cursor", "grabbing").ok();
            }
        }
    };

    let on_pointer_move = {
        let is_dragging = is_dragging.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        let scene_hover = scene.clone();
        move |e: PointerEvent| {
            if is_dragging.get() {
                let dx = e.client_x() as f64 - last_x.get();
                let dy = e.client_y() as f64 - last_y.get();
                last_x.set(e.client_x() as f64);
                last_y.set(e.client_y() as f64);
                viewport.update(|vp| vp.pan(dx, dy));
            } else {
                let local = local_position(canvas_ref, &e);
                let vp = viewport.get_untracked();
                let interactive = hit_feature(&scene_hover.borrow(), &vp, local.0, local.1).is_some();
                if let Some(target) = e.target()
                    && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
                {
                    let cursor = if interactive { "pointer" } else { "grab" };
                    el.style().set_property("cursor", cursor).ok();
                }
            }
        }
    };

    let on_pointer_up = {
        let is_dragging = is_dragging.clone();
        move |e: PointerEvent| {
            is_dragging.set(false);
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.style().set_property("cursor", "grab").ok();
            }
        }
    };

    let on_click = {
        let drag_start_x = drag_start_x.clone();
        let drag_start_y = drag_start_y.clone();
        let scene_click = scene.clone();
        move |e: MouseEvent| {
            let dx = (e.client_x() as f64 - drag_start_x.get()).abs();
            let dy = (e.client_y() as f64 - drag_start_y.get()).abs();
            if dx >= CLICK_SLOP_PX || dy >= CLICK_SLOP_PX {
                return;
            }
            let local = local_position(canvas_ref, &e);
            let vp = viewport.get_untracked();
            let hit = hit_feature(&scene_click.borrow(), &vp, local.0, local.1);
            match hit.as_ref().and_then(describe) {
                Some((title, lines)) => popup.set(Some(PopupInfo {
                    title,
                    lines,
                    x: e.client_x() as f64,
                    y: e.client_y() as f64,
                })),
                None => popup.set(None),
            }
        }
    };

    view! {
        <div style="position: relative; width: 100%; height: 100%; overflow: hidden;">
            <canvas
                node_ref=canvas_ref
                on:wheel=on_wheel
                on:pointerdown=on_pointer_down
                on:pointermove=on_pointer_move
                on:pointerup=on_pointer_up
                on:click=on_click
                style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab;"
            />
        </div>
    }
}

/// Event position relative to the canvas.
fn local_position(canvas_ref: NodeRef<leptos::html::Canvas>, e: &MouseEvent) -> (f64, f64) {
    canvas_ref
        .get_untracked()
        .map(|el| {
            let rect = el.get_bounding_client_rect();
            (
                e.client_x() as f64 - rect.left(),
                e.client_y() as f64 - rect.top(),
            )
        })
        .unwrap_or((e.offset_x() as f64, e.offset_y() as f64))
}

fn feature_fill_style(properties: &FeatureProperties) -> String {
    style::concentration_fill(properties.concentration())
}

/// Best-effort fit to the first feature's bounding box, with the
/// coordinate-order diagnostic from the backend's known quirk. The warning
/// never corrects or blocks; it only explains an empty-looking map.
fn fit_to_data(viewport: RwSignal<Viewport>, data: &FeatureCollection) {
    if let Some(pos) = data
        .features
        .first()
        .and_then(|f| f.geometry.sample_position())
        && looks_latlon_swapped(pos)
    {
        web_sys::console::warn_1(
            &format!(
                "geometry looks [lat, lon] ordered (leading ordinate {} exceeds 90); rendering as-is",
                pos[0]
            )
            .into(),
        );
    }

    let Some(bounds) = data.lead_bounds() else {
        return;
    };
    let (min_wx, min_wy, max_wx, max_wy) = projection::project_bounds(bounds);
    let (w, h) = canvas_dimensions();
    viewport.update(|vp| vp.fit_bounds(min_wx, min_wy, max_wx, max_wy, w, h));
}

/// Topmost interactive feature under a screen position.
fn hit_feature(
    scene: &MapScene,
    vp: &Viewport,
    sx: f64,
    sy: f64,
) -> Option<FeatureProperties> {
    let (wx, wy) = vp.screen_to_world(sx, sy);
    let (lon, lat) = projection::unproject(wx, wy);

    for layer in scene.layers().iter().rev() {
        let Some((data, kind)) = layer
            .source
            .zip(layer.filter)
            .and_then(|(source, kind)| scene.source(source).map(|data| (data, kind)))
        else {
            continue;
        };

        match &layer.kind {
            LayerKind::Circle(circle) => {
                for feature in &data.features {
                    if feature.properties.kind() != kind {
                        continue;
                    }
                    let Geometry::Point { coordinates } = &feature.geometry else {
                        continue;
                    };
                    let (fwx, fwy) = projection::project(coordinates[0], coordinates[1]);
                    let (fsx, fsy) = vp.world_to_screen(fwx, fwy);
                    let r = circle.radius + circle.stroke_width;
                    if (fsx - sx).powi(2) + (fsy - sy).powi(2) <= r * r {
                        return Some(feature.properties.clone());
                    }
                }
            }
            LayerKind::Fill => {
                for feature in &data.features {
                    if feature.properties.kind() == kind
                        && spatial::geometry_contains(&feature.geometry, [lon, lat])
                    {
                        return Some(feature.properties.clone());
                    }
                }
            }
            LayerKind::Basemap => {}
        }
    }
    None
}

fn draw_tiles(
    ctx: &CanvasRenderingContext2d,
    vp: &Viewport,
    tiles: &[LoadedTile],
    canvas_w: f64,
    canvas_h: f64,
) {
    for tile in tiles {
        let (min_wx, min_wy, max_wx, max_wy) = tile.id.world_bounds();
        let (sx, sy) = vp.world_to_screen(min_wx, min_wy);
        let (ex, ey) = vp.world_to_screen(max_wx, max_wy);
        if ex < 0.0 || ey < 0.0 || sx > canvas_w || sy > canvas_h {
            continue;
        }
        ctx.draw_image_with_html_image_element_and_dw_and_dh(
            &tile.image,
            sx,
            sy,
            ex - sx,
            ey - sy,
        )
        .ok();
    }
}

fn trace_rings(
    ctx: &CanvasRenderingContext2d,
    vp: &Viewport,
    rings: &[Vec<[f64; 2]>],
) {
    for ring in rings {
        for (i, pos) in ring.iter().enumerate() {
            let (wx, wy) = projection::project(pos[0], pos[1]);
            let (sx, sy) = vp.world_to_screen(wx, wy);
            if i == 0 {
                ctx.move_to(sx, sy);
            } else {
                ctx.line_to(sx, sy);
            }
        }
        ctx.close_path();
    }
}

fn draw_fill(
    ctx: &CanvasRenderingContext2d,
    vp: &Viewport,
    fill_style: String,
    geometry: &Geometry,
    canvas_w: f64,
    canvas_h: f64,
) {
    if let Some(bounds) = geometry.bounds() {
        let (min_wx, min_wy, max_wx, max_wy) = projection::project_bounds(bounds);
        let (sx, sy) = vp.world_to_screen(min_wx, min_wy);
        let (ex, ey) = vp.world_to_screen(max_wx, max_wy);
        if ex < -CULL_MARGIN_PX
            || ey < -CULL_MARGIN_PX
            || sx > canvas_w + CULL_MARGIN_PX
            || sy > canvas_h + CULL_MARGIN_PX
        {
            return;
        }
    }

    ctx.begin_path();
    match geometry {
        Geometry::Polygon { coordinates } => trace_rings(ctx, vp, coordinates),
        Geometry::MultiPolygon { coordinates } => {
            for rings in coordinates {
                trace_rings(ctx, vp, rings);
            }
        }
        Geometry::Point { .. } => return,
    }
    ctx.set_fill_style_str(&fill_style);
    ctx.fill_with_canvas_winding_rule(web_sys::CanvasWindingRule::Evenodd);
}

fn draw_circle(
    ctx: &CanvasRenderingContext2d,
    vp: &Viewport,
    circle: &CircleStyle,
    geometry: &Geometry,
    canvas_w: f64,
    canvas_h: f64,
) {
    let Geometry::Point { coordinates } = geometry else {
        return;
    };
    let (wx, wy) = projection::project(coordinates[0], coordinates[1]);
    let (sx, sy) = vp.world_to_screen(wx, wy);
    if sx < -CULL_MARGIN_PX
        || sy < -CULL_MARGIN_PX
        || sx > canvas_w + CULL_MARGIN_PX
        || sy > canvas_h + CULL_MARGIN_PX
    {
        return;
    }

    ctx.begin_path();
    ctx.arc(sx, sy, circle.radius, 0.0, std::f64::consts::TAU).ok();
    ctx.set_fill_style_str(circle.color);
    ctx.fill();
    ctx.set_line_width(circle.stroke_width);
    ctx.set_stroke_style_str(circle.stroke_color);
    ctx.stroke();
}
