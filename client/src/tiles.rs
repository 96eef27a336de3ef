use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use js_sys::Reflect;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

use crate::config::{MAX_TILE_ZOOM, TILE_FETCH_CONCURRENCY, TILE_URL_TEMPLATE};
use crate::projection::WORLD_SIZE;
use crate::viewport::Viewport;

/// Decoded tiles kept around; oldest are evicted beyond this.
const MAX_LOADED_TILES: usize = 128;
/// Hard cap on tiles requested for a single viewport.
const MAX_TILES_PER_VIEW: usize = 64;

const ONLOAD_HANDLE_KEY: &str = "__plumeTileOnload";
const ONERROR_HANDLE_KEY: &str = "__plumeTileOnerror";

/// Slippy tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    pub fn url(&self) -> String {
        TILE_URL_TEMPLATE
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }

    /// World-space box `(min_wx, min_wy, max_wx, max_wy)` this tile covers.
    pub fn world_bounds(&self) -> (f64, f64, f64, f64) {
        let size = WORLD_SIZE / (1u32 << self.z) as f64;
        let min_wx = self.x as f64 * size;
        let min_wy = self.y as f64 * size;
        (min_wx, min_wy, min_wx + size, min_wy + size)
    }
}

/// Slippy zoom level at which tiles render near their native 256px.
pub fn zoom_for_scale(scale: f64) -> u8 {
    if scale <= 1.0 {
        return 0;
    }
    (scale.log2().round() as i32).clamp(0, MAX_TILE_ZOOM as i32) as u8
}

/// Tiles covering the viewport at its natural zoom level, row-major.
pub fn visible_tiles(vp: &Viewport, canvas_w: f64, canvas_h: f64) -> Vec<TileId> {
    let z = zoom_for_scale(vp.scale);
    let tiles_per_axis = 1u32 << z;
    let size = WORLD_SIZE / tiles_per_axis as f64;

    let (min_wx, min_wy, max_wx, max_wy) = vp.visible_world_bounds(canvas_w, canvas_h);
    let first = |w: f64| -> u32 { ((w / size).floor().max(0.0) as u32).min(tiles_per_axis - 1) };
    let last = |w: f64| -> u32 {
        (((w / size).ceil() - 1.0).max(0.0) as u32).min(tiles_per_axis - 1)
    };
    let (x0, x1) = (first(min_wx), last(max_wx));
    let (y0, y1) = (first(min_wy), last(max_wy));

    let mut out = Vec::new();
    'rows: for y in y0..=y1 {
        for x in x0..=x1 {
            if out.len() >= MAX_TILES_PER_VIEW {
                break 'rows;
            }
            out.push(TileId { z, x, y });
        }
    }
    out
}

/// A loaded basemap tile image.
#[derive(Clone)]
pub struct LoadedTile {
    pub id: TileId,
    pub image: HtmlImageElement,
}

/// Fetches tile images with bounded concurrency and upserts them into the
/// `tiles` signal, keyed and ordered by tile id so low-zoom tiles draw
/// beneath their higher-zoom replacements. Tile images are JS objects, so
/// the signal uses local (same-thread) storage.
pub struct TileLoader {
    tiles: RwSignal<Vec<LoadedTile>, LocalStorage>,
    queue: Rc<RefCell<VecDeque<TileId>>>,
    pending: Rc<RefCell<HashSet<TileId>>>,
    in_flight: Rc<Cell<usize>>,
}

impl TileLoader {
    pub fn new(tiles: RwSignal<Vec<LoadedTile>, LocalStorage>) -> Self {
        Self {
            tiles,
            queue: Rc::new(RefCell::new(VecDeque::new())),
            pending: Rc::new(RefCell::new(HashSet::new())),
            in_flight: Rc::new(Cell::new(0)),
        }
    }

    /// Queue every wanted tile that is neither loaded nor already in flight.
    pub fn request(&self, wanted: &[TileId]) {
        let loaded: HashSet<TileId> = self
            .tiles
            .with_untracked(|tiles| tiles.iter().map(|tile| tile.id).collect());
        {
            let mut queue = self.queue.borrow_mut();
            let mut pending = self.pending.borrow_mut();
            for &id in wanted {
                if !loaded.contains(&id) && pending.insert(id) {
                    queue.push_back(id);
                }
            }
        }
        pump(
            self.tiles,
            self.queue.clone(),
            self.pending.clone(),
            self.in_flight.clone(),
        );
    }
}

fn pump(
    tiles: RwSignal<Vec<LoadedTile>, LocalStorage>,
    queue: Rc<RefCell<VecDeque<TileId>>>,
    pending: Rc<RefCell<HashSet<TileId>>>,
    in_flight: Rc<Cell<usize>>,
) {
    while in_flight.get() < TILE_FETCH_CONCURRENCY {
        let Some(id) = queue.borrow_mut().pop_front() else {
            break;
        };
        in_flight.set(in_flight.get() + 1);

        let queue_next = queue.clone();
        let pending_next = pending.clone();
        let in_flight_next = in_flight.clone();
        let on_done: Rc<dyn Fn()> = Rc::new(move || {
            in_flight_next.set(in_flight_next.get().saturating_sub(1));
            pump(
                tiles,
                queue_next.clone(),
                pending_next.clone(),
                in_flight_next.clone(),
            );
        });

        load_tile(tiles, id, pending.clone(), on_done);
    }
}

fn load_tile(
    tiles: RwSignal<Vec<LoadedTile>, LocalStorage>,
    id: TileId,
    pending: Rc<RefCell<HashSet<TileId>>>,
    on_done: Rc<dyn Fn()>,
) {
    let img = match HtmlImageElement::new() {
        Ok(img) => img,
        Err(_) => {
            pending.borrow_mut().remove(&id);
            on_done();
            return;
        }
    };

    let img_for_load = img.clone();
    let pending_for_load = pending.clone();
    let on_done_load = on_done.clone();
    let onload = Closure::<dyn FnMut()>::new(move || {
        clear_image_handlers(&img_for_load);
        pending_for_load.borrow_mut().remove(&id);
        upsert_tile(
            tiles,
            LoadedTile {
                id,
                image: img_for_load.clone(),
            },
        );
        on_done_load();
    });

    let img_for_error = img.clone();
    let onerror = Closure::<dyn FnMut()>::new(move || {
        clear_image_handlers(&img_for_error);
        pending.borrow_mut().remove(&id);
        on_done();
    });

    let onload_js = onload.into_js_value();
    let onerror_js = onerror.into_js_value();
    img.set_onload(Some(onload_js.unchecked_ref()));
    img.set_onerror(Some(onerror_js.unchecked_ref()));
    let _ = Reflect::set(
        img.as_ref(),
        &JsValue::from_str(ONLOAD_HANDLE_KEY),
        &onload_js,
    );
    let _ = Reflect::set(
        img.as_ref(),
        &JsValue::from_str(ONERROR_HANDLE_KEY),
        &onerror_js,
    );
    img.set_cross_origin(Some("anonymous"));
    img.set_src(&id.url());
}

fn clear_image_handlers(img: &HtmlImageElement) {
    img.set_onload(None);
    img.set_onerror(None);
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONLOAD_HANDLE_KEY));
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONERROR_HANDLE_KEY));
}

fn upsert_tile(tiles: RwSignal<Vec<LoadedTile>, LocalStorage>, incoming: LoadedTile) {
    tiles.update(|loaded| {
        if let Some(existing) = loaded.iter_mut().find(|tile| tile.id == incoming.id) {
            *existing = incoming;
            return;
        }
        loaded.push(incoming);
        loaded.sort_by_key(|tile| tile.id);
        if loaded.len() > MAX_LOADED_TILES {
            let overflow = loaded.len() - MAX_LOADED_TILES;
            loaded.drain(0..overflow);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_tracks_viewport_scale() {
        assert_eq!(zoom_for_scale(0.5), 0);
        assert_eq!(zoom_for_scale(1.0), 0);
        assert_eq!(zoom_for_scale(4.0), 2);
        assert_eq!(zoom_for_scale(1.0e9), MAX_TILE_ZOOM);
    }

    #[test]
    fn tile_url_substitution() {
        let id = TileId { z: 3, x: 5, y: 2 };
        assert_eq!(id.url(), "https://tile.openstreetmap.org/3/5/2.png");
    }

    #[test]
    fn tile_world_bounds_partition_the_world() {
        let id = TileId { z: 1, x: 1, y: 0 };
        assert_eq!(id.world_bounds(), (128.0, 0.0, 256.0, 128.0));
    }

    #[test]
    fn whole_world_is_one_tile_at_zoom_zero() {
        let vp = Viewport::default();
        let tiles = visible_tiles(&vp, 256.0, 256.0);
        assert_eq!(tiles, vec![TileId { z: 0, x: 0, y: 0 }]);
    }

    #[test]
    fn visible_tiles_cover_the_viewport() {
        // Scale 4 = zoom 2: 4x4 tiles of 64 world units each.
        let vp = Viewport {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 4.0,
        };
        let tiles = visible_tiles(&vp, 512.0, 512.0);
        // 512px / (64 world units * 4 px-per-unit) = 2 tiles per axis.
        assert_eq!(tiles.len(), 4);
        assert!(tiles.contains(&TileId { z: 2, x: 0, y: 0 }));
        assert!(tiles.contains(&TileId { z: 2, x: 1, y: 1 }));
    }

    #[test]
    fn visible_tiles_clamp_at_world_edges() {
        let vp = Viewport {
            offset_x: 500.0,
            offset_y: 500.0,
            scale: 1.0,
        };
        // Viewport is panned past the world's north-west corner.
        let tiles = visible_tiles(&vp, 256.0, 256.0);
        assert_eq!(tiles, vec![TileId { z: 0, x: 0, y: 0 }]);
    }
}
