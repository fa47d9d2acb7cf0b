use std::f64::consts::PI;

use pinmap_shared::models::LatLng;
use pinmap_shared::viewport::Viewport;

/// Edge length of a raster tile in CSS pixels.
pub const TILE_SIZE: f64 = 256.0;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 19.0;

/// Web Mercator stops being useful past this latitude.
const MAX_LATITUDE: f64 = 85.051_128_78;

const TILE_URL: &str = "https://tile.openstreetmap.org";

fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Project a coordinate to absolute world pixels at `zoom`.
pub fn project(at: LatLng, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = at.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (at.long + 180.0) / 360.0 * size;
    let y = (0.5 - ((1.0 + lat.sin()) / (1.0 - lat.sin())).ln() / (4.0 * PI)) * size;
    (x, y)
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64, zoom: f64) -> LatLng {
    let size = world_size(zoom);
    let long = x / size * 360.0 - 180.0;
    let n = PI - 2.0 * PI * y / size;
    let lat = n.sinh().atan().to_degrees();
    LatLng::new(lat, long)
}

/// Position of `at` relative to the top-left corner of the map element.
pub fn to_screen(viewport: &Viewport, at: LatLng) -> (f64, f64) {
    let (cx, cy) = project(
        LatLng::new(viewport.latitude, viewport.longitude),
        viewport.zoom,
    );
    let (x, y) = project(at, viewport.zoom);
    (x - cx + viewport.width / 2.0, y - cy + viewport.height / 2.0)
}

/// Coordinate under a point of the map element.
pub fn from_screen(viewport: &Viewport, sx: f64, sy: f64) -> LatLng {
    let (cx, cy) = project(
        LatLng::new(viewport.latitude, viewport.longitude),
        viewport.zoom,
    );
    unproject(
        cx + sx - viewport.width / 2.0,
        cy + sy - viewport.height / 2.0,
        viewport.zoom,
    )
}

/// New map center after the content was dragged by `(dx, dy)` screen pixels.
pub fn pan_center(viewport: &Viewport, dx: f64, dy: f64) -> LatLng {
    from_screen(
        viewport,
        viewport.width / 2.0 - dx,
        viewport.height / 2.0 - dy,
    )
}

/// One raster tile placed on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub z: u32,
    pub x: u32,
    pub y: u32,
    pub left: f64,
    pub top: f64,
    pub size: f64,
}

impl Tile {
    pub fn url(&self) -> String {
        format!("{}/{}/{}/{}.png", TILE_URL, self.z, self.x, self.y)
    }

    pub fn key(&self) -> String {
        format!("{}-{}-{}-{}", self.z, self.x, self.y, self.left as i64)
    }
}

/// Tiles covering the viewport. Fractional zoom draws the integer level scaled.
pub fn visible_tiles(viewport: &Viewport) -> Vec<Tile> {
    let zoom = viewport.zoom.clamp(0.0, MAX_ZOOM);
    let z = zoom.floor();
    let scale = 2f64.powf(zoom - z);
    let tile_px = TILE_SIZE * scale;
    let tiles_per_axis = 2f64.powf(z) as i64;

    let (cx, cy) = project(LatLng::new(viewport.latitude, viewport.longitude), zoom);
    let origin_x = cx - viewport.width / 2.0;
    let origin_y = cy - viewport.height / 2.0;

    let first_x = (origin_x / tile_px).floor() as i64;
    let last_x = ((origin_x + viewport.width) / tile_px).floor() as i64;
    let first_y = ((origin_y / tile_px).floor() as i64).max(0);
    let last_y = (((origin_y + viewport.height) / tile_px).floor() as i64).min(tiles_per_axis - 1);

    let mut tiles = Vec::new();
    for ty in first_y..=last_y {
        for tx in first_x..=last_x {
            tiles.push(Tile {
                z: z as u32,
                x: tx.rem_euclid(tiles_per_axis) as u32,
                y: ty as u32,
                left: tx as f64 * tile_px - origin_x,
                top: ty as f64 * tile_px - origin_y,
                size: tile_px,
            });
        }
    }
    tiles
}

/// Get container-relative coordinates for a client (page) point using web_sys.
pub fn client_to_container(client_x: f64, client_y: f64, container_id: &str) -> Option<(f64, f64)> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(container_id)?;
    let rect = element.get_bounding_client_rect();
    Some((client_x - rect.left(), client_y - rect.top()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(lat: f64, long: f64, zoom: f64) -> Viewport {
        Viewport {
            latitude: lat,
            longitude: long,
            zoom,
            width: 800.0,
            height: 600.0,
        }
    }

    #[test]
    fn test_project_origin_is_world_center() {
        let (x, y) = project(LatLng::new(0.0, 0.0), 0.0);
        assert!((x - 128.0).abs() < 1e-9);
        assert!((y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_unproject_roundtrip() {
        let at = LatLng::new(37.5326, 127.024612);
        let (x, y) = project(at, 4.0);
        let back = unproject(x, y, 4.0);
        assert!((back.lat - at.lat).abs() < 1e-9);
        assert!((back.long - at.long).abs() < 1e-9);
    }

    #[test]
    fn test_center_maps_to_middle_of_screen() {
        let v = viewport(10.0, 20.0, 5.0);
        let (sx, sy) = to_screen(&v, LatLng::new(10.0, 20.0));
        assert!((sx - 400.0).abs() < 1e-6);
        assert!((sy - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_screen_inverts_to_screen() {
        let v = viewport(10.0, 20.0, 5.0);
        let at = LatLng::new(12.0, 18.5);
        let (sx, sy) = to_screen(&v, at);
        let back = from_screen(&v, sx, sy);
        assert!((back.lat - at.lat).abs() < 1e-9);
        assert!((back.long - at.long).abs() < 1e-9);
    }

    #[test]
    fn test_north_is_up_east_is_right() {
        let v = viewport(0.0, 0.0, 3.0);
        let (_, north_y) = to_screen(&v, LatLng::new(10.0, 0.0));
        let (east_x, _) = to_screen(&v, LatLng::new(0.0, 10.0));
        assert!(north_y < 300.0);
        assert!(east_x > 400.0);
    }

    #[test]
    fn test_pan_center_moves_opposite_to_drag() {
        let v = viewport(0.0, 0.0, 3.0);
        // Dragging the content to the right reveals what lies to the west.
        let center = pan_center(&v, 100.0, 0.0);
        assert!(center.long < 0.0);
        assert!(center.lat.abs() < 1e-9);
        let unmoved = pan_center(&v, 0.0, 0.0);
        assert!(unmoved.long.abs() < 1e-9);
    }

    #[test]
    fn test_visible_tiles_cover_viewport() {
        let v = viewport(37.5, 127.0, 4.0);
        let tiles = visible_tiles(&v);
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|t| t.z == 4 && t.x < 16 && t.y < 16));
        let min_left = tiles.iter().map(|t| t.left).fold(f64::INFINITY, f64::min);
        let max_right = tiles.iter().map(|t| t.left + t.size).fold(f64::NEG_INFINITY, f64::max);
        assert!(min_left <= 0.0);
        assert!(max_right >= 800.0);
    }

    #[test]
    fn test_visible_tiles_fractional_zoom_scales() {
        let v = viewport(0.0, 0.0, 2.5);
        let tiles = visible_tiles(&v);
        assert!(tiles.iter().all(|t| t.z == 2));
        assert!((tiles[0].size - TILE_SIZE * 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_visible_tiles_wrap_longitude() {
        let v = viewport(0.0, 179.0, 1.0);
        let tiles = visible_tiles(&v);
        assert!(tiles.iter().all(|t| t.x < 2));
    }

    #[test]
    fn test_tile_url() {
        let tile = Tile {
            z: 3,
            x: 6,
            y: 2,
            left: 0.0,
            top: 0.0,
            size: 256.0,
        };
        assert_eq!(tile.url(), "https://tile.openstreetmap.org/3/6/2.png");
    }
}
