//! World-to-radar coordinate projection.
//!
//! A world position goes through two steps:
//!
//! 1. the map's [`MapTransform`] turns horizontal world units into pixels
//!    of the map's reference radar image;
//! 2. [`Resolution::normalize`] turns those pixels into percentages of
//!    the background actually being served.
//!
//! The vertical world axis is ignored. Nothing is clamped: a position
//! outside the radar image yields a percentage outside `0..=100`.

use glam::{DVec2, DVec3};
use liveradar_types::MapPoint;
use serde::{Deserialize, Serialize};

/// Affine world-to-pixel transform of one map.
///
/// `pos_x`/`pos_y` are the world coordinates of the radar image's top-left
/// corner and `scale` is world units per pixel. World `y` grows upwards
/// while image `y` grows downwards, hence the flipped subtraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapTransform {
    /// World x of the image's left edge.
    pub pos_x: f64,
    /// World y of the image's top edge.
    pub pos_y: f64,
    /// World units per image pixel.
    pub scale: f64,
}

impl MapTransform {
    /// Pixel coordinates equal world coordinates. Used for unknown maps.
    pub const IDENTITY: Self = Self {
        pos_x: 0.0,
        pos_y: 0.0,
        scale: 1.0,
    };

    /// Create a transform.
    pub const fn new(pos_x: f64, pos_y: f64, scale: f64) -> Self {
        Self {
            pos_x,
            pos_y,
            scale,
        }
    }

    /// Map a horizontal world position to reference-image pixels.
    pub fn world_to_pixel(&self, world: DVec2) -> DVec2 {
        let scale = if self.scale.is_normal() { self.scale } else { 1.0 };
        DVec2::new((world.x - self.pos_x) / scale, (self.pos_y - world.y) / scale)
    }
}

impl Default for MapTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Pixel dimensions of the background the percentages refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    /// Resolution used when no background image is available.
    pub const FALLBACK: Self = Self {
        width: 1024,
        height: 1024,
    };

    /// Create a resolution. A zero dimension yields [`Self::FALLBACK`] so
    /// normalization can never divide by zero.
    pub const fn new(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            Self::FALLBACK
        } else {
            Self { width, height }
        }
    }

    /// Width in pixels.
    pub const fn width(self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub const fn height(self) -> u32 {
        self.height
    }

    /// Express a pixel position as percentages of this resolution.
    pub fn normalize(self, pixel: DVec2) -> MapPoint {
        MapPoint {
            x: pixel.x / f64::from(self.width) * 100.0,
            y: pixel.y / f64::from(self.height) * 100.0,
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// Everything needed to project positions for one match.
///
/// Fixed once the map is selected and shared read-only by every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MapProjection {
    map_name: String,
    transform: MapTransform,
    resolution: Resolution,
}

impl MapProjection {
    /// Create a projection context.
    pub fn new(map_name: impl Into<String>, transform: MapTransform, resolution: Resolution) -> Self {
        Self {
            map_name: map_name.into(),
            transform,
            resolution,
        }
    }

    /// The map this context projects for.
    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    /// The world-to-pixel transform.
    pub const fn transform(&self) -> MapTransform {
        self.transform
    }

    /// The background resolution in effect.
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Project a world position to normalized radar coordinates.
    pub fn project(&self, world: DVec3) -> MapPoint {
        let pixel = self.transform.world_to_pixel(world.truncate());
        self.resolution.normalize(pixel)
    }
}
