//! Map metadata: projection transforms and radar backgrounds.
//!
//! A [`MapCatalog`] answers two questions for a map name: how to turn
//! world coordinates into radar pixels, and which image to draw them on.
//! Either answer may be missing. [`resolve_map`] turns the answers into
//! a [`ResolvedMap`] and fills every gap with a documented fallback, so a
//! lookup miss never stops the pipeline:
//!
//! | Missing | Fallback |
//! |---------|----------|
//! | transform | [`MapTransform::IDENTITY`] |
//! | background | generated placeholder at [`Resolution::FALLBACK`] |

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
use tracing::{info, warn};

use crate::ingest::{IngestErrorKind, Recovery};
use crate::projection::{MapProjection, MapTransform, Resolution};

/// Background colour of the generated placeholder radar.
const PLACEHOLDER_RGBA: [u8; 4] = [22, 27, 34, 255];

/// Projection transforms of the active-duty maps.
const BUILTIN_TRANSFORMS: &[(&str, MapTransform)] = &[
    ("de_ancient", MapTransform::new(-2953.0, 2164.0, 5.0)),
    ("de_anubis", MapTransform::new(-2796.0, 3328.0, 5.22)),
    ("de_dust2", MapTransform::new(-2476.0, 3239.0, 4.4)),
    ("de_inferno", MapTransform::new(-2087.0, 3870.0, 4.9)),
    ("de_mirage", MapTransform::new(-3230.0, 1713.0, 5.0)),
    ("de_nuke", MapTransform::new(-3453.0, 2887.0, 7.0)),
    ("de_overpass", MapTransform::new(-4831.0, 1781.0, 5.2)),
    ("de_train", MapTransform::new(-2308.0, 2078.0, 4.082_077)),
    ("de_vertigo", MapTransform::new(-3168.0, 1762.0, 4.0)),
];

/// Look up a built-in transform by map name.
pub fn builtin_transform(map_name: &str) -> Option<MapTransform> {
    BUILTIN_TRANSFORMS
        .iter()
        .find(|(name, _)| *name == map_name)
        .map(|(_, t)| *t)
}

/// Errors that can occur while loading a background image.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// Reading the image file failed.
    #[error("failed to read image {path}: {source}")]
    Io {
        /// The image path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Decoding or encoding the image failed.
    #[error("image error: {source}")]
    Image {
        /// The underlying image error.
        #[from]
        source: image::ImageError,
    },
}

/// A radar background, always PNG-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Background {
    png: Arc<[u8]>,
    resolution: Resolution,
}

impl Background {
    /// Build a background from encoded image bytes.
    ///
    /// PNG input is kept as-is; any other supported format is decoded
    /// and re-encoded as PNG.
    pub fn from_image_bytes(bytes: Vec<u8>) -> Result<Self, MapError> {
        let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| MapError::Image {
                source: image::ImageError::IoError(e),
            })?;
        if reader.format() == Some(ImageFormat::Png) {
            let (width, height) = reader.into_dimensions()?;
            return Ok(Self {
                png: bytes.into(),
                resolution: Resolution::new(width, height),
            });
        }
        let decoded = reader.decode()?;
        Self::encode(&decoded)
    }

    /// Load a background from an image file.
    pub fn from_path(path: &Path) -> Result<Self, MapError> {
        let bytes = std::fs::read(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_image_bytes(bytes)
    }

    /// A plain dark square at [`Resolution::FALLBACK`].
    pub fn placeholder() -> Result<Self, MapError> {
        let res = Resolution::FALLBACK;
        let image = RgbaImage::from_pixel(res.width(), res.height(), Rgba(PLACEHOLDER_RGBA));
        Self::encode(&DynamicImage::ImageRgba8(image))
    }

    fn encode(image: &DynamicImage) -> Result<Self, MapError> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(Self {
            png: png.into(),
            resolution: Resolution::new(image.width(), image.height()),
        })
    }

    /// The PNG bytes served to clients.
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    /// Pixel dimensions of the image.
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }
}

/// Source of per-map metadata.
pub trait MapCatalog {
    /// The world-to-pixel transform for `map_name`, if known.
    fn transform(&self, map_name: &str) -> Option<MapTransform>;

    /// The radar background for `map_name`, if one is available.
    fn background(&self, map_name: &str) -> Result<Option<Background>, MapError>;
}

/// Catalog backed by the built-in transform table and local image files.
///
/// Transforms: configured overrides first, then the built-in table.
/// Backgrounds: the custom image if set, else `<radar_dir>/<map>.png`.
#[derive(Debug, Clone, Default)]
pub struct LocalMapCatalog {
    overrides: BTreeMap<String, MapTransform>,
    radar_dir: Option<PathBuf>,
    custom_image: Option<PathBuf>,
}

impl LocalMapCatalog {
    /// Create a catalog with no overrides and no image sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace transforms.
    #[must_use]
    pub fn with_overrides(mut self, overrides: BTreeMap<String, MapTransform>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    /// Look for `<map>.png` radar images in `dir`.
    #[must_use]
    pub fn with_radar_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.radar_dir = dir;
        self
    }

    /// Use this image for every map.
    #[must_use]
    pub fn with_custom_image(mut self, path: Option<PathBuf>) -> Self {
        self.custom_image = path;
        self
    }
}

impl MapCatalog for LocalMapCatalog {
    fn transform(&self, map_name: &str) -> Option<MapTransform> {
        self.overrides
            .get(map_name)
            .copied()
            .or_else(|| builtin_transform(map_name))
    }

    fn background(&self, map_name: &str) -> Result<Option<Background>, MapError> {
        if let Some(path) = &self.custom_image {
            return Background::from_path(path).map(Some);
        }
        let Some(dir) = &self.radar_dir else {
            return Ok(None);
        };
        let path = dir.join(format!("{map_name}.png"));
        if !path.is_file() {
            return Ok(None);
        }
        Background::from_path(&path).map(Some)
    }
}

/// A map with every lookup gap filled.
#[derive(Debug, Clone)]
pub struct ResolvedMap {
    /// Projection context for the ingestion loop.
    pub projection: MapProjection,
    /// Background served to clients; its resolution is the projection's.
    pub background: Background,
    /// Whether the transform came from the catalog.
    pub transform_known: bool,
    /// Whether the background came from the catalog.
    pub background_known: bool,
}

/// Resolve `map_name` through `catalog`, degrading to fallbacks on misses.
///
/// Every catalog error is a [`IngestErrorKind::LookupMiss`] and is
/// handled as its [`Recovery`] says. Fails only if the placeholder image
/// itself cannot be encoded.
pub fn resolve_map(catalog: &dyn MapCatalog, map_name: &str) -> Result<ResolvedMap, MapError> {
    let transform = catalog.transform(map_name);
    if transform.is_none() {
        warn!(
            map = map_name,
            kind = ?IngestErrorKind::LookupMiss,
            "Unknown map, using identity projection"
        );
    }

    let background = match catalog.background(map_name) {
        Ok(found) => found,
        Err(e) if e.kind().recovery() == Recovery::Degrade => {
            warn!(
                map = map_name,
                kind = ?e.kind(),
                error = %e,
                "Radar image unusable, using placeholder"
            );
            None
        }
        Err(e) => return Err(e),
    };
    let background_known = background.is_some();
    let background = match background {
        Some(bg) => bg,
        None => {
            info!(map = map_name, "No radar image, serving placeholder background");
            Background::placeholder()?
        }
    };

    let projection = MapProjection::new(
        map_name,
        transform.unwrap_or(MapTransform::IDENTITY),
        background.resolution(),
    );
    info!(
        map = map_name,
        width = background.resolution().width(),
        height = background.resolution().height(),
        "Map resolved"
    );

    Ok(ResolvedMap {
        projection,
        background,
        transform_known: transform.is_some(),
        background_known,
    })
}
