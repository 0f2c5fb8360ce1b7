//! Aspect-ratio-aware container sizing.

use std::time::Duration;

/// Tunables of the viewer's presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Duration of the layer crossfade.
    pub crossfade: Duration,
    /// Share of the viewport width the container may use.
    pub width_fraction: f64,
    /// Share of the viewport height the container may use.
    pub height_fraction: f64,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            crossfade: Duration::from_millis(650),
            width_fraction: 0.94,
            height_fraction: 0.90,
            max_width: 1600,
            max_height: 1000,
        }
    }
}

/// Size of the surface the viewer renders into, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Computed size of the image container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerSize {
    pub width: u32,
    pub height: u32,
}

/// Fits an image of `natural_width` × `natural_height` into the bounding
/// box allowed by `viewport` and `config`, keeping its aspect ratio.
///
/// The width is tried first; if the resulting height overflows, the
/// height is pinned and the width derived from it. Images with an unknown
/// (zero) dimension get the whole bounding box.
pub fn fit_container(
    natural_width: u32,
    natural_height: u32,
    viewport: Viewport,
    config: &ViewerConfig,
) -> ContainerSize {
    let max_w = (viewport.width as f64 * config.width_fraction).min(config.max_width as f64);
    let max_h = (viewport.height as f64 * config.height_fraction).min(config.max_height as f64);

    if natural_width == 0 || natural_height == 0 {
        return ContainerSize {
            width: max_w.round() as u32,
            height: max_h.round() as u32,
        };
    }

    let ratio = natural_width as f64 / natural_height as f64;
    let mut width = max_w;
    let mut height = (width / ratio).round();
    if height > max_h {
        height = max_h;
        width = (height * ratio).round();
    }

    ContainerSize {
        width: width.round() as u32,
        height: height.round() as u32,
    }
}
