//! Placement transform: UI pixel-space to PDF point-space
//!
//! The signature overlay is positioned by the user in on-screen pixels,
//! relative to the top-left corner of the page container. PDF pages use
//! points (1/72 inch) with a bottom-left origin. This module converts one
//! into the other using the actually-rendered page surface dimensions,
//! falling back to a viewport-derived estimate when no live measurement
//! was taken.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base rendered width of the signature overlay, in pixels, before the
/// user-adjustable scale factor is applied.
pub const SIGNATURE_BASE_WIDTH: f64 = 150.0;

/// Viewport widths below this are laid out as mobile (no sidebar).
const MOBILE_BREAKPOINT: f64 = 1024.0;

/// A point in UI pixel-space (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UiPoint {
    pub x: f64,
    pub y: f64,
}

/// A size in UI pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UiSize {
    pub width: f64,
    pub height: f64,
}

/// A point in PDF point-space (bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PdfPoint {
    pub x: f64,
    pub y: f64,
}

/// A size in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PdfSize {
    pub width: f64,
    pub height: f64,
}

/// True page dimensions in points, read from the opened document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// Measured geometry of the rendered page surface.
///
/// `width`/`height` are the live rendered dimensions of the page canvas;
/// `offset_x`/`offset_y` locate the canvas top-left corner relative to the
/// container origin that [`UiPoint`] positions are expressed in (non-zero
/// when the surface has padding or borders inside its parent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasGeometry {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
}

/// Source of rendered-surface measurements.
///
/// In the browser this is a live DOM read; here it is injected so the
/// transform is testable with synthetic inputs. `canvas()` returns `None`
/// when the page surface was not rendered at calculation time, in which
/// case the transform degrades to an estimate derived from
/// `viewport_width()`.
pub trait ViewportGeometry {
    /// Live canvas box, if the rendering surface is present.
    fn canvas(&self) -> Option<CanvasGeometry>;

    /// Overall viewport width, used only for the fallback estimate.
    fn viewport_width(&self) -> Option<f64>;
}

/// Computed placement in PDF point-space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub position: PdfPoint,
    pub size: PdfSize,
    /// True when the displayed width was estimated rather than measured.
    pub estimated: bool,
}

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("rendering surface absent and no fallback viewport width configured")]
    Unavailable,
    #[error("displayed canvas width must be positive, got {0}")]
    InvalidCanvasWidth(f64),
}

/// Estimate the displayed page width when the rendering surface could not
/// be measured. Mirrors the on-screen layout: mobile layouts keep 40px of
/// padding and cap the page at 800px, desktop layouts reserve 500px for
/// the sidebar and cap at 1000px. The zoom factor scales the result, as it
/// would scale the live canvas.
fn estimate_displayed_width(viewport_width: f64, zoom: f64) -> f64 {
    if viewport_width < MOBILE_BREAKPOINT {
        (viewport_width - 40.0).min(800.0) * zoom
    } else {
        (viewport_width - 500.0).min(1000.0) * zoom
    }
}

/// Convert a UI placement into PDF point-space.
///
/// `ui_position` is the overlay's top-left corner in container pixels,
/// `signature_size` its rendered pixel size (base width x scale factor,
/// height from the image aspect ratio). The scale ratio is uniform because
/// the rendered canvas preserves the page's own aspect ratio.
pub fn compute_placement(
    ui_position: UiPoint,
    signature_size: UiSize,
    ui_zoom: f64,
    page: PageSize,
    viewport: &dyn ViewportGeometry,
) -> Result<Placement, GeometryError> {
    let (displayed_width, offset_x, offset_y, estimated) = match viewport.canvas() {
        Some(canvas) => (canvas.width, canvas.offset_x, canvas.offset_y, false),
        None => {
            let viewport_width = viewport.viewport_width().ok_or(GeometryError::Unavailable)?;
            (estimate_displayed_width(viewport_width, ui_zoom), 0.0, 0.0, true)
        }
    };

    if displayed_width <= 0.0 {
        return Err(GeometryError::InvalidCanvasWidth(displayed_width));
    }

    let scale_ratio = page.width / displayed_width;

    let size = PdfSize {
        width: signature_size.width * scale_ratio,
        height: signature_size.height * scale_ratio,
    };

    // UI origin is top-left, PDF origin is bottom-left: flip the y axis and
    // anchor on the signature's bottom edge.
    let position = PdfPoint {
        x: (ui_position.x - offset_x) * scale_ratio,
        y: page.height - (ui_position.y - offset_y) * scale_ratio - size.height,
    };

    Ok(Placement {
        position,
        size,
        estimated,
    })
}

/// Rendered pixel size of the signature overlay: base width times the user
/// scale factor, height following the image's natural aspect ratio.
pub fn displayed_signature_size(natural_width: u32, natural_height: u32, scale: f64) -> UiSize {
    let width = SIGNATURE_BASE_WIDTH * scale;
    let aspect_ratio = if natural_width > 0 {
        natural_height as f64 / natural_width as f64
    } else {
        1.0
    };
    UiSize {
        width,
        height: width * aspect_ratio,
    }
}
