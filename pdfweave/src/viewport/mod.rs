//! Incremental viewport renderer.
//!
//! Pages are laid out vertically with a fixed gap and centred
//! horizontally; content wider than the viewport pans through a
//! horizontal scroll offset. Each page owns a [`PageSurface`]: its base geometry, the
//! bitmap last rendered for it (if any) and the scale that bitmap was
//! rendered at. Installing a document only sizes the surfaces; bitmaps
//! arrive lazily as pages approach the visible window. Zooming resizes
//! every surface geometrically first (stretching stale bitmaps) and
//! re-rasterizes afterwards, nearest pages first, so the view never goes
//! blank while the engine catches up.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{PdfWeaveError, Result};
use crate::pipeline::{CancellationToken, SessionCounter, SessionToken};
use crate::raster::{RasterDocument, RasterImage};
use crate::state::SharedState;

/// Geometry and tuning for a viewport.
#[derive(Debug, Clone)]
pub struct ViewportConfig {
    /// Viewport width in css pixels.
    pub width: f32,
    /// Viewport height in css pixels.
    pub height: f32,
    /// Extra margin above and below the viewport that still counts as
    /// visible for rasterization.
    pub prefetch_margin: f32,
    /// Vertical gap between pages.
    pub page_gap: f32,
    /// Scale delta below which an existing bitmap is kept.
    pub scale_tolerance: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 1000.0,
            prefetch_margin: 800.0,
            page_gap: 16.0,
            scale_tolerance: 0.01,
        }
    }
}

/// Per-page render state.
#[derive(Debug, Clone, Default)]
pub struct PageSurface {
    /// Page width at scale 1.0.
    pub base_width: f32,
    /// Page height at scale 1.0.
    pub base_height: f32,
    /// Scale of the bitmap currently held, if any.
    pub rendered_scale: Option<f32>,
    /// Last rendered bitmap. Stays in place through zooms until a
    /// replacement arrives.
    pub image: Option<RasterImage>,
    /// Current on-screen width.
    pub display_width: f32,
    /// Current on-screen height.
    pub display_height: f32,
    /// Token of the render in flight for this surface, if any.
    job: Option<CancellationToken>,
}

/// Anchor captured before a zoom so the same spot stays centred after.
#[derive(Debug, Clone, Copy)]
struct ZoomAnchor {
    page: usize,
    /// Fractional horizontal position of the viewport centre within the
    /// anchor page.
    x_ratio: f32,
    /// Fractional vertical position of the viewport centre within the
    /// anchor page.
    y_ratio: f32,
}

struct Inner {
    document: Option<Arc<dyn RasterDocument>>,
    /// Bumped on every install/clear so settling renders from a previous
    /// document never write into the new surfaces.
    generation: u64,
    surfaces: Vec<PageSurface>,
    scale: f32,
    scroll_top: f32,
    scroll_left: f32,
}

/// Renderer for one scrollable viewport.
#[derive(Clone)]
pub struct ViewportRenderer {
    state: SharedState,
    config: ViewportConfig,
    inner: Arc<Mutex<Inner>>,
    zoom_sessions: SessionCounter,
}

impl ViewportRenderer {
    /// Create a renderer over the given shared state.
    pub fn new(state: SharedState, config: ViewportConfig) -> Self {
        Self {
            state,
            config,
            inner: Arc::new(Mutex::new(Inner {
                document: None,
                generation: 0,
                surfaces: Vec::new(),
                scale: 1.0,
                scroll_top: 0.0,
                scroll_left: 0.0,
            })),
            zoom_sessions: SessionCounter::new(),
        }
    }

    /// Install a document, replacing any previous one.
    ///
    /// Runs the placeholder pass: every surface gets its geometry from
    /// `page_size` and no bitmap. The old document's handle is dropped
    /// here, which releases its engine resources once settling renders
    /// let go of their clones.
    pub fn install_document(&self, document: Arc<dyn RasterDocument>) {
        let mut inner = self.inner.lock();
        let scale = inner.scale;

        let surfaces = (0..document.page_count())
            .map(|i| {
                let (w, h) = document.page_size(i);
                PageSurface {
                    base_width: w,
                    base_height: h,
                    display_width: w * scale,
                    display_height: h * scale,
                    ..Default::default()
                }
            })
            .collect();

        inner.document = Some(document);
        inner.generation += 1;
        inner.surfaces = surfaces;
        inner.scroll_top = 0.0;
        inner.scroll_left = 0.0;
        drop(inner);

        self.zoom_sessions.invalidate();
        self.state.mutate(|s| s.current_page = 0);
        debug!("installed document into viewport");
    }

    /// Drop the current document and all surfaces.
    pub fn clear_document(&self) {
        let mut inner = self.inner.lock();
        inner.document = None;
        inner.generation += 1;
        inner.surfaces.clear();
        inner.scroll_top = 0.0;
        inner.scroll_left = 0.0;
        drop(inner);

        self.zoom_sessions.invalidate();
        self.state.mutate(|s| s.current_page = 0);
    }

    /// Number of pages laid out.
    pub fn page_count(&self) -> usize {
        self.inner.lock().surfaces.len()
    }

    /// Current zoom scale.
    pub fn scale(&self) -> f32 {
        self.inner.lock().scale
    }

    /// Current vertical scroll offset.
    pub fn scroll_top(&self) -> f32 {
        self.inner.lock().scroll_top
    }

    /// Current horizontal scroll offset.
    pub fn scroll_left(&self) -> f32 {
        self.inner.lock().scroll_left
    }

    /// Snapshot of one surface, for drawing.
    pub fn surface(&self, page: usize) -> Option<PageSurface> {
        self.inner.lock().surfaces.get(page).cloned()
    }

    /// Top edge of a page in content coordinates.
    pub fn page_top(&self, page: usize) -> f32 {
        let inner = self.inner.lock();
        page_top_of(&inner.surfaces, page, self.config.page_gap)
    }

    /// Left edge of a page: centred within the laid-out content, which is
    /// at least as wide as the viewport.
    pub fn page_left(&self, page: usize) -> f32 {
        let inner = self.inner.lock();
        page_left_of(&inner.surfaces, page, self.config.width)
    }

    /// Total height of the laid-out content.
    pub fn content_height(&self) -> f32 {
        let inner = self.inner.lock();
        content_height_of(&inner.surfaces, self.config.page_gap)
    }

    /// Total width of the laid-out content: the widest page, or the
    /// viewport width when every page fits.
    pub fn content_width(&self) -> f32 {
        let inner = self.inner.lock();
        content_width_of(&inner.surfaces, self.config.width)
    }

    /// Pages intersecting the visible window plus the prefetch margin,
    /// in layout order.
    pub fn visible_pages(&self) -> Vec<usize> {
        let inner = self.inner.lock();
        let window_top = inner.scroll_top - self.config.prefetch_margin;
        let window_bottom = inner.scroll_top + self.config.height + self.config.prefetch_margin;

        let mut pages = Vec::new();
        let mut top = 0.0f32;
        for (i, surface) in inner.surfaces.iter().enumerate() {
            let bottom = top + surface.display_height;
            if bottom >= window_top && top <= window_bottom {
                pages.push(i);
            }
            if top > window_bottom {
                break;
            }
            top = bottom + self.config.page_gap;
        }
        pages
    }

    /// Whether a page needs (re-)rasterization at the current scale.
    pub fn needs_render(&self, page: usize) -> bool {
        let inner = self.inner.lock();
        let Some(surface) = inner.surfaces.get(page) else {
            return false;
        };
        surface_needs_render(surface, inner.scale, self.config.scale_tolerance)
    }

    /// Rasterize one page at the current scale if its bitmap is missing
    /// or stale.
    ///
    /// Single-flight per surface: a render already in flight for the page
    /// is cancelled before the new one starts. The result is applied only
    /// if the document, the scale and this job are all still current when
    /// the engine settles; otherwise it is discarded quietly.
    ///
    /// Returns whether a new bitmap was installed.
    pub async fn ensure_rendered(&self, page: usize) -> Result<bool> {
        let (document, scale, token, generation) = {
            let mut inner = self.inner.lock();
            let scale = inner.scale;
            let generation = inner.generation;
            let Some(document) = inner.document.clone() else {
                return Ok(false);
            };
            let Some(surface) = inner.surfaces.get_mut(page) else {
                return Ok(false);
            };
            if !surface_needs_render(surface, scale, self.config.scale_tolerance) {
                return Ok(false);
            }
            if let Some(job) = surface.job.take() {
                job.cancel();
            }
            let token = CancellationToken::new();
            surface.job = Some(token.clone());
            (document, scale, token, generation)
        };

        trace!(page, scale, "rendering page");
        let outcome = document.render(page, scale, token.clone()).await;

        let mut inner = self.inner.lock();
        if inner.generation != generation
            || token.is_cancelled()
            || (inner.scale - scale).abs() > self.config.scale_tolerance
        {
            return Ok(false);
        }
        let Some(surface) = inner.surfaces.get_mut(page) else {
            return Ok(false);
        };
        surface.job = None;

        match outcome {
            Ok(image) => {
                surface.image = Some(image);
                surface.rendered_scale = Some(scale);
                Ok(true)
            }
            Err(e) if e.is_cancellation() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Change the zoom scale.
    ///
    /// Captures the centre anchor, resizes every surface geometrically
    /// (bitmaps are left in place to be stretched by the compositor),
    /// restores the scroll position so the anchored spot stays centred,
    /// and starts a new zoom session. Call
    /// [`ViewportRenderer::refresh_after_zoom`] with the returned token
    /// to replace the stretched bitmaps.
    pub fn set_scale(&self, new_scale: f32) -> SessionToken {
        let mut inner = self.inner.lock();
        let anchor = capture_anchor(&inner, &self.config);

        inner.scale = new_scale;
        for surface in &mut inner.surfaces {
            surface.display_width = surface.base_width * new_scale;
            surface.display_height = surface.base_height * new_scale;
        }

        if let Some(anchor) = anchor {
            let top = page_top_of(&inner.surfaces, anchor.page, self.config.page_gap);
            let left = page_left_of(&inner.surfaces, anchor.page, self.config.width);
            let height = inner.surfaces[anchor.page].display_height;
            let width = inner.surfaces[anchor.page].display_width;

            let target_top = top + anchor.y_ratio * height - self.config.height / 2.0;
            inner.scroll_top = clamp_scroll(
                target_top,
                content_height_of(&inner.surfaces, self.config.page_gap),
                self.config.height,
            );

            let target_left = left + anchor.x_ratio * width - self.config.width / 2.0;
            inner.scroll_left = clamp_scroll(
                target_left,
                content_width_of(&inner.surfaces, self.config.width),
                self.config.width,
            );
        }
        drop(inner);

        debug!(scale = new_scale, "zoom applied geometrically");
        self.zoom_sessions.next_token()
    }

    /// Re-rasterize after a zoom: pages in the visible window first, the
    /// rest afterwards. Every step is skipped once the zoom session moves
    /// on, so a newer zoom takes over cleanly mid-refresh.
    pub async fn refresh_after_zoom(&self, token: SessionToken) -> Result<()> {
        let visible = self.visible_pages();
        for &page in &visible {
            if !token.is_current() {
                return Ok(());
            }
            self.ensure_rendered(page).await?;
        }

        let total = self.page_count();
        for page in 0..total {
            if visible.contains(&page) {
                continue;
            }
            if !token.is_current() {
                return Ok(());
            }
            self.ensure_rendered(page).await?;
        }
        Ok(())
    }

    /// Record a scroll position and publish the page now closest to the
    /// viewport centre.
    pub fn handle_scroll(&self, scroll_top: f32, scroll_left: f32) {
        let current = {
            let mut inner = self.inner.lock();
            inner.scroll_top = clamp_scroll(
                scroll_top,
                content_height_of(&inner.surfaces, self.config.page_gap),
                self.config.height,
            );
            inner.scroll_left = clamp_scroll(
                scroll_left,
                content_width_of(&inner.surfaces, self.config.width),
                self.config.width,
            );
            center_closest_page(&inner, &self.config)
        };

        if let Some(page) = current {
            self.state.mutate(|s| {
                if s.current_page != page {
                    s.current_page = page;
                }
            });
        }
    }

    /// Consume a pending navigation request, if any, and jump to it.
    ///
    /// Returns the page jumped to. A second call without a new request is
    /// a no-op, so a later render pass cannot replay an old jump.
    pub fn apply_nav_request(&self) -> Option<usize> {
        let request = self.state.mutate(|s| s.take_nav_request())?;

        let page = {
            let mut inner = self.inner.lock();
            let page = request.page.min(inner.surfaces.len().saturating_sub(1));
            let top = page_top_of(&inner.surfaces, page, self.config.page_gap);
            inner.scroll_top = clamp_scroll(
                top,
                content_height_of(&inner.surfaces, self.config.page_gap),
                self.config.height,
            );
            page
        };

        self.state.mutate(|s| s.current_page = page);
        debug!(page, "jumped to page");
        Some(page)
    }

    /// The page currently closest to the viewport centre.
    pub fn current_page(&self) -> Option<usize> {
        let inner = self.inner.lock();
        center_closest_page(&inner, &self.config)
    }
}

fn surface_needs_render(surface: &PageSurface, scale: f32, tolerance: f32) -> bool {
    match (&surface.image, surface.rendered_scale) {
        (Some(_), Some(rendered)) => (rendered - scale).abs() > tolerance,
        _ => true,
    }
}

fn page_top_of(surfaces: &[PageSurface], page: usize, gap: f32) -> f32 {
    surfaces
        .iter()
        .take(page)
        .map(|s| s.display_height + gap)
        .sum()
}

fn content_height_of(surfaces: &[PageSurface], gap: f32) -> f32 {
    if surfaces.is_empty() {
        return 0.0;
    }
    let heights: f32 = surfaces.iter().map(|s| s.display_height).sum();
    heights + gap * (surfaces.len() - 1) as f32
}

fn content_width_of(surfaces: &[PageSurface], viewport_width: f32) -> f32 {
    if surfaces.is_empty() {
        return 0.0;
    }
    surfaces
        .iter()
        .map(|s| s.display_width)
        .fold(viewport_width, f32::max)
}

fn page_left_of(surfaces: &[PageSurface], page: usize, viewport_width: f32) -> f32 {
    let layout_width = content_width_of(surfaces, viewport_width);
    surfaces
        .get(page)
        .map(|s| ((layout_width - s.display_width) / 2.0).max(0.0))
        .unwrap_or(0.0)
}

fn clamp_scroll(target: f32, content_height: f32, viewport_height: f32) -> f32 {
    let max = (content_height - viewport_height).max(0.0);
    target.clamp(0.0, max)
}

fn capture_anchor(inner: &Inner, config: &ViewportConfig) -> Option<ZoomAnchor> {
    let page = center_closest_page(inner, config)?;
    let top = page_top_of(&inner.surfaces, page, config.page_gap);
    let left = page_left_of(&inner.surfaces, page, config.width);
    let height = inner.surfaces[page].display_height;
    let width = inner.surfaces[page].display_width;

    let center_y = inner.scroll_top + config.height / 2.0;
    let y_ratio = if height > 0.0 {
        ((center_y - top) / height).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let center_x = inner.scroll_left + config.width / 2.0;
    let x_ratio = if width > 0.0 {
        ((center_x - left) / width).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Some(ZoomAnchor {
        page,
        x_ratio,
        y_ratio,
    })
}

fn center_closest_page(inner: &Inner, config: &ViewportConfig) -> Option<usize> {
    if inner.surfaces.is_empty() {
        return None;
    }
    let center = inner.scroll_top + config.height / 2.0;

    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    let mut top = 0.0f32;
    for (i, surface) in inner.surfaces.iter().enumerate() {
        let page_center = top + surface.display_height / 2.0;
        let distance = (page_center - center).abs();
        if distance < best_distance {
            best = i;
            best_distance = distance;
        }
        top += surface.display_height + config.page_gap;
    }
    Some(best)
}
