//! Collaborators the view drives but does not implement: the document
//! decoder/rasterizer and the surface that shows the pixels.

use crate::types::*;
use std::future::Future;

/// Opens documents
pub trait DocumentProvider {
    type Document: DocumentHandle;

    /// Fails with [`ViewError::Load`] when the source is unreachable or corrupt
    fn load(&self, source: &str) -> impl Future<Output = Result<Self::Document>> + Send;
}

/// A decoded document. Immutable once loaded.
pub trait DocumentHandle: Send + Sync + 'static {
    type Page: PageHandle;

    fn page_count(&self) -> u32;

    /// Fails with [`ViewError::PageFetch`] for unknown pages or decode errors
    fn get_page(&self, page: u32) -> impl Future<Output = Result<Self::Page>> + Send;
}

pub trait PageHandle: Send + 'static {
    /// Page size at `scale`
    fn natural_size(&self, scale: f64) -> Size;

    /// Rasterize the page at `viewport`. Fails with [`ViewError::Render`].
    fn render(&self, viewport: Viewport) -> impl Future<Output = Result<RenderedFrame>> + Send;
}

/// 2D target a view draws its current page into.
pub trait Surface: Send {
    /// Replace the shown pixels. `left` positions the page inside its
    /// container. A failure leaves the previous pixels in place.
    fn present(&mut self, frame: &RenderedFrame, left: f64) -> Result<()>;
}
