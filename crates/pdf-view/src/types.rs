use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("Failed to load document: {0}")]
    Load(String),
    #[error("Failed to fetch page {page}: {reason}")]
    PageFetch { page: u32, reason: String },
    #[error("Failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },
    #[error("Rendering page {page} timed out")]
    RenderTimeout { page: u32 },
    #[error("Page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("Invalid scale: {0}")]
    InvalidScale(f64),
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
    #[error("Document has no pages")]
    NoPages,
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ViewError>;

/// Width and height in CSS-style pixels (points at scale 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions are finite and strictly positive
    pub fn is_positive(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn scaled(self, scale: f64) -> Self {
        Self {
            width: self.width * scale,
            height: self.height * scale,
        }
    }
}

/// Geometry of one page at one scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

impl Viewport {
    /// Build the viewport for a page whose size at scale 1.0 is `natural`
    pub fn new(natural: Size, scale: f64) -> Self {
        let size = natural.scaled(scale);
        Self {
            width: size.width,
            height: size.height,
            scale,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// A page render the scheduler has decided to start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub page: u32,
    pub scale: f64,
}

/// Pixels produced by a page render, ready to be shown on a surface
#[derive(Clone)]
pub struct RenderedFrame {
    pub width: u32,
    pub height: u32,
    pub rgba_data: Vec<u8>,
}

impl std::fmt::Debug for RenderedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba_data.len())
            .finish()
    }
}

/// Outcome of one finished render, successful or not
#[derive(Debug)]
pub struct RenderReport {
    pub request: RenderRequest,
    /// The viewport the page was drawn at, or why it was not drawn
    pub result: Result<Viewport>,
}

impl RenderReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-view state owned by the render scheduler.
///
/// `current_page` and `current_scale` are what the host shows; the in-flight
/// flag and the pending slot are only ever changed by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub(crate) current_page: u32,
    pub(crate) current_scale: f64,
    pub(crate) render_in_flight: bool,
    pub(crate) pending_page: Option<u32>,
}

impl ViewState {
    pub(crate) fn new(initial_scale: f64) -> Self {
        Self {
            current_page: 1,
            current_scale: initial_scale,
            render_in_flight: false,
            pending_page: None,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn current_scale(&self) -> f64 {
        self.current_scale
    }

    pub fn is_rendering(&self) -> bool {
        self.render_in_flight
    }

    pub fn pending_page(&self) -> Option<u32> {
        self.pending_page
    }
}
