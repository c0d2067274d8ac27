mod worker;

pub use worker::{ViewHandle, spawn_view, view_task};

// Re-export types from the view crate
pub use pdf_view::{FitMode, Size};

/// Commands sent from the host to a view worker
#[derive(Debug, Clone, PartialEq)]
pub enum ViewCommand {
    Previous,
    Next,
    GoTo { page: u32 },
    SetScale { scale: f64 },
    Fit { mode: FitMode },
    /// The container the surface lives in changed size
    Resize { container: Size },
    Close,
}

/// Updates sent from a view worker to the host
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    /// Sent once when the worker starts
    Ready { page: u32, page_count: u32 },
    /// A render of `page` started; the page counter should show it now
    PageChanged { page: u32, page_count: u32 },
    /// A render is in flight; `page` replaced any earlier pending page
    Deferred { page: u32 },
    Vetoed { page: u32 },
    Rendered {
        page: u32,
        scale: f64,
        width: f64,
        height: f64,
    },
    RenderFailed { page: u32, message: String },
    /// A command was rejected before any state changed
    Error { message: String },
    Closed,
}
