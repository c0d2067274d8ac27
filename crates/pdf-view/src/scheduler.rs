//! Single-flight render scheduling.
//!
//! At most one render runs per view. Requests that arrive while a render is
//! in flight overwrite a single pending slot, so only the newest one is ever
//! rendered once the current render finishes.

use crate::hooks::ViewHooks;
use crate::types::*;

/// What happened to a render request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatch {
    /// The view was idle and this render must now be started
    Started(RenderRequest),
    /// A render is in flight; `page` is now the pending target
    Deferred { page: u32 },
    /// A hook refused the step; nothing changed
    Vetoed { page: u32 },
    /// Nothing to do (boundary page)
    Unchanged,
}

impl Dispatch {
    pub fn started(&self) -> Option<RenderRequest> {
        match self {
            Dispatch::Started(request) => Some(*request),
            _ => None,
        }
    }
}

/// State machine behind a document view: `Idle` or `Rendering`.
///
/// The scheduler never runs renders itself. `Dispatch::Started` tells the
/// caller to begin one, and the caller reports back with [`finish_render`]
/// whether it succeeded or failed.
///
/// [`finish_render`]: RenderScheduler::finish_render
#[derive(Debug, Clone)]
pub struct RenderScheduler {
    state: ViewState,
    page_count: u32,
}

impl RenderScheduler {
    pub fn new(page_count: u32, initial_scale: f64) -> Result<Self> {
        if page_count == 0 {
            return Err(ViewError::NoPages);
        }
        check_scale(initial_scale)?;
        Ok(Self {
            state: ViewState::new(initial_scale),
            page_count,
        })
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn current_page(&self) -> u32 {
        self.state.current_page
    }

    pub fn current_scale(&self) -> f64 {
        self.state.current_scale
    }

    pub fn is_rendering(&self) -> bool {
        self.state.render_in_flight
    }

    pub fn pending_page(&self) -> Option<u32> {
        self.state.pending_page
    }

    /// Ask for `page` to be shown at the current scale.
    ///
    /// Out-of-range pages are rejected without touching any state.
    pub fn request_render<H: ViewHooks + ?Sized>(
        &mut self,
        page: u32,
        hooks: &mut H,
    ) -> Result<Dispatch> {
        self.check_page(page)?;
        Ok(self.dispatch(page, hooks))
    }

    /// Change the scale and re-render the current page at it.
    ///
    /// While idle a `before_render` veto leaves the old scale in place. While a
    /// render is in flight the new scale is recorded right away and the
    /// pending page (or the current page when nothing is pending) is queued
    /// again, so a navigation already waiting is kept. If `before_render`
    /// later vetoes that drained render, `current_scale` stays at a scale no
    /// page was drawn at.
    pub fn request_scale_change<H: ViewHooks + ?Sized>(
        &mut self,
        scale: f64,
        hooks: &mut H,
    ) -> Result<Dispatch> {
        check_scale(scale)?;
        if self.state.render_in_flight {
            let page = self.state.pending_page.unwrap_or(self.state.current_page);
            self.state.current_scale = scale;
            return Ok(self.defer(page));
        }
        let page = self.state.current_page;
        if !hooks.before_render(page) {
            log::debug!("Scale change to {scale} vetoed for page {page}");
            return Ok(Dispatch::Vetoed { page });
        }
        self.state.current_scale = scale;
        Ok(Dispatch::Started(self.start(page)))
    }

    /// Completion transition, run after every render whether it failed or not.
    ///
    /// Clears the in-flight flag and hands back the pending page, if any. The
    /// caller passes that page to [`dispatch`](Self::dispatch) right away.
    pub fn finish_render(&mut self) -> Option<u32> {
        self.state.render_in_flight = false;
        let pending = self.state.pending_page.take();
        if let Some(page) = pending {
            log::debug!("Draining pending render of page {page}");
        }
        pending
    }

    /// Route an already validated page through the in-flight discipline.
    pub(crate) fn dispatch<H: ViewHooks + ?Sized>(&mut self, page: u32, hooks: &mut H) -> Dispatch {
        if self.state.render_in_flight {
            return self.defer(page);
        }
        if !hooks.before_render(page) {
            log::debug!("Render of page {page} vetoed");
            return Dispatch::Vetoed { page };
        }
        Dispatch::Started(self.start(page))
    }

    fn defer(&mut self, page: u32) -> Dispatch {
        if let Some(superseded) = self.state.pending_page.replace(page) {
            log::debug!("Pending render of page {superseded} superseded by page {page}");
        } else {
            log::debug!("Render in flight, page {page} is now pending");
        }
        Dispatch::Deferred { page }
    }

    fn start(&mut self, page: u32) -> RenderRequest {
        self.state.render_in_flight = true;
        self.state.current_page = page;
        RenderRequest {
            page,
            scale: self.state.current_scale,
        }
    }

    fn check_page(&self, page: u32) -> Result<()> {
        if (1..=self.page_count).contains(&page) {
            Ok(())
        } else {
            Err(ViewError::PageOutOfRange {
                page,
                page_count: self.page_count,
            })
        }
    }
}

pub(crate) fn check_scale(scale: f64) -> Result<()> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(ViewError::InvalidScale(scale))
    }
}
