//! Navigation and fitting on top of the render scheduler.
//!
//! The controller owns the document, the surface and at most one in-flight
//! render future. Navigation and scale changes are synchronous state
//! transitions; the owner drives the in-flight render with
//! [`ViewController::next_completion`] (or [`ViewController::settle`]).

use crate::hooks::ViewHooks;
use crate::options::ViewOptions;
use crate::provider::*;
use crate::scheduler::{Dispatch, RenderScheduler};
use crate::sizer::{self, FitMode};
use crate::types::*;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type RenderTask = Pin<Box<dyn Future<Output = Result<(RenderedFrame, Viewport)>> + Send>>;

struct InFlight {
    request: RenderRequest,
    task: RenderTask,
}

/// A finished render and whatever the drained pending request turned into
#[derive(Debug)]
pub struct Completion {
    pub report: RenderReport,
    /// `Some` when a pending page was waiting behind this render
    pub follow_up: Option<Dispatch>,
}

pub struct ViewController<D: DocumentHandle, S: Surface, H: ViewHooks> {
    document: Arc<D>,
    scheduler: RenderScheduler,
    surface: S,
    hooks: H,
    options: ViewOptions,
    container: Size,
    in_flight: Option<InFlight>,
}

impl<D: DocumentHandle, S: Surface, H: ViewHooks> ViewController<D, S, H> {
    /// Load a document and request its first page
    pub async fn open<P>(
        provider: &P,
        source: &str,
        surface: S,
        container: Size,
        options: ViewOptions,
        hooks: H,
    ) -> Result<Self>
    where
        P: DocumentProvider<Document = D>,
    {
        options.validate()?;
        let document = provider.load(source).await?;
        let mut view = Self::new(document, surface, container, options, hooks)?;
        view.start().await;
        Ok(view)
    }

    /// Wrap an already loaded document. Nothing is rendered until [`start`](Self::start).
    pub fn new(
        document: D,
        surface: S,
        container: Size,
        options: ViewOptions,
        hooks: H,
    ) -> Result<Self> {
        options.validate()?;
        if !container.is_positive() {
            return Err(ViewError::InvalidDimensions(format!(
                "container must be positive, got {}x{}",
                container.width, container.height
            )));
        }
        let scheduler = RenderScheduler::new(document.page_count(), options.initial_scale)?;
        Ok(Self {
            document: Arc::new(document),
            scheduler,
            surface,
            hooks,
            options,
            container,
            in_flight: None,
        })
    }

    /// Announce the load to the hooks and request page 1, auto-fitted if
    /// the options ask for it.
    pub async fn start(&mut self) -> Dispatch {
        self.hooks.after_load(self.scheduler.page_count());

        if self.options.auto_fit {
            match self.fit(FitMode::Auto).await {
                Ok(dispatch) => return dispatch,
                Err(e) => log::warn!(
                    "Auto-fit after load failed, keeping scale {}: {}",
                    self.scheduler.current_scale(),
                    e
                ),
            }
        }

        let page = self.scheduler.current_page();
        self.dispatch(page)
    }

    pub fn current_page(&self) -> u32 {
        self.scheduler.current_page()
    }

    pub fn page_count(&self) -> u32 {
        self.scheduler.page_count()
    }

    pub fn current_scale(&self) -> f64 {
        self.scheduler.current_scale()
    }

    pub fn is_rendering(&self) -> bool {
        self.scheduler.is_rendering()
    }

    pub fn state(&self) -> &ViewState {
        self.scheduler.state()
    }

    pub fn container(&self) -> Size {
        self.container
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn go_to_previous(&mut self) -> Dispatch {
        let current = self.scheduler.current_page();
        if current <= 1 {
            return Dispatch::Unchanged;
        }
        if !self.hooks.before_previous(current) {
            log::debug!("Navigation back from page {current} vetoed");
            return Dispatch::Vetoed { page: current - 1 };
        }
        self.dispatch(current - 1)
    }

    pub fn go_to_next(&mut self) -> Dispatch {
        let current = self.scheduler.current_page();
        if current >= self.scheduler.page_count() {
            return Dispatch::Unchanged;
        }
        if !self.hooks.before_next(current) {
            log::debug!("Navigation forward from page {current} vetoed");
            return Dispatch::Vetoed { page: current + 1 };
        }
        self.dispatch(current + 1)
    }

    pub fn go_to_page(&mut self, page: u32) -> Result<Dispatch> {
        let dispatch = self.scheduler.request_render(page, &mut self.hooks)?;
        self.launch(dispatch);
        Ok(dispatch)
    }

    pub fn set_scale(&mut self, scale: f64) -> Result<Dispatch> {
        let dispatch = self.scheduler.request_scale_change(scale, &mut self.hooks)?;
        self.launch(dispatch);
        Ok(dispatch)
    }

    /// Fit the page about to be shown to the container and re-render at the
    /// new scale. That is the pending page during a render, otherwise the
    /// current one.
    ///
    /// Suspends while the page's natural size is fetched.
    pub async fn fit(&mut self, mode: FitMode) -> Result<Dispatch> {
        let page_number = self
            .scheduler
            .pending_page()
            .unwrap_or(self.scheduler.current_page());
        let page = self.document.get_page(page_number).await?;
        let area = self.options.fit_area(self.container);
        let scale = sizer::fit_scale(mode, area, page.natural_size(1.0))?;
        log::debug!(
            "{:?} fit of page {} into {}x{} gives scale {:.3}",
            mode.resolve(area),
            page_number,
            area.width,
            area.height,
            scale
        );
        self.set_scale(scale)
    }

    /// Record a new container size; refits when `auto_fit` is on
    pub async fn resize(&mut self, container: Size) -> Result<Dispatch> {
        if !container.is_positive() {
            return Err(ViewError::InvalidDimensions(format!(
                "container must be positive, got {}x{}",
                container.width, container.height
            )));
        }
        self.container = container;
        if self.options.auto_fit {
            self.fit(FitMode::Auto).await
        } else {
            Ok(Dispatch::Unchanged)
        }
    }

    /// Wait for the in-flight render and run the completion transition.
    ///
    /// Returns `None` when idle. Dropping the returned future before it
    /// resolves leaves the render in flight, so it can sit in a `select!`.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        let in_flight = self.in_flight.as_mut()?;
        let outcome = in_flight.task.as_mut().await;
        let request = in_flight.request;
        self.in_flight = None;
        Some(self.complete(request, outcome))
    }

    /// Drive renders until the view is idle
    pub async fn settle(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Some(completion) = self.next_completion().await {
            completions.push(completion);
        }
        completions
    }

    fn dispatch(&mut self, page: u32) -> Dispatch {
        let dispatch = self.scheduler.dispatch(page, &mut self.hooks);
        self.launch(dispatch);
        dispatch
    }

    fn launch(&mut self, dispatch: Dispatch) {
        let Dispatch::Started(request) = dispatch else {
            return;
        };

        let document = Arc::clone(&self.document);
        let render = async move {
            let page = document.get_page(request.page).await?;
            let viewport = Viewport::new(page.natural_size(1.0), request.scale);
            let frame = page.render(viewport).await?;
            Ok::<_, ViewError>((frame, viewport))
        };

        let task: RenderTask = match self.options.render_timeout() {
            Some(limit) => Box::pin(async move {
                tokio::time::timeout(limit, render)
                    .await
                    .unwrap_or_else(|_| Err(ViewError::RenderTimeout { page: request.page }))
            }),
            None => Box::pin(render),
        };

        log::debug!("Rendering page {} at scale {:.3}", request.page, request.scale);
        self.in_flight = Some(InFlight { request, task });
    }

    fn complete(
        &mut self,
        request: RenderRequest,
        outcome: Result<(RenderedFrame, Viewport)>,
    ) -> Completion {
        let result = outcome.and_then(|(frame, viewport)| {
            let left = sizer::centered_left(
                self.container.width,
                viewport.width,
                self.options.fit_inset.horizontal,
            );
            self.surface.present(&frame, left).map(|()| viewport)
        });

        match &result {
            Ok(viewport) => log::debug!(
                "Rendered page {} ({:.0}x{:.0})",
                request.page,
                viewport.width,
                viewport.height
            ),
            Err(e) => log::warn!("Render of page {} failed: {}", request.page, e),
        }

        let pending = self.scheduler.finish_render();
        let report = RenderReport { request, result };
        self.hooks.after_render(&report);

        let follow_up = pending.map(|page| self.dispatch(page));
        Completion { report, follow_up }
    }
}
