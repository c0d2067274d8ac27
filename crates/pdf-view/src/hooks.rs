//! Lifecycle hooks a host can use to observe or veto view transitions.

use crate::types::RenderReport;

/// Capability consulted by the view at each lifecycle step.
///
/// Every method defaults to allowing the step and doing nothing else.
/// Returning `false` from a `before_*` method vetoes the step before any
/// view state changes.
pub trait ViewHooks: Send {
    /// Called before moving back from `current_page`
    fn before_previous(&mut self, _current_page: u32) -> bool {
        true
    }

    /// Called before moving forward from `current_page`
    fn before_next(&mut self, _current_page: u32) -> bool {
        true
    }

    /// Called right before a render of `page` starts
    fn before_render(&mut self, _page: u32) -> bool {
        true
    }

    /// Called once per finished render, including failed ones
    fn after_render(&mut self, _report: &RenderReport) {}

    fn after_load(&mut self, _page_count: u32) {}
}

/// Allows everything
#[derive(Debug, Clone, Copy, Default)]
pub struct Permissive;

impl ViewHooks for Permissive {}

impl<H: ViewHooks + ?Sized> ViewHooks for Box<H> {
    fn before_previous(&mut self, current_page: u32) -> bool {
        (**self).before_previous(current_page)
    }

    fn before_next(&mut self, current_page: u32) -> bool {
        (**self).before_next(current_page)
    }

    fn before_render(&mut self, page: u32) -> bool {
        (**self).before_render(page)
    }

    fn after_render(&mut self, report: &RenderReport) {
        (**self).after_render(report)
    }

    fn after_load(&mut self, page_count: u32) {
        (**self).after_load(page_count)
    }
}

type Gate = Box<dyn FnMut(u32) -> bool + Send>;

/// Hooks assembled from closures; unset hooks are permissive.
///
/// ```
/// use pdf_view::{HookSet, ViewHooks};
///
/// let mut hooks = HookSet::new().on_before_render(|page| page != 3);
/// assert!(hooks.before_render(2));
/// assert!(!hooks.before_render(3));
/// ```
#[derive(Default)]
pub struct HookSet {
    before_previous: Option<Gate>,
    before_next: Option<Gate>,
    before_render: Option<Gate>,
    after_render: Option<Box<dyn FnMut(&RenderReport) + Send>>,
    after_load: Option<Box<dyn FnMut(u32) + Send>>,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_before_previous(mut self, f: impl FnMut(u32) -> bool + Send + 'static) -> Self {
        self.before_previous = Some(Box::new(f));
        self
    }

    pub fn on_before_next(mut self, f: impl FnMut(u32) -> bool + Send + 'static) -> Self {
        self.before_next = Some(Box::new(f));
        self
    }

    pub fn on_before_render(mut self, f: impl FnMut(u32) -> bool + Send + 'static) -> Self {
        self.before_render = Some(Box::new(f));
        self
    }

    pub fn on_after_render(mut self, f: impl FnMut(&RenderReport) + Send + 'static) -> Self {
        self.after_render = Some(Box::new(f));
        self
    }

    pub fn on_after_load(mut self, f: impl FnMut(u32) + Send + 'static) -> Self {
        self.after_load = Some(Box::new(f));
        self
    }
}

impl ViewHooks for HookSet {
    fn before_previous(&mut self, current_page: u32) -> bool {
        self.before_previous
            .as_mut()
            .is_none_or(|f| f(current_page))
    }

    fn before_next(&mut self, current_page: u32) -> bool {
        self.before_next.as_mut().is_none_or(|f| f(current_page))
    }

    fn before_render(&mut self, page: u32) -> bool {
        self.before_render.as_mut().is_none_or(|f| f(page))
    }

    fn after_render(&mut self, report: &RenderReport) {
        if let Some(f) = self.after_render.as_mut() {
            f(report);
        }
    }

    fn after_load(&mut self, page_count: u32) {
        if let Some(f) = self.after_load.as_mut() {
            f(page_count);
        }
    }
}
