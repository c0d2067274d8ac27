use pdf_view::*;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Page numbers handed to the fake collaborators, in call order
#[derive(Clone, Default)]
struct CallLog(Arc<Mutex<Vec<u32>>>);

impl CallLog {
    fn push(&self, page: u32) {
        self.0.lock().unwrap().push(page);
    }

    fn pages(&self) -> Vec<u32> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct FakeDocument {
    page_count: u32,
    natural: Size,
    fetched: CallLog,
    rendered: CallLog,
    broken_pages: HashSet<u32>,
    failing_renders: HashSet<u32>,
    hanging_renders: HashSet<u32>,
}

impl FakeDocument {
    fn new(page_count: u32) -> Self {
        Self {
            page_count,
            natural: Size::new(300.0, 400.0),
            fetched: CallLog::default(),
            rendered: CallLog::default(),
            broken_pages: HashSet::new(),
            failing_renders: HashSet::new(),
            hanging_renders: HashSet::new(),
        }
    }
}

struct FakePage {
    page: u32,
    natural: Size,
    rendered: CallLog,
    fail: bool,
    hang: bool,
}

impl DocumentHandle for FakeDocument {
    type Page = FakePage;

    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn get_page(&self, page: u32) -> impl Future<Output = Result<FakePage>> + Send {
        self.fetched.push(page);
        let result = if self.broken_pages.contains(&page) {
            Err(ViewError::PageFetch {
                page,
                reason: "corrupt page".to_string(),
            })
        } else {
            Ok(FakePage {
                page,
                natural: self.natural,
                rendered: self.rendered.clone(),
                fail: self.failing_renders.contains(&page),
                hang: self.hanging_renders.contains(&page),
            })
        };
        async move { result }
    }
}

impl PageHandle for FakePage {
    fn natural_size(&self, scale: f64) -> Size {
        self.natural.scaled(scale)
    }

    fn render(&self, viewport: Viewport) -> impl Future<Output = Result<RenderedFrame>> + Send {
        self.rendered.push(self.page);
        let page = self.page;
        let (fail, hang) = (self.fail, self.hang);
        async move {
            if hang {
                std::future::pending::<()>().await;
            }
            if fail {
                return Err(ViewError::Render {
                    page,
                    reason: "context lost".to_string(),
                });
            }
            Ok(RenderedFrame {
                width: viewport.width.round() as u32,
                height: viewport.height.round() as u32,
                rgba_data: Vec::new(),
            })
        }
    }
}

struct FakeProvider {
    document: FakeDocument,
}

impl DocumentProvider for FakeProvider {
    type Document = FakeDocument;

    fn load(&self, source: &str) -> impl Future<Output = Result<FakeDocument>> + Send {
        let result = if source == "missing.pdf" {
            Err(ViewError::Load(format!("{source}: not found")))
        } else {
            Ok(self.document.clone())
        };
        async move { result }
    }
}

#[derive(Default)]
struct FakeSurface {
    /// (width, height, left) of every frame shown
    presented: Vec<(u32, u32, f64)>,
    broken: bool,
}

impl Surface for FakeSurface {
    fn present(&mut self, frame: &RenderedFrame, left: f64) -> Result<()> {
        if self.broken {
            return Err(ViewError::Render {
                page: 0,
                reason: "surface detached".to_string(),
            });
        }
        self.presented.push((frame.width, frame.height, left));
        Ok(())
    }
}

const CONTAINER: Size = Size::new(620.0, 805.0);

fn view<H: ViewHooks>(
    document: FakeDocument,
    options: ViewOptions,
    hooks: H,
) -> ViewController<FakeDocument, FakeSurface, H> {
    ViewController::new(document, FakeSurface::default(), CONTAINER, options, hooks).unwrap()
}

async fn started_view(document: FakeDocument) -> ViewController<FakeDocument, FakeSurface, Permissive> {
    let mut view = view(document, ViewOptions::default(), Permissive);
    view.start().await;
    view
}

#[tokio::test]
async fn test_open_renders_first_page() {
    let document = FakeDocument::new(10);
    let rendered = document.rendered.clone();
    let provider = FakeProvider { document };

    let loaded = Arc::new(Mutex::new(None));
    let loaded_hook = loaded.clone();
    let hooks = HookSet::new().on_after_load(move |count| *loaded_hook.lock().unwrap() = Some(count));

    let mut view = ViewController::open(
        &provider,
        "book.pdf",
        FakeSurface::default(),
        CONTAINER,
        ViewOptions::default(),
        hooks,
    )
    .await
    .unwrap();

    assert_eq!(*loaded.lock().unwrap(), Some(10));
    assert_eq!(view.current_page(), 1);
    assert!(view.is_rendering());

    let completions = view.settle().await;
    assert_eq!(completions.len(), 1);
    assert!(completions[0].report.is_success());
    assert!(!view.is_rendering());
    assert_eq!(rendered.pages(), vec![1]);
    assert_eq!(view.surface().presented.len(), 1);
}

#[tokio::test]
async fn test_open_surfaces_load_error() {
    let provider = FakeProvider {
        document: FakeDocument::new(3),
    };
    let result = ViewController::open(
        &provider,
        "missing.pdf",
        FakeSurface::default(),
        CONTAINER,
        ViewOptions::default(),
        Permissive,
    )
    .await;
    assert!(matches!(result, Err(ViewError::Load(_))));
}

#[tokio::test]
async fn test_empty_document_is_rejected() {
    let result = ViewController::new(
        FakeDocument::new(0),
        FakeSurface::default(),
        CONTAINER,
        ViewOptions::default(),
        Permissive,
    );
    assert!(matches!(result, Err(ViewError::NoPages)));
}

/// Navigation coalesces: the target is computed from the current page, which
/// only advances when a render starts, so repeated "next" during the first
/// render keeps asking for page 2.
#[tokio::test]
async fn test_rapid_next_during_render_lands_on_page_two() {
    let document = FakeDocument::new(10);
    let rendered = document.rendered.clone();
    let mut view = started_view(document).await;
    assert!(view.is_rendering());

    for _ in 0..3 {
        assert_eq!(view.go_to_next(), Dispatch::Deferred { page: 2 });
    }
    assert_eq!(view.current_page(), 1);
    assert_eq!(view.state().pending_page(), Some(2));

    let completions = view.settle().await;
    assert_eq!(completions.len(), 2);
    assert_eq!(
        completions[0].follow_up,
        Some(Dispatch::Started(RenderRequest { page: 2, scale: 1.0 }))
    );
    assert_eq!(completions[1].follow_up, None);
    assert_eq!(rendered.pages(), vec![1, 2]);
    assert_eq!(view.current_page(), 2);
}

#[tokio::test]
async fn test_only_last_request_during_render_reaches_provider() {
    let document = FakeDocument::new(10);
    let fetched = document.fetched.clone();
    let rendered = document.rendered.clone();
    let mut view = started_view(document).await;

    for page in [3, 5, 7] {
        assert_eq!(view.go_to_page(page).unwrap(), Dispatch::Deferred { page });
    }
    view.settle().await;

    assert_eq!(fetched.pages(), vec![1, 7]);
    assert_eq!(rendered.pages(), vec![1, 7]);
    assert_eq!(view.current_page(), 7);
}

#[tokio::test]
async fn test_rerender_current_page_while_idle() {
    let document = FakeDocument::new(4);
    let rendered = document.rendered.clone();
    let mut view = started_view(document).await;
    view.settle().await;

    let dispatch = view.go_to_page(1).unwrap();
    assert_eq!(dispatch, Dispatch::Started(RenderRequest { page: 1, scale: 1.0 }));
    let completions = view.settle().await;
    assert!(completions[0].report.is_success());
    assert_eq!(rendered.pages(), vec![1, 1]);
    assert_eq!(view.surface().presented.len(), 2);
}

#[tokio::test]
async fn test_boundaries_are_no_ops() {
    let document = FakeDocument::new(2);
    let rendered = document.rendered.clone();

    let asked = Arc::new(Mutex::new(0));
    let (prev_count, next_count) = (asked.clone(), asked.clone());
    let hooks = HookSet::new()
        .on_before_previous(move |_| {
            *prev_count.lock().unwrap() += 1;
            true
        })
        .on_before_next(move |_| {
            *next_count.lock().unwrap() += 1;
            true
        });

    let mut view = view(document, ViewOptions::default(), hooks);
    view.start().await;
    view.settle().await;

    let before = view.state().clone();
    assert_eq!(view.go_to_previous(), Dispatch::Unchanged);
    assert_eq!(view.state(), &before);
    assert!(!view.is_rendering());

    view.go_to_next();
    view.settle().await;
    assert_eq!(view.current_page(), 2);

    let before = view.state().clone();
    assert_eq!(view.go_to_next(), Dispatch::Unchanged);
    assert_eq!(view.state(), &before);
    assert!(!view.is_rendering());

    assert_eq!(rendered.pages(), vec![1, 2]);
    // Only the one real navigation consulted a hook
    assert_eq!(*asked.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_navigation_hooks_can_veto() {
    let document = FakeDocument::new(5);
    let rendered = document.rendered.clone();
    let hooks = HookSet::new()
        .on_before_next(|current| current < 2)
        .on_before_previous(|_| false);

    let mut view = view(document, ViewOptions::default(), hooks);
    view.start().await;
    view.settle().await;

    view.go_to_next();
    view.settle().await;
    assert_eq!(view.current_page(), 2);

    assert_eq!(view.go_to_next(), Dispatch::Vetoed { page: 3 });
    assert_eq!(view.go_to_previous(), Dispatch::Vetoed { page: 1 });
    assert_eq!(view.current_page(), 2);
    assert!(!view.is_rendering());
    assert_eq!(rendered.pages(), vec![1, 2]);
}

#[tokio::test]
async fn test_before_render_veto_changes_nothing() {
    let document = FakeDocument::new(5);
    let fetched = document.fetched.clone();
    let hooks = HookSet::new().on_before_render(|page| page != 2);

    let mut view = view(document, ViewOptions::default(), hooks);
    view.start().await;
    view.settle().await;

    let before = view.state().clone();
    assert_eq!(view.go_to_next(), Dispatch::Vetoed { page: 2 });
    assert_eq!(view.state(), &before);
    assert!(view.settle().await.is_empty());
    assert_eq!(fetched.pages(), vec![1]);
    assert_eq!(view.surface().presented.len(), 1);
}

#[tokio::test]
async fn test_page_fetch_error_clears_in_flight_and_drains_once() {
    let mut document = FakeDocument::new(10);
    document.broken_pages.insert(2);
    let rendered = document.rendered.clone();

    let failures = Arc::new(Mutex::new(Vec::new()));
    let failures_hook = failures.clone();
    let hooks = HookSet::new().on_after_render(move |report| {
        if let Err(e) = &report.result {
            failures_hook.lock().unwrap().push((report.request.page, e.to_string()));
        }
    });

    let mut view = view(document, ViewOptions::default(), hooks);
    view.start().await;
    view.settle().await;

    assert!(view.go_to_page(2).unwrap().started().is_some());
    assert_eq!(view.current_page(), 2);
    assert_eq!(view.go_to_page(3).unwrap(), Dispatch::Deferred { page: 3 });

    let first = view.next_completion().await.unwrap();
    assert!(matches!(
        first.report.result,
        Err(ViewError::PageFetch { page: 2, .. })
    ));
    assert_eq!(
        first.follow_up,
        Some(Dispatch::Started(RenderRequest { page: 3, scale: 1.0 }))
    );

    let rest = view.settle().await;
    assert_eq!(rest.len(), 1);
    assert!(rest[0].report.is_success());
    assert!(!view.is_rendering());
    assert_eq!(rendered.pages(), vec![1, 3]);
    assert_eq!(failures.lock().unwrap().len(), 1);
    assert_eq!(failures.lock().unwrap()[0].0, 2);
}

#[tokio::test]
async fn test_failed_render_keeps_previous_pixels() {
    let mut document = FakeDocument::new(5);
    document.failing_renders.insert(2);
    let mut view = started_view(document).await;
    view.settle().await;
    assert_eq!(view.surface().presented.len(), 1);

    view.go_to_next();
    let completions = view.settle().await;

    assert!(matches!(
        completions[0].report.result,
        Err(ViewError::Render { page: 2, .. })
    ));
    assert!(!view.is_rendering());
    // Counter shows the attempted page, pixels are still page 1's
    assert_eq!(view.current_page(), 2);
    assert_eq!(view.surface().presented.len(), 1);

    // Navigation keeps working
    view.go_to_next();
    view.settle().await;
    assert_eq!(view.current_page(), 3);
    assert_eq!(view.surface().presented.len(), 2);
}

#[tokio::test]
async fn test_surface_failure_is_reported_as_render_error() {
    let document = FakeDocument::new(3);
    let surface = FakeSurface {
        broken: true,
        ..Default::default()
    };
    let mut view =
        ViewController::new(document, surface, CONTAINER, ViewOptions::default(), Permissive)
            .unwrap();
    view.start().await;
    view.go_to_next();

    let completions = view.settle().await;
    assert_eq!(completions.len(), 2);
    assert!(completions.iter().all(|c| !c.report.is_success()));
    assert!(!view.is_rendering());
    assert_eq!(view.current_page(), 2);
}

#[tokio::test]
async fn test_hung_render_times_out() {
    let mut document = FakeDocument::new(3);
    document.hanging_renders.insert(1);
    let options = ViewOptions {
        render_timeout_ms: Some(20),
        ..Default::default()
    };
    let mut view = view(document, options, Permissive);
    view.start().await;
    view.go_to_next();

    let completions = view.settle().await;
    assert!(matches!(
        completions[0].report.result,
        Err(ViewError::RenderTimeout { page: 1 })
    ));
    assert!(completions[1].report.is_success());
    assert_eq!(view.current_page(), 2);
}

#[tokio::test]
async fn test_scale_change_rerenders_current_page() {
    let document = FakeDocument::new(3);
    let mut view = started_view(document).await;

    // While rendering: recorded, then picked up by the drain
    assert_eq!(view.set_scale(2.0).unwrap(), Dispatch::Deferred { page: 1 });
    assert_eq!(view.current_scale(), 2.0);
    view.settle().await;
    assert_eq!(view.surface().presented.last(), Some(&(600, 800, 0.0)));

    // While idle: starts immediately
    let dispatch = view.set_scale(0.5).unwrap();
    assert_eq!(dispatch, Dispatch::Started(RenderRequest { page: 1, scale: 0.5 }));
    view.settle().await;
    assert_eq!(view.surface().presented.last().map(|p| (p.0, p.1)), Some((150, 200)));

    // Invalid scales are rejected up front
    assert!(matches!(view.set_scale(0.0), Err(ViewError::InvalidScale(_))));
    assert_eq!(view.current_scale(), 0.5);
    assert!(!view.is_rendering());
}

#[tokio::test]
async fn test_fit_modes() {
    // Container 620x805 leaves a 600x800 fit area
    let mut document = FakeDocument::new(3);
    document.natural = Size::new(300.0, 300.0);
    let mut view = started_view(document).await;
    view.settle().await;

    view.fit(FitMode::Height).await.unwrap();
    assert!((view.current_scale() - 800.0 / 300.0).abs() < 1e-9);
    view.settle().await;

    view.fit(FitMode::Width).await.unwrap();
    assert_eq!(view.current_scale(), 2.0);
    view.settle().await;

    view.fit(FitMode::Height).await.unwrap();
    view.settle().await;
    // Tall fit area: auto picks width
    view.fit(FitMode::Auto).await.unwrap();
    assert_eq!(view.current_scale(), 2.0);
}

#[tokio::test]
async fn test_fit_during_render_keeps_pending_navigation() {
    let document = FakeDocument::new(3);
    let rendered = document.rendered.clone();
    let mut view = started_view(document).await;

    assert_eq!(view.go_to_next(), Dispatch::Deferred { page: 2 });
    let dispatch = view.fit(FitMode::Width).await.unwrap();
    assert_eq!(dispatch, Dispatch::Deferred { page: 2 });

    view.settle().await;
    assert_eq!(view.current_page(), 2);
    assert_eq!(view.current_scale(), 2.0);
    assert_eq!(rendered.pages(), vec![1, 2]);
    assert_eq!(view.surface().presented.last(), Some(&(600, 800, 0.0)));
}

#[tokio::test]
async fn test_fit_fetch_error_changes_nothing() {
    let mut document = FakeDocument::new(3);
    document.broken_pages.insert(1);
    let mut view = view(document, ViewOptions::default(), Permissive);

    assert!(matches!(
        view.fit(FitMode::Width).await,
        Err(ViewError::PageFetch { page: 1, .. })
    ));
    assert_eq!(view.current_scale(), 1.0);
    assert!(!view.is_rendering());
}

#[tokio::test]
async fn test_auto_fit_runs_after_load_and_on_resize() {
    let document = FakeDocument::new(3);
    let options = ViewOptions {
        auto_fit: true,
        ..Default::default()
    };
    let mut view = view(document, options, Permissive);

    let dispatch = view.start().await;
    assert_eq!(dispatch, Dispatch::Started(RenderRequest { page: 1, scale: 2.0 }));
    view.settle().await;

    // Wide container leaves a 2000x1200 area: fit by height, 1200 / 400
    let dispatch = view.resize(Size::new(2020.0, 1205.0)).await.unwrap();
    assert_eq!(dispatch, Dispatch::Started(RenderRequest { page: 1, scale: 3.0 }));
    view.settle().await;
    assert_eq!(view.container(), Size::new(2020.0, 1205.0));
}

#[tokio::test]
async fn test_resize_without_auto_fit_only_records_container() {
    let document = FakeDocument::new(3);
    let mut view = started_view(document).await;
    view.settle().await;

    let dispatch = view.resize(Size::new(1000.0, 500.0)).await.unwrap();
    assert_eq!(dispatch, Dispatch::Unchanged);
    assert_eq!(view.container(), Size::new(1000.0, 500.0));
    assert_eq!(view.current_scale(), 1.0);

    assert!(matches!(
        view.resize(Size::new(0.0, 500.0)).await,
        Err(ViewError::InvalidDimensions(_))
    ));
    assert_eq!(view.container(), Size::new(1000.0, 500.0));
}

#[tokio::test]
async fn test_narrow_pages_are_centered() {
    let document = FakeDocument::new(3);
    let mut view = ViewController::new(
        document,
        FakeSurface::default(),
        Size::new(1000.0, 805.0),
        ViewOptions::default(),
        Permissive,
    )
    .unwrap();
    view.start().await;
    view.settle().await;
    assert_eq!(view.surface().presented[0], (300, 400, 350.0));

    // 990 is not narrower than 1000 - 20: flush left
    view.set_scale(3.3).unwrap();
    view.settle().await;
    assert_eq!(view.surface().presented[1], (990, 1320, 0.0));
}

#[tokio::test]
async fn test_out_of_range_page_is_rejected() {
    let document = FakeDocument::new(3);
    let mut view = started_view(document).await;
    let before = view.state().clone();

    assert!(matches!(
        view.go_to_page(4),
        Err(ViewError::PageOutOfRange { page: 4, page_count: 3 })
    ));
    assert_eq!(view.state(), &before);
}
