//! Document provider backed by pdfium.
//!
//! Pdfium handles are not `Send`, so every operation binds the library and
//! reopens the file inside a blocking task. Those tasks share one
//! [`BlockingGate`] per provider and never run at the same time.

use crate::blocking::BlockingGate;
use crate::provider::*;
use crate::types::*;
use pdfium_render::prelude::{PdfRenderConfig, Pdfium, PdfiumError};
use std::future::Future;
use std::path::{Path, PathBuf};

/// Bind pdfium, trying `library_dir` (or `vendor/pdfium/lib` under the
/// working directory) before the system library
pub fn init_pdfium(library_dir: Option<&Path>) -> std::result::Result<Pdfium, PdfiumError> {
    let vendor_path = library_dir.map(Path::to_path_buf).or_else(|| {
        std::env::current_dir().ok().and_then(|mut p| {
            p.push("vendor/pdfium/lib");
            if p.exists() { Some(p) } else { None }
        })
    });

    if let Some(vendor_path) = vendor_path {
        if let Ok(binding) =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&vendor_path))
        {
            return Ok(Pdfium::new(binding));
        }
    }

    Pdfium::bind_to_system_library().map(Pdfium::new)
}

#[derive(Debug, Clone, Default)]
pub struct PdfiumProvider {
    library_dir: Option<PathBuf>,
    gate: BlockingGate,
}

impl PdfiumProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.library_dir = Some(dir.into());
        self
    }
}

impl DocumentProvider for PdfiumProvider {
    type Document = PdfiumDocument;

    fn load(&self, source: &str) -> impl Future<Output = Result<PdfiumDocument>> + Send {
        let path = PathBuf::from(source);
        let library_dir = self.library_dir.clone();
        let gate = self.gate.clone();
        async move {
            let (path_clone, dir_clone) = (path.clone(), library_dir.clone());
            let page_count = gate.run(move || {
                let pdfium = init_pdfium(dir_clone.as_deref())?;
                let document = pdfium.load_pdf_from_file(&path_clone, None)?;
                Ok::<_, PdfiumError>(document.pages().len() as u32)
            })
            .await?
            .map_err(|e| ViewError::Load(format!("{}: {}", path.display(), e)))?;

            log::debug!("Loaded {} with {} pages", path.display(), page_count);
            Ok(PdfiumDocument {
                path,
                library_dir,
                gate,
                page_count,
            })
        }
    }
}

#[derive(Debug, Clone)]
pub struct PdfiumDocument {
    path: PathBuf,
    library_dir: Option<PathBuf>,
    gate: BlockingGate,
    page_count: u32,
}

impl PdfiumDocument {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentHandle for PdfiumDocument {
    type Page = PdfiumPage;

    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn get_page(&self, page: u32) -> impl Future<Output = Result<PdfiumPage>> + Send {
        let path = self.path.clone();
        let library_dir = self.library_dir.clone();
        let gate = self.gate.clone();
        let page_count = self.page_count;
        async move {
            if page == 0 || page > page_count {
                return Err(ViewError::PageFetch {
                    page,
                    reason: format!("document has {page_count} pages"),
                });
            }
            let index = (page - 1) as u16;
            let (path_clone, dir_clone) = (path.clone(), library_dir.clone());
            let (width, height) = gate.run(move || {
                let pdfium = init_pdfium(dir_clone.as_deref())?;
                let document = pdfium.load_pdf_from_file(&path_clone, None)?;
                let pdf_page = document.pages().get(index)?;
                Ok::<_, PdfiumError>((pdf_page.width().value, pdf_page.height().value))
            })
            .await?
            .map_err(|e| ViewError::PageFetch {
                page,
                reason: e.to_string(),
            })?;

            Ok(PdfiumPage {
                path,
                library_dir,
                gate,
                page,
                natural: Size::new(f64::from(width), f64::from(height)),
            })
        }
    }
}

#[derive(Debug, Clone)]
pub struct PdfiumPage {
    path: PathBuf,
    library_dir: Option<PathBuf>,
    gate: BlockingGate,
    page: u32,
    /// Size in points at scale 1.0
    natural: Size,
}

impl PageHandle for PdfiumPage {
    fn natural_size(&self, scale: f64) -> Size {
        self.natural.scaled(scale)
    }

    fn render(&self, viewport: Viewport) -> impl Future<Output = Result<RenderedFrame>> + Send {
        let path = self.path.clone();
        let library_dir = self.library_dir.clone();
        let gate = self.gate.clone();
        let page = self.page;
        async move {
            let index = (page - 1) as u16;
            let target_width = viewport.width.round().max(1.0) as i32;
            let max_height = viewport.height.round().max(1.0) as i32;

            gate.run(move || {
                let pdfium = init_pdfium(library_dir.as_deref())?;
                let document = pdfium.load_pdf_from_file(&path, None)?;
                let pdf_page = document.pages().get(index)?;

                let config = PdfRenderConfig::new()
                    .set_target_width(target_width)
                    .set_maximum_height(max_height);

                let bitmap = pdf_page.render_with_config(&config)?;
                Ok::<_, PdfiumError>(RenderedFrame {
                    width: bitmap.width() as u32,
                    height: bitmap.height() as u32,
                    rgba_data: bitmap.as_rgba_bytes().to_vec(),
                })
            })
            .await?
            .map_err(|e| ViewError::Render {
                page,
                reason: e.to_string(),
            })
        }
    }
}
