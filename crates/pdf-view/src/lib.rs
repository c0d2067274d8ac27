#[cfg(any(feature = "pdfium", test))]
mod blocking;
pub mod controller;
pub mod hooks;
mod options;
#[cfg(feature = "pdfium")]
pub mod pdfium;
mod provider;
pub mod scheduler;
pub mod sizer;
mod types;

pub use controller::{Completion, ViewController};
pub use hooks::{HookSet, Permissive, ViewHooks};
pub use options::*;
pub use provider::*;
pub use scheduler::{Dispatch, RenderScheduler};
pub use sizer::FitMode;
pub use types::*;
