//! Optiform: an editor for printable optical answer sheets.
//!
//! The document model and its editing rules live outside the UI so they can
//! be driven headlessly; [`app`] wraps them in an eframe window.

pub mod app;
pub mod bubbles;
pub mod corner_marks;
pub mod error;
pub mod form;
pub mod model;
pub mod text_edit;

pub use app::FormEditorApp;
pub use error::{FormError, FormResult};
pub use form::{FormDocument, FormEditor};
