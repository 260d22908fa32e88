//! Document rendering
//!
//! [`layout`] turns logical pages into fixed-width lines and physical
//! sheets; [`pdf`] serialises the sheets with the font chosen in [`font`].

pub mod font;
pub mod layout;
pub mod pdf;

pub use font::{discover_system_font, FontChoice, TrueTypeFont};
pub use layout::{paginate, Sheet};
pub use pdf::{PdfRenderer, RenderedPdf};
