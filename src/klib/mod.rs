//! Kernel Library (KLib).
//!
//! Utilitários agnósticos de hardware para uso interno do escalonador.
//! Funciona como uma extensão da `core` library.

pub mod bitmap;
pub mod list;
pub mod logging;
pub mod test_framework;

pub use bitmap::PrioBitmap;
pub use list::{IndexList, Link, LinkArena};
