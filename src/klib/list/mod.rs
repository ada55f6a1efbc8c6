//! Listas do KLib.

pub mod linked;

pub use linked::{IndexList, Iter, Link, LinkArena};
