//! File export for parts.

pub mod stl;

pub use stl::{export_stl, to_stl_bytes};
