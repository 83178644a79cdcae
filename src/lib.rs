#![doc(html_root_url = "https://docs.rs/region-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

//! Incremental reconciliation of marker-delimited regions in a [`Document`](`document::Document`).
//!
//! See [`Reconciler`] for the entry points and [`template`] for a ready-to-use [`Description`](`description::Description`).

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod description;
pub mod document;
mod region;
mod sequence;
mod temp_list;
pub mod template;

pub use region::{Boundary, Reconciler, DEFAULT_DEPTH_LIMIT};
