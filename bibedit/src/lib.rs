//! Rule-driven batch edits of bibliographic records.
//!
//! Records are loaded from a [`store::RecordStore`], run through an
//! ordered list of [`rules::Rule`]s, compared with their original
//! version, then either saved or dumped for review.
#![forbid(unsafe_code)]

pub mod batch;
pub mod batches;
pub mod db;
pub mod links;
pub mod result;
pub mod rules;
pub mod script;
pub mod store;

pub use result::{EditError, EditResult};
