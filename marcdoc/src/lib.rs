#![forbid(unsafe_code)]

//! MARC records as stored in a document database: a small record
//! model, a JSON document codec, MARC Breaker dumps for review, and
//! field-level diffs between two versions of a record.

pub use self::diff::RecordDiff;
pub use self::record::Controlfield;
pub use self::record::Field;
pub use self::record::Record;
pub use self::record::Subfield;

pub mod breaker;
pub mod diff;
pub mod document;
mod query;
pub mod record;

pub use self::query::FieldQuery;
