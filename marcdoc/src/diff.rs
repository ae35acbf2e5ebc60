//! Field-level comparison of two versions of a record.
use crate::{Controlfield, Field, Record};

/// A control or data field borrowed from one side of a diff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRef<'a> {
    Control(&'a Controlfield),
    Data(&'a Field),
}

impl FieldRef<'_> {
    pub fn tag(&self) -> &str {
        match self {
            FieldRef::Control(cf) => cf.tag(),
            FieldRef::Data(f) => f.tag(),
        }
    }

    pub fn to_breaker(&self) -> String {
        match self {
            FieldRef::Control(cf) => cf.to_breaker(),
            FieldRef::Data(f) => f.to_breaker(),
        }
    }
}

/// Fields removed, added, and left untouched between two records.
///
/// Fields compare by full equality (tag, indicators, subfields), and
/// repeated fields are matched one for one.
#[derive(Debug)]
pub struct RecordDiff<'a> {
    removed: Vec<FieldRef<'a>>,
    added: Vec<FieldRef<'a>>,
    unchanged: Vec<FieldRef<'a>>,
}

impl<'a> RecordDiff<'a> {
    /// # Examples
    ///
    /// ```
    /// use marcdoc::{Record, RecordDiff};
    /// let before = Record::from_breaker("=099 \\\\$cinternet\n=245 10$aTitle").unwrap();
    /// let after = Record::from_breaker("=245 \\\\$aTitle").unwrap();
    ///
    /// let diff = RecordDiff::new(&before, &after);
    /// assert_eq!(diff.removed().len(), 2);
    /// assert_eq!(diff.added().len(), 1);
    /// assert!(diff.unchanged().is_empty());
    /// assert_eq!(
    ///     diff.to_breaker(),
    ///     "- =099 \\\\$cinternet\n- =245 10$aTitle\n+ =245 \\\\$aTitle"
    /// );
    /// ```
    pub fn new(before: &'a Record, after: &'a Record) -> Self {
        let old = field_refs(before);
        let mut new: Vec<Option<FieldRef<'a>>> = field_refs(after).into_iter().map(Some).collect();

        let mut removed = Vec::new();
        let mut unchanged = Vec::new();

        for field in old {
            let matched = new
                .iter_mut()
                .find(|candidate| candidate.as_ref() == Some(&field))
                .and_then(|slot| slot.take());

            match matched {
                Some(_) => unchanged.push(field),
                None => removed.push(field),
            }
        }

        let added = new.into_iter().flatten().collect();

        RecordDiff {
            removed,
            added,
            unchanged,
        }
    }

    /// Fields present only in the original record.
    pub fn removed(&self) -> &[FieldRef<'a>] {
        &self.removed
    }

    /// Fields present only in the edited record.
    pub fn added(&self) -> &[FieldRef<'a>] {
        &self.added
    }

    /// Fields present in both.
    pub fn unchanged(&self) -> &[FieldRef<'a>] {
        &self.unchanged
    }

    /// True if the two records hold the same fields.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    /// Removed fields as "- " lines then added fields as "+ " lines.
    pub fn to_breaker(&self) -> String {
        self.removed
            .iter()
            .map(|f| format!("- {}", f.to_breaker()))
            .chain(self.added.iter().map(|f| format!("+ {}", f.to_breaker())))
            .collect::<Vec<String>>()
            .join("\n")
    }
}

fn field_refs(record: &Record) -> Vec<FieldRef<'_>> {
    record
        .control_fields()
        .iter()
        .map(FieldRef::Control)
        .chain(record.fields().iter().map(FieldRef::Data))
        .collect()
}
