//! Field transformation rules.
//!
//! A rule pairs an [`Action`] with the record types it applies to.
//! Rule sets are ordered: later rules see the output of earlier ones,
//! e.g. indicators are cleared on 700 after 100 has been moved to 700.
use crate::result::EditResult;
use chrono::Utc;
use chrono_tz::US::Eastern;
use marcdoc::record::is_control_tag;
use marcdoc::{Field, Record, Subfield};
use std::fmt;

/// Collection name in 989 $a.
const COLLECTION_TAG: &str = "989";
const COLLECTION_CODE: &str = "a";
const SPEECH_COLLECTION: &str = "Speeches";
const VOTE_COLLECTION: &str = "Voting Data";

/// Older records carry a type code in 089 $b instead.
const TYPE_TAG: &str = "089";
const TYPE_CODE: &str = "b";
const SPEECH_CODE: &str = "B22";
const VOTE_CODE: &str = "B23";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Bibliographic,
    Speech,
    Vote,
}

impl RecordType {
    /// Classify a record by its 989 $a collection, falling back to the
    /// 089 $b type code.
    ///
    /// ```
    /// use bibedit::rules::RecordType;
    /// use marcdoc::Record;
    ///
    /// let mut record = Record::new();
    /// assert_eq!(RecordType::of(&record), RecordType::Bibliographic);
    ///
    /// record.set("989", "a", "Voting Data").unwrap();
    /// assert_eq!(RecordType::of(&record), RecordType::Vote);
    ///
    /// let mut older = Record::new();
    /// older.set("089", "b", "B22").unwrap();
    /// assert_eq!(RecordType::of(&older), RecordType::Speech);
    /// ```
    pub fn of(record: &Record) -> Self {
        let collections = record.get_values(COLLECTION_TAG, COLLECTION_CODE);

        if collections.contains(&SPEECH_COLLECTION) {
            return RecordType::Speech;
        }
        if collections.contains(&VOTE_COLLECTION) {
            return RecordType::Vote;
        }

        let codes = record.get_values(TYPE_TAG, TYPE_CODE);

        if codes.contains(&SPEECH_CODE) {
            RecordType::Speech
        } else if codes.contains(&VOTE_CODE) {
            RecordType::Vote
        } else {
            RecordType::Bibliographic
        }
    }
}

pub type Scope = &'static [RecordType];

pub const BIBLIOGRAPHIC: Scope = &[RecordType::Bibliographic];
pub const ALL: Scope = &[
    RecordType::Bibliographic,
    RecordType::Speech,
    RecordType::Vote,
];
pub const BIB_AND_VOTES: Scope = &[RecordType::Bibliographic, RecordType::Vote];
pub const BIB_AND_SPEECHES: Scope = &[RecordType::Bibliographic, RecordType::Speech];
pub const SPEECHES_AND_VOTES: Scope = &[RecordType::Speech, RecordType::Vote];

/// Decides whether a whole field is affected.
///
/// Value conditions look at the first subfield with the given code.
/// A missing subfield is "not in" any list and "lacks" any prefix.
#[derive(Debug, Clone)]
pub enum FieldCondition {
    Always,
    ValueEquals {
        code: &'static str,
        value: &'static str,
    },
    ValueEqualsIgnoreCase {
        code: &'static str,
        value: &'static str,
    },
    ValueNotIn {
        code: &'static str,
        values: &'static [&'static str],
    },
    ValueLacksPrefix {
        code: &'static str,
        prefixes: &'static [&'static str],
    },
}

impl FieldCondition {
    pub fn matches(&self, field: &Field) -> bool {
        match self {
            Self::Always => true,
            Self::ValueEquals { code, value } => field.first_value(code) == Some(*value),
            Self::ValueEqualsIgnoreCase { code, value } => field
                .first_value(code)
                .is_some_and(|v| v.to_lowercase() == value.to_lowercase()),
            Self::ValueNotIn { code, values } => match field.first_value(code) {
                Some(v) => !values.contains(&v),
                None => true,
            },
            Self::ValueLacksPrefix { code, prefixes } => match field.first_value(code) {
                Some(v) => !prefixes.iter().any(|p| v.starts_with(p)),
                None => true,
            },
        }
    }
}

/// Decides whether a single subfield is affected.
#[derive(Debug, Clone)]
pub enum SubfieldCondition {
    Always,
    ValueNot(&'static str),
}

impl SubfieldCondition {
    pub fn matches(&self, subfield: &Subfield) -> bool {
        match self {
            Self::Always => true,
            Self::ValueNot(value) => subfield.content() != *value,
        }
    }
}

/// Today's date in US/Eastern, as `YYYYMMDD`.
pub fn stamp_date() -> String {
    Utc::now().with_timezone(&Eastern).format("%Y%m%d").to_string()
}

/// Value of one subfield in a stamp field.
#[derive(Debug, Clone)]
pub enum StampValue {
    Text(&'static str),
    /// [`stamp_date`]
    Date,
    /// [`stamp_date`] after a fixed prefix.
    PrefixedDate(&'static str),
}

impl StampValue {
    fn render(&self, date: &str) -> String {
        match self {
            Self::Text(text) => text.to_string(),
            Self::Date => date.to_string(),
            Self::PrefixedDate(prefix) => format!("{prefix}{date}"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    /// Remove matching fields.  Control tags remove every occurrence.
    DeleteField {
        tag: &'static str,
        when: FieldCondition,
    },
    /// Move every field from one tag to another.
    RenameTag {
        from: &'static str,
        to: &'static str,
    },
    /// Remove matching subfields.  Fields left empty are removed.
    DeleteSubfield {
        tag: &'static str,
        code: &'static str,
        when: SubfieldCondition,
    },
    /// Reset both indicators to blank.
    ClearIndicators { tag: &'static str },
    /// Reset indicators according to the year in another field.
    ///
    /// Records dated before `before` only lose the second indicator.
    /// Later or undated records lose both.
    ClearIndicatorsByYear {
        tag: &'static str,
        year_tag: &'static str,
        year_code: &'static str,
        before: i32,
    },
    /// Copy each source value into a new target field unless the
    /// target already carries that value.
    ///
    /// With `remove_source` the source subfields are removed, whether
    /// or not the value was added, and emptied source fields go too.
    TransferValue {
        from_tag: &'static str,
        from_code: &'static str,
        to_tag: &'static str,
        to_code: &'static str,
        remove_source: bool,
    },
    /// Remove a trailing suffix, and surrounding spaces, from matching
    /// subfield values.
    TrimSuffix {
        tag: &'static str,
        code: &'static str,
        suffix: &'static str,
    },
    /// Add a field dated with [`stamp_date`].
    ///
    /// [`apply_rules`] only stamps records that earlier rules changed.
    AddStamp {
        tag: &'static str,
        subfields: &'static [(&'static str, StampValue)],
    },
}

/// Leading four-digit year of a value such as "2013-05-01".
fn leading_year(value: &str) -> Option<i32> {
    value.get(..4)?.parse().ok()
}

impl Action {
    /// Apply the action, returning the number of changes made.
    pub fn apply(&self, record: &mut Record) -> EditResult<usize> {
        let changes = match self {
            Self::DeleteField { tag, when } => {
                if is_control_tag(tag) {
                    record.remove_control_fields(tag)
                } else {
                    record.remove_fields_where(tag, |f| when.matches(f))
                }
            }

            Self::RenameTag { from, to } => record.retag_fields(from, to)?,

            Self::DeleteSubfield { tag, code, when } => {
                let mut removed = 0;
                for field in record.get_fields_mut(tag) {
                    removed += field.remove_subfields_where(code, |sf| when.matches(sf));
                }
                if removed > 0 {
                    record.remove_fields_where(tag, |f| f.subfields().is_empty());
                }
                removed
            }

            Self::ClearIndicators { tag } => record
                .get_fields_mut(tag)
                .into_iter()
                .map(|f| f.clear_indicators())
                .filter(|changed| *changed)
                .count(),

            Self::ClearIndicatorsByYear {
                tag,
                year_tag,
                year_code,
                before,
            } => {
                let ind2_only = record
                    .get_value(year_tag, year_code)
                    .and_then(leading_year)
                    .is_some_and(|year| year < *before);

                let mut changed = 0;
                for field in record.get_fields_mut(tag) {
                    let cleared = if ind2_only {
                        let was_blank = field.ind2() == " ";
                        field.set_ind2(" ")?;
                        !was_blank
                    } else {
                        field.clear_indicators()
                    };
                    if cleared {
                        changed += 1;
                    }
                }
                changed
            }

            Self::TransferValue {
                from_tag,
                from_code,
                to_tag,
                to_code,
                remove_source,
            } => {
                let values: Vec<String> = record
                    .get_values(from_tag, from_code)
                    .into_iter()
                    .filter(|v| !v.is_empty())
                    .map(|v| v.to_string())
                    .collect();

                let mut changes = 0;
                for value in values {
                    if record.has_value(to_tag, to_code, &value) {
                        continue;
                    }
                    record.add_data_field(*to_tag)?.add_subfield(*to_code, value)?;
                    changes += 1;
                }

                if *remove_source {
                    let mut removed = 0;
                    for field in record.get_fields_mut(from_tag) {
                        removed += field.remove_subfields(from_code);
                    }
                    if removed > 0 {
                        record.remove_fields_where(from_tag, |f| f.subfields().is_empty());
                    }
                    changes += removed;
                }

                changes
            }

            Self::TrimSuffix { tag, code, suffix } => {
                let mut trimmed = 0;
                for field in record.get_fields_mut(tag) {
                    for sf in field.get_subfields_mut(code) {
                        let Some(value) = sf.content().trim_end().strip_suffix(*suffix) else {
                            continue;
                        };
                        let value = value.trim_end().to_string();
                        sf.set_content(value);
                        trimmed += 1;
                    }
                }
                trimmed
            }

            Self::AddStamp { tag, subfields } => {
                let date = stamp_date();
                let field = record.add_data_field(*tag)?;
                for (code, value) in subfields.iter() {
                    field.add_subfield(*code, value.render(&date))?;
                }
                1
            }
        };

        Ok(changes)
    }

    /// True for actions that mark a record as edited rather than edit it.
    pub fn is_stamp(&self) -> bool {
        matches!(self, Self::AddStamp { .. })
    }
}

/// Rule number, e.g. "43" or "43.1" for a rule added after 43.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RuleNumber {
    pub major: u16,
    pub minor: u16,
}

impl RuleNumber {
    pub const fn new(major: u16) -> Self {
        RuleNumber { major, minor: 0 }
    }

    pub const fn sub(major: u16, minor: u16) -> Self {
        RuleNumber { major, minor }
    }
}

impl From<u16> for RuleNumber {
    fn from(major: u16) -> Self {
        RuleNumber::new(major)
    }
}

impl fmt::Display for RuleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minor == 0 {
            write!(f, "{}", self.major)
        } else {
            write!(f, "{}.{}", self.major, self.minor)
        }
    }
}

/// One numbered, scoped rule in a batch.
///
/// A rule with several steps appears once per step, under one number.
#[derive(Debug, Clone)]
pub struct Rule {
    pub number: RuleNumber,
    pub description: &'static str,
    pub scope: Scope,
    pub action: Action,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number, self.description)
    }
}

impl Rule {
    /// Apply the rule if the record type is in scope.
    ///
    /// Returns the number of changes made.
    pub fn apply(&self, record: &mut Record) -> EditResult<usize> {
        if !self.scope.contains(&RecordType::of(record)) {
            return Ok(0);
        }

        self.action
            .apply(record)
            .map_err(|e| format!("Rule {self} failed: {e}").into())
    }
}

/// A rule that changed a record, with its change count.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedRule {
    pub number: RuleNumber,
    pub changes: usize,
}

/// Apply each rule in order.  Returns the rules that made changes.
///
/// Stamp rules are skipped until some earlier rule has changed the
/// record, so untouched records stay untouched.
pub fn apply_rules(rules: &[Rule], record: &mut Record) -> EditResult<Vec<AppliedRule>> {
    let mut applied = Vec::new();

    for rule in rules {
        if rule.action.is_stamp() && applied.is_empty() {
            continue;
        }

        let changes = rule.apply(record)?;
        if changes > 0 {
            log::debug!("Rule {rule} made {changes} change(s)");
            applied.push(AppliedRule {
                number: rule.number,
                changes,
            });
        }
    }

    Ok(applied)
}
