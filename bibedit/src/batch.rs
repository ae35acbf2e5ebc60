//! Batch edit loop: find, edit, compare, confirm, save.
use crate::result::{EditError, EditResult};
use crate::rules::{AppliedRule, Rule, apply_rules};
use crate::script::announce;
use crate::store::{RecordQuery, RecordStore};
use marcdoc::{Record, RecordDiff};
use rustyline::error::ReadlineError;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Where edited records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Save edited records to the store.
    Database,
    /// Write edited records as breaker text.  Nothing is saved.
    Breaker,
}

impl FromStr for Output {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "db" => Ok(Output::Database),
            "mrk" => Ok(Output::Breaker),
            _ => Err(format!("Invalid output '{s}': expected 'db' or 'mrk'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Editor name applied to saved records.
    pub user: String,
    pub output: Output,
    /// Save without asking.
    pub skip_confirm: bool,
    /// Echo saves to STDOUT.
    pub log_stdout: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            user: "batch_edit".to_string(),
            output: Output::Database,
            skip_confirm: false,
            log_stdout: false,
        }
    }
}

/// Result of applying the rules to one record.
#[derive(Debug)]
pub struct EditOutcome {
    pub record: Record,
    pub applied: Vec<AppliedRule>,
}

impl EditOutcome {
    pub fn diff<'a>(&'a self, original: &'a Record) -> RecordDiff<'a> {
        RecordDiff::new(original, &self.record)
    }

    /// True if the edited record differs from `original`.
    pub fn changed(&self, original: &Record) -> bool {
        self.record != *original
    }
}

/// Operator response to a save prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    /// Save this and every remaining record without asking.
    All,
    /// Save nothing more.
    Quit,
}

impl FromStr for Answer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "y" | "yes" => Ok(Answer::Yes),
            "n" | "no" => Ok(Answer::No),
            "a" | "all" => Ok(Answer::All),
            "q" | "quit" => Ok(Answer::Quit),
            other => Err(format!("Unknown answer: '{other}'")),
        }
    }
}

pub trait Confirm {
    /// Ask whether the displayed change should be saved.
    fn confirm(&mut self, record_id: i64, diff: &str) -> EditResult<Answer>;
}

/// Confirms every change.
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _record_id: i64, _diff: &str) -> EditResult<Answer> {
        Ok(Answer::Yes)
    }
}

/// Interactive confirmation on the terminal.
pub struct PromptConfirm {
    readline: rustyline::DefaultEditor,
}

impl PromptConfirm {
    pub fn new() -> EditResult<Self> {
        Ok(PromptConfirm {
            readline: rustyline::DefaultEditor::new()?,
        })
    }
}

impl Confirm for PromptConfirm {
    fn confirm(&mut self, record_id: i64, diff: &str) -> EditResult<Answer> {
        println!("\nRecord {record_id}:\n{diff}");

        loop {
            let line = match self.readline.readline("Save changes? [y]es [n]o [a]ll [q]uit: ") {
                Ok(l) => l,
                // Ctrl-C / Ctrl-D stop the batch.
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    return Ok(Answer::Quit);
                }
                Err(e) => return Err(e.into()),
            };

            match line.parse::<Answer>() {
                Ok(answer) => return Ok(answer),
                Err(e) => eprintln!("{e}"),
            }
        }
    }
}

/// Counts for a finished batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    /// Records loaded and run through the rules.
    pub examined: usize,
    /// Records the rules modified.
    pub changed: usize,
    pub saved: usize,
    /// Changed records the operator declined or that were left after
    /// a quit.
    pub skipped: usize,
    /// Ids the query returned that could not be loaded.
    pub missing: usize,
    pub failed: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "examined={} changed={} saved={} skipped={} missing={} failed={}",
            self.examined, self.changed, self.saved, self.skipped, self.missing, self.failed
        )
    }
}

/// What happened to a single record.
enum Disposition {
    Unchanged,
    Saved,
    Written,
    Skipped,
    Quit,
    Failed(EditError),
}

pub struct BatchEditor<S: RecordStore> {
    store: S,
    rules: Vec<Rule>,
    options: BatchOptions,
    /// Set once the operator answers "all".
    confirm_all: bool,
}

impl<S: RecordStore> BatchEditor<S> {
    pub fn new(store: S, rules: Vec<Rule>, options: BatchOptions) -> Self {
        BatchEditor {
            store,
            rules,
            options,
            confirm_all: false,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Apply the rules to a copy of `original`.
    pub fn edit_record(&self, original: &Record) -> EditResult<EditOutcome> {
        let mut record = original.clone();
        let applied = apply_rules(&self.rules, &mut record)?;
        Ok(EditOutcome { record, applied })
    }

    /// Process every record matching `query`.
    ///
    /// Records that fail to edit or save are logged and counted.  Any
    /// other error stops the batch.
    pub fn run(
        &mut self,
        query: &RecordQuery,
        confirm: &mut dyn Confirm,
        out: &mut dyn Write,
    ) -> EditResult<BatchSummary> {
        let ids = self.store.find_ids(query)?;
        let total = ids.len();
        let mut summary = BatchSummary::default();

        log::info!("Found {total} record(s) to process");

        for (idx, id) in ids.into_iter().enumerate() {
            log::info!("Processing record [{}/{total}] {id}", idx + 1);

            let stored = match self.store.retrieve(id) {
                Ok(Some(s)) => s,
                Ok(None) => {
                    log::warn!("No such record: {id}");
                    summary.missing += 1;
                    continue;
                }
                Err(e) => {
                    log::error!("Error loading record {id}: {e}");
                    summary.failed += 1;
                    continue;
                }
            };

            summary.examined += 1;

            let outcome = match self.edit_record(&stored.record) {
                Ok(o) => o,
                Err(e) => {
                    log::error!("Error editing record {id}: {e}");
                    summary.failed += 1;
                    continue;
                }
            };

            match self.dispose(id, &stored.record, &outcome, confirm, out)? {
                Disposition::Unchanged => {}
                Disposition::Saved => {
                    summary.changed += 1;
                    summary.saved += 1;
                }
                Disposition::Written => summary.changed += 1,
                Disposition::Skipped => {
                    summary.changed += 1;
                    summary.skipped += 1;
                }
                Disposition::Quit => {
                    summary.changed += 1;
                    summary.skipped += 1;
                    log::info!("Batch stopped by operator at record {id}");
                    break;
                }
                Disposition::Failed(e) => {
                    log::error!("Error saving record {id}: {e}");
                    summary.changed += 1;
                    summary.failed += 1;
                }
            }
        }

        log::info!("Batch complete: {summary}");

        Ok(summary)
    }

    fn dispose(
        &mut self,
        id: i64,
        original: &Record,
        outcome: &EditOutcome,
        confirm: &mut dyn Confirm,
        out: &mut dyn Write,
    ) -> EditResult<Disposition> {
        if !outcome.changed(original) {
            log::debug!("Skipping record {id} -- no changes made");
            return Ok(Disposition::Unchanged);
        }

        let diff = outcome.diff(original).to_breaker();

        if self.options.output == Output::Breaker {
            writeln!(out, "# {id}\n{diff}\n{}\n", outcome.record.to_breaker())?;
            return Ok(Disposition::Written);
        }

        if !self.options.skip_confirm && !self.confirm_all {
            match confirm.confirm(id, &diff)? {
                Answer::Yes => {}
                Answer::All => self.confirm_all = true,
                Answer::No => return Ok(Disposition::Skipped),
                Answer::Quit => return Ok(Disposition::Quit),
            }
        }

        if let Err(e) = self.store.update(&outcome.record, &self.options.user) {
            return Ok(Disposition::Failed(e));
        }

        let rules: Vec<String> = outcome
            .applied
            .iter()
            .map(|a| a.number.to_string())
            .collect();

        announce(
            self.options.log_stdout,
            &format!("Record {id} saved by {} (rules {})", self.options.user, rules.join(",")),
        );

        Ok(Disposition::Saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names() {
        assert_eq!("db".parse::<Output>().unwrap(), Output::Database);
        assert_eq!("mrk".parse::<Output>().unwrap(), Output::Breaker);
        assert!("xml".parse::<Output>().is_err());
    }

    #[test]
    fn answers() {
        assert_eq!("Y".parse::<Answer>().unwrap(), Answer::Yes);
        assert_eq!(" no\n".parse::<Answer>().unwrap(), Answer::No);
        assert_eq!("a".parse::<Answer>().unwrap(), Answer::All);
        assert_eq!("quit".parse::<Answer>().unwrap(), Answer::Quit);
        assert!("maybe".parse::<Answer>().is_err());
    }

    #[test]
    fn summary_display() {
        let summary = BatchSummary {
            examined: 3,
            changed: 2,
            saved: 1,
            skipped: 1,
            missing: 1,
            failed: 0,
        };
        assert_eq!(
            summary.to_string(),
            "examined=3 changed=2 saved=1 skipped=1 missing=1 failed=0"
        );
    }
}
