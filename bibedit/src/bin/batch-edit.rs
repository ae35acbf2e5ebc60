use bibedit::EditResult;
use bibedit::batch::{AutoConfirm, BatchEditor, BatchOptions, Confirm, Output, PromptConfirm};
use bibedit::batches;
use bibedit::db::PgStore;
use bibedit::script::{self, ScriptUtil};
use bibedit::store::{MemoryStore, RecordQuery, RecordStore};
use std::fs;
use std::io::{self, Write};

const DEFAULT_USER: &str = "batch_edit";
const DEFAULT_BATCH: &str = "batch-one";

const HELP_TEXT: &str = "
Apply a batch of edit rules to bib records.

By default, all non-deleted bib records are processed and each change
is shown for confirmation before it is saved.

    --batch <name>
        Rule set to apply.  Defaults to 'batch-one'.

    --output <db|mrk>
        'db' saves edited records.  'mrk' prints each change and the
        edited record as breaker text and saves nothing.  Defaults to 'db'.

    --skip-confirm
        Save changes without asking.

    --record-id <id>
        Process a single record.

    --min-id <id>
        Minimum record ID to process.

    --max-id <id>
        Maximum record ID to process.

    --modified-since <ISO date>
        Limit to records whose edit date is >= the provided date.

    --limit <count>
        Process at most this many records.

    --query-file <path>
        File containing SQL that returns an 'id' column of records to
        process.  Other filters are ignored.

    --input-file <path>
        Read records from a JSON-lines file of record documents instead
        of the database.  Implies no database connection.
";

fn query_from_options(scripter: &ScriptUtil) -> EditResult<RecordQuery> {
    let params = scripter.params();

    let modified_since = match params.opt_str("modified-since") {
        Some(ref date_str) => Some(script::parse_datetime(date_str)?),
        None => None,
    };

    let limit = match params.opt_str("limit") {
        Some(l) => Some(
            l.parse::<usize>()
                .map_err(|e| format!("Error parsing --limit: {e}"))?,
        ),
        None => None,
    };

    let sql = match params.opt_str("query-file") {
        Some(path) => Some(
            fs::read_to_string(&path).map_err(|e| format!("Cannot read {path}: {e}"))?,
        ),
        None => None,
    };

    Ok(RecordQuery {
        record_id: scripter.opt_i64("record-id")?,
        min_id: scripter.opt_i64("min-id")?,
        max_id: scripter.opt_i64("max-id")?,
        modified_since,
        limit,
        sql,
    })
}

fn run_batch<S: RecordStore>(
    store: S,
    scripter: &ScriptUtil,
    options: BatchOptions,
) -> EditResult<()> {
    let name = scripter
        .params()
        .opt_str("batch")
        .unwrap_or_else(|| DEFAULT_BATCH.to_string());

    let Some(rules) = batches::lookup(&name) else {
        return Err(format!(
            "No such batch: '{name}'.  Known batches: {}",
            batches::NAMES.join(", ")
        )
        .into());
    };

    let query = query_from_options(scripter)?;

    let prompt = !options.skip_confirm && options.output == Output::Database;

    let mut confirm: Box<dyn Confirm> = if prompt {
        Box::new(PromptConfirm::new()?)
    } else {
        Box::new(AutoConfirm)
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut editor = BatchEditor::new(store, rules, options);
    let summary = editor.run(&query, confirm.as_mut(), &mut out)?;

    out.flush()?;

    eprintln!("{name}: {summary}");

    Ok(())
}

fn main() -> EditResult<()> {
    let mut ops = getopts::Options::new();

    ops.optopt("", "batch", "", "");
    ops.optopt("", "output", "", "");
    ops.optflag("", "skip-confirm", "");
    ops.optopt("", "record-id", "", "");
    ops.optopt("", "min-id", "", "");
    ops.optopt("", "max-id", "", "");
    ops.optopt("", "modified-since", "", "");
    ops.optopt("", "limit", "", "");
    ops.optopt("", "query-file", "", "");
    ops.optopt("", "input-file", "", "");

    // --input-file runs offline.  Peek for it before deciding whether
    // ScriptUtil should connect.
    let offline = std::env::args().any(|a| a == "--input-file" || a.starts_with("--input-file="));

    let mut scripter = match ScriptUtil::init(&mut ops, !offline, DEFAULT_USER, Some(HELP_TEXT))? {
        Some(s) => s,
        None => return Ok(()), // e.g. --help
    };

    let output = match scripter.params().opt_str("output") {
        Some(o) => o.parse::<Output>()?,
        None => Output::Database,
    };

    let options = BatchOptions {
        user: scripter.user().to_string(),
        output,
        skip_confirm: scripter.params().opt_present("skip-confirm"),
        log_stdout: scripter.log_stdout(),
    };

    if let Some(path) = scripter.params().opt_str("input-file") {
        let store = MemoryStore::from_jsonl_file(&path)?;
        log::info!("Loaded {} record(s) from {path}", store.len());
        return run_batch(store, &scripter, options);
    }

    let store = PgStore::new(scripter.take_db()?);
    run_batch(store, &scripter, options)
}
