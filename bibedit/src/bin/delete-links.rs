use bibedit::EditResult;
use bibedit::db::PgStore;
use bibedit::links;
use bibedit::script::ScriptUtil;

const DEFAULT_USER: &str = "admin";

const HELP_TEXT: &str = "
Delete specific 856 links from bib records and save each edited record.

    --data-file <path>
        Tab-separated file with a header row, then one
        '<record id> <TAB> <url>' line per link to delete.  Required.
";

fn main() -> EditResult<()> {
    let mut ops = getopts::Options::new();

    ops.optopt("", "data-file", "", "");

    let mut scripter = match ScriptUtil::init(&mut ops, true, DEFAULT_USER, Some(HELP_TEXT))? {
        Some(s) => s,
        None => return Ok(()), // e.g. --help
    };

    let Some(path) = scripter.params().opt_str("data-file") else {
        return Err("--data-file is required".into());
    };

    let requests = links::read_link_file(&path)?;
    log::info!("Read {} link(s) to delete from {path}", requests.len());

    let mut store = PgStore::new(scripter.take_db()?);

    let summary = links::delete_links(
        &mut store,
        &requests,
        scripter.user(),
        scripter.log_stdout(),
    );

    eprintln!("{summary}");

    Ok(())
}
