//! Script utilities.
use crate::db::DatabaseConnection;
use crate::result::EditResult;
use chrono::{DateTime, FixedOffset, Local, NaiveDate};

const HELP_TEXT: &str = "
ScriptUtil Additions:

    --help
        Show help text

    --user <name>
        Name recorded as the editor of saved records.

    --log-level <filter>
        env_logger filter, e.g. 'info' or 'bibedit=debug'.  Overrides
        RUST_LOG.  Defaults to 'info'.

    --log-stdout
        Also print change announcements to STDOUT.

Database Connector Additions:

    Parameters supported when ScriptUtil is started with a database connection.
    PG environment variables (PGHOST, PGPORT, ...) are used as defaults.

    --db-host
    --db-port
    --db-user
    --db-pass
    --db-name
";

const DEFAULT_LOG_FILTER: &str = "info";

pub struct ScriptUtil {
    user: String,
    log_stdout: bool,
    params: getopts::Matches,
    db: Option<DatabaseConnection>,
}

impl ScriptUtil {
    /// Parse the command line parameters, set up logging, and
    /// optionally connect to the database.
    ///
    /// Return None if a command line option results in early exit, e.g. --help.
    ///
    /// * `ops` - getopts in progress
    /// * `with_database` - if true, connect to the database.
    /// * `default_user` - editor name used when --user is not provided.
    /// * `help_text` - Optional script-specific help text.  This text will
    ///    be augmented with ScriptUtil help text.
    pub fn init(
        ops: &mut getopts::Options,
        with_database: bool,
        default_user: &str,
        help_text: Option<&str>,
    ) -> EditResult<Option<ScriptUtil>> {
        let args: Vec<String> = std::env::args().skip(1).collect();

        let Some(mut script) = ScriptUtil::parse(ops, &args, with_database, default_user)? else {
            println!(
                "{}\n{}",
                help_text.unwrap_or("No Application Help Text Provided"),
                HELP_TEXT
            );
            return Ok(None);
        };

        script.init_logging()?;

        if with_database {
            let mut db = DatabaseConnection::new_from_options(&script.params)?;
            db.connect()?;
            script.db = Some(db);
        }

        Ok(Some(script))
    }

    /// Parse the provided arguments without side effects.
    ///
    /// None if --help was requested.
    fn parse(
        ops: &mut getopts::Options,
        args: &[String],
        with_database: bool,
        default_user: &str,
    ) -> EditResult<Option<ScriptUtil>> {
        ops.optflag("h", "help", "");
        ops.optopt("", "user", "", "");
        ops.optopt("", "log-level", "", "");
        ops.optflag("", "log-stdout", "");

        if with_database {
            // Append the database-specific command line options.
            DatabaseConnection::append_options(ops);
        }

        let params = ops
            .parse(args)
            .map_err(|e| format!("Error parsing options: {e}"))?;

        if params.opt_present("help") {
            return Ok(None);
        }

        let user = params
            .opt_str("user")
            .unwrap_or_else(|| default_user.to_string());

        if user.trim().is_empty() {
            return Err("--user cannot be empty".into());
        }

        Ok(Some(ScriptUtil {
            user,
            log_stdout: params.opt_present("log-stdout"),
            params,
            db: None,
        }))
    }

    fn init_logging(&self) -> EditResult<()> {
        let env = env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER);
        let mut builder = env_logger::Builder::from_env(env);

        if let Some(filter) = self.params.opt_str("log-level") {
            builder.parse_filters(&filter);
        }

        builder
            .try_init()
            .map_err(|e| format!("Cannot init logger: {e}").into())
    }

    pub fn params(&self) -> &getopts::Matches {
        &self.params
    }

    /// Editor name applied to saved records.
    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn log_stdout(&self) -> bool {
        self.log_stdout
    }

    /// Take ownership of the database connection.
    ///
    /// Err if the script was not started with a database connection or
    /// the connection was already taken.
    pub fn take_db(&mut self) -> EditResult<DatabaseConnection> {
        self.db
            .take()
            .ok_or_else(|| "No database connection available".into())
    }

    /// Parse an optional integer option.
    pub fn opt_i64(&self, name: &str) -> EditResult<Option<i64>> {
        match self.params.opt_str(name) {
            Some(v) => v
                .parse::<i64>()
                .map(Some)
                .map_err(|e| format!("Error parsing --{name}: {e}").into()),
            None => Ok(None),
        }
    }
}

/// Parse an ISO 8601 datetime, or a bare YYYY-MM-DD date taken as
/// local midnight.
pub fn parse_datetime(dt: &str) -> EditResult<DateTime<FixedOffset>> {
    if let Ok(full) = dt.parse::<DateTime<FixedOffset>>() {
        return Ok(full);
    }

    let date = NaiveDate::parse_from_str(dt, "%Y-%m-%d")
        .map_err(|e| format!("Could not parse datetime string: {e} {dt}"))?;

    date.and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
        .map(|local| local.fixed_offset())
        .ok_or_else(|| format!("No local midnight on {dt}").into())
}

/// Log a record modification and optionally echo it to STDOUT.
pub fn announce(log_stdout: bool, s: &str) {
    if log_stdout {
        println!("{} {s}", Local::now().format("%F %T%.3f"));
    }
    log::info!("{s}");
}
