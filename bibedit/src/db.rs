//! Create, connect, and manage database connections.
use crate::result::EditResult;
use crate::store::{RecordQuery, RecordStore, StoredRecord};
use chrono::{DateTime, Utc};
use log::debug;
use marcdoc::Record;
use postgres as pg;
use postgres::types::ToSql;
use std::env;

const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_USER: &str = "bibedit";
const DEFAULT_DB_NAME: &str = "bibedit";

/// For compiling a set of connection parameters
///
/// Values are applied like so:
///
/// 1. Values provided via getopts::Matches struct.
/// 2. Values pulled from the environment (e.g. PGHOST) where possible.
/// 3. Default values defined in this module.
#[derive(Default)]
pub struct DatabaseConnectionBuilder {
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    database: Option<String>,
    application: Option<String>,
}

impl DatabaseConnectionBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Set connection values via getopts matches.
    ///
    /// Supported options:
    ///     --db-host
    ///     --db-port
    ///     --db-user
    ///     --db-pass
    ///     --db-name
    pub fn set_opts(&mut self, params: &getopts::Matches) -> EditResult<()> {
        self.host = self.host.take().or_else(|| params.opt_str("db-host"));
        self.user = self.user.take().or_else(|| params.opt_str("db-user"));
        self.password = self.password.take().or_else(|| params.opt_str("db-pass"));
        self.database = self.database.take().or_else(|| params.opt_str("db-name"));

        if self.port.is_none() {
            if let Some(v) = params.opt_str("db-port") {
                let port = v
                    .parse::<u16>()
                    .map_err(|e| format!("Invalid --db-port value '{v}': {e}"))?;
                self.port = Some(port);
            }
        }

        Ok(())
    }

    pub fn set_application(&mut self, application: &str) {
        self.application = Some(application.to_string());
    }

    fn from_env(name: &str) -> Option<String> {
        env::var(name).ok()
    }

    /// Create the final database connection object from the collected
    /// parameters.
    pub fn build(self) -> EditResult<DatabaseConnection> {
        let host = self
            .host
            .or_else(|| Self::from_env("PGHOST"))
            .unwrap_or_else(|| DEFAULT_DB_HOST.to_string());

        let password = self.password.or_else(|| Self::from_env("PGPASSWORD"));

        let user = self
            .user
            .or_else(|| Self::from_env("PGUSER"))
            .unwrap_or_else(|| DEFAULT_DB_USER.to_string());

        let database = self
            .database
            .or_else(|| Self::from_env("PGDATABASE"))
            .unwrap_or_else(|| DEFAULT_DB_NAME.to_string());

        let port = match self.port {
            Some(p) => p,
            None => match Self::from_env("PGPORT") {
                Some(p) => p
                    .parse::<u16>()
                    .map_err(|e| format!("Invalid PGPORT value '{p}': {e}"))?,
                None => DEFAULT_DB_PORT,
            },
        };

        let mut dsn = format!("host={host} port={port} user={user} dbname={database}");

        if let Some(ref p) = password {
            dsn += &format!(" password={p}");
        }

        if let Some(ref app) = self.application {
            dsn += &format!(" application_name={app}");
        }

        Ok(DatabaseConnection { dsn, client: None })
    }
}

/// Wrapper for a postgres::Client with connection metadata.
pub struct DatabaseConnection {
    client: Option<pg::Client>,
    dsn: String,
}

impl DatabaseConnection {
    /// Add options to an in-progress getopts::Options related to creating
    /// a database connection.
    pub fn append_options(options: &mut getopts::Options) {
        options.optopt("", "db-host", "Database Host", "DB_HOST");
        options.optopt("", "db-port", "Database Port", "DB_PORT");
        options.optopt("", "db-user", "Database User", "DB_USER");
        options.optopt("", "db-pass", "Database Password", "DB_PASSWORD");
        options.optopt("", "db-name", "Database Name", "DB_NAME");
    }

    pub fn builder() -> DatabaseConnectionBuilder {
        DatabaseConnectionBuilder::new()
    }

    /// Create a new DB connection from a set of gettops matches.
    pub fn new_from_options(params: &getopts::Matches) -> EditResult<Self> {
        let mut builder = DatabaseConnectionBuilder::new();
        builder.set_opts(params)?;
        builder.set_application("bibedit");
        builder.build()
    }

    /// Our connection string
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// Mutable client ref
    pub fn client(&mut self) -> EditResult<&mut pg::Client> {
        self.client
            .as_mut()
            .ok_or_else(|| "DatabaseConnection is not connected".into())
    }

    /// Connect to the database
    ///
    /// Non-TLS connections only supported at present.
    pub fn connect(&mut self) -> EditResult<()> {
        debug!("Connecting to DB {}", self.dsn());
        let client = pg::Client::connect(self.dsn(), pg::NoTls)
            .map_err(|e| format!("Error connecting to database: {e}"))?;
        self.client = Some(client);
        Ok(())
    }
}

/// Record store backed by the bibedit.bib_record table.
///
/// See sql/schema.sql.
pub struct PgStore {
    db: DatabaseConnection,
}

impl PgStore {
    pub fn new(db: DatabaseConnection) -> Self {
        PgStore { db }
    }

    /// Compile the ID search for the provided query.
    ///
    /// Returns the SQL and the positional parameter values.
    fn id_search<'a>(query: &'a RecordQuery) -> (String, Vec<&'a (dyn ToSql + Sync)>) {
        if let Some(sql) = query.sql.as_ref() {
            return (sql.to_string(), Vec::new());
        }

        let mut params: Vec<&'a (dyn ToSql + Sync)> = Vec::new();
        let mut where_ = String::from("WHERE NOT rec.deleted");

        let mut filter = |clause: &str, value: &'a (dyn ToSql + Sync)| {
            params.push(value);
            where_ += &format!(" AND {clause} ${}", params.len());
        };

        if let Some(id) = query.record_id.as_ref() {
            filter("rec.id =", id);
        }

        if let Some(min) = query.min_id.as_ref() {
            filter("rec.id >=", min);
        }

        if let Some(max) = query.max_id.as_ref() {
            filter("rec.id <=", max);
        }

        if let Some(since) = query.modified_since.as_ref() {
            filter("rec.edit_date >=", since);
        }

        let mut sql = format!("SELECT rec.id FROM bibedit.bib_record rec {where_} ORDER BY rec.id");

        if let Some(limit) = query.limit {
            sql += &format!(" LIMIT {limit}");
        }

        (sql, params)
    }
}

impl RecordStore for PgStore {
    fn find_ids(&mut self, query: &RecordQuery) -> EditResult<Vec<i64>> {
        let (sql, params) = PgStore::id_search(query);

        log::info!("Searching for records to edit: {sql}");

        let rows = self.db.client()?.query(sql.as_str(), &params)?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id")?;
            ids.push(id);
        }

        if query.sql.is_some() {
            // Operator SQL may return any order.
            ids.sort_unstable();
            ids.dedup();
        }

        Ok(ids)
    }

    fn retrieve(&mut self, id: i64) -> EditResult<Option<StoredRecord>> {
        let sql = "
            SELECT marc, editor, edit_date
            FROM bibedit.bib_record
            WHERE id = $1 AND NOT deleted
        ";

        let Some(row) = self.db.client()?.query_opt(sql, &[&id])? else {
            return Ok(None);
        };

        let doc: serde_json::Value = row.try_get("marc")?;
        let mut record = Record::from_document(&doc)
            .map_err(|e| format!("Error parsing record {id}: {e}"))?;

        // The row ID wins over any _id value embedded in the document.
        record.set_id(id);

        let user: Option<String> = row.try_get("editor")?;
        let updated: Option<DateTime<Utc>> = row.try_get("edit_date")?;

        Ok(Some(StoredRecord {
            record,
            user,
            updated,
        }))
    }

    fn update(&mut self, record: &Record, user: &str) -> EditResult<()> {
        let Some(id) = record.id() else {
            return Err("Cannot update a record that has no ID".into());
        };

        let doc = record.to_document();

        let mut xact = self.db.client()?.transaction()?;

        xact.execute(
            "INSERT INTO bibedit.bib_record_history (record, marc, editor, edit_date)
             SELECT id, marc, editor, edit_date FROM bibedit.bib_record WHERE id = $1",
            &[&id],
        )?;

        let updated = xact.execute(
            "UPDATE bibedit.bib_record
             SET marc = $2, editor = $3, edit_date = NOW()
             WHERE id = $1",
            &[&id, &doc, &user],
        )?;

        if updated != 1 {
            // Dropping the transaction rolls it back.
            return Err(format!("No such record: {id}").into());
        }

        xact.commit()?;

        debug!("Saved record {id} as {user}");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_uses_options() {
        let mut ops = getopts::Options::new();
        DatabaseConnection::append_options(&mut ops);

        let params = ops
            .parse(["--db-host", "db.example.org", "--db-port", "5433", "--db-name", "catalog"])
            .unwrap();

        let mut builder = DatabaseConnection::builder();
        builder.set_opts(&params).unwrap();
        let db = builder.build().unwrap();

        assert!(db.dsn().starts_with("host=db.example.org port=5433 "));
        assert!(db.dsn().contains("dbname=catalog"));
    }

    #[test]
    fn bad_port_is_an_error() {
        let mut ops = getopts::Options::new();
        DatabaseConnection::append_options(&mut ops);
        let params = ops.parse(["--db-port", "many"]).unwrap();
        assert!(DatabaseConnection::builder().set_opts(&params).is_err());
    }

    #[test]
    fn unconnected_client_is_an_error() {
        let mut db = DatabaseConnection::builder().build().unwrap();
        assert!(db.client().is_err());
    }

    #[test]
    fn id_search_sql() {
        let query = RecordQuery {
            min_id: Some(10),
            max_id: Some(20),
            limit: Some(5),
            ..Default::default()
        };

        let (sql, params) = PgStore::id_search(&query);

        assert_eq!(
            sql,
            "SELECT rec.id FROM bibedit.bib_record rec \
             WHERE NOT rec.deleted AND rec.id >= $1 AND rec.id <= $2 \
             ORDER BY rec.id LIMIT 5"
        );
        assert_eq!(params.len(), 2);

        let query = RecordQuery {
            sql: Some("SELECT id FROM bibedit.bib_record WHERE id < 100".to_string()),
            min_id: Some(10),
            ..Default::default()
        };
        let (sql, params) = PgStore::id_search(&query);
        assert!(sql.ends_with("id < 100"));
        assert!(params.is_empty());
    }
}
