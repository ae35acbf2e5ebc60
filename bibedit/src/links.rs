//! Remove specific 856 links from records.
//!
//! Input is a tab-separated file with a header row followed by
//! `record id <TAB> url` lines.
use crate::result::EditResult;
use crate::script::announce;
use crate::store::RecordStore;
use marcdoc::Record;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};

const LINK_TAG: &str = "856";
const URL_CODE: &str = "u";

#[derive(Debug, Clone, PartialEq)]
pub struct LinkDeletion {
    pub record_id: i64,
    pub url: String,
}

/// Parse link deletion requests.
///
/// ```
/// use bibedit::links::read_links;
///
/// let data = "id\turl\n12\thttps://example.org/a.pdf\n";
/// let links = read_links(data.as_bytes()).unwrap();
///
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].record_id, 12);
/// assert_eq!(links[0].url, "https://example.org/a.pdf");
/// ```
pub fn read_links(reader: impl Read) -> EditResult<Vec<LinkDeletion>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(BufReader::new(reader));

    let mut links = Vec::new();

    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        // Header is line 1.
        let line = idx + 2;

        let (Some(id), Some(url)) = (row.get(0), row.get(1)) else {
            return Err(format!("Line {line}: expected record id and url").into());
        };

        let record_id = id
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("Line {line}: invalid record id '{id}': {e}"))?;

        links.push(LinkDeletion {
            record_id,
            url: url.trim().to_string(),
        });
    }

    Ok(links)
}

pub fn read_link_file(path: &str) -> EditResult<Vec<LinkDeletion>> {
    let file = File::open(path).map_err(|e| format!("Cannot open {path}: {e}"))?;
    read_links(file)
}

/// Remove the first 856 whose first $u is `url`.
///
/// Returns true if a field was removed.
pub fn delete_link(record: &mut Record, url: &str) -> bool {
    let pos = record
        .fields()
        .iter()
        .position(|f| f.tag() == LINK_TAG && f.first_value(URL_CODE) == Some(url));

    match pos {
        Some(idx) => {
            record.fields_mut().remove(idx);
            true
        }
        None => false,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkSummary {
    pub deleted: usize,
    /// Records that had no matching link.
    pub not_found: usize,
    pub failed: usize,
}

impl fmt::Display for LinkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "deleted={} not_found={} failed={}",
            self.deleted, self.not_found, self.failed
        )
    }
}

/// Delete each requested link and save the record as `user`.
///
/// Missing records and failed saves are logged and counted.
pub fn delete_links(
    store: &mut dyn RecordStore,
    links: &[LinkDeletion],
    user: &str,
    log_stdout: bool,
) -> LinkSummary {
    let mut summary = LinkSummary::default();

    for link in links {
        let id = link.record_id;

        let mut record = match store.retrieve(id) {
            Ok(Some(stored)) => stored.record,
            Ok(None) => {
                log::warn!("No such record: {id}");
                summary.not_found += 1;
                continue;
            }
            Err(e) => {
                log::error!("Error loading record {id}: {e}");
                summary.failed += 1;
                continue;
            }
        };

        if !delete_link(&mut record, &link.url) {
            log::warn!("Record {id} has no 856 link {}", link.url);
            summary.not_found += 1;
            continue;
        }

        if let Err(e) = store.update(&record, user) {
            log::error!("Error saving record {id}: {e}");
            summary.failed += 1;
            continue;
        }

        announce(log_stdout, &format!("Deleted 856 {} from record {id}", link.url));
        summary.deleted += 1;
    }

    log::info!("Link deletion complete: {summary}");

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_first_match_is_removed() {
        let mut record = Record::from_breaker(
            "=856 40$uhttp://a.example/x.pdf\n\
             =856 40$uhttp://b.example/y.pdf\n\
             =856 40$uhttp://a.example/x.pdf",
        )
        .unwrap();

        assert!(delete_link(&mut record, "http://a.example/x.pdf"));
        assert_eq!(
            record.get_values("856", "u"),
            ["http://b.example/y.pdf", "http://a.example/x.pdf"]
        );

        assert!(!delete_link(&mut record, "http://c.example/z.pdf"));
    }

    #[test]
    fn link_matches_first_url_only() {
        let mut record =
            Record::from_breaker("=856 40$uhttp://a.example/x.pdf$uhttp://b.example/y.pdf")
                .unwrap();
        assert!(!delete_link(&mut record, "http://b.example/y.pdf"));
        assert_eq!(record.get_fields("856").len(), 1);
    }

    #[test]
    fn bad_record_id() {
        let data = "id\turl\nabc\thttp://a.example\n";
        let err = read_links(data.as_bytes()).unwrap_err();
        assert!(err.to_string().starts_with("Line 2:"));
    }
}
