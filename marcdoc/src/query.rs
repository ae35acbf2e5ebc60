use std::ops::RangeInclusive;

use crate::Field;

/// Tag-based field filter, built from a numeric range or a list of
/// `:`-separated tag specs such as `"600:9xx"`.
pub struct FieldQuery {
    pub field_filter: Box<dyn Fn(&&Field) -> bool>,
}

impl FieldQuery {
    /// True if the field passes this query's filter.
    pub fn matches(&self, field: &Field) -> bool {
        (self.field_filter)(&field)
    }
}

impl From<RangeInclusive<i64>> for FieldQuery {
    fn from(range: RangeInclusive<i64>) -> Self {
        FieldQuery {
            field_filter: Box::new(move |f: &&Field| match f.tag().parse::<i64>() {
                Ok(tag_number) => range.contains(&tag_number),
                Err(_) => false,
            }),
        }
    }
}

impl From<&str> for FieldQuery {
    fn from(spec_input: &str) -> Self {
        let specs: Vec<String> = spec_input.split(':').map(str::to_owned).collect();
        FieldQuery {
            field_filter: Box::new(move |f: &&Field| specs.iter().any(|spec| f.matches_spec(spec))),
        }
    }
}
