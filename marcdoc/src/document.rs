//! JSON document encoding of a [`Record`].
//!
//! Records are stored one document per record, keyed by tag:
//!
//! ```json
//! {"_id": 42,
//!  "000": ["00000nam a2200000 a 4500"],
//!  "245": [{"indicators": [" ", " "],
//!           "subfields": [{"code": "a", "value": "Title"}]}]}
//! ```
//!
//! Keys that are not tags (`_id` aside) are ignored when reading.
use crate::record::{is_control_tag, is_tag};
use crate::{Controlfield, Field, Record, Subfield};
use serde_json::{Map, Value, json};

const ID_KEY: &str = "_id";

impl Record {
    /// Encode the record as a JSON document.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcdoc::Record;
    /// let mut record = Record::new();
    /// record.set_id(7);
    /// record.set("245", "a", "Report").unwrap();
    ///
    /// let doc = record.to_document();
    /// assert_eq!(doc["_id"], 7);
    /// assert_eq!(doc["245"][0]["subfields"][0]["value"], "Report");
    /// assert_eq!(doc["245"][0]["indicators"][1], " ");
    /// ```
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();

        if let Some(id) = self.id() {
            doc.insert(ID_KEY.to_string(), json!(id));
        }

        for cf in self.control_fields() {
            push_entry(&mut doc, cf.tag(), json!(cf.content()));
        }

        for field in self.fields() {
            let subfields: Vec<Value> = field
                .subfields()
                .iter()
                .map(|sf| json!({"code": sf.code(), "value": sf.content()}))
                .collect();

            let entry = json!({
                "indicators": [field.ind1(), field.ind2()],
                "subfields": subfields,
            });

            push_entry(&mut doc, field.tag(), entry);
        }

        Value::Object(doc)
    }

    /// Decode a record from a JSON document string.
    pub fn from_document_str(doc: &str) -> Result<Self, String> {
        let value: Value =
            serde_json::from_str(doc).map_err(|e| format!("Invalid record document: {e}"))?;
        Record::from_document(&value)
    }

    /// Decode a record from a JSON document.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcdoc::Record;
    /// let record = Record::from_document_str(r#"{
    ///     "_id": 1,
    ///     "updated": "2025-02-05T10:00:00Z",
    ///     "008": ["850101s"],
    ///     "089": [{"indicators": [" ", " "], "subfields": [{"code": "b", "value": "B22"}]}]
    /// }"#).unwrap();
    ///
    /// assert_eq!(record.id(), Some(1));
    /// assert_eq!(record.get_control_value("008"), Some("850101s"));
    /// assert_eq!(record.get_value("089", "b"), Some("B22"));
    ///
    /// assert!(Record::from_document_str(r#"{"008": [{"indicators": []}]}"#).is_err());
    /// ```
    pub fn from_document(doc: &Value) -> Result<Self, String> {
        let Some(map) = doc.as_object() else {
            return Err(format!("Record document is not an object: {doc}"));
        };

        let mut record = Record::new();

        if let Some(id) = map.get(ID_KEY) {
            let id = id
                .as_i64()
                .ok_or_else(|| format!("Record document has an invalid _id: {id}"))?;
            record.set_id(id);
        }

        for (tag, entries) in map.iter() {
            if !is_tag(tag) {
                continue;
            }

            let Some(entries) = entries.as_array() else {
                return Err(format!("Tag {tag} does not hold a list of fields"));
            };

            for entry in entries {
                if is_control_tag(tag) {
                    let content = entry
                        .as_str()
                        .ok_or_else(|| format!("Control field {tag} is not a string: {entry}"))?;
                    record.insert_control_field(Controlfield::new(tag.as_str(), content)?);
                } else {
                    record.insert_data_field(field_from_entry(tag, entry)?);
                }
            }
        }

        Ok(record)
    }
}

fn push_entry(doc: &mut Map<String, Value>, tag: &str, entry: Value) {
    match doc.get_mut(tag) {
        Some(Value::Array(list)) => list.push(entry),
        _ => {
            doc.insert(tag.to_string(), Value::Array(vec![entry]));
        }
    }
}

fn field_from_entry(tag: &str, entry: &Value) -> Result<Field, String> {
    let mut field = Field::new(tag)?;

    if let Some(inds) = entry["indicators"].as_array() {
        if let Some(ind) = inds.first().and_then(|v| v.as_str()) {
            field.set_ind1(ind)?;
        }
        if let Some(ind) = inds.get(1).and_then(|v| v.as_str()) {
            field.set_ind2(ind)?;
        }
    }

    let Some(subfields) = entry["subfields"].as_array() else {
        return Err(format!("Field {tag} has no subfield list: {entry}"));
    };

    for sf in subfields {
        let (Some(code), Some(value)) = (sf["code"].as_str(), sf["value"].as_str()) else {
            return Err(format!("Invalid subfield in field {tag}: {sf}"));
        };
        field.subfields_mut().push(Subfield::new(code, value)?);
    }

    Ok(field)
}
