//! Base MARC record model and associated components.
const TAG_SIZE: usize = 3;
const CODE_SIZE: usize = 1;
const DEFAULT_INDICATOR: &str = " ";

/// Control fields hold tags 000 through 009.  Tag 000 carries the leader.
const LAST_CONTROL_TAG: &str = "009";

/// Verifies the provided string is composed of 'len' number of bytes.
fn check_byte_count(s: &str, len: usize) -> Result<(), String> {
    let byte_len = s.len();
    if byte_len != len {
        return Err(format!(
            "Invalid byte count for string s={s} wanted={len} found={byte_len}"
        ));
    }
    Ok(())
}

/// Tags are three ASCII digits.
fn check_tag(tag: &str) -> Result<(), String> {
    check_byte_count(tag, TAG_SIZE)?;
    if !tag.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("Invalid tag: {tag}"));
    }
    Ok(())
}

/// True for a well-formed tag: three ASCII digits.
///
/// ```
/// use marcdoc::record::is_tag;
/// assert!(is_tag("245"));
/// assert!(!is_tag("usr"));
/// assert!(!is_tag("24"));
/// ```
pub fn is_tag(tag: &str) -> bool {
    check_tag(tag).is_ok()
}

/// True if the tag belongs to a control field.
pub fn is_control_tag(tag: &str) -> bool {
    tag <= LAST_CONTROL_TAG
}

/// MARC Control Field whose tag value is < "010"
#[derive(Debug, Clone, PartialEq)]
pub struct Controlfield {
    tag: String,
    content: String,
}

impl Controlfield {
    /// Create a Controlfield with the provided tag and content.
    ///
    /// # Examples
    ///
    /// ```
    /// let cf = marcdoc::Controlfield::new("008", "12345").unwrap();
    /// assert_eq!(cf.tag(), "008");
    ///
    /// let leader = marcdoc::Controlfield::new("000", "00000nam a2200000 a 4500");
    /// assert!(leader.is_ok());
    ///
    /// let cf = marcdoc::Controlfield::new("010", "12345");
    /// assert_eq!(cf.unwrap_err(), "Invalid Controlfield tag: 010");
    /// ```
    pub fn new(tag: impl Into<String>, content: impl Into<String>) -> Result<Self, String> {
        let tag = tag.into();
        check_tag(&tag)?;

        if !is_control_tag(&tag) {
            return Err(format!("Invalid Controlfield tag: {tag}"));
        }

        Ok(Controlfield {
            tag,
            content: content.into(),
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }
}

/// A single subfield code + value pair
#[derive(Debug, Clone, PartialEq)]
pub struct Subfield {
    code: String,
    content: String,
}

impl Subfield {
    /// Create a Subfield with the provided code and content.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcdoc::Subfield;
    /// let sf = Subfield::new("a", "Στη σκιά της πεταλούδας").unwrap();
    /// assert_eq!(sf.content(), "Στη σκιά της πεταλούδας");
    ///
    /// assert!(Subfield::new("🦋", "Στη σκιά της πεταλούδας").is_err());
    /// ```
    pub fn new(code: impl Into<String>, content: impl Into<String>) -> Result<Self, String> {
        let code = code.into();
        check_byte_count(&code, CODE_SIZE)?;
        Ok(Subfield {
            code,
            content: content.into(),
        })
    }

    /// Get the Subfield content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Set the Subfield content.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Get the Subfield code.
    pub fn code(&self) -> &str {
        &self.code
    }
}

/// A MARC Data Field with tag, indicators, and subfields.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    tag: String,
    ind1: String,
    ind2: String,
    subfields: Vec<Subfield>,
}

impl Field {
    /// Create a Field with the provided tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcdoc::Field;
    ///
    /// let field = Field::new("245").unwrap();
    /// assert_eq!(field.tag(), "245");
    /// assert_eq!(field.ind1(), " ");
    /// assert_eq!(field.ind2(), " ");
    /// assert!(field.subfields().is_empty());
    ///
    /// assert!(Field::new("008").is_err());
    /// assert!(Field::new("DAT").is_err());
    /// ```
    pub fn new(tag: impl Into<String>) -> Result<Self, String> {
        let tag = tag.into();
        check_tag(&tag)?;

        if is_control_tag(&tag) {
            return Err(format!("Invalid data field tag: {tag}"));
        }

        Ok(Field {
            tag,
            ind1: DEFAULT_INDICATOR.to_string(),
            ind2: DEFAULT_INDICATOR.to_string(),
            subfields: Vec::new(),
        })
    }

    /// Get the tag
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Change the tag, e.g. when moving a heading from 100 to 700.
    ///
    /// Err if the new tag is not a data field tag.
    pub fn set_tag(&mut self, tag: impl Into<String>) -> Result<(), String> {
        let tag = tag.into();
        check_tag(&tag)?;
        if is_control_tag(&tag) {
            return Err(format!("Cannot retag data field {} as {tag}", self.tag));
        }
        self.tag = tag;
        Ok(())
    }

    /// Get the value of indicator-1.  Blank is a single space.
    pub fn ind1(&self) -> &str {
        &self.ind1
    }

    /// Get the value of indicator-2.  Blank is a single space.
    pub fn ind2(&self) -> &str {
        &self.ind2
    }

    /// Get the full list of subfields
    pub fn subfields(&self) -> &Vec<Subfield> {
        &self.subfields
    }

    /// Get a mutable list of subfields.
    pub fn subfields_mut(&mut self) -> &mut Vec<Subfield> {
        &mut self.subfields
    }

    /// Set the indicator-1 value.
    pub fn set_ind1(&mut self, ind: impl Into<String>) -> Result<(), String> {
        let ind = ind.into();
        check_byte_count(&ind, CODE_SIZE)?;
        self.ind1 = ind;
        Ok(())
    }

    /// Set the indicator-2 value.
    pub fn set_ind2(&mut self, ind: impl Into<String>) -> Result<(), String> {
        let ind = ind.into();
        check_byte_count(&ind, CODE_SIZE)?;
        self.ind2 = ind;
        Ok(())
    }

    /// Reset both indicators to blank.
    ///
    /// Returns true if either indicator held a non-blank value.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcdoc::Field;
    ///
    /// let mut field = Field::new("245").unwrap();
    /// field.set_ind1("1").unwrap();
    /// field.set_ind2("4").unwrap();
    ///
    /// assert!(field.clear_indicators());
    /// assert_eq!(field.ind1(), " ");
    /// assert_eq!(field.ind2(), " ");
    /// assert!(!field.clear_indicators());
    /// ```
    pub fn clear_indicators(&mut self) -> bool {
        let changed = self.ind1() != DEFAULT_INDICATOR || self.ind2() != DEFAULT_INDICATOR;
        self.ind1 = DEFAULT_INDICATOR.to_string();
        self.ind2 = DEFAULT_INDICATOR.to_string();
        changed
    }

    /// Get a list of subfields with the provided code.
    pub fn get_subfields(&self, code: &str) -> Vec<&Subfield> {
        self.subfields.iter().filter(|f| f.code() == code).collect()
    }

    /// Get the first occurrence of the subfield with the provided code,
    /// if one is present.
    pub fn first_subfield(&self, code: &str) -> Option<&Subfield> {
        self.subfields.iter().find(|f| f.code() == code)
    }

    /// Content of the first subfield with the provided code.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcdoc::Field;
    ///
    /// let mut field = Field::new("099").unwrap();
    /// assert!(field.first_value("c").is_none());
    ///
    /// field.add_subfield("c", "internet").unwrap();
    /// field.add_subfield("c", "print").unwrap();
    ///
    /// assert_eq!(field.first_value("c"), Some("internet"));
    /// ```
    pub fn first_value(&self, code: &str) -> Option<&str> {
        self.first_subfield(code).map(|sf| sf.content())
    }

    /// True if a subfield with the provided code is present.
    pub fn has_subfield(&self, code: &str) -> bool {
        self.subfields.iter().any(|f| f.code() == code)
    }

    /// Get a mutable list of subfields with the provided code.
    pub fn get_subfields_mut(&mut self, code: &str) -> Vec<&mut Subfield> {
        self.subfields
            .iter_mut()
            .filter(|f| f.code() == code)
            .collect()
    }

    /// Adds a new Subfield to this field using the provided code and content.
    pub fn add_subfield(
        &mut self,
        code: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), String> {
        self.subfields.push(Subfield::new(code, content)?);
        Ok(())
    }

    /// Remove all subfields with the specified code and returns
    /// the count of removed subfields.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcdoc::Field;
    /// let mut field = Field::new("505").unwrap();
    /// field.add_subfield("t", "Chapter 1 /").unwrap();
    /// field.add_subfield("r", "Cool author --").unwrap();
    /// field.add_subfield("t", "Chapter 2.").unwrap();
    ///
    /// assert_eq!(field.remove_subfields("t"), 2);
    /// assert_eq!(field.subfields().len(), 1);
    /// ```
    pub fn remove_subfields(&mut self, code: &str) -> usize {
        self.remove_subfields_where(code, |_| true)
    }

    /// Remove the subfields with the specified code for which `pred`
    /// returns true.  Returns the count of removed subfields.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcdoc::Field;
    /// let mut field = Field::new("089").unwrap();
    /// field.add_subfield("a", "veto").unwrap();
    /// field.add_subfield("a", "B22 speech").unwrap();
    /// field.add_subfield("b", "B22").unwrap();
    ///
    /// assert_eq!(field.remove_subfields_where("a", |sf| sf.content() != "veto"), 1);
    /// assert_eq!(field.first_value("a"), Some("veto"));
    /// assert_eq!(field.first_value("b"), Some("B22"));
    /// ```
    pub fn remove_subfields_where(
        &mut self,
        code: &str,
        mut pred: impl FnMut(&Subfield) -> bool,
    ) -> usize {
        let before = self.subfields.len();
        self.subfields.retain(|sf| !(sf.code == code && pred(sf)));
        before - self.subfields.len()
    }

    /// True if the tag matches a spec like "505", "5xx" or "x05".
    ///
    /// # Examples
    ///
    /// ```
    /// use marcdoc::Field;
    /// let field = Field::new("505").unwrap();
    /// assert!(field.matches_spec("505"));
    /// assert!(field.matches_spec("5xx"));
    /// assert!(field.matches_spec("5X5"));
    ///
    /// assert!(!field.matches_spec("6xx"));
    /// assert!(!field.matches_spec("invalid spec"));
    /// ```
    pub fn matches_spec(&self, spec: &str) -> bool {
        if spec.len() != TAG_SIZE {
            return false;
        };
        spec.chars()
            .zip(self.tag().chars())
            .all(|(spec_char, tag_char)| {
                spec_char.eq_ignore_ascii_case(&'x') || spec_char == tag_char
            })
    }
}

/// A MARC record with an optional database ID, control fields, and
/// data fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    id: Option<i64>,
    control_fields: Vec<Controlfield>,
    fields: Vec<Field>,
}

impl Record {
    /// Create a new, empty, unsaved Record.
    pub fn new() -> Self {
        Record::default()
    }

    /// Database ID of the record, None until the record has been saved.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    /// Get the full list of control fields.
    pub fn control_fields(&self) -> &Vec<Controlfield> {
        &self.control_fields
    }
    /// Get the full list of control fields, mutable.
    pub fn control_fields_mut(&mut self) -> &mut Vec<Controlfield> {
        &mut self.control_fields
    }
    /// Get the full list of fields.
    pub fn fields(&self) -> &Vec<Field> {
        &self.fields
    }
    /// Get the full list of fields, mutable.
    pub fn fields_mut(&mut self) -> &mut Vec<Field> {
        &mut self.fields
    }

    /// Return a list of control fields with the provided tag.
    pub fn get_control_fields(&self, tag: &str) -> Vec<&Controlfield> {
        self.control_fields
            .iter()
            .filter(|f| f.tag() == tag)
            .collect()
    }

    /// Content of the first control field with the provided tag.
    pub fn get_control_value(&self, tag: &str) -> Option<&str> {
        self.control_fields
            .iter()
            .find(|f| f.tag() == tag)
            .map(|f| f.content())
    }

    /// Return a list of fields with the provided tag.
    pub fn get_fields(&self, tag: &str) -> Vec<&Field> {
        self.fields.iter().filter(|f| f.tag() == tag).collect()
    }

    /// Return a mutable list of fields with the provided tag.
    pub fn get_fields_mut(&mut self, tag: &str) -> Vec<&mut Field> {
        self.fields.iter_mut().filter(|f| f.tag() == tag).collect()
    }

    /// Add a new control field with the provided tag and content and
    /// insert it in tag order.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcdoc::Record;
    /// let mut record = Record::default();
    /// assert!(record.add_control_field("011", "foo").is_err());
    /// assert!(record.add_control_field("008", "bar").is_ok());
    /// assert!(record.add_control_field("000", "bar").is_ok());
    ///
    /// assert_eq!(record.control_fields()[0].tag(), "000");
    /// ```
    pub fn add_control_field(&mut self, tag: &str, content: &str) -> Result<(), String> {
        self.insert_control_field(Controlfield::new(tag, content)?);
        Ok(())
    }

    /// Insert a [`Controlfield`] in tag order.
    pub fn insert_control_field(&mut self, field: Controlfield) {
        if let Some(idx) = self
            .control_fields
            .iter()
            .position(|f| f.tag() > field.tag())
        {
            self.control_fields.insert(idx, field);
        } else {
            self.control_fields.push(field);
        }
    }

    /// Insert a [`Field`] in tag order, after any fields sharing its tag.
    ///
    /// Returns the position of the new field.
    pub fn insert_data_field(&mut self, field: Field) -> usize {
        if let Some(idx) = self.fields.iter().position(|f| f.tag() > field.tag()) {
            self.fields.insert(idx, field);
            idx
        } else {
            self.fields.push(field);
            self.fields.len() - 1
        }
    }

    /// Create a new Field with the provided tag, insert it into the
    /// record in tag order, then return a mut ref to the new field.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcdoc::Record;
    /// let mut record = Record::default();
    /// record.add_data_field("245").unwrap().add_subfield("a", "Title").unwrap();
    /// record.add_data_field("240").unwrap();
    /// record.add_data_field("650").unwrap().add_subfield("a", "Topic").unwrap();
    /// assert!(record.add_data_field("1234").is_err());
    ///
    /// assert_eq!(record.fields()[0].tag(), "240");
    /// assert_eq!(record.fields()[2].first_value("a"), Some("Topic"));
    /// ```
    pub fn add_data_field(&mut self, tag: impl Into<String>) -> Result<&mut Field, String> {
        let pos = self.insert_data_field(Field::new(tag)?);
        Ok(&mut self.fields[pos])
    }

    /// Returns a list of values for the specified tag and subfield.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcdoc::Record;
    /// let mut record = Record::default();
    /// let field = record.add_data_field("650").unwrap();
    /// field.add_subfield("a", "foo").unwrap();
    /// field.add_subfield("a", "bar").unwrap();
    ///
    /// let field = record.add_data_field("650").unwrap();
    /// field.add_subfield("a", "baz").unwrap();
    ///
    /// assert_eq!(record.get_values("650", "a"), ["foo", "bar", "baz"]);
    /// ```
    pub fn get_values(&self, tag: &str, code: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.tag() == tag)
            .flat_map(|f| f.get_subfields(code))
            .map(|sf| sf.content())
            .collect()
    }

    /// First value found for the specified tag and subfield.
    pub fn get_value(&self, tag: &str, code: &str) -> Option<&str> {
        self.get_values(tag, code).first().copied()
    }

    /// True if any tag/subfield pair carries exactly this value.
    pub fn has_value(&self, tag: &str, code: &str, value: &str) -> bool {
        self.get_values(tag, code).contains(&value)
    }

    /// Set the value of the first `tag` / `code` occurrence, creating
    /// the field and/or subfield when absent.
    ///
    /// Control tags ignore `code`.  Returns self for chaining.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcdoc::Record;
    /// let mut record = Record::new();
    /// record
    ///     .set("089", "b", "B22").unwrap()
    ///     .set("245", "a", "Statement").unwrap()
    ///     .set("245", "a", "Statement (revised)").unwrap()
    ///     .set("008", "", "850101s").unwrap();
    ///
    /// assert_eq!(record.get_values("245", "a"), ["Statement (revised)"]);
    /// assert_eq!(record.get_control_value("008"), Some("850101s"));
    /// ```
    pub fn set(&mut self, tag: &str, code: &str, value: &str) -> Result<&mut Self, String> {
        if is_control_tag(tag) {
            match self.control_fields.iter().position(|f| f.tag() == tag) {
                Some(idx) => self.control_fields[idx].set_content(value),
                None => self.add_control_field(tag, value)?,
            }
            return Ok(self);
        }

        let field = match self.fields.iter().position(|f| f.tag() == tag) {
            Some(idx) => &mut self.fields[idx],
            None => self.add_data_field(tag)?,
        };

        match field.subfields().iter().position(|sf| sf.code() == code) {
            Some(idx) => field.subfields_mut()[idx].set_content(value),
            None => field.add_subfield(code, value)?,
        }

        Ok(self)
    }

    /// Remove all occurrences of control fields with the provided tag.
    ///
    /// Returns the number of removed fields.
    pub fn remove_control_fields(&mut self, tag: &str) -> usize {
        let before = self.control_fields.len();
        self.control_fields.retain(|f| f.tag() != tag);
        before - self.control_fields.len()
    }

    /// Remove all occurrences of fields with the provided tag.
    ///
    /// Returns the number of removed fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcdoc::Record;
    /// let mut record = Record::default();
    /// record.set("650", "a", "Art").unwrap();
    ///
    /// assert_eq!(record.remove_fields("200"), 0);
    /// assert_eq!(record.remove_fields("650"), 1);
    /// assert!(record.get_fields("650").is_empty());
    /// ```
    pub fn remove_fields(&mut self, tag: &str) -> usize {
        self.remove_fields_where(tag, |_| true)
    }

    /// Remove the fields with the provided tag for which `pred` returns
    /// true.  Returns the number of removed fields.
    pub fn remove_fields_where(
        &mut self,
        tag: &str,
        mut pred: impl FnMut(&Field) -> bool,
    ) -> usize {
        let before = self.fields.len();
        self.fields.retain(|f| !(f.tag() == tag && pred(f)));
        before - self.fields.len()
    }

    /// Drop data fields that no longer have any subfields.
    pub fn remove_empty_fields(&mut self) -> usize {
        let before = self.fields.len();
        self.fields.retain(|f| !f.subfields().is_empty());
        before - self.fields.len()
    }

    /// Change the tag of every `from` field to `to`.
    ///
    /// Fields are then re-sorted by tag.  The sort is stable, so retagged
    /// fields keep their relative order and land after any existing `to`
    /// fields.  Returns the number of retagged fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcdoc::Record;
    /// let mut record = Record::from_breaker(
    ///     r#"=100 1\$aSmith, Jane.
    /// =245 10$aReport.
    /// =700 1\$aDoe, John."#
    /// ).unwrap();
    ///
    /// assert_eq!(record.retag_fields("100", "700").unwrap(), 1);
    /// assert_eq!(record.get_values("700", "a"), ["Doe, John.", "Smith, Jane."]);
    /// assert_eq!(record.fields()[0].tag(), "245");
    /// ```
    pub fn retag_fields(&mut self, from: &str, to: &str) -> Result<usize, String> {
        let mut count = 0;
        for field in self.fields.iter_mut().filter(|f| f.tag() == from) {
            field.set_tag(to)?;
            count += 1;
        }

        if count > 0 {
            self.fields.sort_by(|a, b| a.tag().cmp(b.tag()));
        }

        Ok(count)
    }

    /// # Examples
    ///
    /// ```
    /// use marcdoc::Record;
    /// let record = Record::from_breaker(
    ///     r#"=600 10$aZhang, Heng, $d 78-139 $v Juvenile literature.
    /// =650 \0$aEarthquakes $v Juvenile literature.
    /// =955 \0$a1234"#
    /// ).unwrap();
    ///
    /// let mut some_fields = record.extract_fields(600..=699);
    /// assert_eq!(some_fields.next().unwrap().tag(), "600");
    /// assert_eq!(some_fields.next().unwrap().tag(), "650");
    /// assert!(some_fields.next().is_none());
    ///
    /// let mut more_fields = record.extract_fields("9xx");
    /// assert_eq!(more_fields.next().unwrap().tag(), "955");
    /// assert!(more_fields.next().is_none());
    /// ```
    pub fn extract_fields(
        &self,
        query: impl Into<crate::FieldQuery>,
    ) -> impl Iterator<Item = &Field> {
        self.fields().iter().filter(query.into().field_filter)
    }
}
