//! Routines for reading and writing MARC Breaker text
//!
//! Breaker ("mrk") text is how records are dumped for human review.
//! The leader, stored as control field 000, is written as `=LDR`.
use super::Controlfield;
use super::Field;
use super::Record;
use super::Subfield;

const MARC_BREAKER_SF_DELIMITER: &str = "$";
const MARC_BREAKER_SF_DELIMITER_ESCAPE: &str = "{dollar}";
const MARC_BREAKER_BLANK_INDICATOR: &str = "\\";
const LEADER_TAG: &str = "000";
const LEADER_LABEL: &str = "LDR";

/// Replace bare subfield delimiter values with their escaped version.
pub fn escape_to_breaker(value: &str) -> String {
    value.replace(MARC_BREAKER_SF_DELIMITER, MARC_BREAKER_SF_DELIMITER_ESCAPE)
}

/// Replace escaped subfield delimiter values with the bare version.
pub fn unescape_from_breaker(value: &str) -> String {
    value.replace(MARC_BREAKER_SF_DELIMITER_ESCAPE, MARC_BREAKER_SF_DELIMITER)
}

fn indicator_to_breaker(ind: &str) -> &str {
    if ind == " " {
        MARC_BREAKER_BLANK_INDICATOR
    } else {
        ind
    }
}

impl Controlfield {
    /// Generate breaker text for a [`Controlfield`]
    ///
    /// # Examples
    ///
    /// ```
    /// let cf = marcdoc::Controlfield::new("000", "00000nam a2200000 a 4500").unwrap();
    /// assert_eq!(cf.to_breaker(), "=LDR 00000nam a2200000 a 4500");
    /// ```
    pub fn to_breaker(&self) -> String {
        let label = if self.tag() == LEADER_TAG {
            LEADER_LABEL
        } else {
            self.tag()
        };

        if self.content().is_empty() {
            format!("={label}")
        } else {
            format!("={label} {}", escape_to_breaker(self.content()))
        }
    }
}

impl Subfield {
    /// Generate breaker text for a [`Subfield`]
    ///
    /// # Examples
    ///
    /// ```
    /// let sf = marcdoc::Subfield::new("q", "Costs in $US").unwrap();
    /// assert_eq!(sf.to_breaker(), "$qCosts in {dollar}US");
    /// ```
    pub fn to_breaker(&self) -> String {
        format!(
            "${}{}",
            escape_to_breaker(self.code()),
            escape_to_breaker(self.content()),
        )
    }
}

impl Field {
    /// Generate breaker text for a [`Field`]
    ///
    /// # Examples
    ///
    /// ```
    /// let mut field = marcdoc::Field::new("856").unwrap();
    /// field.set_ind1("4").unwrap();
    /// field.add_subfield("u", "https://undocs.org/A/RES/1").unwrap();
    /// assert_eq!(field.to_breaker(), "=856 4\\$uhttps://undocs.org/A/RES/1");
    /// ```
    pub fn to_breaker(&self) -> String {
        let mut s = format!(
            "={} {}{}",
            self.tag(),
            indicator_to_breaker(self.ind1()),
            indicator_to_breaker(self.ind2()),
        );

        for sf in self.subfields() {
            s += sf.to_breaker().as_str();
        }

        s
    }
}

impl Record {
    /// Generate breaker text for a [`Record`], one field per line.
    ///
    /// # References
    ///
    /// * <https://www.loc.gov/marc/makrbrkr.html>
    pub fn to_breaker(&self) -> String {
        self.control_fields()
            .iter()
            .map(|cf| cf.to_breaker())
            .chain(self.fields().iter().map(|f| f.to_breaker()))
            .collect::<Vec<String>>()
            .join("\n")
    }

    /// Create a MARC [`Record`] from a MARC Breaker string.
    ///
    /// Assumes one record per input string.  Blank lines are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcdoc::Record;
    /// let breaker_str = r#"=LDR 01716cas a2200433 i 4500
    /// =008 071030c20079999nvumr p       0    0eng d
    /// =035 \\$a(OCoLC)ocn179901451
    /// =245 00$aRenoOut.
    /// =650 \0$aLesbians$zNevada$zReno$vPeriodicals"#;
    /// let record = Record::from_breaker(breaker_str).unwrap();
    ///
    /// assert_eq!(record.get_control_value("000"), Some("01716cas a2200433 i 4500"));
    /// assert_eq!(record.get_values("035", "a"), ["(OCoLC)ocn179901451"]);
    /// assert_eq!(record.get_fields("650")[0].ind2(), "0");
    /// ```
    pub fn from_breaker(breaker: &str) -> Result<Self, String> {
        let mut record = Record::new();

        for line in breaker.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            record.add_breaker_line(line)?;
        }

        Ok(record)
    }

    /// Process one line of breaker text and add the result to [`self`]
    /// in tag order.
    fn add_breaker_line(&mut self, line: &str) -> Result<(), String> {
        let Some(line) = line.strip_prefix('=') else {
            return Err(format!("Breaker fields must begin with '=': {line}"));
        };

        let Some(tag) = line.get(..3) else {
            return Err(format!("Breaker line is too short: ={line}"));
        };

        // There is a space between the tag and the content / indicators.
        let rest = line.get(4..).unwrap_or("");

        if tag == LEADER_LABEL {
            self.insert_control_field(Controlfield::new(LEADER_TAG, rest)?);
            return Ok(());
        }

        if crate::record::is_control_tag(tag) {
            let cf = Controlfield::new(tag, unescape_from_breaker(rest))?;
            self.insert_control_field(cf);
            return Ok(());
        }

        let mut field = Field::new(tag)?;
        let mut chars = rest.char_indices();

        if let Some((_, ind)) = chars.next() {
            field.set_ind1(ind.to_string().replace(MARC_BREAKER_BLANK_INDICATOR, " "))?;
        }

        if let Some((_, ind)) = chars.next() {
            field.set_ind2(ind.to_string().replace(MARC_BREAKER_BLANK_INDICATOR, " "))?;
        }

        let subfields = chars.next().map(|(idx, _)| &rest[idx..]).unwrap_or("");

        for sf in subfields.split(MARC_BREAKER_SF_DELIMITER) {
            let mut sf_chars = sf.chars();
            let Some(code) = sf_chars.next() else {
                continue;
            };
            let content = unescape_from_breaker(sf_chars.as_str());
            field.subfields_mut().push(Subfield::new(code, content)?);
        }

        self.insert_data_field(field);

        Ok(())
    }
}
