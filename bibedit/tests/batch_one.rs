use bibedit::batches::batch_one;
use bibedit::rules::{Rule, apply_rules, stamp_date};
use marcdoc::Record;

/// Ten records of each type.
struct Fixture {
    defaults: Vec<Record>,
    speeches: Vec<Record>,
    votes: Vec<Record>,
}

fn collection(name: Option<&str>) -> Vec<Record> {
    (0..10)
        .map(|_| {
            let mut record = Record::new();
            if let Some(name) = name {
                record.set("989", "a", name).unwrap();
            }
            record
        })
        .collect()
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            defaults: collection(None),
            speeches: collection(Some("Speeches")),
            votes: collection(Some("Voting Data")),
        }
    }

    /// Records typed the older way, by 089 $b.
    fn with_type_codes() -> Self {
        let typed = |code: &str| -> Vec<Record> {
            (0..10)
                .map(|_| {
                    let mut record = Record::new();
                    record.set("089", "b", code).unwrap();
                    record
                })
                .collect()
        };

        Fixture {
            defaults: typed("A01"),
            speeches: typed("B22"),
            votes: typed("B23"),
        }
    }

    fn all(&self) -> impl Iterator<Item = &Record> {
        self.defaults
            .iter()
            .chain(self.speeches.iter())
            .chain(self.votes.iter())
    }

    fn all_mut(&mut self) -> impl Iterator<Item = &mut Record> {
        self.defaults
            .iter_mut()
            .chain(self.speeches.iter_mut())
            .chain(self.votes.iter_mut())
    }

    fn others(&self) -> impl Iterator<Item = &Record> {
        self.speeches.iter().chain(self.votes.iter())
    }

    /// Set a value on every record.
    fn set_all(&mut self, tag: &str, code: &str, value: &str) {
        for record in self.all_mut() {
            record.set(tag, code, value).unwrap();
        }
    }

    /// Add a field with indicators to every record.
    fn add_all(&mut self, tag: &str, ind1: &str, ind2: &str, code: &str, value: &str) {
        for record in self.all_mut() {
            let field = record.add_data_field(tag).unwrap();
            field.set_ind1(ind1).unwrap();
            field.set_ind2(ind2).unwrap();
            field.add_subfield(code, value).unwrap();
        }
    }

    /// Run each step of the numbered rules on every record.
    fn apply(&mut self, numbers: &[&str]) {
        let rules: Vec<Rule> = batch_one::rules()
            .into_iter()
            .filter(|r| numbers.contains(&r.number.to_string().as_str()))
            .collect();

        for number in numbers {
            assert!(
                rules.iter().any(|r| r.number.to_string() == *number),
                "unknown rule {number}"
            );
        }

        for record in self.all_mut() {
            for rule in &rules {
                rule.apply(record).unwrap();
            }
        }
    }
}

fn labels(numbers: impl IntoIterator<Item = u16>) -> Vec<String> {
    numbers.into_iter().map(|n| n.to_string()).collect()
}

#[test]
fn edit_1_internet_099() {
    let mut fx = Fixture::new();
    fx.set_all("099", "c", "internet");
    for record in fx.defaults.iter_mut() {
        record.set("099", "a", "other").unwrap();
    }
    fx.defaults[0].set("099", "c", "print").unwrap();

    fx.apply(&["1"]);

    assert_eq!(fx.defaults[0].get_value("099", "c"), Some("print"));
    assert!(fx.defaults[1..].iter().all(|r| r.get_fields("099").is_empty()));
    assert!(fx.others().all(|r| r.get_value("099", "c") == Some("internet")));
}

#[test]
fn edit_2_029_sources() {
    let mut fx = Fixture::new();
    for (i, record) in fx.defaults.iter_mut().enumerate() {
        let value = match i {
            0..2 => "JN",
            2..5 => "UN",
            _ => "to delete",
        };
        record.set("029", "a", value).unwrap();
    }
    for record in fx.speeches.iter_mut().chain(fx.votes.iter_mut()) {
        record.set("029", "a", "other").unwrap();
    }

    fx.apply(&["2"]);

    let kept: Vec<&str> = fx
        .defaults
        .iter()
        .filter_map(|r| r.get_value("029", "a"))
        .collect();
    assert_eq!(kept, ["JN", "JN", "UN", "UN", "UN"]);
    assert!(fx.others().all(|r| r.get_value("029", "a") == Some("other")));
}

#[test]
fn edit_3_930_prefixes() {
    let mut fx = Fixture::new();
    let kept = ["UND1", "UNP2", "UNGREY3", "CIF4", "DIG5", "HUR6", "PER7", "PN8"];

    for (i, record) in fx.all_mut().enumerate() {
        let value = if i < 20 { kept[i % kept.len()] } else { "other" };
        record.set("930", "a", value).unwrap();
    }

    fx.apply(&["3"]);

    assert_eq!(fx.all().filter(|r| r.get_value("930", "a").is_some()).count(), 20);
    assert!(fx.all().all(|r| r.get_value("930", "a") != Some("other")));
}

#[test]
fn edit_4_5_leader_and_008_everywhere() {
    let mut fx = Fixture::new();
    fx.set_all("000", "", "00000nam a2200000 a 4500");
    fx.set_all("008", "", "850101s1985    xx            000 0 eng d");

    fx.apply(&["4", "5"]);

    assert!(fx.all().all(|r| r.get_control_value("000").is_none()));
    assert!(fx.all().all(|r| r.get_control_value("008").is_none()));
}

#[test]
fn edit_6_035_kept_for_speeches() {
    let mut fx = Fixture::new();
    fx.set_all("035", "a", "(DHL)12345");

    fx.apply(&["6"]);

    assert!(fx.defaults.iter().all(|r| r.get_fields("035").is_empty()));
    assert!(fx.votes.iter().all(|r| r.get_fields("035").is_empty()));
    assert!(fx.speeches.iter().all(|r| r.get_value("035", "a").is_some()));
}

#[test]
fn type_codes_still_classify_older_records() {
    let mut fx = Fixture::with_type_codes();
    fx.set_all("035", "a", "(DHL)12345");
    fx.set_all("222", "a", "Key title");

    fx.apply(&["6", "12"]);

    assert!(fx.defaults.iter().all(|r| r.get_fields("035").is_empty()));
    assert!(fx.votes.iter().all(|r| r.get_fields("035").is_empty()));
    assert!(fx.speeches.iter().all(|r| r.get_value("035", "a").is_some()));
    assert!(fx.others().all(|r| r.get_value("222", "a").is_some()));
}

#[test]
fn edit_7_069_every_occurrence() {
    let mut fx = Fixture::new();
    for record in fx.all_mut() {
        record.set("069", "a", "dummy").unwrap();
        record.add_data_field("069").unwrap().add_subfield("b", "dummy2").unwrap();
    }

    fx.apply(&["7"]);

    assert!(fx.defaults.iter().all(|r| r.get_fields("069").is_empty()));
    assert!(fx.others().all(|r| r.get_fields("069").len() == 2));
}

#[test]
fn edit_8_to_11_and_14_main_entries_move() {
    let mut fx = Fixture::new();
    for record in fx.all_mut() {
        for tag in ["100", "110", "111", "130", "440"] {
            record.set(tag, "a", "dummy").unwrap();
            record.get_fields_mut(tag)[0].set_ind1("9").unwrap();
        }
    }

    // Indicators are cleared by the later indicator rules.
    fx.apply(&["8", "9", "10", "11", "14", "36", "37", "38", "39", "42"]);

    for record in &fx.defaults {
        for (from, to) in [("100", "700"), ("110", "710"), ("111", "711"), ("130", "730"), ("440", "830")] {
            assert!(record.get_fields(from).is_empty());
            let moved = record.get_fields(to);
            assert_eq!(moved.len(), 1);
            assert_eq!(moved[0].ind1(), " ");
        }
    }

    assert!(fx.others().all(|r| r.get_value("100", "a") == Some("dummy")));
}

#[test]
fn edit_12_13_222_and_269() {
    let mut fx = Fixture::new();
    fx.set_all("222", "a", "Key title");
    fx.set_all("269", "a", "2012-05-01");

    fx.apply(&["12", "13"]);

    assert!(fx.defaults.iter().all(|r| r.get_fields("222").is_empty()));
    assert!(fx.defaults.iter().all(|r| r.get_value("269", "a").is_some()));
    assert!(fx.others().all(|r| r.get_value("222", "a").is_some()));
    assert!(fx.others().all(|r| r.get_fields("269").is_empty()));
}

#[test]
fn edit_15_490_issn_moves_to_022() {
    let mut fx = Fixture::new();
    fx.set_all("490", "x", "dummy");
    for (i, record) in fx.defaults.iter_mut().enumerate() {
        let issn = if i < 5 { "dummy" } else { "other" };
        record.set("022", "a", issn).unwrap();
    }

    assert_eq!(fx.all().filter(|r| r.get_value("490", "x").is_some()).count(), 30);

    fx.apply(&["15"]);

    assert_eq!(fx.all().filter(|r| r.get_value("490", "x").is_some()).count(), 20);

    for (i, record) in fx.defaults.iter().enumerate() {
        let expected: &[&str] = if i < 5 { &["dummy"] } else { &["other", "dummy"] };
        assert_eq!(record.get_values("022", "a"), expected);
        assert!(record.get_fields("490").is_empty());
    }

    assert!(fx.others().all(|r| r.get_fields("022").is_empty()));
}

#[test]
fn edit_16_retrospective_indexing() {
    let mut fx = Fixture::new();
    fx.set_all("597", "a", "Retrospective indexing");
    fx.defaults[0].set("597", "a", "Other note").unwrap();

    fx.apply(&["16"]);

    assert_eq!(fx.defaults[0].get_value("597", "a"), Some("Other note"));
    assert!(fx.defaults[1..].iter().all(|r| r.get_fields("597").is_empty()));
    assert!(fx.others().all(|r| r.get_value("597", "a").is_some()));
}

#[test]
fn edit_17_773_becomes_580_note() {
    let mut fx = Fixture::new();
    fx.set_all("773", "a", "dummy");

    fx.apply(&["17"]);

    for record in &fx.defaults {
        assert!(record.get_fields("773").is_empty());
        assert!(record.get_values("580", "a").contains(&"dummy"));
    }

    assert!(fx.others().all(|r| r.get_value("773", "a") == Some("dummy")));
    assert!(fx.others().all(|r| r.get_fields("580").is_empty()));
}

#[test]
fn edit_18_to_22_local_fields() {
    let mut fx = Fixture::new();
    let tags = ["910", "920", "955", "995"];
    for tag in tags {
        fx.set_all(tag, "a", "dummy");
    }
    fx.set_all("949", "a", "dummy");

    fx.apply(&["18", "19", "20", "21", "22"]);

    for record in &fx.defaults {
        for tag in tags {
            assert!(record.get_fields(tag).is_empty(), "{tag} kept");
        }
    }
    assert!(fx.others().all(|r| tags.iter().all(|t| r.get_value(t, "a").is_some())));

    // 949 goes everywhere.
    assert!(fx.all().all(|r| r.get_fields("949").is_empty()));
}

#[test]
fn edit_23_to_43_indicators() {
    let mut fx = Fixture::new();
    let tags = [
        "022", "041", "239", "245", "246", "362", "490", "505", "520", "597", "600", "610", "611",
        "630", "700", "710", "711", "730", "740", "767", "780", "785", "830",
    ];

    for tag in tags {
        fx.add_all(tag, "9", "9", "z", "dummy");
    }

    let mut numbers = labels((23..=42).filter(|n| *n != 35));
    numbers.extend(["43.1", "43.2", "43.3", "43.4"].map(String::from));
    let numbers: Vec<&str> = numbers.iter().map(String::as_str).collect();

    fx.apply(&numbers);

    for record in fx.all() {
        for field in record.fields() {
            assert_eq!((field.ind1(), field.ind2()), (" ", " "), "{}", field.tag());
        }
    }
}

#[test]
fn edit_43_45_subfields_in_all_records() {
    let mut fx = Fixture::new();
    fx.set_all("040", "a", "NNUN");
    fx.set_all("040", "b", "eng");
    for (i, record) in fx.all_mut().enumerate() {
        let value = if i < 5 { "veto" } else { "other" };
        record.set("089", "a", value).unwrap();
    }

    fx.apply(&["43", "45"]);

    assert!(fx.all().all(|r| r.get_value("040", "b").is_none()));
    assert!(fx.all().all(|r| r.get_value("040", "a") == Some("NNUN")));

    let vetoes = fx
        .all()
        .filter(|r| r.get_values("089", "a").contains(&"veto"))
        .count();
    assert_eq!(vetoes, 5);
    assert!(fx.all().all(|r| !r.get_values("089", "a").contains(&"other")));
}

#[test]
fn edit_44_079_subfield_q() {
    let mut fx = Fixture::new();
    fx.set_all("079", "q", "dummy");

    fx.apply(&["44"]);

    assert!(fx.defaults.iter().all(|r| r.get_value("079", "q").is_none()));
    assert!(fx.others().all(|r| r.get_value("079", "q").is_some()));
}

#[test]
fn edit_46_to_53_bib_subfields() {
    let mut fx = Fixture::new();
    let pairs = [
        ("041", "b"),
        ("099", "q"),
        ("191", "f"),
        ("250", "b"),
        ("520", "b"),
        ("520", "9"),
        ("600", "2"),
        ("610", "2"),
        ("611", "2"),
        ("630", "2"),
        ("650", "2"),
    ];
    for (tag, code) in pairs {
        fx.set_all(tag, "a", "keep");
        fx.set_all(tag, code, "dummy");
    }

    fx.apply(&["46", "47", "48", "49", "50", "51", "52", "53", "53.1", "53.2", "53.3"]);

    for record in &fx.defaults {
        for (tag, code) in pairs {
            assert!(record.get_value(tag, code).is_none(), "{tag} ${code} kept");
            assert_eq!(record.get_value(tag, "a"), Some("keep"));
        }
    }

    assert!(fx.others().all(|r| pairs.iter().all(|(t, c)| r.get_value(t, c).is_some())));
}

#[test]
fn edit_48_250_edition_statement() {
    let mut fx = Fixture::new();
    fx.set_all("250", "a", "dummy=");
    fx.set_all("250", "b", "dummy");

    fx.apply(&["48"]);

    for record in &fx.defaults {
        assert!(record.get_value("250", "b").is_none());
        assert_eq!(record.get_value("250", "a"), Some("dummy"));
    }
    assert!(fx.others().all(|r| r.get_value("250", "a") == Some("dummy=")));
}

#[test]
fn edit_54_710_subfield_9() {
    let mut fx = Fixture::new();
    fx.set_all("710", "a", "United Nations");
    fx.set_all("710", "9", "dummy");

    fx.apply(&["54"]);

    assert!(fx.defaults.iter().all(|r| r.get_value("710", "9").is_none()));
    assert!(fx.speeches.iter().all(|r| r.get_value("710", "9").is_none()));
    assert!(fx.votes.iter().all(|r| r.get_value("710", "9").is_some()));
}

#[test]
fn edit_55_650_indicators_by_date() {
    let mut fx = Fixture::new();
    for (i, record) in fx.all_mut().enumerate() {
        let year = if i < 15 { "2013" } else { "2014" };
        record.set("269", "a", year).unwrap();
    }
    fx.add_all("650", "1", "2", "a", "OK");

    let first_ind1_is_1 = |fx: &Fixture| {
        fx.all()
            .filter(|r| r.get_fields("650")[0].ind1() == "1")
            .count()
    };
    assert_eq!(first_ind1_is_1(&fx), 30);

    fx.apply(&["55"]);

    assert_eq!(first_ind1_is_1(&fx), 15);
    assert!(fx.all().all(|r| r.get_fields("650")[0].ind2() == " "));
}

#[test]
fn edit_56_529() {
    let mut fx = Fixture::new();
    fx.set_all("529", "a", "dummy");

    fx.apply(&["56"]);

    assert!(fx.defaults.iter().all(|r| r.get_fields("529").is_empty()));
    assert!(fx.others().all(|r| r.get_value("529", "a").is_some()));
}

#[test]
fn edit_57_999_stamp() {
    let mut fx = Fixture::new();

    let before = stamp_date();
    fx.apply(&["57"]);
    let after = stamp_date();

    for record in fx.all() {
        let date = record.get_value("999", "b").unwrap();
        assert!(date == before || date == after);
        assert!(record.get_values("999", "a").contains(&format!("jsb{date}").as_str()));
        assert!(record.get_values("999", "c").contains(&"b"));
    }
}

#[test]
fn subfield_deletion_drops_emptied_fields() {
    let mut fx = Fixture::new();
    fx.set_all("040", "b", "eng");

    fx.apply(&["43"]);

    assert!(fx.all().all(|r| r.get_fields("040").is_empty()));
}

#[test]
fn untouched_records_get_no_stamp() {
    let mut fx = Fixture::new();
    let rules = batch_one::rules();

    for record in fx.all_mut() {
        assert!(apply_rules(&rules, record).unwrap().is_empty());
    }
    assert!(fx.all().all(|r| r.get_fields("999").is_empty()));
}

#[test]
fn full_batch_is_idempotent() {
    let mut record = Record::from_breaker(
        r#"=LDR 00000nam a2200000 a 4500
=008 850101s1985    xx            000 0 eng d
=029 \\$aXX$b12
=089 \\$aother$bA01
=100 1\$aSmith, Jane.
=245 10$aReport on things.
=250 \\$a2nd ed. =$bRevised
=490 1\$aSeries$x1234-5678
=650 \7$aPeace.$2unbist
=710 2\$aUnited Nations.$9local
=773 0\$aOfficial records
=949 \\$alocal"#,
    )
    .unwrap();

    let rules = batch_one::rules();

    let applied = apply_rules(&rules, &mut record).unwrap();
    assert!(!applied.is_empty());
    assert_eq!(applied.last().map(|a| a.number.to_string()), Some("57".to_string()));

    let once = record.clone();
    assert!(apply_rules(&rules, &mut record).unwrap().is_empty());
    assert_eq!(record, once);

    assert!(record.control_fields().is_empty());
    assert!(record.get_fields("029").is_empty());
    assert!(record.get_fields("100").is_empty());
    assert_eq!(record.get_values("700", "a"), ["Smith, Jane."]);
    assert_eq!(record.get_values("022", "a"), ["1234-5678"]);
    assert!(record.get_value("490", "x").is_none());
    assert_eq!(record.get_fields("490")[0].ind1(), " ");
    assert_eq!(record.get_values("250", "a"), ["2nd ed."]);
    assert_eq!(record.get_values("580", "a"), ["Official records"]);
    assert!(record.get_fields("773").is_empty());
    assert!(record.get_fields("949").is_empty());
    assert_eq!(record.get_value("650", "2"), None);
    assert_eq!(record.get_fields("650")[0].ind2(), " ");
    assert_eq!(record.get_value("710", "9"), None);
    assert!(record.get_value("089", "a").is_none());
    assert_eq!(record.get_fields("245")[0].ind1(), " ");
    assert_eq!(record.get_fields("999").len(), 1);
}
