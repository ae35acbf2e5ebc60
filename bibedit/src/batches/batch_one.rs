//! First clean-up batch for legacy bib records.
//!
//! Removes local and obsolete fields, folds main entries into added
//! entries, blanks indicators, drops stray subfields and stamps each
//! edited record with a 999.
use crate::rules::{
    ALL, Action, BIB_AND_SPEECHES, BIB_AND_VOTES, BIBLIOGRAPHIC, FieldCondition, Rule, RuleNumber,
    SPEECHES_AND_VOTES, Scope, StampValue, SubfieldCondition,
};

/// 930 $a prefixes that are kept.
const KEPT_930_PREFIXES: &[&str] = &["UND", "UNP", "UNGREY", "CIF", "DIG", "HUR", "PER", "PN"];

const fn n(major: u16) -> RuleNumber {
    RuleNumber::new(major)
}

/// Tags whose indicators are blanked in every record.
///
/// 35 used to cover 650, which rule 55 now handles by date.
const BLANK_INDICATORS: &[(RuleNumber, &str)] = &[
    (n(23), "022"),
    (n(24), "041"),
    (n(25), "239"),
    (n(26), "245"),
    (n(27), "246"),
    (n(28), "505"),
    (n(29), "520"),
    (n(30), "597"),
    (n(31), "600"),
    (n(32), "610"),
    (n(33), "611"),
    (n(34), "630"),
    (n(36), "700"),
    (n(37), "710"),
    (n(38), "711"),
    (n(39), "730"),
    (n(40), "767"),
    (n(41), "780"),
    (n(42), "830"),
    (RuleNumber::sub(43, 1), "740"),
    (RuleNumber::sub(43, 2), "785"),
    (RuleNumber::sub(43, 3), "362"),
    (RuleNumber::sub(43, 4), "490"),
];

/// 999 $a jsb<date> $b <date> $c b
const STAMP_999: &[(&str, StampValue)] = &[
    ("a", StampValue::PrefixedDate("jsb")),
    ("b", StampValue::Date),
    ("c", StampValue::Text("b")),
];

fn rule(
    number: impl Into<RuleNumber>,
    description: &'static str,
    scope: Scope,
    action: Action,
) -> Rule {
    Rule {
        number: number.into(),
        description,
        scope,
        action,
    }
}

fn delete_field(
    number: impl Into<RuleNumber>,
    description: &'static str,
    scope: Scope,
    tag: &'static str,
) -> Rule {
    rule(
        number,
        description,
        scope,
        Action::DeleteField {
            tag,
            when: FieldCondition::Always,
        },
    )
}

fn rename(number: u16, description: &'static str, from: &'static str, to: &'static str) -> Rule {
    rule(number, description, BIBLIOGRAPHIC, Action::RenameTag { from, to })
}

fn delete_subfield(
    number: impl Into<RuleNumber>,
    description: &'static str,
    scope: Scope,
    tag: &'static str,
    code: &'static str,
) -> Rule {
    rule(
        number,
        description,
        scope,
        Action::DeleteSubfield {
            tag,
            code,
            when: SubfieldCondition::Always,
        },
    )
}

/// The rule list, in number order.
///
/// Rules 17 and 48 run in two steps that share a number.
pub fn rules() -> Vec<Rule> {
    let mut rules = vec![
        rule(
            1,
            "Delete 099 where $c is 'internet'",
            BIBLIOGRAPHIC,
            Action::DeleteField {
                tag: "099",
                when: FieldCondition::ValueEquals {
                    code: "c",
                    value: "internet",
                },
            },
        ),
        rule(
            2,
            "Delete 029 unless $a is JN or UN",
            BIBLIOGRAPHIC,
            Action::DeleteField {
                tag: "029",
                when: FieldCondition::ValueNotIn {
                    code: "a",
                    values: &["JN", "UN"],
                },
            },
        ),
        rule(
            3,
            "Delete 930 unless $a has a kept prefix",
            ALL,
            Action::DeleteField {
                tag: "930",
                when: FieldCondition::ValueLacksPrefix {
                    code: "a",
                    prefixes: KEPT_930_PREFIXES,
                },
            },
        ),
        delete_field(4, "Delete 000", ALL, "000"),
        delete_field(5, "Delete 008", ALL, "008"),
        delete_field(6, "Delete 035", BIB_AND_VOTES, "035"),
        delete_field(7, "Delete 069", BIBLIOGRAPHIC, "069"),
        rename(8, "Move 100 to 700", "100", "700"),
        rename(9, "Move 110 to 710", "110", "710"),
        rename(10, "Move 111 to 711", "111", "711"),
        rename(11, "Move 130 to 730", "130", "730"),
        delete_field(12, "Delete 222", BIBLIOGRAPHIC, "222"),
        delete_field(13, "Delete 269", SPEECHES_AND_VOTES, "269"),
        rename(14, "Move 440 to 830", "440", "830"),
        rule(
            15,
            "Move 490 $x to 022 $a",
            BIBLIOGRAPHIC,
            Action::TransferValue {
                from_tag: "490",
                from_code: "x",
                to_tag: "022",
                to_code: "a",
                remove_source: true,
            },
        ),
        rule(
            16,
            "Delete 597 'Retrospective indexing' notes",
            BIBLIOGRAPHIC,
            Action::DeleteField {
                tag: "597",
                when: FieldCondition::ValueEqualsIgnoreCase {
                    code: "a",
                    value: "retrospective indexing",
                },
            },
        ),
        rule(
            17,
            "Copy 773 $a to 580 $a",
            BIBLIOGRAPHIC,
            Action::TransferValue {
                from_tag: "773",
                from_code: "a",
                to_tag: "580",
                to_code: "a",
                remove_source: false,
            },
        ),
        delete_field(17, "Delete 773", BIBLIOGRAPHIC, "773"),
        delete_field(18, "Delete 910", BIBLIOGRAPHIC, "910"),
        delete_field(19, "Delete 920", BIBLIOGRAPHIC, "920"),
        delete_field(20, "Delete 949", ALL, "949"),
        delete_field(21, "Delete 955", BIBLIOGRAPHIC, "955"),
        delete_field(22, "Delete 995", BIBLIOGRAPHIC, "995"),
        delete_subfield(43, "Delete 040 $b", ALL, "040", "b"),
        delete_subfield(44, "Delete 079 $q", BIBLIOGRAPHIC, "079", "q"),
        rule(
            45,
            "Delete 089 $a unless it is 'veto'",
            ALL,
            Action::DeleteSubfield {
                tag: "089",
                code: "a",
                when: SubfieldCondition::ValueNot("veto"),
            },
        ),
        delete_subfield(46, "Delete 099 $q", BIBLIOGRAPHIC, "099", "q"),
        delete_subfield(47, "Delete 191 $f", BIBLIOGRAPHIC, "191", "f"),
        delete_subfield(48, "Delete 250 $b", BIBLIOGRAPHIC, "250", "b"),
        rule(
            48,
            "Strip a trailing '=' from 250 $a",
            BIBLIOGRAPHIC,
            Action::TrimSuffix {
                tag: "250",
                code: "a",
                suffix: "=",
            },
        ),
        delete_subfield(49, "Delete 600 $2", BIBLIOGRAPHIC, "600", "2"),
        delete_subfield(50, "Delete 610 $2", BIBLIOGRAPHIC, "610", "2"),
        delete_subfield(51, "Delete 611 $2", BIBLIOGRAPHIC, "611", "2"),
        delete_subfield(52, "Delete 630 $2", BIBLIOGRAPHIC, "630", "2"),
        delete_subfield(53, "Delete 650 $2", BIBLIOGRAPHIC, "650", "2"),
        delete_subfield(RuleNumber::sub(53, 1), "Delete 041 $b", BIBLIOGRAPHIC, "041", "b"),
        delete_subfield(RuleNumber::sub(53, 2), "Delete 520 $b", BIBLIOGRAPHIC, "520", "b"),
        delete_subfield(RuleNumber::sub(53, 3), "Delete 520 $9", BIBLIOGRAPHIC, "520", "9"),
        delete_subfield(54, "Delete 710 $9", BIB_AND_SPEECHES, "710", "9"),
        rule(
            55,
            "Clear 650 indicators, only the second before 2014",
            ALL,
            Action::ClearIndicatorsByYear {
                tag: "650",
                year_tag: "269",
                year_code: "a",
                before: 2014,
            },
        ),
        delete_field(56, "Delete 529", BIBLIOGRAPHIC, "529"),
        rule(
            57,
            "Add 999 batch stamp",
            ALL,
            Action::AddStamp {
                tag: "999",
                subfields: STAMP_999,
            },
        ),
    ];

    for (number, tag) in BLANK_INDICATORS {
        rules.push(rule(
            *number,
            "Clear indicators",
            ALL,
            Action::ClearIndicators { tag: *tag },
        ));
    }

    // Stable, so multi-step rules keep their step order.
    rules.sort_by_key(|r| r.number);

    rules
}
