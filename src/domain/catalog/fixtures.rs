//! A small, consistent catalog shared by the catalog tests.
//!
//! Features `A-1..A-3` and `B-1`; `A-3` is multiselect with values
//! `A-3-1..A-3-4`. Doculects `X`, `Y` and `Z`. One rule: `A-1-2` makes `A-3`
//! and `B-1` not applicable.

use super::Catalog;
use crate::domain::{
    id::FeatureId,
    record::{FeatureRecord, ListedValueRecord, Profile, ProfileEntry, ValueType},
    rules::NotApplicableRules,
};

fn feature(id: &str, en: &str, ru: &str, is_multiselect: bool) -> FeatureRecord {
    FeatureRecord {
        id: id.parse().unwrap(),
        en: en.to_string(),
        ru: ru.to_string(),
        description_formatted_en: format!("About {en}."),
        description_formatted_ru: String::new(),
        is_multiselect,
        not_applicable_if: String::new(),
        schema_sections: "phonology".to_string(),
    }
}

fn value(id: &str, en: &str, ru: &str) -> ListedValueRecord {
    let id: crate::domain::id::ValueId = id.parse().unwrap();
    ListedValueRecord {
        id,
        feature_id: id.feature(),
        en: en.to_string(),
        ru: ru.to_string(),
        description_formatted_en: format!("<p>{en}</p>"),
        description_formatted_ru: format!("<p>{ru}</p>"),
    }
}

pub(crate) fn entry(
    feature_id: &str,
    feature_name_ru: &str,
    value_type: ValueType,
    value_id: &str,
    value_ru: &str,
) -> ProfileEntry {
    ProfileEntry {
        feature_id: feature_id.parse().unwrap(),
        feature_name_ru: feature_name_ru.to_string(),
        value_type,
        value_id: value_id.parse().unwrap(),
        value_ru: value_ru.to_string(),
        comment_ru: String::new(),
        comment_en: String::new(),
        page_numbers: String::new(),
    }
}

pub(crate) fn sample() -> Catalog {
    use ValueType::{Custom, ExplicitGap, Listed, NotStated};

    let features = vec![
        feature("A-1", "stress position", "место ударения", false),
        feature("A-2", "Vowel count", "число гласных", false),
        feature("A-3", "vowel qualities", "качества гласных", true),
        feature("B-1", "word order", "порядок слов", false),
    ];

    let values = vec![
        value("A-1-1", "fixed", "фиксированное"),
        value("A-1-2", "free", "свободное"),
        value("A-2-1", "two", "две"),
        value("A-2-2", "three", "три"),
        value("A-2-3", "four or more", "четыре и больше"),
        value("A-3-1", "one", "один"),
        value("A-3-2", "two", "два"),
        value("A-3-3", "three", "три"),
        value("A-3-4", "four", "четыре"),
        value("B-1-1", "SOV", "SOV"),
    ];

    let profiles = vec![
        Profile {
            doculect: "X".to_string(),
            entries: vec![
                entry("A-1", "место ударения", Listed, "A-1-2", "свободное"),
                entry("A-2", "число гласных", Listed, "A-2-1", "две"),
                entry("A-3", "качества гласных", Listed, "A-3-1&A-3-3", "один&три"),
                entry("B-1", "порядок слов", NotStated, "", ""),
            ],
        },
        Profile {
            doculect: "Y".to_string(),
            entries: vec![
                entry("A-1", "место ударения", Listed, "A-1-1", "фиксированное"),
                entry("A-2", "число гласных", Custom, "", "пять"),
                entry("A-3", "качества гласных", Listed, "A-3-4", "четыре"),
                entry("B-1", "порядок слов", NotStated, "", ""),
            ],
        },
        Profile {
            doculect: "Z".to_string(),
            entries: vec![
                entry("A-1", "место ударения", Listed, "A-1-2", "свободное"),
                entry("A-2", "число гласных", NotStated, "", ""),
                entry("A-3", "качества гласных", NotStated, "", ""),
                entry("B-1", "порядок слов", ExplicitGap, "", ""),
            ],
        },
    ];

    let rules = NotApplicableRules::from_yaml(
        "\
A-1:
  trigger: A-1-2
  features_to_get_not_applicable: [A-3, B-1]
",
    )
    .unwrap();

    Catalog::new(features, values, profiles, rules)
}

pub(crate) fn feature_ids(catalog: &Catalog) -> Vec<String> {
    catalog.features().iter().map(|f| f.id.to_string()).collect()
}

pub(crate) fn value_ids(catalog: &Catalog, feature: &str) -> Vec<String> {
    let feature: FeatureId = feature.parse().unwrap();
    catalog.values_of(feature).map(|v| v.id.to_string()).collect()
}

pub(crate) fn profile_feature_ids(profile: &Profile) -> Vec<String> {
    profile
        .entries
        .iter()
        .map(|e| e.feature_id.to_string())
        .collect()
}
