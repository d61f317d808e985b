//! This bench inserts and removes a feature at the front of a category in a
//! large in-memory database, which renumbers every later feature, value and
//! profile row.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use curator::{
    Catalog, CategoryId, FeatureDraft, ValueDraft,
    domain::{NotApplicableRules, Profile, ProfileEntry},
};

const FEATURES_PER_CATEGORY: usize = 150;
const VALUES_PER_FEATURE: usize = 5;
const DOCULECTS: usize = 50;

/// Generates a catalog with two full categories and a set of profiles
fn preseed_catalog() -> Catalog {
    let categories = [CategoryId::new('A').unwrap(), CategoryId::new('B').unwrap()];
    let mut catalog = Catalog::default().with_categories(categories);

    for category in categories {
        for i in 1..=FEATURES_PER_CATEGORY {
            let values = (1..=VALUES_PER_FEATURE)
                .map(|j| ValueDraft::new(format!("value {j}"), format!("значение {j}")))
                .collect();
            let draft = FeatureDraft::new(
                format!("feature {category}{i}"),
                format!("признак {category}{i}"),
            )
            .with_values(values);
            catalog.add_feature(category, draft, None).unwrap();
        }
    }

    let profiles = (1..=DOCULECTS)
        .map(|d| Profile {
            doculect: format!("doculect{d}"),
            entries: catalog
                .features()
                .iter()
                .map(|f| ProfileEntry::not_stated(f.id, &f.ru))
                .collect(),
        })
        .collect();

    Catalog::new(
        catalog.features().to_vec(),
        catalog.values().to_vec(),
        profiles,
        NotApplicableRules::default(),
    )
    .with_categories(categories)
}

fn insert_features(c: &mut Criterion) {
    let catalog = preseed_catalog();
    let category = CategoryId::new('A').unwrap();

    c.bench_function("insert and remove feature", |b| {
        b.iter_batched(
            || catalog.clone(),
            |mut catalog| {
                let draft = FeatureDraft::new("new feature", "новый признак")
                    .with_values(vec![ValueDraft::new("yes", "да"), ValueDraft::new("no", "нет")]);
                let id = catalog.add_feature(category, draft, Some(1)).unwrap();
                catalog.remove_feature(id).unwrap();
                catalog
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, insert_features);
criterion_main!(benches);
