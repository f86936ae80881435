//! Property tests over `TableData` snapshots and stacking.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use coinlab_core::LatestPolicy;
use coinlab_runner::table::{SLUG, TIMESTAMP};
use coinlab_runner::{ColumnData, TableData};
use proptest::prelude::*;

fn day(n: u8) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(i64::from(n))
}

fn table(rows: &[(u8, u8, Option<f64>)]) -> TableData {
    TableData::new()
        .with_column(
            SLUG,
            ColumnData::Str(rows.iter().map(|r| format!("coin-{}", r.0)).collect()),
        )
        .unwrap()
        .with_column(
            TIMESTAMP,
            ColumnData::Timestamp(rows.iter().map(|r| day(r.1)).collect()),
        )
        .unwrap()
        .with_column("value", ColumnData::Float(rows.iter().map(|r| r.2).collect()))
        .unwrap()
}

fn rows_strategy() -> impl Strategy<Value = Vec<(u8, u8, Option<f64>)>> {
    prop::collection::vec(
        (0u8..5, 0u8..30, prop::option::of(-1e6f64..1e6)),
        0..60,
    )
}

proptest! {
    #[test]
    fn per_slug_latest_has_one_row_per_slug(rows in rows_strategy()) {
        let data = table(&rows);
        let latest = data.select_latest(LatestPolicy::PerSlug).unwrap();

        let slugs: BTreeSet<u8> = rows.iter().map(|r| r.0).collect();
        prop_assert_eq!(latest.height(), slugs.len());

        let keys = latest.row_keys().unwrap();
        for key in keys {
            let max = rows
                .iter()
                .filter(|r| format!("coin-{}", r.0) == key.slug)
                .map(|r| day(r.1))
                .max();
            prop_assert_eq!(Some(key.timestamp), max);
        }
    }

    #[test]
    fn global_latest_rows_share_the_max_timestamp(rows in rows_strategy()) {
        let data = table(&rows);
        let latest = data.select_latest(LatestPolicy::Global).unwrap();
        let max = rows.iter().map(|r| day(r.1)).max();
        let expected = rows.iter().filter(|r| Some(day(r.1)) == max).count();
        prop_assert_eq!(latest.height(), expected);
    }

    #[test]
    fn vstack_preserves_rows_and_hash_tracks_content(
        a in rows_strategy(),
        b in rows_strategy(),
    ) {
        let stacked = table(&a).vstack(table(&b)).unwrap();
        prop_assert_eq!(stacked.height(), a.len() + b.len());

        let mut all = a.clone();
        all.extend(b.iter().copied());
        prop_assert_eq!(
            stacked.content_hash().unwrap(),
            table(&all).content_hash().unwrap()
        );
    }
}
