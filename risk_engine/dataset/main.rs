//! Asset records, validation and dataset persistence.

/// Record types and field validation.
pub mod record;
/// Dataset store trait and the CSV-backed implementation.
pub mod store;

pub use record::{AssetRecord, ResourceType, WaterType};
pub use store::{CsvDatasetStore, DatasetStore};

use std::collections::BTreeMap;

/// Outcome of dropping condition classes too small to stratify on.
#[derive(Debug, Clone)]
pub struct DroppedClasses {
    /// Condition value mapped to how many records carried it.
    pub classes: BTreeMap<u8, usize>,
    /// Total number of records removed.
    pub count: usize,
}

/// Removes records whose condition class has fewer than two members.
///
/// Singleton classes cannot survive a stratified split. If filtering would
/// empty the dataset the original records are kept unchanged.
#[must_use]
pub fn filter_rare_classes(records: &[AssetRecord]) -> (Vec<AssetRecord>, Option<DroppedClasses>) {
    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.condition).or_insert(0) += 1;
    }
    let rare: BTreeMap<u8, usize> = counts
        .iter()
        .filter(|(_, &count)| count < 2)
        .map(|(&class, &count)| (class, count))
        .collect();
    if rare.is_empty() {
        return (records.to_vec(), None);
    }
    let kept: Vec<AssetRecord> = records
        .iter()
        .filter(|record| !rare.contains_key(&record.condition))
        .cloned()
        .collect();
    let dropped = DroppedClasses {
        count: records.len() - kept.len(),
        classes: rare,
    };
    if kept.is_empty() {
        (records.to_vec(), Some(dropped))
    } else {
        (kept, Some(dropped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(condition: u8) -> AssetRecord {
        AssetRecord {
            name: format!("asset-{condition}"),
            region: "north".into(),
            resource_type: ResourceType::Reservoir,
            water_type: WaterType::Fresh,
            fauna: false,
            passport_date: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            condition,
            lat: 48.0,
            lon: 67.0,
        }
    }

    #[test]
    fn keeps_well_populated_classes() {
        let records = vec![record(2), record(2), record(3), record(3)];
        let (kept, dropped) = filter_rare_classes(&records);
        assert_eq!(kept.len(), 4);
        assert!(dropped.is_none());
    }

    #[test]
    fn drops_singleton_classes() {
        let records = vec![record(2), record(2), record(5)];
        let (kept, dropped) = filter_rare_classes(&records);
        assert_eq!(kept.len(), 2);
        let dropped = dropped.unwrap();
        assert_eq!(dropped.count, 1);
        assert_eq!(dropped.classes.get(&5), Some(&1));
    }

    #[test]
    fn never_empties_the_dataset() {
        let records = vec![record(1), record(4)];
        let (kept, dropped) = filter_rare_classes(&records);
        assert_eq!(kept.len(), 2);
        assert!(dropped.is_some());
    }
}
