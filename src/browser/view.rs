//! Display projections over fetched files. Nothing here is stored; the
//! controller recomputes the projection from its canonical listing.

use crate::types::ObjectEntry;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    Size,
    LastModified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Active sort column. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::LastModified,
            direction: SortDirection::Descending,
        }
    }
}

impl SortState {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Header click: same column toggles, another column starts ascending
    pub fn select(self, key: SortKey) -> Self {
        if self.key == key {
            Self::new(key, self.direction.toggled())
        } else {
            Self::new(key, SortDirection::Ascending)
        }
    }
}

/// Case-insensitive first, raw bytes as tie-break so the order is total
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare(a: &ObjectEntry, b: &ObjectEntry, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => compare_names(&a.key, &b.key),
        SortKey::Size => a.size.cmp(&b.size),
        SortKey::LastModified => a.last_modified.cmp(&b.last_modified),
    }
}

/// Files whose key contains `term`, ignoring case. An empty term keeps everything.
pub fn filter_files<'a>(files: &'a [ObjectEntry], term: &str) -> Vec<&'a ObjectEntry> {
    let needle = term.to_lowercase();
    files
        .iter()
        .filter(|file| file.key.to_lowercase().contains(&needle))
        .collect()
}

pub fn sort_files(files: &mut [&ObjectEntry], sort: SortState) {
    files.sort_by(|a, b| {
        let ordering = compare(a, b, sort.key);
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// Filter then sort: the rows a file table shows
pub fn project(files: &[ObjectEntry], term: &str, sort: SortState) -> Vec<ObjectEntry> {
    let mut visible = filter_files(files, term);
    sort_files(&mut visible, sort);
    visible.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(key: &str, size: u64, day: u32) -> ObjectEntry {
        ObjectEntry {
            key: key.to_string(),
            size,
            last_modified: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        }
    }

    fn keys(entries: &[ObjectEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.key.as_str()).collect()
    }

    fn sample() -> Vec<ObjectEntry> {
        vec![entry("b.txt", 200, 1), entry("a.txt", 100, 2)]
    }

    #[test]
    fn test_sort_examples() {
        let files = sample();
        let by_size = SortState::new(SortKey::Size, SortDirection::Ascending);
        let by_name = SortState::new(SortKey::Name, SortDirection::Ascending);

        assert_eq!(keys(&project(&files, "", by_size)), vec!["a.txt", "b.txt"]);
        assert_eq!(keys(&project(&files, "", by_name)), vec!["a.txt", "b.txt"]);
        assert_eq!(
            keys(&project(&files, "", by_name.select(SortKey::Name))),
            vec!["b.txt", "a.txt"]
        );
    }

    #[test]
    fn test_select_toggles_or_resets() {
        let size_asc = SortState::default().select(SortKey::Size);
        assert_eq!(size_asc, SortState::new(SortKey::Size, SortDirection::Ascending));

        let size_desc = size_asc.select(SortKey::Size);
        assert_eq!(size_desc.direction, SortDirection::Descending);

        let name = SortState::new(SortKey::Name, SortDirection::Descending).select(SortKey::Size);
        assert_eq!(name, SortState::new(SortKey::Size, SortDirection::Ascending));
    }

    #[test]
    fn test_default_is_newest_first() {
        let files = sample();
        assert_eq!(keys(&project(&files, "", SortState::default())), vec!["a.txt", "b.txt"]);

        let oldest_first = SortState::new(SortKey::LastModified, SortDirection::Ascending);
        assert_eq!(keys(&project(&files, "", oldest_first)), vec!["b.txt", "a.txt"]);
    }

    #[test]
    fn test_name_sort_ignores_case() {
        let files = vec![entry("b.txt", 1, 1), entry("A.txt", 1, 1), entry("c.txt", 1, 1)];
        let by_name = SortState::new(SortKey::Name, SortDirection::Ascending);
        assert_eq!(keys(&project(&files, "", by_name)), vec!["A.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let files = vec![
            entry("docs/Report.PDF", 1, 1),
            entry("docs/notes.txt", 1, 1),
            entry("docs/old-report.pdf", 1, 1),
        ];

        let found = filter_files(&files, "report");
        assert_eq!(found.len(), 2);
        assert!(filter_files(&files, "").len() == 3);
        assert!(filter_files(&files, "missing").is_empty());
    }
}
