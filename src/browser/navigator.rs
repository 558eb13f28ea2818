//! Folder semantics over a flat key space.
//!
//! Everything here is pure: the controller decides *when* to navigate, these
//! functions decide *where* a navigation lands.

use crate::types::{FolderPrefix, Listing, ObjectEntry, Prefix};
use serde::Serialize;

/// Crumbs shown before the path is collapsed behind an ellipsis
pub const VISIBLE_CRUMBS: usize = 3;

/// One path segment and the prefix that navigates straight to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub index: usize,
    pub label: String,
    pub target: Prefix,
}

/// Rendered crumb row. `Ellipsis` stands for the collapsed leading segments
/// and is not clickable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrumbDisplay<'a> {
    Ellipsis,
    Crumb(&'a Breadcrumb),
}

/// Folder prefixes from the provider are already full paths from the root
pub fn descend(_current: &Prefix, folder: &FolderPrefix) -> Prefix {
    Prefix::from(folder.clone())
}

/// Parent of `current`; the root is its own parent
pub fn ascend_one(current: &Prefix) -> Prefix {
    let segments: Vec<&str> = current.segments().collect();
    match segments.split_last() {
        Some((_, parents)) => Prefix::from_segments(parents.iter().copied()),
        None => Prefix::root(),
    }
}

pub fn breadcrumbs(current: &Prefix) -> Vec<Breadcrumb> {
    let segments: Vec<&str> = current.segments().collect();

    segments
        .iter()
        .enumerate()
        .map(|(index, label)| Breadcrumb {
            index,
            label: label.to_string(),
            target: Prefix::from_segments(segments[..=index].iter().copied()),
        })
        .collect()
}

/// Target of a breadcrumb click. `None` is the bucket-root crumb.
///
/// Returns `None` for an index past the end of the path.
pub fn breadcrumb_target(current: &Prefix, index: Option<usize>) -> Option<Prefix> {
    match index {
        None => Some(Prefix::root()),
        Some(i) => breadcrumbs(current)
            .into_iter()
            .nth(i)
            .map(|crumb| crumb.target),
    }
}

/// Presentation only: keeps the last `VISIBLE_CRUMBS` crumbs and collapses the
/// rest behind a single ellipsis. Targets stay the full cumulative prefixes.
pub fn visible_breadcrumbs(crumbs: &[Breadcrumb]) -> Vec<CrumbDisplay<'_>> {
    if crumbs.len() <= VISIBLE_CRUMBS {
        return crumbs.iter().map(CrumbDisplay::Crumb).collect();
    }

    let start = crumbs.len() - VISIBLE_CRUMBS;
    std::iter::once(CrumbDisplay::Ellipsis)
        .chain(crumbs[start..].iter().map(CrumbDisplay::Crumb))
        .collect()
}

/// Heading for the file view: last segment, or the bucket name at the root
pub fn title<'a>(current: &'a Prefix, bucket: &'a str) -> &'a str {
    current.segments().last().unwrap_or(bucket)
}

/// File name relative to the listed prefix
pub fn file_label<'a>(current: &Prefix, entry: &'a ObjectEntry) -> &'a str {
    entry
        .key
        .strip_prefix(current.as_str())
        .unwrap_or(&entry.key)
}

/// Split a raw delimited listing into files and folders.
///
/// Drops the directory marker (a key equal to `prefix`) and anything the
/// provider returned outside of `prefix`.
pub fn partition_listing(
    prefix: &Prefix,
    contents: Vec<ObjectEntry>,
    common_prefixes: Vec<String>,
) -> Listing {
    let files = contents
        .into_iter()
        .filter(|entry| entry.key != prefix.as_str() && entry.key.starts_with(prefix.as_str()))
        .collect();

    let folders = common_prefixes
        .into_iter()
        .filter(|folder| folder != prefix.as_str() && folder.starts_with(prefix.as_str()))
        .filter_map(|folder| FolderPrefix::parse(folder).ok())
        .collect();

    Listing { files, folders }
}
