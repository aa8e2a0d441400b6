//! Taxonomy path strings and the prefix set derived from active filters.
//!
//! A path is `|`-delimited, one segment per taxonomy id: the node `C` under
//! `B` under `A` has path `|A|B|C`, a top-level node `A` has path `|A`.

use itertools::Itertools;
use tracing::{debug, instrument};

/// Segment delimiter of taxonomy paths.
pub const PATH_DELIMITER: char = '|';

/// Non-empty segments of a path, in order. Empty segments are skipped.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(PATH_DELIMITER).filter(|segment| !segment.is_empty())
}

/// Cumulative prefixes of one path: `|A|B` yields `|A`, `|A|B`.
pub fn cumulative_prefixes(path: &str) -> impl Iterator<Item = String> + '_ {
    segments(path).scan(String::new(), |acc, segment| {
        acc.push(PATH_DELIMITER);
        acc.push_str(segment);
        Some(acc.clone())
    })
}

/// Ordered, duplicate-free set of every path prefix of the active filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPrefixSet {
    prefixes: Vec<String>,
}

impl PathPrefixSet {
    /// Derive the prefix set, first-seen order.
    #[instrument(level = "trace", skip(filters))]
    pub fn derive<S: AsRef<str>>(filters: &[S]) -> Self {
        let prefixes: Vec<String> = filters
            .iter()
            .flat_map(|filter| cumulative_prefixes(filter.as_ref()))
            .unique()
            .collect();
        debug!("derived {} prefixes from {} filters", prefixes.len(), filters.len());
        Self { prefixes }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.prefixes
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| prefix == path)
    }

    /// True when some prefix contains `node_path + "|"` anywhere.
    ///
    /// Containment is not anchored at the start of the prefix, so an id that
    /// is a substring of another path can over-match.
    pub fn reveals(&self, node_path: &str) -> bool {
        let needle = format!("{node_path}{PATH_DELIMITER}");
        self.prefixes.iter().any(|prefix| prefix.contains(&needle))
    }
}

impl<'a> IntoIterator for &'a PathPrefixSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.prefixes.iter()
    }
}

/// Shorthand for [`PathPrefixSet::derive`].
pub fn derive_prefixes<S: AsRef<str>>(filters: &[S]) -> PathPrefixSet {
    PathPrefixSet::derive(filters)
}

/// Prefix set memoized by the filter list it was derived from.
///
/// The host calls [`PrefixMemo::update`] explicitly whenever its filter state
/// changes; derivation only reruns when the input actually differs.
#[derive(Debug, Clone, Default)]
pub struct PrefixMemo {
    filters: Vec<String>,
    prefixes: PathPrefixSet,
}

impl PrefixMemo {
    /// Replace the active filters. Returns whether the prefix set was recomputed.
    pub fn update<S: AsRef<str>>(&mut self, filters: &[S]) -> bool {
        let unchanged = self.filters.len() == filters.len()
            && self
                .filters
                .iter()
                .zip(filters)
                .all(|(old, new)| old == new.as_ref());
        if unchanged {
            return false;
        }
        self.filters = filters.iter().map(|f| f.as_ref().to_string()).collect();
        self.prefixes = PathPrefixSet::derive(&self.filters);
        true
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn prefixes(&self) -> &PathPrefixSet {
        &self.prefixes
    }
}
