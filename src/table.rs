//! Frequency table: occurrence counts keyed by API signature.
//!
//! Open hashing with chained buckets. The table itself has no order;
//! reports re-walk the catalogue on every enumeration.

use serde::Serialize;

use crate::catalogue::{ApiCategory, ApiSignature, Catalogue};

const BUCKET_COUNT: usize = 1024;

/// Count for one observed signature. Only exists once `count >= 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyRecord {
    pub signature: String,
    pub count: u64,
}

/// One line of a category-grouped enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLine<'a> {
    /// Emitted before the first entry and whenever the category changes.
    Header(ApiCategory),
    Entry {
        category: ApiCategory,
        signature: &'a str,
        count: u64,
    },
}

#[derive(Debug, Clone)]
pub struct FrequencyTable {
    buckets: Vec<Vec<FrequencyRecord>>,
    len: usize,
}

fn bucket_index(signature: &str) -> usize {
    let hash = signature
        .bytes()
        .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
    hash as usize % BUCKET_COUNT
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); BUCKET_COUNT],
            len: 0,
        }
    }

    /// Insert with count 1, or bump the existing record.
    pub fn increment(&mut self, signature: &str) {
        let bucket = &mut self.buckets[bucket_index(signature)];
        match bucket.iter_mut().find(|r| r.signature == signature) {
            Some(record) => record.count += 1,
            None => {
                bucket.push(FrequencyRecord {
                    signature: signature.to_string(),
                    count: 1,
                });
                self.len += 1;
            }
        }
    }

    /// Current count, zero when the signature was never seen.
    pub fn count(&self, signature: &str) -> u64 {
        self.buckets[bucket_index(signature)]
            .iter()
            .find(|r| r.signature == signature)
            .map_or(0, |r| r.count)
    }

    /// Number of distinct signatures observed.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.buckets.iter().flatten().map(|r| r.count).sum()
    }

    pub fn reset(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }

    /// Observed signatures in catalogue order, with their counts.
    pub fn observed<'a>(
        &'a self,
        catalogue: &'a Catalogue,
    ) -> impl Iterator<Item = (&'a ApiSignature, u64)> + 'a {
        catalogue.iter().filter_map(move |entry| {
            let count = self.count(&entry.signature);
            (count > 0).then_some((entry, count))
        })
    }

    /// Walk the catalogue and yield headers and entries for observed signatures.
    pub fn enumerate_by_category<'a>(&'a self, catalogue: &'a Catalogue) -> UsageLines<'a> {
        UsageLines {
            table: self,
            entries: catalogue.all_signatures().iter(),
            current: None,
            pending: None,
        }
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy category-grouped enumeration produced by
/// [`FrequencyTable::enumerate_by_category`].
pub struct UsageLines<'a> {
    table: &'a FrequencyTable,
    entries: std::slice::Iter<'a, ApiSignature>,
    current: Option<ApiCategory>,
    pending: Option<UsageLine<'a>>,
}

impl<'a> Iterator for UsageLines<'a> {
    type Item = UsageLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(line) = self.pending.take() {
            return Some(line);
        }
        for entry in self.entries.by_ref() {
            let count = self.table.count(&entry.signature);
            if count == 0 {
                continue;
            }
            let line = UsageLine::Entry {
                category: entry.category,
                signature: &entry.signature,
                count,
            };
            if self.current != Some(entry.category) {
                self.current = Some(entry.category);
                self.pending = Some(line);
                return Some(UsageLine::Header(entry.category));
            }
            return Some(line);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::CatalogueSet;
    use pretty_assertions::assert_eq;

    #[test]
    fn increment_inserts_then_bumps() {
        let mut table = FrequencyTable::new();
        assert_eq!(table.count("fetch"), 0);
        table.increment("fetch");
        table.increment("fetch");
        table.increment("setTimeout");
        assert_eq!(table.count("fetch"), 2);
        assert_eq!(table.count("setTimeout"), 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.total(), 3);
    }

    #[test]
    fn colliding_signatures_stay_distinct() {
        // "Aa" and "BB" share a 31-multiplier hash.
        assert_eq!(bucket_index("Aa"), bucket_index("BB"));
        let mut table = FrequencyTable::new();
        table.increment("Aa");
        table.increment("BB");
        table.increment("BB");
        assert_eq!(table.count("Aa"), 1);
        assert_eq!(table.count("BB"), 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn reset_clears_everything() {
        let mut table = FrequencyTable::new();
        table.increment("fetch");
        table.reset();
        assert!(table.is_empty());
        assert_eq!(table.count("fetch"), 0);
    }

    #[test]
    fn enumeration_groups_in_catalogue_order() {
        let catalogue = Catalogue::builtin(CatalogueSet::Full);
        let mut table = FrequencyTable::new();
        table.increment("window.alert");
        table.increment("setTimeout");
        table.increment("fetch");
        table.increment("fetch");
        table.increment("setInterval");

        let lines: Vec<_> = table.enumerate_by_category(&catalogue).collect();
        assert_eq!(
            lines,
            vec![
                UsageLine::Header(ApiCategory::Network),
                UsageLine::Entry {
                    category: ApiCategory::Network,
                    signature: "fetch",
                    count: 2
                },
                UsageLine::Header(ApiCategory::Rendering),
                UsageLine::Entry {
                    category: ApiCategory::Rendering,
                    signature: "setTimeout",
                    count: 1
                },
                UsageLine::Entry {
                    category: ApiCategory::Rendering,
                    signature: "setInterval",
                    count: 1
                },
                UsageLine::Header(ApiCategory::UserInteraction),
                UsageLine::Entry {
                    category: ApiCategory::UserInteraction,
                    signature: "window.alert",
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn enumeration_never_repeats_header() {
        let catalogue = Catalogue::builtin(CatalogueSet::Full);
        let mut table = FrequencyTable::new();
        for entry in &catalogue {
            table.increment(&entry.signature);
        }
        let lines: Vec<_> = table.enumerate_by_category(&catalogue).collect();
        let headers: Vec<_> = lines
            .iter()
            .filter_map(|l| match l {
                UsageLine::Header(c) => Some(*c),
                _ => None,
            })
            .collect();
        assert_eq!(
            headers,
            vec![
                ApiCategory::FileSystem,
                ApiCategory::Network,
                ApiCategory::Rendering,
                ApiCategory::UserInteraction
            ]
        );
        for pair in lines.windows(2) {
            assert!(!matches!(
                pair,
                [UsageLine::Header(_), UsageLine::Header(_)]
            ));
        }
    }

    #[test]
    fn enumeration_is_rederived_each_call() {
        let catalogue = Catalogue::builtin(CatalogueSet::Batch);
        let mut table = FrequencyTable::new();
        assert_eq!(table.enumerate_by_category(&catalogue).count(), 0);
        table.increment("fetch");
        assert_eq!(table.enumerate_by_category(&catalogue).count(), 2);
        table.increment("fetch");
        let last = table.enumerate_by_category(&catalogue).last();
        assert_eq!(
            last,
            Some(UsageLine::Entry {
                category: ApiCategory::Network,
                signature: "fetch",
                count: 2
            })
        );
    }

    #[test]
    fn signatures_outside_catalogue_are_not_enumerated() {
        let catalogue = Catalogue::builtin(CatalogueSet::Batch);
        let mut table = FrequencyTable::new();
        table.increment("localStorage.setItem");
        assert_eq!(table.enumerate_by_category(&catalogue).count(), 0);
        assert_eq!(table.observed(&catalogue).count(), 0);
    }
}
