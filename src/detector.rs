//! Literal signature detection.
//!
//! Each signature is searched for independently, left to right. After a hit
//! the search resumes at the end of the match, so occurrences never overlap.
//! Matching is byte-exact and case-sensitive.

use crate::catalogue::Catalogue;
use crate::table::FrequencyTable;

/// Scans text blocks against a catalogue and records hits in a table.
pub struct Detector<'a> {
    catalogue: &'a Catalogue,
}

impl<'a> Detector<'a> {
    pub fn new(catalogue: &'a Catalogue) -> Self {
        Self { catalogue }
    }

    /// Count every non-overlapping occurrence of every signature in `text`.
    ///
    /// Returns the number of hits recorded.
    pub fn detect(&self, text: &str, table: &mut FrequencyTable) -> u64 {
        let mut hits = 0;
        for entry in self.catalogue {
            for _ in text.match_indices(entry.signature.as_str()) {
                table.increment(&entry.signature);
                hits += 1;
            }
        }
        hits
    }
}
