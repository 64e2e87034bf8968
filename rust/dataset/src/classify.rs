// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::label::ClassCounts;

/// Bucket an image falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Defect,
    FaultFree,
    /// Some defect pixels, but too few to count as a defect image
    Ambiguous,
}

/// Knobs for the sorting pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierOptions {
    /// Minimum defect pixels for the `defect` bucket
    pub threshold: u64,
    /// File-name suffix identifying label maps
    pub label_suffix: String,
    /// Name prefix of sorted output folders, skipped during discovery
    pub sorted_prefix: String,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            threshold: 50,
            label_suffix: "segmap.png".to_string(),
            sorted_prefix: "sorted_dataset".to_string(),
        }
    }
}

/// `defect >= threshold` is a defect image, zero defect pixels is fault
/// free, anything in between is ambiguous.
pub fn classify(counts: &ClassCounts, threshold: u64) -> Classification {
    if counts.defect >= threshold {
        Classification::Defect
    } else if counts.defect == 0 {
        Classification::FaultFree
    } else {
        Classification::Ambiguous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(defect: u64) -> ClassCounts {
        ClassCounts {
            background: 900,
            casing: 500,
            defect,
        }
    }

    #[test]
    fn test_classification_rule() {
        assert_eq!(classify(&counts(51), 50), Classification::Defect);
        assert_eq!(classify(&counts(50), 50), Classification::Defect);
        assert_eq!(classify(&counts(49), 50), Classification::Ambiguous);
        assert_eq!(classify(&counts(1), 50), Classification::Ambiguous);
        assert_eq!(classify(&counts(0), 50), Classification::FaultFree);
    }

    #[test]
    fn test_zero_threshold_never_ambiguous() {
        assert_eq!(classify(&counts(0), 0), Classification::Defect);
    }
}
