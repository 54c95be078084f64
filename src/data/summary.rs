use std::collections::BTreeMap;

use super::label::Gender;

// ---------------------------------------------------------------------------
// Distribution of canonical gender labels
// ---------------------------------------------------------------------------

/// Row counts per canonical gender. Genders with no rows are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenderDistribution {
    counts: BTreeMap<Gender, usize>,
}

impl GenderDistribution {
    /// Count normalized labels, skipping anything that is not a canonical
    /// display label.
    pub fn from_labels<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts = BTreeMap::new();
        for gender in labels.into_iter().filter_map(Gender::from_display_label) {
            *counts.entry(gender).or_insert(0) += 1;
        }
        GenderDistribution { counts }
    }

    /// `true` when no row carries a canonical label; render a "no data" state.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, gender: Gender) -> usize {
        self.counts.get(&gender).copied().unwrap_or(0)
    }

    /// Number of rows that were counted.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Fraction of counted rows for `gender`, in `0.0..=1.0`.
    pub fn share(&self, gender: Gender) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.count(gender) as f64 / total as f64,
        }
    }

    /// `(gender, count)` pairs in canonical order.
    pub fn entries(&self) -> impl Iterator<Item = (Gender, usize)> + '_ {
        self.counts.iter().map(|(g, n)| (*g, *n))
    }

    /// Label → count view keyed by display label.
    pub fn as_label_map(&self) -> BTreeMap<&'static str, usize> {
        self.entries()
            .map(|(g, n)| (g.display_label(), n))
            .collect()
    }
}
