//! Per-item selection context.

use crate::config::SelectionConfig;
use crate::corpus::{Collection, Item, ObservationSet, Sequence};
use crate::select::SelectionError;
use std::ops::RangeInclusive;

/// Everything one policy run needs: the target item's data, the full
/// collection (for discriminative scoring), and the run configuration.
///
/// Holds only borrows; the collection stays read-only for the run's
/// lifetime, so contexts for different items can coexist freely.
#[derive(Debug, Clone)]
pub struct SelectionContext<'a> {
    collection: &'a Collection,
    config: &'a SelectionConfig,
    label: String,
    item: &'a Item,
}

impl<'a> SelectionContext<'a> {
    /// Build a context for `label`. Validates the configuration and that
    /// the item exists.
    pub fn new(
        collection: &'a Collection,
        label: impl Into<String>,
        config: &'a SelectionConfig,
    ) -> Result<Self, SelectionError> {
        config.validate()?;
        let label = label.into();
        let item = collection
            .get(&label)
            .ok_or_else(|| SelectionError::UnknownItem(label.clone()))?;
        Ok(Self {
            collection,
            config,
            label,
            item,
        })
    }

    /// The target item's label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The run configuration.
    pub fn config(&self) -> &SelectionConfig {
        self.config
    }

    /// The target item's raw sequences.
    pub fn sequences(&self) -> &'a [Sequence] {
        self.item.sequences()
    }

    /// The target item's concatenated observation set.
    pub fn observations(&self) -> &'a ObservationSet {
        self.item.observations()
    }

    /// Candidate state counts in ascending scan order.
    pub fn candidate_sizes(&self) -> RangeInclusive<usize> {
        self.config.candidate_sizes()
    }

    /// Every other item in the collection, in label order.
    pub fn other_items(&self) -> impl Iterator<Item = (&'a str, &'a Item)> + '_ {
        self.collection
            .iter()
            .filter(move |(label, _)| *label != self.label)
    }
}
