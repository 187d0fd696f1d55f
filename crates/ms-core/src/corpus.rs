//! Corpus types: observation sets and the labeled item collection.
//!
//! An [`ObservationSet`] is a concatenated matrix of fixed-width feature
//! rows partitioned into one or more sequences by a segment-length vector.
//! A [`Collection`] maps item labels to their raw sequences and the
//! concatenated set derived from them. Both are read-only once built; a
//! selection run only ever borrows them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// One raw observation sequence: an ordered list of feature vectors.
pub type Sequence = Vec<Vec<f64>>;

/// Errors from corpus construction.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("segment lengths sum to {expected}, but {got} rows were provided")]
    LengthMismatch { expected: usize, got: usize },

    #[error("segment {index} has zero length")]
    EmptySegment { index: usize },

    #[error("observation set has no rows")]
    Empty,

    #[error("rows have zero feature width")]
    NoFeatures,

    #[error("row {index} has {got} features, expected {expected}")]
    RaggedRow {
        index: usize,
        expected: usize,
        got: usize,
    },

    #[error("sequence index {index} out of range for {count} sequences")]
    SequenceIndexOutOfRange { index: usize, count: usize },

    #[error("item {0:?} has no sequences")]
    NoSequences(String),
}

/// Concatenated feature rows plus the segment lengths partitioning them
/// into sequences.
///
/// Invariants, enforced at construction:
/// - at least one row, every row the same non-zero width
/// - every segment length is at least 1
/// - segment lengths sum to the row count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSet {
    rows: Vec<Vec<f64>>,
    lengths: Vec<usize>,
}

impl ObservationSet {
    /// Build from an explicit row matrix and segment-length vector.
    pub fn new(rows: Vec<Vec<f64>>, lengths: Vec<usize>) -> Result<Self, CorpusError> {
        if rows.is_empty() {
            return Err(CorpusError::Empty);
        }
        for (index, len) in lengths.iter().enumerate() {
            if *len == 0 {
                return Err(CorpusError::EmptySegment { index });
            }
        }
        let expected: usize = lengths.iter().sum();
        if expected != rows.len() {
            return Err(CorpusError::LengthMismatch {
                expected,
                got: rows.len(),
            });
        }
        let width = rows[0].len();
        if width == 0 {
            return Err(CorpusError::NoFeatures);
        }
        for (index, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(CorpusError::RaggedRow {
                    index,
                    expected: width,
                    got: row.len(),
                });
            }
        }
        Ok(Self { rows, lengths })
    }

    /// Concatenate a list of raw sequences into one observation set.
    pub fn from_sequences(sequences: &[Sequence]) -> Result<Self, CorpusError> {
        let mut rows = Vec::new();
        let mut lengths = Vec::with_capacity(sequences.len());
        for sequence in sequences {
            lengths.push(sequence.len());
            rows.extend(sequence.iter().cloned());
        }
        Self::new(rows, lengths)
    }

    /// Concatenate the sequences selected by `indices`, in index order.
    ///
    /// Used by cross-validation to assemble fold train/held-out pairs.
    pub fn from_sequence_subset(
        sequences: &[Sequence],
        indices: &[usize],
    ) -> Result<Self, CorpusError> {
        let mut subset = Vec::with_capacity(indices.len());
        for &index in indices {
            let sequence = sequences
                .get(index)
                .ok_or(CorpusError::SequenceIndexOutOfRange {
                    index,
                    count: sequences.len(),
                })?;
            subset.push(sequence.clone());
        }
        Self::from_sequences(&subset)
    }

    /// Total number of feature rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Width of every feature row.
    pub fn num_features(&self) -> usize {
        self.rows[0].len()
    }

    /// Number of sequences in the partition.
    pub fn num_sequences(&self) -> usize {
        self.lengths.len()
    }

    /// All rows, concatenated in sequence order.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Per-sequence segment lengths.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Iterate the row slices of each sequence.
    pub fn sequence_slices(&self) -> impl Iterator<Item = &[Vec<f64>]> {
        self.lengths.iter().scan(0usize, |start, len| {
            let slice = &self.rows[*start..*start + len];
            *start += len;
            Some(slice)
        })
    }
}

/// A labeled item: its raw sequences and their concatenated observation set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    sequences: Vec<Sequence>,
    observations: ObservationSet,
}

impl Item {
    /// The raw sequences this item was built from.
    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    /// The concatenated observation set.
    pub fn observations(&self) -> &ObservationSet {
        &self.observations
    }
}

/// Immutable mapping from item label to item data.
///
/// Iteration order is the labels' lexicographic order (BTreeMap), so scans
/// over "all other items" are reproducible across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    items: BTreeMap<String, Item>,
}

impl Collection {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item, deriving its concatenated observation set.
    ///
    /// Replaces any previous item with the same label.
    pub fn insert(
        &mut self,
        label: impl Into<String>,
        sequences: Vec<Sequence>,
    ) -> Result<(), CorpusError> {
        let label = label.into();
        if sequences.is_empty() {
            return Err(CorpusError::NoSequences(label));
        }
        let observations = ObservationSet::from_sequences(&sequences)?;
        self.items.insert(
            label,
            Item {
                sequences,
                observations,
            },
        );
        Ok(())
    }

    /// Build from an iterator of (label, sequences) pairs.
    pub fn from_items(
        items: impl IntoIterator<Item = (String, Vec<Sequence>)>,
    ) -> Result<Self, CorpusError> {
        let mut collection = Self::new();
        for (label, sequences) in items {
            collection.insert(label, sequences)?;
        }
        Ok(collection)
    }

    /// Look up an item by label.
    pub fn get(&self, label: &str) -> Option<&Item> {
        self.items.get(label)
    }

    /// Whether an item with this label exists.
    pub fn contains(&self, label: &str) -> bool {
        self.items.contains_key(label)
    }

    /// Item labels in iteration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Iterate (label, item) pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Item)> {
        self.items.iter().map(|(label, item)| (label.as_str(), item))
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
