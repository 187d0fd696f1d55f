//! Deterministic contiguous k-fold splitting of sequence indices.

/// One train/held-out partition of sequence indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSplit {
    /// Sequence indices to train on.
    pub train: Vec<usize>,
    /// Sequence indices held out for scoring.
    pub held_out: Vec<usize>,
}

/// Split `num_items` indices into `num_folds` contiguous folds.
///
/// The first `num_items % num_folds` folds hold out one extra index, so
/// fold sizes differ by at most one. No shuffling: the same inputs always
/// produce the same splits.
///
/// Returns an empty Vec when `num_folds < 2` or there are fewer items than
/// folds; callers treat that as "cannot cross-validate".
pub fn kfold(num_items: usize, num_folds: usize) -> Vec<FoldSplit> {
    if num_folds < 2 || num_items < num_folds {
        return Vec::new();
    }
    let base = num_items / num_folds;
    let extra = num_items % num_folds;
    let mut splits = Vec::with_capacity(num_folds);
    let mut start = 0;
    for fold in 0..num_folds {
        let size = base + usize::from(fold < extra);
        let end = start + size;
        let held_out: Vec<usize> = (start..end).collect();
        let train: Vec<usize> = (0..num_items).filter(|i| *i < start || *i >= end).collect();
        splits.push(FoldSplit { train, held_out });
        start = end;
    }
    splits
}
