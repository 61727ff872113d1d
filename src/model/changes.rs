use std::collections::{BTreeSet, HashMap, HashSet};

use crate::model::row::RowId;

/// How the shadow table changed across one projection pass, in the terms a
/// list view needs to animate it.
///
/// `deletes` are indices into the old table, `inserts` and `reloads` are
/// indices into the new one, `moves` pair an old index with a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowTableChanges {
    pub deletes: BTreeSet<usize>,
    pub inserts: BTreeSet<usize>,
    pub moves: Vec<(usize, usize)>,
    pub reloads: BTreeSet<usize>,
}

impl ShadowTableChanges {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.inserts.is_empty() && self.moves.is_empty() && self.reloads.is_empty()
    }

    /// Changes that only redraw rows in place
    pub fn reloading(reloads: impl IntoIterator<Item = usize>) -> Self {
        ShadowTableChanges {
            reloads: reloads.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Fold `other` into `self`. Reloads that are also inserts are dropped
    /// since the inserted row is drawn fresh anyway.
    pub fn merge(&mut self, other: ShadowTableChanges) {
        self.deletes.extend(other.deletes);
        self.inserts.extend(other.inserts);
        self.moves.extend(other.moves);
        self.reloads.extend(other.reloads);
        self.reloads.retain(|r| !self.inserts.contains(r));
    }

    /// Compare two shadow tables.
    ///
    /// Rows present in both tables whose relative order changed are reported
    /// as moves. The rows kept in place are a longest increasing run of old
    /// positions, so the number of moves is minimal.
    pub fn diff(old: &[RowId], new: &[RowId]) -> Self {
        let old_positions: HashMap<RowId, usize> = old.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let new_ids: HashSet<RowId> = new.iter().copied().collect();

        let deletes = old
            .iter()
            .enumerate()
            .filter(|(_, id)| !new_ids.contains(id))
            .map(|(i, _)| i)
            .collect();

        let mut inserts = BTreeSet::new();
        let mut common: Vec<(usize, usize)> = Vec::new();
        for (new_index, id) in new.iter().enumerate() {
            match old_positions.get(id) {
                Some(old_index) => common.push((*old_index, new_index)),
                None => {
                    inserts.insert(new_index);
                }
            }
        }

        let old_sequence: Vec<usize> = common.iter().map(|(o, _)| *o).collect();
        let stable: HashSet<usize> = longest_increasing_subsequence(&old_sequence).into_iter().collect();
        let moves = common
            .iter()
            .enumerate()
            .filter(|(i, _)| !stable.contains(i))
            .map(|(_, pair)| *pair)
            .collect();

        ShadowTableChanges {
            deletes,
            inserts,
            moves,
            reloads: BTreeSet::new(),
        }
    }
}

/// Positions in `seq` forming one longest strictly increasing subsequence.
fn longest_increasing_subsequence(seq: &[usize]) -> Vec<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; seq.len()];

    for (i, value) in seq.iter().enumerate() {
        let slot = tails.partition_point(|&t| seq[t] < *value);
        if slot > 0 {
            previous[i] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut out = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        out.push(i);
        cursor = previous[i];
    }
    out.reverse();
    out
}
