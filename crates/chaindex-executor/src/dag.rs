//! Dependency graph over a block's transactions.
//!
//! An edge `i -> j` (`i < j`) exists when both touch a key and at least one
//! writes it. Transactions are grouped by level: a transaction's level is
//! one more than the highest level among its predecessors. Members of a
//! group never conflict, and conflicting transactions always land in groups
//! ordered by block position, so running groups in order is equivalent to
//! running the block sequentially.

use std::collections::BTreeMap;

use chaindex_types::TxIndex;
use thiserror::Error;

use crate::access::{AccessKey, AccessSet, AccessType};
use crate::tx::DeliverTx;

/// The graph could not be built. Recoverable: the block falls back to
/// sequential execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dependency graph build failed ({reason}) at {}: {detail}", tx_label(.tx))]
pub struct DagBuildError {
    /// Short, low-cardinality label used as the metric reason.
    pub reason: String,
    pub detail: String,
    /// Offending transaction, filled in by the graph builder.
    pub tx: Option<TxIndex>,
}

fn tx_label(tx: &Option<TxIndex>) -> String {
    tx.map_or_else(|| "unknown tx".to_string(), |t| t.to_string())
}

impl DagBuildError {
    #[must_use]
    pub fn new(reason: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            detail: detail.into(),
            tx: None,
        }
    }

    #[must_use]
    pub fn at(mut self, tx: TxIndex) -> Self {
        self.tx = Some(tx);
        self
    }
}

#[derive(Default)]
struct KeyCursor {
    last_writer: Option<usize>,
    readers_since_write: Vec<usize>,
}

/// Conflict graph plus the derived execution levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDag {
    predecessors: Vec<Vec<usize>>,
    levels: Vec<usize>,
}

impl DependencyDag {
    /// Collect every transaction's access set and build the graph.
    ///
    /// # Errors
    /// The first access-set failure, tagged with its transaction index.
    pub fn from_txs<T>(txs: &[T]) -> Result<(Self, Vec<AccessSet>), DagBuildError>
    where
        T: AsRef<dyn DeliverTx>,
    {
        let mut sets = Vec::with_capacity(txs.len());
        for (i, tx) in txs.iter().enumerate() {
            let index = TxIndex(u32::try_from(i).map_err(|_| {
                DagBuildError::new("too_many_txs", format!("{} transactions", txs.len()))
            })?);
            let set = tx.as_ref().access_set().map_err(|e| e.at(index))?;
            sets.push(set);
        }
        Ok((Self::build(&sets), sets))
    }

    /// Build from already-declared access sets.
    ///
    /// Walks transactions in block order, tracking per key the last writer
    /// and the readers since. A write depends on both; a read depends on
    /// the last writer. Transitively this covers every conflicting pair.
    #[must_use]
    pub fn build(sets: &[AccessSet]) -> Self {
        let mut cursors: BTreeMap<&AccessKey, KeyCursor> = BTreeMap::new();
        let mut predecessors: Vec<Vec<usize>> = Vec::with_capacity(sets.len());
        let mut levels: Vec<usize> = Vec::with_capacity(sets.len());

        for (j, set) in sets.iter().enumerate() {
            let mut preds: Vec<usize> = Vec::new();
            for (key, access) in set.iter() {
                let cursor = cursors.entry(key).or_default();
                preds.extend(cursor.last_writer);
                match access {
                    AccessType::Read => cursor.readers_since_write.push(j),
                    AccessType::Write => {
                        preds.append(&mut cursor.readers_since_write);
                        cursor.last_writer = Some(j);
                    }
                }
            }
            preds.sort_unstable();
            preds.dedup();

            let level = preds.iter().map(|&p| levels[p] + 1).max().unwrap_or(0);
            levels.push(level);
            predecessors.push(preds);
        }

        Self {
            predecessors,
            levels,
        }
    }

    /// Execution groups in level order, indices ascending within a group.
    #[must_use]
    pub fn groups(&self) -> Vec<Vec<TxIndex>> {
        let depth = self.levels.iter().max().map_or(0, |m| m + 1);
        let mut groups: Vec<Vec<TxIndex>> = vec![Vec::new(); depth];
        for (i, &level) in self.levels.iter().enumerate() {
            // indices fit in u32: `from_txs` rejects larger blocks
            groups[level].push(TxIndex(u32::try_from(i).unwrap_or(u32::MAX)));
        }
        groups
    }

    #[must_use]
    pub fn predecessors(&self, tx: TxIndex) -> &[usize] {
        self.predecessors
            .get(tx.as_usize())
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn level(&self, tx: TxIndex) -> Option<usize> {
        self.levels.get(tx.as_usize()).copied()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.predecessors.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> AccessKey {
        AccessKey::named(name)
    }

    fn idx(groups: &[Vec<TxIndex>]) -> Vec<Vec<u32>> {
        groups
            .iter()
            .map(|g| g.iter().map(|t| t.0).collect())
            .collect()
    }

    #[test]
    fn independent_txs_share_one_group() {
        let sets: Vec<AccessSet> = (0..4)
            .map(|i| AccessSet::new().write(key(&format!("k{i}"))))
            .collect();
        let dag = DependencyDag::build(&sets);
        assert_eq!(idx(&dag.groups()), vec![vec![0, 1, 2, 3]]);
        assert_eq!(dag.edge_count(), 0);
    }

    #[test]
    fn write_chain_is_sequential() {
        let sets: Vec<AccessSet> = (0..3).map(|_| AccessSet::new().write(key("k"))).collect();
        let dag = DependencyDag::build(&sets);
        assert_eq!(idx(&dag.groups()), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn readers_run_together_between_writers() {
        let sets = vec![
            AccessSet::new().write(key("k")),
            AccessSet::new().read(key("k")),
            AccessSet::new().read(key("k")),
            AccessSet::new().write(key("k")),
        ];
        let dag = DependencyDag::build(&sets);
        assert_eq!(idx(&dag.groups()), vec![vec![0], vec![1, 2], vec![3]]);
        assert_eq!(dag.predecessors(TxIndex(3)), &[0, 1, 2]);
    }

    #[test]
    fn late_independent_tx_joins_first_group() {
        let sets = vec![
            AccessSet::new().write(key("a")),
            AccessSet::new().write(key("a")),
            AccessSet::new().write(key("b")),
        ];
        let dag = DependencyDag::build(&sets);
        assert_eq!(idx(&dag.groups()), vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn no_group_contains_a_conflict() {
        let names = ["a", "b", "c"];
        let sets: Vec<AccessSet> = (0..30usize)
            .map(|i| {
                let s = AccessSet::new().read(key(names[i % 3]));
                if i % 4 == 0 { s.write(key(names[(i / 4) % 3])) } else { s }
            })
            .collect();
        let dag = DependencyDag::build(&sets);
        for group in dag.groups() {
            for (n, a) in group.iter().enumerate() {
                for b in &group[n + 1..] {
                    assert!(!sets[a.as_usize()].conflicts_with(&sets[b.as_usize()]));
                }
            }
        }
        for i in 0..sets.len() {
            for j in i + 1..sets.len() {
                if sets[i].conflicts_with(&sets[j]) {
                    let (li, lj) = (dag.levels[i], dag.levels[j]);
                    assert!(li < lj, "tx {i} (level {li}) must precede tx {j} (level {lj})");
                }
            }
        }
    }

    #[test]
    fn error_display_names_tx() {
        let err = DagBuildError::new("dynamic_access", "depends on oracle").at(TxIndex(4));
        assert_eq!(
            err.to_string(),
            "dependency graph build failed (dynamic_access) at tx:4: depends on oracle"
        );
    }
}
