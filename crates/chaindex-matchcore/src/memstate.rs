//! Block-scoped match-state store.
//!
//! Transactions executing in parallel append orders, cancellations and
//! settlement entries into per-`(contract, pair)` buckets. Buckets are
//! created on first write. Appends are atomic but arrive in racy order, so
//! every entry is stamped with its [`Origin`] and a per-bucket sequence
//! number; reads return entries in `(origin, seq)` order. Entries from one
//! transaction keep their program order, and transactions appear in block
//! order, no matter how the threads interleaved.
//!
//! The store lives for one block. [`MemState::clear`] drops every bucket;
//! reads afterwards fail with [`ChaindexError::BucketNotFound`].

use chaindex_types::{
    Cancellation, ChaindexError, ContractAddress, MatchResult, Order, Origin, PairKey, Result,
    SettlementEntry,
};
use dashmap::DashMap;

/// Identity of a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    pub contract: ContractAddress,
    pub pair: PairKey,
}

impl BucketKey {
    #[must_use]
    pub fn new(contract: ContractAddress, pair: PairKey) -> Self {
        Self { contract, pair }
    }
}

#[derive(Debug, Clone)]
struct Recorded<T> {
    origin: Origin,
    seq: u64,
    item: T,
}

#[derive(Debug, Default)]
struct Bucket {
    next_seq: u64,
    orders: Vec<Recorded<Order>>,
    cancellations: Vec<Recorded<Cancellation>>,
    settlements: Vec<Recorded<SettlementEntry>>,
}

impl Bucket {
    fn stamp(&mut self, origin: Origin) -> (Origin, u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        (origin, seq)
    }

    fn retain_not(&mut self, origin: Origin) {
        self.orders.retain(|r| r.origin != origin);
        self.cancellations.retain(|r| r.origin != origin);
        self.settlements.retain(|r| r.origin != origin);
    }

    fn is_empty(&self) -> bool {
        self.orders.is_empty() && self.cancellations.is_empty() && self.settlements.is_empty()
    }

    fn len(&self) -> usize {
        self.orders.len() + self.cancellations.len() + self.settlements.len()
    }
}

/// Entries in observation order.
fn observed<T: Clone>(entries: &[Recorded<T>]) -> Vec<T> {
    let mut refs: Vec<&Recorded<T>> = entries.iter().collect();
    refs.sort_by_key(|r| (r.origin, r.seq));
    refs.into_iter().map(|r| r.item.clone()).collect()
}

/// Concurrent accumulator of per-block match state.
#[derive(Debug, Default)]
pub struct MemState {
    buckets: DashMap<BucketKey, Bucket>,
}

impl MemState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------

    /// Append an order to the bucket of its contract and pair.
    pub fn record_order(&self, origin: Origin, order: Order) {
        let key = BucketKey::new(order.contract_addr.clone(), order.pair_key());
        let mut bucket = self.buckets.entry(key).or_default();
        let (origin, seq) = bucket.stamp(origin);
        bucket.orders.push(Recorded {
            origin,
            seq,
            item: order,
        });
    }

    /// Append a cancellation to the bucket of its contract and pair.
    pub fn record_cancellation(&self, origin: Origin, cancellation: Cancellation) {
        let key = BucketKey::new(
            cancellation.contract_addr.clone(),
            cancellation.pair_key(),
        );
        let mut bucket = self.buckets.entry(key).or_default();
        let (origin, seq) = bucket.stamp(origin);
        bucket.cancellations.push(Recorded {
            origin,
            seq,
            item: cancellation,
        });
    }

    /// Append a settlement entry. Entries do not carry their contract, so
    /// the caller names it.
    pub fn record_settlement(
        &self,
        origin: Origin,
        contract: &ContractAddress,
        entry: SettlementEntry,
    ) {
        let key = BucketKey::new(contract.clone(), entry.pair_key());
        let mut bucket = self.buckets.entry(key).or_default();
        let (origin, seq) = bucket.stamp(origin);
        bucket.settlements.push(Recorded {
            origin,
            seq,
            item: entry,
        });
    }

    /// Remove everything `origin` recorded. Buckets left empty are dropped,
    /// so a rolled-back transaction leaves no trace.
    pub fn discard_origin(&self, origin: Origin) {
        let mut removed = 0usize;
        for mut bucket in self.buckets.iter_mut() {
            let before = bucket.len();
            bucket.retain_not(origin);
            removed += before - bucket.len();
        }
        self.buckets.retain(|_, bucket| !bucket.is_empty());
        tracing::debug!(%origin, removed, "Discarded match-state entries");
    }

    /// Drop every bucket. Called once the block's results are committed.
    pub fn clear(&self) {
        self.buckets.clear();
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    fn read<T>(
        &self,
        contract: &ContractAddress,
        pair: &PairKey,
        f: impl FnOnce(&Bucket) -> T,
    ) -> Result<T> {
        let key = BucketKey::new(contract.clone(), pair.clone());
        self.buckets
            .get(&key)
            .map(|bucket| f(&bucket))
            .ok_or_else(|| ChaindexError::BucketNotFound {
                contract: contract.clone(),
                pair: pair.clone(),
            })
    }

    pub fn orders(&self, contract: &ContractAddress, pair: &PairKey) -> Result<Vec<Order>> {
        self.read(contract, pair, |b| observed(&b.orders))
    }

    pub fn cancellations(
        &self,
        contract: &ContractAddress,
        pair: &PairKey,
    ) -> Result<Vec<Cancellation>> {
        self.read(contract, pair, |b| observed(&b.cancellations))
    }

    pub fn settlements(
        &self,
        contract: &ContractAddress,
        pair: &PairKey,
    ) -> Result<Vec<SettlementEntry>> {
        self.read(contract, pair, |b| observed(&b.settlements))
    }

    /// Canonical result for one bucket, built from its collections in
    /// observation order.
    pub fn match_result(&self, contract: &ContractAddress, pair: &PairKey) -> Result<MatchResult> {
        self.read(contract, pair, |b| {
            MatchResult::new(
                observed(&b.orders),
                observed(&b.cancellations),
                observed(&b.settlements),
            )
        })
    }

    /// Known buckets, sorted.
    #[must_use]
    pub fn bucket_keys(&self) -> Vec<BucketKey> {
        let mut keys: Vec<BucketKey> = self.buckets.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Total number of entries across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chaindex_types::{OrderId, Pair, TxIndex};

    use super::*;

    fn contract() -> ContractAddress {
        ContractAddress::new("dex1contract")
    }

    fn pair() -> Pair {
        Pair::new("USDC", "ATOM")
    }

    fn tx(i: u32) -> Origin {
        Origin::Tx(TxIndex(i))
    }

    #[test]
    fn record_and_read_back() {
        let store = MemState::new();
        store.record_order(tx(0), Order::dummy(1, &contract(), &pair()));
        store.record_cancellation(tx(0), Cancellation::dummy(2, &contract(), &pair()));
        store.record_settlement(tx(1), &contract(), SettlementEntry::dummy("a", 1, &pair()));

        assert_eq!(store.orders(&contract(), &pair().key()).unwrap().len(), 1);
        assert_eq!(store.cancellations(&contract(), &pair().key()).unwrap()[0].id, OrderId(2));
        assert_eq!(store.settlements(&contract(), &pair().key()).unwrap().len(), 1);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn unknown_bucket_is_not_found() {
        let store = MemState::new();
        let err = store.cancellations(&contract(), &pair().key()).unwrap_err();
        assert!(matches!(err, ChaindexError::BucketNotFound { .. }));
    }

    #[test]
    fn read_after_clear_fails() {
        let store = MemState::new();
        store.record_cancellation(tx(0), Cancellation::dummy(1, &contract(), &pair()));
        assert!(store.cancellations(&contract(), &pair().key()).is_ok());
        store.clear();
        assert!(store.is_empty());
        let err = store.cancellations(&contract(), &pair().key()).unwrap_err();
        assert!(matches!(err, ChaindexError::BucketNotFound { .. }));
    }

    #[test]
    fn reads_follow_origin_not_arrival() {
        let store = MemState::new();
        store.record_cancellation(tx(2), Cancellation::dummy(30, &contract(), &pair()));
        store.record_cancellation(tx(0), Cancellation::dummy(10, &contract(), &pair()));
        store.record_cancellation(Origin::EndBlock, Cancellation::dummy(99, &contract(), &pair()));
        store.record_cancellation(tx(1), Cancellation::dummy(20, &contract(), &pair()));
        store.record_cancellation(tx(0), Cancellation::dummy(11, &contract(), &pair()));

        let ids: Vec<u64> = store
            .cancellations(&contract(), &pair().key())
            .unwrap()
            .iter()
            .map(|c| c.id.0)
            .collect();
        assert_eq!(ids, [10, 11, 20, 30, 99]);
    }

    #[test]
    fn buckets_are_keyed_by_contract_and_pair() {
        let store = MemState::new();
        let other = ContractAddress::new("dex1other");
        let eth = Pair::new("USDC", "ETH");
        store.record_order(tx(0), Order::dummy(1, &contract(), &pair()));
        store.record_order(tx(0), Order::dummy(2, &contract(), &eth));
        store.record_order(tx(0), Order::dummy(3, &other, &pair()));

        let keys = store.bucket_keys();
        assert_eq!(keys.len(), 3);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(store.orders(&contract(), &eth.key()).unwrap()[0].id, OrderId(2));
    }

    #[test]
    fn discard_removes_only_that_origin() {
        let store = MemState::new();
        let eth = Pair::new("USDC", "ETH");
        store.record_order(tx(0), Order::dummy(1, &contract(), &pair()));
        store.record_order(tx(1), Order::dummy(2, &contract(), &pair()));
        store.record_order(tx(1), Order::dummy(3, &contract(), &eth));

        store.discard_origin(tx(1));

        let ids: Vec<u64> = store
            .orders(&contract(), &pair().key())
            .unwrap()
            .iter()
            .map(|o| o.id.0)
            .collect();
        assert_eq!(ids, [1]);
        assert!(store.orders(&contract(), &eth.key()).is_err());
    }

    #[test]
    fn concurrent_appends_read_deterministically() {
        let store = Arc::new(MemState::new());
        std::thread::scope(|s| {
            for t in 0..8u32 {
                let store = Arc::clone(&store);
                s.spawn(move || {
                    for k in 0..25u64 {
                        let id = u64::from(t) * 100 + k;
                        store.record_cancellation(tx(t), Cancellation::dummy(id, &contract(), &pair()));
                    }
                });
            }
        });

        let ids: Vec<u64> = store
            .cancellations(&contract(), &pair().key())
            .unwrap()
            .iter()
            .map(|c| c.id.0)
            .collect();
        let expected: Vec<u64> = (0..8u64)
            .flat_map(|t| (0..25u64).map(move |k| t * 100 + k))
            .collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn match_result_is_canonical() {
        let store = MemState::new();
        store.record_order(tx(1), Order::dummy(3, &contract(), &pair()));
        store.record_order(tx(0), Order::dummy(2, &contract(), &pair()));
        store.record_order(tx(2), Order::dummy(1, &contract(), &pair()));
        let result = store.match_result(&contract(), &pair().key()).unwrap();
        let ids: Vec<u64> = result.orders().iter().map(|o| o.id.0).collect();
        assert_eq!(ids, [1, 2, 3]);
    }
}
