//! The canonical per-block outcome for one contract/pair.
//!
//! Collections arrive in whatever order block execution produced them.
//! [`MatchResult::new`] sorts each one by canonical string with a stable
//! sort, so every node emits the same sequence regardless of how
//! concurrent writers interleaved. Elements with equal canonical strings
//! keep their relative input order, which only means something when the
//! caller passes a reproducible input order.

use serde::{Deserialize, Serialize};

use crate::{Canonical, Cancellation, Order, SettlementEntry};

/// Stable sort by canonical string.
pub fn canonical_sort<T: Canonical>(items: &mut [T]) {
    items.sort_by_cached_key(T::canonical_string);
}

/// Immutable, canonically ordered triple of orders, cancellations and
/// settlements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    orders: Vec<Order>,
    cancellations: Vec<Cancellation>,
    settlements: Vec<SettlementEntry>,
}

impl MatchResult {
    /// Build a result from unordered collections. Never fails.
    #[must_use]
    pub fn new(
        mut orders: Vec<Order>,
        mut cancellations: Vec<Cancellation>,
        mut settlements: Vec<SettlementEntry>,
    ) -> Self {
        canonical_sort(&mut orders);
        canonical_sort(&mut cancellations);
        canonical_sort(&mut settlements);
        Self {
            orders,
            cancellations,
            settlements,
        }
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn cancellations(&self) -> &[Cancellation] {
        &self.cancellations
    }

    #[must_use]
    pub fn settlements(&self) -> &[SettlementEntry] {
        &self.settlements
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty() && self.cancellations.is_empty() && self.settlements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rand::seq::SliceRandom;

    use super::*;
    use crate::{ContractAddress, Pair};

    #[derive(Debug, Clone, PartialEq)]
    struct Tagged {
        key: &'static str,
        marker: u32,
    }

    impl Canonical for Tagged {
        fn canonical_string(&self) -> String {
            self.key.to_string()
        }
    }

    fn t(key: &'static str, marker: u32) -> Tagged {
        Tagged { key, marker }
    }

    #[test]
    fn distinct_keys_sort_ascending() {
        let mut items = vec![t("A", 0), t("C", 1), t("B", 2)];
        canonical_sort(&mut items);
        let keys: Vec<_> = items.iter().map(|i| i.key).collect();
        assert_eq!(keys, ["A", "B", "C"]);
    }

    #[test]
    fn any_permutation_gives_same_output() {
        let base = vec![t("A", 0), t("B", 1), t("C", 2), t("D", 3), t("E", 4)];
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let mut shuffled = base.clone();
            shuffled.shuffle(&mut rng);
            canonical_sort(&mut shuffled);
            assert_eq!(shuffled, base);
        }
    }

    #[test]
    fn ties_keep_input_order() {
        let mut items = vec![t("B", 0), t("A", 1), t("B", 2), t("A", 3), t("B", 4)];
        canonical_sort(&mut items);
        let markers: Vec<_> = items.iter().map(|i| i.marker).collect();
        assert_eq!(markers, [1, 3, 0, 2, 4]);
    }

    #[test]
    fn match_result_sorts_all_three() {
        let contract = ContractAddress::new("dex1contract");
        let pair = Pair::new("USDC", "ATOM");
        let result = MatchResult::new(
            vec![
                Order::dummy(3, &contract, &pair),
                Order::dummy(1, &contract, &pair),
                Order::dummy(2, &contract, &pair),
            ],
            vec![
                Cancellation::dummy(9, &contract, &pair),
                Cancellation::dummy(7, &contract, &pair),
            ],
            vec![
                SettlementEntry::dummy("carol", 1, &pair),
                SettlementEntry::dummy("alice", 2, &pair),
            ],
        );
        let ids: Vec<_> = result.orders().iter().map(|o| o.id.0).collect();
        assert_eq!(ids, [1, 2, 3]);
        let ids: Vec<_> = result.cancellations().iter().map(|c| c.id.0).collect();
        assert_eq!(ids, [7, 9]);
        assert_eq!(result.settlements()[0].account, "alice");
    }

    #[test]
    fn empty_result() {
        let result = MatchResult::new(vec![], vec![], vec![]);
        assert!(result.is_empty());
        assert_eq!(result, MatchResult::default());
    }
}
