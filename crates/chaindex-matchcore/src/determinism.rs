//! Result roots for cross-node consistency.
//!
//! Every node executing the same block must produce the exact same
//! [`MatchResult`] per bucket. The root is a SHA-256 over the canonical
//! strings of its collections, so two nodes can compare 32 bytes instead of
//! full payloads.

use chaindex_types::{Canonical, MatchResult};
use sha2::{Digest, Sha256};

fn update_section<T: Canonical>(hasher: &mut Sha256, tag: &[u8], items: &[T]) {
    hasher.update(tag);
    hasher.update((items.len() as u64).to_le_bytes());
    for item in items {
        let s = item.canonical_string();
        hasher.update((s.len() as u64).to_le_bytes());
        hasher.update(s.as_bytes());
    }
}

/// Compute the root hash of a match result.
///
/// Depends on every field of every entry, in canonical order. Each string
/// is length-prefixed so adjacent entries cannot alias.
#[must_use]
pub fn compute_result_root(result: &MatchResult) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"chaindex:match_result:v1:");
    update_section(&mut hasher, b"orders", result.orders());
    update_section(&mut hasher, b"cancellations", result.cancellations());
    update_section(&mut hasher, b"settlements", result.settlements());

    let digest = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&digest);
    root
}

#[must_use]
pub fn verify_result_root(result: &MatchResult, expected_root: &[u8; 32]) -> bool {
    compute_result_root(result) == *expected_root
}

/// Hex rendering used in logs and receipts.
#[must_use]
pub fn root_hex(root: &[u8; 32]) -> String {
    hex::encode(root)
}

#[cfg(test)]
mod tests {
    use chaindex_types::{Cancellation, ContractAddress, Order, Pair, SettlementEntry};

    use super::*;

    fn result(order_ids: &[u64], cancel_ids: &[u64]) -> MatchResult {
        let contract = ContractAddress::new("dex1contract");
        let pair = Pair::new("USDC", "ATOM");
        MatchResult::new(
            order_ids.iter().map(|&id| Order::dummy(id, &contract, &pair)).collect(),
            cancel_ids
                .iter()
                .map(|&id| Cancellation::dummy(id, &contract, &pair))
                .collect(),
            vec![SettlementEntry::dummy("acct", 1, &pair)],
        )
    }

    #[test]
    fn empty_result_deterministic() {
        let empty = MatchResult::default();
        assert_eq!(compute_result_root(&empty), compute_result_root(&empty));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        assert_eq!(
            compute_result_root(&result(&[1, 2, 3], &[7])),
            compute_result_root(&result(&[3, 1, 2], &[7]))
        );
    }

    #[test]
    fn content_changes_root() {
        assert_ne!(
            compute_result_root(&result(&[1, 2], &[7])),
            compute_result_root(&result(&[1, 2], &[8]))
        );
    }

    #[test]
    fn sections_do_not_alias() {
        // same id moved from orders to cancellations
        assert_ne!(
            compute_result_root(&result(&[5], &[])),
            compute_result_root(&result(&[], &[5]))
        );
    }

    #[test]
    fn verify_and_hex() {
        let r = result(&[1], &[2]);
        let root = compute_result_root(&r);
        assert!(verify_result_root(&r, &root));
        assert!(!verify_result_root(&r, &[0u8; 32]));
        assert_eq!(root_hex(&root).len(), 64);
    }
}
