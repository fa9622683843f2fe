//! Observation order of the match-state store is independent of how
//! concurrent writers interleave.

use chaindex_matchcore::{MemState, compute_result_root};
use chaindex_types::{Cancellation, ContractAddress, Order, Origin, Pair, TxIndex};
use proptest::prelude::*;

fn contract() -> ContractAddress {
    ContractAddress::new("dex1contract")
}

fn pair() -> Pair {
    Pair::new("USDC", "ATOM")
}

/// `(tx, id)` writes in program order per tx.
fn writes(per_tx: &[u8]) -> Vec<(u32, u64)> {
    per_tx
        .iter()
        .enumerate()
        .flat_map(|(tx, &n)| {
            let tx = u32::try_from(tx).unwrap();
            (0..u64::from(n)).map(move |k| (tx, u64::from(tx) * 1_000 + k))
        })
        .collect()
}

/// Interleave per-tx streams according to `picks`, keeping each stream's
/// own order.
fn interleave(writes: &[(u32, u64)], picks: &[usize]) -> Vec<(u32, u64)> {
    let mut streams: Vec<Vec<(u32, u64)>> = Vec::new();
    for &(tx, id) in writes {
        let tx = tx as usize;
        if streams.len() <= tx {
            streams.resize_with(tx + 1, Vec::new);
        }
        streams[tx].push((tx as u32, id));
    }
    for s in &mut streams {
        s.reverse();
    }
    let mut out = Vec::with_capacity(writes.len());
    let mut pick = picks.iter().cycle();
    while out.len() < writes.len() {
        let live: Vec<usize> = (0..streams.len()).filter(|&i| !streams[i].is_empty()).collect();
        let choice = live[pick.next().copied().unwrap_or(0) % live.len()];
        if let Some(w) = streams[choice].pop() {
            out.push(w);
        }
    }
    out
}

fn fill(order: &[(u32, u64)]) -> MemState {
    let store = MemState::new();
    for &(tx, id) in order {
        let origin = Origin::Tx(TxIndex(tx));
        store.record_cancellation(origin, Cancellation::dummy(id, &contract(), &pair()));
        store.record_order(origin, Order::dummy(id, &contract(), &pair()));
    }
    store
}

proptest! {
    #[test]
    fn observation_order_ignores_interleaving(
        per_tx in prop::collection::vec(1u8..6, 1..8),
        picks in prop::collection::vec(0usize..64, 1..32),
    ) {
        let program = writes(&per_tx);
        let shuffled = interleave(&program, &picks);

        let a = fill(&program);
        let b = fill(&shuffled);

        let ids = |s: &MemState| -> Vec<u64> {
            s.cancellations(&contract(), &pair().key())
                .unwrap()
                .iter()
                .map(|c| c.id.0)
                .collect()
        };
        prop_assert_eq!(ids(&a), ids(&b));
        prop_assert_eq!(
            ids(&a),
            program.iter().map(|&(_, id)| id).collect::<Vec<_>>()
        );

        let ra = a.match_result(&contract(), &pair().key()).unwrap();
        let rb = b.match_result(&contract(), &pair().key()).unwrap();
        prop_assert_eq!(compute_result_root(&ra), compute_result_root(&rb));
    }

    #[test]
    fn discarding_a_tx_matches_never_running_it(
        per_tx in prop::collection::vec(1u8..5, 2..6),
        victim in 0usize..6,
    ) {
        let victim = u32::try_from(victim % per_tx.len()).unwrap();
        let program = writes(&per_tx);

        let with = fill(&program);
        with.discard_origin(Origin::Tx(TxIndex(victim)));

        let without: Vec<(u32, u64)> =
            program.iter().copied().filter(|&(tx, _)| tx != victim).collect();
        let clean = fill(&without);

        prop_assert_eq!(
            with.cancellations(&contract(), &pair().key()).unwrap(),
            clean.cancellations(&contract(), &pair().key()).unwrap()
        );
        prop_assert_eq!(with.bucket_keys(), clean.bucket_keys());
    }
}
