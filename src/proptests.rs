use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::fmt::Debug;

#[derive(Clone, Copy, Debug, Arbitrary)]
enum Action {
    #[proptest(weight = 5)]
    Insert,
    #[proptest(weight = 3)]
    Delete,
    #[proptest(weight = 2)]
    Search,
}

/// How many keys a structure takes before reporting `TableFull`.
#[derive(Clone, Copy, Debug)]
enum Room {
    Unbounded,
    /// Full exactly at this many keys.
    Exactly(usize),
    /// Probe cycles may report full earlier.
    AtMost(usize),
}

fn two_digit_key() -> impl Strategy<Value = String> + Clone {
    (0u32..100).prop_map(|k| format!("{k:02}"))
}

fn letter_key() -> impl Strategy<Value = String> + Clone {
    (prop::char::range('a', 'z'), any::<bool>()).prop_map(|(c, upper)| {
        if upper {
            c.to_ascii_uppercase().to_string()
        } else {
            c.to_string()
        }
    })
}

/// Fixed-length keys over a small alphanumeric alphabet, so both collisions
/// and repeats are common.
fn alnum_key(len: usize) -> impl Strategy<Value = String> + Clone {
    prop::collection::vec(prop::sample::select(vec!['A', 'B', 'Q', 'z', '0', '7']), len)
        .prop_map(|chars| chars.into_iter().collect::<String>())
}

fn op_strategy(
    key: impl Strategy<Value = String> + Clone,
) -> impl Strategy<Value = Vec<(Action, String)>> {
    prop::collection::vec((any::<Action>(), key), 0..=300)
}

fn same(key: &str) -> String {
    key.to_owned()
}

fn upper(key: &str) -> String {
    key.to_ascii_uppercase()
}

/// Replays `ops` against `t` and a `BTreeSet` model, checking every result.
fn run<T>(
    mut t: T,
    ops: Vec<(Action, String)>,
    stored_as: fn(&str) -> String,
    room: Room,
) -> Result<T, TestCaseError>
where
    T: KeyIndex,
    T::Location: PartialEq + Debug,
{
    let mut model: BTreeSet<String> = BTreeSet::new();

    for (action, key) in ops {
        let stored = stored_as(&key);
        match action {
            Action::Insert => {
                let result = t.insert(&key);
                if model.contains(&stored) {
                    prop_assert_eq!(result, Err(CoreError::DuplicateKey(stored.clone())));
                } else {
                    match (result, room) {
                        (Ok(()), Room::Exactly(cap) | Room::AtMost(cap)) => {
                            prop_assert!(model.len() < cap);
                            model.insert(stored);
                        }
                        (Ok(()), Room::Unbounded) => {
                            model.insert(stored);
                        }
                        (Err(CoreError::TableFull { capacity }), Room::Exactly(cap)) => {
                            prop_assert_eq!(capacity, cap);
                            prop_assert_eq!(model.len(), cap);
                        }
                        (Err(CoreError::TableFull { .. }), Room::AtMost(cap)) => {
                            prop_assert!(model.len() <= cap);
                        }
                        (other, _) => {
                            prop_assert!(false, "unexpected insert result {:?}", other);
                        }
                    }
                }
            }
            Action::Delete => {
                let result = t.delete(&key);
                if model.remove(&stored) {
                    prop_assert_eq!(result, Ok(()));
                    prop_assert!(t.search(&key).unwrap_err().is_not_found());
                } else {
                    prop_assert_eq!(result, Err(CoreError::NotFound(stored)));
                }
            }
            Action::Search => {
                let found = t.search(&key);
                prop_assert_eq!(found.is_ok(), model.contains(&stored));
                match found {
                    Ok(location) => {
                        prop_assert_eq!(t.search(&key), Ok(location));
                    }
                    Err(err) => {
                        prop_assert!(err.is_not_found());
                    }
                }
            }
        }

        prop_assert_eq!(t.len(), model.len());
    }

    let got: BTreeSet<String> = t.active_keys().into_iter().collect();
    prop_assert_eq!(got.len(), t.len(), "active keys must be distinct");
    prop_assert_eq!(got, model);
    Ok(t)
}

fn validate_open(t: &OpenAddressingTable) {
    for key in t.active_keys() {
        let position = t.search(&key).expect("stored key must be reachable");
        assert_eq!(t.slots()[position - 1].key(), Some(key.as_str()));
    }
    let stats = t.stats();
    assert_eq!(stats.len, t.len());
    assert!(stats.len + stats.tombstones <= t.capacity());
}

fn validate_chained(t: &ChainedTable) {
    for slot in t.snapshot() {
        assert!(
            slot.base.is_some() || slot.chain.is_empty(),
            "chain under empty base slot {}",
            slot.position
        );
    }
}

fn validate_nested(t: &NestedArrayTable) {
    let arrays = t.snapshot();
    assert!(!arrays.is_empty(), "primary array must exist");
    for column in 0..t.capacity() {
        let occupied: Vec<bool> = arrays.iter().map(|a| a[column].is_some()).collect();
        let depth = occupied.iter().take_while(|&&o| o).count();
        assert!(
            occupied[depth..].iter().all(|&o| !o),
            "gap in column {}",
            column + 1
        );
    }
    if arrays.len() > 1 {
        let last = &arrays[arrays.len() - 1];
        assert!(last.iter().any(Option::is_some), "trailing empty array");
    }
    assert_eq!(t.stats().overflow_arrays, arrays.len() - 1);
}

fn trie_from(keys: &[String]) -> SplitTrie {
    let mut t = SplitTrie::new();
    for key in keys {
        t.insert(key).unwrap();
    }
    t
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_open_linear(ops in op_strategy(two_digit_key())) {
        let t = OpenAddressingTable::new(13, 2, HashStrategy::Mod, ProbePolicy::Linear).unwrap();
        let t = run(t, ops, same, Room::Exactly(13))?;
        validate_open(&t);
    }

    #[test]
    fn prop_open_double_hash(ops in op_strategy(two_digit_key())) {
        // A prime size makes every step coprime to n.
        let t = OpenAddressingTable::new(13, 2, HashStrategy::Mod, ProbePolicy::DoubleHash).unwrap();
        let t = run(t, ops, same, Room::Exactly(13))?;
        validate_open(&t);
    }

    #[test]
    fn prop_open_rehash(ops in op_strategy(two_digit_key())) {
        // Rehash walks in steps of 2, which covers an odd-sized table.
        let t = OpenAddressingTable::new(13, 2, HashStrategy::Mod, ProbePolicy::Rehash).unwrap();
        let t = run(t, ops, same, Room::Exactly(13))?;
        validate_open(&t);
    }

    #[test]
    fn prop_open_quadratic_square(ops in op_strategy(two_digit_key())) {
        let t = OpenAddressingTable::new(12, 2, HashStrategy::Square, ProbePolicy::Quadratic).unwrap();
        let t = run(t, ops, same, Room::AtMost(12))?;
        validate_open(&t);
    }

    #[test]
    fn prop_open_truncation(ops in op_strategy(two_digit_key())) {
        let t = OpenAddressingTable::new(11, 2, HashStrategy::truncation(vec![2, 1]), ProbePolicy::Linear)
            .unwrap();
        let t = run(t, ops, same, Room::Exactly(11))?;
        validate_open(&t);
    }

    #[test]
    fn prop_chained(ops in op_strategy(two_digit_key())) {
        let config = ChainedConfig {
            capacity: 7,
            hash: HashStrategy::folding(FoldCombine::Product),
            ..ChainedConfig::default()
        };
        let t = run(ChainedTable::with_config(config).unwrap(), ops, same, Room::Unbounded)?;
        validate_chained(&t);
    }

    #[test]
    fn prop_nested(ops in op_strategy(two_digit_key())) {
        let t = run(NestedArrayTable::new(5, 2).unwrap(), ops, same, Room::Unbounded)?;
        validate_nested(&t);
    }

    #[test]
    fn prop_open_weighted_double_hash(ops in op_strategy(alnum_key(3))) {
        let config = OpenConfig {
            capacity: 13,
            key_len: 3,
            probe: ProbePolicy::DoubleHash,
            encoding: KeyEncoding::Weighted,
            ..OpenConfig::default()
        };
        let t = run(OpenAddressingTable::with_config(config).unwrap(), ops, same, Room::Exactly(13))?;
        validate_open(&t);
    }

    #[test]
    fn prop_open_long_alnum(ops in op_strategy(alnum_key(7))) {
        let t = OpenAddressingTable::new(13, 7, HashStrategy::Square, ProbePolicy::Linear).unwrap();
        let t = run(t, ops, same, Room::Exactly(13))?;
        validate_open(&t);
    }

    #[test]
    fn prop_chained_code_sum(ops in op_strategy(alnum_key(3))) {
        let config = ChainedConfig {
            capacity: 7,
            key_len: 3,
            encoding: KeyEncoding::CodeSum,
            ..ChainedConfig::default()
        };
        let t = run(ChainedTable::with_config(config).unwrap(), ops, same, Room::Unbounded)?;
        validate_chained(&t);
    }

    #[test]
    fn prop_nested_centered_fold(ops in op_strategy(alnum_key(3))) {
        let config = NestedConfig {
            capacity: 5,
            key_len: 3,
            hash: HashStrategy::Folding {
                group: 2,
                combine: FoldCombine::Sum,
                tail: FoldTail::Centered,
                source: DigitSource::Numeric,
            },
            encoding: KeyEncoding::Weighted,
        };
        let t = run(NestedArrayTable::with_config(config).unwrap(), ops, same, Room::Unbounded)?;
        validate_nested(&t);
    }

    #[test]
    fn prop_binary_alnum(ops in op_strategy(alnum_key(4))) {
        let t = run(BinaryArray::new(20, 4).unwrap(), ops, same, Room::Exactly(20))?;
        prop_assert!(t.active_keys().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn prop_sequential(sorted in any::<bool>(), ops in op_strategy(two_digit_key())) {
        let t = SequentialArray::new(20, 2, sorted).unwrap();
        let t = run(t, ops, same, Room::Exactly(20))?;
        if sorted {
            let keys = t.active_keys();
            prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn prop_binary(ops in op_strategy(two_digit_key())) {
        let t = run(BinaryArray::new(20, 2).unwrap(), ops, same, Room::Exactly(20))?;
        for (rank, key) in t.active_keys().iter().enumerate() {
            prop_assert_eq!(t.search(key), Ok(rank));
        }
    }

    #[test]
    fn prop_digital(ops in op_strategy(letter_key())) {
        run(DigitalTree::new(), ops, upper, Room::Unbounded)?;
    }

    #[test]
    fn prop_trie(ops in op_strategy(letter_key())) {
        let t = run(SplitTrie::new(), ops, upper, Room::Unbounded)?;
        // Splitting leaves a shape that does not depend on history.
        let mut sorted = t.keys();
        sorted.sort();
        prop_assert_eq!(t.snapshot(), trie_from(&sorted).snapshot());
        prop_assert_eq!(t.collected_keys(), sorted);
    }

    #[test]
    fn prop_multiway(m in 1u32..=5, ops in op_strategy(letter_key())) {
        let t = run(MultiwayTree::new(m).unwrap(), ops, upper, Room::Unbounded)?;
        let levels = t.levels();
        for node in t.snapshot().nodes {
            if node.key.is_some() {
                prop_assert_eq!(node.depth, levels);
            }
        }
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_trie_insert_order() {
    let keys: Vec<String> = ["A", "B", "C", "P", "Q", "Z"].map(String::from).to_vec();
    let expected = trie_from(&keys).snapshot();

    for_each_permutation(&keys, |perm| {
        let t = trie_from(&perm);
        assert_eq!(t.snapshot(), expected, "{perm:?}");
        assert_eq!(t.keys(), perm);
    });
}

fn multiway_from(order: &[&str]) -> MultiwayTree {
    let mut t = MultiwayTree::new(2).unwrap();
    for key in order {
        t.insert(key).unwrap();
    }
    t
}

#[test]
fn exhaustive_multiway_insert_order() {
    let keys: Vec<&str> = vec!["a", "b", "c", "p", "q", "z"];
    let expected = multiway_from(&keys).snapshot();

    for_each_permutation(&keys, |perm| {
        assert_eq!(multiway_from(&perm).snapshot(), expected);
    });
}

#[test]
fn exhaustive_nested_remove_order() {
    // Four keys stacked on position 1, one on position 2.
    let keys: Vec<&str> = vec!["10", "15", "20", "25", "11"];
    let mut base = NestedArrayTable::new(5, 2).unwrap();
    for key in &keys {
        base.insert(key).unwrap();
    }
    assert_eq!(base.array_count(), 4);

    for_each_permutation(&keys, |perm| {
        let mut t = base.clone();
        for key in perm {
            t.delete(key).unwrap();
            validate_nested(&t);
            assert!(t.search(key).unwrap_err().is_not_found());
        }
        assert!(t.is_empty());
        assert_eq!(t.array_count(), 1);
    });
}

#[test]
fn exhaustive_open_remove_order() {
    // 10, 17, 24 and 31 share position 4; 11 is pushed past them.
    let keys: Vec<&str> = vec!["10", "17", "24", "11", "31"];
    let mut base = OpenAddressingTable::new(7, 2, HashStrategy::Mod, ProbePolicy::Linear).unwrap();
    for key in &keys {
        base.insert(key).unwrap();
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base.clone();
        for (i, key) in perm.iter().enumerate() {
            t.delete(key).unwrap();
            // Every key not yet deleted stays reachable across the tombstones.
            for rest in &perm[i + 1..] {
                assert!(t.contains(rest), "{rest} lost after deleting {key}");
            }
            validate_open(&t);
        }
        assert!(t.is_empty());
    });
}

#[test]
fn randomized_chained_against_model() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut t = ChainedTable::new(7, 3).unwrap();
    let mut model = BTreeSet::new();

    for _ in 0..5_000 {
        let key = format!("{:03}", rng.gen_range(0u32..200));
        if rng.gen_bool(0.6) {
            assert_eq!(t.insert(&key).is_ok(), model.insert(key.clone()));
        } else {
            assert_eq!(t.delete(&key).is_ok(), model.remove(&key));
        }
        assert_eq!(t.len(), model.len());
    }

    validate_chained(&t);
    let got: BTreeSet<String> = t.active_keys().into_iter().collect();
    assert_eq!(got, model);
}

#[test]
fn randomized_binary_matches_sequential_sorted() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut binary = BinaryArray::new(64, 4).unwrap();
    let mut sequential = SequentialArray::new(64, 4, true).unwrap();

    for _ in 0..2_000 {
        let key = format!("{:04}", rng.gen_range(0u32..150));
        let (a, b) = if rng.gen_bool(0.55) {
            (binary.insert(&key), sequential.insert(&key))
        } else {
            (binary.delete(&key), sequential.delete(&key))
        };
        assert_eq!(a, b, "{key}");
        assert_eq!(binary.active_keys(), sequential.active_keys());
    }
}

#[test]
fn nested_views_serialize() {
    let mut t = NestedArrayTable::new(3, 2).unwrap();
    t.insert("12").unwrap();
    t.insert("15").unwrap();
    let json = serde_json::to_value(t.snapshot()).unwrap();
    assert_eq!(json, serde_json::json!([["12", null, null], ["15", null, null]]));

    let location = t.search("15").unwrap();
    let json = serde_json::to_string(&location).unwrap();
    assert_eq!(json, r#"{"array":1,"position":1}"#);
}

#[test]
fn tree_view_serializes() {
    let mut t = SplitTrie::new();
    t.insert("b").unwrap();
    let json = serde_json::to_value(t.snapshot()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "nodes": [
                {"depth": 0, "path": "", "key": null},
                {"depth": 1, "path": "0", "key": "B"}
            ]
        })
    );
}
