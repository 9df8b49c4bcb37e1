// Property tests for HashMap kept inside the crate so they can run the table's
// invariant validator after every operation.

use crate::{HashMap, TinyString};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::HashMap as StdHashMap;
use std::hash::{BuildHasher, BuildHasherDefault, Hasher};

// Pool-indexed operations: indices shrink to earlier keys and op lists shrink
// in length.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    TryInsert(usize, i32),
    GetOrDefault(usize),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Reserve(usize),
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    // up to 16 bytes so keys land on both sides of the inline limit
    proptest::collection::vec("[a-z]{0,16}", 1..=40).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::TryInsert(i, v)),
            2 => idx.clone().prop_map(Op::GetOrDefault),
            4 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Get),
            1 => "[a-z]{0,16}".prop_map(Op::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => (0usize..64).prop_map(Op::Reserve),
            1 => Just(Op::Clear),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
    })
}

/// Hashes every key onto a handful of values, so runs are long and keys with
/// equal fragments have to be told apart by `Eq`.
#[derive(Default)]
struct CollidingHasher(u64);

impl Hasher for CollidingHasher {
    fn finish(&self) -> u64 {
        (self.0 % 5) << 61
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_add(u64::from(b));
        }
    }
}

fn run_scenario<S>(pool: &[String], ops: Vec<Op>) -> Result<(), TestCaseError>
where
    S: BuildHasher + Default,
{
    let mut sut: HashMap<TinyString, i32, S> = HashMap::default();
    let mut model: StdHashMap<String, i32> = StdHashMap::new();

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = pool[i].as_str();
                prop_assert_eq!(sut.insert(k.into(), v), model.insert(k.to_owned(), v));
            }
            Op::TryInsert(i, v) => {
                let k = pool[i].as_str();
                let already = model.get(k).copied();
                let (stored, inserted) = sut.try_insert(k.into(), v);
                prop_assert_eq!(inserted, already.is_none());
                prop_assert_eq!(*stored, already.unwrap_or(v));
                model.entry(k.to_owned()).or_insert(v);
            }
            Op::GetOrDefault(i) => {
                let k = pool[i].as_str();
                let got = *sut.get_or_default(k);
                prop_assert_eq!(got, *model.entry(k.to_owned()).or_default());
            }
            Op::Remove(i) => {
                let k = pool[i].as_str();
                let before = sut.len();
                let removed = sut.remove_entry(k);
                let expected = model.remove(k);
                prop_assert_eq!(removed.as_ref().map(|(_, v)| *v), expected);
                if let Some((key, _)) = removed {
                    prop_assert_eq!(key.as_str(), k);
                    prop_assert_eq!(sut.len(), before - 1);
                } else {
                    prop_assert_eq!(sut.len(), before);
                }
            }
            Op::Get(i) => {
                let k = pool[i].as_str();
                prop_assert_eq!(sut.get(k), model.get(k));
            }
            Op::Contains(s) => {
                prop_assert_eq!(sut.contains_key(s.as_str()), model.contains_key(&s));
            }
            Op::Mutate(i, d) => {
                let k = pool[i].as_str();
                match (sut.get_mut(k), model.get_mut(k)) {
                    (Some(a), Some(b)) => {
                        *a = a.wrapping_add(d);
                        *b = b.wrapping_add(d);
                    }
                    (None, None) => {}
                    (a, b) => prop_assert!(false, "get_mut mismatch: {:?} vs {:?}", a, b),
                }
            }
            Op::Reserve(n) => {
                sut.reserve(n);
                prop_assert!(sut.len() + n <= sut.capacity() * 7 / 8);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
            Op::Iterate => {
                let mut seen: Vec<(String, i32)> =
                    sut.iter().map(|(k, v)| (k.to_string(), *v)).collect();
                let mut expected: Vec<(String, i32)> =
                    model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                seen.sort();
                expected.sort();
                prop_assert_eq!(seen, expected);
            }
        }

        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert!(sut.len() <= sut.capacity() * 7 / 8);
    }

    for (k, v) in &model {
        prop_assert_eq!(sut.get(k.as_str()), Some(v));
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// - insert/try_insert/get_or_default follow the overwrite and keep-first rules.
// - remove returns the stored pair exactly once and shrinks `len` by one.
// - iteration yields each live entry exactly once.
// - the robin hood ordering and displacement bookkeeping hold after every op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario::<crate::DefaultBuildHasher>(&pool, ops)?;
    }

    #[test]
    fn prop_state_machine_colliding((pool, ops) in arb_scenario()) {
        run_scenario::<BuildHasherDefault<CollidingHasher>>(&pool, ops)?;
    }

    // Property: growing preserves every entry and never rehashes through
    // user code (checked by the integer map staying equal to the model).
    #[test]
    fn prop_bulk_insert_then_remove(keys in proptest::collection::hash_set(any::<u32>(), 0..600)) {
        let mut sut = HashMap::with_hasher(crate::hasher::IntBuildHasher::default());
        for &k in &keys {
            prop_assert!(sut.insert(k, u64::from(k) * 10).is_none());
        }
        sut.assert_invariants();
        prop_assert_eq!(sut.len(), keys.len());
        for (i, &k) in keys.iter().enumerate() {
            if i % 2 == 0 {
                prop_assert_eq!(sut.remove(&k), Some(u64::from(k) * 10));
            }
        }
        sut.assert_invariants();
        for (i, &k) in keys.iter().enumerate() {
            prop_assert_eq!(sut.contains_key(&k), i % 2 == 1);
        }
    }
}
