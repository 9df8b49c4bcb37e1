#[macro_use]
extern crate measure_time;

use std::env;

use flat_hashmap::hasher::IntBuildHasher;
use flat_hashmap::{HashMap, TinyString};

fn main() {
    let count: usize = env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1_000_000);
    let words = words(count);
    let ints: Vec<u64> = lcg(7).take(count).collect();

    for _ in 0..2 {
        test_flat_strings(&words);
        test_fnv_strings(&words);
        test_flat_ints(&ints);
        test_fnv_ints(&ints);
    }
}

// Deterministic pseudo-random stream, so runs are comparable.
fn lcg(seed: u64) -> impl Iterator<Item = u64> {
    let mut state = seed;
    std::iter::repeat_with(move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        state >> 16
    })
}

fn words(count: usize) -> Vec<String> {
    lcg(42)
        .take(count)
        .map(|n| format!("{:x}", n % (count as u64 * 2)))
        .collect()
}

fn test_flat_strings(words: &[String]) {
    let mut map: HashMap<TinyString, u32> = HashMap::new();
    {
        print_time!("flat_hashmap insert strings");
        for word in words {
            *map.get_or_default(word.as_str()) += 1;
        }
    }
    {
        print_time!("flat_hashmap lookup strings");
        let hits = words.iter().filter(|w| map.contains_key(w.as_str())).count();
        assert_eq!(hits, words.len());
    }
    {
        print_time!("flat_hashmap remove strings");
        for word in words.iter().step_by(2) {
            map.remove(word.as_str());
        }
    }
    println!("{} entries, {:?}", map.len(), map.probe_stats());
}

fn test_fnv_strings(words: &[String]) {
    let mut map: fnv::FnvHashMap<String, u32> = fnv::FnvHashMap::default();
    {
        print_time!("FnvHashMap insert strings");
        for word in words {
            *map.entry(word.to_owned()).or_default() += 1;
        }
    }
    {
        print_time!("FnvHashMap lookup strings");
        let hits = words.iter().filter(|w| map.contains_key(w.as_str())).count();
        assert_eq!(hits, words.len());
    }
    {
        print_time!("FnvHashMap remove strings");
        for word in words.iter().step_by(2) {
            map.remove(word.as_str());
        }
    }
    println!("{} entries", map.len());
}

fn test_flat_ints(ints: &[u64]) {
    let mut map = HashMap::with_hasher(IntBuildHasher::default());
    {
        print_time!("flat_hashmap insert ints");
        for &n in ints {
            map.insert(n, n);
        }
    }
    {
        print_time!("flat_hashmap lookup ints");
        let sum: u64 = ints.iter().filter_map(|n| map.get(n)).fold(0, |a, &b| a ^ b);
        println!("checksum {}", sum);
    }
    println!("{} entries, {:?}", map.len(), map.probe_stats());
}

fn test_fnv_ints(ints: &[u64]) {
    let mut map: fnv::FnvHashMap<u64, u64> = fnv::FnvHashMap::default();
    {
        print_time!("FnvHashMap insert ints");
        for &n in ints {
            map.insert(n, n);
        }
    }
    {
        print_time!("FnvHashMap lookup ints");
        let sum: u64 = ints.iter().filter_map(|n| map.get(n)).fold(0, |a, &b| a ^ b);
        println!("checksum {}", sum);
    }
    println!("{} entries", map.len());
}
