//! Volume and shape-transition stress tests.
//!
//! These drive the trie through every growth path — linear promotion up to
//! the maximal shape, decomposition into radix pairs, span chains and span
//! splits — and through large seeded random insert/delete sweeps with full
//! order verification.

#![expect(clippy::unwrap_used, reason = "fail fast in tests")]

mod common;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use wordtrie::WordTrie;

/// Iterate the whole map and compare keys and values against the oracle.
fn verify_strings(trie: &mut WordTrie, oracle: &BTreeMap<Vec<u8>, u64>, context: &str) {
    let mut buf = [0u8; 64];
    let mut cur = trie.first();
    let mut seen = 0usize;
    for (key, &value) in oracle {
        let cell = cur.unwrap_or_else(|| panic!("{context}: ran out at {key:?}"));
        let n = trie.key_bytes(&mut buf);
        assert_eq!(&buf[..n], &key[..], "{context}: key order diverged");
        assert_eq!(trie.get(cell), value, "{context}: value mismatch at {key:?}");
        seen += 1;
        cur = trie.next();
    }
    assert!(cur.is_none(), "{context}: trailing keys after {seen}");
}

fn verify_words(trie: &mut WordTrie, oracle: &BTreeMap<(u64, u64), u64>, context: &str) {
    let mut key = [0u64; 2];
    let mut cur = trie.first();
    for (&(a, b), &value) in oracle {
        let cell = cur.unwrap_or_else(|| panic!("{context}: ran out at ({a}, {b})"));
        assert_eq!(trie.key_words(&mut key), 2, "{context}");
        assert_eq!(key, [a, b], "{context}: key order diverged");
        assert_eq!(trie.get(cell), value, "{context}: value mismatch");
        cur = trie.next();
    }
    assert!(cur.is_none(), "{context}: trailing keys");
}

#[test]
fn growth_chain_through_every_linear_shape() {
    common::init_tracing();
    // distinct first bytes at the root: the node promotes through every
    // linear size, and the 33rd entry forces the radix decomposition
    let mut trie = WordTrie::for_strings(8);
    let mut oracle = BTreeMap::new();
    for b in 1..=200u8 {
        trie.insert(&[b], u64::from(b)).unwrap();
        oracle.insert(vec![b], u64::from(b));
        if b % 16 == 0 {
            verify_strings(&mut trie, &oracle, "growth chain");
        }
    }
    verify_strings(&mut trie, &oracle, "growth chain final");
}

#[test]
fn span_chains_split_on_divergence() {
    common::init_tracing();
    // 40-byte shared prefix: multiple span nodes per key, decomposed into
    // linear chains wherever later keys diverge
    let prefix = "the_quick_brown_fox_jumps_over_lazy_dogs";
    let mut trie = WordTrie::for_strings(64);
    let mut oracle = BTreeMap::new();
    for i in 0..120u32 {
        let key = format!("{prefix}_{i:03}").into_bytes();
        trie.insert(&key, u64::from(i) + 1).unwrap();
        oracle.insert(key, u64::from(i) + 1);
    }
    verify_strings(&mut trie, &oracle, "span divergence");

    // deep divergence inside the shared region too
    let mutated = format!("{}X_tail_that_differs", &prefix[..20]).into_bytes();
    trie.insert(&mutated, 9999).unwrap();
    oracle.insert(mutated, 9999);
    verify_strings(&mut trie, &oracle, "span mid-divergence");
}

#[test]
fn random_strings_insert_delete_sweep() {
    common::init_tracing();
    let mut rng = StdRng::seed_from_u64(0x5EED_0001);
    let mut trie = WordTrie::for_strings(24);
    let mut oracle: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

    for round in 0..3000usize {
        let len = rng.random_range(0..=20);
        let key: Vec<u8> = (0..len).map(|_| rng.random_range(1..=255u8)).collect();
        let value = rng.random::<u64>() | 1;
        trie.insert(&key, value).unwrap();
        oracle.insert(key, value);
        if round % 500 == 499 {
            verify_strings(&mut trie, &oracle, "random insert sweep");
        }
    }

    let mut victims: Vec<Vec<u8>> = oracle.keys().cloned().collect();
    victims.shuffle(&mut rng);
    for (i, victim) in victims.iter().enumerate() {
        trie.slot(victim).unwrap();
        trie.remove();
        oracle.remove(victim);
        assert!(
            trie.slot(victim).map_or(true, |c| trie.get(c) == 0),
            "deleted key still present: {victim:?}"
        );
        if i % 250 == 249 {
            verify_strings(&mut trie, &oracle, "random delete sweep");
        }
    }
    assert!(trie.first().is_none());
}

#[test]
fn ten_thousand_random_word_pairs() {
    common::init_tracing();
    let mut rng = StdRng::seed_from_u64(0x5EED_0002);
    let mut trie = WordTrie::for_words(2);
    let mut oracle: BTreeMap<(u64, u64), u64> = BTreeMap::new();

    while oracle.len() < 10_000 {
        let key = (rng.random::<u64>() >> 40, rng.random::<u64>() >> 40);
        let value = rng.random::<u64>() | 1;
        trie.insert_words(&[key.0, key.1], value);
        oracle.insert(key, value);
    }
    verify_words(&mut trie, &oracle, "10k inserted");

    let mut victims: Vec<(u64, u64)> = oracle.keys().copied().collect();
    victims.shuffle(&mut rng);
    for (i, &(a, b)) in victims.iter().enumerate() {
        trie.slot_words(&[a, b]).unwrap();
        trie.remove();
        oracle.remove(&(a, b));
        assert!(
            trie.slot_words(&[a, b]).map_or(true, |c| trie.get(c) == 0),
            "deleted tuple still present: ({a}, {b})"
        );
        if i % 500 == 499 {
            verify_words(&mut trie, &oracle, "10k delete sweep");
        }
    }
    assert!(trie.first().is_none());
    verify_words(&mut trie, &oracle, "10k emptied");
}

#[test]
fn clustered_word_keys_share_prefixes() {
    common::init_tracing();
    // low-entropy words: long shared big-endian prefixes exercise deep
    // single-entry chains and radix pairs near the leaves
    let mut rng = StdRng::seed_from_u64(0x5EED_0003);
    let mut trie = WordTrie::for_words(2);
    let mut oracle: BTreeMap<(u64, u64), u64> = BTreeMap::new();

    for _ in 0..4000 {
        let key = (rng.random_range(0..4u64), rng.random_range(0..2000u64));
        let value = rng.random::<u64>() | 1;
        trie.insert_words(&[key.0, key.1], value);
        oracle.insert(key, value);
    }
    verify_words(&mut trie, &oracle, "clustered words");

    // start_words across the whole domain agrees with the oracle
    for _ in 0..2000 {
        let probe = (rng.random_range(0..5u64), rng.random_range(0..2100u64));
        let got = trie.start_words(&[probe.0, probe.1]).map(|c| trie.get(c));
        let want = oracle.range(probe..).next().map(|(_, &v)| v);
        assert_eq!(got, want, "start mismatch at {probe:?}");
    }
}

#[test]
fn interleaved_insert_delete_keeps_cursor_sane() {
    common::init_tracing();
    let mut rng = StdRng::seed_from_u64(0x5EED_0004);
    let mut trie = WordTrie::for_strings(16);
    let mut oracle: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

    for round in 0..6000usize {
        let len = rng.random_range(1..=10);
        let key: Vec<u8> = (0..len).map(|_| rng.random_range(b'a'..=b'p')).collect();
        if rng.random_bool(0.6) || oracle.is_empty() {
            let value = rng.random::<u64>() | 1;
            trie.insert(&key, value).unwrap();
            oracle.insert(key, value);
        } else if let Some((existing, _)) = oracle.range(key.clone()..).next() {
            let victim = existing.clone();
            trie.slot(&victim).unwrap();
            trie.remove();
            oracle.remove(&victim);
        }
        if round % 1000 == 999 {
            verify_strings(&mut trie, &oracle, "interleaved sweep");
        }
    }
    verify_strings(&mut trie, &oracle, "interleaved final");
}
