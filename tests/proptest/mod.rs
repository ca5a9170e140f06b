// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Property-based tests for booking-migrator.
//!
//! Uses proptest to generate random inputs and verify invariants.

use proptest::prelude::*;

use booking_migrator::client::{KeyValueStore, MemoryStore};
use booking_migrator::slots::{
    MAX_SLOT, SlotOwner, SlotRange, SlotTable, TOTAL_SLOTS, calculate_distribution, key_slot,
    key_slot_bytes,
};

/// Strategy for generating primary counts (1-20).
fn primary_count() -> impl Strategy<Value = usize> {
    1..=20usize
}

/// Strategy for generating valid slot ranges.
fn slot_range() -> impl Strategy<Value = SlotRange> {
    (0..=MAX_SLOT, 0..=MAX_SLOT).prop_map(|(a, b)| SlotRange::new(a.min(b), a.max(b)))
}

fn even_table(primaries: usize) -> SlotTable {
    SlotTable::even(
        (0..primaries)
            .map(|i| SlotOwner::primary(format!("10.0.0.{}:6379", i)))
            .collect(),
    )
    .unwrap()
}

proptest! {
    /// Every key hashes into the slot space, and the same key always hashes
    /// to the same slot.
    #[test]
    fn key_slot_is_in_range_and_stable(key in ".*") {
        let slot = key_slot(&key);
        prop_assert!(slot < TOTAL_SLOTS);
        prop_assert_eq!(slot, key_slot(&key.clone()));
        prop_assert_eq!(slot, key_slot_bytes(key.as_bytes()));
    }

    /// Arbitrary bytes hash into the slot space too.
    #[test]
    fn key_slot_bytes_in_range(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        prop_assert!(key_slot_bytes(&bytes) < TOTAL_SLOTS);
    }

    /// The distribution is contiguous, starts at 0 and ends at the last slot.
    #[test]
    fn distribution_partitions_slot_space(primaries in primary_count()) {
        let ranges = calculate_distribution(primaries as u16);
        prop_assert_eq!(ranges.len(), primaries);
        prop_assert_eq!(ranges[0].start, 0);
        prop_assert_eq!(ranges[ranges.len() - 1].end, MAX_SLOT);
        for pair in ranges.windows(2) {
            prop_assert_eq!(pair[0].end + 1, pair[1].start);
        }
    }

    /// Every slot resolves to exactly one owner in an even table.
    #[test]
    fn every_slot_has_one_owner(primaries in primary_count(), slot in 0..=MAX_SLOT) {
        let table = even_table(primaries);
        prop_assert!(table.covers_all_slots());

        let owner = table.resolve(slot);
        prop_assert!(owner.is_some());
        let holders = table.iter().filter(|e| e.range.contains(slot)).count();
        prop_assert_eq!(holders, 1);
    }

    /// Display output parses back to the same range.
    #[test]
    fn slot_range_display_parses_back(range in slot_range()) {
        let parsed: SlotRange = range.to_string().parse().unwrap();
        prop_assert_eq!(parsed, range);
    }

    /// List pushes keep their order in the in-memory store.
    #[test]
    fn memory_list_keeps_push_order(values in prop::collection::vec("[0-9]{1,4}", 0..20)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let stored = rt.block_on(async {
            let store = MemoryStore::new();
            for value in &values {
                store.rpush("user:1:bookings", value).await.unwrap();
            }
            store.lrange_all("user:1:bookings").await.unwrap()
        });
        prop_assert_eq!(stored, values);
    }
}
