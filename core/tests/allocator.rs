//! Identifier allocation tests.

use visitor_core::{
    allocator::{next_id, IdAllocator},
    store::{VisitorRow, VisitorTable},
};

fn table_with_ids(ids: &[&str]) -> VisitorTable {
    VisitorTable {
        rows: ids
            .iter()
            .map(|id| VisitorRow { record_id: id.to_string(), ..Default::default() })
            .collect(),
    }
}

#[test]
fn empty_table_starts_at_one() {
    assert_eq!(next_id(&VisitorTable::new()), 1);
}

#[test]
fn next_id_is_max_plus_one_regardless_of_order() {
    assert_eq!(next_id(&table_with_ids(&["1", "3", "4"])), 5);
    assert_eq!(next_id(&table_with_ids(&["4", "1", "3"])), 5);
    assert_eq!(next_id(&table_with_ids(&["3", "4", "1"])), 5);
}

/// Rows without a usable id are ignored; if none has one, start at 1.
#[test]
fn absent_or_malformed_ids_are_ignored() {
    assert_eq!(next_id(&table_with_ids(&["", " ", "n/a"])), 1);
    assert_eq!(next_id(&table_with_ids(&["2", "", "x", "9.0"])), 10);
}

#[test]
fn allocator_hands_out_consecutive_ids() {
    let mut ids = IdAllocator::for_table(&table_with_ids(&["10", "12"]));
    assert_eq!(ids.peek(), 13);
    assert_eq!(ids.take(), 13);
    assert_eq!(ids.take(), 14);
    assert_eq!(ids.peek(), 15);
}
