//! Index Tests
//!
//! Tests for the ordered key index contract: insertion, probe search,
//! deletion with successor substitution, predicate deletion, traversal.

use std::cmp::Ordering;

use netkv::index::Bst;

/// A keyed value whose ordering ignores the payload, like cache entries
#[derive(Debug, Clone)]
struct Item {
    key: String,
    payload: i64,
}

impl Item {
    fn new(key: &str, payload: i64) -> Self {
        Item {
            key: key.to_string(),
            payload,
        }
    }

    fn probe(key: &str) -> Self {
        Item::new(key, 0)
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Item {}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Item {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

fn tree_of(keys: &[&str]) -> Bst<Item> {
    let mut tree = Bst::new();
    for (i, key) in keys.iter().enumerate() {
        tree.insert(Item::new(key, i as i64));
    }
    tree
}

fn keys_in_order(tree: &Bst<Item>) -> Vec<String> {
    let mut keys = Vec::new();
    tree.traverse(|item| keys.push(item.key.clone()));
    keys
}

// =============================================================================
// Insert / Search Tests
// =============================================================================

#[test]
fn test_insert_reports_new_keys() {
    let mut tree = Bst::new();
    assert!(tree.insert(Item::new("banana", 1)));
    assert!(tree.insert(Item::new("apple", 2)));
    assert!(tree.insert(Item::new("cherry", 3)));
    assert_eq!(tree.len(), 3);
}

#[test]
fn test_insert_collision_refreshes_payload() {
    let mut tree = tree_of(&["banana", "apple", "cherry"]);

    // Same key again: not inserted, but the node now holds the new payload.
    assert!(!tree.insert(Item::new("apple", 99)));
    assert_eq!(tree.len(), 3);

    let found = tree.search(&Item::probe("apple")).unwrap();
    assert_eq!(found.payload, 99);
}

#[test]
fn test_search_present_and_absent() {
    let tree = tree_of(&["banana", "apple", "cherry"]);

    assert!(tree.search(&Item::probe("banana")).is_some());
    assert!(tree.search(&Item::probe("durian")).is_none());
    assert!(Bst::<Item>::new().search(&Item::probe("banana")).is_none());
}

// =============================================================================
// Traversal Tests
// =============================================================================

#[test]
fn test_traverse_in_order() {
    let tree = tree_of(&["cherry", "apple", "durian", "banana"]);
    assert_eq!(keys_in_order(&tree), vec!["apple", "banana", "cherry", "durian"]);
}

#[test]
fn test_traverse_empty() {
    let tree: Bst<Item> = Bst::new();
    assert!(keys_in_order(&tree).is_empty());
    assert!(tree.is_empty());
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_leaf() {
    let mut tree = tree_of(&["banana", "apple", "cherry"]);
    assert!(tree.delete(&Item::probe("apple")));
    assert_eq!(keys_in_order(&tree), vec!["banana", "cherry"]);
    assert_eq!(tree.len(), 2);
}

#[test]
fn test_delete_interior_node_with_two_children() {
    let mut tree = tree_of(&["dd", "bb", "ff", "aa", "cc", "ee", "gg"]);
    assert!(tree.delete(&Item::probe("bb")));
    assert_eq!(keys_in_order(&tree), vec!["aa", "cc", "dd", "ee", "ff", "gg"]);
}

#[test]
fn test_delete_root() {
    let mut tree = tree_of(&["dd", "bb", "ff"]);
    assert!(tree.delete(&Item::probe("dd")));
    assert_eq!(keys_in_order(&tree), vec!["bb", "ff"]);
}

#[test]
fn test_delete_is_idempotent() {
    let mut tree = tree_of(&["banana", "apple"]);
    assert!(tree.delete(&Item::probe("apple")));
    assert!(!tree.delete(&Item::probe("apple")));
    assert_eq!(tree.len(), 1);
}

// =============================================================================
// Predicate Delete Tests
// =============================================================================

#[test]
fn test_delete_if_counts_every_match() {
    let mut tree = tree_of(&["dd", "bb", "ff", "aa", "cc", "ee", "gg"]);

    let removed = tree.delete_if(&mut |item: &mut Item| item.key < "dd".to_string());
    assert_eq!(removed, 3);
    assert_eq!(keys_in_order(&tree), vec!["dd", "ee", "ff", "gg"]);
    assert_eq!(tree.len(), 4);
}

#[test]
fn test_delete_if_predicate_mutates_entries() {
    let mut tree = tree_of(&["aa", "bb", "cc"]);

    // Decrement-then-test, the shape of the eviction sweep.
    let removed = tree.delete_if(&mut |item: &mut Item| {
        item.payload -= 1;
        item.payload < 0
    });
    assert_eq!(removed, 1); // only "aa" started at 0
    assert_eq!(keys_in_order(&tree), vec!["bb", "cc"]);

    // Survivors keep the mutation.
    let found = tree.search(&Item::probe("bb")).unwrap();
    assert_eq!(found.payload, 0);
}

#[test]
fn test_delete_if_removes_everything() {
    let mut tree = tree_of(&["dd", "bb", "ff", "aa"]);
    let removed = tree.delete_if(&mut |_: &mut Item| true);
    assert_eq!(removed, 4);
    assert!(tree.is_empty());
}

#[test]
fn test_delete_if_no_matches() {
    let mut tree = tree_of(&["aa", "bb"]);
    let removed = tree.delete_if(&mut |_: &mut Item| false);
    assert_eq!(removed, 0);
    assert_eq!(tree.len(), 2);
}

// =============================================================================
// Scale Test
// =============================================================================

#[test]
fn test_many_entries_stay_ordered() {
    let mut tree = Bst::new();
    for i in (0..500).rev() {
        tree.insert(Item::new(&format!("key{:04}", i), i));
    }
    assert_eq!(tree.len(), 500);

    let keys = keys_in_order(&tree);
    for pair in keys.windows(2) {
        assert!(pair[0] < pair[1]);
    }
}
