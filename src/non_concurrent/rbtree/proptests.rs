use std::collections::BTreeMap;

use proptest::prelude::*;

use super::{Insertion, RawTree};
use crate::pool::NodePool;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u32),
    Delete(u16),
    Find(u16),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    // a narrow key range so deletes and duplicates actually hit
    let keys = 0u16..96;
    prop_oneof![
        3 => (keys.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => keys.clone().prop_map(Op::Delete),
        1 => keys.prop_map(Op::Find),
    ]
}

fn by_key(key: &u16, entry: &(u16, u32)) -> std::cmp::Ordering {
    key.cmp(&entry.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]
    #[test]
    fn random_ops_match_btreemap(ops in prop::collection::vec(op_strategy(), 1..400)) {
        let mut tree = RawTree::default();
        let mut model = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let expected_new = !model.contains_key(&k);
                    let stored = *model.entry(k).or_insert(v);
                    let insertion = tree.insert_with(&by_key, &k, || (k, v)).unwrap();
                    prop_assert_eq!(matches!(insertion, Insertion::Created(_)), expected_new);
                    let id = tree.search(&by_key, &k).unwrap();
                    prop_assert_eq!(*tree.payload(id), (k, stored));
                }
                Op::Delete(k) => {
                    let expected = model.remove(&k).map(|v| (k, v));
                    prop_assert_eq!(tree.remove(&by_key, &k), expected);
                }
                Op::Find(k) => {
                    let found = tree.search(&by_key, &k).map(|id| *tree.payload(id));
                    prop_assert_eq!(found, model.get(&k).map(|&v| (k, v)));
                }
            }

            prop_assert!(tree.verify().is_ok(), "{:?}", tree.verify());
            prop_assert_eq!(tree.len(), model.len());
        }

        let actual = tree.iter().copied().collect::<Vec<_>>();
        let expected = model.into_iter().collect::<Vec<_>>();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn bounded_pool_never_exceeds_capacity(
        capacity in 1usize..32,
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let mut tree = RawTree::new(NodePool::new(Some(capacity)));
        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let full = tree.len() == capacity;
                    match tree.insert_with(&by_key, &k, || (k, v)) {
                        Ok(_) => {}
                        Err(_) => prop_assert!(full),
                    }
                }
                Op::Delete(k) => {
                    tree.remove(&by_key, &k);
                }
                Op::Find(_) => {}
            }
            prop_assert!(tree.len() <= capacity);
            prop_assert!(tree.verify().is_ok());
        }
    }
}
