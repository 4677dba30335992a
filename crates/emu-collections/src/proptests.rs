use crate::{CollectionError, PagedList};
use proptest::prelude::*;
use proptest::test_runner::TestCaseResult;

#[derive(Debug, Clone)]
enum Op {
    Push(u16),
    /// Positions past `len` exercise the error path.
    Insert { at: usize, value: u16 },
    RemoveAt { at: usize },
    Remove(u16),
    Set { at: usize, value: u16 },
    Clear,
}

const MAX_OPS: usize = 256;

fn page_size_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(1usize), Just(2usize), Just(3usize), Just(16usize), Just(37usize)]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    // Small value range so `Remove` regularly finds something.
    let value = 0u16..64;
    prop_oneof![
        6 => value.clone().prop_map(Op::Push),
        4 => (0usize..300, value.clone()).prop_map(|(at, value)| Op::Insert { at, value }),
        3 => (0usize..300).prop_map(|at| Op::RemoveAt { at }),
        1 => value.clone().prop_map(Op::Remove),
        2 => (0usize..300, value).prop_map(|(at, value)| Op::Set { at, value }),
        1 => Just(Op::Clear),
    ]
}

fn run_ops(mut list: PagedList<u16>, ops: &[Op]) -> TestCaseResult {
    let mut model: Vec<u16> = Vec::new();

    for op in ops {
        match op {
            Op::Push(value) => {
                list.push(*value);
                model.push(*value);
            }
            Op::Insert { at, value } => {
                let result = list.insert(*at, *value);
                if *at <= model.len() {
                    prop_assert!(result.is_ok());
                    model.insert(*at, *value);
                } else {
                    prop_assert_eq!(
                        result,
                        Err(CollectionError::IndexOutOfRange {
                            index: *at,
                            len: model.len()
                        })
                    );
                }
            }
            Op::RemoveAt { at } => {
                let result = list.remove_at(*at);
                if *at < model.len() {
                    prop_assert_eq!(result, Ok(model.remove(*at)));
                } else {
                    prop_assert!(result.is_err());
                }
            }
            Op::Remove(value) => {
                let found = list.remove(value);
                let expected = model.iter().position(|v| v == value);
                prop_assert_eq!(found, expected.is_some());
                if let Some(index) = expected {
                    model.remove(index);
                }
            }
            Op::Set { at, value } => {
                let result = list.set(*at, *value);
                if *at < model.len() {
                    let old = core::mem::replace(&mut model[*at], *value);
                    prop_assert_eq!(result, Ok(old));
                } else {
                    prop_assert!(result.is_err());
                }
            }
            Op::Clear => {
                list.clear();
                model.clear();
            }
        }

        prop_assert_eq!(list.len(), model.len());
        prop_assert!(list.len() <= list.capacity());
    }

    prop_assert_eq!(list.iter().copied().collect::<Vec<_>>(), model.clone());
    for (index, value) in model.iter().enumerate() {
        prop_assert_eq!(list.get(index), Some(value));
        prop_assert_eq!(list.index_of(value), model.iter().position(|v| v == value));
    }

    let mut copied = vec![u16::MAX; model.len() + 2];
    list.copy_to(&mut copied, 1).unwrap();
    prop_assert_eq!(&copied[1..=model.len()], model.as_slice());

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_paged_list_matches_vec(
        page_size in page_size_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..=MAX_OPS),
    ) {
        let list = PagedList::with_page_size(page_size).unwrap();
        run_ops(list, &ops)?;
    }
}
