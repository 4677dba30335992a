use crate::{MemoryError, PagedMemory, PagedMemoryOptions};
use proptest::prelude::*;
use proptest::test_runner::TestCaseResult;

#[derive(Debug, Clone)]
enum Op {
    Write { address: u32, data: Vec<u8> },
    Read { address: u32, len: usize },
    WriteScalar { address: u32, width: usize, value: u64 },
    ReadScalar { address: u32, width: usize },
    /// An access that straddles the end of memory; must fail and change nothing.
    WritePastEnd { back: u32, width: usize },
}

const MAX_SIZE: u32 = 64 * 1024;
const MAX_OPS: usize = 64;
const MAX_RW_LEN: usize = 8 * 1024;

fn page_size_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(1usize), Just(7usize), Just(64usize), Just(4096usize)]
}

fn width_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(1usize), Just(2usize), Just(4usize), Just(8usize)]
}

fn address_strategy(size: u32) -> BoxedStrategy<u32> {
    let any = 0u32..size;
    // 64-byte multiples are page boundaries for every page size above except 7.
    let near_boundary = (0u32..=size / 64, 0u32..8).prop_map(move |(page, delta)| {
        (page * 64).saturating_sub(delta).min(size - 1)
    });
    let near_end = (1u32..=16).prop_map(move |delta| size.saturating_sub(delta));

    prop_oneof![
        4 => any,
        3 => near_boundary,
        1 => near_end,
    ]
    .boxed()
}

fn op_strategy(size: u32) -> BoxedStrategy<Op> {
    let write = address_strategy(size)
        .prop_flat_map(move |address| {
            let max_len = ((size - address) as usize).min(MAX_RW_LEN);
            (Just(address), prop::collection::vec(any::<u8>(), 0..=max_len))
        })
        .prop_map(|(address, data)| Op::Write { address, data });
    let read = address_strategy(size)
        .prop_flat_map(move |address| {
            let max_len = ((size - address) as usize).min(MAX_RW_LEN);
            (Just(address), 0usize..=max_len)
        })
        .prop_map(|(address, len)| Op::Read { address, len });
    let write_scalar = (address_strategy(size), width_strategy(), any::<u64>())
        .prop_map(|(address, width, value)| Op::WriteScalar {
            address,
            width,
            value,
        });
    let read_scalar = (address_strategy(size), width_strategy())
        .prop_map(|(address, width)| Op::ReadScalar { address, width });
    let past_end =
        (0u32..8, width_strategy()).prop_map(|(back, width)| Op::WritePastEnd { back, width });

    prop_oneof![
        3 => write,
        3 => read,
        3 => write_scalar,
        3 => read_scalar,
        1 => past_end,
    ]
    .boxed()
}

fn scenario_strategy() -> BoxedStrategy<(u32, usize, Vec<Op>)> {
    (64u32..=MAX_SIZE, page_size_strategy())
        .prop_flat_map(|(size, page_size)| {
            (
                Just(size),
                Just(page_size),
                prop::collection::vec(op_strategy(size), 1..=MAX_OPS),
            )
        })
        .boxed()
}

fn fits(size: usize, address: usize, width: usize) -> bool {
    address + width <= size
}

fn write_scalar(
    mem: &mut PagedMemory,
    address: u64,
    width: usize,
    value: u64,
) -> crate::Result<()> {
    match width {
        1 => mem.write_u8(address, value as u8),
        2 => mem.write_u16(address, value as u16),
        4 => mem.write_u32(address, value as u32),
        _ => mem.write_u64(address, value),
    }
}

fn read_scalar(mem: &PagedMemory, address: u64, width: usize) -> crate::Result<u64> {
    match width {
        1 => mem.read_u8(address).map(u64::from),
        2 => mem.read_u16(address).map(u64::from),
        4 => mem.read_u32(address).map(u64::from),
        _ => mem.read_u64(address),
    }
}

fn model_scalar(model: &[u8], address: usize, width: usize) -> u64 {
    model[address..address + width]
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}

fn run_ops(mut mem: PagedMemory, mut model: Vec<u8>, ops: &[Op]) -> TestCaseResult {
    prop_assert_eq!(mem.size() as usize, model.len());
    let size = model.len();

    for op in ops {
        match op {
            Op::Write { address, data } => {
                let address = *address as usize;
                mem.write_from(address as u64, data).unwrap();
                model[address..address + data.len()].copy_from_slice(data);
            }
            Op::Read { address, len } => {
                let address = *address as usize;
                let mut buf = vec![0xA5u8; *len];
                mem.read_into(address as u64, &mut buf).unwrap();
                prop_assert_eq!(buf.as_slice(), &model[address..address + len]);
            }
            Op::WriteScalar {
                address,
                width,
                value,
            } => {
                let address = *address as usize;
                let result = write_scalar(&mut mem, address as u64, *width, *value);
                if fits(size, address, *width) {
                    prop_assert!(result.is_ok());
                    let bytes = value.to_be_bytes();
                    model[address..address + width].copy_from_slice(&bytes[8 - width..]);
                } else {
                    let is_out_of_range = matches!(result, Err(MemoryError::OutOfRange { .. }));
                    prop_assert!(is_out_of_range);
                }
            }
            Op::ReadScalar { address, width } => {
                let address = *address as usize;
                let result = read_scalar(&mem, address as u64, *width);
                if fits(size, address, *width) {
                    prop_assert_eq!(result.unwrap(), model_scalar(&model, address, *width));
                } else {
                    prop_assert!(result.is_err());
                }
            }
            Op::WritePastEnd { back, width } => {
                let address = size.saturating_sub(*back as usize);
                if !fits(size, address, *width) {
                    let result = write_scalar(&mut mem, address as u64, *width, u64::MAX);
                    prop_assert!(result.is_err());
                }
            }
        }
    }

    let mut all = vec![0u8; size];
    mem.read_into(0, &mut all).unwrap();
    prop_assert_eq!(all.as_slice(), model.as_slice());

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_paged_memory_matches_flat_reference((size, page_size, ops) in scenario_strategy()) {
        let mem = PagedMemory::with_options(size as u64, PagedMemoryOptions { page_size }).unwrap();
        let model = vec![0u8; size as usize];

        run_ops(mem, model, &ops)?;
    }

    #[test]
    fn prop_loaded_image_matches_source(data in prop::collection::vec(any::<u8>(), 0..20_000), page_size in page_size_strategy()) {
        let mem = PagedMemory::from_reader(data.as_slice(), PagedMemoryOptions { page_size }).unwrap();
        prop_assert_eq!(mem.size() as usize, data.len());
        prop_assert_eq!(mem.allocated_pages(), data.len().div_ceil(page_size));

        let mut all = vec![0u8; data.len()];
        mem.read_into(0, &mut all).unwrap();
        prop_assert_eq!(all, data);
    }
}
