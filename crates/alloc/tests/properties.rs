use growvec_alloc::Vector;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Push(i32),
    Pop,
    Insert(usize, i32),
    Erase(usize),
    Resize(usize),
    Reserve(usize),
    Truncate(usize),
    SwapRemove(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i32>().prop_map(Op::Push),
        Just(Op::Pop),
        (any::<usize>(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
        any::<usize>().prop_map(Op::Erase),
        (0usize..48).prop_map(Op::Resize),
        (0usize..96).prop_map(Op::Reserve),
        (0usize..48).prop_map(Op::Truncate),
        any::<usize>().prop_map(Op::SwapRemove),
    ]
}

proptest! {
    #[test]
    fn with_len_is_exact_and_defaulted(n in 0usize..256) {
        let v = Vector::<u64>::with_len(n);
        prop_assert_eq!(v.len(), n);
        prop_assert_eq!(v.capacity(), n);
        prop_assert!(v.iter().all(|&x| x == 0));
    }

    #[test]
    fn push_grows_geometrically(values in proptest::collection::vec(any::<u8>(), 0..200)) {
        let mut v = Vector::new();
        let mut moved = 0;
        for &x in &values {
            let old = v.capacity();
            v.push(x);
            if v.capacity() != old {
                prop_assert_eq!(v.capacity(), (2 * old).max(1));
                moved += old;
            }
        }
        prop_assert_eq!(v.as_slice(), values.as_slice());
        if !values.is_empty() {
            prop_assert_eq!(v.capacity(), values.len().next_power_of_two());
        }
        // total relocation work stays linear in the number of pushes
        prop_assert!(moved <= 2 * values.len());
    }

    #[test]
    fn insert_then_erase_round_trips(
        values in proptest::collection::vec(any::<i32>(), 0..64),
        pos in any::<prop::sample::Index>(),
        x in any::<i32>(),
    ) {
        let mut v: Vector<i32> = values.iter().copied().collect();
        let pos = pos.index(values.len() + 1);
        prop_assert_eq!(*v.insert(pos, x), x);
        prop_assert_eq!(v[pos], x);
        prop_assert_eq!(v.erase(pos), pos);
        prop_assert_eq!(v.as_slice(), values.as_slice());
    }

    #[test]
    fn copies_do_not_alias(values in proptest::collection::vec(".{0,8}", 1..16)) {
        let original: Vector<String> = values.iter().cloned().collect();
        let mut copy = original.clone();
        copy[0].push('!');
        copy.push(String::new());
        prop_assert_eq!(original.as_slice(), values.as_slice());

        let mut target = Vector::new();
        target.clone_from(&copy);
        target[0].clear();
        prop_assert_eq!(&copy[0], &format!("{}!", values[0]));
    }

    #[test]
    fn move_keeps_addresses(values in proptest::collection::vec(any::<u16>(), 0..64)) {
        let mut source: Vector<u16> = values.iter().copied().collect();
        let addr = source.as_ptr();
        let dest = std::mem::take(&mut source);
        prop_assert_eq!(source.len(), 0);
        prop_assert_eq!(source.capacity(), 0);
        prop_assert_eq!(dest.as_ptr(), addr);
        prop_assert_eq!(dest.as_slice(), values.as_slice());
    }

    #[test]
    fn reserve_below_capacity_keeps_addresses(
        values in proptest::collection::vec(any::<u32>(), 1..64),
        n in 0usize..64,
    ) {
        let mut v: Vector<u32> = values.iter().copied().collect();
        let (addr, cap) = (v.as_ptr(), v.capacity());
        v.reserve(n.min(cap));
        prop_assert_eq!(v.as_ptr(), addr);
        prop_assert_eq!(v.capacity(), cap);
    }

    #[test]
    fn behaves_like_std_vec(ops in proptest::collection::vec(op(), 0..128)) {
        let mut model: Vec<i32> = Vec::new();
        let mut v = Vector::new();
        for op in ops {
            match op {
                Op::Push(x) => {
                    model.push(x);
                    v.push(x);
                }
                Op::Pop => {
                    prop_assert_eq!(v.pop(), model.pop());
                }
                Op::Insert(i, x) => {
                    let i = i % (model.len() + 1);
                    model.insert(i, x);
                    v.insert(i, x);
                }
                Op::Erase(i) if !model.is_empty() => {
                    let i = i % model.len();
                    model.remove(i);
                    prop_assert_eq!(v.erase(i), i);
                }
                Op::Erase(_) => {}
                Op::Resize(n) => {
                    model.resize(n, 0);
                    v.resize(n);
                }
                Op::Reserve(n) => {
                    let before = v.capacity();
                    v.reserve(n);
                    prop_assert_eq!(v.capacity(), before.max(n));
                }
                Op::Truncate(n) => {
                    model.truncate(n);
                    v.truncate(n);
                }
                Op::SwapRemove(i) if !model.is_empty() => {
                    let i = i % model.len();
                    prop_assert_eq!(v.swap_remove(i), model.swap_remove(i));
                }
                Op::SwapRemove(_) => {}
            }
            prop_assert_eq!(v.as_slice(), model.as_slice());
            prop_assert!(v.len() <= v.capacity());
        }
    }
}
