//! Property tests pitting the parallel kernels against their sequential
//! counterparts over random inputs and device shapes.

use lanewise_core::{reference, Device, DeviceConfig, Plus};
use proptest::prelude::*;

fn any_device() -> impl Strategy<Value = Device> {
    prop_oneof![
        Just((4usize, 8usize, true)),
        Just((4, 16, false)),
        Just((8, 32, true)),
    ]
    .prop_map(|(group_size, lane_budget, collective_ops)| {
        Device::new(DeviceConfig {
            group_size,
            lane_budget,
            collective_ops,
        })
        .unwrap()
    })
}

fn sorted_values(max_len: usize) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..20, 0..max_len).prop_map(|mut values| {
        values.sort_unstable();
        values
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reduce_matches_fold(dev in any_device(), input in prop::collection::vec(0u64..1000, 0..250)) {
        let got = lanewise_core::reduce(&dev, &input, Plus).unwrap();
        prop_assert_eq!(got, reference::fold(&input, &Plus));
    }

    #[test]
    fn inclusive_scan_matches_reference(
        dev in any_device(),
        input in prop::collection::vec(0u64..1000, 0..250),
        init in proptest::option::of(0u64..100),
    ) {
        let mut output = vec![0u64; input.len()];
        lanewise_core::inclusive_scan(&dev, &input, &mut output, Plus, init).unwrap();
        prop_assert_eq!(output, reference::inclusive_scan(&input, init, &Plus));
    }

    #[test]
    fn exclusive_scan_matches_reference(
        dev in any_device(),
        input in prop::collection::vec(0u64..1000, 0..250),
        init in 0u64..100,
    ) {
        let mut output = vec![0u64; input.len()];
        lanewise_core::exclusive_scan(&dev, &input, &mut output, init, Plus).unwrap();
        prop_assert_eq!(output, reference::exclusive_scan(&input, init, &Plus));
    }

    #[test]
    fn copy_if_matches_stable_filter(
        dev in any_device(),
        input in prop::collection::vec(0u64..50, 0..200),
        modulus in 1u64..5,
    ) {
        let mut output = vec![0u64; input.len()];
        let k = lanewise_core::copy_if(&dev, &input, &mut output, move |x| x % modulus == 0).unwrap();
        let expected = reference::stable_filter(&input, |&x| x % modulus == 0);
        prop_assert_eq!(k, expected.len());
        prop_assert_eq!(&output[..k], expected.as_slice());
    }

    #[test]
    fn partition_matches_stable_partition(
        dev in any_device(),
        values in prop::collection::vec(0u64..10, 0..200),
    ) {
        // Carry positions so a stability break changes the output.
        let input: Vec<(u64, usize)> = values.into_iter().zip(0..).collect();
        let mut output = vec![(0u64, 0usize); input.len()];
        let k = lanewise_core::partition(&dev, &input, &mut output, |(v, _)| v < 5).unwrap();
        let (expected, expected_k) = reference::stable_partition(&input, |&(v, _)| v < 5);
        prop_assert_eq!(k, expected_k);
        prop_assert_eq!(output, expected);
    }

    #[test]
    fn set_operations_match_merge_walks(
        dev in any_device(),
        a in sorted_values(150),
        b in sorted_values(150),
    ) {
        let less = |x: u64, y: u64| x < y;
        let mut output = vec![0u64; a.len()];

        let expected_diff = reference::set_difference(&a, &b, &less);
        let k = lanewise_core::set_difference(&dev, &a, &b, &mut output, less).unwrap();
        prop_assert_eq!(&output[..k], expected_diff.as_slice());

        let expected_inter = reference::set_intersection(&a, &b, &less);
        let k = lanewise_core::set_intersection(&dev, &a, &b, &mut output, less).unwrap();
        prop_assert_eq!(&output[..k], expected_inter.as_slice());

        prop_assert_eq!(
            lanewise_core::includes(&dev, &a, &b, less).unwrap(),
            reference::multiset_includes(&a, &b, &less)
        );
    }

    #[test]
    fn search_finds_first_window(
        dev in any_device(),
        haystack in prop::collection::vec(0u64..3, 0..120),
        needle in prop::collection::vec(0u64..3, 1..4),
    ) {
        let got = lanewise_core::search(&dev, &haystack, &needle, |x, y| x == y).unwrap();
        let expected = if needle.len() > haystack.len() {
            None
        } else {
            haystack.windows(needle.len()).position(|window| window == needle.as_slice())
        };
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn find_matches_position(
        dev in any_device(),
        input in prop::collection::vec(0u64..8, 0..200),
        target in 0u64..8,
    ) {
        let got = lanewise_core::find(&dev, &input, target).unwrap();
        prop_assert_eq!(got, input.iter().position(|&x| x == target));
    }

    #[test]
    fn reverse_twice_is_identity(
        dev in any_device(),
        input in prop::collection::vec(0u64..1000, 0..200),
    ) {
        let mut data = input.clone();
        lanewise_core::reverse(&dev, &mut data).unwrap();
        let reversed: Vec<u64> = input.iter().rev().copied().collect();
        prop_assert_eq!(&data, &reversed);
        lanewise_core::reverse(&dev, &mut data).unwrap();
        prop_assert_eq!(data, input);
    }

    #[test]
    fn rotate_copy_matches_manual_rotation(
        dev in any_device(),
        input in prop::collection::vec(0u64..1000, 1..150),
        pivot in 0usize..300,
    ) {
        let n = input.len();
        let mut output = vec![0u64; n];
        lanewise_core::rotate_copy(&dev, &input, pivot, &mut output).unwrap();
        let expected: Vec<u64> = (0..n).map(|i| input[(pivot + i) % n]).collect();
        prop_assert_eq!(output, expected);
    }

    #[test]
    fn scan_undoes_adjacent_difference(
        dev in any_device(),
        input in prop::collection::vec(0i64..1000, 0..200),
    ) {
        let mut deltas = vec![0i64; input.len()];
        lanewise_core::adjacent_difference(&dev, &input, &mut deltas, |cur, prev| cur - prev)
            .unwrap();
        let mut rebuilt = vec![0i64; input.len()];
        lanewise_core::inclusive_scan(&dev, &deltas, &mut rebuilt, |a: i64, b: i64| a + b, None)
            .unwrap();
        prop_assert_eq!(rebuilt, input);
    }
}
