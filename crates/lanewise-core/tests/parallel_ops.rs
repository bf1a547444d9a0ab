//! End-to-end checks of the parallel kernels against their sequential
//! counterparts, across device shapes and the input sizes that sit on
//! decomposition boundaries.

use lanewise_core::{reference, Device, DeviceConfig, Plus};

fn device(group_size: usize, lane_budget: usize, collective_ops: bool) -> Device {
    Device::new(DeviceConfig {
        group_size,
        lane_budget,
        collective_ops,
    })
    .unwrap()
}

/// Device shapes used throughout: a cramped one that forces multi-pass
/// windows and a roomier one that leaves groups idle on small inputs.
fn shapes() -> Vec<Device> {
    vec![
        device(4, 8, true),
        device(4, 8, false),
        device(8, 64, true),
    ]
}

/// Sizes on either side of one full wave of lanes, plus a many-wave size.
fn boundary_sizes(dev: &Device) -> Vec<usize> {
    let wave = dev.config().lane_budget;
    vec![0, 1, wave - 1, wave, wave + 1, 10 * wave + 3]
}

fn sample(n: usize) -> Vec<u64> {
    (0..n as u64).map(|x| x.wrapping_mul(2654435761) % 1000).collect()
}

#[test]
fn reduce_matches_fold_on_boundary_sizes() {
    for dev in shapes() {
        for n in boundary_sizes(&dev) {
            let input = sample(n);
            let got = lanewise_core::reduce(&dev, &input, Plus).unwrap();
            assert_eq!(got, reference::fold(&input, &Plus), "n={n}");
        }
    }
}

#[test]
fn inclusive_scan_matches_reference_on_boundary_sizes() {
    for dev in shapes() {
        for n in boundary_sizes(&dev) {
            let input = sample(n);
            let mut output = vec![0u64; n];
            lanewise_core::inclusive_scan(&dev, &input, &mut output, Plus, None).unwrap();
            assert_eq!(output, reference::inclusive_scan(&input, None, &Plus), "n={n}");
        }
    }
}

#[test]
fn exclusive_scan_matches_reference_on_boundary_sizes() {
    for dev in shapes() {
        for n in boundary_sizes(&dev) {
            let input = sample(n);
            let mut output = vec![0u64; n];
            lanewise_core::exclusive_scan(&dev, &input, &mut output, 11, Plus).unwrap();
            assert_eq!(output, reference::exclusive_scan(&input, 11, &Plus), "n={n}");
        }
    }
}

#[test]
fn scan_flavors_are_shifted_copies() {
    let dev = device(4, 8, true);
    let input = sample(53);
    let mut incl = vec![0u64; 53];
    let mut excl = vec![0u64; 53];
    lanewise_core::inclusive_scan(&dev, &input, &mut incl, Plus, Some(5)).unwrap();
    lanewise_core::exclusive_scan(&dev, &input, &mut excl, 5, Plus).unwrap();
    assert_eq!(excl[0], 5);
    assert_eq!(&excl[1..], &incl[..52]);
}

#[test]
fn non_commutative_scan_preserves_sequence_order() {
    type Perm = [u8; 4];
    fn compose(a: Perm, b: Perm) -> Perm {
        [
            a[b[0] as usize],
            a[b[1] as usize],
            a[b[2] as usize],
            a[b[3] as usize],
        ]
    }
    let perms: Vec<Perm> = (0..131u64)
        .map(|i| {
            let rot = (i % 4) as u8;
            let mut p: Perm = [0u8, 1, 2, 3].map(|x| (x + rot) % 4);
            if i % 5 < 2 {
                p.swap(1, 2);
            }
            p
        })
        .collect();

    for dev in shapes() {
        let mut output = vec![[0u8; 4]; perms.len()];
        lanewise_core::inclusive_scan(&dev, &perms, &mut output, compose, None).unwrap();
        assert_eq!(output, reference::inclusive_scan(&perms, None, &compose));

        let got = lanewise_core::reduce(&dev, &perms, compose).unwrap();
        assert_eq!(got, reference::fold(&perms, &compose));
    }
}

#[test]
fn float_scan_stays_within_reassociation_tolerance() {
    let dev = device(4, 8, true);
    // Mixed magnitudes make reassociation visible without being
    // catastrophic.
    let input: Vec<f64> = (0..203)
        .map(|i| {
            let x = f64::from(i);
            (x * 0.37).sin() * 10f64.powi(i % 5 - 2)
        })
        .collect();
    let mut output = vec![0f64; input.len()];
    lanewise_core::inclusive_scan(&dev, &input, &mut output, Plus, None).unwrap();
    let expected = reference::inclusive_scan(&input, None, &Plus);
    for (idx, (&got, &want)) in output.iter().zip(expected.iter()).enumerate() {
        let tolerance = 1e-9 * (1.0 + want.abs());
        assert!(
            (got - want).abs() <= tolerance,
            "prefix {idx}: {got} vs {want}"
        );
    }
}

#[test]
fn compaction_feeds_reduction() {
    let dev = device(4, 16, true);
    let input: Vec<u64> = (0..157).collect();
    let mut kept = vec![0u64; input.len()];
    let k = lanewise_core::copy_if(&dev, &input, &mut kept, |x| x % 3 == 0).unwrap();
    let total = lanewise_core::reduce(&dev, &kept[..k], Plus).unwrap().unwrap();
    let expected: u64 = input.iter().filter(|&&x| x % 3 == 0).sum();
    assert_eq!(total, expected);
}

#[test]
fn compacting_a_compacted_result_changes_nothing() {
    let dev = device(4, 8, true);
    let input = sample(91);
    let mut once = vec![0u64; input.len()];
    let k = lanewise_core::copy_if(&dev, &input, &mut once, |x| x % 7 != 0).unwrap();
    let mut twice = vec![0u64; k];
    let k2 = lanewise_core::copy_if(&dev, &once[..k], &mut twice, |_| true).unwrap();
    assert_eq!(k2, k);
    assert_eq!(twice, &once[..k]);
}

#[test]
fn partition_boundary_sizes_stay_stable() {
    for dev in shapes() {
        for n in boundary_sizes(&dev) {
            let input: Vec<(u64, usize)> = sample(n).into_iter().zip(0..).collect();
            let mut output = vec![(0u64, 0usize); n];
            let k =
                lanewise_core::partition(&dev, &input, &mut output, |(v, _)| v % 2 == 0).unwrap();
            let (expected, expected_k) =
                reference::stable_partition(&input, |&(v, _)| v % 2 == 0);
            assert_eq!(k, expected_k, "n={n}");
            assert_eq!(output, expected, "n={n}");
        }
    }
}

#[test]
fn set_operations_agree_with_merge_walks() {
    let less = |x: u64, y: u64| x < y;
    for dev in shapes() {
        for (na, nb) in [(0, 0), (1, 0), (0, 1), (9, 6), (64, 64), (173, 41)] {
            let mut a: Vec<u64> = (0..na as u64).map(|x| (x * 31) % 17).collect();
            let mut b: Vec<u64> = (0..nb as u64).map(|x| (x * 11) % 17).collect();
            a.sort_unstable();
            b.sort_unstable();

            let mut output = vec![0u64; a.len()];
            let k = lanewise_core::set_difference(&dev, &a, &b, &mut output, less).unwrap();
            assert_eq!(
                &output[..k],
                reference::set_difference(&a, &b, &less).as_slice(),
                "difference na={na} nb={nb}"
            );

            let k = lanewise_core::set_intersection(&dev, &a, &b, &mut output, less).unwrap();
            assert_eq!(
                &output[..k],
                reference::set_intersection(&a, &b, &less).as_slice(),
                "intersection na={na} nb={nb}"
            );

            assert_eq!(
                lanewise_core::includes(&dev, &a, &b, less).unwrap(),
                reference::multiset_includes(&a, &b, &less),
                "includes na={na} nb={nb}"
            );
        }
    }
}

#[test]
fn shared_example_vectors() {
    let a = [0u64, 0, 1, 1, 2, 6, 6, 9, 9];
    let b = [0u64, 1, 1, 6, 6, 9];
    let less = |x: u64, y: u64| x < y;
    for dev in shapes() {
        assert!(lanewise_core::includes(&dev, &a, &b, less).unwrap());
        assert!(!lanewise_core::includes(&dev, &b, &a, less).unwrap());

        let mut output = vec![0u64; a.len()];
        let k = lanewise_core::set_difference(&dev, &a, &b, &mut output, less).unwrap();
        assert_eq!(&output[..k], &[0, 2, 9]);

        let k = lanewise_core::set_intersection(&dev, &a, &b, &mut output, less).unwrap();
        assert_eq!(&output[..k], &b);
    }
}

#[test]
fn searches_on_boundary_sizes() {
    for dev in shapes() {
        for n in boundary_sizes(&dev) {
            let input: Vec<u64> = (0..n as u64).collect();
            let target = n.saturating_sub(1) as u64;
            let expected = if n == 0 { None } else { Some(n - 1) };
            assert_eq!(lanewise_core::find(&dev, &input, target).unwrap(), expected, "n={n}");
            assert_eq!(
                lanewise_core::any_of(&dev, &input, |x| x == target).unwrap(),
                n != 0,
                "n={n}"
            );
        }
    }
}

#[test]
fn device_is_reusable_across_dispatches() {
    let dev = device(4, 16, true);
    let input: Vec<u64> = (1..=40).collect();
    let first = lanewise_core::reduce(&dev, &input, Plus).unwrap();
    let mut doubled = input.clone();
    lanewise_core::for_each(&dev, &mut doubled, |x| x * 2).unwrap();
    let second = lanewise_core::reduce(&dev, &doubled, Plus).unwrap();
    assert_eq!(first, Some(820));
    assert_eq!(second, Some(1640));
}
