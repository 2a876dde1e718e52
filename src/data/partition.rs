use rand::Rng;
use rand::seq::SliceRandom;

use super::model::RowCollection;
use crate::error::ConfigError;

/// Disjoint, exhaustive split of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Rows the synthetic view is derived from.
    pub original: RowCollection,
    /// Holdout rows used as the attack baseline.
    pub control: RowCollection,
}

/// Number of control rows for `n` rows: `ceil(fraction * n)`, capped at `n`.
pub fn control_size(n: usize, fraction: f64) -> usize {
    ((fraction * n as f64).ceil() as usize).min(n)
}

/// Split `collection` into original and control partitions.
///
/// Membership is the first `control_size` positions of a shuffle driven by
/// `rng`, so a seeded generator gives the same split for the same input.
/// Both partitions keep the source row order.
pub fn split<R: Rng + ?Sized>(
    collection: &RowCollection,
    fraction: f64,
    rng: &mut R,
) -> Result<Partition, ConfigError> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(ConfigError::InvalidFraction(fraction));
    }

    let n = collection.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut in_control = vec![false; n];
    for &idx in &order[..control_size(n, fraction)] {
        in_control[idx] = true;
    }

    let (control, original): (Vec<_>, Vec<_>) = collection
        .rows
        .iter()
        .cloned()
        .zip(in_control)
        .partition(|(_, c)| *c);

    let partition = Partition {
        original: collection.with_rows(original.into_iter().map(|(r, _)| r).collect()),
        control: collection.with_rows(control.into_iter().map(|(r, _)| r).collect()),
    };
    log::debug!(
        "partitioned {n} rows into {} original / {} control",
        partition.original.len(),
        partition.control.len()
    );
    Ok(partition)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::model::image_rows;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seeded_split(n: usize, fraction: f64, seed: u64) -> Partition {
        let mut rng = StdRng::seed_from_u64(seed);
        split(&image_rows(n), fraction, &mut rng).unwrap()
    }

    #[test]
    fn hundred_rows_split_seventy_thirty() {
        let p = seeded_split(100, 0.3, 42);
        assert_eq!(p.control.len(), 30);
        assert_eq!(p.original.len(), 70);
    }

    #[test]
    fn partitions_are_disjoint_and_exhaustive() {
        for n in [0, 1, 2, 7, 33, 100] {
            let p = seeded_split(n, 0.3, 7);
            let ori: BTreeSet<_> = p.original.ids().into_iter().collect();
            let ctl: BTreeSet<_> = p.control.ids().into_iter().collect();
            assert!(ori.is_disjoint(&ctl));
            let all: BTreeSet<_> = ori.union(&ctl).copied().collect();
            assert_eq!(all, (0..n).collect::<BTreeSet<_>>());
        }
    }

    #[test]
    fn same_seed_same_membership() {
        let a = seeded_split(100, 0.3, 42);
        let b = seeded_split(100, 0.3, 42);
        assert_eq!(a.control.ids(), b.control.ids());
        assert_eq!(a.original.ids(), b.original.ids());
    }

    #[test]
    fn different_seed_changes_membership() {
        let a = seeded_split(100, 0.3, 42);
        let b = seeded_split(100, 0.3, 43);
        assert_ne!(a.control.ids(), b.control.ids());
    }

    #[test]
    fn partitions_keep_source_order() {
        let p = seeded_split(50, 0.3, 1);
        let ids = p.original.ids();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        let ids = p.control.ids();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn empty_collection_gives_empty_partitions() {
        let p = seeded_split(0, 0.3, 42);
        assert!(p.original.is_empty());
        assert!(p.control.is_empty());
        assert_eq!(p.original.columns, image_rows(0).columns);
    }

    #[test]
    fn control_size_rounds_up() {
        assert_eq!(control_size(100, 0.3), 30);
        assert_eq!(control_size(10, 0.25), 3);
        assert_eq!(control_size(1, 0.3), 1);
        assert_eq!(control_size(0, 0.3), 0);
    }

    #[test]
    fn rejects_degenerate_fractions() {
        let rows = image_rows(10);
        let mut rng = StdRng::seed_from_u64(0);
        for f in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            assert!(matches!(
                split(&rows, f, &mut rng),
                Err(ConfigError::InvalidFraction(_))
            ));
        }
    }
}
