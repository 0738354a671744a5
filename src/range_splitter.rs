//! Split a list into ranges of bounded size.
//!
//! Large shared-entity collections are published in several deliveries so
//! that no single record exceeds the transport size limit; the chunking is
//! driven by the ranges computed here.

/// A contiguous range over a logical list, represented by its lower and upper
/// bound indexes. Indexes are 1-based and both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    lower: usize,
    upper: usize,
}

impl Range {
    /// 1-based inclusive lower bound
    pub fn lower(&self) -> usize {
        self.lower
    }

    /// 1-based inclusive upper bound
    pub fn upper(&self) -> usize {
        self.upper
    }

    /// Projects this range onto a slice
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.lower - 1..self.upper]
    }
}

/// Partitions `nb_items` items into contiguous ranges of at most `range_size`
/// items each.
///
/// Emits `nb_items / range_size` full ranges followed, when the division has
/// a remainder, by one shorter range covering it. The ranges are
/// non-overlapping and their union is exactly `1..=nb_items`; for
/// `nb_items == 0` the result is empty.
pub fn split(nb_items: usize, range_size: usize) -> Vec<Range> {
    assert!(range_size >= 1, "range size must be strictly positive");

    let nb_full_ranges = nb_items / range_size;
    let mut ranges = Vec::with_capacity(nb_full_ranges + 1);

    for i in 0..nb_full_ranges {
        ranges.push(Range {
            lower: i * range_size + 1,
            upper: (i + 1) * range_size,
        });
    }
    if nb_items % range_size > 0 {
        ranges.push(Range {
            lower: nb_full_ranges * range_size + 1,
            upper: nb_items,
        });
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE_SIZE: usize = 200;

    #[test]
    fn test_less_than_one_full_range() {
        let ranges = split(100, RANGE_SIZE);
        assert_eq!(1, ranges.len());
        assert_eq!(1, ranges[0].lower());
        assert_eq!(100, ranges[0].upper());
    }

    #[test]
    fn test_more_than_one_range() {
        let ranges = split(250, RANGE_SIZE);
        assert_eq!(2, ranges.len());
        assert_eq!(1, ranges[0].lower());
        assert_eq!(200, ranges[0].upper());
        assert_eq!(201, ranges[1].lower());
        assert_eq!(250, ranges[1].upper());
    }

    #[test]
    fn test_no_partial_range() {
        let ranges = split(400, RANGE_SIZE);
        assert_eq!(2, ranges.len());
        assert_eq!(1, ranges[0].lower());
        assert_eq!(400, ranges[1].upper());
        assert_eq!(200, ranges[0].upper());
        assert_eq!(201, ranges[1].lower());
    }

    #[test]
    fn test_empty_list() {
        assert!(split(0, RANGE_SIZE).is_empty());
    }

    #[test]
    fn test_partition_is_total() {
        for nb_items in 0..=1000 {
            for range_size in [1, 7, 200, 1000, 1500] {
                let ranges = split(nb_items, range_size);
                let nb_full = ranges
                    .iter()
                    .filter(|r| r.upper() - r.lower() + 1 == range_size)
                    .count();
                assert_eq!(nb_items / range_size, nb_full);

                let mut covered = 0;
                let mut previous_upper = 0;
                for range in &ranges {
                    assert_eq!(previous_upper + 1, range.lower());
                    assert!(range.upper() >= range.lower());
                    covered += range.upper() - range.lower() + 1;
                    previous_upper = range.upper();
                }
                assert_eq!(nb_items, covered);
            }
        }
    }

    #[test]
    fn test_slice() {
        let items: Vec<u32> = (0..10).collect();
        let ranges = split(items.len(), 4);
        assert_eq!(&[0, 1, 2, 3], ranges[0].slice(&items));
        assert_eq!(&[4, 5, 6, 7], ranges[1].slice(&items));
        assert_eq!(&[8, 9], ranges[2].slice(&items));
    }
}
