//! Static row partitioning.
//!
//! Maps global row indices to worker ranks as contiguous half-open ranges.
//! The mapping is a pure function of `(n, workers, rank)`: every rank and the
//! coordinator evaluate it independently and must agree, so it performs no
//! communication.

use std::ops::Range;

/// The contiguous block of global rows owned by one rank.
///
/// Ranges over all ranks tile `[0, n)` exactly; sizes differ by at most one
/// row, with the earliest ranks taking the extra rows. Ranks past the row
/// count own an empty range but still participate in every collective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPartition {
    /// First owned global row.
    pub start: usize,
    /// One past the last owned global row.
    pub end: usize,
}

impl RowPartition {
    /// Compute the range owned by `rank` out of `workers` for an n-row system.
    pub fn new(n: usize, workers: usize, rank: usize) -> Self {
        debug_assert!(workers > 0 && rank < workers);
        let base = n / workers;
        let extra = n % workers;
        let start = rank * base + rank.min(extra);
        let len = base + usize::from(rank < extra);
        RowPartition {
            start,
            end: start + len,
        }
    }

    /// The rank owning a given global row.
    pub fn owner(n: usize, workers: usize, row: usize) -> usize {
        debug_assert!(workers > 0 && row < n);
        let base = n / workers;
        let extra = n % workers;
        // The first `extra` ranks own base + 1 rows each.
        let boundary = extra * (base + 1);
        if row < boundary {
            row / (base + 1)
        } else {
            extra + (row - boundary) / base
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, row: usize) -> bool {
        row >= self.start && row < self.end
    }

    /// Owned global rows as an iterable range.
    pub fn rows(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_tiles_exactly() {
        for n in [0, 1, 3, 7, 10, 100, 101] {
            for workers in 1..=12 {
                let parts: Vec<RowPartition> =
                    (0..workers).map(|r| RowPartition::new(n, workers, r)).collect();

                // Contiguous, non-overlapping, covering [0, n).
                assert_eq!(parts[0].start, 0);
                assert_eq!(parts[workers - 1].end, n);
                for w in parts.windows(2) {
                    assert_eq!(w[0].end, w[1].start);
                }

                let total: usize = parts.iter().map(|p| p.len()).sum();
                assert_eq!(total, n);

                // Sizes differ by at most one, earliest ranks first.
                let sizes: Vec<usize> = parts.iter().map(|p| p.len()).collect();
                let max = *sizes.iter().max().unwrap();
                let min = *sizes.iter().min().unwrap();
                assert!(max - min <= 1);
                assert!(sizes.windows(2).all(|w| w[0] >= w[1]));
            }
        }
    }

    #[test]
    fn test_more_workers_than_rows() {
        let parts: Vec<RowPartition> = (0..8).map(|r| RowPartition::new(3, 8, r)).collect();
        assert_eq!(parts[0].rows(), 0..1);
        assert_eq!(parts[2].rows(), 2..3);
        assert!(parts[3..].iter().all(|p| p.is_empty()));
    }

    #[test]
    fn test_owner_agrees_with_ranges() {
        for n in [1, 5, 17, 64] {
            for workers in 1..=9 {
                for row in 0..n {
                    let owner = RowPartition::owner(n, workers, row);
                    assert!(RowPartition::new(n, workers, owner).contains(row));
                }
            }
        }
    }
}
