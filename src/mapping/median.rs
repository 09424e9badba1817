//! Rolling median filter
//!
//! Denoises one integer channel (a rangefinder, typically) by returning the
//! median of the most recent samples.

/// Fixed-depth rolling median over integer samples
///
/// The history always holds exactly `depth` values, newest first, and starts
/// out as all zeros. For even depths the median is the mean of the two middle
/// values truncated toward zero.
#[derive(Debug, Clone)]
pub struct MedianFilter {
    history: Vec<i64>,
    scratch: Vec<i64>,
}

impl MedianFilter {
    /// Create a filter of the given depth (at least 1)
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            history: vec![0; depth],
            scratch: vec![0; depth],
        }
    }

    /// Push a raw sample and return the filtered value
    pub fn push(&mut self, raw: i64) -> i64 {
        let depth = self.history.len();
        self.history.copy_within(0..depth - 1, 1);
        self.history[0] = raw;
        self.median()
    }

    fn median(&mut self) -> i64 {
        self.scratch.copy_from_slice(&self.history);
        self.scratch.sort_unstable();

        let depth = self.scratch.len();
        let mid = depth / 2;
        if depth % 2 == 1 {
            self.scratch[mid]
        } else {
            let sum = self.scratch[mid - 1] as i128 + self.scratch[mid] as i128;
            (sum / 2) as i64
        }
    }

    /// Stored samples, newest first
    pub fn history(&self) -> &[i64] {
        &self.history
    }

    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// Forget all samples
    pub fn reset(&mut self) {
        self.history.iter_mut().for_each(|v| *v = 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_is_fixed() {
        let mut filter = MedianFilter::new(5);
        for i in 0..20 {
            filter.push(i);
            assert_eq!(filter.history().len(), 5);
        }
        assert_eq!(filter.history(), &[19, 18, 17, 16, 15]);
    }

    #[test]
    fn test_starts_from_zeros() {
        let mut filter = MedianFilter::new(3);
        assert_eq!(filter.push(100), 0);
        assert_eq!(filter.push(100), 100);
    }

    #[test]
    fn test_rejects_spikes() {
        let mut filter = MedianFilter::new(3);
        filter.push(500);
        filter.push(510);
        assert_eq!(filter.push(9000), 510);
        assert_eq!(filter.push(505), 510);
        assert_eq!(filter.push(507), 507);
    }

    #[test]
    fn test_even_depth_truncates_mean() {
        let mut filter = MedianFilter::new(2);
        filter.push(2);
        assert_eq!(filter.push(3), 2);

        let mut filter = MedianFilter::new(2);
        filter.push(-2);
        assert_eq!(filter.push(-3), -2);
    }

    #[test]
    fn test_only_recent_samples_matter() {
        let mut a = MedianFilter::new(3);
        let mut b = MedianFilter::new(3);
        for v in [9000, -40, 7, 1, 2, 3] {
            a.push(v);
        }
        for v in [5, 5, 5, 5, 3, 1, 2, 3] {
            b.push(v);
        }
        assert_eq!(a.push(10), b.push(10));
    }

    #[test]
    fn test_depth_one_passes_through() {
        let mut filter = MedianFilter::new(1);
        assert_eq!(filter.push(42), 42);
        assert_eq!(filter.push(-7), -7);
    }

    #[test]
    fn test_zero_depth_becomes_one() {
        let filter = MedianFilter::new(0);
        assert_eq!(filter.depth(), 1);
    }

    #[test]
    fn test_reset() {
        let mut filter = MedianFilter::new(3);
        filter.push(10);
        filter.push(10);
        filter.reset();
        assert_eq!(filter.history(), &[0, 0, 0]);
        assert_eq!(filter.push(10), 0);
    }
}
