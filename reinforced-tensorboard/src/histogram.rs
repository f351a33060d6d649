//! Summary statistics of a histogram summary.

/// Equal-width histogram of a set of values.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub num: f64,
    pub sum: f64,
    pub sum_squares: f64,

    /// Right edges of the buckets.
    pub bucket_limits: Vec<f64>,
    pub bucket_counts: Vec<f64>,
}

impl Histogram {
    /// Bins `xs` into `n_buckets` buckets spanning `[min, max]`.
    ///
    /// Identical values, or no value at all, give a single bucket.
    pub fn new(xs: &[f32], n_buckets: usize) -> Self {
        let xs = xs.iter().map(|&x| x as f64).collect::<Vec<_>>();
        let min = xs.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let num = xs.len() as f64;
        let sum = xs.iter().sum();
        let sum_squares = xs.iter().map(|x| x * x).sum();

        if xs.is_empty() {
            return Self {
                min: 0.0,
                max: 0.0,
                num,
                sum,
                sum_squares,
                bucket_limits: vec![0.0],
                bucket_counts: vec![0.0],
            };
        }
        if !(max > min) || n_buckets < 2 {
            return Self {
                min,
                max,
                num,
                sum,
                sum_squares,
                bucket_limits: vec![max],
                bucket_counts: vec![num],
            };
        }

        let width = (max - min) / n_buckets as f64;
        let bucket_limits = (1..=n_buckets).map(|i| min + width * i as f64).collect::<Vec<_>>();
        let mut bucket_counts = vec![0.0; n_buckets];
        for x in xs.iter() {
            let ix = (((x - min) / width) as usize).min(n_buckets - 1);
            bucket_counts[ix] += 1.0;
        }

        Self {
            min,
            max,
            num,
            sum,
            sum_squares,
            bucket_limits,
            bucket_counts,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_histogram() {
        let h = Histogram::new(&[0.0, 1.0, 1.5, 4.0], 4);
        assert_eq!(h.min, 0.0);
        assert_eq!(h.max, 4.0);
        assert_eq!(h.num, 4.0);
        assert_eq!(h.sum, 6.5);
        assert_eq!(h.sum_squares, 0.0 + 1.0 + 2.25 + 16.0);
        assert_eq!(h.bucket_limits, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(h.bucket_counts, vec![1.0, 2.0, 0.0, 1.0]);
    }

    #[test]
    fn test_degenerate_histograms() {
        let h = Histogram::new(&[2.0, 2.0], 10);
        assert_eq!(h.bucket_limits, vec![2.0]);
        assert_eq!(h.bucket_counts, vec![2.0]);

        let h = Histogram::new(&[], 10);
        assert_eq!(h.num, 0.0);
        assert_eq!(h.bucket_counts, vec![0.0]);
    }
}
