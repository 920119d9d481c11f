//! Small descriptive statistics and array helpers shared by the peak models.

/// Arithmetic mean; NaN for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (one delta degree of freedom); NaN below two values
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Trapezoidal integral of `y` over `x`; zero below two samples
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) * 0.5)
        .sum()
}

/// First index whose value is not less than `target` (numpy `side="left"`)
pub fn search_sorted_left(sorted: &[f64], target: f64) -> usize {
    sorted.partition_point(|&v| v < target)
}

/// First index whose value is greater than `target` (numpy `side="right"`)
pub fn search_sorted_right(sorted: &[f64], target: f64) -> usize {
    sorted.partition_point(|&v| v <= target)
}

/// Half-open index range of `sorted` values inside `[low, high]`
pub fn window_range(sorted: &[f64], low: f64, high: f64) -> std::ops::Range<usize> {
    let start = search_sorted_left(sorted, low);
    let end = search_sorted_right(sorted, high).max(start);
    start..end
}

/// `count` evenly spaced values from `start` to `stop`, both included
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i + 1 == count { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Linear interpolation of `(xp, fp)` at `x`, returning `fill` outside `xp`'s range.
///
/// `xp` must be ascending.
pub fn interp_or(x: f64, xp: &[f64], fp: &[f64], fill: f64) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 || x < xp[0] || x > xp[n - 1] || x.is_nan() {
        return fill;
    }
    let upper = search_sorted_left(&xp[..n], x);
    if upper == 0 {
        return fp[0];
    }
    if upper >= n {
        return fp[n - 1];
    }
    let (x0, x1) = (xp[upper - 1], xp[upper]);
    if x1 == x0 {
        return fp[upper];
    }
    let t = (x - x0) / (x1 - x0);
    fp[upper - 1] + t * (fp[upper] - fp[upper - 1])
}

/// Index of the first maximum; `None` for an empty slice or an all-NaN slice
pub fn argmax_first(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Round to `decimals` decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-12);
        assert!((sample_std(&values) - 2.138089935299395).abs() < 1e-12);
        assert!(mean(&[]).is_nan());
        assert!(sample_std(&[1.0]).is_nan());
    }

    #[test]
    fn test_trapezoid() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 1.0, 0.0];
        assert!((trapezoid(&x, &y) - 1.0).abs() < 1e-12);
        assert_eq!(trapezoid(&[1.0], &[5.0]), 0.0);
    }

    #[test]
    fn test_window_range_inclusive_bounds() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(window_range(&sorted, 2.0, 4.0), 1..4);
        assert_eq!(window_range(&sorted, 5.5, 6.0), 5..5);
        assert_eq!(window_range(&sorted, 3.0, 1.0), 2..2);
    }

    #[test]
    fn test_linspace_endpoints() {
        let grid = linspace(1.0, 2.0, 5);
        assert_eq!(grid.len(), 5);
        assert_eq!(grid[0], 1.0);
        assert_eq!(grid[4], 2.0);
        assert!((grid[2] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_interp_fill_outside_range() {
        let xp = [1.0, 2.0, 3.0];
        let fp = [10.0, 20.0, 30.0];
        assert_eq!(interp_or(0.5, &xp, &fp, 0.0), 0.0);
        assert_eq!(interp_or(3.5, &xp, &fp, 0.0), 0.0);
        assert!((interp_or(1.5, &xp, &fp, 0.0) - 15.0).abs() < 1e-12);
        assert_eq!(interp_or(3.0, &xp, &fp, 0.0), 30.0);
    }

    #[test]
    fn test_argmax_first_prefers_earliest() {
        assert_eq!(argmax_first(&[1.0, 3.0, 3.0, 2.0]), Some(1));
        assert_eq!(argmax_first(&[]), None);
    }
}
