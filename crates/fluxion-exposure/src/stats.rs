// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Small descriptive statistics helpers.

#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sort a copy of `values` ascending
#[must_use]
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Percentile (0..=100) of ascending-sorted values, linear interpolation
/// between closest ranks.
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentile_sorted(sorted: &[f64], pct: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = (pct.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - rank.floor();
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

#[must_use]
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    percentile_sorted(&sorted(values), pct)
}

/// Sample standard deviation (n - 1), 0 for fewer than two values
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let Some(m) = mean(values) else {
        return 0.0;
    };
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Pearson correlation, 0 when either side has no variance
#[must_use]
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let (Some(mx), Some(my)) = (mean(xs), mean(ys)) else {
        return 0.0;
    };

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx <= 0.0 || vy <= 0.0 {
        return 0.0;
    }
    (cov / (vx.sqrt() * vy.sqrt())).clamp(-1.0, 1.0)
}
