//! Similarity measures used by the multiplex structural indicators.
//!
//! | Metric | Range | Used for |
//! |--------|-------|----------|
//! | [`nmi`] | [0, 1] | Agreement between two layers' community partitions |
//! | [`pearson`] | [-1, 1] | Degree-sequence correlation between layers |
//! | [`spearman`] | [-1, 1] | Rank version of the above |
//! | [`jaccard`] | [0, 1] | Node and edge overlap between layers |
//!
//! # References
//!
//! - Strehl & Ghosh (2002). "Cluster ensembles" (NMI)

use std::collections::{BTreeMap, BTreeSet};

/// Normalized Mutual Information between two labellings.
///
/// ```text
/// NMI(U, V) = 2 * I(U; V) / (H(U) + H(V))
/// ```
///
/// Returns 0 for empty or mismatched inputs and 1 when both labellings are
/// constant.
///
/// ```rust
/// use demux::metrics::nmi;
///
/// assert!((nmi(&[0, 0, 1, 1], &[5, 5, 3, 3]) - 1.0).abs() < 1e-12);
/// assert!(nmi(&[0, 1, 0, 1], &[0, 0, 1, 1]) < 0.5);
/// ```
pub fn nmi(a: &[usize], b: &[usize]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let n = a.len() as f64;

    let mut count_a: BTreeMap<usize, usize> = BTreeMap::new();
    let mut count_b: BTreeMap<usize, usize> = BTreeMap::new();
    let mut joint: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    for (&x, &y) in a.iter().zip(b) {
        *count_a.entry(x).or_insert(0) += 1;
        *count_b.entry(y).or_insert(0) += 1;
        *joint.entry((x, y)).or_insert(0) += 1;
    }

    let entropy = |counts: &BTreeMap<usize, usize>| -> f64 {
        counts
            .values()
            .map(|&c| {
                let p = c as f64 / n;
                -p * p.ln()
            })
            .sum()
    };
    let h_a = entropy(&count_a);
    let h_b = entropy(&count_b);

    let mut mi = 0.0;
    for (&(x, y), &c) in &joint {
        let p_xy = c as f64 / n;
        let p_x = count_a[&x] as f64 / n;
        let p_y = count_b[&y] as f64 / n;
        mi += p_xy * (p_xy / (p_x * p_y)).ln();
    }

    let denom = h_a + h_b;
    if denom > 0.0 {
        (2.0 * mi / denom).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Pearson correlation coefficient.
///
/// `None` for mismatched lengths, fewer than two samples, or a constant input.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y) {
        let (dx, dy) = (a - mean_x, b - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Spearman rank correlation (Pearson over average ranks).
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    pearson(&ranks(x), &ranks(y))
}

/// 1-based ranks; ties share their average rank.
fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let mut out = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let avg = (start + end + 1) as f64 / 2.0;
        for &i in &order[start..end] {
            out[i] = avg;
        }
        start = end;
    }
    out
}

/// Jaccard index |A ∩ B| / |A ∪ B|; 0 when both sets are empty.
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nmi_perfect_and_permuted() {
        assert!((nmi(&[0, 0, 1, 1, 2], &[0, 0, 1, 1, 2]) - 1.0).abs() < 1e-12);
        assert!((nmi(&[0, 0, 1, 1, 2], &[2, 2, 0, 0, 1]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_nmi_independent() {
        let v = nmi(&[0, 0, 1, 1], &[0, 1, 0, 1]);
        assert!(v.abs() < 1e-12);
    }

    #[test]
    fn test_nmi_constant_inputs() {
        assert_eq!(nmi(&[3, 3, 3], &[1, 1, 1]), 1.0);
        assert_eq!(nmi(&[], &[]), 0.0);
    }

    #[test]
    fn test_pearson() {
        let r = pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
        assert!(pearson(&[1.0, 1.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_spearman_is_rank_based() {
        // Monotone but nonlinear.
        let r = spearman(&[1.0, 2.0, 3.0, 4.0], &[1.0, 8.0, 27.0, 64.0]).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ranks_average_ties() {
        assert_eq!(ranks(&[10.0, 20.0, 10.0, 30.0]), vec![1.5, 3.0, 1.5, 4.0]);
    }

    #[test]
    fn test_jaccard() {
        let a: BTreeSet<u64> = [1, 2, 3].into_iter().collect();
        let b: BTreeSet<u64> = [2, 3, 4, 5].into_iter().collect();
        assert!((jaccard(&a, &b) - 0.4).abs() < 1e-12);
        assert_eq!(jaccard::<u64>(&BTreeSet::new(), &BTreeSet::new()), 0.0);
    }
}
