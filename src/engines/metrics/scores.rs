//! Threshold-free metrics computed from positive-class scores.

use super::classification::ratio;
use crate::config::ZeroDivision;
use crate::types::MetricValue;

/// Probability that a random positive outscores a random negative (ties count half).
///
/// Uses the rank-sum form of the Mann-Whitney statistic with average ranks for
/// tied scores. A fold without both classes has a zero denominator.
pub fn roc_auc(is_positive: &[bool], scores: &[f64], policy: ZeroDivision) -> MetricValue {
    debug_assert_eq!(is_positive.len(), scores.len());

    let n_pos = is_positive.iter().filter(|&&p| p).count() as f64;
    let n_neg = is_positive.len() as f64 - n_pos;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; tied block [start, end) shares the mean rank.
        let mean_rank = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            if is_positive[i] {
                positive_rank_sum += mean_rank;
            }
        }
        start = end;
    }

    let u = positive_rank_sum - n_pos * (n_pos + 1.0) / 2.0;
    ratio(u, n_pos * n_neg, policy)
}

/// Average precision: `Σ (R_i − R_{i−1}) · P_i` over descending distinct thresholds.
pub fn average_precision(is_positive: &[bool], scores: &[f64], policy: ZeroDivision) -> MetricValue {
    debug_assert_eq!(is_positive.len(), scores.len());

    let n_pos = is_positive.iter().filter(|&&p| p).count();
    if n_pos == 0 {
        return ratio(0.0, 0.0, policy);
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut previous_recall = 0.0;
    let mut area = 0.0;

    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            if is_positive[order[end]] {
                tp += 1;
            } else {
                fp += 1;
            }
            end += 1;
        }
        let precision = tp as f64 / (tp + fp) as f64;
        let recall = tp as f64 / n_pos as f64;
        area += (recall - previous_recall) * precision;
        previous_recall = recall;
        start = end;
    }

    MetricValue::Computed(area)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_and_inverted_ranking() {
        let labels = [false, false, true, true];
        let perfect = [0.1, 0.2, 0.8, 0.9];
        let inverted = [0.9, 0.8, 0.2, 0.1];
        assert_eq!(roc_auc(&labels, &perfect, ZeroDivision::Zero), MetricValue::Computed(1.0));
        assert_eq!(roc_auc(&labels, &inverted, ZeroDivision::Zero), MetricValue::Computed(0.0));
        assert_eq!(average_precision(&labels, &perfect, ZeroDivision::Zero), MetricValue::Computed(1.0));
    }

    #[test]
    fn test_auc_counts_ties_as_half() {
        let labels = [false, true];
        let tied = [0.5, 0.5];
        assert_eq!(roc_auc(&labels, &tied, ZeroDivision::Zero), MetricValue::Computed(0.5));
    }

    #[test]
    fn test_auc_matches_pairwise_definition() {
        let labels = [true, false, true, false, false, true];
        let scores = [0.7, 0.3, 0.4, 0.4, 0.8, 0.9];
        let mut wins = 0.0;
        let mut pairs = 0.0;
        for i in 0..labels.len() {
            for j in 0..labels.len() {
                if labels[i] && !labels[j] {
                    pairs += 1.0;
                    if scores[i] > scores[j] {
                        wins += 1.0;
                    } else if scores[i] == scores[j] {
                        wins += 0.5;
                    }
                }
            }
        }
        let auc = roc_auc(&labels, &scores, ZeroDivision::Zero).value().unwrap();
        assert!((auc - wins / pairs).abs() < 1e-12);
    }

    #[test]
    fn test_average_precision_known_value() {
        // Descending: 0.9(+), 0.8(-), 0.7(+) -> 1.0 * 0.5 + (2/3) * 0.5
        let labels = [true, false, true];
        let scores = [0.9, 0.8, 0.7];
        let ap = average_precision(&labels, &scores, ZeroDivision::Zero).value().unwrap();
        assert!((ap - (0.5 + 1.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_fold_uses_policy() {
        let labels = [false, false];
        let scores = [0.2, 0.4];
        assert_eq!(roc_auc(&labels, &scores, ZeroDivision::Undefined), MetricValue::Undefined);
        assert_eq!(average_precision(&labels, &scores, ZeroDivision::One), MetricValue::Computed(1.0));
    }
}
