use super::confusion::ConfusionMatrix;
use crate::config::{Average, ZeroDivision};
use crate::types::{ClassLabel, MetricValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMetric {
    Precision,
    Recall,
    F1,
}

/// `numerator / denominator`, with a zero denominator resolved by `policy`.
pub fn ratio(numerator: f64, denominator: f64, policy: ZeroDivision) -> MetricValue {
    if denominator > 0.0 {
        return MetricValue::Computed(numerator / denominator);
    }
    match policy {
        ZeroDivision::Zero => MetricValue::Computed(0.0),
        ZeroDivision::One => MetricValue::Computed(1.0),
        ZeroDivision::Undefined => MetricValue::Undefined,
    }
}

fn from_counts(metric: LabelMetric, tp: usize, fp: usize, fn_: usize, policy: ZeroDivision) -> MetricValue {
    let (tp, fp, fn_) = (tp as f64, fp as f64, fn_ as f64);
    match metric {
        LabelMetric::Precision => ratio(tp, tp + fp, policy),
        LabelMetric::Recall => ratio(tp, tp + fn_, policy),
        // Same as 2PR/(P+R) whenever both are defined, and 0 when TP = 0.
        LabelMetric::F1 => ratio(2.0 * tp, 2.0 * tp + fp + fn_, policy),
    }
}

fn per_class(cm: &ConfusionMatrix, metric: LabelMetric, class: ClassLabel, policy: ZeroDivision) -> MetricValue {
    from_counts(
        metric,
        cm.true_positives(class),
        cm.false_positives(class),
        cm.false_negatives(class),
        policy,
    )
}

/// Precision, recall or F1 under the requested averaging mode.
///
/// Macro and weighted averages skip classes whose value is undefined; they
/// are undefined themselves only if no class yields a value.
pub fn label_metric(
    cm: &ConfusionMatrix,
    metric: LabelMetric,
    average: Average,
    positive_label: ClassLabel,
    policy: ZeroDivision,
) -> MetricValue {
    match average {
        Average::Binary => per_class(cm, metric, positive_label, policy),
        Average::Micro => {
            let classes = cm.classes();
            let tp = classes.iter().map(|&c| cm.true_positives(c)).sum();
            let fp = classes.iter().map(|&c| cm.false_positives(c)).sum();
            let fn_ = classes.iter().map(|&c| cm.false_negatives(c)).sum();
            from_counts(metric, tp, fp, fn_, policy)
        }
        Average::Macro => {
            let values: Vec<f64> = cm
                .classes()
                .iter()
                .filter_map(|&c| per_class(cm, metric, c, policy).value())
                .collect();
            if values.is_empty() {
                MetricValue::Undefined
            } else {
                MetricValue::Computed(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
        Average::Weighted => {
            let mut weighted_sum = 0.0;
            let mut total_support = 0.0;
            for &class in cm.classes() {
                if let Some(v) = per_class(cm, metric, class, policy).value() {
                    let support = cm.support(class) as f64;
                    weighted_sum += support * v;
                    total_support += support;
                }
            }
            ratio(weighted_sum, total_support, policy)
        }
    }
}

pub fn accuracy(cm: &ConfusionMatrix, policy: ZeroDivision) -> MetricValue {
    ratio(cm.correct() as f64, cm.total() as f64, policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(value: MetricValue, expected: f64) {
        let v = value.value().expect("metric should be computed");
        assert!((v - expected).abs() < 1e-12, "{v} != {expected}");
    }

    #[test]
    fn test_binary_counts() {
        // tp=2, fp=1, fn=1, tn=2
        let cm = ConfusionMatrix::from_pairs(vec![(1, 1), (1, 1), (0, 1), (1, 0), (0, 0), (0, 0)]);
        approx(label_metric(&cm, LabelMetric::Precision, Average::Binary, 1, ZeroDivision::Zero), 2.0 / 3.0);
        approx(label_metric(&cm, LabelMetric::Recall, Average::Binary, 1, ZeroDivision::Zero), 2.0 / 3.0);
        approx(label_metric(&cm, LabelMetric::F1, Average::Binary, 1, ZeroDivision::Zero), 2.0 / 3.0);
        approx(accuracy(&cm, ZeroDivision::Zero), 4.0 / 6.0);
    }

    #[test]
    fn test_zero_division_policies() {
        // No positive predictions at all
        let cm = ConfusionMatrix::from_pairs(vec![(1, 0), (0, 0)]);
        approx(label_metric(&cm, LabelMetric::Precision, Average::Binary, 1, ZeroDivision::Zero), 0.0);
        approx(label_metric(&cm, LabelMetric::Precision, Average::Binary, 1, ZeroDivision::One), 1.0);
        assert_eq!(
            label_metric(&cm, LabelMetric::Precision, Average::Binary, 1, ZeroDivision::Undefined),
            MetricValue::Undefined
        );
        // Recall still has a denominator
        approx(label_metric(&cm, LabelMetric::Recall, Average::Binary, 1, ZeroDivision::Undefined), 0.0);
    }

    #[test]
    fn test_micro_equals_accuracy_for_multiclass() {
        let cm = ConfusionMatrix::from_pairs(vec![
            (0, 0), (0, 1), (1, 1), (1, 1), (2, 0), (2, 2), (2, 2), (1, 2),
        ]);
        let acc = accuracy(&cm, ZeroDivision::Zero).value().unwrap();
        for metric in [LabelMetric::Precision, LabelMetric::Recall, LabelMetric::F1] {
            approx(label_metric(&cm, metric, Average::Micro, 1, ZeroDivision::Zero), acc);
        }
    }

    #[test]
    fn test_macro_and_weighted_recall() {
        // class 0: support 1, recall 1; class 1: support 3, recall 1/3
        let cm = ConfusionMatrix::from_pairs(vec![(0, 0), (1, 1), (1, 0), (1, 0)]);
        approx(
            label_metric(&cm, LabelMetric::Recall, Average::Macro, 1, ZeroDivision::Zero),
            (1.0 + 1.0 / 3.0) / 2.0,
        );
        approx(
            label_metric(&cm, LabelMetric::Recall, Average::Weighted, 1, ZeroDivision::Zero),
            (1.0 * 1.0 + 3.0 * (1.0 / 3.0)) / 4.0,
        );
    }
}
