//! Ranking metrics over experiment reports.
//!
//! | Metric | Function |
//! |--------|----------|
//! | precision/recall at k, per user | [`precision_recall_at`] |
//! | averaged precision/recall per cutoff | [`precision_recall_curve`] |
//! | ROC point at k, per user | [`roc_point_at`] |
//! | averaged ROC points per cutoff | [`roc_curve`] |
//! | area under a curve | [`auc`] |
//! | mean average precision | [`mean_average_precision`] |
//!
//! Users with an empty recommendation or ground-truth list yield NaN, and
//! NaN values are left out of every average.

use super::report::{RecommendationRecord, Report};
use crate::{Entity, EntityKind};
use std::collections::HashSet;

fn hits(recommended: &[Entity], groundtruth: &[Entity]) -> usize {
    let truth: HashSet<&Entity> = groundtruth.iter().collect();
    recommended
        .iter()
        .collect::<HashSet<&Entity>>()
        .intersection(&truth)
        .count()
}

/// `(precision, recall)` of the first `k` recommendations (all with `None`)
/// for every record, NaN when either list is empty.
pub fn precision_recall_at(report: &Report, k: Option<usize>) -> Vec<(f64, f64)> {
    report
        .recommendation
        .iter()
        .map(|record| {
            let recommended = truncated(&record.recommended, k);
            if recommended.is_empty() || record.groundtruth.is_empty() {
                return (f64::NAN, f64::NAN);
            }
            let correct = hits(recommended, &record.groundtruth) as f64;
            (
                correct / recommended.len() as f64,
                correct / record.groundtruth.len() as f64,
            )
        })
        .collect()
}

fn truncated(list: &[Entity], k: Option<usize>) -> &[Entity] {
    match k {
        Some(k) => &list[..k.min(list.len())],
        None => list,
    }
}

/// Mean of the non-NaN values; NaN when there are none.
pub fn average(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Averaged precision and recall for each cutoff in `ranks`.
pub fn precision_recall_curve(report: &Report, ranks: &[usize]) -> (Vec<f64>, Vec<f64>) {
    ranks
        .iter()
        .map(|&k| {
            let pairs = precision_recall_at(report, Some(k));
            (
                average(pairs.iter().map(|p| p.0)),
                average(pairs.iter().map(|p| p.1)),
            )
        })
        .unzip()
}

fn repository_count(entities: &[Entity]) -> usize {
    entities
        .iter()
        .filter(|e| e.is_a(EntityKind::Repository))
        .count()
}

/// `(false positive rate, true positive rate)` of the first `k`
/// recommendations of every record.
///
/// Positives are the record's ground-truth repositories; negatives are the
/// repositories of the report's universe (`repo_count`) that the user neither
/// trained on nor holds in the ground truth. Neighbors of other kinds, such
/// as followed users, count as neither. A record without positives or
/// negatives yields NaN.
pub fn roc_point_at(report: &Report, k: Option<usize>) -> Vec<(f64, f64)> {
    report
        .recommendation
        .iter()
        .map(|record| {
            let positives = repository_count(&record.groundtruth);
            let known = repository_count(&record.training) + positives;
            let negatives = report.repo_count.saturating_sub(known);
            if positives == 0 || negatives == 0 {
                return (f64::NAN, f64::NAN);
            }
            let recommended = truncated(&record.recommended, k);
            let correct = hits(recommended, &record.groundtruth);
            let false_positives = recommended.len() - correct;
            (
                false_positives as f64 / negatives as f64,
                correct as f64 / positives as f64,
            )
        })
        .collect()
}

/// Per-user ROC points averaged for each cutoff in `ranks`, starting at
/// `(0, 0)`.
pub fn roc_curve(report: &Report, ranks: &[usize]) -> Vec<(f64, f64)> {
    let mut points = vec![(0.0, 0.0)];
    for &k in ranks {
        let per_user = roc_point_at(report, Some(k));
        points.push((
            average(per_user.iter().map(|p| p.0)),
            average(per_user.iter().map(|p| p.1)),
        ));
    }
    points
}

/// Trapezoidal area under `points`, taken in ascending `x` order.
pub fn auc(points: &[(f64, f64)]) -> f64 {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    sorted
        .windows(2)
        .map(|w| (w[1].0 - w[0].0) * (w[1].1 + w[0].1) / 2.0)
        .sum()
}

/// Average precision of one record: the mean of precision@i over the ranks
/// `i` holding a ground-truth repository, normalized by the number of hits
/// the list could have had. NaN when either list is empty.
pub fn average_precision(record: &RecommendationRecord) -> f64 {
    if record.recommended.is_empty() || record.groundtruth.is_empty() {
        return f64::NAN;
    }
    let truth: HashSet<&Entity> = record.groundtruth.iter().collect();
    let mut correct = 0usize;
    let mut total = 0.0;
    for (i, entity) in record.recommended.iter().enumerate() {
        if truth.contains(entity) {
            correct += 1;
            total += correct as f64 / (i + 1) as f64;
        }
    }
    let attainable = record.groundtruth.len().min(record.recommended.len());
    total / attainable as f64
}

/// Mean of [`average_precision`] over the report's records.
pub fn mean_average_precision(report: &Report) -> f64 {
    average(report.recommendation.iter().map(average_precision))
}
