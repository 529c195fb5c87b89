//! Summary statistics written next to each chart document (`stat.json`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use modelcharts_shared::{ChartKind, ClassifiedRecord, DomainCount, RejectionTally};

/// Parameter-count buckets, as `(label, inclusive lower bound)`.
const SIZE_CATEGORIES: [(&str, f64); 4] = [
    ("< 1M", 0.0),
    ("1M - 1B", 1e6),
    ("1B - 100B", 1e9),
    (">= 100B", 1e11),
];

/// Statistics for one chart's usable records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartStats {
    pub chart: ChartKind,
    pub total_models: usize,
    pub rejected: RejectionTally,
    pub parameter_range: Option<MagnitudeRange>,
    pub dataset_size_range: Option<MagnitudeRange>,
    pub year_range: Option<YearRange>,
    pub domain_distribution: Vec<DomainShare>,
    pub models_per_year: Vec<YearSummary>,
    pub parameter_categories: Vec<SizeCategory>,
}

/// Distribution of a positive magnitude, raw and on the log10 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeRange {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub min_log: f64,
    pub max_log: f64,
    pub mean_log: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub count: usize,
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainShare {
    pub domain: String,
    pub count: usize,
    /// Percentage of usable records, rounded to two decimals.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: i32,
    pub count: usize,
    pub mean_parameters: Option<f64>,
    pub min_parameters: Option<f64>,
    pub max_parameters: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeCategory {
    pub category: String,
    pub count: usize,
    pub min_parameters: Option<f64>,
    pub max_parameters: Option<f64>,
}

/// Compute statistics. `domain_counts` comes from the aggregator so the
/// distribution uses the same presentation order as the document.
pub fn compute_stats(
    records: &[ClassifiedRecord],
    chart: ChartKind,
    domain_counts: &[DomainCount],
    rejected: RejectionTally,
) -> ChartStats {
    let total = records.len();
    let parameters: Vec<f64> = records
        .iter()
        .filter(|r| r.log_parameters.is_some())
        .filter_map(|r| r.record.parameters)
        .collect();
    let dataset_sizes: Vec<f64> = records
        .iter()
        .filter(|r| r.log_training_dataset_size.is_some())
        .filter_map(|r| r.record.training_dataset_size)
        .collect();

    let years: Vec<i32> = records.iter().filter_map(|r| r.release_year).collect();
    let year_range = match (years.iter().min(), years.iter().max()) {
        (Some(&min), Some(&max)) => Some(YearRange {
            count: years.len(),
            min,
            max,
        }),
        _ => None,
    };

    let domain_distribution = domain_counts
        .iter()
        .map(|d| DomainShare {
            domain: d.domain.clone(),
            count: d.count,
            percentage: percentage(d.count, total),
        })
        .collect();

    ChartStats {
        chart,
        total_models: total,
        rejected,
        parameter_range: magnitude_range(&parameters),
        dataset_size_range: magnitude_range(&dataset_sizes),
        year_range,
        domain_distribution,
        models_per_year: models_per_year(records),
        parameter_categories: parameter_categories(&parameters),
    }
}

fn magnitude_range(values: &[f64]) -> Option<MagnitudeRange> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let min = sorted[0];
    let max = sorted[n - 1];
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };

    Some(MagnitudeRange {
        count: n,
        min,
        max,
        mean: mean(&sorted),
        median,
        min_log: min.log10(),
        max_log: max.log10(),
        mean_log: sorted.iter().map(|v| v.log10()).sum::<f64>() / n as f64,
    })
}

fn models_per_year(records: &[ClassifiedRecord]) -> Vec<YearSummary> {
    let mut by_year: BTreeMap<i32, Vec<Option<f64>>> = BTreeMap::new();
    for record in records {
        if let Some(year) = record.release_year {
            let params = record.log_parameters.and(record.record.parameters);
            by_year.entry(year).or_default().push(params);
        }
    }

    by_year
        .into_iter()
        .map(|(year, params)| {
            let present: Vec<f64> = params.iter().flatten().copied().collect();
            YearSummary {
                year,
                count: params.len(),
                mean_parameters: (!present.is_empty()).then(|| mean(&present)),
                min_parameters: present.iter().copied().reduce(f64::min),
                max_parameters: present.iter().copied().reduce(f64::max),
            }
        })
        .collect()
}

fn parameter_categories(parameters: &[f64]) -> Vec<SizeCategory> {
    SIZE_CATEGORIES
        .iter()
        .enumerate()
        .map(|(i, (label, lower))| {
            let upper = SIZE_CATEGORIES.get(i + 1).map_or(f64::INFINITY, |c| c.1);
            let members: Vec<f64> = parameters
                .iter()
                .copied()
                .filter(|p| *p >= *lower && *p < upper)
                .collect();
            SizeCategory {
                category: (*label).to_string(),
                count: members.len(),
                min_parameters: members.iter().copied().reduce(f64::min),
                max_parameters: members.iter().copied().reduce(f64::max),
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 10_000.0 / total as f64).round() / 100.0
}
