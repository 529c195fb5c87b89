//! Canonical chart document assembly.
//!
//! Records are sorted by release year (undated first), then parameter count,
//! then name. Series appear in the order their domain is first seen in that
//! sequence, and each series keeps the same order for its points. Identical
//! input therefore always yields byte-identical JSON.

use std::cmp::Ordering;
use std::collections::HashMap;

use modelcharts_shared::{
    ChartDocument, ChartKind, ChartPoint, ClassifiedRecord, Series, UNKNOWN,
};

use crate::aggregate::Aggregates;
use crate::transform::positive;

/// Renderer series type for every series.
const SERIES_TYPE: &str = "scatter";

/// The pipeline's canonical record order.
pub fn canonical_order(a: &ClassifiedRecord, b: &ClassifiedRecord) -> Ordering {
    a.release_year
        .cmp(&b.release_year)
        .then_with(|| cmp_magnitude(a.record.parameters, b.record.parameters))
        .then_with(|| a.name().cmp(b.name()))
}

/// Absent sorts first; present values by IEEE total order.
fn cmp_magnitude(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Assemble the chart document from usable records and their aggregates.
///
/// `records` may be in any order; they are sorted canonically here.
pub fn serialize(
    records: &[ClassifiedRecord],
    chart: ChartKind,
    aggregates: &Aggregates,
) -> ChartDocument {
    let mut sorted: Vec<&ClassifiedRecord> = records.iter().collect();
    sorted.sort_by(|a, b| canonical_order(a, b));

    let mut series: Vec<Series> = Vec::new();
    let mut series_index: HashMap<&str, usize> = HashMap::new();
    let mut total_models = 0;

    for record in sorted {
        let Some(point) = to_point(record, chart) else {
            continue;
        };
        let idx = *series_index
            .entry(record.primary_domain.as_str())
            .or_insert_with(|| {
                series.push(Series {
                    name: record.primary_domain.clone(),
                    kind: SERIES_TYPE.to_string(),
                    data: Vec::new(),
                });
                series.len() - 1
            });
        series[idx].data.push(point);
        total_models += 1;
    }

    ChartDocument {
        total_models,
        domains: series.iter().map(|s| s.name.clone()).collect(),
        series,
        x_axis: aggregates.x_axis,
        y_axis: aggregates.y_axis,
        domain_counts: aggregates.domain_counts.clone(),
        era_counts: aggregates.era_counts,
    }
}

/// Build the plotted point and tooltip fields for one record.
fn to_point(record: &ClassifiedRecord, chart: ChartKind) -> Option<ChartPoint> {
    let x = record.plotted(chart.x_field())?;
    let y = record.plotted(chart.y_field())?;
    let source = &record.record;

    Some(ChartPoint {
        value: [x, y],
        name: record.name().to_string(),
        organization: source.organization.clone().unwrap_or_else(|| UNKNOWN.into()),
        parameters: source.parameters?,
        training_dataset_size_datapoints: positive(source.training_dataset_size),
        publication_date: source
            .publication_date
            .map_or_else(|| UNKNOWN.into(), |d| d.to_string()),
        confidence: source.confidence.clone().unwrap_or_else(|| UNKNOWN.into()),
        frontier_model: source.frontier_model,
    })
}
