//! Adaptive axis ranges and summary counts over usable records.

use std::collections::HashMap;

use tracing::debug;

use modelcharts_shared::{AxisRange, ChartKind, ClassifiedRecord, DomainCount, Era, EraCounts};

use crate::settings::ChartSettings;

/// Axis bounds and tallies for one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub x_axis: AxisRange,
    pub y_axis: AxisRange,
    /// Count descending, ties in classifier rule order.
    pub domain_counts: Vec<DomainCount>,
    pub era_counts: EraCounts,
}

/// Running min/max of one coordinate.
#[derive(Debug, Clone, Copy)]
struct Extent {
    min: f64,
    max: f64,
}

impl Extent {
    fn include(extent: Option<Self>, value: f64) -> Option<Self> {
        Some(match extent {
            None => Self {
                min: value,
                max: value,
            },
            Some(e) => Self {
                min: e.min.min(value),
                max: e.max.max(value),
            },
        })
    }
}

/// Scan `records` once and compute axis ranges and counts.
///
/// Returns `None` when no record carries both plotted coordinates.
pub fn aggregate(
    records: &[ClassifiedRecord],
    chart: ChartKind,
    settings: &ChartSettings,
) -> Option<Aggregates> {
    let (x_field, y_field) = (chart.x_field(), chart.y_field());

    let mut x_extent = None;
    let mut y_extent = None;
    let mut by_domain: HashMap<&str, usize> = HashMap::new();
    let mut era_counts = EraCounts::default();

    for record in records {
        let (Some(x), Some(y)) = (record.plotted(x_field), record.plotted(y_field)) else {
            continue;
        };
        x_extent = Extent::include(x_extent, x);
        y_extent = Extent::include(y_extent, y);

        *by_domain.entry(record.primary_domain.as_str()).or_default() += 1;

        match record.era {
            Era::Era1 => era_counts.era1 += 1,
            Era::Era2 => era_counts.era2 += 1,
            Era::Era3 => era_counts.era3 += 1,
        }
        if record.record.publication_date.is_none() {
            era_counts.undated += 1;
        }
    }

    let (x, y) = (x_extent?, y_extent?);

    let mut domain_counts: Vec<DomainCount> = by_domain
        .into_iter()
        .map(|(domain, count)| DomainCount {
            domain: domain.to_string(),
            count,
        })
        .collect();
    domain_counts.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| settings.rules.rank(&a.domain).cmp(&settings.rules.rank(&b.domain)))
            .then_with(|| a.domain.cmp(&b.domain))
    });

    let aggregates = Aggregates {
        x_axis: pad_range(x.min, x.max, settings.margin),
        y_axis: pad_range(y.min, y.max, settings.margin),
        domain_counts,
        era_counts,
    };

    debug!(
        x_min = aggregates.x_axis.min,
        x_max = aggregates.x_axis.max,
        y_min = aggregates.y_axis.min,
        y_max = aggregates.y_axis.max,
        "axis ranges computed"
    );

    Some(aggregates)
}

/// Round the observed extent outwards to integers. An extremum that already
/// sits on an integer gets `margin` more room so no point touches the edge.
pub fn pad_range(min: f64, max: f64, margin: f64) -> AxisRange {
    let mut lo = min.floor();
    if lo == min {
        lo -= margin;
    }
    let mut hi = max.ceil();
    if hi == max {
        hi += margin;
    }
    AxisRange { min: lo, max: hi }
}
