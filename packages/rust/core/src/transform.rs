//! Record validation and derived-field computation.
//!
//! A record is validated against one chart at a time: the checks run in a
//! fixed order and the first failure becomes the rejection reason.
//!
//! Undated records are `Era1` everywhere eras are reported. A chart that
//! plots release year cannot place them and rejects them as
//! `MissingField(publication_date)`.

use chrono::{Datelike, NaiveDate};
use tracing::{debug, instrument};

use modelcharts_shared::{
    ChartKind, ClassifiedRecord, Era, Field, ModelRecord, RejectReason, Rejected, RejectionTally,
};

use crate::settings::ChartSettings;

/// Inclusive lower bounds of the later eras.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EraBoundaries {
    pub era2_start: NaiveDate,
    pub era3_start: NaiveDate,
}

impl Default for EraBoundaries {
    fn default() -> Self {
        let eras = modelcharts_shared::EraConfig::default();
        Self {
            era2_start: eras.era2_start,
            era3_start: eras.era3_start,
        }
    }
}

impl EraBoundaries {
    /// Bucket a publication date. Absent dates fall in `Era1`.
    pub fn era_for(&self, date: Option<NaiveDate>) -> Era {
        match date {
            Some(d) if d >= self.era3_start => Era::Era3,
            Some(d) if d >= self.era2_start => Era::Era2,
            _ => Era::Era1,
        }
    }
}

/// Usable records and rejections for one chart.
#[derive(Debug, Clone, Default)]
pub struct TransformOutcome {
    pub usable: Vec<ClassifiedRecord>,
    pub rejected: Vec<Rejected>,
    pub tally: RejectionTally,
}

/// Validate `record` for `chart` and compute its derived fields.
pub fn transform(
    record: &ModelRecord,
    chart: ChartKind,
    settings: &ChartSettings,
) -> Result<ClassifiedRecord, Rejected> {
    let reject = |reason| Rejected {
        name: record.name.clone(),
        reason,
    };

    let has_name = record
        .name
        .as_deref()
        .is_some_and(|name| !name.trim().is_empty());
    if !has_name {
        return Err(reject(RejectReason::MissingField(Field::Name)));
    }

    for &field in chart.required_fields() {
        let ok = match field {
            Field::Parameters => positive(record.parameters).is_some(),
            Field::TrainingDatasetSize => positive(record.training_dataset_size).is_some(),
            Field::PublicationDate => record.publication_date.is_some(),
            Field::Name => true,
        };
        if !ok {
            let reason = match field {
                Field::PublicationDate | Field::Name => RejectReason::MissingField(field),
                Field::Parameters | Field::TrainingDatasetSize => {
                    RejectReason::InvalidMagnitude(field)
                }
            };
            return Err(reject(reason));
        }
    }

    Ok(ClassifiedRecord {
        primary_domain: settings
            .rules
            .classify(record.raw_domain.as_deref())
            .to_string(),
        release_year: record.publication_date.map(|d| d.year()),
        log_parameters: positive(record.parameters).map(f64::log10),
        log_training_dataset_size: positive(record.training_dataset_size).map(f64::log10),
        era: settings.eras.era_for(record.publication_date),
        record: record.clone(),
    })
}

/// Transform every record for `chart`, tallying rejections.
#[instrument(skip_all, fields(chart = %chart, rows = records.len()))]
pub fn transform_all(
    records: &[ModelRecord],
    chart: ChartKind,
    settings: &ChartSettings,
) -> TransformOutcome {
    let mut outcome = TransformOutcome::default();

    for record in records {
        match transform(record, chart, settings) {
            Ok(classified) => outcome.usable.push(classified),
            Err(rejected) => {
                debug!(
                    name = rejected.name.as_deref().unwrap_or("<unnamed>"),
                    reason = %rejected.reason,
                    "record rejected"
                );
                outcome.tally.record(rejected.reason);
                outcome.rejected.push(rejected);
            }
        }
    }

    outcome
}

/// A magnitude usable on a log axis: present, finite and strictly positive.
pub(crate) fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn model(name: &str) -> ModelRecord {
        ModelRecord {
            name: Some(name.into()),
            parameters: Some(1e9),
            training_dataset_size: Some(1e12),
            publication_date: date(2020, 1, 1),
            raw_domain: Some("Language Model".into()),
            ..Default::default()
        }
    }

    #[test]
    fn era_boundaries() {
        let eras = EraBoundaries::default();
        assert_eq!(eras.era_for(date(2011, 12, 31)), Era::Era1);
        assert_eq!(eras.era_for(date(2012, 1, 1)), Era::Era2);
        assert_eq!(eras.era_for(date(2016, 12, 31)), Era::Era2);
        assert_eq!(eras.era_for(date(2017, 1, 1)), Era::Era3);
        assert_eq!(eras.era_for(None), Era::Era1);
    }

    #[test]
    fn derives_fields() {
        let settings = ChartSettings::default();
        let out = transform(&model("A"), ChartKind::ParametersVsDatapoints, &settings).unwrap();
        assert_eq!(out.primary_domain, "Language");
        assert_eq!(out.release_year, Some(2020));
        assert!((out.log_parameters.unwrap() - 9.0).abs() < 1e-12);
        assert!((out.log_training_dataset_size.unwrap() - 12.0).abs() < 1e-12);
        assert_eq!(out.era, Era::Era3);
        assert_eq!(out.name(), "A");
    }

    #[test]
    fn missing_name_checked_first() {
        let settings = ChartSettings::default();
        let record = ModelRecord {
            name: Some("   ".into()),
            parameters: None,
            ..Default::default()
        };
        let err = transform(&record, ChartKind::ParametersVsDatapoints, &settings).unwrap_err();
        assert_eq!(err.reason, RejectReason::MissingField(Field::Name));
    }

    #[test]
    fn non_positive_magnitudes_rejected() {
        let settings = ChartSettings::default();
        for bad in [None, Some(0.0), Some(-5.0), Some(f64::NAN), Some(f64::INFINITY)] {
            let record = ModelRecord {
                training_dataset_size: bad,
                ..model("B")
            };
            let err =
                transform(&record, ChartKind::ParametersVsDatapoints, &settings).unwrap_err();
            assert_eq!(
                err.reason,
                RejectReason::InvalidMagnitude(Field::TrainingDatasetSize)
            );
            assert_eq!(err.name.as_deref(), Some("B"));
        }
    }

    #[test]
    fn parameters_checked_before_dataset_size() {
        let settings = ChartSettings::default();
        let record = ModelRecord {
            parameters: Some(0.0),
            training_dataset_size: None,
            ..model("C")
        };
        let err = transform(&record, ChartKind::ParametersVsDatapoints, &settings).unwrap_err();
        assert_eq!(err.reason, RejectReason::InvalidMagnitude(Field::Parameters));
    }

    #[test]
    fn usability_is_per_chart() {
        let settings = ChartSettings::default();
        let no_dataset = ModelRecord {
            training_dataset_size: None,
            ..model("D")
        };
        assert!(transform(&no_dataset, ChartKind::ParametersVsDatapoints, &settings).is_err());
        let by_year = transform(&no_dataset, ChartKind::ParametersByYear, &settings).unwrap();
        assert_eq!(by_year.log_training_dataset_size, None);

        let undated = ModelRecord {
            publication_date: None,
            ..model("E")
        };
        let err = transform(&undated, ChartKind::ParametersByYear, &settings).unwrap_err();
        assert_eq!(err.reason, RejectReason::MissingField(Field::PublicationDate));
        let scatter = transform(&undated, ChartKind::ParametersVsDatapoints, &settings).unwrap();
        assert_eq!(scatter.era, Era::Era1);
        assert_eq!(scatter.release_year, None);
    }

    #[test]
    fn transform_all_tallies() {
        let settings = ChartSettings::default();
        let records = vec![
            model("A"),
            ModelRecord {
                training_dataset_size: None,
                ..model("B")
            },
            ModelRecord {
                name: None,
                ..model("C")
            },
        ];
        let outcome = transform_all(&records, ChartKind::ParametersVsDatapoints, &settings);
        assert_eq!(outcome.usable.len(), 1);
        assert_eq!(outcome.rejected.len(), 2);
        assert_eq!(outcome.tally.invalid_magnitude, 1);
        assert_eq!(outcome.tally.missing_field, 1);
    }
}
