//! Positional join of grid points, sampled covariates and model outputs.
//!
//! Row `i` of every input belongs to grid point `i`. Nothing else correlates
//! them, so any length mismatch aborts the whole assembly.

use biosentinel_core::error::{BioSentinelError, Result};
use biosentinel_core::models::{OutputMatrix, Point, PredictionRecord, SampleTable};

/// One record per point: coordinates, raw covariates and named outputs
pub fn assemble(
    points: &[Point],
    samples: &SampleTable,
    outputs: &OutputMatrix,
) -> Result<Vec<PredictionRecord>> {
    if points.len() != samples.len() || points.len() != outputs.len() {
        return Err(BioSentinelError::Alignment {
            points: points.len(),
            samples: samples.len(),
            outputs: outputs.len(),
        });
    }

    if let Some(idx) = outputs.rows.iter().position(|row| row.len() != outputs.columns.len()) {
        return Err(BioSentinelError::remote(
            "predict",
            format!(
                "output row {} has {} values for {} columns",
                idx,
                outputs.rows[idx].len(),
                outputs.columns.len()
            ),
        ));
    }

    let mut records = Vec::with_capacity(points.len());
    for (idx, (point, output_row)) in points.iter().zip(&outputs.rows).enumerate() {
        let row = samples.row(idx).ok_or(BioSentinelError::Alignment {
            points: points.len(),
            samples: samples.len(),
            outputs: outputs.len(),
        })?;

        records.push(PredictionRecord {
            point: *point,
            covariates: samples.columns().iter().cloned().zip(row).collect(),
            outputs: outputs.columns.iter().cloned().zip(output_row.iter().copied()).collect(),
        });
    }

    tracing::debug!(records = records.len(), "Assembled predictions");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use biosentinel_core::models::SampleValue;

    fn table(values: Vec<SampleValue>) -> SampleTable {
        let mut table = SampleTable::new(values.len());
        table.push_column("NDVI", values).unwrap();
        table
    }

    fn outputs(rows: Vec<Vec<f64>>) -> OutputMatrix {
        OutputMatrix { columns: vec!["Biota_Overlap".to_string()], rows }
    }

    #[test]
    fn test_assemble_joins_by_position() {
        let points = vec![Point::new(-76.6, 2.6), Point::new(-76.6, 2.7)];
        let samples = table(vec![SampleValue::Value(0.61), SampleValue::NoData]);
        let records = assemble(&points, &samples, &outputs(vec![vec![0.2], vec![0.9]])).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].point, Point::new(-76.6, 2.7));
        assert_eq!(records[1].covariates, vec![("NDVI".to_string(), SampleValue::NoData)]);
        assert_eq!(records[1].outputs, vec![("Biota_Overlap".to_string(), 0.9)]);
    }

    #[test]
    fn test_short_model_output_is_alignment_error() {
        let points = vec![Point::new(0.0, 0.0), Point::new(0.1, 0.0), Point::new(0.2, 0.0)];
        let samples = table(vec![SampleValue::Value(1.0); 3]);

        match assemble(&points, &samples, &outputs(vec![vec![0.1], vec![0.2]])) {
            Err(BioSentinelError::Alignment { points, samples, outputs }) => {
                assert_eq!((points, samples, outputs), (3, 3, 2));
            }
            other => panic!("Expected Alignment, got {:?}", other),
        }
    }

    #[test]
    fn test_sample_count_mismatch_is_alignment_error() {
        let points = vec![Point::new(0.0, 0.0)];
        let samples = table(vec![SampleValue::Value(1.0), SampleValue::Value(2.0)]);
        let result = assemble(&points, &samples, &outputs(vec![vec![0.5]]));
        assert!(matches!(result, Err(BioSentinelError::Alignment { points: 1, samples: 2, outputs: 1 })));
    }

    #[test]
    fn test_ragged_output_row_rejected() {
        let points = vec![Point::new(0.0, 0.0)];
        let samples = table(vec![SampleValue::Value(1.0)]);
        let result = assemble(&points, &samples, &outputs(vec![vec![0.5, 0.7]]));
        assert!(matches!(result, Err(BioSentinelError::RemoteService { .. })));
    }

    #[test]
    fn test_empty_inputs_assemble_to_nothing() {
        let records = assemble(&[], &SampleTable::new(0), &outputs(vec![])).unwrap();
        assert!(records.is_empty());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn assembles_only_when_lengths_agree(
                n_points in 0usize..40,
                n_samples in 0usize..40,
                n_outputs in 0usize..40,
            ) {
                let points: Vec<Point> = (0..n_points).map(|i| Point::new(i as f64, 0.0)).collect();
                let samples = table((0..n_samples).map(|i| SampleValue::Value(i as f64)).collect());
                let rows = (0..n_outputs).map(|i| vec![i as f64]).collect();

                match assemble(&points, &samples, &outputs(rows)) {
                    Ok(records) => {
                        prop_assert!(n_points == n_samples && n_points == n_outputs);
                        for (i, record) in records.iter().enumerate() {
                            prop_assert_eq!(record.point.lon, i as f64);
                            prop_assert_eq!(&record.covariates[0].1, &SampleValue::Value(i as f64));
                            prop_assert_eq!(record.outputs[0].1, i as f64);
                        }
                    }
                    Err(BioSentinelError::Alignment { .. }) => {
                        prop_assert!(n_points != n_samples || n_points != n_outputs);
                    }
                    Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                }
            }
        }
    }
}
