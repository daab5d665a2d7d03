//! Descriptor records and dense feature matrices
//!
//! Converts per-object descriptor records into a row-major matrix whose
//! columns follow a fixed descriptor key list. Every key is checked up
//! front so numeric code never sees a partial row.

use crate::errors::{ClassifierError, Result};
use std::collections::BTreeMap;

/// Named numeric descriptors of one detected object
pub type DescriptorRecord = BTreeMap<String, f64>;

/// Dense row-major matrix (objects x descriptors)
pub type FeatureMatrix = Vec<Vec<f64>>;

/// Extract the columns named by `keys` from every record, in key order.
///
/// Fails on the first record lacking a key, naming the object index and
/// the key. NaN values are rejected as well.
pub fn build_feature_matrix(records: &[DescriptorRecord], keys: &[String]) -> Result<FeatureMatrix> {
    records
        .iter()
        .enumerate()
        .map(|(object, record)| build_feature_row(object, record, keys))
        .collect()
}

fn build_feature_row(object: usize, record: &DescriptorRecord, keys: &[String]) -> Result<Vec<f64>> {
    keys.iter()
        .map(|key| match record.get(key) {
            Some(value) if value.is_nan() => Err(ClassifierError::InvalidDescriptor {
                object,
                key: key.clone(),
            }),
            Some(value) => Ok(*value),
            None => Err(ClassifierError::MissingDescriptor {
                object,
                key: key.clone(),
            }),
        })
        .collect()
}

/// Check that every row of `matrix` has exactly `columns` entries
pub fn check_columns(matrix: &[Vec<f64>], columns: usize) -> Result<()> {
    match matrix.iter().find(|row| row.len() != columns) {
        Some(row) => Err(ClassifierError::SchemaMismatch {
            expected: columns,
            found: row.len(),
        }),
        None => Ok(()),
    }
}

/// Copy column `index` out of a row-major matrix
pub fn column(matrix: &[Vec<f64>], index: usize) -> Vec<f64> {
    matrix.iter().map(|row| row[index]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, f64)]) -> DescriptorRecord {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_columns_follow_key_order() {
        let records = vec![
            record(&[("npix", 120.0), ("compact", 1.1), ("skew", 0.4)]),
            record(&[("npix", 80.0), ("compact", 1.6), ("skew", 2.0)]),
        ];
        let matrix = build_feature_matrix(&records, &keys(&["skew", "npix"])).unwrap();

        assert_eq!(matrix, vec![vec![0.4, 120.0], vec![2.0, 80.0]]);
    }

    #[test]
    fn test_missing_key_names_object_and_key() {
        let records = vec![
            record(&[("npix", 120.0), ("compact", 1.1)]),
            record(&[("npix", 80.0)]),
        ];
        let err = build_feature_matrix(&records, &keys(&["npix", "compact"])).unwrap_err();

        match err {
            ClassifierError::MissingDescriptor { object, key } => {
                assert_eq!(object, 1);
                assert_eq!(key, "compact");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nan_value_rejected() {
        let records = vec![record(&[("npix", f64::NAN)])];
        let err = build_feature_matrix(&records, &keys(&["npix"])).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidDescriptor { object: 0, .. }));
    }

    #[test]
    fn test_empty_records_give_empty_matrix() {
        let matrix = build_feature_matrix(&[], &keys(&["npix"])).unwrap();
        assert!(matrix.is_empty());
    }

    #[test]
    fn test_check_columns() {
        let matrix = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(
            check_columns(&matrix, 2),
            Err(ClassifierError::SchemaMismatch { expected: 2, found: 1 })
        ));
        assert!(check_columns(&matrix[..1], 2).is_ok());
    }
}
