//! Property tests for lookup and prediction bounds

use proptest::prelude::*;
use roiclass_core::deterministic::LcgRng;
use roiclass_core::{train_model, ClassifierConfig, LikelihoodEstimator, Model};
use std::sync::OnceLock;

fn model() -> &'static Model {
    static MODEL: OnceLock<Model> = OnceLock::new();
    MODEL.get_or_init(|| {
        let mut rng = LcgRng::new(1234);
        let matrix: Vec<Vec<f64>> = (0..150)
            .map(|_| vec![rng.next_f64() * 10.0, rng.next_f64(), rng.next_f64() * 100.0 - 50.0])
            .collect();
        let labels: Vec<f64> = matrix
            .iter()
            .map(|row| if row[0] + 3.0 * row[1] > 6.0 { 1.0 } else { 0.0 })
            .collect();
        let keys = vec!["area".to_string(), "compact".to_string(), "skew".to_string()];
        train_model(&matrix, &labels, &keys, &ClassifierConfig::default()).expect("training succeeds")
    })
}

fn estimator() -> &'static LikelihoodEstimator {
    &model().likelihood
}

proptest! {
    #[test]
    fn lookup_is_finite_for_any_value(value in any::<f64>(), descriptor in 0usize..3) {
        let log_odds = estimator().lookup(value, descriptor);
        prop_assert!(log_odds.is_finite());
    }

    #[test]
    fn lookup_clamps_outside_training_range(offset in 0.0f64..1e12, descriptor in 0usize..3) {
        let grid = &estimator().descriptors[descriptor].grid;
        let lo = grid[0];
        let hi = grid[grid.len() - 1];

        prop_assert_eq!(estimator().lookup(lo - offset, descriptor), estimator().lookup(lo, descriptor));
        prop_assert_eq!(estimator().lookup(hi + offset, descriptor), estimator().lookup(hi, descriptor));
    }

    #[test]
    fn predictions_are_probabilities(
        rows in prop::collection::vec(prop::collection::vec(-1e9f64..1e9, 3), 1..20)
    ) {
        let probabilities = model().predict_matrix(&rows).expect("matching schema");
        prop_assert_eq!(probabilities.len(), rows.len());
        for p in probabilities {
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }
}

#[test]
fn boundary_values_map_to_first_and_last_bin() {
    for table in &estimator().descriptors {
        let first = table.grid[0];
        let last = table.grid[table.grid.len() - 1];
        assert_eq!(table.bin_index(first), 0);
        assert_eq!(table.bin_index(last), table.rates.len() - 1);
    }
}

#[test]
fn grids_are_non_decreasing() {
    for table in &estimator().descriptors {
        assert!(table.grid.windows(2).all(|w| w[0] <= w[1]));
        assert!(table.rates.iter().all(|p| (0.0..=1.0).contains(p)));
    }
}
