use house_price_estimator::{ForestConfig, MaxFeatures, PriceAdjuster, RandomForestRegressor};
use proptest::prelude::*;

proptest! {
    #[test]
    fn adjuster_is_total_and_positive(property_type in ".*", raw in 0.0f64..10_000.0) {
        let adjuster = PriceAdjuster::default();
        let multiplier = adjuster.multiplier(&property_type);

        prop_assert!(multiplier == 1.25 || multiplier == 1.15 || multiplier == 0.95);
        prop_assert_eq!(adjuster.adjust(raw, &property_type), raw * multiplier);
    }
}

proptest! {
    #[test]
    fn unknown_property_types_get_default(property_type in "[a-z ]{0,24}") {
        // Lowercase only, so never one of the capitalised rule keys
        let adjuster = PriceAdjuster::default();
        prop_assert_eq!(adjuster.multiplier(&property_type), 0.95);
    }
}

fn training_rows() -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    prop::collection::vec((0.0f64..100.0, -50.0f64..50.0, 1.0f64..500.0), 2..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn forest_predictions_stay_within_target_range(
        rows in training_rows(),
        query in (0.0f64..100.0, -50.0f64..50.0),
        seed in any::<u64>(),
    ) {
        let features: Vec<Vec<f64>> = rows.iter().map(|(a, b, _)| vec![*a, *b]).collect();
        let targets: Vec<f64> = rows.iter().map(|(_, _, y)| *y).collect();
        let config = ForestConfig {
            n_estimators: 8,
            max_features: MaxFeatures::All,
            seed,
            ..ForestConfig::default()
        };

        let forest = RandomForestRegressor::fit(&config, &features, &targets).unwrap();
        let prediction = forest.predict(&[query.0, query.1]).unwrap();

        let min = targets.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = targets.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(prediction >= min - 1e-9 && prediction <= max + 1e-9);

        let again = RandomForestRegressor::fit(&config, &features, &targets).unwrap();
        prop_assert_eq!(prediction, again.predict(&[query.0, query.1]).unwrap());
    }
}
