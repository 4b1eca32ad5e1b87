//! Tests for feature scaling
//!
//! Scaler phải cho kết quả giống nhau giữa lúc train và lúc score.

#[cfg(test)]
mod scaler_tests {
    use crate::error::DetectorError;
    use crate::logic::features::StandardScaler;
    use ndarray::{array, Array2};

    #[test]
    fn test_transform_before_fit_fails() {
        let scaler = StandardScaler::new();
        let result = scaler.transform(&array![[1.0], [2.0]]);
        assert!(matches!(result, Err(DetectorError::UnfittedState { .. })));
        assert!(!scaler.is_fitted());
    }

    #[test]
    fn test_fit_computes_population_stats() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[1.0], [2.0], [3.0], [4.0]]).unwrap();

        let params = scaler.params().unwrap();
        assert_eq!(params.mean[0], 2.5);
        assert!((params.std[0] - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_transform_standardizes() {
        let x = array![[10.0], [20.0], [30.0]];
        let mut scaler = StandardScaler::new();
        let z = scaler.fit_transform(&x).unwrap();

        let mean = z.sum() / 3.0;
        let var = z.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 3.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_uses_stored_params() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[0.0], [2.0]]).unwrap();

        // Unseen data reuses the training mean/std
        let z = scaler.transform(&array![[5.0]]).unwrap();
        assert_eq!(z[[0, 0]], 4.0);

        // Repeated calls are independent of call order
        let again = scaler.transform(&array![[5.0]]).unwrap();
        assert_eq!(z, again);
    }

    #[test]
    fn test_zero_variance_does_not_divide_by_zero() {
        let mut scaler = StandardScaler::new();
        let z = scaler.fit_transform(&array![[7.0], [7.0], [7.0]]).unwrap();

        assert_eq!(scaler.params().unwrap().std[0], 1.0);
        assert!(z.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_column_mismatch_rejected() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[1.0], [2.0]]).unwrap();

        let result = scaler.transform(&array![[1.0, 2.0]]);
        assert!(matches!(result, Err(DetectorError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_empty_fit_rejected() {
        let mut scaler = StandardScaler::new();
        let result = scaler.fit(&Array2::<f64>::zeros((0, 1)));
        assert!(matches!(result, Err(DetectorError::InvalidConfiguration(_))));
    }
}
