use ace_analytic::{
    binary_entropy, cooccurrences_of, entropy_of, field_from_frequency, AnalyticSolver,
    ClusterSolver,
};
use ace_core::{AceError, Cluster, CoocMatrix};
use nalgebra::DMatrix;

fn pair_model() -> DMatrix<f64> {
    DMatrix::from_row_slice(2, 2, &[0.4, -0.35, -0.35, -0.2])
}

#[test]
fn singleton_field_reproduces_frequency() {
    let field = field_from_frequency(0.3);
    let j = DMatrix::from_element(1, 1, field);
    let cooc = cooccurrences_of(&j).unwrap();
    assert!((cooc[(0, 0)] - 0.3).abs() < 1e-12);
    assert!((entropy_of(&j).unwrap() - binary_entropy(0.3)).abs() < 1e-12);
}

#[test]
fn pair_formula_inverts_model_statistics() {
    let model = pair_model();
    let cooc = CoocMatrix::new(cooccurrences_of(&model).unwrap()).unwrap();
    let fit = AnalyticSolver::default()
        .solve_cluster(&cooc, &Cluster::new([0, 1]).unwrap())
        .unwrap();
    for (fitted, expected) in fit.interactions.iter().zip(model.iter()) {
        assert!((fitted - expected).abs() < 1e-9, "{fitted} vs {expected}");
    }
    assert!((fit.entropy - entropy_of(&model).unwrap()).abs() < 1e-12);
}

#[test]
fn independent_pair_has_no_coupling() {
    let cooc = CoocMatrix::from_rows(&[vec![0.3, 0.3 * 0.7], vec![0.3 * 0.7, 0.7]]).unwrap();
    let fit = AnalyticSolver::default()
        .solve_cluster(&cooc, &Cluster::new([0, 1]).unwrap())
        .unwrap();
    assert!(fit.interactions[(0, 1)].abs() < 1e-12);
    let expected = binary_entropy(0.3) + binary_entropy(0.7);
    assert!((fit.entropy - expected).abs() < 1e-12);
}

#[test]
fn perfectly_correlated_pair_is_flagged() {
    let cooc = CoocMatrix::from_rows(&[vec![0.5, 0.5], vec![0.5, 0.5]]).unwrap();
    let err = AnalyticSolver::default()
        .solve_cluster(&cooc, &Cluster::new([0, 1]).unwrap())
        .unwrap_err();
    assert!(err.is_numerical());
    assert_eq!(err.info().code, "degenerate-pair");
}

#[test]
fn constant_variable_is_flagged() {
    let cooc = CoocMatrix::from_rows(&[vec![1.0]]).unwrap();
    let err = AnalyticSolver::default()
        .solve_cluster(&cooc, &Cluster::singleton(0))
        .unwrap_err();
    assert!(matches!(err, AceError::Numerical(ref info) if info.code == "degenerate-frequency"));
}

#[test]
fn empty_cluster_is_rejected() {
    let cooc = CoocMatrix::from_rows(&[vec![0.4]]).unwrap();
    let err = AnalyticSolver::default()
        .solve_cluster(&cooc, &Cluster::new(Vec::new()).unwrap())
        .unwrap_err();
    assert!(matches!(err, AceError::Input(_)));
}

proptest::proptest! {
    #[test]
    fn pair_formula_recovers_any_moderate_model(
        hi in -2.0f64..2.0,
        hj in -2.0f64..2.0,
        coupling in -1.5f64..1.5,
    ) {
        let model = DMatrix::from_row_slice(2, 2, &[hi, coupling, coupling, hj]);
        let cooc = CoocMatrix::new(cooccurrences_of(&model).unwrap()).unwrap();
        let fit = AnalyticSolver::default()
            .solve_cluster(&cooc, &Cluster::new([0, 1]).unwrap())
            .unwrap();
        for (fitted, expected) in fit.interactions.iter().zip(model.iter()) {
            proptest::prop_assert!((fitted - expected).abs() < 1e-8);
        }
    }
}

#[test]
fn solver_options_fill_defaults_from_json() {
    let opts: ace_analytic::AnalyticOpts =
        serde_json::from_str(r#"{"prior_strength": 0.5}"#).unwrap();
    assert_eq!(opts.prior_strength, 0.5);
    assert_eq!(opts.num_samples, None);
    assert_eq!(opts.max_iters, 200);
    assert_eq!(opts.tolerance, 1e-10);
}
