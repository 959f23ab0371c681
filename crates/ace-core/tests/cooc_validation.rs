use ace_core::{AceError, Cluster, CoocMatrix, SampleMatrix};
use nalgebra::DMatrix;

#[test]
fn rejects_non_square() {
    let err = CoocMatrix::new(DMatrix::from_element(2, 3, 0.1)).unwrap_err();
    assert!(matches!(err, AceError::Input(ref info) if info.code == "non-square-cooc"));
}

#[test]
fn rejects_asymmetric() {
    let err = CoocMatrix::from_rows(&[vec![0.5, 0.2], vec![0.3, 0.5]]).unwrap_err();
    assert!(matches!(err, AceError::Input(ref info) if info.code == "asymmetric-cooc"));
}

#[test]
fn tolerates_rounding_asymmetry() {
    let cooc = CoocMatrix::from_rows(&[vec![0.5, 0.2], vec![0.2 + 1e-13, 0.5]]);
    assert!(cooc.is_ok());
}

#[test]
fn rejects_pair_above_marginal() {
    let err = CoocMatrix::from_rows(&[vec![0.2, 0.3], vec![0.3, 0.5]]).unwrap_err();
    assert!(matches!(err, AceError::Input(ref info) if info.code == "cooc-exceeds-marginal"));
}

#[test]
fn rejects_out_of_range_and_nan() {
    assert!(CoocMatrix::from_rows(&[vec![1.2]]).is_err());
    assert!(CoocMatrix::from_rows(&[vec![f64::NAN]]).is_err());
}

#[test]
fn spins_map_to_frequencies() {
    let samples = SampleMatrix::from_spins(&[[1i8, -1, 1], [1, 1, -1], [-1, -1, -1], [1, 1, 1]])
        .unwrap();
    let cooc = CoocMatrix::from_samples(&samples).unwrap();
    assert_eq!(cooc.dim(), 3);
    assert!((cooc.frequency(0) - 0.75).abs() < 1e-15);
    assert!((cooc.frequency(1) - 0.5).abs() < 1e-15);
    assert!((cooc.pair(0, 1) - 0.5).abs() < 1e-15);
    assert!((cooc.pair(1, 2) - 0.25).abs() < 1e-15);
    assert_eq!(cooc.pair(0, 2), cooc.pair(2, 0));
}

#[test]
fn invalid_sample_values_are_rejected() {
    assert!(SampleMatrix::from_spins(&[[0i8, 1]]).is_err());
    assert!(SampleMatrix::from_bits(&[[-1i8, 1]]).is_err());
    assert!(SampleMatrix::from_bits(&[vec![0i8, 1], vec![1]]).is_err());
}

#[test]
fn submatrix_follows_canonical_order() {
    let cooc = CoocMatrix::from_rows(&[
        vec![0.5, 0.2, 0.1],
        vec![0.2, 0.4, 0.15],
        vec![0.1, 0.15, 0.3],
    ])
    .unwrap();
    let cluster = Cluster::new([2, 0]).unwrap();
    let sub = cooc.submatrix(&cluster);
    assert_eq!(sub[(0, 0)], 0.5);
    assert_eq!(sub[(1, 1)], 0.3);
    assert_eq!(sub[(0, 1)], 0.1);
    assert!(cooc.check_cluster(&Cluster::new([0, 3]).unwrap()).is_err());
}

#[test]
fn fingerprint_follows_the_entries() {
    let a = CoocMatrix::from_rows(&[vec![0.5, 0.2], vec![0.2, 0.4]]).unwrap();
    let same = CoocMatrix::from_rows(&[vec![0.5, 0.2], vec![0.2, 0.4]]).unwrap();
    let shifted = CoocMatrix::from_rows(&[vec![0.5, 0.21], vec![0.21, 0.4]]).unwrap();
    assert_eq!(a.fingerprint(), same.fingerprint());
    assert_ne!(a.fingerprint(), shifted.fingerprint());
}
