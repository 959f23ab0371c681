use ace_analytic::{
    binary_entropy, cooccurrences_of, entropy_of, AnalyticOpts, AnalyticSolver, ClusterSolver,
    MAX_EXACT_CLUSTER,
};
use ace_core::{AceError, Cluster, CoocMatrix};
use nalgebra::DMatrix;

fn model() -> DMatrix<f64> {
    DMatrix::from_row_slice(
        4,
        4,
        &[
            0.5, -0.3, 0.1, 0.0, //
            -0.3, 0.2, -0.25, 0.05, //
            0.1, -0.25, -0.4, 0.15, //
            0.0, 0.05, 0.15, 0.3,
        ],
    )
}

#[test]
fn exact_fit_recovers_generating_model() {
    let truth = model();
    let cooc = CoocMatrix::new(cooccurrences_of(&truth).unwrap()).unwrap();
    let cluster = Cluster::new(0..4).unwrap();
    let fit = AnalyticSolver::default().solve_cluster(&cooc, &cluster).unwrap();
    for (fitted, expected) in fit.interactions.iter().zip(truth.iter()) {
        assert!((fitted - expected).abs() < 1e-6, "{fitted} vs {expected}");
    }
    assert!((fit.entropy - entropy_of(&truth).unwrap()).abs() < 1e-8);
}

#[test]
fn exact_fit_of_sub_cluster_matches_its_statistics() {
    let cooc = CoocMatrix::new(cooccurrences_of(&model()).unwrap()).unwrap();
    let cluster = Cluster::new([0, 2, 3]).unwrap();
    let fit = AnalyticSolver::default().solve_cluster(&cooc, &cluster).unwrap();
    let reproduced = cooccurrences_of(&fit.interactions).unwrap();
    let target = cooc.submatrix(&cluster);
    for (a, b) in reproduced.iter().zip(target.iter()) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn independent_triplet_fits_to_fields_only() {
    let p = [0.3, 0.5, 0.7];
    let rows: Vec<Vec<f64>> = (0..3)
        .map(|i| (0..3).map(|j| if i == j { p[i] } else { p[i] * p[j] }).collect())
        .collect();
    let cooc = CoocMatrix::from_rows(&rows).unwrap();
    let fit = AnalyticSolver::default()
        .solve_cluster(&cooc, &Cluster::new(0..3).unwrap())
        .unwrap();
    for a in 0..3 {
        for b in 0..3 {
            if a != b {
                assert!(fit.interactions[(a, b)].abs() < 1e-8);
            }
        }
    }
    let expected: f64 = p.iter().map(|&q| binary_entropy(q)).sum();
    assert!((fit.entropy - expected).abs() < 1e-10);
}

#[test]
fn prior_shrinks_couplings() {
    let cooc = CoocMatrix::new(cooccurrences_of(&model()).unwrap()).unwrap();
    let cluster = Cluster::new(0..4).unwrap();
    let free = AnalyticSolver::default().solve_cluster(&cooc, &cluster).unwrap();
    let shrunk = AnalyticSolver::new(AnalyticOpts {
        prior_strength: 50.0,
        num_samples: Some(100),
        ..AnalyticOpts::default()
    })
    .solve_cluster(&cooc, &cluster)
    .unwrap();
    let coupling_norm = |j: &DMatrix<f64>| {
        let mut total = 0.0;
        for a in 0..4 {
            for b in (a + 1)..4 {
                total += j[(a, b)] * j[(a, b)];
            }
        }
        total
    };
    assert!(coupling_norm(&shrunk.interactions) < coupling_norm(&free.interactions));
}

#[test]
fn oversized_clusters_are_unsupported() {
    let n = MAX_EXACT_CLUSTER + 1;
    let cooc = CoocMatrix::new(DMatrix::from_fn(n, n, |i, j| if i == j { 0.5 } else { 0.25 }))
        .unwrap();
    let err = AnalyticSolver::default()
        .solve_cluster(&cooc, &Cluster::new(0..n).unwrap())
        .unwrap_err();
    assert!(matches!(err, AceError::Unsupported(ref info) if info.code == "cluster-too-large"));
}

fn never_co_active() -> CoocMatrix {
    CoocMatrix::from_rows(&[vec![0.5, 0.0], vec![0.0, 0.25]]).unwrap()
}

#[test]
fn unobserved_joint_state_without_prior_is_flagged() {
    let err = AnalyticSolver::default()
        .solve_cluster(&never_co_active(), &Cluster::new([0, 1]).unwrap())
        .unwrap_err();
    assert!(matches!(err, AceError::Numerical(ref info) if info.code == "degenerate-pair"));
}

#[test]
fn prior_keeps_unobserved_joint_state_finite() {
    let solver = AnalyticSolver::new(AnalyticOpts {
        prior_strength: 10.0,
        num_samples: Some(8),
        ..AnalyticOpts::default()
    });
    let fit = solver
        .solve_cluster(&never_co_active(), &Cluster::new([0, 1]).unwrap())
        .unwrap();
    assert!(fit.entropy.is_finite());
    assert!(fit.interactions.iter().all(|v| v.is_finite()));
    // never both active: the prior-limited coupling is repulsive
    assert!(fit.interactions[(0, 1)] > 0.0);
    let reproduced = cooccurrences_of(&fit.interactions).unwrap();
    assert!((reproduced[(0, 0)] - 0.5).abs() < 1e-8);
    assert!((reproduced[(1, 1)] - 0.25).abs() < 1e-8);
    assert!(reproduced[(0, 1)] > 0.0 && reproduced[(0, 1)] < 0.125);
}

#[test]
fn prior_reaches_degenerate_pairs_inside_larger_clusters() {
    let cooc = CoocMatrix::from_rows(&[
        vec![0.5, 0.0, 0.2],
        vec![0.0, 0.25, 0.1],
        vec![0.2, 0.1, 0.4],
    ])
    .unwrap();
    let cluster = Cluster::new(0..3).unwrap();
    assert!(AnalyticSolver::default().solve_cluster(&cooc, &cluster).is_err());

    let solver = AnalyticSolver::new(AnalyticOpts {
        prior_strength: 1.0,
        ..AnalyticOpts::default()
    });
    let fit = solver.solve_cluster(&cooc, &cluster).unwrap();
    assert!(fit.entropy.is_finite());
    assert!(fit.interactions.iter().all(|v| v.is_finite()));
}
