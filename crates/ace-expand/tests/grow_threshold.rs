use std::collections::BTreeSet;

use ace_analytic::{cooccurrences_of, AnalyticSolver};
use ace_core::{AceError, Cluster, CoocMatrix, SampleMatrix};
use ace_expand::{grow, solve, solve_cooc, AceConfig, ClusterRegistry, Decomposer, ReferenceMode};
use nalgebra::DMatrix;

fn dense_model() -> CoocMatrix {
    let j = DMatrix::from_fn(5, 5, |a, b| {
        if a == b {
            0.3 - 0.15 * a as f64
        } else {
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            0.12 * ((lo + 2 * hi) % 5) as f64 - 0.25
        }
    });
    CoocMatrix::new(cooccurrences_of(&j).unwrap()).unwrap()
}

fn independent(p: &[f64]) -> CoocMatrix {
    let rows: Vec<Vec<f64>> = (0..p.len())
        .map(|i| {
            (0..p.len())
                .map(|j| if i == j { p[i] } else { p[i] * p[j] })
                .collect()
        })
        .collect();
    CoocMatrix::from_rows(&rows).unwrap()
}

fn survivors(cooc: &CoocMatrix, threshold: f64) -> BTreeSet<Cluster> {
    let solver = AnalyticSolver::default();
    let decomposer = Decomposer::new(cooc, &solver, ReferenceMode::Independent);
    let mut registry = ClusterRegistry::new(cooc.dim(), ReferenceMode::Independent);
    let variables = Cluster::new(0..cooc.dim()).unwrap();
    grow(&decomposer, &mut registry, &variables, threshold, None)
        .unwrap()
        .clusters()
        .cloned()
        .collect()
}

#[test]
fn lower_thresholds_keep_every_cluster_of_higher_ones() {
    let cooc = dense_model();
    let thresholds = [0.05, 0.01, 1e-3, 1e-5];
    let sets: Vec<_> = thresholds.iter().map(|&t| survivors(&cooc, t)).collect();
    for pair in sets.windows(2) {
        assert!(pair[1].is_superset(&pair[0]));
    }
    assert!(sets[3].len() > 5);
}

#[test]
fn independent_variables_stop_after_singletons() {
    let p = [0.3, 0.5, 0.7];
    let cooc = independent(&p);
    let mut registry = ClusterRegistry::new(3, ReferenceMode::Independent);
    let solution = solve_cooc(
        &cooc,
        &AceConfig::new(0.01),
        &AnalyticSolver::default(),
        &mut registry,
    )
    .unwrap();

    assert_eq!(solution.growth.generations.len(), 1);
    assert_eq!(solution.growth.generations[0].clusters.len(), 3);
    assert!(!solution.growth.truncated);
    for i in 0..3 {
        let expected = -(p[i] / (1.0 - p[i])).ln();
        assert!((solution.interactions[(i, i)] - expected).abs() < 1e-12);
        for j in 0..3 {
            if i != j {
                assert!(solution.interactions[(i, j)].abs() < 1e-9);
            }
        }
    }
    // every pair was evaluated and rejected
    assert_eq!(registry.len(), 6);
}

#[test]
fn perfectly_correlated_pair_is_a_numerical_error() {
    let cooc = CoocMatrix::from_rows(&[vec![0.5, 0.5], vec![0.5, 0.5]]).unwrap();
    let mut registry = ClusterRegistry::new(2, ReferenceMode::Independent);
    let err = solve_cooc(
        &cooc,
        &AceConfig::new(0.01),
        &AnalyticSolver::default(),
        &mut registry,
    )
    .unwrap_err();
    assert!(matches!(err, AceError::Numerical(_)));
    assert!(err.is_numerical());
}

#[test]
fn cluster_size_cap_truncates_growth() {
    let cooc = dense_model();
    let mut config = AceConfig::new(1e-6);
    config.max_cluster_size = Some(2);
    let mut registry = ClusterRegistry::new(5, ReferenceMode::Independent);
    let solution = solve_cooc(&cooc, &config, &AnalyticSolver::default(), &mut registry).unwrap();
    assert!(solution.growth.truncated);
    assert_eq!(solution.growth.max_cluster_size(), 2);
    assert!(registry.iter().all(|(cluster, _)| cluster.len() <= 2));
}

#[test]
fn full_expansion_reproduces_the_exact_model() {
    let j = DMatrix::from_row_slice(
        3,
        3,
        &[
            0.2, -0.4, 0.15, //
            -0.4, -0.1, 0.3, //
            0.15, 0.3, 0.35,
        ],
    );
    let cooc = CoocMatrix::new(cooccurrences_of(&j).unwrap()).unwrap();
    let mut registry = ClusterRegistry::new(3, ReferenceMode::Independent);
    let solution = solve_cooc(
        &cooc,
        &AceConfig::new(1e-12),
        &AnalyticSolver::default(),
        &mut registry,
    )
    .unwrap();
    assert_eq!(solution.growth.max_cluster_size(), 3);
    for (fitted, truth) in solution.interactions.iter().zip(j.iter()) {
        assert!((fitted - truth).abs() < 1e-6, "{fitted} vs {truth}");
    }
}

#[test]
fn restricted_variables_confine_the_expansion() {
    let cooc = dense_model();
    let mut config = AceConfig::new(1e-6);
    config.cluster = Some(vec![3, 0, 4]);
    let mut registry = ClusterRegistry::new(5, ReferenceMode::Independent);
    let solution = solve_cooc(&cooc, &config, &AnalyticSolver::default(), &mut registry).unwrap();
    for cluster in solution.growth.clusters() {
        assert!(cluster.indices().iter().all(|i| [0, 3, 4].contains(i)));
    }
    for i in [1, 2] {
        for j in 0..5 {
            assert_eq!(solution.interactions[(i, j)], 0.0);
        }
    }
}

#[test]
fn warm_registry_is_reused_across_thresholds() {
    let cooc = dense_model();
    let solver = AnalyticSolver::default();
    let mut registry = ClusterRegistry::new(5, ReferenceMode::Independent);
    solve_cooc(&cooc, &AceConfig::new(1e-3), &solver, &mut registry).unwrap();
    let evaluated = registry.len();
    let again = solve_cooc(&cooc, &AceConfig::new(1e-3), &solver, &mut registry).unwrap();
    assert_eq!(registry.len(), evaluated);
    assert!(again.growth.num_clusters() >= 5);
}

#[test]
fn warm_registry_refuses_a_different_prior() {
    let cooc = dense_model();
    let mut registry = ClusterRegistry::new(5, ReferenceMode::Independent);
    solve_cooc(&cooc, &AceConfig::new(1e-3), &AnalyticSolver::default(), &mut registry).unwrap();

    let mut config = AceConfig::new(1e-3);
    config.prior_strength = 5.0;
    let regularised = AnalyticSolver::new(config.analytic_opts());
    let err = solve_cooc(&cooc, &config, &regularised, &mut registry).unwrap_err();
    assert!(matches!(err, AceError::Configuration(ref info) if info.code == "registry-mismatch"));

    let mut fresh = ClusterRegistry::new(5, ReferenceMode::Independent);
    assert!(solve_cooc(&cooc, &config, &regularised, &mut fresh).is_ok());
}

fn sparse_samples() -> SampleMatrix {
    // variables 0 and 1 are never active together
    SampleMatrix::from_bits(&[
        [1i8, 0, 1],
        [1, 0, 0],
        [0, 1, 1],
        [0, 1, 0],
        [0, 0, 1],
        [0, 0, 0],
        [1, 0, 1],
        [0, 1, 0],
    ])
    .unwrap()
}

#[test]
fn never_co_active_pair_needs_a_prior() {
    let err = solve(&sparse_samples(), &AceConfig::new(0.01)).unwrap_err();
    assert!(matches!(err, AceError::Numerical(ref info) if info.code == "degenerate-pair"));
}

#[test]
fn never_co_active_pair_solves_with_a_prior() {
    let mut config = AceConfig::new(0.01);
    config.prior_strength = 10.0;
    let params = solve(&sparse_samples(), &config).unwrap();
    assert_eq!(params.dim(), 3);
    assert!(params.to_vec().iter().all(|v| v.is_finite()));
}

fn two_disjoint_pairs() -> CoocMatrix {
    let p = [0.4, 0.5, 0.3, 0.6];
    let rows: Vec<Vec<f64>> = (0..4)
        .map(|i| {
            (0..4)
                .map(|j| match (i.min(j), i.max(j)) {
                    (a, b) if a == b => p[a],
                    (0, 1) => 0.3,
                    (2, 3) => 0.25,
                    (a, b) => p[a] * p[b],
                })
                .collect()
        })
        .collect();
    CoocMatrix::from_rows(&rows).unwrap()
}

#[test]
fn cap_without_pending_unions_is_not_truncation() {
    let cooc = two_disjoint_pairs();
    let mut config = AceConfig::new(1e-6);
    config.max_cluster_size = Some(2);
    let mut registry = ClusterRegistry::new(4, ReferenceMode::Independent);
    let solution = solve_cooc(&cooc, &config, &AnalyticSolver::default(), &mut registry).unwrap();
    assert_eq!(solution.growth.generations.len(), 2);
    assert_eq!(
        solution.growth.generations[1].clusters,
        vec![Cluster::new([0, 1]).unwrap(), Cluster::new([2, 3]).unwrap()]
    );
    assert!(!solution.growth.truncated);

    config.max_cluster_size = Some(1);
    let mut registry = ClusterRegistry::new(4, ReferenceMode::Independent);
    let solution = solve_cooc(&cooc, &config, &AnalyticSolver::default(), &mut registry).unwrap();
    assert!(solution.growth.truncated);
    assert!(registry.iter().all(|(cluster, _)| cluster.len() == 1));
}
