use ace_analytic::{cooccurrences_of, AnalyticSolver, MAX_ENUMERATION, MAX_EXACT_CLUSTER};
use ace_core::errors::{AceError, ErrorInfo};
use ace_core::{Cluster, CoocMatrix};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::assemble::IsingParams;
use crate::config::{AceConfig, ResidualWeighting};
use crate::registry::ClusterRegistry;
use crate::solve::solve_cooc;

/// Root-mean-square z-scores of model against data statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidualErrors {
    /// Frequency residual error.
    pub eps_p: f64,
    /// Pair co-occurrence residual error; zero for a single variable.
    pub eps_c: f64,
}

impl ResidualErrors {
    fn total(&self) -> f64 {
        self.eps_p + self.eps_c
    }
}

/// One threshold at which the number of retained clusters grew.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepStep {
    /// Threshold used for this step.
    pub threshold: f64,
    /// Retained clusters, singletons included.
    pub num_clusters: usize,
    /// Largest retained cluster.
    pub max_cluster_size: usize,
    /// Entropy estimate at this threshold.
    pub entropy: f64,
    /// Fitted parameters at this threshold.
    pub params: IsingParams,
    /// Model/data residuals.
    pub errors: ResidualErrors,
    /// Growth hit the cluster size cap.
    pub truncated: bool,
}

/// Why the sweep stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SweepStop {
    /// Both residual errors fell below `eps_threshold`.
    Converged,
    /// The threshold dropped below `min_threshold`.
    MinThreshold,
    /// The largest retained cluster exceeded `max_max_cluster_size`.
    MaxClusterSize,
    /// Every threshold was tried.
    Exhausted,
}

/// Result of a threshold sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutcome {
    /// Recorded steps in decreasing threshold order.
    pub steps: Vec<SweepStep>,
    /// Index into `steps` of the model the sweep settled on.
    pub selected: usize,
    /// Stop condition.
    pub stop: SweepStop,
    /// Registry shared by every step.
    pub registry: ClusterRegistry,
}

impl SweepOutcome {
    /// The step the sweep settled on.
    pub fn selected_step(&self) -> &SweepStep {
        &self.steps[self.selected]
    }
}

/// `count` thresholds spaced evenly in `log10` over `range`, largest first.
pub fn log_thresholds(range: (f64, f64), count: usize) -> Vec<f64> {
    let (low, high) = range;
    let mut thresholds: Vec<f64> = match count {
        0 => Vec::new(),
        1 => vec![10f64.powf(low)],
        _ => {
            let step = (high - low) / (count - 1) as f64;
            (0..count)
                .map(|i| 10f64.powf(low + step * i as f64))
                .collect()
        }
    };
    thresholds.reverse();
    thresholds
}

/// Frequency and co-occurrence residual errors of `interactions` on `variables`.
///
/// Each residual is scored against the sampling standard deviation
/// `sqrt(p (1 - p) / num_samples)` of the observed value, floored at the
/// resolution of a single sample.
pub fn residual_errors(
    data: &CoocMatrix,
    interactions: &DMatrix<f64>,
    variables: &Cluster,
    num_samples: usize,
) -> Result<ResidualErrors, AceError> {
    let k = variables.len();
    let mut local = DMatrix::<f64>::zeros(k, k);
    for (a, &i) in variables.indices().iter().enumerate() {
        for (b, &j) in variables.indices().iter().enumerate() {
            local[(a, b)] = interactions[(i, j)];
        }
    }
    let model = cooccurrences_of(&local)?;
    let observed = data.submatrix(variables);
    let count = num_samples as f64;
    let z = |a: usize, b: usize| {
        let p = observed[(a, b)];
        let stdev = (p * (1.0 - p) / count).sqrt().max(1.0 / count);
        (model[(a, b)] - p) / stdev
    };

    let eps_p = ((0..k).map(|a| z(a, a).powi(2)).sum::<f64>() / k as f64).sqrt();
    let pairs = k * k.saturating_sub(1) / 2;
    let eps_c = if pairs == 0 {
        0.0
    } else {
        let sum: f64 = (0..k)
            .flat_map(|a| ((a + 1)..k).map(move |b| (a, b)))
            .map(|(a, b)| z(a, b).powi(2))
            .sum();
        (sum / pairs as f64).sqrt()
    };
    if !eps_p.is_finite() || !eps_c.is_finite() {
        return Err(AceError::numerical(
            "non-finite-residual",
            "residual errors are not finite",
        ));
    }
    Ok(ResidualErrors { eps_p, eps_c })
}

/// Repeats the expansion over decreasing thresholds until the fitted model
/// reproduces the data within sampling error.
///
/// All steps share one registry, so each cluster is solved once for the
/// whole sweep.
pub fn sweep(cooc: &CoocMatrix, config: &AceConfig) -> Result<SweepOutcome, AceError> {
    config.validate()?;
    let settings = &config.sweep;
    if settings.residual == ResidualWeighting::Covariance {
        return Err(AceError::Unsupported(
            ErrorInfo::new(
                "covariance-residuals",
                "covariance-weighted residuals are not supported",
            )
            .with_hint("use residual: independent"),
        ));
    }
    let Some(num_samples) = config.num_samples else {
        return Err(AceError::configuration(
            "missing-num-samples",
            "threshold sweeps need num_samples to score residuals",
        ));
    };
    let (low, high) = settings.log_threshold_range;
    if !low.is_finite() || !high.is_finite() || low > high {
        return Err(AceError::Configuration(
            ErrorInfo::new("invalid-threshold-range", "log threshold range must be finite and ordered")
                .with_context("low", low.to_string())
                .with_context("high", high.to_string()),
        ));
    }
    let thresholds = log_thresholds(settings.log_threshold_range, settings.num_thresholds);
    if thresholds.is_empty() {
        return Err(AceError::configuration(
            "no-thresholds",
            "num_thresholds must be positive",
        ));
    }
    let variables = config.variables(cooc.dim())?;
    if variables.len() > MAX_ENUMERATION {
        return Err(AceError::Unsupported(
            ErrorInfo::new(
                "sweep-too-large",
                "residual scoring enumerates every state of the fitted model",
            )
            .with_context("variables", variables.len().to_string())
            .with_context("max", MAX_ENUMERATION.to_string()),
        ));
    }

    let effective = effective_config(cooc, config);
    let max_max = settings.max_max_cluster_size.unwrap_or(variables.len());
    let cap = (max_max + 1).min(MAX_EXACT_CLUSTER);
    let solver = AnalyticSolver::new(effective.analytic_opts());
    let mut registry = ClusterRegistry::new(cooc.dim(), effective.reference_mode()?);

    let mut steps: Vec<SweepStep> = Vec::new();
    let mut best: Option<(usize, f64)> = None;
    let mut previous = 0;
    for threshold in thresholds {
        let mut step_config = effective.clone();
        step_config.threshold = threshold;
        step_config.max_cluster_size = Some(config.max_cluster_size.map_or(cap, |c| c.min(cap)));
        let solution = solve_cooc(cooc, &step_config, &solver, &mut registry)?;
        let num_clusters = solution.growth.num_clusters();
        if num_clusters <= previous {
            debug!(threshold, num_clusters, "no new clusters");
            continue;
        }
        previous = num_clusters;

        let errors = residual_errors(cooc, &solution.interactions, &variables, num_samples)?;
        let max_cluster_size = solution.growth.max_cluster_size();
        info!(
            threshold,
            num_clusters,
            max_cluster_size,
            eps_p = errors.eps_p,
            eps_c = errors.eps_c,
            "sweep step"
        );
        let index = steps.len();
        steps.push(SweepStep {
            threshold,
            num_clusters,
            max_cluster_size,
            entropy: solution.entropy,
            params: solution.params,
            errors,
            truncated: solution.growth.truncated,
        });
        if best.map_or(true, |(_, total)| errors.total() < total) {
            best = Some((index, errors.total()));
        }
        let best_index = best.map_or(index, |(i, _)| i);

        if errors.eps_p < settings.eps_threshold && errors.eps_c < settings.eps_threshold {
            return Ok(finish(steps, index, SweepStop::Converged, registry));
        }
        if threshold < settings.min_threshold {
            return Ok(finish(steps, best_index, SweepStop::MinThreshold, registry));
        }
        if max_cluster_size > max_max {
            return Ok(finish(steps, best_index, SweepStop::MaxClusterSize, registry));
        }
    }
    let selected = best.map_or(0, |(i, _)| i);
    Ok(finish(steps, selected, SweepStop::Exhausted, registry))
}

fn finish(
    steps: Vec<SweepStep>,
    selected: usize,
    stop: SweepStop,
    registry: ClusterRegistry,
) -> SweepOutcome {
    info!(
        ?stop,
        steps = steps.len(),
        threshold = steps.get(selected).map(|step| step.threshold),
        "sweep finished"
    );
    SweepOutcome {
        steps,
        selected,
        stop,
        registry,
    }
}

/// Applies the non-interacting prior, when configured, to both priors.
fn effective_config(cooc: &CoocMatrix, config: &AceConfig) -> AceConfig {
    let mut effective = config.clone();
    if let Some(gamma) = config.sweep.noninteracting_prior {
        let freqs = cooc.frequencies();
        let mean = freqs.iter().sum::<f64>() / freqs.len() as f64;
        let strength = gamma / (mean.powi(2) * (1.0 - mean).powi(2));
        effective.prior_strength = strength;
        if effective.mean_field_prior_strength.is_none() {
            effective.mean_field_prior_strength = Some(strength);
        }
        debug!(gamma, strength, "non-interacting prior applied");
    }
    effective
}
