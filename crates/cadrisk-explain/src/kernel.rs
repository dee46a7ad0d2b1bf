//! Kernel SHAP explainer.
//!
//! For one explained row `x` and a background sample `B`:
//!
//! 1. `base = mean_b f(b)` and `fx = f(x)`.
//! 2. Features where `x` equals every background row cannot change the
//!    output and get zero contribution.
//! 3. For each coalition `z` over the remaining `k` features,
//!    `v(z) = mean_b f(x_z ∪ b_¬z)`.
//! 4. Contributions solve the Shapley-kernel weighted regression of `v` on
//!    `z` under the constraint `Σ φ = fx − base`.
//!
//! With `2^k − 2 ≤ max_coalitions` every coalition is enumerated and the
//! result equals the exact Shapley values of the game `v`. Above that, a
//! seeded sample of coalitions is used. Additivity holds exactly in both
//! modes because it is a constraint, not an estimate.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use cadrisk_contracts::{
    attribution::{Attribution, BackgroundSample, FeatureContribution},
    error::{CadError, CadResult},
};
use cadrisk_core::traits::{Classifier, Explainer};

use crate::coalition::{self, Coalition};
use crate::solve::solve_constrained;

/// Which model output the contributions decompose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExplainedOutput {
    /// Probability of class 1.
    #[default]
    Probability,
    /// Hard 0/1 decision.
    Label,
}

impl ExplainedOutput {
    fn eval(self, model: &dyn Classifier, row: &[f64]) -> CadResult<f64> {
        let value = match self {
            ExplainedOutput::Probability => model.score(row)?,
            ExplainedOutput::Label => f64::from(model.label(row)?.class()),
        };
        if !value.is_finite() {
            return Err(CadError::Explanation {
                reason: format!("model produced non-finite output {value}"),
            });
        }
        Ok(value)
    }
}

/// Tuning knobs of the explainer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelConfig {
    /// Background rows kept after subsampling.
    pub background_size: usize,
    /// Enumerate all coalitions up to this many; sample beyond it.
    pub max_coalitions: usize,
    /// Seed for background subsampling and coalition sampling.
    pub seed: u64,
    /// Wall-clock limit for one `explain` call.
    pub timeout: Option<Duration>,
    pub output: ExplainedOutput,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            background_size: 100,
            max_coalitions: 2048,
            seed: 0,
            timeout: None,
            output: ExplainedOutput::Probability,
        }
    }
}

/// Model-agnostic explainer over a fixed background sample.
#[derive(Debug, Clone)]
pub struct KernelExplainer {
    background: Vec<Vec<f64>>,
    width: usize,
    config: KernelConfig,
}

impl KernelExplainer {
    /// Build an explainer, subsampling the background if it is larger than
    /// `config.background_size`.
    ///
    /// Fails with `CadError::Explanation` when the background is empty.
    pub fn new(sample: &BackgroundSample, config: KernelConfig) -> CadResult<Self> {
        if sample.is_empty() {
            return Err(CadError::Explanation {
                reason: "background sample is empty".to_string(),
            });
        }
        if config.background_size == 0 {
            return Err(CadError::Explanation {
                reason: "background size must be at least 1".to_string(),
            });
        }

        let rows = sample.rows();
        let background = if rows.len() > config.background_size {
            let mut rng = StdRng::seed_from_u64(config.seed);
            let mut picked: Vec<usize> =
                rand::seq::index::sample(&mut rng, rows.len(), config.background_size).into_vec();
            // Keep training-file order so the summary stays readable in logs.
            picked.sort_unstable();
            picked.into_iter().map(|i| rows[i].clone()).collect()
        } else {
            rows.to_vec()
        };

        debug!(
            available = rows.len(),
            kept = background.len(),
            seed = config.seed,
            "background sample prepared"
        );

        Ok(Self {
            background,
            width: sample.width(),
            config,
        })
    }

    pub fn background(&self) -> &[Vec<f64>] {
        &self.background
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    fn mean_output(&self, model: &dyn Classifier, rows: impl Iterator<Item = Vec<f64>>) -> CadResult<f64> {
        let mut sum = 0.0;
        let mut n = 0usize;
        for row in rows {
            sum += self.config.output.eval(model, &row)?;
            n += 1;
        }
        Ok(sum / n as f64)
    }

    fn check_deadline(&self, started: Instant) -> CadResult<()> {
        if let Some(limit) = self.config.timeout {
            let elapsed = started.elapsed();
            if elapsed >= limit {
                return Err(CadError::ExplanationTimeout {
                    elapsed_ms: elapsed.as_millis(),
                    limit_ms: limit.as_millis(),
                });
            }
        }
        Ok(())
    }

    fn plan(&self, k: usize) -> Vec<Coalition> {
        if coalition::coalition_count(k) <= self.config.max_coalitions {
            coalition::enumerate(k)
        } else {
            let mut rng = StdRng::seed_from_u64(self.config.seed);
            coalition::sample(k, self.config.max_coalitions, &mut rng)
        }
    }
}

impl Explainer for KernelExplainer {
    fn explain(
        &self,
        model: &dyn Classifier,
        row: &[f64],
        feature_names: &[String],
    ) -> CadResult<Attribution> {
        let started = Instant::now();

        if row.len() != self.width {
            return Err(CadError::Explanation {
                reason: format!(
                    "row has {} features but the background has {}",
                    row.len(),
                    self.width
                ),
            });
        }
        if feature_names.len() != row.len() {
            return Err(CadError::Explanation {
                reason: format!(
                    "{} feature names given for {} features",
                    feature_names.len(),
                    row.len()
                ),
            });
        }

        let fx = self.config.output.eval(model, row)?;
        let base = self.mean_output(model, self.background.iter().cloned())?;

        let varying: Vec<usize> = (0..row.len())
            .filter(|&j| self.background.iter().any(|b| (b[j] - row[j]).abs() > 1e-12))
            .collect();

        let mut phi = vec![0.0; row.len()];
        match varying.len() {
            0 => {}
            1 => phi[varying[0]] = fx - base,
            k => {
                let plan = self.plan(k);
                let mut values = Vec::with_capacity(plan.len());
                for coalition in &plan {
                    self.check_deadline(started)?;
                    let synthetic = self.background.iter().map(|b| {
                        let mut mixed = b.clone();
                        for (slot, &j) in varying.iter().enumerate() {
                            if coalition.mask[slot] {
                                mixed[j] = row[j];
                            }
                        }
                        mixed
                    });
                    values.push(self.mean_output(model, synthetic)?);
                }

                let solved = solve_constrained(&plan, &values, base, fx)?;
                for (slot, &j) in varying.iter().enumerate() {
                    phi[j] = solved[slot];
                }
                debug!(
                    varying = k,
                    coalitions = plan.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "kernel regression solved"
                );
            }
        }

        let contributions = feature_names
            .iter()
            .zip(row)
            .zip(phi)
            .map(|((name, value), contribution)| FeatureContribution {
                feature: name.clone(),
                value: *value,
                contribution,
            })
            .collect();

        Ok(Attribution {
            contributions,
            baseline: base,
            output: fx,
        })
    }
}
