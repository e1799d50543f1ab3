//! Derivative-free minimisation
//!
//! A box-bounded Nelder-Mead simplex search. Unlike a best-effort optimiser it
//! reports failure explicitly: exhausting the iteration budget is
//! [`MathError::NotConverged`] and passing the deadline is
//! [`MathError::DeadlineExceeded`].

use crate::{MathError, Result};
use std::cmp::Ordering;
use std::time::Instant;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Settings for [`nelder_mead`]
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of simplex iterations
    pub max_iter: usize,
    /// Relative spread of objective values across the simplex that counts as converged
    pub tolerance: f64,
    /// Simplex diameter that counts as converged
    pub x_tolerance: f64,
    /// Offset used to build the initial simplex around the starting point
    pub initial_step: f64,
    /// Give up once this instant has passed
    pub deadline: Option<Instant>,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            tolerance: 1e-10,
            x_tolerance: 1e-10,
            initial_step: 0.05,
            deadline: None,
        }
    }
}

/// Result of a converged search
#[derive(Debug, Clone)]
pub struct NelderMeadOutcome {
    /// Best point found
    pub optimal_point: Vec<f64>,
    /// Objective value at the best point
    pub optimal_value: f64,
    /// Iterations used
    pub iterations: usize,
}

fn clamp_to(point: &mut [f64], bounds: Option<&[(f64, f64)]>) {
    if let Some(bounds) = bounds {
        for (x, (lo, hi)) in point.iter_mut().zip(bounds.iter()) {
            *x = x.clamp(*lo, *hi);
        }
    }
}

fn evaluate<F: Fn(&[f64]) -> f64>(f: &F, point: &[f64]) -> f64 {
    let value = f(point);
    if value.is_finite() {
        value
    } else {
        f64::INFINITY
    }
}

/// Minimise `f` starting from `initial`, keeping every candidate inside `bounds`.
pub fn nelder_mead<F>(
    f: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> Result<NelderMeadOutcome>
where
    F: Fn(&[f64]) -> f64,
{
    let dim = initial.len();
    if dim == 0 {
        return Err(MathError::InvalidInput(
            "Nelder-Mead needs at least one parameter".to_string(),
        ));
    }
    if let Some(b) = bounds {
        if b.len() != dim || b.iter().any(|(lo, hi)| lo > hi) {
            return Err(MathError::InvalidInput(
                "Bounds must match the parameter count and satisfy lo <= hi".to_string(),
            ));
        }
    }

    let mut start = initial.to_vec();
    clamp_to(&mut start, bounds);

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(dim + 1);
    simplex.push(start.clone());
    for i in 0..dim {
        let mut vertex = start.clone();
        let upper = bounds.map(|b| b[i].1).unwrap_or(f64::INFINITY);
        vertex[i] = if vertex[i] + config.initial_step <= upper {
            vertex[i] + config.initial_step
        } else {
            vertex[i] - config.initial_step
        };
        clamp_to(&mut vertex, bounds);
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|p| evaluate(&f, p)).collect();

    for iteration in 0..config.max_iter {
        if let Some(deadline) = config.deadline {
            if Instant::now() >= deadline {
                return Err(MathError::DeadlineExceeded {
                    iterations: iteration,
                });
            }
        }

        // Order vertices best to worst
        let mut order: Vec<usize> = (0..=dim).collect();
        order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let best = values[0];
        let worst = values[dim];
        let spread = (worst - best).abs();
        let diameter = simplex[1..]
            .iter()
            .map(|v| {
                v.iter()
                    .zip(simplex[0].iter())
                    .map(|(a, b)| (a - b).abs())
                    .fold(0.0, f64::max)
            })
            .fold(0.0, f64::max);

        if best.is_finite()
            && (spread <= config.tolerance * (best.abs() + config.tolerance)
                || diameter <= config.x_tolerance)
        {
            return Ok(NelderMeadOutcome {
                optimal_point: simplex[0].clone(),
                optimal_value: best,
                iterations: iteration,
            });
        }

        let centroid: Vec<f64> = (0..dim)
            .map(|j| simplex[..dim].iter().map(|v| v[j]).sum::<f64>() / dim as f64)
            .collect();
        let worst_vertex = simplex[dim].clone();
        let towards = |coef: f64| -> Vec<f64> {
            let mut p: Vec<f64> = centroid
                .iter()
                .zip(worst_vertex.iter())
                .map(|(c, w)| c + coef * (c - w))
                .collect();
            clamp_to(&mut p, bounds);
            p
        };

        let reflected = towards(REFLECTION);
        let f_reflected = evaluate(&f, &reflected);

        if f_reflected < values[0] {
            let expanded = towards(EXPANSION);
            let f_expanded = evaluate(&f, &expanded);
            if f_expanded < f_reflected {
                simplex[dim] = expanded;
                values[dim] = f_expanded;
            } else {
                simplex[dim] = reflected;
                values[dim] = f_reflected;
            }
            continue;
        }

        if f_reflected < values[dim - 1] {
            simplex[dim] = reflected;
            values[dim] = f_reflected;
            continue;
        }

        let contracted = if f_reflected < values[dim] {
            towards(CONTRACTION)
        } else {
            towards(-CONTRACTION)
        };
        let f_contracted = evaluate(&f, &contracted);
        if f_contracted < values[dim].min(f_reflected) {
            simplex[dim] = contracted;
            values[dim] = f_contracted;
            continue;
        }

        // Shrink everything towards the best vertex
        let anchor = simplex[0].clone();
        for k in 1..=dim {
            let mut shrunk: Vec<f64> = anchor
                .iter()
                .zip(simplex[k].iter())
                .map(|(a, x)| a + SHRINK * (x - a))
                .collect();
            clamp_to(&mut shrunk, bounds);
            values[k] = evaluate(&f, &shrunk);
            simplex[k] = shrunk;
        }
    }

    Err(MathError::NotConverged {
        iterations: config.max_iter,
    })
}
