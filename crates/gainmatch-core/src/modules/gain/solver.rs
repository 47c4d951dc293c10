//! Minimizer seam for the gain fit.
//!
//! [`LevenbergMarquardt`] hands the model to `tiny_solver` as a factor graph:
//! one scalar variable per free ring or wedge factor and one residual block
//! per active pair. Segments that no active pair touches never enter the
//! problem and come back at their starting value.

use super::model::{GainModel, GainParameters, free_parameter_names};
use crate::common::constants::REFERENCE_RING;
use std::collections::HashMap;
use tiny_solver::Optimizer;
use tiny_solver::factors::na;

pub trait LeastSquaresSolver {
    fn minimize(&self, model: &GainModel<'_>, initial: &GainParameters) -> SolverOutcome;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverStatus {
    Finished,
    Failed,
    EmptyProblem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    pub parameters: GainParameters,
    pub status: SolverStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverOptions {
    pub max_iterations: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevenbergMarquardt {
    pub options: SolverOptions,
}

impl LevenbergMarquardt {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }
}

/// `(ring / wedge - slope) / sigma` for one measured pair. The reference ring
/// is a constant, so its blocks only carry the wedge variable.
#[derive(Debug, Clone)]
struct SlopeFactor {
    slope: f64,
    sigma: f64,
    pinned_ring: bool,
}

impl<T: na::RealField> tiny_solver::factors::Factor<T> for SlopeFactor {
    fn residual_func(&self, params: &[na::DVector<T>]) -> na::DVector<T> {
        let (ring, wedge) = if self.pinned_ring {
            (na::convert(1.0), params[0][0].clone())
        } else {
            (params[0][0].clone(), params[1][0].clone())
        };
        let slope: T = na::convert(self.slope);
        let sigma: T = na::convert(self.sigma);
        na::DVector::<T>::from_vec(vec![(ring / wedge - slope) / sigma])
    }
}

impl LeastSquaresSolver for LevenbergMarquardt {
    fn minimize(&self, model: &GainModel<'_>, initial: &GainParameters) -> SolverOutcome {
        let names = free_parameter_names();
        let mut problem = tiny_solver::Problem::new();
        let mut block_count = 0_usize;

        for &(ring, wedge) in model.active_pairs() {
            let Some(measurement) = model.measurement(ring, wedge) else {
                continue;
            };
            let wedge_name = format!("wedge{wedge}");
            let ring_name = format!("ring{ring}");
            let pinned_ring = ring == REFERENCE_RING;
            let variables: Vec<&str> = if pinned_ring {
                vec![wedge_name.as_str()]
            } else {
                vec![ring_name.as_str(), wedge_name.as_str()]
            };
            problem.add_residual_block(
                1,
                &variables,
                Box::new(SlopeFactor {
                    slope: measurement.value,
                    sigma: measurement.uncertainty,
                    pinned_ring,
                }),
                None,
            );
            block_count += 1;
        }

        if block_count == 0 {
            return SolverOutcome {
                parameters: *initial,
                status: SolverStatus::EmptyProblem,
            };
        }

        let mut free = initial.to_free();
        let mut initial_values = HashMap::<String, na::DVector<f64>>::new();
        for &slot in &model.constrained_slots() {
            initial_values.insert(
                names[slot].clone(),
                na::DVector::<f64>::from_vec(vec![free[slot]]),
            );
        }

        let optimizer = tiny_solver::LevenbergMarquardtOptimizer::default();
        let options = tiny_solver::OptimizerOptions {
            max_iteration: self.options.max_iterations.max(1),
            verbosity_level: 0,
            ..Default::default()
        };
        let Some(result) = optimizer.optimize(&problem, &initial_values, Some(options)) else {
            tracing::warn!(blocks = block_count, "levenberg-marquardt solve failed");
            return SolverOutcome {
                parameters: *initial,
                status: SolverStatus::Failed,
            };
        };

        for (slot, name) in names.iter().enumerate() {
            if let Some(value) = result.get(name).and_then(|value| value.iter().next()) {
                free[slot] = *value;
            }
        }
        match GainParameters::from_free(&free) {
            Ok(parameters) => SolverOutcome {
                parameters,
                status: SolverStatus::Finished,
            },
            Err(_) => SolverOutcome {
                parameters: *initial,
                status: SolverStatus::Failed,
            },
        }
    }
}
