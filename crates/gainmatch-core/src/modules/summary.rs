use super::gain::{GainFit, Termination, free_parameter_names};
use crate::common::constants::REFERENCE_RING;
use crate::domain::{GainMatchError, GainMatchResult};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSummary {
    pub name: String,
    pub value: f64,
    pub uncertainty: Option<f64>,
    pub fixed: bool,
}

/// Serializable record of one fit, including the convergence verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitSummary {
    pub run_id: u32,
    pub board: usize,
    pub converged: bool,
    pub termination: Termination,
    pub chi2: f64,
    pub edm: Option<f64>,
    pub active_pairs: usize,
    pub degrees_of_freedom: isize,
    pub parameters: Vec<ParameterSummary>,
    pub unobserved_pairs: Vec<(usize, usize)>,
    pub excluded_pairs: Vec<(usize, usize)>,
}

impl FitSummary {
    pub fn from_fit(run_id: u32, fit: &GainFit) -> Self {
        let mut parameters = Vec::with_capacity(fit.uncertainties.len() + 1);
        parameters.push(ParameterSummary {
            name: format!("ring{REFERENCE_RING}"),
            value: fit.parameters.ring_factors()[REFERENCE_RING],
            uncertainty: None,
            fixed: true,
        });
        parameters.extend(
            free_parameter_names()
                .into_iter()
                .zip(fit.parameters.to_free())
                .zip(fit.uncertainties.iter().copied())
                .map(|((name, value), uncertainty)| ParameterSummary {
                    name,
                    value,
                    uncertainty,
                    fixed: false,
                }),
        );

        Self {
            run_id,
            board: fit.board,
            converged: fit.converged(),
            termination: fit.termination,
            chi2: fit.chi2,
            edm: fit.edm,
            active_pairs: fit.active_pairs,
            degrees_of_freedom: fit.degrees_of_freedom,
            parameters,
            unobserved_pairs: fit.unobserved_pairs.clone(),
            excluded_pairs: fit.excluded_pairs.clone(),
        }
    }

    pub fn chi2_per_degree_of_freedom(&self) -> Option<f64> {
        (self.degrees_of_freedom > 0).then(|| self.chi2 / self.degrees_of_freedom as f64)
    }

    pub fn to_json(&self) -> GainMatchResult<String> {
        serde_json::to_string_pretty(self).map_err(|source| {
            GainMatchError::internal(
                "SYS.SUMMARY_JSON",
                format!("failed to serialize fit summary: {}", source),
            )
        })
    }

    pub fn write_json(&self, path: &Path) -> GainMatchResult<()> {
        let mut contents = self.to_json()?;
        contents.push('\n');
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| {
                GainMatchError::internal(
                    "SYS.SUMMARY_WRITE",
                    format!(
                        "failed to create report directory '{}': {}",
                        parent.display(),
                        source
                    ),
                )
            })?;
        }
        fs::write(path, contents).map_err(|source| {
            GainMatchError::internal(
                "SYS.SUMMARY_WRITE",
                format!("failed to write fit summary '{}': {}", path.display(), source),
            )
        })
    }

    /// Multi-line human-readable rendering for the diagnostic stream.
    pub fn render_human(&self) -> String {
        let mut lines = Vec::with_capacity(self.parameters.len() + 6);
        lines.push(format!(
            "# gain-match fit: run {} board {}",
            self.run_id, self.board
        ));
        let status = if self.converged {
            "converged"
        } else {
            "NOT CONVERGED"
        };
        let edm = self
            .edm
            .map_or_else(|| "n/a".to_string(), |edm| format!("{edm:.3e}"));
        lines.push(format!(
            "# status: {} ({}), edm = {}",
            status,
            self.termination.as_str(),
            edm
        ));
        let reduced = self
            .chi2_per_degree_of_freedom()
            .map_or_else(|| "n/a".to_string(), |value| format!("{value:.6}"));
        lines.push(format!(
            "# chi2 = {:.6}  ndf = {}  chi2/ndf = {}  active pairs = {}",
            self.chi2, self.degrees_of_freedom, reduced, self.active_pairs
        ));
        if !self.excluded_pairs.is_empty() {
            lines.push(format!("# masked pairs: {}", self.excluded_pairs.len()));
        }
        if !self.unobserved_pairs.is_empty() {
            lines.push(format!(
                "# unobserved pairs left out of fit: {}",
                format_pairs(&self.unobserved_pairs)
            ));
        }
        for parameter in &self.parameters {
            let uncertainty = match (parameter.fixed, parameter.uncertainty) {
                (true, _) => "fixed".to_string(),
                (false, Some(sigma)) => format!("+/- {sigma:.6}"),
                (false, None) => "unconstrained".to_string(),
            };
            lines.push(format!(
                "{:<8} {:>12.8} {}",
                parameter.name, parameter.value, uncertainty
            ));
        }
        lines.join("\n")
    }
}

fn format_pairs(pairs: &[(usize, usize)]) -> String {
    pairs
        .iter()
        .map(|(ring, wedge)| format!("({ring},{wedge})"))
        .collect::<Vec<_>>()
        .join(" ")
}
