//! Model specifications: formula, outcome family, sampler configuration.
//!
//! A [`ModelSpecification`] describes one hierarchical regression to be fit
//! by an external sampling backend. It is immutable once constructed: the
//! validating constructors are the only way to build one, and all access is
//! through read-only methods.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Outcome-distribution family.
///
/// Closed variant set: every family carries its own link and pointwise
/// log-density strategy downstream, with no runtime string dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// Identity link, `sigma` residual scale parameter.
    Gaussian,
    /// Logit link, binary outcome in {0, 1}.
    Bernoulli,
    /// Response-time family: lognormal shape with a minimum-shift
    /// parameter `ndt` (non-decision time).
    ShiftedLognormal,
}

/// Regression formula: outcome, population-level predictors, and an
/// optional per-group random intercept.
///
/// Parsed from the conventional text form
/// `outcome ~ pred1 + pred2 + (1|group)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    outcome: String,
    predictors: Vec<String>,
    intercept: bool,
    random_intercept: Option<String>,
}

fn valid_ident(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

impl Formula {
    /// Parse a formula of the form `outcome ~ p1 + p2 + (1|group)`.
    ///
    /// A bare `1` term is the (default) intercept; a `0` term drops it.
    pub fn parse(text: &str) -> Result<Self> {
        let mut sides = text.splitn(2, '~');
        let lhs = sides.next().unwrap_or("").trim();
        let rhs = sides
            .next()
            .ok_or_else(|| Error::Validation(format!("formula '{}' has no '~'", text)))?
            .trim();
        if !valid_ident(lhs) {
            return Err(Error::Validation(format!(
                "formula '{}' has invalid outcome '{}'",
                text, lhs
            )));
        }

        let mut predictors = Vec::new();
        let mut intercept = true;
        let mut random_intercept = None;
        for term in rhs.split('+').map(str::trim) {
            if term.is_empty() {
                return Err(Error::Validation(format!("formula '{}' has an empty term", text)));
            }
            if term == "1" {
                intercept = true;
            } else if term == "0" {
                intercept = false;
            } else if let Some(inner) = term.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
                let group = inner
                    .strip_prefix("1|")
                    .map(str::trim)
                    .filter(|g| valid_ident(g))
                    .ok_or_else(|| {
                        Error::Validation(format!(
                            "unsupported random-effects term '{}' (expected '(1|group)')",
                            term
                        ))
                    })?;
                if random_intercept.replace(group.to_string()).is_some() {
                    return Err(Error::Validation(format!(
                        "formula '{}' has more than one random-effects term",
                        text
                    )));
                }
            } else if valid_ident(term) {
                if predictors.iter().any(|p| p == term) {
                    return Err(Error::Validation(format!(
                        "formula '{}' repeats predictor '{}'",
                        text, term
                    )));
                }
                predictors.push(term.to_string());
            } else {
                return Err(Error::Validation(format!(
                    "formula '{}' has invalid term '{}'",
                    text, term
                )));
            }
        }

        Ok(Self { outcome: lhs.to_string(), predictors, intercept, random_intercept })
    }

    /// Outcome column name.
    pub fn outcome(&self) -> &str {
        &self.outcome
    }

    /// Population-level predictor column names, in formula order.
    pub fn predictors(&self) -> &[String] {
        &self.predictors
    }

    /// Whether the model has a population-level intercept.
    pub fn intercept(&self) -> bool {
        self.intercept
    }

    /// Grouping column for the per-group random intercept, if any.
    pub fn random_intercept(&self) -> Option<&str> {
        self.random_intercept.as_deref()
    }

    /// All column names the formula reads from a dataset.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut cols: Vec<&str> = vec![self.outcome.as_str()];
        cols.extend(self.predictors.iter().map(String::as_str));
        if let Some(g) = self.random_intercept.as_deref() {
            cols.push(g);
        }
        cols
    }
}

/// Sampler configuration handed to the fitting backend.
///
/// The thread budget is an explicit per-fit value rather than process-wide
/// ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Number of parallel chains.
    pub chains: usize,
    /// Retained iterations per chain (post-warmup).
    pub iterations: usize,
    /// Warmup iterations per chain.
    pub warmup: usize,
    /// RNG seed.
    pub seed: u64,
    /// Worker threads the backend may use for this fit (0 = backend default).
    pub threads: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self { chains: 4, iterations: 1000, warmup: 1000, seed: 0, threads: 0 }
    }
}

/// One hierarchical regression to fit: formula, family, sampler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpecification {
    formula: Formula,
    family: Family,
    sampler: SamplerConfig,
}

impl ModelSpecification {
    /// Build a specification from a formula string.
    pub fn new(formula: &str, family: Family, sampler: SamplerConfig) -> Result<Self> {
        if sampler.chains == 0 || sampler.iterations == 0 {
            return Err(Error::Validation(format!(
                "sampler config needs chains > 0 and iterations > 0, got chains={} iterations={}",
                sampler.chains, sampler.iterations
            )));
        }
        Ok(Self { formula: Formula::parse(formula)?, family, sampler })
    }

    /// The parsed formula.
    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// The outcome family.
    pub fn family(&self) -> Family {
        self.family
    }

    /// The sampler configuration.
    pub fn sampler(&self) -> &SamplerConfig {
        &self.sampler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_formula() {
        let f = Formula::parse("choice ~ value + n_remembered_shown + (1|wid)").unwrap();
        assert_eq!(f.outcome(), "choice");
        assert_eq!(f.predictors(), &["value".to_string(), "n_remembered_shown".to_string()]);
        assert!(f.intercept());
        assert_eq!(f.random_intercept(), Some("wid"));
        assert_eq!(
            f.required_columns(),
            vec!["choice", "value", "n_remembered_shown", "wid"]
        );
    }

    #[test]
    fn test_parse_intercept_control() {
        let f = Formula::parse("rt ~ 0 + value").unwrap();
        assert!(!f.intercept());
        let f = Formula::parse("rt ~ 1").unwrap();
        assert!(f.intercept());
        assert!(f.predictors().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Formula::parse("no tilde here").is_err());
        assert!(Formula::parse("y ~ ").is_err());
        assert!(Formula::parse("y ~ x + x").is_err());
        assert!(Formula::parse("y ~ (2|wid)").is_err());
        assert!(Formula::parse("y ~ (1|wid) + (1|game)").is_err());
        assert!(Formula::parse("y ~ a b").is_err());
    }

    #[test]
    fn test_spec_validates_sampler() {
        let bad = SamplerConfig { chains: 0, ..SamplerConfig::default() };
        assert!(ModelSpecification::new("y ~ x", Family::Gaussian, bad).is_err());
        let spec =
            ModelSpecification::new("y ~ x", Family::Bernoulli, SamplerConfig::default()).unwrap();
        assert_eq!(spec.family(), Family::Bernoulli);
        assert_eq!(spec.sampler().chains, 4);
    }
}
