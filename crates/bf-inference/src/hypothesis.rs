//! Linear hypothesis evaluation against posterior draws.
//!
//! A hypothesis is a linear combination of parameters compared to a
//! constant, e.g. `b_value = 0` or `2*b_before - b_after = 0.5`. The
//! draw-wise value of the combination minus the constant forms a derived
//! draw sequence, summarized at significance levels 0.05, 0.20, and 0.50
//! (central 95%, 80%, and 50% intervals).

use serde::Serialize;

use bf_core::{Error, PosteriorDrawSet, Result};

use crate::stats::{central_interval, mean, sample_sd, sorted_copy};

/// Significance levels every hypothesis is evaluated at.
pub const ALPHA_LEVELS: [f64; 3] = [0.05, 0.20, 0.50];

/// Parsed hypothesis: `sum(coefficient * parameter) = constant`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearHypothesis {
    text: String,
    terms: Vec<(f64, String)>,
    constant: f64,
}

#[derive(Debug, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Star,
    Plus,
    Minus,
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '0'..='9' | '.' => {
                let mut num = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        num.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let v = num.parse::<f64>().map_err(|_| {
                    Error::Validation(format!("invalid number '{}' in hypothesis '{}'", num, text))
                })?;
                tokens.push(Token::Number(v));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric()
                        || d == '_'
                        || d == '['
                        || d == ']'
                        || d == '.'
                        || d == ','
                    {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(Error::Validation(format!(
                    "unexpected character '{}' in hypothesis '{}'",
                    other, text
                )));
            }
        }
    }
    Ok(tokens)
}

impl LinearHypothesis {
    /// Parse a hypothesis string of the form `linear_combination = constant`.
    ///
    /// Terms are `param`, `coef*param`, or signed variants joined with
    /// `+`/`-`; the right-hand side is a single (optionally signed) number.
    pub fn parse(text: &str) -> Result<Self> {
        let mut sides = text.split('=');
        let (lhs, rhs) = match (sides.next(), sides.next(), sides.next()) {
            (Some(l), Some(r), None) => (l.trim(), r.trim()),
            _ => {
                return Err(Error::Validation(format!(
                    "hypothesis '{}' must have exactly one '='",
                    text
                )));
            }
        };

        let constant = rhs.parse::<f64>().map_err(|_| {
            Error::Validation(format!(
                "hypothesis '{}' right-hand side '{}' is not a number",
                text, rhs
            ))
        })?;

        let tokens = tokenize(lhs)?;
        let mut terms: Vec<(f64, String)> = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            // Leading sign(s) for this term.
            let mut sign = 1.0;
            while let Some(tok) = tokens.get(i) {
                match tok {
                    Token::Plus => i += 1,
                    Token::Minus => {
                        sign = -sign;
                        i += 1;
                    }
                    _ => break,
                }
            }
            match (tokens.get(i), tokens.get(i + 1), tokens.get(i + 2)) {
                (Some(Token::Number(c)), Some(Token::Star), Some(Token::Ident(p))) => {
                    terms.push((sign * c, p.clone()));
                    i += 3;
                }
                (Some(Token::Ident(p)), _, _) => {
                    terms.push((sign, p.clone()));
                    i += 1;
                }
                _ => {
                    return Err(Error::Validation(format!(
                        "hypothesis '{}' has a malformed term (expected 'param' or 'coef*param')",
                        text
                    )));
                }
            }
        }
        if terms.is_empty() {
            return Err(Error::Validation(format!(
                "hypothesis '{}' references no parameters",
                text
            )));
        }

        Ok(Self { text: text.trim().to_string(), terms, constant })
    }

    /// Original hypothesis text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// `(coefficient, parameter)` terms on the left-hand side.
    pub fn terms(&self) -> &[(f64, String)] {
        &self.terms
    }

    /// The right-hand-side constant.
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Draw-wise value of `combination - constant`.
    pub fn derived_draws(&self, draws: &PosteriorDrawSet) -> Result<Vec<f64>> {
        let mut out = vec![-self.constant; draws.n_draws()];
        for (coef, param) in &self.terms {
            let d = draws.require_draws(param)?;
            for (o, &x) in out.iter_mut().zip(d) {
                *o += coef * x;
            }
        }
        Ok(out)
    }
}

/// Estimate/error/interval at one significance level.
#[derive(Debug, Clone, Serialize)]
pub struct HypothesisLevel {
    /// Significance level (1 − interval mass).
    pub alpha: f64,
    /// Mean of the derived draw sequence.
    pub estimate: f64,
    /// Sample standard deviation of the derived sequence.
    pub error: f64,
    /// Central interval lower bound at this level.
    pub ci_lower: f64,
    /// Central interval upper bound at this level.
    pub ci_upper: f64,
}

/// One hypothesis evaluated at all [`ALPHA_LEVELS`].
#[derive(Debug, Clone)]
pub struct HypothesisResult {
    /// Hypothesis text as given.
    pub hypothesis: String,
    /// Per-level estimate/error/interval tuples, in [`ALPHA_LEVELS`] order.
    pub levels: Vec<HypothesisLevel>,
}

/// Evaluate a hypothesis against a draw set.
pub fn evaluate(hypothesis: &LinearHypothesis, draws: &PosteriorDrawSet) -> Result<HypothesisResult> {
    let derived = hypothesis.derived_draws(draws)?;
    let estimate = mean(&derived);
    let error = sample_sd(&derived);
    let sorted = sorted_copy(&derived);

    let levels = ALPHA_LEVELS
        .iter()
        .map(|&alpha| {
            let (ci_lower, ci_upper) = central_interval(&sorted, 1.0 - alpha);
            HypothesisLevel { alpha, estimate, error, ci_lower, ci_upper }
        })
        .collect();

    Ok(HypothesisResult { hypothesis: hypothesis.text().to_string(), levels })
}
