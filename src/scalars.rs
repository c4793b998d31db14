//! Extraction of the global scalars from the free-form `others.txt` text block.
//!
//! The text is matched against a fixed vocabulary. A label that does not occur
//! leaves its slot unset; whoever needs the value fails with
//! [`Error::MissingScalar`] naming the label.

use std::{fs, path::Path};

use log::{debug, warn};
use regex::Regex;

use crate::error::Error;

/// File name of the scalar text inside a data directory
pub const OTHERS_FILE: &str = "others.txt";

pub const INTEREST_RATE: &str = "Ip";
pub const EXCESS_MULTIPLIER: &str = "Cep,t";
pub const SHORTAGE_MULTIPLIER: &str = "Csp,t";
pub const UTILIZATION: &str = "yp,m=yp,a=";
pub const INITIAL_TESTERS: &str = "K0m";
pub const INITIAL_HANDLERS: &str = "K0a";
pub const INITIAL_CAPITAL: &str = "F0";
pub const INITIAL_LOADING: &str = "S0";
pub const WORK_HOURS: &str = "wp,m";

const NUMBER: &str = r"([+-]?\d+(?:\.\d*)?(?:[eE][+-]?\d+)?)";

/// The scalars found in the text, before they are broadcast over any index set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarConfig {
    /// Interest rate, the same for every period
    pub interest_rate: Option<f64>,
    /// Excess loading unit cost as a multiple of product profit
    pub excess_multiplier: Option<f64>,
    /// Shortage loading unit cost as a multiple of product profit
    pub shortage_multiplier: Option<f64>,
    /// Target utilization of testers and handlers
    pub utilization: Option<f64>,
    /// Initial tester counts, by position over the sorted testers
    pub initial_testers: Option<Vec<f64>>,
    /// Initial counts per handler instance, shared by every category
    pub initial_handlers: Option<Vec<f64>>,
    pub initial_capital: Option<f64>,
    /// Initial capacity loading, by position over the sorted products
    pub initial_loading: Option<Vec<f64>>,
    /// Work hours of testers and handlers
    pub work_hours: Option<f64>,
}

fn regex(pattern: &str) -> Result<Regex, Error> {
    Regex::new(pattern)
        .map_err(|e| Error::InvalidConfig(format!("scalar pattern {}: {}", pattern, e)))
}

fn capture<'t>(text: &'t str, pattern: &str) -> Result<Option<&'t str>, Error> {
    Ok(regex(pattern)?
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str()))
}

fn parse(label: &'static str, value: &str) -> Result<f64, Error> {
    value.parse::<f64>().map_err(|_| Error::MalformedScalar {
        label,
        value: value.to_string(),
    })
}

fn number(text: &str, label: &'static str, pattern: &str) -> Result<Option<f64>, Error> {
    match capture(text, pattern)? {
        Some(value) => parse(label, value).map(Some),
        None => {
            warn!("{} not found in scalar text", label);
            Ok(None)
        }
    }
}

/// `<label> = <expr> * <multiplier>`, or else the multiplier of the first unlabelled
/// cost expression, which then prices both excess and shortage.
fn multiplier(text: &str, label: &'static str) -> Result<Option<f64>, Error> {
    let labelled = format!(r"\b{}\s*=[^*\n]*\*\s*{}", regex::escape(label), NUMBER);
    if let Some(value) = capture(text, &labelled)? {
        return parse(label, value).map(Some);
    }

    match capture(text, &format!(r"=[^*\n]*\*\s*{}", NUMBER))? {
        Some(value) => {
            debug!("{} taken from the shared cost multiplier expression", label);
            parse(label, value).map(Some)
        }
        None => {
            warn!("{} not found in scalar text", label);
            Ok(None)
        }
    }
}

fn list(text: &str, label: &'static str) -> Result<Option<Vec<f64>>, Error> {
    let pattern = format!(r"\b{}\s*=\s*\{{([^}}]*)\}}", regex::escape(label));
    let body = match capture(text, &pattern)? {
        Some(body) => body,
        None => {
            warn!("{} not found in scalar text", label);
            return Ok(None);
        }
    };

    body.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse(label, item))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// A list of equipment counts. Every entry must be a whole number.
fn counts(text: &str, label: &'static str) -> Result<Option<Vec<f64>>, Error> {
    let counts = list(text, label)?;
    if let Some(bad) = counts.iter().flatten().find(|c| c.fract() != 0.0) {
        return Err(Error::MalformedScalar {
            label,
            value: bad.to_string(),
        });
    }
    Ok(counts)
}

impl ScalarConfig {
    /// Extracts every scalar of the vocabulary from `text`. Labels are matched
    /// whitespace-tolerantly; missing labels are left unset.
    pub fn extract(text: &str) -> Result<ScalarConfig, Error> {
        let config = ScalarConfig {
            interest_rate: number(text, INTEREST_RATE, &format!(r"\bIp\s*=?\s*{}", NUMBER))?,
            excess_multiplier: multiplier(text, EXCESS_MULTIPLIER)?,
            shortage_multiplier: multiplier(text, SHORTAGE_MULTIPLIER)?,
            utilization: number(
                text,
                UTILIZATION,
                &format!(r"\byp,m\s*=\s*yp,a\s*=\s*{}", NUMBER),
            )?,
            initial_testers: counts(text, INITIAL_TESTERS)?,
            initial_handlers: counts(text, INITIAL_HANDLERS)?,
            initial_capital: number(text, INITIAL_CAPITAL, &format!(r"\bF0\s*=\s*{}", NUMBER))?,
            initial_loading: list(text, INITIAL_LOADING)?,
            work_hours: number(text, WORK_HOURS, &format!(r"\bwp,m\s*=?\s*{}", NUMBER))?,
        };

        debug!("extracted scalars: {:?}", config);
        Ok(config)
    }

    /// Reads and extracts `others.txt` from a data directory
    pub fn read(dir: &Path) -> Result<ScalarConfig, Error> {
        let path = dir.join(OTHERS_FILE);
        let text = fs::read_to_string(&path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        ScalarConfig::extract(&text)
    }

    /// Labels of the vocabulary that the text did not define
    pub fn gaps(&self) -> Vec<&'static str> {
        let slots = [
            (INTEREST_RATE, self.interest_rate.is_some()),
            (EXCESS_MULTIPLIER, self.excess_multiplier.is_some()),
            (SHORTAGE_MULTIPLIER, self.shortage_multiplier.is_some()),
            (UTILIZATION, self.utilization.is_some()),
            (INITIAL_TESTERS, self.initial_testers.is_some()),
            (INITIAL_HANDLERS, self.initial_handlers.is_some()),
            (INITIAL_CAPITAL, self.initial_capital.is_some()),
            (INITIAL_LOADING, self.initial_loading.is_some()),
            (WORK_HOURS, self.work_hours.is_some()),
        ];

        slots
            .into_iter()
            .filter(|(_, set)| !set)
            .map(|(label, _)| label)
            .collect()
    }
}

/// A value that must be present by the time it is used
pub fn require<T: Clone>(slot: &Option<T>, label: &'static str) -> Result<T, Error> {
    slot.clone().ok_or(Error::MissingScalar { label })
}
