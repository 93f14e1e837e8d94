use std::collections::HashMap;
use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

/// Input data for one blending decision. Feeds and components are ordered;
/// their order decides column and row order in the compiled model.
///
/// A feed without a cost, or a feed and component pair without a content
/// fraction, is *not* treated as zero: the compiler reports it as a
/// missing value, since silently defaulting would hide real unmodelled
/// blends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendProblem {
    /// Purchasable feed streams.
    pub feeds: Vec<String>,
    /// Measured components of the blended product.
    pub components: Vec<String>,
    /// Cost per unit of each feed.
    pub costs: HashMap<String, f64>,
    /// `content[feed][component]`: fraction of the component in the feed.
    pub content: HashMap<String, HashMap<String, f64>>,
    /// Minimum required fraction of each component in the final blend.
    pub req_min: HashMap<String, f64>,
    /// Total amount of product to be blended.
    pub total_blend: f64,
}

/// Structural problems with the input data, caught before any model is
/// built. Missing table entries are not checked here; they surface as
/// missing-value errors during compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum BlendProblemError {
    NoFeeds,
    NoComponents,
    NonPositiveTotal { total: f64 },
}

impl fmt::Display for BlendProblemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlendProblemError::NoFeeds => write!(f, "the problem has no feeds"),
            BlendProblemError::NoComponents => write!(f, "the problem has no components"),
            BlendProblemError::NonPositiveTotal { total } => {
                write!(f, "total blend must be positive, got {}", total)
            }
        }
    }
}

impl std::error::Error for BlendProblemError {}

/// Failure while loading a problem from JSON.
#[derive(Debug, derive_more::From)]
pub enum BlendInputError {
    Json(serde_json::Error),
    Invalid(BlendProblemError),
}

impl fmt::Display for BlendInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlendInputError::Json(e) => write!(f, "malformed blend problem: {}", e),
            BlendInputError::Invalid(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for BlendInputError {}

impl BlendProblem {
    pub fn new(
        feeds: Vec<String>,
        components: Vec<String>,
        costs: HashMap<String, f64>,
        content: HashMap<String, HashMap<String, f64>>,
        req_min: HashMap<String, f64>,
        total_blend: f64,
    ) -> Result<Self, BlendProblemError> {
        let problem = BlendProblem {
            feeds,
            components,
            costs,
            content,
            req_min,
            total_blend,
        };
        problem.validate()?;
        Ok(problem)
    }

    /// Load a problem from JSON, e.g. a file produced by a data pipeline.
    pub fn from_json(reader: impl io::Read) -> Result<Self, BlendInputError> {
        let problem: BlendProblem = serde_json::from_reader(reader)?;
        problem.validate()?;
        Ok(problem)
    }

    pub fn validate(&self) -> Result<(), BlendProblemError> {
        if self.feeds.is_empty() {
            return Err(BlendProblemError::NoFeeds);
        }
        if self.components.is_empty() {
            return Err(BlendProblemError::NoComponents);
        }
        if self.total_blend <= 0.0 {
            return Err(BlendProblemError::NonPositiveTotal {
                total: self.total_blend,
            });
        }
        Ok(())
    }
}
