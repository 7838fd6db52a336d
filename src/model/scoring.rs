//! Wire shape of the delegate evaluator's JSON reply
//!
//! The delegate model is instructed to return exactly these four fields.
//! A missing field is a parse failure and triggers the lexical fallback.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedScores {
    pub visibility: f64,
    pub sentiment: f64,
    pub ranking: f64,
    pub recommendation: f64,
}
