use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendScore {
    pub token: String,
    pub z_score: f64,
}

/// Scores for one scored batch, highest z-score first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch: String,
    pub scores: Vec<TrendScore>,
}

impl BatchReport {
    pub fn new(batch: impl Into<String>, scores: Vec<(String, f64)>) -> Self {
        let mut scores: Vec<TrendScore> = scores
            .into_iter()
            .map(|(token, z_score)| TrendScore { token, z_score })
            .collect();
        scores.sort_by(|a, b| {
            b.z_score
                .total_cmp(&a.z_score)
                .then_with(|| a.token.cmp(&b.token))
        });
        Self {
            batch: batch.into(),
            scores,
        }
    }

    /// Keep only the `limit` highest scores
    pub fn truncate(&mut self, limit: Option<usize>) {
        if let Some(limit) = limit {
            self.scores.truncate(limit);
        }
    }
}

pub fn render_json(reports: &[BatchReport]) -> Result<String> {
    Ok(serde_json::to_string_pretty(reports)?)
}

pub fn render_text(reports: &[BatchReport]) -> String {
    let mut out = String::new();
    for (idx, report) in reports.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "# {}", report.batch);
        if report.scores.is_empty() {
            out.push_str("(no tokens)\n");
            continue;
        }
        let width = report
            .scores
            .iter()
            .map(|score| score.token.chars().count())
            .max()
            .unwrap_or(0);
        for score in &report.scores {
            let _ = writeln!(out, "{:<width$}  {:>10.4}", score.token, score.z_score);
        }
    }
    out.trim_end().to_string()
}
