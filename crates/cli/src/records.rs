use crate::config::{FileConfig, DEFAULT_KIND};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use ztrend_engine::{Document, DocumentSource, Trending};

/// One line of a JSONL event file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default = "default_kind")]
    pub kind: String,
    pub timestamp: RecordTime,
    pub tokens: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

fn default_kind() -> String {
    DEFAULT_KIND.to_string()
}

/// Either unix seconds or an RFC 3339 string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordTime {
    Unix(i64),
    Rfc3339(DateTime<Utc>),
}

impl RecordTime {
    pub fn unix_seconds(&self) -> i64 {
        match self {
            Self::Unix(seconds) => *seconds,
            Self::Rfc3339(time) => time.timestamp(),
        }
    }
}

impl DocumentSource for EventRecord {
    fn type_tag(&self) -> &str {
        &self.kind
    }
}

/// Read a JSONL file, skipping blank lines
pub fn read_records(path: &Path) -> Result<Vec<EventRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read events from {}", path.display()))?;
    parse_records(&raw).with_context(|| format!("Invalid events file {}", path.display()))
}

pub fn parse_records(raw: &str) -> Result<Vec<EventRecord>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).with_context(|| format!("line {}: malformed record", idx + 1))
        })
        .collect()
}

/// Engine accepting every kind listed in `config`
pub fn build_engine(config: &FileConfig) -> Result<Trending<EventRecord, String>> {
    let mut trending = Trending::new(config.engine.clone())?;
    for kind in &config.kinds {
        let multiplier = kind.weight;
        trending.register_type(
            kind.tag.clone(),
            |record: &EventRecord| (record.timestamp.unix_seconds(), record.tokens.clone()),
            move |doc: &Document<'_, EventRecord, String>, _: &String| {
                multiplier * doc.source().weight.unwrap_or(1.0)
            },
        );
    }
    log::debug!("Registered {} record kind(s)", config.kinds.len());
    Ok(trending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KindConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_unix_and_rfc3339_timestamps() {
        let records = parse_records(
            r#"{"timestamp": 1000000000, "tokens": ["a"]}

{"kind": "post", "timestamp": "2001-09-09T01:46:40Z", "tokens": ["b", "c"], "weight": 2.5}
"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, DEFAULT_KIND);
        assert_eq!(records[0].weight, None);
        assert_eq!(records[1].timestamp.unix_seconds(), 1_000_000_000);
        assert_eq!(records[1].tokens, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(records[1].weight, Some(2.5));
    }

    #[test]
    fn reports_malformed_line_number() {
        let err = parse_records("{\"timestamp\": 1, \"tokens\": []}\n{\"tokens\": 3}").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn engine_applies_kind_and_record_weights() {
        let config = FileConfig {
            kinds: vec![KindConfig {
                tag: "post".to_string(),
                weight: 2.0,
            }],
            ..FileConfig::default()
        };
        let mut trending = build_engine(&config).unwrap();
        let records = parse_records(
            r#"{"kind": "post", "timestamp": 0, "tokens": ["x"], "weight": 1.5}"#,
        )
        .unwrap();
        trending.add_historical_documents(&records).unwrap();

        let baseline = trending.token(&"x".to_string()).unwrap().baseline();
        assert!(baseline.iter().all(|score| (*score - 3.0).abs() < 1e-12));

        let unsupported = parse_records(r#"{"timestamp": 0, "tokens": ["x"]}"#).unwrap();
        assert!(trending.add_historical_documents(&unsupported).is_err());
    }
}
