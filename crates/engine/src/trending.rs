use crate::config::{TrendingConfig, UnknownTokenPolicy};
use crate::document::{Document, DocumentSource, SupportedDocumentType, TypeRegistry};
use crate::error::{Result, TrendingError};
use crate::stats;
use crate::token::{Token, TokenStore, TokenValue};
use crate::window::{Window, WindowIndex};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Trend detector: builds per-token baselines over sliding windows and scores
/// current activity against them.
pub struct Trending<O, V> {
    config: TrendingConfig,
    registry: TypeRegistry<O, V>,
    windows: WindowIndex,
    history: TokenStore<V>,
    earliest_window: Option<Window>,
    latest_window: Option<Window>,
    finalized: bool,
}

impl<O: DocumentSource, V: TokenValue> Trending<O, V> {
    /// Create an engine; fails if the configuration is invalid
    pub fn new(config: TrendingConfig) -> Result<Self> {
        config.validate()?;
        let windows = WindowIndex::new(config.window_size_seconds, config.granularity_seconds);
        Ok(Self {
            config,
            registry: TypeRegistry::new(),
            windows,
            history: TokenStore::new(),
            earliest_window: None,
            latest_window: None,
            finalized: false,
        })
    }

    /// Shorthand for [`Trending::new`] with default policies
    pub fn with_windows(
        window_size_seconds: i64,
        granularity_seconds: i64,
        ignore_empty_windows: bool,
    ) -> Result<Self> {
        Self::new(TrendingConfig::new(
            window_size_seconds,
            granularity_seconds,
            ignore_empty_windows,
        ))
    }

    /// Register how to read objects carrying `tag`.
    ///
    /// `interpret` returns the object's unix timestamp (seconds) and its
    /// tokens; `weigh` returns the weight of one token occurrence.
    pub fn register_type<I, W>(&mut self, tag: impl Into<String>, interpret: I, weigh: W)
    where
        I: Fn(&O) -> (i64, Vec<V>) + Send + Sync + 'static,
        W: Fn(&Document<'_, O, V>, &V) -> f64 + Send + Sync + 'static,
    {
        self.registry.register(SupportedDocumentType::new(
            tag,
            Box::new(interpret),
            Box::new(weigh),
        ));
    }

    pub fn is_type_supported(&self, tag: &str) -> bool {
        self.registry.is_supported(tag)
    }

    /// Add one object to the historical baseline.
    ///
    /// Its weight is added to every window containing its timestamp. Nothing
    /// is recorded if the type is unsupported or a weight is invalid.
    pub fn add_historical_document(&mut self, object: &O) -> Result<()> {
        let document = self.registry.resolve(object)?;
        let weighted = document.weighted_tokens()?;
        let timestamp = document.timestamp();

        let windows = self.windows.windows_for(timestamp)?;
        let (Some(&newest), Some(&oldest)) = (windows.first(), windows.last()) else {
            return Ok(());
        };
        self.earliest_window = Some(self.earliest_window.map_or(oldest, |w| w.min(oldest)));
        self.latest_window = Some(self.latest_window.map_or(newest, |w| w.max(newest)));

        for (value, weight) in weighted {
            let token = self.history.get_or_add(&value);
            for window in &windows {
                token.add_weight(*window, weight);
            }
        }

        self.finalized = false;
        log::debug!(
            "Ingested document at {timestamp} into {} window(s), {} token(s) known",
            windows.len(),
            self.history.len()
        );
        Ok(())
    }

    /// Add objects to the baseline in order, stopping at the first failure
    pub fn add_historical_documents<'o, I>(&mut self, objects: I) -> Result<()>
    where
        I: IntoIterator<Item = &'o O>,
        O: 'o,
    {
        for object in objects {
            self.add_historical_document(object)?;
        }
        Ok(())
    }

    /// Widen the baseline so it runs up to the window anchored at `timestamp`.
    ///
    /// Windows between the last ingested document and `timestamp` are treated
    /// as empty during finalization.
    pub fn extend_history_to(&mut self, timestamp: i64) -> Result<()> {
        let anchor = self.windows.anchor(timestamp)?;
        match self.latest_window {
            Some(latest) if latest >= anchor => {}
            _ => {
                self.latest_window = Some(anchor);
                self.earliest_window.get_or_insert(anchor);
                self.finalized = false;
            }
        }
        Ok(())
    }

    /// Backfill zero scores so every token has an entry for every window
    /// between the earliest and latest observed windows.
    ///
    /// Runs automatically before scoring; repeated calls are no-ops until new
    /// history arrives.
    pub fn finalize_historical_data(&mut self) {
        if self.finalized {
            return;
        }
        let (Some(earliest), Some(latest)) = (self.earliest_window, self.latest_window) else {
            self.finalized = true;
            return;
        };

        let granularity = self.windows.granularity();
        let mut empty_windows = 0usize;
        let mut start = earliest.start();
        while start <= latest.start() {
            let window = self.windows.window_at(start);
            if self.windows.is_observed(start) {
                for token in self.history.tokens_mut() {
                    token.backfill_zero(window);
                }
            } else if !self.config.ignore_empty_windows {
                for token in self.history.tokens_mut() {
                    token.mark_empty(window);
                }
                empty_windows += 1;
            }
            match start.checked_add(granularity) {
                Some(next) => start = next,
                None => break,
            }
        }

        self.finalized = true;
        log::debug!(
            "Finalized baseline from {} to {} ({empty_windows} empty window(s), {} token(s))",
            earliest.start(),
            latest.start(),
            self.history.len()
        );
    }

    /// Score a batch of current objects against the baseline.
    ///
    /// Returns one `(token, z-score)` pair per distinct token in the batch, in
    /// order of first appearance. The whole call fails on an unsupported
    /// type, a stale document, an invalid weight, or a token whose baseline
    /// has no variation.
    pub fn get_trending<'o, I>(&mut self, objects: I) -> Result<Vec<(V, f64)>>
    where
        I: IntoIterator<Item = &'o O>,
        O: 'o,
    {
        self.finalize_historical_data();

        let mut current: Vec<(V, f64)> = Vec::new();
        let mut positions: HashMap<V, usize> = HashMap::new();
        for object in objects {
            let document = self.registry.resolve(object)?;
            self.ensure_not_stale(document.timestamp())?;
            for (value, weight) in document.weighted_tokens()? {
                match positions.get(&value) {
                    Some(&idx) => current[idx].1 += weight,
                    None => {
                        positions.insert(value.clone(), current.len());
                        current.push((value, weight));
                    }
                }
            }
        }

        if self.config.unknown_tokens == UnknownTokenPolicy::Error {
            if let Some((value, _)) = current.iter().find(|(v, _)| !self.history.contains(v)) {
                return Err(TrendingError::UnknownToken(format!("{value:?}")));
            }
        }

        // Claim the batch's historical tokens for the duration of scoring
        let mut scratch = TokenStore::new();
        for (value, _) in &current {
            if self.history.contains(value) {
                TokenStore::move_token(&mut self.history, &mut scratch, value)?;
            }
        }

        let outcome = self.score_claimed(&scratch, current);

        let claimed: Vec<V> = scratch.values().cloned().collect();
        for value in &claimed {
            TokenStore::move_token(&mut scratch, &mut self.history, value)?;
        }

        outcome
    }

    /// Score `objects`, then replace the baseline with them.
    ///
    /// Each call's input becomes the next call's history. The baseline is
    /// left untouched if scoring fails.
    pub fn get_trending_and_ingest(&mut self, objects: &[O]) -> Result<Vec<(V, f64)>> {
        let trending = self.get_trending(objects)?;
        self.reset_baseline();
        self.add_historical_documents(objects)?;
        Ok(trending)
    }

    /// Drop all history, cached windows and bounds. Registered types are kept.
    pub fn reset_baseline(&mut self) {
        log::info!(
            "Resetting baseline ({} token(s), {} window(s))",
            self.history.len(),
            self.windows.len()
        );
        self.history.clear();
        self.windows.clear();
        self.earliest_window = None;
        self.latest_window = None;
        self.finalized = false;
    }

    /// Values of every token with history
    pub fn tokens(&self) -> HashSet<V> {
        self.history.values().cloned().collect()
    }

    /// Historical record for one token
    pub fn token(&self, value: &V) -> Result<&Token<V>> {
        self.history.get(value)
    }

    /// Windows containing `timestamp`, anchor first. Does not affect the baseline.
    pub fn windows_for_timestamp(&self, timestamp: i64) -> Result<Vec<Window>> {
        self.windows.lookup(timestamp)
    }

    pub fn config(&self) -> &TrendingConfig {
        &self.config
    }

    pub fn earliest_window(&self) -> Option<Window> {
        self.earliest_window
    }

    pub fn latest_window(&self) -> Option<Window> {
        self.latest_window
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// A current document is stale when its anchor window closed before the
    /// latest historical window opened.
    fn ensure_not_stale(&self, timestamp: i64) -> Result<()> {
        let Some(latest) = self.latest_window else {
            return Ok(());
        };
        if self.windows.anchor(timestamp)?.end() <= latest.start() {
            return Err(TrendingError::DocumentTooOld {
                timestamp,
                latest_window_start: latest.start(),
            });
        }
        Ok(())
    }

    fn score_claimed(
        &self,
        claimed: &TokenStore<V>,
        current: Vec<(V, f64)>,
    ) -> Result<Vec<(V, f64)>> {
        let mut trending = Vec::with_capacity(current.len());
        for (value, score) in current {
            let Ok(token) = claimed.get(&value) else {
                match self.config.unknown_tokens {
                    UnknownTokenPolicy::Zero => trending.push((value, 0.0)),
                    UnknownTokenPolicy::Skip => {
                        log::warn!("Skipping token {value:?}: no historical record");
                    }
                    UnknownTokenPolicy::Error => {
                        return Err(TrendingError::UnknownToken(format!("{value:?}")));
                    }
                }
                continue;
            };

            let baseline = token.baseline();
            let z = stats::z_score(score, &baseline).ok_or_else(|| {
                TrendingError::DegenerateDistribution {
                    token: format!("{value:?}"),
                    samples: baseline.len(),
                }
            })?;
            trending.push((value, z));
        }
        Ok(trending)
    }
}

impl<O, V: TokenValue> fmt::Debug for Trending<O, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trending")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("windows", &self.windows.len())
            .field("tokens", &self.history.len())
            .field("earliest_window", &self.earliest_window)
            .field("latest_window", &self.latest_window)
            .field("finalized", &self.finalized)
            .finish()
    }
}
