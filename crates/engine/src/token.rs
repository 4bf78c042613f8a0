use crate::error::{Result, TrendingError};
use crate::window::Window;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Debug;
use std::hash::Hash;

/// Bound shared by every token value type
pub trait TokenValue: Eq + Hash + Clone + Debug {}

impl<T: Eq + Hash + Clone + Debug> TokenValue for T {}

/// A trend candidate and its accumulated score per window
#[derive(Debug, Clone, PartialEq)]
pub struct Token<V> {
    value: V,
    window_scores: BTreeMap<Window, f64>,
    empty_windows: BTreeSet<Window>,
}

impl<V: TokenValue> Token<V> {
    #[must_use]
    pub fn new(value: V) -> Self {
        Self {
            value,
            window_scores: BTreeMap::new(),
            empty_windows: BTreeSet::new(),
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Add a weighted contribution to a window
    pub fn add_weight(&mut self, window: Window, weight: f64) {
        *self.window_scores.entry(window).or_insert(0.0) += weight;
        self.empty_windows.remove(&window);
    }

    /// Whether this token has any entry (real or backfilled) for `window`
    #[must_use]
    pub fn is_mentioned_in(&self, window: &Window) -> bool {
        self.window_scores.contains_key(window)
    }

    /// Record an explicit zero for a window the token was absent from while
    /// other tokens were present. Existing scores are left alone.
    pub fn backfill_zero(&mut self, window: Window) {
        self.window_scores.entry(window).or_insert(0.0);
        self.empty_windows.remove(&window);
    }

    /// Backfill a window in which nothing at all was observed
    pub fn mark_empty(&mut self, window: Window) {
        if !self.is_mentioned_in(&window) {
            self.window_scores.insert(window, 0.0);
            self.empty_windows.insert(window);
        }
    }

    /// The per-window score distribution used as the z-score baseline,
    /// ordered by window start.
    #[must_use]
    pub fn baseline(&self) -> Vec<f64> {
        self.window_scores.values().copied().collect()
    }

    pub fn scores_by_window(&self) -> &BTreeMap<Window, f64> {
        &self.window_scores
    }

    /// Windows that were backfilled because nothing was observed in them
    pub fn empty_windows(&self) -> &BTreeSet<Window> {
        &self.empty_windows
    }

    /// Number of windows in the baseline
    #[must_use]
    pub fn window_count(&self) -> usize {
        self.window_scores.len()
    }
}

/// Registry of token value -> Token
#[derive(Debug, Clone)]
pub struct TokenStore<V> {
    tokens: HashMap<V, Token<V>>,
}

impl<V> Default for TokenStore<V> {
    fn default() -> Self {
        Self {
            tokens: HashMap::new(),
        }
    }
}

impl<V: TokenValue> TokenStore<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh, empty token for `value`.
    ///
    /// An existing token with the same value is replaced and its history lost;
    /// check [`TokenStore::contains`] first.
    pub fn add(&mut self, value: V) -> &mut Token<V> {
        let token = Token::new(value.clone());
        match self.tokens.entry(value) {
            Entry::Occupied(mut entry) => {
                entry.insert(token);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(token),
        }
    }

    /// Existing token for `value`, created empty if absent
    pub fn get_or_add(&mut self, value: &V) -> &mut Token<V> {
        self.tokens
            .entry(value.clone())
            .or_insert_with(|| Token::new(value.clone()))
    }

    pub fn get(&self, value: &V) -> Result<&Token<V>> {
        self.tokens
            .get(value)
            .ok_or_else(|| TrendingError::TokenNotFound(format!("{value:?}")))
    }

    pub fn get_mut(&mut self, value: &V) -> Result<&mut Token<V>> {
        self.tokens
            .get_mut(value)
            .ok_or_else(|| TrendingError::TokenNotFound(format!("{value:?}")))
    }

    #[must_use]
    pub fn contains(&self, value: &V) -> bool {
        self.tokens.contains_key(value)
    }

    /// Take ownership of a token out of the store
    pub fn take(&mut self, value: &V) -> Option<Token<V>> {
        self.tokens.remove(value)
    }

    /// Hand ownership of `token` to this store.
    ///
    /// Fails without modifying the store if a token with the same value is
    /// already present; the rejected token is dropped.
    pub fn insert(&mut self, token: Token<V>) -> Result<()> {
        if self.contains(token.value()) {
            return Err(TrendingError::TokenAlreadyPresent(format!(
                "{:?}",
                token.value()
            )));
        }
        self.tokens.insert(token.value().clone(), token);
        Ok(())
    }

    /// Move the token for `value` from `from` into `to`.
    ///
    /// Fails if `to` already owns `value` (nothing moves) or if `from` does not.
    pub fn move_token(from: &mut Self, to: &mut Self, value: &V) -> Result<()> {
        if to.contains(value) {
            return Err(TrendingError::TokenAlreadyPresent(format!("{value:?}")));
        }
        let token = from
            .take(value)
            .ok_or_else(|| TrendingError::TokenNotFound(format!("{value:?}")))?;
        to.tokens.insert(value.clone(), token);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.tokens.keys()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token<V>> {
        self.tokens.values()
    }

    pub fn tokens_mut(&mut self) -> impl Iterator<Item = &mut Token<V>> {
        self.tokens.values_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
