use crate::error::{Result, TrendingError};
use crate::token::TokenValue;
use std::collections::HashMap;
use std::fmt;

/// Objects the engine can interpret.
///
/// The tag selects which registered interpreter and weight function apply, so
/// one engine can accept several kinds of object (usually variants of an enum).
pub trait DocumentSource {
    fn type_tag(&self) -> &str;
}

/// Extracts `(unix timestamp in seconds, tokens)` from an object
pub type Interpreter<O, V> = Box<dyn Fn(&O) -> (i64, Vec<V>) + Send + Sync>;

/// Weight of one token occurrence within a document
pub type WeightFunction<O, V> = Box<dyn Fn(&Document<'_, O, V>, &V) -> f64 + Send + Sync>;

/// Interpreter and weight function registered for one type tag
pub struct SupportedDocumentType<O, V> {
    tag: String,
    interpreter: Interpreter<O, V>,
    weight_function: WeightFunction<O, V>,
}

impl<O, V> SupportedDocumentType<O, V> {
    pub fn new(
        tag: impl Into<String>,
        interpreter: Interpreter<O, V>,
        weight_function: WeightFunction<O, V>,
    ) -> Self {
        Self {
            tag: tag.into(),
            interpreter,
            weight_function,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl<O, V> fmt::Debug for SupportedDocumentType<O, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupportedDocumentType")
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Normalized view of a caller object
pub struct Document<'a, O, V> {
    timestamp: i64,
    tokens: Vec<V>,
    source: &'a O,
    doc_type: &'a SupportedDocumentType<O, V>,
}

impl<'a, O, V: TokenValue> Document<'a, O, V> {
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn tokens(&self) -> &[V] {
        &self.tokens
    }

    /// The object this document was interpreted from
    pub fn source(&self) -> &'a O {
        self.source
    }

    pub fn doc_type(&self) -> &'a SupportedDocumentType<O, V> {
        self.doc_type
    }

    /// Weight of `value` in this document according to its type
    pub fn weight_of(&self, value: &V) -> Result<f64> {
        let weight = (self.doc_type.weight_function)(self, value);
        if !weight.is_finite() {
            return Err(TrendingError::InvalidWeight {
                token: format!("{value:?}"),
                weight,
            });
        }
        Ok(weight)
    }

    /// Every token occurrence paired with its weight, in document order
    pub fn weighted_tokens(&self) -> Result<Vec<(V, f64)>> {
        self.tokens
            .iter()
            .map(|value| Ok((value.clone(), self.weight_of(value)?)))
            .collect()
    }
}

impl<O, V: fmt::Debug> fmt::Debug for Document<'_, O, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("timestamp", &self.timestamp)
            .field("tokens", &self.tokens)
            .field("type", &self.doc_type.tag)
            .finish()
    }
}

/// Registry of supported document types keyed by tag
pub struct TypeRegistry<O, V> {
    types: HashMap<String, SupportedDocumentType<O, V>>,
}

impl<O, V> Default for TypeRegistry<O, V> {
    fn default() -> Self {
        Self {
            types: HashMap::new(),
        }
    }
}

impl<O: DocumentSource, V: TokenValue> TypeRegistry<O, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type, replacing any previous registration for the same tag
    pub fn register(&mut self, doc_type: SupportedDocumentType<O, V>) {
        if self.types.contains_key(doc_type.tag()) {
            log::debug!("Replacing interpreter for type {}", doc_type.tag());
        }
        self.types.insert(doc_type.tag.clone(), doc_type);
    }

    #[must_use]
    pub fn is_supported(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Interpret `object` with the type registered for its tag
    pub fn resolve<'a>(&'a self, object: &'a O) -> Result<Document<'a, O, V>> {
        let tag = object.type_tag();
        let doc_type = self
            .types
            .get(tag)
            .ok_or_else(|| TrendingError::unsupported_type(tag))?;
        let (timestamp, tokens) = (doc_type.interpreter)(object);
        Ok(Document {
            timestamp,
            tokens,
            source: object,
            doc_type,
        })
    }
}

impl<O, V> fmt::Debug for TypeRegistry<O, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}
