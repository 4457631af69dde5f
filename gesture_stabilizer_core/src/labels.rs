use serde::Deserialize;

use crate::error::StabilizerError;

/// Raw label token as it appears in model metadata: either a class index or a name.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LabelToken {
    Index(u64),
    Name(String),
    /// Negative or fractional JSON numbers.
    Other(serde_json::Number),
}

impl LabelToken {
    /// Resolve the token to its display label.
    ///
    /// Non-negative integer tokens map to the `n`th letter counted from `'A'`;
    /// anything else is kept verbatim in its textual form.
    pub fn resolve(&self) -> Result<String, StabilizerError> {
        match self {
            LabelToken::Index(n) => letter_for_index(*n),
            LabelToken::Name(s) => match s.trim().parse::<u64>() {
                Ok(n) => letter_for_index(n),
                Err(_) => Ok(s.clone()),
            },
            LabelToken::Other(n) => Ok(n.to_string()),
        }
    }
}

fn letter_for_index(n: u64) -> Result<String, StabilizerError> {
    u32::try_from(n)
        .ok()
        .and_then(|n| n.checked_add('A' as u32))
        .and_then(char::from_u32)
        .map(String::from)
        .ok_or_else(|| StabilizerError::Metadata(format!("label index {n} has no character")))
}

#[derive(Debug, Deserialize)]
struct ModelMetadata {
    labels: Vec<LabelToken>,
}

/// Ordered class labels, positionally aligned with the classifier output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelCatalog {
    labels: Vec<String>,
}

impl LabelCatalog {
    /// Build a catalog from already-resolved label strings.
    pub fn new<I, S>(labels: I) -> Result<Self, StabilizerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(StabilizerError::EmptyCatalog);
        }
        Ok(Self { labels })
    }

    pub fn from_tokens<'a, I>(tokens: I) -> Result<Self, StabilizerError>
    where
        I: IntoIterator<Item = &'a LabelToken>,
    {
        let labels = tokens
            .into_iter()
            .map(LabelToken::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(labels)
    }

    /// Parse a model metadata document (`{"labels": [...]}`); other fields are ignored.
    pub fn from_metadata_json(s: &str) -> Result<Self, StabilizerError> {
        let meta: ModelMetadata = serde_json::from_str(s)?;
        Self::from_tokens(&meta.labels)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}
