//! Categorical label encoding
//!
//! One `CategoryEncoder` per categorical attribute maps label strings to
//! integer codes. Codes are assigned in order of first appearance, so
//! fitting the same column twice reproduces the same mapping. A domain only
//! ever grows: labels unseen at fit time are appended on first use and keep
//! their code for the rest of the process.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use crate::error::EncodeError;

/// Code domain for a single categorical attribute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryEncoder {
    classes: Vec<String>,
    codes: HashMap<String, usize>,
}

impl CategoryEncoder {
    /// Build a domain from training labels, in order of first appearance
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut encoder = Self::default();
        for label in labels {
            encoder.get_or_insert(label.as_ref());
        }
        encoder
    }

    /// Code of a known label, without touching the domain
    pub fn get(&self, label: &str) -> Option<usize> {
        self.codes.get(label).copied()
    }

    /// Code of `label`, appending it with the next unused code if unseen
    fn get_or_insert(&mut self, label: &str) -> usize {
        if let Some(code) = self.get(label) {
            return code;
        }
        let code = self.classes.len();
        self.classes.push(label.to_string());
        self.codes.insert(label.to_string(), code);
        code
    }

    /// Labels in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// All categorical encoders, keyed by attribute name.
///
/// Fitting happens once at startup through `&mut self`. Encoding goes
/// through `&self` so the registry can be shared across request handlers:
/// known labels only take the attribute's read lock, while an unseen label
/// takes the write lock and re-checks the domain before appending. Two
/// requests racing on the same new label therefore receive the same code.
#[derive(Debug, Default)]
pub struct EncoderRegistry {
    encoders: BTreeMap<String, RwLock<CategoryEncoder>>,
}

impl EncoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit (or refit) the encoder for `attribute` and return the codes of `labels`
    pub fn fit<S: AsRef<str>>(&mut self, attribute: &str, labels: &[S]) -> Vec<usize> {
        let encoder = CategoryEncoder::fit(labels);
        let codes = labels
            .iter()
            .filter_map(|label| encoder.get(label.as_ref()))
            .collect();
        self.encoders
            .insert(attribute.to_string(), RwLock::new(encoder));
        codes
    }

    /// Encode `label` under `attribute`, extending the domain when the label is unseen
    pub fn encode(&self, attribute: &str, label: &str) -> Result<usize, EncodeError> {
        let lock = self
            .encoders
            .get(attribute)
            .ok_or_else(|| EncodeError::UnknownAttribute(attribute.to_string()))?;

        // Domains are append-only, so a poisoned guard still holds a valid map
        if let Some(code) = lock
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(label)
        {
            return Ok(code);
        }

        let mut encoder = lock.write().unwrap_or_else(PoisonError::into_inner);
        let before = encoder.len();
        let code = encoder.get_or_insert(label);
        if encoder.len() > before {
            tracing::debug!(attribute, label, code, "extended code domain with unseen label");
        }
        Ok(code)
    }

    /// Whether `attribute` has a fitted encoder
    pub fn is_categorical(&self, attribute: &str) -> bool {
        self.encoders.contains_key(attribute)
    }

    /// Current size of the code domain for `attribute`
    pub fn domain_len(&self, attribute: &str) -> Option<usize> {
        self.encoders
            .get(attribute)
            .map(|lock| lock.read().unwrap_or_else(PoisonError::into_inner).len())
    }

    /// Snapshot of the labels known to `attribute`, in code order
    pub fn classes(&self, attribute: &str) -> Option<Vec<String>> {
        self.encoders.get(attribute).map(|lock| {
            lock.read()
                .unwrap_or_else(PoisonError::into_inner)
                .classes()
                .to_vec()
        })
    }

    /// Registered attribute names (sorted)
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}
