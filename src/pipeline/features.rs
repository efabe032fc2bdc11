//! Encoded feature columns and the frozen feature subset

use serde::Serialize;

/// How a feature was derived from the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeatureKind {
    /// Numeric column, used as-is
    Numeric,
    /// Categorical column, encoded through the registry
    Categorical,
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureKind::Numeric => write!(f, "numeric"),
            FeatureKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// A candidate column after cleaning and encoding
#[derive(Debug, Clone)]
pub struct FeatureColumn {
    pub name: String,
    pub kind: FeatureKind,
    pub values: Vec<f64>,
}

impl FeatureColumn {
    pub fn new(name: impl Into<String>, kind: FeatureKind, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }
}

/// Ordered list of the columns the classifier is trained on.
///
/// The same order shapes every training row and every request row, so
/// features are always addressed by name and never by a free-floating index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSubset {
    names: Vec<String>,
}

impl FeatureSubset {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Position of `name` in the subset
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subset_preserves_order() {
        let subset = FeatureSubset::new(vec![
            "Severity".to_string(),
            "Age".to_string(),
            "BMI".to_string(),
        ]);
        assert_eq!(subset.position("Age"), Some(1));
        assert_eq!(subset.iter().collect::<Vec<_>>(), vec!["Severity", "Age", "BMI"]);
        assert!(subset.contains("BMI"));
        assert!(!subset.contains("Gender"));
    }
}
