//! Dataset schema and training configuration

use serde::Serialize;

use super::forest::ForestConfig;

/// Fraction of labels overwritten with random labels before training
pub const DEFAULT_LABEL_NOISE: f64 = 0.15;

/// Number of columns kept in the feature subset
pub const DEFAULT_NUM_FEATURES: usize = 6;

/// Column names the pipeline relies on
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSchema {
    /// Column holding the class label
    pub label: String,
    /// Columns encoded through the registry
    pub categorical: Vec<String>,
    /// Columns never considered as features
    pub excluded: Vec<String>,
    /// Column whose "None" values mean "Healthy"
    pub disease_column: String,
}

impl Default for DatasetSchema {
    fn default() -> Self {
        let strings = |names: &[&str]| -> Vec<String> { names.iter().map(|s| s.to_string()).collect() };
        Self {
            label: "Diet_Recommendation".to_string(),
            categorical: strings(&[
                "Gender",
                "Disease_Type",
                "Severity",
                "Physical_Activity_Level",
                "Allergies",
                "Preferred_Cuisine",
            ]),
            // Identifier, label, outcome/physiological measurements and the
            // imbalance score; none of these are known when a request arrives
            excluded: strings(&[
                "Patient_ID",
                "Diet_Recommendation",
                "Adherence_to_Diet_Plan",
                "Weekly_Exercise_Hours",
                "Glucose_mg/dL",
                "Blood_Pressure_mmHg",
                "Cholesterol_mg/dL",
                "Daily_Caloric_Intake",
                "Dietary_Restrictions",
                "Dietary_Nutrient_Imbalance_Score",
                "Height_cm",
                "Weight_kg",
            ]),
            disease_column: "Disease_Type".to_string(),
        }
    }
}

impl DatasetSchema {
    pub fn is_categorical(&self, column: &str) -> bool {
        self.categorical.iter().any(|c| c == column)
    }

    pub fn is_excluded(&self, column: &str) -> bool {
        column == self.label || self.excluded.iter().any(|c| c == column)
    }
}

/// Settings for corpus preparation and training
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    /// Fraction of rows whose label is replaced by a random label (0 disables)
    pub label_noise: f64,
    /// Seed for the noise step; None draws from OS entropy
    pub noise_seed: Option<u64>,
    /// Size of the feature subset
    pub num_features: usize,
    pub forest: ForestConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label_noise: DEFAULT_LABEL_NOISE,
            noise_seed: None,
            num_features: DEFAULT_NUM_FEATURES,
            forest: ForestConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Same settings with label noise turned off
    pub fn without_noise(mut self) -> Self {
        self.label_noise = 0.0;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_excludes_label_and_id() {
        let schema = DatasetSchema::default();
        assert!(schema.is_excluded("Diet_Recommendation"));
        assert!(schema.is_excluded("Patient_ID"));
        assert!(!schema.is_excluded("Age"));
        assert!(schema.is_categorical("Preferred_Cuisine"));
        assert!(!schema.is_categorical("BMI"));
    }

    #[test]
    fn test_default_config_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.label_noise, 0.15);
        assert_eq!(config.num_features, 6);
        assert_eq!(config.forest.n_trees, 100);
        assert_eq!(config.forest.seed, 42);
        assert_eq!(config.without_noise().label_noise, 0.0);
    }
}
