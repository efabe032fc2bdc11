//! Training summary report generation

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{FeatureKind, InferencePipeline};

/// One row of the feature table
#[derive(Debug, Clone)]
pub struct FeatureRow {
    pub name: String,
    pub kind: FeatureKind,
    pub score: f64,
    pub selected: bool,
    /// Domain size for categorical attributes
    pub domain: Option<usize>,
}

/// Summary of corpus preparation and model training
#[derive(Debug, Default)]
pub struct TrainingSummary {
    pub rows_loaded: usize,
    pub rows_dropped: usize,
    pub rows_used: usize,
    pub diseases_normalized: usize,
    pub labels_resampled: usize,
    pub labels_changed: usize,
    pub classes: Vec<String>,
    pub n_trees: usize,
    pub training_accuracy: f64,
    pub features: Vec<FeatureRow>,
}

impl TrainingSummary {
    pub fn from_pipeline(pipeline: &InferencePipeline) -> Self {
        let stats = pipeline.stats();
        let subset = pipeline.feature_subset();
        let encoders = pipeline.encoders();

        let features = stats
            .ranking
            .iter()
            .map(|score| FeatureRow {
                name: score.feature.clone(),
                kind: score.kind,
                score: score.score,
                selected: subset.contains(&score.feature),
                domain: encoders.domain_len(&score.feature),
            })
            .collect();

        Self {
            rows_loaded: stats.preparation.rows_loaded,
            rows_dropped: stats.preparation.rows_dropped,
            rows_used: stats.preparation.rows_used,
            diseases_normalized: stats.preparation.diseases_normalized,
            labels_resampled: stats.preparation.labels_resampled,
            labels_changed: stats.preparation.labels_changed,
            classes: stats.classes.clone(),
            n_trees: pipeline.classifier().n_trees(),
            training_accuracy: stats.training_accuracy,
            features,
        }
    }

    pub fn selected_count(&self) -> usize {
        self.features.iter().filter(|f| f.selected).count()
    }

    fn corpus_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("📁 Rows Loaded"), Cell::new(self.rows_loaded)]);
        table.add_row(vec![
            Cell::new("🗑️  Rows Dropped (Missing)"),
            Cell::new(self.rows_dropped).fg(if self.rows_dropped == 0 {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![
            Cell::new("🏥 Disease 'None' → 'Healthy'"),
            Cell::new(self.diseases_normalized),
        ]);
        table.add_row(vec![
            Cell::new("🎲 Labels Resampled"),
            Cell::new(self.labels_resampled),
        ]);
        table.add_row(vec![
            Cell::new("🔀 Labels Changed"),
            Cell::new(self.labels_changed).fg(Color::Yellow),
        ]);
        table.add_row(vec![
            Cell::new("✅ Rows Used"),
            Cell::new(self.rows_used)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("🥗 Diet Classes"),
            Cell::new(self.classes.join(", ")),
        ]);
        table.add_row(vec![Cell::new("🌲 Trees"), Cell::new(self.n_trees)]);

        let color = if self.training_accuracy > 0.9 {
            Color::Green
        } else if self.training_accuracy > 0.6 {
            Color::Yellow
        } else {
            Color::Red
        };
        table.add_row(vec![
            Cell::new("🎯 Training Accuracy"),
            Cell::new(format!("{:.1}%", self.training_accuracy * 100.0))
                .fg(color)
                .add_attribute(Attribute::Bold),
        ]);

        table
    }

    fn feature_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Feature").add_attribute(Attribute::Bold),
            Cell::new("Type").add_attribute(Attribute::Bold),
            Cell::new("Info Gain").add_attribute(Attribute::Bold),
            Cell::new("Domain").add_attribute(Attribute::Bold),
            Cell::new("Selected").add_attribute(Attribute::Bold),
        ]);

        for row in &self.features {
            let domain = row
                .domain
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            let (mark, color) = if row.selected {
                ("✓", Color::Green)
            } else {
                ("·", Color::DarkGrey)
            };
            table.add_row(vec![
                Cell::new(&row.name),
                Cell::new(row.kind),
                Cell::new(format!("{:.4}", row.score)).set_alignment(CellAlignment::Right),
                Cell::new(domain).set_alignment(CellAlignment::Right),
                Cell::new(mark).fg(color).set_alignment(CellAlignment::Center),
            ]);
        }

        table
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("TRAINING SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        // Indent the table
        for line in self.corpus_table().to_string().lines() {
            println!("    {}", line);
        }

        println!();
        println!(
            "    {} {} {}",
            style("📊").cyan(),
            style("FEATURE RANKING").white().bold(),
            style(format!(
                "({} of {} selected)",
                self.selected_count(),
                self.features.len()
            ))
            .dim()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        for line in self.feature_table().to_string().lines() {
            println!("    {}", line);
        }
    }
}
