// src/services/renderer.rs
//! Turns a router-agent payload into the reply shown in the chat.
//!
//! Everything here is a pure function of the response; no I/O, no clocks.

use crate::message::{ClassificationResponse, ComplexityDetails};

pub const TFIDF_FALLBACK_CONFIDENCE: f64 = 0.85;
pub const DEFAULT_FALLBACK_CONFIDENCE: f64 = 0.92;
pub const HIGH_TIER_THRESHOLD: f64 = 0.90;
pub const MEDIUM_TIER_THRESHOLD: f64 = 0.75;

// Legacy shape: longer tickets went to the transformer.
const LEGACY_LONG_INPUT_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Guess the model from the echoed input when `model_used` is absent.
    pub infer_model_from_input: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelKind {
    Tfidf,
    Transformer,
    Other(String),
}

impl ModelKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tfidf" => ModelKind::Tfidf,
            "transformer" => ModelKind::Transformer,
            _ => ModelKind::Other(raw.to_string()),
        }
    }

    pub fn badge(&self) -> &str {
        match self {
            ModelKind::Tfidf => "TF-IDF + SVM",
            ModelKind::Transformer => "Transformer",
            ModelKind::Other(name) => name,
        }
    }

    pub fn explanation(&self) -> Option<&'static str> {
        match self {
            ModelKind::Tfidf => Some("Used TF-IDF model for this straightforward technical issue."),
            ModelKind::Transformer => Some("Used Transformer model for better context understanding."),
            ModelKind::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceSource {
    Explicit,
    ModelFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn from_value(confidence: f64) -> Self {
        if confidence >= HIGH_TIER_THRESHOLD {
            ConfidenceTier::High
        } else if confidence >= MEDIUM_TIER_THRESHOLD {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confidence {
    pub value: f64,
    pub source: ConfidenceSource,
    pub tier: ConfidenceTier,
}

impl Confidence {
    pub fn resolve(explicit: Option<f64>, model: Option<&ModelKind>) -> Self {
        let (value, source) = match explicit {
            Some(value) => (value, ConfidenceSource::Explicit),
            None => {
                let fallback = match model {
                    Some(ModelKind::Tfidf) => TFIDF_FALLBACK_CONFIDENCE,
                    _ => DEFAULT_FALLBACK_CONFIDENCE,
                };
                (fallback, ConfidenceSource::ModelFallback)
            }
        };
        Self { value, source, tier: ConfidenceTier::from_value(value) }
    }

    /// Bar fill in percent, clamped to the bar.
    pub fn bar_width(&self) -> f64 {
        (self.value * 100.0).clamp(0.0, 100.0)
    }

    pub fn label(&self) -> String {
        format!("Confidence: {:.1}%", self.value * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRow {
    pub complexity: Option<String>,
    pub processing_time: Option<String>,
}

impl MetricsRow {
    pub fn items(&self) -> Vec<&str> {
        [self.complexity.as_deref(), self.processing_time.as_deref()]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    WordCount,
    TechnicalTerms,
    Language,
    AvgSentenceLength,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailLine {
    pub field: DetailField,
    pub label: &'static str,
    pub value: String,
}

impl DetailLine {
    pub fn text(&self) -> String {
        format!("{}: {}", self.label, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    CodeSnippets,
    ErrorLogs,
}

impl Indicator {
    pub fn text(&self) -> &'static str {
        match self {
            Indicator::CodeSnippets => "Contains code snippets",
            Indicator::ErrorLogs => "Contains error logs",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailPanel {
    pub lines: Vec<DetailLine>,
    pub indicators: Vec<Indicator>,
    expanded: bool,
}

impl DetailPanel {
    fn from_details(details: &ComplexityDetails) -> Self {
        let mut lines = Vec::new();
        if let Some(count) = details.word_count {
            lines.push(DetailLine { field: DetailField::WordCount, label: "Word count", value: count.to_string() });
        }
        if let Some(count) = details.technical_terms {
            lines.push(DetailLine {
                field: DetailField::TechnicalTerms,
                label: "Technical terms",
                value: count.to_string(),
            });
        }
        if let Some(code) = details.language.as_deref() {
            lines.push(DetailLine {
                field: DetailField::Language,
                label: "Language",
                value: language_name(code).to_string(),
            });
        }
        if let Some(avg) = details.avg_sentence_length {
            lines.push(DetailLine {
                field: DetailField::AvgSentenceLength,
                label: "Avg. sentence length",
                value: format!("{avg:.1}"),
            });
        }

        let mut indicators = Vec::new();
        if details.has_code_snippets == Some(true) {
            indicators.push(Indicator::CodeSnippets);
        }
        if details.has_error_logs == Some(true) {
            indicators.push(Indicator::ErrorLogs);
        }

        Self { lines, indicators, expanded: false }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn toggle(&mut self) -> bool {
        self.expanded = !self.expanded;
        self.expanded
    }

    pub fn fields(&self) -> Vec<DetailField> {
        self.lines.iter().map(|l| l.field).collect()
    }

    /// Lines currently shown: nothing while collapsed. The indicators
    /// section only appears when at least one flag is set.
    pub fn visible_lines(&self) -> Vec<String> {
        if !self.expanded {
            return Vec::new();
        }
        let mut out: Vec<String> = self.lines.iter().map(DetailLine::text).collect();
        if !self.indicators.is_empty() {
            out.push("Indicators:".to_string());
            out.extend(self.indicators.iter().map(|i| format!("  - {}", i.text())));
        }
        out
    }
}

/// A fully rendered classification, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    pub category: String,
    pub summary: String,
    pub model: Option<ModelKind>,
    pub confidence: Confidence,
    pub reasoning: Option<String>,
    pub metrics: Option<MetricsRow>,
    pub details: Option<DetailPanel>,
}

impl AgentReply {
    pub fn category_line(&self) -> String {
        format!("Category: {}", self.category)
    }
}

pub fn language_name(code: &str) -> &str {
    match code.to_ascii_lowercase().as_str() {
        "en" => "English",
        "fr" => "French",
        "ar" => "Arabic",
        "es" => "Spanish",
        "de" => "German",
        _ => code,
    }
}

/// Older widgets had no `model_used` and guessed from the text itself.
pub fn guess_legacy_model(input: &str) -> ModelKind {
    if input.chars().count() > LEGACY_LONG_INPUT_CHARS || !input.is_ascii() {
        ModelKind::Transformer
    } else {
        ModelKind::Tfidf
    }
}

pub fn render_result(response: &ClassificationResponse, options: RenderOptions) -> AgentReply {
    let model = match response.model_used.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Some(ModelKind::parse(raw)),
        _ if options.infer_model_from_input => response.input.as_deref().map(guess_legacy_model),
        _ => None,
    };

    let confidence = Confidence::resolve(response.confidence, model.as_ref());

    let reasoning = response
        .reasoning
        .as_ref()
        .filter(|r| !r.trim().is_empty())
        .cloned();

    let metrics = MetricsRow {
        complexity: response.complexity_score.map(|s| format!("Complexity: {s:.2}")),
        processing_time: response.processing_time.map(|t| format!("Processing time: {t:.2}s")),
    };
    let metrics = (metrics.complexity.is_some() || metrics.processing_time.is_some()).then_some(metrics);

    AgentReply {
        category: response.prediction.clone(),
        summary: format!(
            "Ticket successfully classified. The issue appears to be related to {}.",
            response.prediction
        ),
        model,
        confidence,
        reasoning,
        metrics,
        details: response.complexity_details.as_ref().map(DetailPanel::from_details),
    }
}
