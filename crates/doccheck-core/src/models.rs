/// Result and configuration data model.
///
/// `DocumentCheckResult` is the unit of output produced by every check run.
/// Both it and `VisibilitySettings` serialize with an explicit `version`
/// field; payloads without one are treated as version 0 and upgraded on
/// load, while payloads newer than the code are rejected with
/// `CoreError::UnsupportedVersion`.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::error::CoreError;

/// Severity of an issue. Lower ordinal is more severe: ERROR < WARNING < INFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error = 0,
    Warning = 1,
    Info = 2,
}

impl Severity {
    /// Wire ordinal used in serialized payloads.
    pub fn ordinal(self) -> u32 {
        self as u32
    }

    pub fn from_ordinal(n: u64) -> Option<Self> {
        match n {
            0 => Some(Self::Error),
            1 => Some(Self::Warning),
            2 => Some(Self::Info),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    /// Display color for rendered reports.
    pub fn color(self) -> &'static str {
        match self {
            Self::Error => "red",
            Self::Warning => "orange",
            Self::Info => "blue",
        }
    }

    /// Lenient parse from any serialized representation: ordinal, symbolic
    /// name (case/space/underscore-insensitive), or null. Returns `None` for
    /// anything unrecognized; never errors.
    pub fn parse_lenient(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().and_then(Self::from_ordinal),
            Value::String(s) => {
                let normalized = s.trim().replace([' ', '_'], "").to_ascii_lowercase();
                match normalized.as_str() {
                    "error" => Some(Self::Error),
                    "warning" => Some(Self::Warning),
                    "info" => Some(Self::Info),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Supported regulatory document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    AdvisoryCircular,
    AirworthinessCriteria,
    DeviationMemo,
    Exemption,
    FederalRegisterNotice,
    Order,
    PolicyStatement,
    Rule,
    SpecialCondition,
    TechnicalStandardOrder,
    Other,
}

impl DocumentType {
    /// Key used to look up per-type entries in the pattern registry.
    pub fn as_key(self) -> &'static str {
        match self {
            Self::AdvisoryCircular => "advisory_circular",
            Self::AirworthinessCriteria => "airworthiness_criteria",
            Self::DeviationMemo => "deviation_memo",
            Self::Exemption => "exemption",
            Self::FederalRegisterNotice => "federal_register_notice",
            Self::Order => "order",
            Self::PolicyStatement => "policy_statement",
            Self::Rule => "rule",
            Self::SpecialCondition => "special_condition",
            Self::TechnicalStandardOrder => "technical_standard_order",
            Self::Other => "other",
        }
    }
}

impl FromStr for DocumentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace([' ', '-'], "_").to_ascii_lowercase();
        match normalized.as_str() {
            "advisory_circular" => Ok(Self::AdvisoryCircular),
            "airworthiness_criteria" => Ok(Self::AirworthinessCriteria),
            "deviation_memo" => Ok(Self::DeviationMemo),
            "exemption" => Ok(Self::Exemption),
            "federal_register_notice" => Ok(Self::FederalRegisterNotice),
            "order" => Ok(Self::Order),
            "policy_statement" => Ok(Self::PolicyStatement),
            "rule" => Ok(Self::Rule),
            "special_condition" => Ok(Self::SpecialCondition),
            "technical_standard_order" => Ok(Self::TechnicalStandardOrder),
            "other" => Ok(Self::Other),
            _ => Err(CoreError::UnknownDocumentType(s.to_string())),
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// A single issue found during document checking.
///
/// Every issue carries a non-empty category. Producers that omit one get it
/// filled in from the owning result's checker name (or "general") when the
/// issue is added.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub message: String,
    pub severity: Severity,
    pub line_number: Option<usize>,
    pub suggestion: Option<String>,
    pub category: String,
    /// Additional producer-specific fields, carried through serialization.
    pub extra: BTreeMap<String, Value>,
}

impl Issue {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            line_number: None,
            suggestion: None,
            category: String::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_line_number(mut self, line: usize) -> Self {
        self.line_number = Some(line);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("message".into(), json!(self.message));
        map.insert("severity".into(), json!(self.severity.ordinal()));
        map.insert("line_number".into(), json!(self.line_number));
        map.insert("category".into(), json!(self.category));
        if let Some(suggestion) = &self.suggestion {
            map.insert("suggestion".into(), json!(suggestion));
        }
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }

    fn from_value(value: &Value) -> Self {
        let obj = value.as_object();
        let get = |key: &str| obj.and_then(|m| m.get(key));

        // Unrecognized severity representations fall back to WARNING rather
        // than failing the decode; only version mismatches are fatal.
        let severity = get("severity")
            .and_then(Severity::parse_lenient)
            .unwrap_or(Severity::Warning);

        let known = ["message", "severity", "line_number", "category", "suggestion"];
        let extra = obj
            .map(|m| {
                m.iter()
                    .filter(|(k, _)| !known.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            message: get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            severity,
            line_number: get("line_number")
                .and_then(Value::as_u64)
                .map(|n| n as usize),
            suggestion: get("suggestion")
                .and_then(Value::as_str)
                .map(str::to_string),
            category: get("category")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            extra,
        }
    }
}

/// Result of a single document check.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentCheckResult {
    pub success: bool,
    pub issues: Vec<Issue>,
    pub checker_name: Option<String>,
    pub score: f64,
    pub severity: Option<Severity>,
    pub details: Option<Value>,
    pub partial_failures: Vec<Value>,
}

impl Default for DocumentCheckResult {
    fn default() -> Self {
        Self {
            success: true,
            issues: Vec::new(),
            checker_name: None,
            score: 1.0,
            severity: None,
            details: None,
            partial_failures: Vec::new(),
        }
    }
}

impl DocumentCheckResult {
    pub const SERIALIZATION_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(checker_name: impl Into<String>) -> Self {
        Self {
            checker_name: Some(checker_name.into()),
            ..Self::default()
        }
    }

    /// Add an issue, marking the run as unsuccessful and lowering the
    /// aggregate severity to the most severe seen so far (ties keep the
    /// first severity recorded).
    pub fn add_issue(&mut self, mut issue: Issue) {
        if issue.category.is_empty() {
            let fallback = self
                .checker_name
                .clone()
                .unwrap_or_else(|| "general".to_string());
            warn!(
                message = %issue.message,
                category = %fallback,
                "issue missing category, assigning fallback"
            );
            issue.category = fallback;
        }

        if self.severity.is_none() || issue.severity < self.severity.unwrap_or(Severity::Info) {
            self.severity = Some(issue.severity);
        }
        self.success = false;
        self.issues.push(issue);
    }

    /// Serialize to a JSON value with version metadata. Issue severities are
    /// coerced to their ordinals.
    pub fn to_value(&self) -> Value {
        json!({
            "version": Self::SERIALIZATION_VERSION,
            "success": self.success,
            "issues": self.issues.iter().map(Issue::to_value).collect::<Vec<_>>(),
            "checker_name": self.checker_name,
            "score": self.score,
            "severity": self.severity.map(Severity::ordinal),
            "details": self.details,
            "partial_failures": self.partial_failures,
        })
    }

    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    /// Deserialize from a JSON value. A missing `version` is treated as
    /// version 0 for backward compatibility; a version newer than
    /// `SERIALIZATION_VERSION` is rejected.
    pub fn from_value(data: &Value) -> Result<Self, CoreError> {
        let version = data
            .get("version")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32;
        if version > Self::SERIALIZATION_VERSION {
            return Err(CoreError::UnsupportedVersion(version));
        }

        let issues = data
            .get("issues")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(Issue::from_value).collect())
            .unwrap_or_default();

        Ok(Self {
            success: data.get("success").and_then(Value::as_bool).unwrap_or(true),
            issues,
            checker_name: data
                .get("checker_name")
                .and_then(Value::as_str)
                .map(str::to_string),
            score: data.get("score").and_then(Value::as_f64).unwrap_or(1.0),
            severity: data.get("severity").and_then(Severity::parse_lenient),
            details: data.get("details").filter(|v| !v.is_null()).cloned(),
            partial_failures: data
                .get("partial_failures")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        })
    }

    pub fn from_json(json_str: &str) -> Result<Self, CoreError> {
        let data: Value = serde_json::from_str(json_str).map_err(|e| CoreError::PatternConfig {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        Self::from_value(&data)
    }
}

/// Per-category visibility toggles for a check run.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilitySettings {
    pub show_readability: bool,
    pub show_analysis: bool,
    pub show_paragraph_length: bool,
    pub show_terminology: bool,
    pub show_headings: bool,
    pub show_structure: bool,
    pub show_format: bool,
    pub show_accessibility: bool,
    pub show_document_status: bool,
    pub show_acronym: bool,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            show_readability: true,
            show_analysis: true,
            show_paragraph_length: true,
            show_terminology: true,
            show_headings: true,
            show_structure: true,
            show_format: true,
            show_accessibility: true,
            show_document_status: true,
            show_acronym: true,
        }
    }
}

impl VisibilitySettings {
    pub const SERIALIZATION_VERSION: u32 = 1;

    /// Whether a check category should run and appear in output.
    /// Unknown categories are visible.
    pub fn is_visible(&self, category: &str) -> bool {
        match category {
            "readability" => self.show_readability,
            "analysis" => self.show_analysis,
            "paragraph_length" => self.show_paragraph_length,
            "terminology" => self.show_terminology,
            "headings" => self.show_headings,
            "structure" => self.show_structure,
            "format" => self.show_format,
            "accessibility" => self.show_accessibility,
            "document_status" => self.show_document_status,
            "acronym" => self.show_acronym,
            _ => true,
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "version": Self::SERIALIZATION_VERSION,
            "readability": self.show_readability,
            "analysis": self.show_analysis,
            "paragraph_length": self.show_paragraph_length,
            "terminology": self.show_terminology,
            "headings": self.show_headings,
            "structure": self.show_structure,
            "format": self.show_format,
            "accessibility": self.show_accessibility,
            "document_status": self.show_document_status,
            "acronym": self.show_acronym,
        })
    }

    /// Deserialize from a JSON value. Missing `version` means version 0;
    /// boolean fields accept "true/false/1/0/yes/no" strings and numbers.
    pub fn from_value(data: &Value) -> Result<Self, CoreError> {
        let version = data
            .get("version")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32;
        if version > Self::SERIALIZATION_VERSION {
            return Err(CoreError::UnsupportedVersion(version));
        }

        let flag = |key: &str| coerce_bool(data.get(key), true);

        Ok(Self {
            show_readability: flag("readability"),
            show_analysis: flag("analysis"),
            show_paragraph_length: flag("paragraph_length"),
            show_terminology: flag("terminology"),
            show_headings: flag("headings"),
            show_structure: flag("structure"),
            show_format: flag("format"),
            show_accessibility: flag("accessibility"),
            show_document_status: flag("document_status"),
            show_acronym: flag("acronym"),
        })
    }

    /// Parse from a JSON string. Malformed JSON yields the defaults (an
    /// absent settings form field must not fail the request); a valid
    /// payload with an unsupported version is still an error.
    pub fn from_json_str(json_str: &str) -> Result<Self, CoreError> {
        match serde_json::from_str::<Value>(json_str) {
            Ok(data) => Self::from_value(&data),
            Err(_) => Ok(Self::default()),
        }
    }
}

fn coerce_bool(value: Option<&Value>, default: bool) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" => true,
            "false" | "0" | "no" | "n" => false,
            _ => default,
        },
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(default),
        _ => default,
    }
}
