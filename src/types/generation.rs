//! Generation tuning passed through to the provider

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AskError, Result};

const SUMMARY_PRESET: &str = "vectara-summary-table-query-ext-dec-2024-gpt-4o";
const EXTENDED_PROMPT: &str = "vectara-experimental-extended-2024-07-16";

/// Optional generation knobs.
///
/// Values are forwarded verbatim; the only checks are the numeric ranges in
/// [`validate`](Self::validate).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Any JSON number is accepted here so that fractional or negative
    /// values fail [`validate`](Self::validate) rather than deserialization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_response_characters: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_preset_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_name: Option<String>,
}

impl GenerationConfig {
    pub fn temperature(mut self, t: f64) -> Self {
        self.temperature = Some(t);
        self
    }

    pub fn max_response_characters(mut self, n: u32) -> Self {
        self.max_response_characters = Some(f64::from(n));
        self
    }

    pub fn frequency_penalty(mut self, p: f64) -> Self {
        self.frequency_penalty = Some(p);
        self
    }

    pub fn presence_penalty(mut self, p: f64) -> Self {
        self.presence_penalty = Some(p);
        self
    }

    pub fn generation_preset_name(mut self, name: impl Into<String>) -> Self {
        self.generation_preset_name = Some(name.into());
        self
    }

    pub fn prompt_name(mut self, name: impl Into<String>) -> Self {
        self.prompt_name = Some(name.into());
        self
    }

    /// Check numeric ranges: temperature 0..=2, max length a whole number
    /// in 1..=10000, penalties -2..=2. Failures carry the `INVALID_PARAMS`
    /// code.
    pub fn validate(&self) -> Result<()> {
        check_range("temperature", self.temperature, 0.0, 2.0)?;
        check_range("frequencyPenalty", self.frequency_penalty, -2.0, 2.0)?;
        check_range("presencePenalty", self.presence_penalty, -2.0, 2.0)?;
        if let Some(n) = self.max_response_characters
            && (n.fract() != 0.0 || !(1.0..=10_000.0).contains(&n))
        {
            return Err(AskError::invalid_params(
                "maxResponseCharacters must be a whole number between 1 and 10000",
            ));
        }
        Ok(())
    }

    /// Maximum answer length as sent upstream. Only meaningful once
    /// [`validate`](Self::validate) has passed.
    pub fn max_response_chars(&self) -> Option<u32> {
        self.max_response_characters
            .filter(|n| n.fract() == 0.0 && (1.0..=10_000.0).contains(n))
            .map(|n| n as u32)
    }

    /// Layer `self` over `base`: fields set here win, unset fields fall
    /// back to `base`.
    pub fn merged_over(&self, base: &GenerationConfig) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature.or(base.temperature),
            max_response_characters: self
                .max_response_characters
                .or(base.max_response_characters),
            frequency_penalty: self.frequency_penalty.or(base.frequency_penalty),
            presence_penalty: self.presence_penalty.or(base.presence_penalty),
            generation_preset_name: self
                .generation_preset_name
                .clone()
                .or_else(|| base.generation_preset_name.clone()),
            prompt_name: self.prompt_name.clone().or_else(|| base.prompt_name.clone()),
        }
    }
}

fn check_range(field: &str, value: Option<f64>, min: f64, max: f64) -> Result<()> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(AskError::invalid_params(format!(
            "{field} must be between {min} and {max}"
        ))),
        _ => Ok(()),
    }
}

/// Named generation profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationPreset {
    #[default]
    Default,
    Creative,
    Precise,
}

impl GenerationPreset {
    pub fn config(&self) -> GenerationConfig {
        let (temperature, max_chars, frequency_penalty) = match self {
            GenerationPreset::Default => (0.7, 1200, 0.1),
            GenerationPreset::Creative => (1.0, 1500, 0.2),
            GenerationPreset::Precise => (0.3, 800, 0.0),
        };
        GenerationConfig::default()
            .temperature(temperature)
            .max_response_characters(max_chars)
            .frequency_penalty(frequency_penalty)
            .generation_preset_name(SUMMARY_PRESET)
            .prompt_name(EXTENDED_PROMPT)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationPreset::Default => "default",
            GenerationPreset::Creative => "creative",
            GenerationPreset::Precise => "precise",
        }
    }
}

impl fmt::Display for GenerationPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationPreset {
    type Err = AskError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(GenerationPreset::Default),
            "creative" => Ok(GenerationPreset::Creative),
            "precise" => Ok(GenerationPreset::Precise),
            other => Err(AskError::Configuration(format!(
                "unknown generation preset '{other}'"
            ))),
        }
    }
}
