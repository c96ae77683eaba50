// Plain-text briefing for an external chat assistant, and the slider
// directives it may answer with.

use std::fmt;
use std::fmt::Write as _;

use serde::Deserialize;

use crate::params::ModelParams;
use crate::sliders::SliderInputs;
use crate::state::SimulationState;
use crate::types::{DisruptionVariant, SliderKey};

pub const SLIDER_COMMAND_PREFIX: &str = "SLIDER_CHANGE:";

/// Number of log lines quoted in a briefing.
pub const BRIEFING_EVENTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StabilityLabel {
    Critical,
    Unstable,
    Strained,
    Stable,
}

impl StabilityLabel {
    pub fn of(stability: f64) -> Self {
        if stability >= 70.0 {
            StabilityLabel::Stable
        } else if stability >= 45.0 {
            StabilityLabel::Strained
        } else if stability >= 25.0 {
            StabilityLabel::Unstable
        } else {
            StabilityLabel::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StabilityLabel::Stable => "Stable",
            StabilityLabel::Strained => "Strained",
            StabilityLabel::Unstable => "Unstable",
            StabilityLabel::Critical => "Critical",
        }
    }
}

impl fmt::Display for StabilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON name the assistant should use for `key` under `variant`.
fn command_key(key: SliderKey, variant: DisruptionVariant) -> &'static str {
    match key {
        SliderKey::ExternalShock => variant.shock_key(),
        SliderKey::Resilience => variant.resilience_key(),
        other => other.as_str(),
    }
}

/// Summary of the latest year, the slider settings and the most recent
/// events. Empty history yields an empty string.
pub fn briefing(history: &[SimulationState], sliders: &SliderInputs, params: &ModelParams) -> String {
    let Some(latest) = history.last() else {
        return String::new();
    };
    let variant = params.disruption.variant;
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "CURRENT SIMULATION STATE (Year {}):", latest.year);
    let _ = writeln!(
        out,
        "- GDP Index: {:.1} (100 = baseline {})",
        latest.gdp_index, params.start_year
    );
    let _ = writeln!(
        out,
        "- Unemployment: {:.1}% (structural baseline ~{:.0}%)",
        latest.unemployment_rate * 100.0,
        params.unemployment.structural_rate * 100.0
    );
    let _ = writeln!(
        out,
        "- {}: {:.3} (1.000 = no change from baseline)",
        variant.index_name(),
        latest.disruption_index
    );
    let _ = writeln!(
        out,
        "- Inequality Index: {:.2} (1.00 = baseline)",
        latest.inequality_index
    );
    let _ = writeln!(
        out,
        "- Stability Index: {:.1}/100 ({})",
        latest.stability_index,
        StabilityLabel::of(latest.stability_index)
    );

    out.push_str("\nCURRENT SLIDER SETTINGS:\n");
    for key in SliderKey::all() {
        let Some(spec) = params.slider(key) else {
            continue;
        };
        let _ = writeln!(
            out,
            "- {} ({}): {} (range {} to {})",
            spec.label,
            command_key(key, variant),
            sliders.get(key),
            spec.min,
            spec.max
        );
    }

    out.push_str("\nRECENT EVENTS:\n");
    for event in latest.recent_events(BRIEFING_EVENTS) {
        out.push_str(event);
        out.push('\n');
    }

    let _ = write!(
        out,
        "\nTo change a slider, reply with one line per change:\n{} {{\"key\": \"{}\", \"value\": 0.8}}\n",
        SLIDER_COMMAND_PREFIX,
        SliderKey::AiCapability.as_str()
    );
    out
}

// ============================================================================
// Slider commands - `SLIDER_CHANGE: {"key": ..., "value": ...}` directives
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderCommand {
    pub key: SliderKey,
    pub value: f64,
}

#[derive(Deserialize)]
struct RawCommand {
    key: String,
    value: serde_json::Value,
}

/// Byte range of each directive: the prefix, optional whitespace and a
/// brace-delimited body with no nested `}`.
fn directive_spans(text: &str) -> Vec<(usize, usize, usize)> {
    let mut spans = Vec::new();
    let mut from = 0;
    while let Some(found) = text[from..].find(SLIDER_COMMAND_PREFIX) {
        let start = from + found;
        let after_prefix = start + SLIDER_COMMAND_PREFIX.len();
        let rest = &text[after_prefix..];
        let body_start = after_prefix + (rest.len() - rest.trim_start().len());
        from = after_prefix;

        if !text[body_start..].starts_with('{') {
            continue;
        }
        let Some(close) = text[body_start..].find('}') else {
            continue;
        };
        let body_end = body_start + close + 1;
        // An empty body is not a directive.
        if body_end - body_start < 3 {
            continue;
        }
        spans.push((start, body_start, body_end));
        from = body_end;
    }
    spans
}

/// Every well-formed directive naming a known slider, in text order.
/// Malformed JSON, unknown keys and non-numeric values are skipped.
pub fn parse_slider_commands(text: &str) -> Vec<SliderCommand> {
    directive_spans(text)
        .into_iter()
        .filter_map(|(_, body_start, body_end)| {
            let raw: RawCommand = serde_json::from_str(&text[body_start..body_end]).ok()?;
            let key = SliderKey::parse(&raw.key)?;
            let value = raw.value.as_f64()?;
            Some(SliderCommand { key, value })
        })
        .collect()
}

/// `text` with every directive (and the newline right after it) removed, trimmed.
pub fn strip_slider_commands(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, _, end) in directive_spans(text) {
        out.push_str(&text[cursor..start]);
        cursor = end;
        if text[cursor..].starts_with('\n') {
            cursor += 1;
        }
    }
    out.push_str(&text[cursor..]);
    out.trim().to_string()
}
