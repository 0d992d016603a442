// src/report.rs — Human-readable report from a finished run

use crate::core::types::{Candidate, Evaluation, RunState};

pub const WIDTH: usize = 80;
const WRAP_WIDTH: usize = 76;
const WRAP_INDENT: &str = "    ";
const NA: &str = "N/A";

/// Render the final state. Pure: the same state always renders to the
/// same text.
pub fn render(state: &RunState) -> String {
    let mut out = Vec::new();
    let heavy = "=".repeat(WIDTH);
    let light = "-".repeat(WIDTH);

    out.push(heavy.clone());
    out.push(centered(&format!(
        "{} - DESIGN EXPLORATION",
        state.brief.title.to_uppercase()
    )));
    out.push(heavy.clone());
    out.push(String::new());
    out.push(format!("  Iterations completed: {}", state.iteration));
    out.push(format!("  Final candidates: {}", state.candidates.len()));
    out.push(String::new());

    out.push(light.clone());
    out.push("  FINAL CANDIDATES".to_string());
    out.push(light);

    if state.candidates.is_empty() {
        out.push(String::new());
        out.push("  No candidates.".to_string());
    }
    for candidate in &state.candidates {
        let score = state
            .evaluation_for(candidate.id)
            .map(|e| format!("{}/10", e.overall_score))
            .unwrap_or_else(|| NA.to_string());
        out.push(String::new());
        out.push(format!("  #{}: {}", candidate.id, field(candidate, "microcontroller")));
        out.push(format!("      * Sensor: {}", field(candidate, "sensor_type")));
        out.push(format!("      * ADC: {}", adc(candidate)));
        out.push(format!("      * BLE: {}", ble(candidate)));
        out.push(format!("      * Battery: {}", field(candidate, "battery")));
        out.push(format!("      * Score: {score}"));
    }

    out.push(String::new());
    out.push(heavy.clone());
    out.push(centered("TOP PICK"));
    out.push(heavy.clone());
    out.push(String::new());

    match &state.top_pick {
        Some(pick) => {
            out.push(format!("  #{}: {}", pick.id, field(pick, "microcontroller")));
            out.push(format!("      * Sensor Type: {}", field(pick, "sensor_type")));
            out.push(format!("      * ADC Bits: {}", adc(pick)));
            out.push(format!("      * BLE Module: {}", ble(pick)));
            out.push(format!("      * Battery: {}", field(pick, "battery")));

            let eval = state.evaluation_for(pick.id);
            let score = |f: fn(&Evaluation) -> f64| {
                eval.map(|e| format!("{}/10", f(e)))
                    .unwrap_or_else(|| NA.to_string())
            };
            out.push(String::new());
            out.push("  Score Breakdown:".to_string());
            out.push(format!("      * Accuracy:    {}", score(|e| e.accuracy_score)));
            out.push(format!("      * Power:       {}", score(|e| e.power_score)));
            out.push(format!("      * Cost:        {}", score(|e| e.cost_score)));
            out.push(format!("      * Reliability: {}", score(|e| e.reliability_score)));
            out.push(format!("      {}", "─".repeat(21)));
            out.push(format!("      * Overall:     {}", score(|e| e.overall_score)));

            out.push(String::new());
            out.push("  Why this is the best choice:".to_string());
            let lines = wrap(&state.justification, WRAP_WIDTH, WRAP_INDENT);
            if lines.is_empty() {
                out.push(format!("{WRAP_INDENT}{NA}"));
            } else {
                out.extend(lines);
            }
        }
        None => {
            out.push("  No top pick selected.".to_string());
            let lines = wrap(&state.justification, WRAP_WIDTH, WRAP_INDENT);
            if !lines.is_empty() {
                out.push(String::new());
                out.extend(lines);
            }
        }
    }

    out.push(String::new());
    out.push(heavy);

    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn field(candidate: &Candidate, key: &str) -> String {
    candidate
        .param_text(key)
        .unwrap_or_else(|| NA.to_string())
}

fn adc(candidate: &Candidate) -> String {
    match candidate.param_text("adc_bits") {
        Some(bits) if bits.chars().all(|c| c.is_ascii_digit()) => format!("{bits}-bit"),
        Some(other) => other,
        None => NA.to_string(),
    }
}

fn ble(candidate: &Candidate) -> String {
    candidate
        .param_text("ble_module_tx_interval")
        .or_else(|| candidate.param_text("ble_module"))
        .unwrap_or_else(|| NA.to_string())
}

fn centered(text: &str) -> String {
    let len = text.chars().count();
    let pad = WIDTH.saturating_sub(len) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

/// Greedy word wrap. Lines start with `indent` and stay within `width`
/// columns unless a single word is longer.
pub fn wrap(text: &str, width: usize, indent: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::from(indent);
    let mut len = indent.chars().count();
    let base = len;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if len > base && len + 1 + word_len > width {
            lines.push(std::mem::replace(&mut line, String::from(indent)));
            len = base;
        }
        if len > base {
            line.push(' ');
            len += 1;
        }
        line.push_str(word);
        len += word_len;
    }
    if len > base {
        lines.push(line);
    }
    lines
}
