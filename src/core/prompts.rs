// src/core/prompts.rs — Prompt templates for the backend-facing steps

use minijinja::{context, Environment};
use serde::Serialize;

use super::brief::DesignBrief;
use super::types::{Candidate, Evaluation, CANDIDATE_FIELDS};
use crate::infra::errors::DesignError;

pub const GENERATOR_SYSTEM: &str =
    "You are a technical design assistant. Always respond with valid JSON only.";
pub const EVALUATOR_SYSTEM: &str =
    "You are a technical evaluator. Always respond with valid JSON only.";
pub const REFINER_SYSTEM: &str =
    "You are a design optimization expert. Always respond with valid JSON only.";
pub const SELECTOR_SYSTEM: &str = "You are a senior design architect. Always respond with valid JSON only. \
     The selection_reasoning must be a plain string, not a nested object.";

const GENERATE: &str = r#"You are performing design space exploration for a wearable {{ title | lower }}.
Propose {{ count }} complete candidate hardware configurations that respect ALL objectives and constraints.

## Objectives
1. Minimize alert latency (detect and alert {{ alert_latency }})
2. Minimize power consumption (battery life {{ battery_life }})
3. Optimize measurement accuracy (MARD {{ mard_target }})
4. Maximize BLE reliability ({{ ble_reliability }} successful transmissions)

## Constraints
- Sampling interval: {{ sampling_interval }}
- Alert thresholds: {{ alert_thresholds }}
- Battery life: {{ battery_life }}
- ADC bits in {{ adc_bits }}
- BLE range: {{ ble_range }}
- Sampling stability: {{ sampling_stability }}
- AFE/sensor compatibility: {{ afe_sensor_compat }}
- MCU ADC must match the AFE output range
- BLE module must match an MCU interface in {{ mcu_ble_interface }}
- Form factor: {{ battery_form_factor }}
{% for line in extra %}
- {{ line }}
{% endfor %}

## Design space
1. Sensor and AFE: sensor type, bias voltage, response time tau, AFE gain, filtering, ADC resolution
2. MCU: family (Cortex-M0/M4, Nordic, TI MSP...), clock modes, ADC sampling, duty cycle
3. BLE subsystem: tx power, advertising interval, payload size, retry/ACK configuration
4. Battery and power: capacity, chemistry, regulator efficiency, power gating strategy
5. System timing: sampling interval, filtering window, BLE message bundling strategy

## Output
Return a JSON array with exactly {{ count }} candidates, ids 1 to {{ count }}.
Each candidate must contain:
- id
{% for field in fields %}
- {{ field }}
{% endfor %}
- rationale (link the design choices to latency, power, accuracy and BLE reliability)

Return ONLY valid JSON. No markdown, no explanations outside the JSON."#;

const EVALUATE: &str = r#"Evaluate each of these {{ title | lower }} candidates on:
1. Accuracy (how well the ADC and sensor meet precision needs)
2. Power efficiency (battery life optimization)
3. Cost (component affordability)
4. Reliability (proven components, robustness)

Requirements:
- Sampling interval: {{ sampling_interval }}
- Alert thresholds: {{ alert_thresholds }}
- Battery life: {{ battery_life }}

Candidates to evaluate:
{{ candidates }}

Return a JSON array with one evaluation per candidate, each with:
- candidate_id
- accuracy_score (0-10)
- power_score (0-10)
- cost_score (0-10)
- reliability_score (0-10)
- overall_score (weighted average, 0-10)
- feedback (brief improvement suggestions)

Return ONLY valid JSON, no markdown or explanation."#;

const REFINE: &str = r#"Refine these top {{ count }} {{ title | lower }} candidates based on their evaluation feedback.

Current top candidates:
{{ candidates }}

Evaluation feedback:
{{ feedback }}

Requirements:
- Sampling interval: {{ sampling_interval }}
- Alert thresholds: {{ alert_thresholds }}
- Battery life: {{ battery_life }}

Constraints:
- ADC bits in {{ adc_bits }}
- BLE range: {{ ble_range }}

Improve each candidate according to its feedback while respecting the constraints.
Keep every candidate's id unchanged.
Return a JSON array with the {{ count }} refined candidates, same structure as the input.
Return ONLY valid JSON, no markdown or explanation."#;

const SELECT: &str = r#"Select the BEST candidate from these refined {{ title | lower }} designs.

Final candidates:
{{ candidates }}

Latest evaluations:
{{ evaluations }}

Requirements:
{{ requirements }}

Return a JSON object with:
- top_pick: the complete selected candidate object
- selection_reasoning: a single STRING (not a nested object) with 2-3 paragraphs explaining why this is the best choice, weighing accuracy, power efficiency, cost and reliability.

Example format:
{"top_pick": {"id": 2, "microcontroller": "..."}, "selection_reasoning": "This candidate offers the best balance of..."}

Return ONLY valid JSON, no markdown or explanation."#;

fn environment() -> Result<Environment<'static>, DesignError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("generate", GENERATE)?;
    env.add_template("evaluate", EVALUATE)?;
    env.add_template("refine", REFINE)?;
    env.add_template("select", SELECT)?;
    Ok(env)
}

fn render(name: &str, ctx: minijinja::Value) -> Result<String, DesignError> {
    let env = environment()?;
    Ok(env.get_template(name)?.render(ctx)?)
}

fn pretty<T: Serialize + ?Sized>(value: &T) -> Result<String, DesignError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Ask for `count` fresh candidates.
pub fn generate(brief: &DesignBrief, count: u32) -> Result<String, DesignError> {
    let r = &brief.requirements;
    let c = &brief.constraints;
    let extra: Vec<String> = brief
        .extra_requirements()
        .into_iter()
        .chain(brief.extra_constraints())
        .map(|(k, v)| format!("{}: {}", k.replace('_', " "), v))
        .collect();

    render(
        "generate",
        context! {
            title => &brief.title,
            count => count,
            sampling_interval => r.sampling_interval.as_deref().unwrap_or_default(),
            alert_thresholds => r.alert_thresholds_text(),
            battery_life => r.battery_life.as_deref().unwrap_or_default(),
            alert_latency => r.alert_latency(),
            mard_target => r.mard_target(),
            ble_reliability => r.ble_reliability(),
            adc_bits => c.adc_bits_text(),
            ble_range => c.ble_range(),
            sampling_stability => c.sampling_stability(),
            afe_sensor_compat => c.afe_sensor_compat(),
            mcu_ble_interface => c.mcu_ble_interface(),
            battery_form_factor => c.battery_form_factor(),
            extra => extra,
            fields => CANDIDATE_FIELDS,
        },
    )
}

/// Ask for scores of every current candidate.
pub fn evaluate(brief: &DesignBrief, candidates: &[Candidate]) -> Result<String, DesignError> {
    let r = &brief.requirements;
    render(
        "evaluate",
        context! {
            title => &brief.title,
            sampling_interval => r.sampling_interval.as_deref().unwrap_or_default(),
            alert_thresholds => r.alert_thresholds_text(),
            battery_life => r.battery_life.as_deref().unwrap_or_default(),
            candidates => pretty(candidates)?,
        },
    )
}

/// Ask for improved versions of the top candidates.
pub fn refine(
    brief: &DesignBrief,
    top: &[Candidate],
    feedback: &[Evaluation],
) -> Result<String, DesignError> {
    let r = &brief.requirements;
    let c = &brief.constraints;
    render(
        "refine",
        context! {
            title => &brief.title,
            count => top.len(),
            candidates => pretty(top)?,
            feedback => pretty(feedback)?,
            sampling_interval => r.sampling_interval.as_deref().unwrap_or_default(),
            alert_thresholds => r.alert_thresholds_text(),
            battery_life => r.battery_life.as_deref().unwrap_or_default(),
            adc_bits => c.adc_bits_text(),
            ble_range => c.ble_range(),
        },
    )
}

/// Ask for one recommendation with a plain-text justification.
pub fn select(
    brief: &DesignBrief,
    candidates: &[Candidate],
    evaluations: &[Evaluation],
) -> Result<String, DesignError> {
    render(
        "select",
        context! {
            title => &brief.title,
            candidates => pretty(candidates)?,
            evaluations => pretty(evaluations)?,
            requirements => pretty(&brief.requirements)?,
        },
    )
}
