// src/cli/progress.rs — Terminal progress renderer for real-time run feedback

use crate::core::types::ProgressEvent;
use crate::report::WIDTH;

/// Build a progress callback that writes formatted output to stderr.
///
/// All progress output goes to stderr so stdout remains clean for the
/// report or JSON. Returns a closure suitable for `Orchestrator::with_progress()`.
pub fn terminal_progress() -> impl Fn(ProgressEvent) + Send + Sync + 'static {
    move |event| eprintln!("{}", format_event(&event))
}

/// One event as terminal text (possibly several lines).
pub fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::CandidatesGenerated { candidates } => {
            let mut lines = vec![
                "=".repeat(WIDTH),
                format!("{:^width$}", "INITIAL CANDIDATES GENERATED", width = WIDTH)
                    .trim_end()
                    .to_string(),
                "=".repeat(WIDTH),
            ];
            if candidates.is_empty() {
                lines.push("  (no usable candidates returned)".to_string());
            }
            for c in candidates {
                let na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".into());
                lines.push(String::new());
                lines.push(format!("  #{}: {}", c.id, na(&c.microcontroller)));
                lines.push(format!(
                    "      Sensor: {} | ADC: {} | BLE: {}",
                    na(&c.sensor_type),
                    na(&c.adc_bits),
                    na(&c.ble)
                ));
                lines.push(format!("      Battery: {}", na(&c.battery)));
            }
            lines.push(String::new());
            lines.push("-".repeat(WIDTH));
            lines.join("\n")
        }
        ProgressEvent::EvaluationStart { count, round } => {
            let label = if *round == 0 {
                "INITIAL".to_string()
            } else {
                format!("ROUND {round}")
            };
            format!("\n   EVALUATING {count} candidates ({label})")
        }
        ProgressEvent::Scored { scores, .. } => {
            let parts: Vec<String> = scores
                .iter()
                .map(|(id, score)| format!("#{id}={score}"))
                .collect();
            format!("   Scores: {}", parts.join(" "))
        }
        ProgressEvent::RefineStart {
            iteration,
            selected,
        } => {
            let ids: Vec<String> = selected.iter().map(|id| format!("#{id}")).collect();
            format!(
                "\n   REFINING top {} candidates (iteration {})\n   Selected: {}",
                selected.len(),
                iteration,
                ids.join(", ")
            )
        }
        ProgressEvent::Selected { candidate_id } => match candidate_id {
            Some(id) => format!("\n   SELECTED #{id}"),
            None => "\n   SELECTED nothing (no candidates)".to_string(),
        },
        ProgressEvent::Complete {
            iterations,
            candidates,
        } => format!("[done] iterations={iterations} final_candidates={candidates}\n"),
    }
}
