//! Prompts for oncology clinical summaries.
//!
//! The summary is advisory only. Nothing in the prompt asks the model to make
//! treatment decisions.

use crate::snapshot::PatientSnapshot;

/// System context for the clinical assistant.
pub const SYSTEM_PROMPT: &str = r#"You are an expert oncology clinical assistant supporting ward nurses and physicians.

You summarize a single patient's current treatment status from structured data.
Keep the summary under 150 words and format it in Markdown with:
1. A brief status overview.
2. Potential red flags based on treatment progress or vitals (general advice only).
3. A recommended focus for the next nurse check-in.

Never invent data that is not present in the snapshot."#;

/// Describe the radiation course in one line, or "None".
fn radiation_line(snapshot: &PatientSnapshot) -> String {
    match &snapshot.radiation {
        Some(rt) => format!(
            "Site: {}, Technique: {}, Progress: {}/{} fractions.",
            rt.target_site, rt.technique, rt.fractions_completed, rt.fractions_total
        ),
        None => "None".to_string(),
    }
}

/// Describe the chemotherapy protocol in one line, or "None".
fn chemo_line(snapshot: &PatientSnapshot) -> String {
    match &snapshot.chemo {
        Some(chemo) => format!(
            "Protocol: {}, Cycle: {}/{}.",
            chemo.protocol_name, chemo.cycle_current, chemo.cycle_total
        ),
        None => "None".to_string(),
    }
}

/// Describe the most recent vitals entry, or note that none are recorded.
fn vitals_line(snapshot: &PatientSnapshot) -> String {
    match &snapshot.latest_vitals {
        Some(v) => format!(
            "{}: BP {}/{} mmHg, HR {} bpm, Temp {:.1} C, SpO2 {}%",
            v.date, v.systolic, v.diastolic, v.heart_rate, v.temp, v.spo2
        ),
        None => "No vitals recorded".to_string(),
    }
}

/// User prompt for a single patient summary.
pub fn make_insight_prompt(snapshot: &PatientSnapshot) -> String {
    format!(
        r#"Analyze the following patient data and provide a concise clinical summary.

Patient: {} ({} {})
Diagnosis: {}, {}
Status: {}

Radiation Plan: {}

Chemotherapy: {}

Recent Vitals (last entry): {}"#,
        snapshot.name,
        snapshot.age,
        snapshot.gender,
        snapshot.diagnosis,
        snapshot.stage,
        snapshot.status,
        radiation_line(snapshot),
        chemo_line(snapshot),
        vitals_line(snapshot),
    )
}

/// Full prompt with the system context prepended.
pub fn build_full_prompt(snapshot: &PatientSnapshot) -> String {
    let mut prompt = String::new();
    prompt.push_str(SYSTEM_PROMPT);
    prompt.push_str("\n\n");
    prompt.push_str(&make_insight_prompt(snapshot));
    prompt
}
