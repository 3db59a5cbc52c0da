// Shared prompt constants and prompt-building utilities.
// Each endpoint module defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Scope fragment shared by every endpoint: stay on fitness and nutrition.
pub const DOMAIN_SCOPE: &str = "Restrict yourself strictly to fitness, nutrition, \
    exercise, and healthy lifestyle topics. \
    Give general guidance only; never present it as a medical diagnosis.";

/// Joins a role statement with the shared fragments into one system instruction.
pub fn system_instruction(role: &str) -> String {
    format!("{role} {DOMAIN_SCOPE} {JSON_ONLY_SYSTEM}")
}
