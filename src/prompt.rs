//! Literal prompt templates for the two generation modes.
//!
//! Both builders are pure: the same input always yields the same prompt text.

use crate::models::KitParts;

const INSTRUCTOR_PREAMBLE: &str = "You are an expert robotics and electronics instructor.";
const RAW_JSON_ONLY: &str = "IMPORTANT: Return ONLY valid JSON, no markdown code blocks or extra text.";

const BUILD_SHAPE: &str = r#"{
    "overview": "Brief 2-3 sentence description of the project",
    "steps": ["Step 1: ...", "Step 2: ...", ...],
    "wiring": "Detailed wiring instructions with pin connections",
    "firmware": "Complete Arduino code with comments",
    "tips": ["Tip 1", "Tip 2", ...]
}"#;

const REVERSE_SHAPE: &str = r#"{
    "overview": "Brief 2-3 sentence description of the project",
    "parts_needed": ["Part 1", "Part 2", ...],
    "estimated_cost": "$XX - $XX USD estimated total",
    "where_to_buy": ["Amazon: search for X", "Adafruit: product Y", ...],
    "steps": ["Step 1: ...", "Step 2: ...", ...],
    "tips": ["Tip 1", "Tip 2", ...]
}"#;

/// Prompt for build mode: one `name: part, part` line per kit, an optional
/// `Custom Parts:` line, the goal and the expected JSON shape.
pub fn build_mode(kits_parts: &KitParts, custom_parts: &[String], goal: &str) -> String {
    let parts_list = kits_parts
        .iter()
        .map(|(name, parts)| format!("{}: {}", name, parts.join(", ")))
        .collect::<Vec<_>>()
        .join("\n");

    let custom_section = if custom_parts.is_empty() {
        String::new()
    } else {
        format!("\nCustom Parts: {}", custom_parts.join(", "))
    };

    format!(
        "{INSTRUCTOR_PREAMBLE} A user wants to build a project using specific parts.\n\n\
         AVAILABLE PARTS:\n{parts_list}{custom_section}\n\n\
         USER'S GOAL: {goal}\n\n\
         Generate a complete build guide. Respond in this exact JSON format:\n{BUILD_SHAPE}\n\n\
         {RAW_JSON_ONLY}"
    )
}

/// Prompt for reverse mode: the goal and the expected JSON shape, no parts.
pub fn reverse_mode(goal: &str) -> String {
    format!(
        "{INSTRUCTOR_PREAMBLE} A user wants to build something and needs to know what parts to buy.\n\n\
         USER'S GOAL: {goal}\n\n\
         Generate a complete shopping list and build guide. Respond in this exact JSON format:\n{REVERSE_SHAPE}\n\n\
         {RAW_JSON_ONLY}"
    )
}
