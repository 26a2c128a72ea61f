//! Instruction templates. Rendering is deterministic for given inputs.

use crate::models::{IndustryProfile, Output};

use super::types::ConversionEstimate;

/// Escapes chat-template control tokens so document text cannot pose as
/// instructions.
pub fn sanitize_for_prompt(text: &str) -> String {
    text.replace("<|", "< |")
        .replace("|>", "| >")
        .replace("<s>", "< s >")
        .replace("</s>", "< / s >")
        .replace("[INST]", "[ INST ]")
        .replace("[/INST]", "[ / INST ]")
        .replace("<<SYS>>", "< < SYS > >")
        .replace("<</SYS>>", "< < / SYS > >")
}

fn quoted_list(items: &[String]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|item| format!("\"{}\"", sanitize_for_prompt(item)))
        .collect();
    format!("[{}]", quoted.join(", "))
}

pub fn extract(raw_text: &str, max_chars: usize) -> String {
    let text: String = sanitize_for_prompt(raw_text).chars().take(max_chars).collect();
    format!(
        r#"Extract the following from this industrial company description:
- Company name
- Location (if mentioned, provide lat/lng or city name)
- Input materials/resources (as array)
- Output products/waste streams (as array with name, state, quantity)

Text: {text}

Respond with valid JSON only, in this shape:
{{
  "name": "company name",
  "location": {{"lat": 0.0, "lng": 0.0}},
  "inputs": ["input1", "input2"],
  "outputs": [{{"name": "output", "state": "solid/liquid/gas", "quantity": "amount with unit"}}]
}}"#
    )
}

pub fn classify(stream_name: &str, state: &str) -> String {
    format!(
        r#"Classify this waste stream and provide relevant tags:
Waste: {}
State: {}

Provide classification, industry tags, and potential uses. Respond with JSON containing:
{{
  "category": "category",
  "tags": ["tag1", "tag2"],
  "potential_uses": ["use1", "use2"]
}}"#,
        sanitize_for_prompt(stream_name),
        sanitize_for_prompt(state)
    )
}

pub fn find_candidates(waste: &Output, pool: &[IndustryProfile]) -> String {
    let candidates: Vec<String> = pool
        .iter()
        .map(|c| {
            format!(
                "- {} (inputs: {})",
                sanitize_for_prompt(&c.name),
                quoted_list(&c.inputs)
            )
        })
        .collect();

    format!(
        r#"Given this waste stream:
Name: {}
State: {}
Quantity: {}

Find which of these industries could use it as input:
{}

Respond with a JSON array of matching industry names, exactly as written above: ["industry1", "industry2"]
Respond with [] if none of them can use it."#,
        sanitize_for_prompt(&waste.name),
        sanitize_for_prompt(&waste.state),
        sanitize_for_prompt(&waste.quantity),
        candidates.join("\n")
    )
}

pub fn estimate_conversion(waste: &Output, target_input: &str) -> String {
    format!(
        r#"Determine if conversion is needed to transform this waste into usable input:
Waste: {} (state: {}, quantity: {})
Target Input: {}

Respond with JSON:
{{
  "conversion_needed": true/false,
  "description": "conversion process description",
  "recommended_converter": "producer/consumer/third-party",
  "estimated_cost": "cost estimate",
  "complexity": "low/medium/high"
}}"#,
        sanitize_for_prompt(&waste.name),
        sanitize_for_prompt(&waste.state),
        sanitize_for_prompt(&waste.quantity),
        sanitize_for_prompt(target_input)
    )
}

pub fn explain(
    waste: &Output,
    candidate: &IndustryProfile,
    conversion: &ConversionEstimate,
) -> String {
    let conversion_json =
        serde_json::to_string(conversion).unwrap_or_else(|_| conversion.description.clone());
    format!(
        r#"Explain why this is a good industrial symbiosis match:
Producer Waste: {} ({}, {})
Consumer: {}
Consumer Inputs: {}
Conversion: {}

Provide a clear, concise explanation of the symbiotic benefit."#,
        sanitize_for_prompt(&waste.name),
        sanitize_for_prompt(&waste.state),
        sanitize_for_prompt(&waste.quantity),
        sanitize_for_prompt(&candidate.name),
        quoted_list(&candidate.inputs),
        sanitize_for_prompt(&conversion_json)
    )
}
