// Shared prompt constants. Each handler group that needs LLM calls builds its
// prompt from these fragments via `str::replace` on the {placeholders}.

/// Prompt fragment that enforces JSON-only output for `call_json` responses.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Resume review prompt. Substitute {resume_text} with the extracted PDF text.
pub const RESUME_REVIEW_PROMPT: &str = "\
Review the following resume and provide constructive feedback on its \
strengths, weaknesses and areas for improvement.

Return a JSON object with exactly these fields:
- \"score\": integer 0-100, overall quality of the resume
- \"strengths\": array of strings, what the resume does well
- \"weaknesses\": array of strings, what holds the resume back
- \"suggestions\": array of strings, concrete improvements the candidate should make

{json_only}

Resume content:

{resume_text}";

/// Builds the full resume review prompt from extracted resume text.
pub fn resume_review_prompt(resume_text: &str) -> String {
    RESUME_REVIEW_PROMPT
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        .replace("{resume_text}", resume_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_review_prompt_substitutes_text() {
        let prompt = resume_review_prompt("Jane Doe, Rust engineer");
        assert!(prompt.contains("Jane Doe, Rust engineer"));
        assert!(!prompt.contains("{resume_text}"));
        assert!(!prompt.contains("{json_only}"));
        assert!(prompt.contains("valid JSON only"));
    }
}
