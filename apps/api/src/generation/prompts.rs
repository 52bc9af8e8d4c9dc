// All LLM prompt templates for the AI orchestration layer.
// Placeholders in `{braces}` are substituted with `fill` before sending.

/// Characters of resume text sent for parsing.
pub const RESUME_TEXT_LIMIT: usize = 10_000;

/// Characters of job description sent for tailoring.
pub const JOB_TEXT_LIMIT: usize = 1_000;

/// Resume parsing prompt. Replace `{resume_text}`.
pub const PARSE_RESUME_PROMPT: &str = r#"Extract the following information from the resume text below and return it as a VALID JSON object.
Fields to extract:
- full_name
- contact_info (object with email, phone, linkedin)
- summary
- skills (list of strings)
- work_experience (list of objects with company, role, duration, points)
- education (list of objects with institution, degree, year)
- projects (list of objects with name, description)

Output only the JSON object. Do NOT use markdown code fences.

Resume Text:
{resume_text}"#;

/// Section assistant prompt. Replace `{job_role}`, `{experience_level}`,
/// `{section_name}`, `{current_content}`.
///
/// The prompt ends with an opening brace; the completion continues the object.
pub const SECTION_SUGGESTIONS_PROMPT: &str = r#"Job Role: {job_role}
Experience Level: {experience_level}
Resume Section: {section_name}
Current Content: "{current_content}"

Provide a JSON object with:
1. "suggestions": A list of 2-3 professional phrases to add.
2. "tips": A list of 2 resume writing tips.
3. "improved_content": A high-impact rewrite of the current content.

Output only the JSON object.
JSON: {"#;

/// Tailoring prompt. Replace `{job_role}`, `{template_id}`, `{density_instruction}`,
/// `{job_text}`, `{resume_json}`.
pub const TAILOR_RESUME_PROMPT: &str = r#"[INST] You are an expert career consultant.
Action: Tailor the profile for Role: {job_role}.
Style: {template_id} ({density_instruction})

Job: {job_text}
Profile: {resume_json}

RULES:
- Keep the same JSON structure as the profile (full_name, contact_info, summary, skills, work_experience, education, projects).
- SUMMARY: Use {density_instruction} tone.
- EXPERIENCE: Quantify results using metrics (%, $).
- Do NOT invent employers, degrees or dates that are not in the profile.
- Format: VALID JSON ONLY.
[/INST]"#;

/// ATS scoring prompt. Replace `{job_text}`, `{resume_text}`.
pub const ATS_SCORE_PROMPT: &str = r#"Evaluate the resume against the Job Description.
JD: {job_text}
Resume: {resume_text}

Output JSON:
{
    "score": 0-100,
    "match_percentage": 0-100,
    "missing_keywords": [...],
    "feedback": [...],
    "improvement_tips": [...]
}"#;

/// Job role autocomplete prompt. Replace `{query}`.
pub const SUGGEST_ROLES_PROMPT: &str = r#"Act as a Professional Career Advisor.
The user is typing a job role: '{query}'.
Suggest 5 common, real-world job role titles that start with or are highly related to this query.
Return ONLY a JSON list of strings.
Example: ["Software Engineer", "Software Architect", "Full Stack Developer"]"#;

/// Returns at most `limit` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Substitutes `{name}` placeholders in one left-to-right pass.
///
/// Substituted text is never rescanned, so user input containing a placeholder
/// name stays literal. Braces that do not open a known placeholder are kept.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let hit = values.iter().find(|(name, _)| {
            tail.strip_prefix(name)
                .is_some_and(|after| after.starts_with('}'))
        });
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_fill_substitutes_known_placeholders_only() {
        let out = fill("{a} + {b} = {\"c\": {a}}", &[("a", "1"), ("b", "2")]);
        assert_eq!(out, "1 + 2 = {\"c\": 1}");
    }

    #[test]
    fn test_fill_does_not_rescan_substituted_text() {
        let out = fill(
            "Job: {job_text}\nProfile: {resume_json}",
            &[("job_text", "Apply via {resume_json} now"), ("resume_json", "RESUME")],
        );
        assert_eq!(out, "Job: Apply via {resume_json} now\nProfile: RESUME");
    }

    #[test]
    fn test_fill_leaves_every_prompt_free_of_its_placeholders() {
        let out = fill(ATS_SCORE_PROMPT, &[("job_text", "JD"), ("resume_text", "CV")]);
        assert!(!out.contains("{job_text}") && !out.contains("{resume_text}"));
        assert!(out.contains("\"score\": 0-100"));
    }

    #[test]
    fn test_section_prompt_ends_with_prefilled_brace() {
        assert!(SECTION_SUGGESTIONS_PROMPT.trim_end().ends_with('{'));
    }
}
