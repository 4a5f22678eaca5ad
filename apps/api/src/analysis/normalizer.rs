//! Response Normalizer — turns the model's raw completion text into an
//! [`AnalysisResult`], whatever shape the model actually produced.
//!
//! Two decoders run in order:
//! 1. strict: the fence-stripped text decoded as the instructed JSON schema;
//! 2. partial: independent pattern extractions over the same text, each
//!    field optional, defaults filled in when collapsed.
//!
//! `normalize` never fails.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::analysis::models::{
    AnalysisResult, Experience, MatchPercentage, RequirementsSummary,
};
use crate::analysis::skills::dedup_skills;

pub const DEFAULT_SUMMARY: &str = "Summary not available.";
pub const DEFAULT_EXPERIENCE: &str = "Experience not specified.";
pub const DEFAULT_RECOMMENDATION: &str = "Recommendation unavailable.";

static PERCENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)%").expect("valid regex"));
static SUMMARY_RE: Lazy<Regex> = Lazy::new(|| quoted_field_regex("summary"));
static EXPERIENCE_RE: Lazy<Regex> = Lazy::new(|| quoted_field_regex("experience"));
static RECOMMENDATION_RE: Lazy<Regex> = Lazy::new(|| quoted_field_regex("recommendation"));
static REQUIRED_SKILLS_RE: Lazy<Regex> = Lazy::new(|| skill_list_regex("requiredSkills"));
static CANDIDATE_SKILLS_RE: Lazy<Regex> = Lazy::new(|| skill_list_regex("candidateSkills"));
static MATCHING_SKILLS_RE: Lazy<Regex> = Lazy::new(|| skill_list_regex("matchingSkills"));
static MISSING_SKILLS_RE: Lazy<Regex> = Lazy::new(|| skill_list_regex("missingSkills"));

/// `"key": "value"`, capturing the still-escaped string body.
fn quoted_field_regex(key: &str) -> Regex {
    Regex::new(&format!(r#"{key}"\s*:\s*"((?:[^"\\]|\\.)+)""#)).expect("valid regex")
}

/// The key followed, on the same line, by a bracket-delimited list.
/// Anything may sit between them: quotes, markdown emphasis, prose.
fn skill_list_regex(key: &str) -> Regex {
    Regex::new(&format!(r#"(?i){key}[^\[\n]*?\[([^\]]*)\]"#)).expect("valid regex")
}

/// Fields recovered by pattern extraction. `None` means the pattern did not match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialAnalysis {
    pub match_percentage: Option<u8>,
    pub summary: Option<String>,
    pub experience: Option<String>,
    pub recommendation: Option<String>,
    pub required_skills: Option<Vec<String>>,
    pub candidate_skills: Option<Vec<String>>,
    pub matching_skills: Option<Vec<String>>,
    pub missing_skills: Option<Vec<String>>,
    pub raw: String,
}

/// Outcome of decoding one completion.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Strict(AnalysisResult),
    Partial(PartialAnalysis),
}

impl Decoded {
    /// Collapses either decode into one result, filling defaults for anything not recovered.
    pub fn into_result(self) -> AnalysisResult {
        match self {
            Decoded::Strict(mut result) => {
                result.raw = None;
                result.requirements_summary = dedup_summary(result.requirements_summary);
                result
            }
            Decoded::Partial(partial) => AnalysisResult {
                match_percentage: partial
                    .match_percentage
                    .map(MatchPercentage::Score)
                    .unwrap_or(MatchPercentage::Unavailable),
                confidence: None,
                summary: partial
                    .summary
                    .unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
                candidate: None,
                requirements_summary: dedup_summary(RequirementsSummary {
                    required_skills: partial.required_skills.unwrap_or_default(),
                    candidate_skills: partial.candidate_skills.unwrap_or_default(),
                    matching_skills: partial.matching_skills.unwrap_or_default(),
                    missing_skills: partial.missing_skills.unwrap_or_default(),
                }),
                skill_details: Vec::new(),
                experience: Some(Experience::Note(
                    partial
                        .experience
                        .unwrap_or_else(|| DEFAULT_EXPERIENCE.to_string()),
                )),
                recommendation: partial
                    .recommendation
                    .unwrap_or_else(|| DEFAULT_RECOMMENDATION.to_string()),
                recommendation_reasoning: None,
                interview_readiness: None,
                suggested_interview_questions: Vec::new(),
                suggested_resume_improvements: Vec::new(),
                match_breakdown: None,
                red_flags: Vec::new(),
                sources: Vec::new(),
                raw: Some(partial.raw),
            },
        }
    }
}

/// Normalizes a raw completion into an [`AnalysisResult`]. Never fails.
pub fn normalize(raw_content: &str) -> AnalysisResult {
    decode(raw_content).into_result()
}

/// Strips code fences, then tries the strict decoder before the pattern decoder.
pub fn decode(raw_content: &str) -> Decoded {
    let text = strip_code_fences(raw_content);

    match serde_json::from_str::<AnalysisResult>(text) {
        Ok(result) => Decoded::Strict(result),
        Err(e) => {
            warn!("Model reply is not schema-conformant JSON ({e}), applying fallback extraction");
            debug!("Unparsed model reply: {text}");
            Decoded::Partial(extract_partial(text))
        }
    }
}

/// Best-effort recovery of individual fields from arbitrary text.
pub fn extract_partial(text: &str) -> PartialAnalysis {
    PartialAnalysis {
        match_percentage: first_percentage(text),
        summary: capture_first(&SUMMARY_RE, text),
        experience: capture_first(&EXPERIENCE_RE, text),
        recommendation: capture_first(&RECOMMENDATION_RE, text),
        required_skills: capture_list(&REQUIRED_SKILLS_RE, text),
        candidate_skills: capture_list(&CANDIDATE_SKILLS_RE, text),
        matching_skills: capture_list(&MATCHING_SKILLS_RE, text),
        missing_skills: capture_list(&MISSING_SKILLS_RE, text),
        raw: text.to_string(),
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
/// Either fence may be missing; the result is trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();

    if let Some(stripped) = text.strip_prefix("```") {
        text = match stripped.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &stripped[4..],
            _ => stripped,
        };
    }
    if let Some(stripped) = text.trim_end().strip_suffix("```") {
        text = stripped;
    }

    text.trim()
}

/// First `<digits>%` whose value is a valid percentage.
fn first_percentage(text: &str) -> Option<u8> {
    PERCENT_RE
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<u64>().ok())
        .find_map(MatchPercentage::from_score)
        .and_then(|m| m.score())
}

/// Captures a JSON string body and resolves its escapes. A body that is not
/// a valid JSON string literal is kept as written.
fn capture_first(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|c| {
        let body = &c[1];
        serde_json::from_str::<String>(&format!("\"{body}\""))
            .unwrap_or_else(|_| body.to_string())
            .trim()
            .to_string()
    })
}

fn capture_list(re: &Regex, text: &str) -> Option<Vec<String>> {
    re.captures(text).map(|c| {
        c[1].split(',')
            .map(|item| item.replace(['"', '[', ']'], "").trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    })
}

fn dedup_summary(summary: RequirementsSummary) -> RequirementsSummary {
    RequirementsSummary {
        required_skills: dedup_skills(summary.required_skills),
        candidate_skills: dedup_skills(summary.candidate_skills),
        matching_skills: dedup_skills(summary.matching_skills),
        missing_skills: dedup_skills(summary.missing_skills),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::Recommendation;
    use serde_json::json;

    fn conforming_reply() -> serde_json::Value {
        json!({
            "matchPercentage": 85,
            "confidence": 90,
            "summary": "Five years of React and Node. Strong frontend fundamentals.",
            "candidate": {
                "name": "Jane Doe",
                "location": "Berlin",
                "remotePreference": "Hybrid",
                "noticePeriod": null,
                "education": [{"degree": "BSc CS", "institution": "TU Berlin", "year": "2017"}],
                "certifications": []
            },
            "requirementsSummary": {
                "requiredSkills": ["React", "TypeScript", "Node"],
                "candidateSkills": ["React", "Node", "Git"],
                "matchingSkills": ["React", "Node"],
                "missingSkills": ["TypeScript"]
            },
            "skillDetails": [
                {"skill": "React", "proficiency": "Advanced", "years": 5, "matchScore": 95, "evidence": "5 years React"}
            ],
            "experience": {
                "totalYears": 5,
                "relevantYears": 5,
                "domains": ["Frontend"],
                "topProjects": [],
                "seniorityLevel": "Senior",
                "roleFit": ["React Developer"]
            },
            "recommendation": "Strong match",
            "recommendationReasoning": "Core stack matches.",
            "interviewReadiness": "Ready",
            "suggestedInterviewQuestions": ["How do you manage React state at scale?"],
            "suggestedResumeImprovements": ["Mention TypeScript exposure."],
            "matchBreakdown": {"skills": 80, "experience": 90, "education": 70, "certifications": 0},
            "redFlags": [],
            "sources": [{"claim": "React experience", "textSnippet": "5 years React"}]
        })
    }

    #[test]
    fn test_strip_code_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_code_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_code_fences_no_fences() {
        let input = "  {\"key\": \"value\"}\n";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_code_fences_unbalanced() {
        assert_eq!(strip_code_fences("```JSON\n{}"), "{}");
        assert_eq!(strip_code_fences("{}\n```"), "{}");
    }

    #[test]
    fn test_strict_reply_matches_parsed_json() {
        let reply = conforming_reply();
        let expected: AnalysisResult = serde_json::from_value(reply.clone()).unwrap();

        let result = normalize(&reply.to_string());

        assert_eq!(result, expected);
        assert!(!result.is_degraded());
        assert_eq!(result.match_percentage, MatchPercentage::Score(85));
        assert_eq!(result.recommendation_kind(), Some(Recommendation::StrongMatch));
        assert_eq!(serde_json::to_value(&result).unwrap()["candidate"]["name"], "Jane Doe");
    }

    #[test]
    fn test_fenced_reply_equals_unfenced() {
        let body = serde_json::to_string_pretty(&conforming_reply()).unwrap();
        let fenced = format!("```json\n{body}\n```");
        assert_eq!(normalize(&fenced), normalize(&body));

        let prose = "The candidate fits about 55% of the role.";
        assert_eq!(normalize(&format!("```\n{prose}\n```")), normalize(prose));
    }

    #[test]
    fn test_strict_result_never_carries_raw() {
        let mut reply = conforming_reply();
        reply["raw"] = json!("smuggled");
        let result = normalize(&reply.to_string());
        assert_eq!(result.raw, None);
        assert!(serde_json::to_value(&result).unwrap().get("raw").is_none());
    }

    #[test]
    fn test_strict_reply_dedups_skill_variants() {
        let mut reply = conforming_reply();
        reply["requirementsSummary"]["candidateSkills"] = json!(["React.js", "React", "Git"]);
        let result = normalize(&reply.to_string());
        assert_eq!(
            result.requirements_summary.candidate_skills,
            vec!["React.js", "Git"]
        );
    }

    #[test]
    fn test_prose_reply_falls_back() {
        let prose = "Candidate matches 40% of requirements but lacks cloud experience.";
        let result = normalize(prose);

        assert_eq!(result.match_percentage, MatchPercentage::Score(40));
        assert_eq!(result.summary, DEFAULT_SUMMARY);
        assert_eq!(result.recommendation, DEFAULT_RECOMMENDATION);
        assert_eq!(
            result.experience,
            Some(Experience::Note(DEFAULT_EXPERIENCE.to_string()))
        );
        assert!(result.requirements_summary.matching_skills.is_empty());
        assert!(result.requirements_summary.missing_skills.is_empty());
        assert_eq!(result.raw.as_deref(), Some(prose));
    }

    #[test]
    fn test_no_percentage_gives_sentinel() {
        let result = normalize("No numeric assessment was possible.");
        assert_eq!(result.match_percentage, MatchPercentage::Unavailable);
        assert_eq!(serde_json::to_value(&result).unwrap()["matchPercentage"], "N/A");
    }

    #[test]
    fn test_percentage_above_hundred_is_skipped() {
        let result = normalize("Revenue grew 250% while the fit is 62%.");
        assert_eq!(result.match_percentage, MatchPercentage::Score(62));
    }

    #[test]
    fn test_truncated_json_recovers_fields() {
        let truncated = r#"{
  "matchPercentage": 72,
  "summary": "Experienced Laravel developer with API work.",
  "requirementsSummary": {
    "requiredSkills": ["PHP", "Laravel", "Docker"],
    "candidateSkills": ["PHP", "Laravel", "MySQL"],
    "matchingSkills": ["PHP", "Laravel.js", "Laravel"],
    "missingSkills": ["Docker"]
  },
  "experience": "Six years in web backends",
  "recommendation": "Good potential fit",
  "recommendationReasoning": "Strong on"#;

        let result = normalize(truncated);

        assert!(result.is_degraded());
        // "72%" does not occur, so the score is not recovered
        assert_eq!(result.match_percentage, MatchPercentage::Unavailable);
        assert_eq!(result.summary, "Experienced Laravel developer with API work.");
        assert_eq!(
            result.experience,
            Some(Experience::Note("Six years in web backends".to_string()))
        );
        assert_eq!(result.recommendation, "Good potential fit");
        assert_eq!(result.requirements_summary.matching_skills, vec!["PHP", "Laravel.js"]);
        assert_eq!(result.requirements_summary.missing_skills, vec!["Docker"]);
        assert_eq!(
            result.requirements_summary.required_skills,
            vec!["PHP", "Laravel", "Docker"]
        );
        assert_eq!(
            result.requirements_summary.candidate_skills,
            vec!["PHP", "Laravel", "MySQL"]
        );
        assert_eq!(result.raw.as_deref(), Some(truncated));
    }

    #[test]
    fn test_missing_skill_keys_give_empty_lists() {
        let result = normalize(r#"matchingSkills: [React, "Node"] and a 30% fit"#);
        assert_eq!(result.requirements_summary.matching_skills, vec!["React", "Node"]);
        assert!(result.requirements_summary.missing_skills.is_empty());
        assert!(result.requirements_summary.required_skills.is_empty());
        assert_eq!(result.match_percentage, MatchPercentage::Score(30));
    }

    #[test]
    fn test_empty_list_recovers_no_items() {
        let result = normalize(r#"{"missingSkills": [], "summary": "ok""#);
        assert!(result.requirements_summary.missing_skills.is_empty());
        assert_eq!(result.summary, "ok");
    }

    #[test]
    fn test_skill_lists_recovered_from_markdown_and_prose() {
        let reply = "**matchingSkills**: [React, Node]\nThe missingSkills are [Docker, AWS].\nOverall 48%.";
        let result = normalize(reply);

        assert_eq!(result.requirements_summary.matching_skills, vec!["React", "Node"]);
        assert_eq!(result.requirements_summary.missing_skills, vec!["Docker", "AWS"]);
        assert_eq!(result.match_percentage, MatchPercentage::Score(48));
    }

    #[test]
    fn test_skill_list_must_start_on_the_key_line() {
        let partial = extract_partial("missingSkills: none listed\n[Kafka]");
        assert_eq!(partial.missing_skills, None);
    }

    #[test]
    fn test_quoted_field_keeps_escaped_quotes() {
        let partial = extract_partial(r#"{"summary": "Knows \"Rust\" and Go\nwell", "recommendation": "Strong match""#);
        assert_eq!(partial.summary.as_deref(), Some("Knows \"Rust\" and Go\nwell"));
        assert_eq!(partial.recommendation.as_deref(), Some("Strong match"));
    }

    #[test]
    fn test_recommendation_pattern_ignores_reasoning_key() {
        let partial = extract_partial(r#""recommendationReasoning": "because""#);
        assert_eq!(partial.recommendation, None);
    }

    #[test]
    fn test_never_fails_on_degenerate_input() {
        for input in ["", "   ", "```", "```json```", "null", "[]", "{", "\"just a string\"", "%%%"] {
            let result = normalize(input);
            assert!(result.is_degraded(), "input {input:?} should fall back");
            assert_eq!(result.match_percentage, MatchPercentage::Unavailable);
            assert_eq!(result.summary, DEFAULT_SUMMARY);
        }
    }

    #[test]
    fn test_decode_reports_which_path_ran() {
        assert!(matches!(decode(&conforming_reply().to_string()), Decoded::Strict(_)));
        assert!(matches!(decode("not json"), Decoded::Partial(_)));
    }
}
