// Resume analysis prompt templates.
// The schema below is the contract the normalizer's strict decoder expects.

use crate::analysis::models::Recommendation;

pub const ANALYSIS_SYSTEM: &str = "You are an expert HR recruiter.";

const ANALYSIS_PREAMBLE: &str = "\
You are an expert technical recruiter and career analyst. Your goal is to evaluate how well \
a candidate's resume fits a given job description.

Analyze the resume and job description below carefully, then produce ONLY a valid JSON \
response (no markdown, no commentary, no code formatting).

Your response must strictly follow this structure:";

const ANALYSIS_SCHEMA: &str = r#"{
  "matchPercentage": number (0-100),
  "confidence": number (0-100),
  "summary": "A clear 3-5 sentence summary of the candidate's profile for HR. Mention key strengths, relevant skills, years of experience, and how well they align with the role.",
  "candidate": {
    "name": string | null,
    "location": string | null,
    "remotePreference": string | null,
    "noticePeriod": string | null,
    "education": [{"degree": string, "institution": string, "year": string}],
    "certifications": [string]
  },
  "requirementsSummary": {
    "requiredSkills": [string],
    "candidateSkills": [string],
    "matchingSkills": [string],
    "missingSkills": [string]
  },
  "skillDetails": [
    {"skill": string, "proficiency": "{proficiency}", "years": number, "matchScore": number (0-100), "evidence": "resume snippet or context"}
  ],
  "experience": {
    "totalYears": number,
    "relevantYears": number,
    "domains": [string],
    "topProjects": [
      {"title": string, "brief": string, "techStack": [string], "impact": string}
    ],
    "seniorityLevel": "{seniority}",
    "roleFit": [string]
  },
  "recommendation": "{recommendation}",
  "recommendationReasoning": "1-2 sentence reasoning for the recommendation",
  "interviewReadiness": "{readiness}",
  "suggestedInterviewQuestions": [string],
  "suggestedResumeImprovements": [string],
  "matchBreakdown": {"skills": number, "experience": number, "education": number, "certifications": number},
  "redFlags": [string],
  "sources": [
    {"claim": string, "textSnippet": string}
  ]
}"#;

const ANALYSIS_RULES: &str = "\
RULES:
1. Extract both hard and soft skills accurately from the job description and the resume.
2. Normalize skill names: variants such as 'React.js' and 'React' are the same skill and must appear once.
3. Include technical tools, frameworks, libraries, and relevant soft skills (teamwork, communication).
4. Be factual and concise. Do NOT assume anything the resume does not support.
5. Ground every claim in literal resume text and cite it in `sources` and `evidence`.
6. Every field above is required. Use null or an empty list when the resume has no information.
7. Return ONLY the JSON object: no text before or after, no markdown code fences.";

const PROFICIENCY_LEVELS: &[&str] = &["Beginner", "Intermediate", "Advanced", "Expert"];
const SENIORITY_LEVELS: &[&str] = &["Junior", "Mid", "Senior", "Lead"];
const READINESS_LEVELS: &[&str] = &["Ready", "Needs further assessment", "Not ready"];

/// Builds the user-role instruction for one resume/job-description pair.
/// Pure and deterministic: the same inputs always yield the same prompt.
pub fn build_prompt(resume_text: &str, job_description: &str) -> String {
    let recommendations: Vec<&str> = Recommendation::ALL.iter().map(|r| r.label()).collect();

    let schema = ANALYSIS_SCHEMA
        .replace("{proficiency}", &PROFICIENCY_LEVELS.join("|"))
        .replace("{seniority}", &SENIORITY_LEVELS.join("|"))
        .replace("{recommendation}", &recommendations.join("|"))
        .replace("{readiness}", &READINESS_LEVELS.join("|"));

    // Inputs go after the template verbatim; they are never run through `replace`.
    format!(
        "{ANALYSIS_PREAMBLE}\n\n{schema}\n\n{ANALYSIS_RULES}\n\n\
         Now analyze carefully:\n\nResume:\n{resume_text}\n\nJob Description:\n{job_description}\n"
    )
}
