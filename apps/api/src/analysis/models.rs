//! Structured evaluation returned by the analysis pipeline.
//!
//! The four core fields (`matchPercentage`, `summary`, `recommendation`,
//! `requirementsSummary`) must decode for a model reply to count as strict.
//! Every other field of the instructed schema is decoded leniently: a
//! missing or mistyped value becomes its default instead of failing the
//! whole reply.

use std::fmt;

use serde::de::{DeserializeOwned, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Match score in percent, or the `"N/A"` sentinel when it could not be recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPercentage {
    Score(u8),
    Unavailable,
}

pub const MATCH_UNAVAILABLE: &str = "N/A";

impl MatchPercentage {
    /// Builds a score, rejecting values above 100.
    pub fn from_score(value: u64) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(MatchPercentage::Score)
    }

    pub fn score(&self) -> Option<u8> {
        match self {
            MatchPercentage::Score(v) => Some(*v),
            MatchPercentage::Unavailable => None,
        }
    }
}

impl fmt::Display for MatchPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPercentage::Score(v) => write!(f, "{v}%"),
            MatchPercentage::Unavailable => f.write_str(MATCH_UNAVAILABLE),
        }
    }
}

impl Serialize for MatchPercentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MatchPercentage::Score(v) => serializer.serialize_u8(*v),
            MatchPercentage::Unavailable => serializer.serialize_str(MATCH_UNAVAILABLE),
        }
    }
}

impl<'de> Deserialize<'de> for MatchPercentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) if n.is_finite() && (0.0..=100.0).contains(&n) => {
                Ok(MatchPercentage::Score(n.round() as u8))
            }
            Repr::Number(n) => Err(serde::de::Error::custom(format!(
                "matchPercentage {n} is outside 0-100"
            ))),
            Repr::Text(s) if s.trim().eq_ignore_ascii_case(MATCH_UNAVAILABLE) => {
                Ok(MatchPercentage::Unavailable)
            }
            Repr::Text(s) => Err(serde::de::Error::custom(format!(
                "matchPercentage must be a number or \"{MATCH_UNAVAILABLE}\", got {s:?}"
            ))),
        }
    }
}

/// The recommendation values the prompt instructs the model to choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    StrongMatch,
    GoodPotentialFit,
    NeedsImprovement,
}

impl Recommendation {
    pub const ALL: [Recommendation; 3] = [
        Recommendation::StrongMatch,
        Recommendation::GoodPotentialFit,
        Recommendation::NeedsImprovement,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::StrongMatch => "Strong match",
            Recommendation::GoodPotentialFit => "Good potential fit",
            Recommendation::NeedsImprovement => "Needs improvement",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(label))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementsSummary {
    #[serde(default, deserialize_with = "lenient")]
    pub required_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub candidate_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub matching_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default, deserialize_with = "lenient")]
    pub year: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub remote_preference: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub notice_period: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub education: Vec<Education>,
    #[serde(default, deserialize_with = "lenient")]
    pub certifications: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillDetail {
    #[serde(default)]
    pub skill: String,
    #[serde(default, deserialize_with = "lenient")]
    pub proficiency: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub years: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub match_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub evidence: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHighlight {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub brief: String,
    #[serde(default, deserialize_with = "lenient")]
    pub tech_stack: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub impact: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceProfile {
    #[serde(default, deserialize_with = "lenient")]
    pub total_years: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub relevant_years: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub domains: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub top_projects: Vec<ProjectHighlight>,
    #[serde(default, deserialize_with = "lenient")]
    pub seniority_level: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub role_fit: Vec<String>,
}

/// Structured profile from a strict reply, or a free-text note recovered by the fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Experience {
    Note(String),
    Profile(ExperienceProfile),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchBreakdown {
    #[serde(default, deserialize_with = "lenient")]
    pub skills: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub experience: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub education: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub certifications: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceClaim {
    #[serde(default)]
    pub claim: String,
    #[serde(default)]
    pub text_snippet: String,
}

/// One structured evaluation of a resume against a job description.
/// `raw` is only set when the model reply had to be recovered by pattern extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub match_percentage: MatchPercentage,
    #[serde(default, deserialize_with = "lenient")]
    pub confidence: Option<f64>,
    pub summary: String,
    #[serde(default, deserialize_with = "lenient")]
    pub candidate: Option<CandidateProfile>,
    pub requirements_summary: RequirementsSummary,
    #[serde(default, deserialize_with = "lenient")]
    pub skill_details: Vec<SkillDetail>,
    #[serde(default, deserialize_with = "lenient")]
    pub experience: Option<Experience>,
    pub recommendation: String,
    #[serde(default, deserialize_with = "lenient")]
    pub recommendation_reasoning: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub interview_readiness: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub suggested_interview_questions: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub suggested_resume_improvements: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub match_breakdown: Option<MatchBreakdown>,
    #[serde(default, deserialize_with = "lenient")]
    pub red_flags: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub sources: Vec<SourceClaim>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl AnalysisResult {
    /// The recommendation as one of the instructed categories, if the model used one.
    pub fn recommendation_kind(&self) -> Option<Recommendation> {
        Recommendation::from_label(&self.recommendation)
    }

    /// True when the result came from pattern recovery rather than a strict decode.
    pub fn is_degraded(&self) -> bool {
        self.raw.is_some()
    }
}

/// Decodes a field, falling back to its default when the value has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}
