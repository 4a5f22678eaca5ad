//! Skill-name normalization, so that "React.js", "ReactJS" and "React"
//! count as one logical skill.

use std::collections::HashSet;

/// Canonical comparison key for a skill name.
///
/// Lowercases, drops punctuation and whitespace (keeping `+` and `#` so
/// `C++` and `C#` stay distinct from `C`), then strips a trailing `js`.
pub fn canonical_skill(name: &str) -> String {
    let key: String = name
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || *c == '+' || *c == '#')
        .collect();

    match key.strip_suffix("js") {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => key,
    }
}

/// Trims each name and removes blanks and later duplicates, keeping the first spelling.
pub fn dedup_skills(skills: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(canonical_skill(s)))
        .collect()
}
