use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// A stored yes/no-like answer. Either a real boolean or whatever the applicant typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Flag(bool),
    Text(String),
}

impl From<bool> for Answer {
    fn from(value: bool) -> Self {
        Answer::Flag(value)
    }
}

impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Answer::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub company: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Explicit "this is my current role" flag.
    pub current: bool,
    pub responsibilities: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub major: Option<String>,
    pub gpa: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub current: bool,
}

/// Voluntary self-identification answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EeoAnswers {
    pub gender: Option<String>,
    pub race: Option<String>,
    pub hispanic_latino: Option<Answer>,
    pub veteran_status: Option<String>,
    pub disability_status: Option<String>,
    pub pronouns: Option<String>,
}

/// The resume as stored: base64 (optionally a `data:` URL) plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub file_name: String,
    pub media_type: String,
    pub data: String,
}

impl StoredDocument {
    pub fn from_bytes(file_name: &str, media_type: &str, bytes: &[u8]) -> Self {
        Self {
            file_name: file_name.to_string(),
            media_type: media_type.to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }
}

/// The applicant record every fill resolves against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub preferred_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,

    pub address: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,

    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub portfolio: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,

    pub years_experience: Option<String>,
    pub experiences: Vec<Experience>,
    pub education: Vec<Education>,

    /// Free-text skills as the applicant wrote them.
    pub skills: Option<String>,
    /// Derived list; falls back to splitting `skills` when empty.
    pub skill_list: Vec<String>,
    pub summary: Option<String>,
    pub cover_letter: Option<String>,

    pub salary_expectation: Option<String>,
    pub notice_period: Option<String>,
    pub available_start_date: Option<String>,
    pub willing_to_relocate: Option<Answer>,
    pub referral_source: Option<String>,

    pub work_authorization: Option<Answer>,
    pub requires_sponsorship: Option<Answer>,
    pub over_18: Option<Answer>,
    pub background_check_consent: Option<Answer>,
    pub previously_employed: Option<Answer>,
    pub criminal_record: Option<Answer>,
    pub non_compete: Option<Answer>,

    pub eeo: EeoAnswers,

    pub resume: Option<StoredDocument>,
    /// Key of the resume in the document payload store, when not inlined.
    pub resume_key: Option<String>,
}

impl Profile {
    /// The explicitly current role, else the first one listed.
    pub fn current_experience(&self) -> Option<&Experience> {
        self.experiences
            .iter()
            .find(|e| e.current)
            .or_else(|| self.experiences.first())
    }

    /// The explicitly current school, else the first one listed.
    pub fn primary_education(&self) -> Option<&Education> {
        self.education
            .iter()
            .find(|e| e.current)
            .or_else(|| self.education.first())
    }

    pub fn skills(&self) -> Vec<String> {
        if !self.skill_list.is_empty() {
            return self.skill_list.clone();
        }
        self.skills
            .as_deref()
            .map(|s| {
                s.split([',', ';', '\n', '|'])
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_deserializes_camel_case_with_bool_answer() {
        let json = r#"{"fullName": "Jane Doe", "email": "jane@x.com", "workAuthorization": true}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(profile.work_authorization, Some(Answer::Flag(true)));
        assert!(profile.experiences.is_empty());
    }

    #[test]
    fn test_text_answer_stays_text() {
        let json = r#"{"requiresSponsorship": "No, I do not"}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(
            profile.requires_sponsorship,
            Some(Answer::Text("No, I do not".to_string()))
        );
    }

    #[test]
    fn test_current_experience_prefers_flagged_entry() {
        let profile = Profile {
            experiences: vec![
                Experience {
                    company: Some("Old Co".to_string()),
                    ..Default::default()
                },
                Experience {
                    company: Some("Now Co".to_string()),
                    current: true,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(
            profile.current_experience().and_then(|e| e.company.as_deref()),
            Some("Now Co")
        );
    }

    #[test]
    fn test_skills_fall_back_to_free_text() {
        let profile = Profile {
            skills: Some("Rust, Go;  SQL\nKubernetes".to_string()),
            ..Default::default()
        };
        assert_eq!(profile.skills(), vec!["Rust", "Go", "SQL", "Kubernetes"]);
    }
}
