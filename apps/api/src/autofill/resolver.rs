//! Value Resolver — maps a classified field type plus the applicant profile to a concrete value.
//!
//! Yes/no types go through intent translation: the stored answer becomes a boolean
//! intent, which is then re-encoded into whatever vocabulary the control's options use.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::autofill::collector::{ControlKind, FieldDescriptor};
use crate::autofill::field_types::{FieldTypeCatalog, FieldTypeId, ValueNature};
use crate::dom::ControlOption;
use crate::models::profile::{Answer, Profile, StoredDocument};

/// Value used for voluntary self-identification questions the applicant left blank.
pub const DECLINE_TO_ANSWER: &str = "Decline to self-identify";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResolvedValue {
    Text(String),
    File(StoredDocument),
}

impl ResolvedValue {
    /// Short form for reports. Files report their name, never their payload.
    pub fn display(&self) -> String {
        match self {
            ResolvedValue::Text(text) => text.clone(),
            ResolvedValue::File(doc) => doc.file_name.clone(),
        }
    }
}

/// Vocabulary pairs tried in order when re-encoding an intent into option labels.
const INTENT_VOCABULARIES: &[(&str, &str)] = &[
    ("yes", "no"),
    ("authorized", "not authorized"),
    ("eligible", "not eligible"),
    ("true", "false"),
    ("1", "0"),
];

const NEGATIVE_WORDS: &[&str] = &[
    "no", "n", "not", "false", "0", "never", "none", "don't", "dont", "cannot", "can't",
    "won't", "decline", "declined", "negative",
];
const NEGATIVE_PHRASES: &[&str] = &["do not", "will not", "am not", "i'm not"];
const AFFIRMATIVE_WORDS: &[&str] = &[
    "yes", "y", "true", "1", "yeah", "yep", "sure", "authorized", "authorised", "eligible",
    "agree", "accept", "citizen", "affirmative", "ok", "okay",
];
const AFFIRMATIVE_PHRASES: &[&str] = &["i am", "i do", "i will", "i have", "i can"];

pub struct ValueResolver {
    catalog: Arc<FieldTypeCatalog>,
}

impl ValueResolver {
    pub fn new(catalog: Arc<FieldTypeCatalog>) -> Self {
        Self { catalog }
    }

    /// `None` means the profile holds nothing for this field and no default applies.
    pub fn resolve(
        &self,
        id: FieldTypeId,
        profile: &Profile,
        descriptor: &FieldDescriptor,
    ) -> Option<ResolvedValue> {
        let field_type = self.catalog.get(id)?;

        if field_type.nature == ValueNature::File {
            return profile.resume.clone().map(ResolvedValue::File);
        }
        // A text value can never be typed into a file picker.
        if descriptor.kind == ControlKind::File {
            return None;
        }

        let raw = match field_type.nature {
            ValueNature::YesNo => {
                resolve_yes_no(id, profile, field_type.default_answer, &descriptor.options)?
            }
            ValueNature::Tokens => {
                let skills = profile.skills();
                if skills.is_empty() {
                    return None;
                }
                skills.join(", ")
            }
            ValueNature::Choice if is_eeo(id) => {
                text_for(id, profile).unwrap_or_else(|| DECLINE_TO_ANSWER.to_string())
            }
            _ => text_for(id, profile)?,
        };

        let value = post_process(raw.trim(), field_type.nature, descriptor);
        if value.is_empty() {
            return None;
        }
        Some(ResolvedValue::Text(value))
    }
}

fn is_eeo(id: FieldTypeId) -> bool {
    matches!(
        id,
        FieldTypeId::Gender
            | FieldTypeId::Race
            | FieldTypeId::VeteranStatus
            | FieldTypeId::DisabilityStatus
    )
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn name_parts(profile: &Profile) -> Vec<String> {
    profile
        .full_name
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .map(String::from)
        .collect()
}

/// Plain profile lookup with the documented fallbacks.
fn text_for(id: FieldTypeId, p: &Profile) -> Option<String> {
    let experience = p.current_experience();
    let education = p.primary_education();
    match id {
        FieldTypeId::FirstName => {
            non_empty(p.first_name.as_ref()).or_else(|| name_parts(p).first().cloned())
        }
        FieldTypeId::LastName => non_empty(p.last_name.as_ref()).or_else(|| {
            let parts = name_parts(p);
            (parts.len() > 1).then(|| parts[parts.len() - 1].clone())
        }),
        FieldTypeId::MiddleName => non_empty(p.middle_name.as_ref()).or_else(|| {
            let parts = name_parts(p);
            (parts.len() > 2).then(|| parts[1..parts.len() - 1].join(" "))
        }),
        FieldTypeId::FullName => non_empty(p.full_name.as_ref()).or_else(|| {
            let joined = [p.first_name.as_ref(), p.last_name.as_ref()]
                .into_iter()
                .filter_map(non_empty)
                .collect::<Vec<_>>()
                .join(" ");
            (!joined.is_empty()).then_some(joined)
        }),
        FieldTypeId::PreferredName => non_empty(p.preferred_name.as_ref()),
        FieldTypeId::Email => non_empty(p.email.as_ref()),
        FieldTypeId::Phone => non_empty(p.phone.as_ref()),
        FieldTypeId::Address => non_empty(p.address.as_ref()),
        FieldTypeId::AddressLine2 => non_empty(p.address_line2.as_ref()),
        FieldTypeId::City => non_empty(p.city.as_ref()),
        FieldTypeId::State => non_empty(p.state.as_ref()),
        FieldTypeId::ZipCode => non_empty(p.zip_code.as_ref()),
        FieldTypeId::Country => non_empty(p.country.as_ref()),
        FieldTypeId::Location => {
            let city_state = [p.city.as_ref(), p.state.as_ref()]
                .into_iter()
                .filter_map(non_empty)
                .collect::<Vec<_>>()
                .join(", ");
            if city_state.is_empty() {
                non_empty(p.country.as_ref())
            } else {
                Some(city_state)
            }
        }
        FieldTypeId::Linkedin => non_empty(p.linkedin.as_ref()),
        FieldTypeId::Github => non_empty(p.github.as_ref()),
        FieldTypeId::Portfolio => {
            non_empty(p.portfolio.as_ref()).or_else(|| non_empty(p.website.as_ref()))
        }
        FieldTypeId::Website => {
            non_empty(p.website.as_ref()).or_else(|| non_empty(p.portfolio.as_ref()))
        }
        FieldTypeId::Twitter => non_empty(p.twitter.as_ref()),
        FieldTypeId::CurrentCompany => experience.and_then(|e| non_empty(e.company.as_ref())),
        FieldTypeId::CurrentTitle => experience.and_then(|e| non_empty(e.title.as_ref())),
        FieldTypeId::YearsExperience => non_empty(p.years_experience.as_ref()),
        FieldTypeId::ExperienceStartDate => {
            experience.and_then(|e| non_empty(e.start_date.as_ref()))
        }
        FieldTypeId::ExperienceEndDate => experience
            .filter(|e| !e.current)
            .and_then(|e| non_empty(e.end_date.as_ref())),
        FieldTypeId::ExperienceDescription => {
            experience.and_then(|e| non_empty(e.responsibilities.as_ref()))
        }
        FieldTypeId::School => education.and_then(|e| non_empty(e.institution.as_ref())),
        FieldTypeId::Degree => education.and_then(|e| non_empty(e.degree.as_ref())),
        FieldTypeId::Major => education.and_then(|e| non_empty(e.major.as_ref())),
        FieldTypeId::Gpa => education.and_then(|e| non_empty(e.gpa.as_ref())),
        FieldTypeId::EducationStartDate => {
            education.and_then(|e| non_empty(e.start_date.as_ref()))
        }
        FieldTypeId::GraduationDate => education.and_then(|e| non_empty(e.end_date.as_ref())),
        FieldTypeId::ProfessionalSummary => non_empty(p.summary.as_ref()),
        FieldTypeId::CoverLetter => non_empty(p.cover_letter.as_ref()),
        FieldTypeId::SalaryExpectation => non_empty(p.salary_expectation.as_ref()),
        FieldTypeId::NoticePeriod => non_empty(p.notice_period.as_ref()),
        FieldTypeId::AvailableStartDate => non_empty(p.available_start_date.as_ref()),
        FieldTypeId::ReferralSource => non_empty(p.referral_source.as_ref()),
        FieldTypeId::Gender => non_empty(p.eeo.gender.as_ref()),
        FieldTypeId::Race => non_empty(p.eeo.race.as_ref()),
        FieldTypeId::VeteranStatus => non_empty(p.eeo.veteran_status.as_ref()),
        FieldTypeId::DisabilityStatus => non_empty(p.eeo.disability_status.as_ref()),
        FieldTypeId::Pronouns => non_empty(p.eeo.pronouns.as_ref()),
        FieldTypeId::Skills
        | FieldTypeId::WillingToRelocate
        | FieldTypeId::WorkAuthorization
        | FieldTypeId::RequiresSponsorship
        | FieldTypeId::Over18
        | FieldTypeId::BackgroundCheck
        | FieldTypeId::PreviouslyEmployed
        | FieldTypeId::CriminalRecord
        | FieldTypeId::NonCompete
        | FieldTypeId::HispanicLatino
        | FieldTypeId::Resume => None,
    }
}

fn answer_for(id: FieldTypeId, p: &Profile) -> Option<&Answer> {
    match id {
        FieldTypeId::WillingToRelocate => p.willing_to_relocate.as_ref(),
        FieldTypeId::WorkAuthorization => p.work_authorization.as_ref(),
        FieldTypeId::RequiresSponsorship => p.requires_sponsorship.as_ref(),
        FieldTypeId::Over18 => p.over_18.as_ref(),
        FieldTypeId::BackgroundCheck => p.background_check_consent.as_ref(),
        FieldTypeId::PreviouslyEmployed => p.previously_employed.as_ref(),
        FieldTypeId::CriminalRecord => p.criminal_record.as_ref(),
        FieldTypeId::NonCompete => p.non_compete.as_ref(),
        FieldTypeId::HispanicLatino => p.eeo.hispanic_latino.as_ref(),
        _ => None,
    }
}

fn resolve_yes_no(
    id: FieldTypeId,
    profile: &Profile,
    default_answer: Option<bool>,
    options: &[ControlOption],
) -> Option<String> {
    let answer = answer_for(id, profile);
    let intent = answer.and_then(answer_intent).or(default_answer);
    match intent {
        Some(intent) => Some(encode_intent(intent, options)),
        // Self-identification keeps whatever the applicant wrote, else declines.
        None if id == FieldTypeId::HispanicLatino => Some(match answer {
            Some(Answer::Text(text)) if !text.trim().is_empty() => text.clone(),
            _ => DECLINE_TO_ANSWER.to_string(),
        }),
        None => None,
    }
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

fn contains_phrase(haystack: &[String], phrase: &str) -> bool {
    let needle = words(phrase);
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle.as_slice())
}

/// Boolean intent of a stored answer. Negatives are checked first so that
/// "I do not require sponsorship" reads as `false`.
pub fn answer_intent(answer: &Answer) -> Option<bool> {
    match answer {
        Answer::Flag(flag) => Some(*flag),
        Answer::Text(text) => {
            let w = words(text);
            if NEGATIVE_WORDS.iter().any(|n| w.iter().any(|x| x == n))
                || NEGATIVE_PHRASES.iter().any(|p| contains_phrase(&w, p))
            {
                Some(false)
            } else if AFFIRMATIVE_WORDS.iter().any(|a| w.iter().any(|x| x == a))
                || AFFIRMATIVE_PHRASES.iter().any(|p| contains_phrase(&w, p))
            {
                Some(true)
            } else {
                None
            }
        }
    }
}

/// Re-encodes an intent into the control's own vocabulary, falling back to "Yes"/"No".
pub fn encode_intent(intent: bool, options: &[ControlOption]) -> String {
    let candidates: Vec<&ControlOption> =
        options.iter().filter(|o| !o.is_placeholder()).collect();

    for (positive, negative) in INTENT_VOCABULARIES {
        let by_value = *positive == "1";
        let found = candidates.iter().find(|option| {
            let text = words(&option.text);
            let has_negative = contains_phrase(&text, negative)
                || (by_value && option.value.trim() == *negative);
            let has_positive = contains_phrase(&text, positive)
                || (by_value && option.value.trim() == *positive);
            if intent {
                has_positive && !has_negative
            } else {
                has_negative
            }
        });
        if let Some(option) = found {
            return if by_value {
                option.value.clone()
            } else {
                option.text.trim().to_string()
            };
        }
    }

    let fallback = if intent { "Yes" } else { "No" };
    fallback.to_string()
}

fn post_process(value: &str, nature: ValueNature, descriptor: &FieldDescriptor) -> String {
    match nature {
        ValueNature::Phone => format_phone(value),
        ValueNature::Date if descriptor.input_type.as_deref() == Some("date") => {
            format_date(value).unwrap_or_else(|| value.to_string())
        }
        _ => value.to_string(),
    }
}

/// Exactly ten digits become `(XXX) XXX-XXXX`; anything else passes through.
pub fn format_phone(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 10 {
        return value.to_string();
    }
    format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..10])
}

const FULL_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%B %d, %Y", "%b %d, %Y"];
const MONTH_FORMATS: &[&str] = &["%Y-%m", "%m/%Y", "%B %Y", "%b %Y"];

/// Recognizable dates as `YYYY-MM-DD`. Month-only dates take the first of the month.
pub fn format_date(value: &str) -> Option<String> {
    let value = value.trim();
    let parsed = FULL_DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
        .or_else(|| {
            MONTH_FORMATS.iter().find_map(|f| {
                NaiveDate::parse_from_str(&format!("{value} 01"), &format!("{f} %d")).ok()
            })
        })
        .or_else(|| {
            (value.len() == 4)
                .then(|| value.parse::<i32>().ok())
                .flatten()
                .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        })?;
    Some(parsed.format("%Y-%m-%d").to_string())
}
