//! Field-type catalog — the semantic categories a form control can be classified into.
//!
//! The catalog is plain configuration: `FIELD_TYPE_SPECS` holds the raw vocabulary, and
//! `FieldTypeCatalog::new` compiles it once at startup. The compiled catalog is shared
//! behind an `Arc` and handed to the classifier; nothing here is global state.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid pattern '{pattern}' for {owner}: {source}")]
    InvalidPattern {
        owner: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Identifier of a semantic field type. Serializes as the camelCase id (`workAuthorization`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldTypeId {
    FirstName,
    MiddleName,
    LastName,
    FullName,
    PreferredName,
    Email,
    Phone,
    Address,
    AddressLine2,
    City,
    State,
    ZipCode,
    Country,
    Location,
    Linkedin,
    Github,
    Portfolio,
    Website,
    Twitter,
    CurrentCompany,
    CurrentTitle,
    YearsExperience,
    ExperienceStartDate,
    ExperienceEndDate,
    ExperienceDescription,
    School,
    Degree,
    Major,
    Gpa,
    EducationStartDate,
    GraduationDate,
    Skills,
    ProfessionalSummary,
    CoverLetter,
    SalaryExpectation,
    NoticePeriod,
    AvailableStartDate,
    WillingToRelocate,
    WorkAuthorization,
    RequiresSponsorship,
    Over18,
    BackgroundCheck,
    PreviouslyEmployed,
    CriminalRecord,
    NonCompete,
    Gender,
    Race,
    HispanicLatino,
    VeteranStatus,
    DisabilityStatus,
    Pronouns,
    ReferralSource,
    Resume,
}

impl FieldTypeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldTypeId::FirstName => "firstName",
            FieldTypeId::MiddleName => "middleName",
            FieldTypeId::LastName => "lastName",
            FieldTypeId::FullName => "fullName",
            FieldTypeId::PreferredName => "preferredName",
            FieldTypeId::Email => "email",
            FieldTypeId::Phone => "phone",
            FieldTypeId::Address => "address",
            FieldTypeId::AddressLine2 => "addressLine2",
            FieldTypeId::City => "city",
            FieldTypeId::State => "state",
            FieldTypeId::ZipCode => "zipCode",
            FieldTypeId::Country => "country",
            FieldTypeId::Location => "location",
            FieldTypeId::Linkedin => "linkedin",
            FieldTypeId::Github => "github",
            FieldTypeId::Portfolio => "portfolio",
            FieldTypeId::Website => "website",
            FieldTypeId::Twitter => "twitter",
            FieldTypeId::CurrentCompany => "currentCompany",
            FieldTypeId::CurrentTitle => "currentTitle",
            FieldTypeId::YearsExperience => "yearsExperience",
            FieldTypeId::ExperienceStartDate => "experienceStartDate",
            FieldTypeId::ExperienceEndDate => "experienceEndDate",
            FieldTypeId::ExperienceDescription => "experienceDescription",
            FieldTypeId::School => "school",
            FieldTypeId::Degree => "degree",
            FieldTypeId::Major => "major",
            FieldTypeId::Gpa => "gpa",
            FieldTypeId::EducationStartDate => "educationStartDate",
            FieldTypeId::GraduationDate => "graduationDate",
            FieldTypeId::Skills => "skills",
            FieldTypeId::ProfessionalSummary => "professionalSummary",
            FieldTypeId::CoverLetter => "coverLetter",
            FieldTypeId::SalaryExpectation => "salaryExpectation",
            FieldTypeId::NoticePeriod => "noticePeriod",
            FieldTypeId::AvailableStartDate => "availableStartDate",
            FieldTypeId::WillingToRelocate => "willingToRelocate",
            FieldTypeId::WorkAuthorization => "workAuthorization",
            FieldTypeId::RequiresSponsorship => "requiresSponsorship",
            FieldTypeId::Over18 => "over18",
            FieldTypeId::BackgroundCheck => "backgroundCheck",
            FieldTypeId::PreviouslyEmployed => "previouslyEmployed",
            FieldTypeId::CriminalRecord => "criminalRecord",
            FieldTypeId::NonCompete => "nonCompete",
            FieldTypeId::Gender => "gender",
            FieldTypeId::Race => "race",
            FieldTypeId::HispanicLatino => "hispanicLatino",
            FieldTypeId::VeteranStatus => "veteranStatus",
            FieldTypeId::DisabilityStatus => "disabilityStatus",
            FieldTypeId::Pronouns => "pronouns",
            FieldTypeId::ReferralSource => "referralSource",
            FieldTypeId::Resume => "resume",
        }
    }
}

impl fmt::Display for FieldTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of value a field type carries. Drives formatting and the fill strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueNature {
    Text,
    LongText,
    Email,
    Phone,
    Url,
    Date,
    Number,
    /// Comma-separated tokens, filled into tag-style widgets.
    Tokens,
    /// Boolean intent re-encoded into the control's vocabulary.
    YesNo,
    /// Free choice matched against select options (EEO answers and similar).
    Choice,
    File,
}

/// Raw catalog entry. Keywords and exclusions are matched as lowercase substrings of the
/// field's search string; patterns are regexes over the same string.
#[derive(Debug, Clone)]
pub struct FieldTypeSpec {
    pub id: FieldTypeId,
    pub keywords: &'static [&'static str],
    pub patterns: &'static [&'static str],
    pub context: &'static [&'static str],
    pub exclusions: &'static [&'static str],
    pub base_weight: f64,
    /// Control types (`email`, `tel`, `select`, `textarea`, `file`, ...) this type expects.
    pub input_types: &'static [&'static str],
    pub nature: ValueNature,
    /// Intent used when the profile has no answer for a yes/no type.
    pub default_answer: Option<bool>,
}

/// Compiled catalog entry.
#[derive(Debug, Clone)]
pub struct FieldType {
    pub id: FieldTypeId,
    pub keywords: Vec<String>,
    pub patterns: Vec<Regex>,
    pub context: Vec<String>,
    pub exclusions: Vec<String>,
    pub base_weight: f64,
    pub input_types: Vec<String>,
    pub nature: ValueNature,
    pub default_answer: Option<bool>,
}

impl FieldType {
    fn compile(spec: &FieldTypeSpec) -> Result<Self, CatalogError> {
        Ok(Self {
            id: spec.id,
            keywords: lowercase_all(spec.keywords),
            patterns: compile_patterns(spec.id.as_str(), spec.patterns)?,
            context: lowercase_all(spec.context),
            exclusions: lowercase_all(spec.exclusions),
            base_weight: spec.base_weight,
            input_types: lowercase_all(spec.input_types),
            nature: spec.nature,
            default_answer: spec.default_answer,
        })
    }
}

/// The immutable set of field types the classifier scores against.
#[derive(Debug, Clone)]
pub struct FieldTypeCatalog {
    types: Vec<FieldType>,
}

impl FieldTypeCatalog {
    pub fn new(specs: &[FieldTypeSpec]) -> Result<Self, CatalogError> {
        let types = specs
            .iter()
            .map(FieldType::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { types })
    }

    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(FIELD_TYPE_SPECS)
    }

    pub fn get(&self, id: FieldTypeId) -> Option<&FieldType> {
        self.types.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn lowercase_all(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

pub(crate) fn compile_patterns(owner: &str, patterns: &[&str]) -> Result<Vec<Regex>, CatalogError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|source| CatalogError::InvalidPattern {
                owner: owner.to_string(),
                pattern: p.to_string(),
                source,
            })
        })
        .collect()
}

const TEXT: &[&str] = &["text"];
const URL: &[&str] = &["url", "text"];
const DATE: &[&str] = &["date", "month", "text"];
const CHOICE: &[&str] = &["select"];
const LONG: &[&str] = &["textarea"];
const EXPERIENCE_CONTEXT: &[&str] = &["experience", "employment", "work", "job"];
const EDUCATION_CONTEXT: &[&str] = &["education", "school", "university", "degree"];
const EEO_CONTEXT: &[&str] = &["voluntary", "self-identification", "eeo", "demographic", "equal"];

/// Built-in vocabulary. Order matters only for tie-breaking between equal scores.
pub const FIELD_TYPE_SPECS: &[FieldTypeSpec] = &[
    // ── Identity ──────────────────────────────────────────────────────────
    FieldTypeSpec {
        id: FieldTypeId::FirstName,
        keywords: &["first", "name"],
        patterns: &[r"first[\s_-]*name", r"given[\s_-]*name", r"\bfname\b", r"forename"],
        context: &[],
        exclusions: &["last", "company", "user", "middle", "preferred", "nick", "file", "account"],
        base_weight: 1.0,
        input_types: TEXT,
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::MiddleName,
        keywords: &["middle", "name"],
        patterns: &[r"middle[\s_-]*(name|initial)"],
        context: &[],
        exclusions: &["company", "user"],
        base_weight: 1.0,
        input_types: TEXT,
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::LastName,
        keywords: &["last", "name"],
        patterns: &[r"last[\s_-]*name", r"family[\s_-]*name", r"surname", r"\blname\b"],
        context: &[],
        exclusions: &["first", "company", "user", "middle", "preferred", "file", "account"],
        base_weight: 1.0,
        input_types: TEXT,
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::FullName,
        keywords: &["full", "name"],
        patterns: &[r"^\s*name\b", r"full[\s_-]*name", r"your name", r"legal[\s_-]*name"],
        context: &[],
        exclusions: &[
            "first", "last", "middle", "company", "employer", "user", "file", "school",
            "university", "reference", "preferred", "nick", "emergency", "manager", "recruiter",
            "institution", "account", "referr",
        ],
        base_weight: 1.0,
        input_types: TEXT,
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::PreferredName,
        keywords: &["preferred", "name"],
        patterns: &[r"preferred[\s_-]*(first[\s_-]*)?name", r"nick[\s_-]*name"],
        context: &[],
        exclusions: &["company", "pronoun"],
        base_weight: 1.0,
        input_types: TEXT,
        nature: ValueNature::Text,
        default_answer: None,
    },
    // ── Contact ───────────────────────────────────────────────────────────
    FieldTypeSpec {
        id: FieldTypeId::Email,
        keywords: &["email", "mail"],
        patterns: &[r"e-?mail"],
        context: &[],
        exclusions: &[],
        base_weight: 1.1,
        input_types: &["email"],
        nature: ValueNature::Email,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::Phone,
        keywords: &["phone"],
        patterns: &[r"phone", r"mobile", r"\bcell\b", r"\btel(ephone)?\b"],
        context: &[],
        exclusions: &["type", "extension", "country code", "device"],
        base_weight: 1.0,
        input_types: &["tel"],
        nature: ValueNature::Phone,
        default_answer: None,
    },
    // ── Address ───────────────────────────────────────────────────────────
    FieldTypeSpec {
        id: FieldTypeId::Address,
        keywords: &["address", "street"],
        patterns: &[r"^\s*address\b", r"street", r"address[\s_-]*(line)?[\s_-]*1"],
        context: &[],
        exclusions: &["email", "e-mail", "line 2", "line2", "address2", "ip address", "web", "url"],
        base_weight: 1.0,
        input_types: TEXT,
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::AddressLine2,
        keywords: &["address"],
        patterns: &[r"address[\s_-]*(line)?[\s_-]*2", r"\bapt\b", r"suite", r"\bunit\b"],
        context: &[],
        exclusions: &["email", "e-mail", "web"],
        base_weight: 1.0,
        input_types: TEXT,
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::City,
        keywords: &["city"],
        patterns: &[r"\bcity\b", r"\btown\b"],
        context: &[],
        exclusions: &["ethnic", "electric", "state"],
        base_weight: 1.0,
        input_types: TEXT,
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::State,
        keywords: &["state"],
        patterns: &[r"\bstate\b", r"province", r"\bregion\b"],
        context: &[],
        exclusions: &["statement", "city", "united states", "estate"],
        base_weight: 1.0,
        input_types: &["text", "select"],
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::ZipCode,
        keywords: &["zip", "postal"],
        patterns: &[r"zip", r"postal", r"post[\s_-]*code"],
        context: &[],
        exclusions: &[],
        base_weight: 1.0,
        input_types: TEXT,
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::Country,
        keywords: &["country"],
        patterns: &[r"\bcountry\b"],
        context: &[],
        exclusions: &["code", "phone", "citizenship"],
        base_weight: 1.0,
        input_types: &["select", "text"],
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::Location,
        keywords: &["location"],
        patterns: &[
            r"location",
            r"city[\s,/&]+state",
            r"where .*(live|located|based)",
        ],
        context: &[],
        exclusions: &["preferred", "relocat", "office", "job location", "work location"],
        base_weight: 1.0,
        input_types: TEXT,
        nature: ValueNature::Text,
        default_answer: None,
    },
    // ── Links ─────────────────────────────────────────────────────────────
    FieldTypeSpec {
        id: FieldTypeId::Linkedin,
        keywords: &["linkedin"],
        patterns: &[r"linked[\s_-]*in"],
        context: &[],
        exclusions: &[],
        base_weight: 1.2,
        input_types: URL,
        nature: ValueNature::Url,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::Github,
        keywords: &["github"],
        patterns: &[r"git[\s_-]*hub"],
        context: &[],
        exclusions: &[],
        base_weight: 1.1,
        input_types: URL,
        nature: ValueNature::Url,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::Portfolio,
        keywords: &["portfolio"],
        patterns: &[r"portfolio", r"behance", r"dribbble"],
        context: &[],
        exclusions: &[],
        base_weight: 1.0,
        input_types: URL,
        nature: ValueNature::Url,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::Website,
        keywords: &["website"],
        patterns: &[r"web[\s_-]*site", r"personal[\s_-]*(site|url)", r"\burl\b", r"homepage"],
        context: &[],
        exclusions: &["company", "github", "twitter"],
        base_weight: 1.0,
        input_types: URL,
        nature: ValueNature::Url,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::Twitter,
        keywords: &["twitter"],
        patterns: &[r"twitter", r"\bx\.com\b"],
        context: &[],
        exclusions: &[],
        base_weight: 1.0,
        input_types: URL,
        nature: ValueNature::Url,
        default_answer: None,
    },
    // ── Experience ────────────────────────────────────────────────────────
    FieldTypeSpec {
        id: FieldTypeId::CurrentCompany,
        keywords: &["company"],
        patterns: &[
            r"current[\s_-]*(company|employer)",
            r"employer",
            r"company[\s_-]*name",
            r"organi[sz]ation",
        ],
        context: EXPERIENCE_CONTEXT,
        exclusions: &["previous", "former", "why", "hear", "website", "url"],
        base_weight: 1.0,
        input_types: TEXT,
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::CurrentTitle,
        keywords: &["title"],
        patterns: &[r"(job|current|position)[\s_-]*title", r"\brole\b", r"\bposition\b"],
        context: EXPERIENCE_CONTEXT,
        exclusions: &["salutation", "prefix", "course", "thesis", "page", "applying"],
        base_weight: 1.0,
        input_types: TEXT,
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::YearsExperience,
        keywords: &["years", "experience"],
        patterns: &[
            r"years?[\s_-]*(of[\s_-]*)?(professional[\s_-]*|relevant[\s_-]*)?experience",
            r"how many years",
        ],
        context: &[],
        exclusions: &[],
        base_weight: 1.0,
        input_types: &["number", "text", "select"],
        nature: ValueNature::Number,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::ExperienceStartDate,
        keywords: &["start"],
        patterns: &[r"start[\s_-]*date", r"date[\s_-]*started", r"\bfrom\b"],
        context: EXPERIENCE_CONTEXT,
        exclusions: &[
            "available", "availability", "earliest", "education", "school", "degree",
            "when can you",
        ],
        base_weight: 1.0,
        input_types: DATE,
        nature: ValueNature::Date,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::ExperienceEndDate,
        keywords: &["end"],
        patterns: &[r"end[\s_-]*date", r"date[\s_-]*(ended|left)"],
        context: EXPERIENCE_CONTEXT,
        exclusions: &["education", "school", "graduat", "degree"],
        base_weight: 1.0,
        input_types: DATE,
        nature: ValueNature::Date,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::ExperienceDescription,
        keywords: &["description"],
        patterns: &[
            r"responsibilit",
            r"(job|role|position)[\s_-]*description",
            r"describe your (role|work|duties)",
            r"duties",
        ],
        context: EXPERIENCE_CONTEXT,
        exclusions: &["cover", "summary", "about you"],
        base_weight: 1.0,
        input_types: LONG,
        nature: ValueNature::LongText,
        default_answer: None,
    },
    // ── Education ─────────────────────────────────────────────────────────
    FieldTypeSpec {
        id: FieldTypeId::School,
        keywords: &["school", "university"],
        patterns: &[r"school", r"university", r"college", r"institution"],
        context: &[],
        exclusions: &["degree", "major", "gpa", "date", "year", "high school diploma"],
        base_weight: 1.0,
        input_types: &["text", "select"],
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::Degree,
        keywords: &["degree"],
        patterns: &[r"degree", r"qualification", r"level of education", r"education level"],
        context: &[],
        exclusions: &["major", "field", "discipline", "date", "year"],
        base_weight: 1.0,
        input_types: &["select", "text"],
        nature: ValueNature::Choice,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::Major,
        keywords: &["major"],
        patterns: &[
            r"major",
            r"field of study",
            r"discipline",
            r"concentration",
            r"area of study",
        ],
        context: &[],
        exclusions: &[],
        base_weight: 1.0,
        input_types: &["text", "select"],
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::Gpa,
        keywords: &["gpa"],
        patterns: &[r"\bgpa\b", r"grade point", r"\bcgpa\b"],
        context: &[],
        exclusions: &[],
        base_weight: 1.0,
        input_types: &["text", "number"],
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::EducationStartDate,
        keywords: &["start"],
        patterns: &[r"start[\s_-]*date"],
        context: EDUCATION_CONTEXT,
        exclusions: &["available", "availability", "employment", "job", "earliest"],
        base_weight: 1.0,
        input_types: DATE,
        nature: ValueNature::Date,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::GraduationDate,
        keywords: &["graduation"],
        patterns: &[r"graduat", r"completion[\s_-]*date", r"end[\s_-]*date"],
        context: EDUCATION_CONTEXT,
        exclusions: &["employment", "job"],
        base_weight: 1.0,
        input_types: DATE,
        nature: ValueNature::Date,
        default_answer: None,
    },
    // ── Narrative ─────────────────────────────────────────────────────────
    FieldTypeSpec {
        id: FieldTypeId::Skills,
        keywords: &["skills"],
        patterns: &[r"skill", r"technolog", r"competenc", r"expertise"],
        context: &[],
        exclusions: &["years"],
        base_weight: 1.0,
        input_types: &["text", "textarea"],
        nature: ValueNature::Tokens,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::ProfessionalSummary,
        keywords: &["summary"],
        patterns: &[r"summary", r"about (you|yourself)", r"\bprofile\b", r"\bbio\b", r"introduc"],
        context: &[],
        exclusions: &["job summary", "cover", "url", "link"],
        base_weight: 1.0,
        input_types: LONG,
        nature: ValueNature::LongText,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::CoverLetter,
        keywords: &["cover", "letter"],
        patterns: &[r"cover[\s_-]*letter", r"motivation"],
        context: &[],
        exclusions: &[],
        base_weight: 1.0,
        input_types: LONG,
        nature: ValueNature::LongText,
        default_answer: None,
    },
    // ── Logistics ─────────────────────────────────────────────────────────
    FieldTypeSpec {
        id: FieldTypeId::SalaryExpectation,
        keywords: &["salary"],
        patterns: &[
            r"salary",
            r"compensation",
            r"desired pay",
            r"pay expectation",
            r"expected (pay|ctc)",
        ],
        context: &[],
        exclusions: &["current salary"],
        base_weight: 1.0,
        input_types: &["text", "number"],
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::NoticePeriod,
        keywords: &["notice"],
        patterns: &[r"notice[\s_-]*period"],
        context: &[],
        exclusions: &["privacy"],
        base_weight: 1.0,
        input_types: &["text", "select"],
        nature: ValueNature::Text,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::AvailableStartDate,
        keywords: &["available", "start"],
        patterns: &[r"availab", r"earliest.*start", r"when can you start"],
        context: &[],
        exclusions: &["education", "school"],
        base_weight: 1.0,
        input_types: DATE,
        nature: ValueNature::Date,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::WillingToRelocate,
        keywords: &["relocate"],
        patterns: &[r"relocat"],
        context: &[],
        exclusions: &[],
        base_weight: 1.0,
        input_types: CHOICE,
        nature: ValueNature::YesNo,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::ReferralSource,
        keywords: &["hear"],
        patterns: &[r"how did you (hear|find|learn)", r"referr", r"\bsource\b"],
        context: &[],
        exclusions: &["open source"],
        base_weight: 1.0,
        input_types: &["select", "text"],
        nature: ValueNature::Choice,
        default_answer: None,
    },
    // ── Legal ─────────────────────────────────────────────────────────────
    FieldTypeSpec {
        id: FieldTypeId::WorkAuthorization,
        keywords: &["authorized", "work"],
        patterns: &[
            r"authori[sz]ed to work",
            r"work[\s_-]*authori[sz]ation",
            r"eligib\w* to work",
            r"right to work",
            r"legally (authori[sz]ed|eligible|permitted)",
        ],
        context: &[],
        exclusions: &[],
        base_weight: 1.0,
        input_types: CHOICE,
        nature: ValueNature::YesNo,
        default_answer: Some(true),
    },
    FieldTypeSpec {
        id: FieldTypeId::RequiresSponsorship,
        keywords: &["sponsorship"],
        patterns: &[r"sponsor", r"\bvisa\b", r"h-?1b"],
        context: &[],
        exclusions: &["authorized to work", "authorised to work", "eligible to work"],
        base_weight: 1.0,
        input_types: CHOICE,
        nature: ValueNature::YesNo,
        default_answer: Some(false),
    },
    FieldTypeSpec {
        id: FieldTypeId::Over18,
        keywords: &["18"],
        patterns: &[r"18 years", r"over (the age of )?18", r"at least 18", r"legal age"],
        context: &[],
        exclusions: &[],
        base_weight: 1.0,
        input_types: CHOICE,
        nature: ValueNature::YesNo,
        default_answer: Some(true),
    },
    FieldTypeSpec {
        id: FieldTypeId::BackgroundCheck,
        keywords: &["background"],
        patterns: &[r"background[\s_-]*(check|screen|investigation)"],
        context: &[],
        exclusions: &[],
        base_weight: 1.0,
        input_types: CHOICE,
        nature: ValueNature::YesNo,
        default_answer: Some(true),
    },
    FieldTypeSpec {
        id: FieldTypeId::PreviouslyEmployed,
        keywords: &["previously", "employed"],
        patterns: &[
            r"(previously|formerly|ever) (been )?(employed|worked)",
            r"former employee",
            r"worked (here|for us)",
        ],
        context: &[],
        exclusions: &[],
        base_weight: 1.0,
        input_types: CHOICE,
        nature: ValueNature::YesNo,
        default_answer: Some(false),
    },
    FieldTypeSpec {
        id: FieldTypeId::CriminalRecord,
        keywords: &["convicted"],
        patterns: &[r"convict", r"felony", r"criminal"],
        context: &[],
        exclusions: &[],
        base_weight: 1.0,
        input_types: CHOICE,
        nature: ValueNature::YesNo,
        default_answer: Some(false),
    },
    FieldTypeSpec {
        id: FieldTypeId::NonCompete,
        keywords: &["non-compete"],
        patterns: &[r"non[\s_-]*compete", r"restrictive covenant", r"non[\s_-]*solicit"],
        context: &[],
        exclusions: &[],
        base_weight: 1.0,
        input_types: CHOICE,
        nature: ValueNature::YesNo,
        default_answer: Some(false),
    },
    // ── Voluntary self-identification ─────────────────────────────────────
    FieldTypeSpec {
        id: FieldTypeId::Gender,
        keywords: &["gender"],
        patterns: &[r"gender", r"\bsex\b"],
        context: EEO_CONTEXT,
        exclusions: &["pronoun"],
        base_weight: 1.0,
        input_types: CHOICE,
        nature: ValueNature::Choice,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::Race,
        keywords: &["race"],
        patterns: &[r"\brace\b", r"ethnic"],
        context: EEO_CONTEXT,
        exclusions: &["hispanic", "latino"],
        base_weight: 1.0,
        input_types: CHOICE,
        nature: ValueNature::Choice,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::HispanicLatino,
        keywords: &["hispanic"],
        patterns: &[r"hispanic", r"latin[oax]"],
        context: EEO_CONTEXT,
        exclusions: &[],
        base_weight: 1.0,
        input_types: CHOICE,
        nature: ValueNature::YesNo,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::VeteranStatus,
        keywords: &["veteran"],
        patterns: &[r"veteran", r"military", r"armed forces"],
        context: EEO_CONTEXT,
        exclusions: &[],
        base_weight: 1.0,
        input_types: CHOICE,
        nature: ValueNature::Choice,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::DisabilityStatus,
        keywords: &["disability"],
        patterns: &[r"disabilit", r"handicap"],
        context: EEO_CONTEXT,
        exclusions: &[],
        base_weight: 1.0,
        input_types: CHOICE,
        nature: ValueNature::Choice,
        default_answer: None,
    },
    FieldTypeSpec {
        id: FieldTypeId::Pronouns,
        keywords: &["pronoun"],
        patterns: &[r"pronoun"],
        context: &[],
        exclusions: &[],
        base_weight: 1.0,
        input_types: &["text", "select"],
        nature: ValueNature::Choice,
        default_answer: None,
    },
    // ── Documents ─────────────────────────────────────────────────────────
    FieldTypeSpec {
        id: FieldTypeId::Resume,
        keywords: &["resume"],
        patterns: &[r"r[eé]sum[eé]", r"\bcv\b", r"curriculum vitae"],
        context: &[],
        exclusions: &["cover"],
        base_weight: 1.1,
        input_types: &["file"],
        nature: ValueNature::File,
        default_answer: None,
    },
];
