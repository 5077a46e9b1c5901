//! Resume Structural Parser — segments extracted resume text into profile fields.
//!
//! Purely heuristic: contact details by regex, sections by header vocabulary, experience
//! entries split on date-range lines. Output merges into a `Profile` without overwriting
//! anything the applicant already entered.

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::models::profile::{Education, Experience, Profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Header,
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
}

const SECTION_HEADERS: &[(Section, &[&str])] = &[
    (
        Section::Summary,
        &["summary", "professional summary", "profile", "objective", "about me", "career objective"],
    ),
    (
        Section::Experience,
        &[
            "experience",
            "work experience",
            "professional experience",
            "employment",
            "employment history",
            "work history",
            "relevant experience",
        ],
    ),
    (
        Section::Education,
        &["education", "academic background", "education and training", "academics"],
    ),
    (
        Section::Skills,
        &["skills", "technical skills", "core competencies", "key skills", "technologies", "skills & tools"],
    ),
    (Section::Projects, &["projects", "personal projects", "selected projects"]),
    (
        Section::Certifications,
        &["certifications", "certificates", "licenses & certifications", "licenses and certifications"],
    ),
];

const BULLETS: &[char] = &['•', '-', '*', '▪', '◦', '‣', '·', '–'];

/// Everything the parser could recover. Empty fields mean "not found", never "blank".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResume {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
    pub summary: Option<String>,
    pub experiences: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
    pub projects: Vec<String>,
    pub certifications: Vec<String>,
}

impl ParsedResume {
    /// Copies parsed values into the empty slots of `profile`. Returns how many slots were filled.
    pub fn apply_to(&self, profile: &mut Profile) -> usize {
        let mut applied = 0;
        for (slot, value) in [
            (&mut profile.full_name, &self.full_name),
            (&mut profile.email, &self.email),
            (&mut profile.phone, &self.phone),
            (&mut profile.linkedin, &self.linkedin),
            (&mut profile.github, &self.github),
            (&mut profile.website, &self.website),
            (&mut profile.summary, &self.summary),
        ] {
            applied += usize::from(fill_empty(slot, value));
        }

        if profile.experiences.is_empty() && !self.experiences.is_empty() {
            profile.experiences = self.experiences.clone();
            applied += 1;
        }
        if profile.education.is_empty() && !self.education.is_empty() {
            profile.education = self.education.clone();
            applied += 1;
        }
        if profile.skill_list.is_empty() && !self.skills.is_empty() {
            profile.skill_list = self.skills.clone();
            let joined = Some(self.skills.join(", "));
            fill_empty(&mut profile.skills, &joined);
            applied += 1;
        }
        applied
    }
}

fn fill_empty(slot: &mut Option<String>, value: &Option<String>) -> bool {
    let empty = slot.as_deref().map_or(true, |s| s.trim().is_empty());
    match value {
        Some(v) if empty => {
            *slot = Some(v.clone());
            true
        }
        _ => false,
    }
}

pub struct ResumeParser {
    email: Regex,
    phone: Regex,
    linkedin: Regex,
    github: Regex,
    url: Regex,
    date_range: Regex,
    degree: Regex,
    institution: Regex,
    gpa: Regex,
    year: Regex,
}

impl ResumeParser {
    pub fn new() -> Result<Self, regex::Error> {
        const DATE: &str = r"(?:(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{4}|\d{1,2}/\d{4}|\d{4})";
        Ok(Self {
            email: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")?,
            phone: Regex::new(r"(?:\+?1[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}")?,
            linkedin: Regex::new(r"(?i)(?:https?://)?(?:www\.)?linkedin\.com/in/[A-Za-z0-9_-]+/?")?,
            github: Regex::new(r"(?i)(?:https?://)?(?:www\.)?github\.com/[A-Za-z0-9_-]+/?")?,
            url: Regex::new(r"(?i)\b(?:https?://|www\.)[^\s|,]+")?,
            date_range: Regex::new(&format!(
                r"(?i)({DATE})\s*(?:-|–|—|to)\s*({DATE}|present|current|now)"
            ))?,
            degree: Regex::new(
                r"(?i)\b(?:bachelor(?:'s)?|master(?:'s)?|ph\.?d|mba|b\.?s|b\.?a|m\.?s|m\.?a|b\.?sc|m\.?sc|b\.?tech|m\.?tech|associate(?:'s)?|doctorate|diploma)\b",
            )?,
            institution: Regex::new(
                r"(?i)\b(?:university|college|institute|school|academy|polytechnic)\b",
            )?,
            gpa: Regex::new(r"(?i)\bgpa\b[:\s]*([0-4]\.\d{1,2})")?,
            year: Regex::new(r"\b(?:19|20)\d{2}\b")?,
        })
    }

    pub fn parse(&self, text: &str) -> ParsedResume {
        let sections = segment(text);
        let mut parsed = ParsedResume::default();
        self.parse_contact(text, &mut parsed);

        for (section, lines) in &sections {
            match section {
                Section::Header => {
                    if parsed.full_name.is_none() {
                        parsed.full_name = lines.iter().find_map(|l| self.name_candidate(l));
                    }
                }
                Section::Summary => {
                    let summary = lines.join(" ");
                    if !summary.is_empty() {
                        parsed.summary = Some(summary);
                    }
                }
                Section::Experience => parsed.experiences.extend(self.parse_experience(lines)),
                Section::Education => parsed.education.extend(self.parse_education(lines)),
                Section::Skills => merge_unique(&mut parsed.skills, parse_skills(lines)),
                Section::Projects => parsed.projects.extend(lines.iter().map(|l| strip_bullet(l))),
                Section::Certifications => {
                    parsed.certifications.extend(lines.iter().map(|l| strip_bullet(l)))
                }
            }
        }

        debug!(
            experiences = parsed.experiences.len(),
            education = parsed.education.len(),
            skills = parsed.skills.len(),
            "Parsed resume text"
        );
        parsed
    }

    fn parse_contact(&self, text: &str, parsed: &mut ParsedResume) {
        parsed.email = self.email.find(text).map(|m| m.as_str().to_string());
        parsed.phone = self.phone.find(text).map(|m| m.as_str().trim().to_string());
        parsed.linkedin = self.linkedin.find(text).map(|m| m.as_str().to_string());
        parsed.github = self.github.find(text).map(|m| m.as_str().to_string());
        parsed.website = self
            .url
            .find_iter(text)
            .map(|m| m.as_str())
            .find(|u| {
                let lower = u.to_lowercase();
                !lower.contains("linkedin.com") && !lower.contains("github.com")
            })
            .map(String::from);
    }

    /// A plain line of a few capitalised words, carrying no contact details.
    fn name_candidate(&self, line: &str) -> Option<String> {
        let line = line.trim();
        let words = line.split_whitespace().count();
        if !(1..=5).contains(&words)
            || line.chars().any(|c| c.is_ascii_digit())
            || self.email.is_match(line)
            || self.url.is_match(line)
            || line.contains('|')
        {
            return None;
        }
        let capitalised = line
            .split_whitespace()
            .all(|w| w.chars().next().is_some_and(char::is_uppercase));
        capitalised.then(|| line.to_string())
    }

    fn parse_experience(&self, lines: &[String]) -> Vec<Experience> {
        let mut entries: Vec<Experience> = Vec::new();
        let mut bullets: Vec<String> = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for line in lines {
            if is_bullet(line) {
                bullets.append(&mut pending);
                bullets.push(strip_bullet(line));
                continue;
            }

            let Some(caps) = self.date_range.captures(line) else {
                pending.push(line.clone());
                continue;
            };

            if let Some(previous) = entries.last_mut() {
                set_responsibilities(previous, &mut bullets);
            }
            let whole = caps.get(0).map_or("", |m| m.as_str());
            let rest = line.replace(whole, "");
            let rest = rest.trim().trim_matches(|c: char| "|,-–—()".contains(c)).trim();
            let heading = if rest.is_empty() {
                pending.join(" | ")
            } else {
                pending.push(rest.to_string());
                pending.join(" | ")
            };
            pending.clear();

            let end = caps.get(2).map_or("", |m| m.as_str());
            let ongoing = matches!(end.to_lowercase().as_str(), "present" | "current" | "now");
            let (title, company, location) = split_heading(&heading);
            entries.push(Experience {
                title,
                company,
                location,
                start_date: caps.get(1).map(|m| m.as_str().to_string()),
                end_date: (!ongoing).then(|| end.to_string()),
                current: ongoing,
                responsibilities: None,
            });
        }

        bullets.append(&mut pending);
        if let Some(last) = entries.last_mut() {
            set_responsibilities(last, &mut bullets);
        }
        entries
    }

    fn parse_education(&self, lines: &[String]) -> Vec<Education> {
        let mut entries: Vec<Education> = Vec::new();
        let mut current = Education::default();

        for line in lines {
            let parts: Vec<String> = line
                .split(['|', ',', '–', '—'])
                .map(|s| strip_bullet(s.trim()))
                .filter(|s| !s.is_empty())
                .collect();

            let institution = parts.iter().find(|p| self.institution.is_match(p));
            let degree = parts
                .iter()
                .find(|p| self.degree.is_match(p) && !self.institution.is_match(p));

            let starts_new = (institution.is_some() && current.institution.is_some())
                || (degree.is_some() && current.degree.is_some());
            if starts_new {
                entries.push(std::mem::take(&mut current));
            }

            if let Some(inst) = institution {
                current.institution = Some(inst.clone());
            }
            if let Some(deg) = degree {
                let (degree, major) = split_degree(deg);
                current.degree = Some(degree);
                if current.major.is_none() {
                    current.major = major;
                }
            }
            if let Some(gpa) = self.gpa.captures(line).and_then(|c| c.get(1)) {
                current.gpa = Some(gpa.as_str().to_string());
            }

            let years: Vec<&str> = self.year.find_iter(line).map(|m| m.as_str()).collect();
            match years.as_slice() {
                [] => {}
                [only] => current.end_date = Some(only.to_string()),
                [first, .., last] => {
                    current.start_date = Some(first.to_string());
                    current.end_date = Some(last.to_string());
                }
            }
        }

        if current != Education::default() {
            entries.push(current);
        }
        entries
    }
}

/// Splits text into sections by header lines. Text before the first header is `Header`.
pub fn segment(text: &str) -> Vec<(Section, Vec<String>)> {
    let mut sections: Vec<(Section, Vec<String>)> = vec![(Section::Header, Vec::new())];
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        match section_of(line) {
            Some(section) => sections.push((section, Vec::new())),
            None => {
                if let Some((_, lines)) = sections.last_mut() {
                    lines.push(line.to_string());
                }
            }
        }
    }
    sections.retain(|(_, lines)| !lines.is_empty());
    sections
}

fn section_of(line: &str) -> Option<Section> {
    if line.len() > 40 {
        return None;
    }
    let normalized = line.trim_end_matches(':').trim().to_lowercase();
    SECTION_HEADERS
        .iter()
        .find(|(_, names)| names.contains(&normalized.as_str()))
        .map(|(section, _)| *section)
}

fn is_bullet(line: &str) -> bool {
    line.starts_with(BULLETS)
}

fn strip_bullet(line: &str) -> String {
    line.trim_start_matches(BULLETS).trim().to_string()
}

fn set_responsibilities(entry: &mut Experience, bullets: &mut Vec<String>) {
    if !bullets.is_empty() {
        entry.responsibilities = Some(bullets.join("\n"));
        bullets.clear();
    }
}

/// "Title | Company | Location", "Title at Company" or "Title, Company".
fn split_heading(heading: &str) -> (Option<String>, Option<String>, Option<String>) {
    let parts: Vec<String> = heading
        .split(" | ")
        .flat_map(|p| p.split(" at "))
        .flat_map(|p| p.split(" @ "))
        .flat_map(|p| p.split(", "))
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    let mut it = parts.into_iter();
    (it.next(), it.next(), it.next())
}

/// "B.S. in Computer Science" → ("B.S.", Some("Computer Science")).
fn split_degree(text: &str) -> (String, Option<String>) {
    match text.split_once(" in ") {
        Some((degree, major)) => (degree.trim().to_string(), Some(major.trim().to_string())),
        None => (text.trim().to_string(), None),
    }
}

fn parse_skills(lines: &[String]) -> Vec<String> {
    let mut skills = Vec::new();
    for line in lines {
        // "Languages: Rust, Go" keeps only what follows the label.
        let body = match line.split_once(':') {
            Some((label, rest)) if label.split_whitespace().count() <= 3 => rest,
            _ => line.as_str(),
        };
        let tokens = body
            .split([',', '•', '|', ';', '·'])
            .map(strip_bullet)
            .filter(|t| !t.is_empty() && t.len() <= 40);
        merge_unique(&mut skills, tokens.collect());
    }
    skills
}

fn merge_unique(into: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !into.iter().any(|s| s.eq_ignore_ascii_case(&item)) {
            into.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "\
Jane Doe
jane.doe@example.com | (555) 123-4567 | linkedin.com/in/janedoe | github.com/janedoe
https://janedoe.dev

Summary
Backend engineer focused on distributed systems.

Work Experience
Senior Engineer | Acme Corp | Denver, CO
Jan 2021 - Present
• Led the payments platform migration
• Cut p99 latency by 40%
Software Engineer, Globex  Jun 2017 – Dec 2020
- Built internal tooling

Education
University of Colorado | B.S. in Computer Science | 2013 - 2017
GPA: 3.8

Skills
Languages: Rust, Go, Python
PostgreSQL • Kubernetes | rust

Certifications
• AWS Solutions Architect
";

    fn parse() -> ParsedResume {
        ResumeParser::new().unwrap().parse(RESUME)
    }

    #[test]
    fn test_contact_details_extracted() {
        let parsed = parse();
        assert_eq!(parsed.full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(parsed.email.as_deref(), Some("jane.doe@example.com"));
        assert_eq!(parsed.phone.as_deref(), Some("(555) 123-4567"));
        assert_eq!(parsed.linkedin.as_deref(), Some("linkedin.com/in/janedoe"));
        assert_eq!(parsed.github.as_deref(), Some("github.com/janedoe"));
        assert_eq!(parsed.website.as_deref(), Some("https://janedoe.dev"));
    }

    #[test]
    fn test_sections_segmented_by_header_vocabulary() {
        let sections: Vec<Section> = segment(RESUME).into_iter().map(|(s, _)| s).collect();
        assert_eq!(
            sections,
            vec![
                Section::Header,
                Section::Summary,
                Section::Experience,
                Section::Education,
                Section::Skills,
                Section::Certifications,
            ]
        );
    }

    #[test]
    fn test_experience_split_on_date_ranges() {
        let parsed = parse();
        assert_eq!(parsed.experiences.len(), 2);

        let first = &parsed.experiences[0];
        assert_eq!(first.title.as_deref(), Some("Senior Engineer"));
        assert_eq!(first.company.as_deref(), Some("Acme Corp"));
        assert_eq!(first.location.as_deref(), Some("Denver"));
        assert_eq!(first.start_date.as_deref(), Some("Jan 2021"));
        assert!(first.current);
        assert!(first.end_date.is_none());
        assert_eq!(
            first.responsibilities.as_deref(),
            Some("Led the payments platform migration\nCut p99 latency by 40%")
        );

        let second = &parsed.experiences[1];
        assert_eq!(second.title.as_deref(), Some("Software Engineer"));
        assert_eq!(second.company.as_deref(), Some("Globex"));
        assert_eq!(second.end_date.as_deref(), Some("Dec 2020"));
        assert!(!second.current);
        assert_eq!(second.responsibilities.as_deref(), Some("Built internal tooling"));
    }

    #[test]
    fn test_education_with_gpa_and_years() {
        let parsed = parse();
        assert_eq!(parsed.education.len(), 1);
        let edu = &parsed.education[0];
        assert_eq!(edu.institution.as_deref(), Some("University of Colorado"));
        assert_eq!(edu.degree.as_deref(), Some("B.S."));
        assert_eq!(edu.major.as_deref(), Some("Computer Science"));
        assert_eq!(edu.gpa.as_deref(), Some("3.8"));
        assert_eq!(edu.start_date.as_deref(), Some("2013"));
        assert_eq!(edu.end_date.as_deref(), Some("2017"));
    }

    #[test]
    fn test_skills_split_and_deduplicated() {
        assert_eq!(
            parse().skills,
            vec!["Rust", "Go", "Python", "PostgreSQL", "Kubernetes"]
        );
    }

    #[test]
    fn test_apply_fills_only_empty_fields() {
        let mut profile = Profile {
            email: Some("work@jane.dev".to_string()),
            phone: Some("  ".to_string()),
            ..Default::default()
        };
        let applied = parse().apply_to(&mut profile);

        assert_eq!(profile.email.as_deref(), Some("work@jane.dev"));
        assert_eq!(profile.phone.as_deref(), Some("(555) 123-4567"));
        assert_eq!(profile.full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(profile.experiences.len(), 2);
        assert_eq!(profile.skills.as_deref(), Some("Rust, Go, Python, PostgreSQL, Kubernetes"));
        // name, phone, linkedin, github, website, summary + experience, education, skills
        assert_eq!(applied, 9);
    }

    #[test]
    fn test_text_without_headers_yields_contact_only() {
        let parsed = ResumeParser::new()
            .unwrap()
            .parse("John Smith\njohn@smith.io\nLooking for new roles");
        assert_eq!(parsed.full_name.as_deref(), Some("John Smith"));
        assert_eq!(parsed.email.as_deref(), Some("john@smith.io"));
        assert!(parsed.experiences.is_empty());
        assert!(parsed.skills.is_empty());
    }
}
