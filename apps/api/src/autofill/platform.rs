//! Platform Detector — works out which applicant tracking system hosts the current page.
//!
//! Detection rules are checked by kind, not by platform: every platform's hostname
//! substrings first, then every URL pattern, then every DOM signature. The first match
//! wins; no match falls back to the generic profile. A detector memoizes its answer, and
//! the orchestrator builds a fresh detector per run so nothing leaks across runs.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::autofill::field_types::{compile_patterns, CatalogError, FieldTypeId};
use crate::dom::{hostname_of, DocumentTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Workday,
    Greenhouse,
    Lever,
    Icims,
    SmartRecruiters,
    Ashby,
    Taleo,
    BambooHr,
    Jobvite,
    SuccessFactors,
    Generic,
}

/// Event types dispatched after a value is assigned, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Input,
    Change,
    Blur,
    KeyDown,
    KeyUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchTiming {
    /// Dispatch right after each field is assigned.
    PerField,
    /// Assign every field first, then dispatch once for all of them.
    AfterAll,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventStrategy {
    pub events: Vec<EventKind>,
    pub timing: DispatchTiming,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FillCharacteristics {
    /// Pause between consecutive fields.
    pub requires_delays: bool,
    pub delay_ms: u64,
    /// Pause after dispatching events so the page can re-render.
    pub uses_delays: bool,
    pub settle_ms: u64,
    pub confidence_threshold: Option<f64>,
}

const NO_DELAYS: FillCharacteristics = FillCharacteristics {
    requires_delays: false,
    delay_ms: 0,
    uses_delays: false,
    settle_ms: 0,
    confidence_threshold: None,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SpecialHandling {
    /// The form carries legal/compliance questions that deserve a review prompt.
    pub legal_questions: bool,
    /// Upload the resume before any other field (the platform parses it to prefill).
    pub upload_first: bool,
}

/// Raw platform entry, compiled into a `PlatformProfile` once at startup.
#[derive(Debug, Clone)]
pub struct PlatformSpec {
    pub platform: Platform,
    pub display_name: &'static str,
    pub hostnames: &'static [&'static str],
    pub url_patterns: &'static [&'static str],
    pub dom_signatures: &'static [&'static str],
    pub fill: FillCharacteristics,
    pub events: &'static [EventKind],
    pub timing: DispatchTiming,
    pub field_overrides: &'static [(FieldTypeId, &'static [&'static str])],
    pub special: SpecialHandling,
}

/// A detected platform's fill behaviour.
#[derive(Debug, Clone)]
pub struct PlatformProfile {
    pub platform: Platform,
    pub display_name: String,
    hostnames: Vec<String>,
    url_patterns: Vec<Regex>,
    dom_signatures: Vec<String>,
    pub fill: FillCharacteristics,
    event_strategy: EventStrategy,
    field_overrides: HashMap<FieldTypeId, Vec<Regex>>,
    pub special: SpecialHandling,
}

impl PlatformProfile {
    fn compile(spec: &PlatformSpec) -> Result<Self, CatalogError> {
        let owner = spec.display_name;
        let mut field_overrides = HashMap::new();
        for (id, patterns) in spec.field_overrides {
            field_overrides.insert(*id, compile_patterns(owner, patterns)?);
        }
        Ok(Self {
            platform: spec.platform,
            display_name: spec.display_name.to_string(),
            hostnames: spec.hostnames.iter().map(|h| h.to_lowercase()).collect(),
            url_patterns: compile_patterns(owner, spec.url_patterns)?,
            dom_signatures: spec.dom_signatures.iter().map(|s| s.to_string()).collect(),
            fill: spec.fill,
            event_strategy: EventStrategy {
                events: spec.events.to_vec(),
                timing: spec.timing,
            },
            field_overrides,
            special: spec.special,
        })
    }

    pub fn delay_ms(&self) -> u64 {
        self.fill.delay_ms
    }

    pub fn requires_delays(&self) -> bool {
        self.fill.requires_delays
    }

    pub fn event_strategy(&self) -> &EventStrategy {
        &self.event_strategy
    }

    /// Extra patterns this platform's markup uses for a field type.
    pub fn field_pattern_override(&self, id: FieldTypeId) -> Option<&[Regex]> {
        self.field_overrides.get(&id).map(Vec::as_slice)
    }

    /// The platform's threshold, or `default` when it does not override it.
    pub fn confidence_threshold(&self, default: f64) -> f64 {
        self.fill.confidence_threshold.unwrap_or(default)
    }

    fn matches_hostname(&self, hostname: &str) -> bool {
        self.hostnames.iter().any(|h| hostname.contains(h.as_str()))
    }

    fn matches_url(&self, url: &str) -> bool {
        self.url_patterns.iter().any(|re| re.is_match(url))
    }
}

/// All known platforms plus the generic fallback.
#[derive(Debug, Clone)]
pub struct PlatformCatalog {
    profiles: Vec<Arc<PlatformProfile>>,
    generic: Arc<PlatformProfile>,
}

impl PlatformCatalog {
    pub fn new(specs: &[PlatformSpec], generic: &PlatformSpec) -> Result<Self, CatalogError> {
        let profiles = specs
            .iter()
            .map(|s| PlatformProfile::compile(s).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            profiles,
            generic: Arc::new(PlatformProfile::compile(generic)?),
        })
    }

    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(PLATFORM_SPECS, &GENERIC_SPEC)
    }

    /// Known platforms, not counting the generic fallback.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn generic(&self) -> Arc<PlatformProfile> {
        self.generic.clone()
    }

    pub fn get(&self, platform: Platform) -> Arc<PlatformProfile> {
        self.profiles
            .iter()
            .find(|p| p.platform == platform)
            .cloned()
            .unwrap_or_else(|| self.generic.clone())
    }

    /// Hostname and URL rules only; no DOM access.
    pub fn match_location(&self, url: &str) -> Option<Arc<PlatformProfile>> {
        let hostname = hostname_of(url);
        self.profiles
            .iter()
            .find(|p| p.matches_hostname(&hostname))
            .or_else(|| self.profiles.iter().find(|p| p.matches_url(url)))
            .cloned()
    }
}

/// Resolves the page's platform once and remembers the answer.
pub struct PlatformDetector {
    catalog: Arc<PlatformCatalog>,
    detected: OnceCell<Arc<PlatformProfile>>,
}

impl PlatformDetector {
    pub fn new(catalog: Arc<PlatformCatalog>) -> Self {
        Self {
            catalog,
            detected: OnceCell::new(),
        }
    }

    pub async fn detect<D: DocumentTree + ?Sized>(&self, doc: &D) -> Arc<PlatformProfile> {
        self.detected
            .get_or_init(|| self.detect_uncached(doc))
            .await
            .clone()
    }

    async fn detect_uncached<D: DocumentTree + ?Sized>(&self, doc: &D) -> Arc<PlatformProfile> {
        let url = match doc.location().await {
            Ok(url) => url,
            Err(e) => {
                warn!("Could not read page location, using generic platform: {e}");
                return self.catalog.generic();
            }
        };

        if let Some(profile) = self.catalog.match_location(&url) {
            info!(platform = ?profile.platform, "Detected platform from location");
            return profile;
        }

        for profile in &self.catalog.profiles {
            for selector in &profile.dom_signatures {
                match doc.has_selector(selector).await {
                    Ok(true) => {
                        info!(platform = ?profile.platform, selector = %selector, "Detected platform from DOM signature");
                        return profile.clone();
                    }
                    Ok(false) => {}
                    Err(e) => debug!("Selector probe '{selector}' failed: {e}"),
                }
            }
        }

        debug!("No platform matched {url}; using generic profile");
        self.catalog.generic()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in catalog
// ────────────────────────────────────────────────────────────────────────────

const STANDARD_EVENTS: &[EventKind] = &[EventKind::Input, EventKind::Change, EventKind::Blur];
const DYNAMIC_EVENTS: &[EventKind] = &[
    EventKind::KeyDown,
    EventKind::Input,
    EventKind::KeyUp,
    EventKind::Change,
    EventKind::Blur,
];

pub const GENERIC_SPEC: PlatformSpec = PlatformSpec {
    platform: Platform::Generic,
    display_name: "Generic",
    hostnames: &[],
    url_patterns: &[],
    dom_signatures: &[],
    fill: NO_DELAYS,
    events: STANDARD_EVENTS,
    timing: DispatchTiming::PerField,
    field_overrides: &[],
    special: SpecialHandling {
        legal_questions: false,
        upload_first: false,
    },
};

pub const PLATFORM_SPECS: &[PlatformSpec] = &[
    PlatformSpec {
        platform: Platform::Workday,
        display_name: "Workday",
        hostnames: &["myworkdayjobs.com", "myworkdaysite.com", "workday.com"],
        url_patterns: &[r"/wday/cxs/", r"(?i)\.wd\d+\.myworkday(jobs|site)\.com/"],
        dom_signatures: &["[data-automation-id]", "[data-automation-id='applyFlowPage']"],
        fill: FillCharacteristics {
            requires_delays: true,
            delay_ms: 300,
            uses_delays: true,
            settle_ms: 500,
            confidence_threshold: Some(0.6),
        },
        events: DYNAMIC_EVENTS,
        timing: DispatchTiming::PerField,
        field_overrides: &[
            (FieldTypeId::FirstName, &[r"legalnamesection_firstname"]),
            (FieldTypeId::LastName, &[r"legalnamesection_lastname"]),
            (FieldTypeId::Phone, &[r"phone-number", r"phonenumber"]),
            (FieldTypeId::Address, &[r"addresssection_addressline1"]),
            (FieldTypeId::City, &[r"addresssection_city"]),
            (FieldTypeId::ZipCode, &[r"addresssection_postalcode"]),
        ],
        special: SpecialHandling {
            legal_questions: true,
            upload_first: true,
        },
    },
    PlatformSpec {
        platform: Platform::Greenhouse,
        display_name: "Greenhouse",
        hostnames: &["greenhouse.io"],
        url_patterns: &[r"boards\.greenhouse\.io", r"/embed/job_app"],
        dom_signatures: &["#grnhse_app", "form#application_form"],
        fill: NO_DELAYS,
        events: STANDARD_EVENTS,
        timing: DispatchTiming::PerField,
        field_overrides: &[
            (FieldTypeId::FirstName, &[r"\bfirst_name\b"]),
            (FieldTypeId::LastName, &[r"\blast_name\b"]),
            (FieldTypeId::Resume, &[r"resume_text", r"resume_file"]),
        ],
        special: SpecialHandling {
            legal_questions: true,
            upload_first: false,
        },
    },
    PlatformSpec {
        platform: Platform::Lever,
        display_name: "Lever",
        hostnames: &["lever.co"],
        url_patterns: &[r"jobs\.lever\.co/.+/apply"],
        dom_signatures: &[".lever-application", ".application-page"],
        fill: NO_DELAYS,
        events: STANDARD_EVENTS,
        timing: DispatchTiming::PerField,
        field_overrides: &[
            (FieldTypeId::Linkedin, &[r"urls\[linkedin\]"]),
            (FieldTypeId::Github, &[r"urls\[github\]"]),
            (FieldTypeId::Portfolio, &[r"urls\[portfolio\]"]),
            (FieldTypeId::Twitter, &[r"urls\[twitter\]"]),
            (FieldTypeId::CurrentCompany, &[r"\borg\b"]),
        ],
        special: SpecialHandling {
            legal_questions: true,
            upload_first: false,
        },
    },
    PlatformSpec {
        platform: Platform::Icims,
        display_name: "iCIMS",
        hostnames: &["icims.com"],
        url_patterns: &[r"/jobs/\d+/[^/]+/candidate"],
        dom_signatures: &["#iCIMS_MainWrapper", ".iCIMS_Forms"],
        fill: FillCharacteristics {
            requires_delays: true,
            delay_ms: 200,
            uses_delays: false,
            settle_ms: 0,
            confidence_threshold: None,
        },
        events: STANDARD_EVENTS,
        timing: DispatchTiming::AfterAll,
        field_overrides: &[],
        special: SpecialHandling {
            legal_questions: false,
            upload_first: false,
        },
    },
    PlatformSpec {
        platform: Platform::SmartRecruiters,
        display_name: "SmartRecruiters",
        hostnames: &["smartrecruiters.com"],
        url_patterns: &[r"jobs\.smartrecruiters\.com/.+"],
        dom_signatures: &["spl-form", "[data-test='application-form']"],
        fill: FillCharacteristics {
            requires_delays: true,
            delay_ms: 150,
            uses_delays: true,
            settle_ms: 200,
            confidence_threshold: None,
        },
        events: &[
            EventKind::Input,
            EventKind::KeyUp,
            EventKind::Change,
            EventKind::Blur,
        ],
        timing: DispatchTiming::PerField,
        field_overrides: &[],
        special: SpecialHandling {
            legal_questions: false,
            upload_first: false,
        },
    },
    PlatformSpec {
        platform: Platform::Ashby,
        display_name: "Ashby",
        hostnames: &["ashbyhq.com"],
        url_patterns: &[r"jobs\.ashbyhq\.com/.+/application"],
        dom_signatures: &["[class*='ashby-application-form']"],
        fill: NO_DELAYS,
        events: STANDARD_EVENTS,
        timing: DispatchTiming::PerField,
        field_overrides: &[],
        special: SpecialHandling {
            legal_questions: false,
            upload_first: false,
        },
    },
    PlatformSpec {
        platform: Platform::Taleo,
        display_name: "Taleo",
        hostnames: &["taleo.net"],
        url_patterns: &[r"careersection/.+/jobapply"],
        dom_signatures: &["#requisitionDescriptionInterface", "[id^='et-ef-content']"],
        fill: FillCharacteristics {
            requires_delays: true,
            delay_ms: 400,
            uses_delays: true,
            settle_ms: 600,
            confidence_threshold: Some(0.6),
        },
        events: DYNAMIC_EVENTS,
        timing: DispatchTiming::PerField,
        field_overrides: &[],
        special: SpecialHandling {
            legal_questions: true,
            upload_first: false,
        },
    },
    PlatformSpec {
        platform: Platform::BambooHr,
        display_name: "BambooHR",
        hostnames: &["bamboohr.com"],
        url_patterns: &[r"(?i)bamboohr\.com/careers/\d+", r"/jobs/view\.php\?id=\d+"],
        dom_signatures: &[".BambooHR-ATS-board"],
        fill: NO_DELAYS,
        events: STANDARD_EVENTS,
        timing: DispatchTiming::PerField,
        field_overrides: &[],
        special: SpecialHandling {
            legal_questions: false,
            upload_first: false,
        },
    },
    PlatformSpec {
        platform: Platform::Jobvite,
        display_name: "Jobvite",
        hostnames: &["jobvite.com"],
        url_patterns: &[r"jobs\.jobvite\.com/.+/apply"],
        dom_signatures: &[".jv-application", "#jv-careersite"],
        fill: FillCharacteristics {
            requires_delays: true,
            delay_ms: 150,
            uses_delays: false,
            settle_ms: 0,
            confidence_threshold: None,
        },
        events: STANDARD_EVENTS,
        timing: DispatchTiming::PerField,
        field_overrides: &[],
        special: SpecialHandling {
            legal_questions: false,
            upload_first: false,
        },
    },
    PlatformSpec {
        platform: Platform::SuccessFactors,
        display_name: "SAP SuccessFactors",
        hostnames: &["successfactors.com", "successfactors.eu"],
        url_patterns: &[r"career\?.*company="],
        dom_signatures: &["#sfcareer", "[id^='sfcareer']"],
        fill: FillCharacteristics {
            requires_delays: true,
            delay_ms: 300,
            uses_delays: true,
            settle_ms: 300,
            confidence_threshold: Some(0.55),
        },
        events: DYNAMIC_EVENTS,
        timing: DispatchTiming::PerField,
        field_overrides: &[],
        special: SpecialHandling {
            legal_questions: true,
            upload_first: false,
        },
    },
];
