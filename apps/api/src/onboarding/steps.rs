//! Wizard steps, their payloads, and the per-step validators.
//!
//! Validation is table driven: `STEP_TABLE` maps each step to the function
//! that checks its payload and produces the disjoint profile fields it
//! persists. Adding or reordering a step touches one row.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::profile::collections::EntryList;
use crate::profile::entries::{
    Address, AddressDraft, CourseDraft, CourseEntry, EducationDraft, EducationEntry,
    ExperienceDraft, ExperienceEntry,
};
use crate::profile::validation::{optional_text, FieldError, FieldErrors};

pub const MIN_AGE_YEARS: i32 = 14;
pub const MAX_SUMMARY_CHARS: usize = 1000;
pub const MAX_NAME_CHARS: usize = 120;
pub const MAX_SKILL_CHARS: usize = 60;
pub const LICENSE_CATEGORIES: [&str; 5] = ["A", "B", "C", "D", "E"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Contact,
    Name,
    Location,
    BirthDate,
    Education,
    WorkHistory,
    Skills,
    DriverLicense,
    Summary,
    Address,
    Courses,
}

impl WizardStep {
    pub const ALL: [WizardStep; 11] = [
        WizardStep::Contact,
        WizardStep::Name,
        WizardStep::Location,
        WizardStep::BirthDate,
        WizardStep::Education,
        WizardStep::WorkHistory,
        WizardStep::Skills,
        WizardStep::DriverLicense,
        WizardStep::Summary,
        WizardStep::Address,
        WizardStep::Courses,
    ];

    pub fn first() -> Self {
        Self::ALL[0]
    }

    /// Zero-based position in the wizard.
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Name => "name",
            Self::Location => "location",
            Self::BirthDate => "birth_date",
            Self::Education => "education",
            Self::WorkHistory => "work_history",
            Self::Skills => "skills",
            Self::DriverLicense => "driver_license",
            Self::Summary => "summary",
            Self::Address => "address",
            Self::Courses => "courses",
        }
    }
}

/// What the client submits for one step. The `step` tag selects the variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepInput {
    Contact {
        #[serde(default)]
        email: String,
        #[serde(default)]
        phone: String,
    },
    Name {
        #[serde(default)]
        full_name: String,
    },
    Location {
        city_id: Option<i32>,
        #[serde(default)]
        city_name: String,
    },
    BirthDate {
        birth_date: Option<NaiveDate>,
    },
    Education {
        #[serde(default)]
        entries: Vec<EducationDraft>,
    },
    WorkHistory {
        #[serde(default)]
        has_experience: bool,
        #[serde(default)]
        experiences: Vec<ExperienceDraft>,
    },
    Skills {
        #[serde(default)]
        skills: Vec<String>,
    },
    DriverLicense {
        #[serde(default)]
        has_license: bool,
        #[serde(default)]
        categories: Vec<String>,
    },
    Summary {
        #[serde(default)]
        summary: String,
    },
    Address {
        #[serde(default)]
        address: AddressDraft,
    },
    Courses {
        #[serde(default)]
        has_courses: bool,
        #[serde(default)]
        courses: Vec<CourseDraft>,
    },
}

impl StepInput {
    pub fn step(&self) -> WizardStep {
        match self {
            Self::Contact { .. } => WizardStep::Contact,
            Self::Name { .. } => WizardStep::Name,
            Self::Location { .. } => WizardStep::Location,
            Self::BirthDate { .. } => WizardStep::BirthDate,
            Self::Education { .. } => WizardStep::Education,
            Self::WorkHistory { .. } => WizardStep::WorkHistory,
            Self::Skills { .. } => WizardStep::Skills,
            Self::DriverLicense { .. } => WizardStep::DriverLicense,
            Self::Summary { .. } => WizardStep::Summary,
            Self::Address { .. } => WizardStep::Address,
            Self::Courses { .. } => WizardStep::Courses,
        }
    }
}

/// The profile fields one step writes. Steps never share a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ProfilePatch {
    Contact {
        email: String,
        phone: String,
    },
    Name {
        full_name: String,
    },
    Location {
        city_id: Option<i32>,
        location: String,
    },
    BirthDate {
        birth_date: NaiveDate,
    },
    Education {
        education: EntryList<EducationEntry>,
    },
    WorkHistory {
        has_experience: bool,
        experiences: EntryList<ExperienceEntry>,
    },
    Skills {
        skills: Vec<String>,
    },
    DriverLicense {
        categories: Vec<String>,
    },
    Summary {
        summary: Option<String>,
    },
    Address {
        address: Address,
    },
    Courses {
        courses: EntryList<CourseEntry>,
    },
}

/// Facts the validators need beyond the payload.
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    pub today: NaiveDate,
}

pub type StepValidator = fn(&StepInput, &StepContext) -> Result<ProfilePatch, Vec<FieldError>>;

/// One validator per step, in wizard order.
pub const STEP_TABLE: [(WizardStep, StepValidator); 11] = [
    (WizardStep::Contact, validate_contact),
    (WizardStep::Name, validate_name),
    (WizardStep::Location, validate_location),
    (WizardStep::BirthDate, validate_birth_date),
    (WizardStep::Education, validate_education),
    (WizardStep::WorkHistory, validate_work_history),
    (WizardStep::Skills, validate_skills),
    (WizardStep::DriverLicense, validate_driver_license),
    (WizardStep::Summary, validate_summary),
    (WizardStep::Address, validate_address),
    (WizardStep::Courses, validate_courses),
];

/// Validates `input` with the validator registered for its step.
pub fn validate_step(
    input: &StepInput,
    ctx: &StepContext,
) -> Result<ProfilePatch, Vec<FieldError>> {
    let step = input.step();
    match STEP_TABLE.iter().find(|(s, _)| *s == step) {
        Some((_, validator)) => validator(input, ctx),
        None => Err(vec![FieldError::new("step", "is not part of the wizard")]),
    }
}

fn payload_mismatch(expected: WizardStep) -> Vec<FieldError> {
    vec![FieldError::new(
        "step",
        format!("expected a {} payload", expected.as_str()),
    )]
}

fn validate_contact(input: &StepInput, _: &StepContext) -> Result<ProfilePatch, Vec<FieldError>> {
    let StepInput::Contact { email, phone } = input else {
        return Err(payload_mismatch(WizardStep::Contact));
    };
    let mut errors = FieldErrors::default();

    let email = errors.required("email", email).to_lowercase();
    if !email.is_empty() && !looks_like_email(&email) {
        errors.push("email", "is not a valid email address");
    }

    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if phone.trim().is_empty() {
        errors.push("phone", "is required");
    } else if !(10..=13).contains(&digits.len()) {
        errors.push("phone", "must have between 10 and 13 digits");
    }

    errors.finish(ProfilePatch::Contact {
        email,
        phone: digits,
    })
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn validate_name(input: &StepInput, _: &StepContext) -> Result<ProfilePatch, Vec<FieldError>> {
    let StepInput::Name { full_name } = input else {
        return Err(payload_mismatch(WizardStep::Name));
    };
    let mut errors = FieldErrors::default();
    let full_name = errors.required_max("full_name", full_name, MAX_NAME_CHARS);
    errors.finish(ProfilePatch::Name { full_name })
}

fn validate_location(input: &StepInput, _: &StepContext) -> Result<ProfilePatch, Vec<FieldError>> {
    let StepInput::Location { city_id, city_name } = input else {
        return Err(payload_mismatch(WizardStep::Location));
    };
    let mut errors = FieldErrors::default();
    let location = errors.required("city_name", city_name);
    if matches!(city_id, Some(id) if *id <= 0) {
        errors.push("city_id", "is not a known city");
    }
    errors.finish(ProfilePatch::Location {
        city_id: *city_id,
        location,
    })
}

fn validate_birth_date(
    input: &StepInput,
    ctx: &StepContext,
) -> Result<ProfilePatch, Vec<FieldError>> {
    let StepInput::BirthDate { birth_date } = input else {
        return Err(payload_mismatch(WizardStep::BirthDate));
    };
    let Some(birth_date) = *birth_date else {
        return Err(vec![FieldError::new("birth_date", "is required")]);
    };
    if birth_date > ctx.today {
        return Err(vec![FieldError::new("birth_date", "cannot be in the future")]);
    }
    if age_on(birth_date, ctx.today) < MIN_AGE_YEARS {
        return Err(vec![FieldError::new(
            "birth_date",
            format!("candidates must be at least {MIN_AGE_YEARS} years old"),
        )]);
    }
    Ok(ProfilePatch::BirthDate { birth_date })
}

/// Completed years between `birth` and `today`.
fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let had_birthday = (today.month(), today.day()) >= (birth.month(), birth.day());
    today.year() - birth.year() - i32::from(!had_birthday)
}

fn validate_education(input: &StepInput, _: &StepContext) -> Result<ProfilePatch, Vec<FieldError>> {
    let StepInput::Education { entries } = input else {
        return Err(payload_mismatch(WizardStep::Education));
    };
    let mut errors = FieldErrors::default();
    if entries.is_empty() {
        errors.push("entries", "at least one education entry is required");
    }
    let education = collect_entries(&mut errors, "entries", entries, |draft| draft.validate());
    errors.finish(ProfilePatch::Education { education })
}

fn validate_work_history(
    input: &StepInput,
    ctx: &StepContext,
) -> Result<ProfilePatch, Vec<FieldError>> {
    let StepInput::WorkHistory {
        has_experience,
        experiences,
    } = input
    else {
        return Err(payload_mismatch(WizardStep::WorkHistory));
    };
    if !has_experience {
        return Ok(ProfilePatch::WorkHistory {
            has_experience: false,
            experiences: EntryList::default(),
        });
    }

    let mut errors = FieldErrors::default();
    if experiences.is_empty() {
        errors.push("experiences", "at least one experience is required");
    }
    let experiences = collect_entries(&mut errors, "experiences", experiences, |draft| {
        draft.validate(ctx.today)
    });
    errors.finish(ProfilePatch::WorkHistory {
        has_experience: true,
        experiences,
    })
}

fn validate_skills(input: &StepInput, _: &StepContext) -> Result<ProfilePatch, Vec<FieldError>> {
    let StepInput::Skills { skills } = input else {
        return Err(payload_mismatch(WizardStep::Skills));
    };
    let mut errors = FieldErrors::default();
    let skills = dedup_skills(skills);
    if skills.is_empty() {
        errors.push("skills", "at least one skill is required");
    }
    if skills.iter().any(|s| s.chars().count() > MAX_SKILL_CHARS) {
        errors.push(
            "skills",
            format!("each skill must be at most {MAX_SKILL_CHARS} characters"),
        );
    }
    errors.finish(ProfilePatch::Skills { skills })
}

/// Trims, drops blanks and removes case-insensitive duplicates, keeping the
/// first spelling seen.
pub fn dedup_skills(skills: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(str::to_string)
        .collect()
}

fn validate_driver_license(
    input: &StepInput,
    _: &StepContext,
) -> Result<ProfilePatch, Vec<FieldError>> {
    let StepInput::DriverLicense {
        has_license,
        categories,
    } = input
    else {
        return Err(payload_mismatch(WizardStep::DriverLicense));
    };
    if !has_license {
        return Ok(ProfilePatch::DriverLicense {
            categories: Vec::new(),
        });
    }

    let mut errors = FieldErrors::default();
    let mut normalized: Vec<String> = Vec::new();
    for raw in categories {
        let category = raw.trim().to_uppercase();
        if !LICENSE_CATEGORIES.contains(&category.as_str()) {
            errors.push("categories", format!("'{}' is not a license category", raw.trim()));
        } else if !normalized.contains(&category) {
            normalized.push(category);
        }
    }
    if categories.is_empty() {
        errors.push("categories", "select at least one category");
    }
    normalized.sort();
    errors.finish(ProfilePatch::DriverLicense {
        categories: normalized,
    })
}

fn validate_summary(input: &StepInput, _: &StepContext) -> Result<ProfilePatch, Vec<FieldError>> {
    let StepInput::Summary { summary } = input else {
        return Err(payload_mismatch(WizardStep::Summary));
    };
    let summary = optional_text(Some(summary.as_str()));
    if summary
        .as_ref()
        .is_some_and(|s| s.chars().count() > MAX_SUMMARY_CHARS)
    {
        return Err(vec![FieldError::new(
            "summary",
            format!("must be at most {MAX_SUMMARY_CHARS} characters"),
        )]);
    }
    Ok(ProfilePatch::Summary { summary })
}

fn validate_address(input: &StepInput, _: &StepContext) -> Result<ProfilePatch, Vec<FieldError>> {
    let StepInput::Address { address } = input else {
        return Err(payload_mismatch(WizardStep::Address));
    };
    address
        .validate()
        .map(|address| ProfilePatch::Address { address })
        .map_err(|nested| {
            nested
                .into_iter()
                .map(|e| FieldError::new(format!("address.{}", e.field), e.message))
                .collect()
        })
}

fn validate_courses(input: &StepInput, _: &StepContext) -> Result<ProfilePatch, Vec<FieldError>> {
    let StepInput::Courses {
        has_courses,
        courses,
    } = input
    else {
        return Err(payload_mismatch(WizardStep::Courses));
    };
    if !has_courses {
        return Ok(ProfilePatch::Courses {
            courses: EntryList::default(),
        });
    }

    let mut errors = FieldErrors::default();
    if courses.is_empty() {
        errors.push("courses", "at least one course is required");
    }
    let courses = collect_entries(&mut errors, "courses", courses, |draft| draft.validate());
    errors.finish(ProfilePatch::Courses { courses })
}

/// Validates each draft, prefixing its errors with `field[i]`, and assigns
/// ids to the ones that pass.
fn collect_entries<D, T>(
    errors: &mut FieldErrors,
    field: &str,
    drafts: &[D],
    validate: impl Fn(&D) -> Result<T, Vec<FieldError>>,
) -> EntryList<T> {
    let mut entries = EntryList::default();
    for (i, draft) in drafts.iter().enumerate() {
        match validate(draft) {
            Ok(entry) => {
                entries.add(entry);
            }
            Err(nested) => errors.extend_prefixed(&format!("{field}[{i}]"), nested),
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> StepContext {
        StepContext {
            today: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_table_covers_every_step_in_order() {
        let keys: Vec<WizardStep> = STEP_TABLE.iter().map(|(s, _)| *s).collect();
        assert_eq!(keys, WizardStep::ALL.to_vec());
    }

    #[test]
    fn test_step_navigation() {
        assert_eq!(WizardStep::first(), WizardStep::Contact);
        assert_eq!(WizardStep::Name.index(), 1);
        assert_eq!(WizardStep::Contact.previous(), None);
        assert_eq!(WizardStep::Summary.next(), Some(WizardStep::Address));
        assert_eq!(WizardStep::Courses.next(), None);
    }

    #[test]
    fn test_input_tag_matches_step_name() {
        let input: StepInput =
            serde_json::from_str(r#"{"step":"birth_date","birth_date":"2000-02-29"}"#).unwrap();
        assert_eq!(input.step(), WizardStep::BirthDate);
        assert_eq!(input.step().as_str(), "birth_date");
    }

    #[test]
    fn test_contact_normalizes_phone_and_email() {
        let input = StepInput::Contact {
            email: " Ana@Exemplo.com.br ".to_string(),
            phone: "(41) 99876-5432".to_string(),
        };
        assert_eq!(
            validate_step(&input, &ctx()).unwrap(),
            ProfilePatch::Contact {
                email: "ana@exemplo.com.br".to_string(),
                phone: "41998765432".to_string(),
            }
        );
    }

    #[test]
    fn test_contact_rejects_bad_values() {
        let input = StepInput::Contact {
            email: "ana.exemplo.com".to_string(),
            phone: "1234".to_string(),
        };
        let errors = validate_step(&input, &ctx()).unwrap_err();
        assert_eq!(fields(&errors), vec!["email", "phone"]);
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let input = StepInput::Name {
            full_name: "   ".to_string(),
        };
        let errors = validate_step(&input, &ctx()).unwrap_err();
        assert_eq!(errors, vec![FieldError::new("full_name", "is required")]);
    }

    #[test]
    fn test_birth_date_rules() {
        let at = |y, m, d| StepInput::BirthDate {
            birth_date: NaiveDate::from_ymd_opt(y, m, d),
        };
        assert!(validate_step(&at(2000, 1, 1), &ctx()).is_ok());
        // Turns 14 tomorrow.
        assert!(validate_step(&at(2010, 6, 2), &ctx()).is_err());
        assert!(validate_step(&at(2010, 6, 1), &ctx()).is_ok());
        assert!(validate_step(&at(2030, 1, 1), &ctx()).is_err());
        let missing = StepInput::BirthDate { birth_date: None };
        assert!(validate_step(&missing, &ctx()).is_err());
    }

    #[test]
    fn test_work_history_details_only_required_with_experience() {
        let none = StepInput::WorkHistory {
            has_experience: false,
            experiences: vec![ExperienceDraft::default()],
        };
        assert_eq!(
            validate_step(&none, &ctx()).unwrap(),
            ProfilePatch::WorkHistory {
                has_experience: false,
                experiences: EntryList::default(),
            }
        );

        let some = StepInput::WorkHistory {
            has_experience: true,
            experiences: vec![],
        };
        assert_eq!(
            fields(&validate_step(&some, &ctx()).unwrap_err()),
            vec!["experiences"]
        );
    }

    #[test]
    fn test_nested_errors_are_indexed() {
        let input = StepInput::WorkHistory {
            has_experience: true,
            experiences: vec![
                ExperienceDraft {
                    company: "Acme".to_string(),
                    role: "Caixa".to_string(),
                    start_date: NaiveDate::from_ymd_opt(2020, 1, 1),
                    ..ExperienceDraft::default()
                },
                ExperienceDraft {
                    role: "Estoquista".to_string(),
                    start_date: NaiveDate::from_ymd_opt(2021, 1, 1),
                    ..ExperienceDraft::default()
                },
            ],
        };
        let errors = validate_step(&input, &ctx()).unwrap_err();
        assert_eq!(fields(&errors), vec!["experiences[1].company"]);
    }

    #[test]
    fn test_valid_entries_get_distinct_ids() {
        let draft = EducationDraft {
            institution: "EE Rui Barbosa".to_string(),
            level: "ensino_medio".to_string(),
            ..EducationDraft::default()
        };
        let input = StepInput::Education {
            entries: vec![draft.clone(), draft],
        };
        let ProfilePatch::Education { education } = validate_step(&input, &ctx()).unwrap() else {
            panic!("expected an education patch");
        };
        let stored = serde_json::to_value(&education).unwrap();
        assert_eq!(stored.as_array().map(Vec::len), Some(2));
        assert_ne!(stored[0]["id"], stored[1]["id"]);
    }

    #[test]
    fn test_education_requires_an_entry() {
        let input = StepInput::Education { entries: vec![] };
        assert!(validate_step(&input, &ctx()).is_err());
    }

    #[test]
    fn test_skills_dedup_case_insensitive() {
        let skills = vec![
            " Excel ".to_string(),
            "excel".to_string(),
            "".to_string(),
            "Atendimento".to_string(),
        ];
        assert_eq!(dedup_skills(&skills), vec!["Excel", "Atendimento"]);

        let blank = StepInput::Skills {
            skills: vec!["  ".to_string()],
        };
        assert!(validate_step(&blank, &ctx()).is_err());
    }

    #[test]
    fn test_license_categories() {
        let input = StepInput::DriverLicense {
            has_license: true,
            categories: vec!["b".to_string(), "A".to_string(), "B".to_string()],
        };
        assert_eq!(
            validate_step(&input, &ctx()).unwrap(),
            ProfilePatch::DriverLicense {
                categories: vec!["A".to_string(), "B".to_string()],
            }
        );

        let bad = StepInput::DriverLicense {
            has_license: true,
            categories: vec!["Z".to_string()],
        };
        assert!(validate_step(&bad, &ctx()).is_err());

        let none = StepInput::DriverLicense {
            has_license: false,
            categories: vec!["Z".to_string()],
        };
        assert!(validate_step(&none, &ctx()).is_ok());
    }

    #[test]
    fn test_summary_is_optional_but_bounded() {
        let empty = StepInput::Summary {
            summary: " ".to_string(),
        };
        assert_eq!(
            validate_step(&empty, &ctx()).unwrap(),
            ProfilePatch::Summary { summary: None }
        );
        let long = StepInput::Summary {
            summary: "a".repeat(MAX_SUMMARY_CHARS + 1),
        };
        assert!(validate_step(&long, &ctx()).is_err());
    }

    #[test]
    fn test_address_errors_are_prefixed() {
        let input = StepInput::Address {
            address: AddressDraft {
                street: "Rua A".to_string(),
                number: "10".to_string(),
                neighborhood: "Centro".to_string(),
                postal_code: "1234".to_string(),
                complement: None,
            },
        };
        let errors = validate_step(&input, &ctx()).unwrap_err();
        assert_eq!(fields(&errors), vec!["address.postal_code"]);
    }

    #[test]
    fn test_courses_optional_when_toggle_off() {
        let input = StepInput::Courses {
            has_courses: false,
            courses: vec![],
        };
        assert!(validate_step(&input, &ctx()).is_ok());
    }
}
