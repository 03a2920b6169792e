//! Profile sub-collection records and the drafts they are validated from.
//!
//! Drafts mirror what a form submits (every field possibly blank); entries
//! are what gets stored. `validate` turns one into the other or lists every
//! invalid field.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::profile::validation::{optional_text, FieldError, FieldErrors};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperienceEntry {
    pub company: String,
    pub role: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EducationEntry {
    pub institution: String,
    pub level: String,
    pub course: Option<String>,
    pub completed: bool,
    pub end_year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseEntry {
    pub name: String,
    pub institution: String,
    pub hours: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub postal_code: String,
    pub complement: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceDraft {
    pub company: String,
    pub role: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

impl ExperienceDraft {
    /// A missing `end_date` marks the current job.
    pub fn validate(&self, today: NaiveDate) -> Result<ExperienceEntry, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let company = errors.required("company", &self.company);
        let role = errors.required("role", &self.role);

        let start_date = match self.start_date {
            Some(start) if start > today => {
                errors.push("start_date", "cannot be in the future");
                start
            }
            Some(start) => start,
            None => {
                errors.push("start_date", "is required");
                today
            }
        };
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                errors.push("end_date", "cannot be before start_date");
            }
        }

        errors.finish(ExperienceEntry {
            company,
            role,
            start_date,
            end_date: self.end_date,
            description: optional_text(self.description.as_deref()),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationDraft {
    pub institution: String,
    pub level: String,
    pub course: Option<String>,
    pub completed: bool,
    pub end_year: Option<i32>,
}

impl EducationDraft {
    pub fn validate(&self) -> Result<EducationEntry, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let institution = errors.required("institution", &self.institution);
        let level = errors.required("level", &self.level);
        if self.completed && self.end_year.is_none() {
            errors.push("end_year", "is required for completed education");
        }
        errors.finish(EducationEntry {
            institution,
            level,
            course: optional_text(self.course.as_deref()),
            completed: self.completed,
            end_year: self.end_year,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseDraft {
    pub name: String,
    pub institution: String,
    pub hours: Option<u32>,
    pub year: Option<i32>,
}

impl CourseDraft {
    pub fn validate(&self) -> Result<CourseEntry, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let name = errors.required("name", &self.name);
        let institution = errors.required("institution", &self.institution);
        if self.hours == Some(0) {
            errors.push("hours", "must be greater than zero");
        }
        errors.finish(CourseEntry {
            name,
            institution,
            hours: self.hours,
            year: self.year,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressDraft {
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub postal_code: String,
    pub complement: Option<String>,
}

impl AddressDraft {
    /// Postal codes are Brazilian CEPs: eight digits, punctuation ignored.
    pub fn validate(&self) -> Result<Address, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let street = errors.required("street", &self.street);
        let number = errors.required("number", &self.number);
        let neighborhood = errors.required("neighborhood", &self.neighborhood);
        let postal_code: String = self.postal_code.chars().filter(char::is_ascii_digit).collect();
        if postal_code.len() != 8 {
            errors.push("postal_code", "must have 8 digits");
        }
        errors.finish(Address {
            street,
            number,
            neighborhood,
            postal_code,
            complement: optional_text(self.complement.as_deref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_experience_valid_current_job() {
        let draft = ExperienceDraft {
            company: " Mercado Bom Preço ".to_string(),
            role: "Repositor".to_string(),
            start_date: Some(date(2022, 1, 10)),
            end_date: None,
            description: Some("  ".to_string()),
        };
        let entry = draft.validate(today()).unwrap();
        assert_eq!(entry.company, "Mercado Bom Preço");
        assert_eq!(entry.description, None);
    }

    #[test]
    fn test_experience_reports_every_missing_field() {
        let errors = ExperienceDraft::default().validate(today()).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["company", "role", "start_date"]);
    }

    #[test]
    fn test_experience_end_before_start() {
        let draft = ExperienceDraft {
            company: "Acme".to_string(),
            role: "Caixa".to_string(),
            start_date: Some(date(2023, 5, 1)),
            end_date: Some(date(2023, 1, 1)),
            description: None,
        };
        let errors = draft.validate(today()).unwrap_err();
        assert_eq!(errors[0].field, "end_date");
    }

    #[test]
    fn test_experience_future_start() {
        let draft = ExperienceDraft {
            company: "Acme".to_string(),
            role: "Caixa".to_string(),
            start_date: Some(date(2030, 1, 1)),
            ..ExperienceDraft::default()
        };
        assert!(draft.validate(today()).is_err());
    }

    #[test]
    fn test_completed_education_needs_end_year() {
        let draft = EducationDraft {
            institution: "EE Rui Barbosa".to_string(),
            level: "ensino_medio".to_string(),
            completed: true,
            ..EducationDraft::default()
        };
        assert_eq!(draft.validate().unwrap_err()[0].field, "end_year");
    }

    #[test]
    fn test_course_zero_hours_rejected() {
        let draft = CourseDraft {
            name: "NR-35".to_string(),
            institution: "SENAI".to_string(),
            hours: Some(0),
            year: Some(2023),
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_address_normalizes_postal_code() {
        let draft = AddressDraft {
            street: "Rua XV de Novembro".to_string(),
            number: "100".to_string(),
            neighborhood: "Centro".to_string(),
            postal_code: "80020-310".to_string(),
            complement: None,
        };
        assert_eq!(draft.validate().unwrap().postal_code, "80020310");
    }

    #[test]
    fn test_address_short_postal_code() {
        let draft = AddressDraft {
            street: "Rua A".to_string(),
            number: "1".to_string(),
            neighborhood: "Centro".to_string(),
            postal_code: "123".to_string(),
            complement: None,
        };
        assert_eq!(draft.validate().unwrap_err()[0].field, "postal_code");
    }
}
