use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::models::listing::JobListingRow;

#[derive(Debug, Error, PartialEq)]
#[error("invalid salary range '{0}': expected 'min-max', 'min+' or '-max'")]
pub struct InvalidSalaryRange(pub String);

/// Inclusive salary bounds. Either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SalaryRange {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl SalaryRange {
    pub fn contains(&self, amount: u64) -> bool {
        self.min.map_or(true, |min| amount >= min) && self.max.map_or(true, |max| amount <= max)
    }
}

impl FromStr for SalaryRange {
    type Err = InvalidSalaryRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || InvalidSalaryRange(raw.to_string());
        let bound = |part: &str| -> Result<Option<u64>, InvalidSalaryRange> {
            let part = part.trim();
            if part.is_empty() {
                Ok(None)
            } else {
                part.parse::<u64>().map(Some).map_err(|_| invalid())
            }
        };

        let range = if let Some(min) = raw.strip_suffix('+') {
            SalaryRange {
                min: bound(min)?,
                max: None,
            }
        } else if let Some((min, max)) = raw.split_once('-') {
            SalaryRange {
                min: bound(min)?,
                max: bound(max)?,
            }
        } else {
            return Err(invalid());
        };

        match range {
            SalaryRange {
                min: None,
                max: None,
            } => Err(invalid()),
            SalaryRange {
                min: Some(min),
                max: Some(max),
            } if min > max => Err(invalid()),
            _ => Ok(range),
        }
    }
}

/// Feed query inputs. Every present filter must match (logical AND); an
/// empty list or `None` means "no filter".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedFilter {
    pub city_id: Option<i32>,
    pub search: Option<String>,
    pub sector_ids: Vec<i32>,
    pub salary_ranges: Vec<SalaryRange>,
}

impl FeedFilter {
    pub fn matches(&self, listing: &JobListingRow) -> bool {
        listing.is_active()
            && self.matches_city(listing)
            && self.matches_search(listing)
            && self.matches_sector(listing)
            && self.matches_salary(listing)
    }

    fn matches_city(&self, listing: &JobListingRow) -> bool {
        self.city_id.map_or(true, |city| listing.city_id == Some(city))
    }

    fn matches_search(&self, listing: &JobListingRow) -> bool {
        let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return true;
        };
        let needle = needle.to_lowercase();
        [
            listing.title.as_str(),
            listing.company.as_str(),
            listing.location.as_str(),
            listing.description.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_sector(&self, listing: &JobListingRow) -> bool {
        self.sector_ids.is_empty()
            || listing
                .sector_id
                .is_some_and(|sector| self.sector_ids.contains(&sector))
    }

    fn matches_salary(&self, listing: &JobListingRow) -> bool {
        if self.salary_ranges.is_empty() {
            return true;
        }
        match listing.salary.as_deref().and_then(parse_salary_amount) {
            Some(amount) => self.salary_ranges.iter().any(|r| r.contains(amount)),
            None => false,
        }
    }
}

/// Extracts the first monetary amount from free-text salary, in whole units.
///
/// Handles both `2.500,00` and `2,500.00` styles. A lone separator followed
/// by exactly three digits is read as a thousands separator.
pub fn parse_salary_amount(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let token: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let token = token.trim_end_matches(['.', ',']);

    let integer_part = match token.rfind(['.', ',']) {
        None => token,
        Some(idx) => {
            let has_both = token.contains('.') && token.contains(',');
            let tail = &token[idx + 1..];
            if has_both || tail.len() != 3 {
                &token[..idx]
            } else {
                token
            }
        }
    };

    let digits: String = integer_part.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}
