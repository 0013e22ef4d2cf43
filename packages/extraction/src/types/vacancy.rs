//! Per-page field columns and the records assembled from them.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{AlignmentError, ColumnLengths};

/// Delimiter for the single-string form of requirements.
pub const REQUIREMENTS_DELIMITER: &str = ", ";

/// Parallel columns extracted from one page.
///
/// Index `i` of every column is meant to describe the same listing card.
/// Nothing here enforces that; [`AlignedFields::new`] is the checked boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldArrays {
    /// Page the columns came from
    pub url: String,
    pub organizations: Vec<String>,
    pub titles: Vec<String>,
    pub general_names: Vec<String>,
    pub experience_levels: Vec<String>,
    pub requirements: Vec<Vec<String>>,
    pub cities: Vec<String>,
    pub schedules: Vec<String>,
    /// Cards dropped because a sub-block was missing (card-scoped mode only)
    pub skipped_cards: usize,
}

impl FieldArrays {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn lengths(&self) -> ColumnLengths {
        ColumnLengths {
            organizations: self.organizations.len(),
            titles: self.titles.len(),
            general_names: self.general_names.len(),
            experience_levels: self.experience_levels.len(),
            requirements: self.requirements.len(),
            cities: self.cities.len(),
            schedules: self.schedules.len(),
        }
    }

    /// Whether every column is empty.
    pub fn is_empty(&self) -> bool {
        self.lengths().as_array().iter().all(|len| *len == 0)
    }
}

/// Field columns proven to have equal length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedFields {
    fields: FieldArrays,
    len: usize,
}

impl AlignedFields {
    /// Accept the columns only if all of them have the same length.
    pub fn new(fields: FieldArrays) -> Result<Self, AlignmentError> {
        let lengths = fields.lengths();
        if !lengths.is_aligned() {
            return Err(AlignmentError {
                url: fields.url,
                lengths,
            });
        }
        Ok(Self {
            len: lengths.organizations,
            fields,
        })
    }

    /// Number of listing cards.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn url(&self) -> &str {
        &self.fields.url
    }

    pub fn into_inner(self) -> FieldArrays {
        self.fields
    }
}

/// One job listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancyRecord {
    pub organization: String,
    pub vacancy_title: String,
    pub general_name: String,
    /// Experience label, or the no-info sentinel
    pub experience_level: String,
    /// Requirement tokens in page order (possibly empty)
    pub requirements: Vec<String>,
    /// Comma-joined city names, or the no-info sentinel
    pub city: String,
    /// Comma-joined non-city meta tokens, or the no-info sentinel
    pub work_schedule: String,
}

impl VacancyRecord {
    /// Requirements as one label. Tokens may contain the delimiter, so this
    /// form does not round-trip.
    pub fn requirements_joined(&self) -> String {
        self.requirements.join(REQUIREMENTS_DELIMITER)
    }

    /// SHA-256 over all seven fields; stable key for uniqueness checks.
    ///
    /// Each requirement token is hashed separately and the list is closed
    /// with 0x1e, so token boundaries are part of the key.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [
            &self.organization,
            &self.vacancy_title,
            &self.general_name,
            &self.experience_level,
        ] {
            hash_part(&mut hasher, part);
        }
        for requirement in &self.requirements {
            hash_part(&mut hasher, requirement);
        }
        hasher.update([0x1e]);
        hash_part(&mut hasher, &self.city);
        hash_part(&mut hasher, &self.work_schedule);
        format!("{:x}", hasher.finalize())
    }
}

fn hash_part(hasher: &mut Sha256, part: &str) {
    hasher.update(part.as_bytes());
    hasher.update([0x1f]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> VacancyRecord {
        VacancyRecord {
            organization: "Acme".into(),
            vacancy_title: "Backend Developer".into(),
            general_name: "Backend".into(),
            experience_level: "3 years".into(),
            requirements: vec!["Python".into(), "SQL".into()],
            city: "Moscow".into(),
            work_schedule: "Remote, Full-time".into(),
        }
    }

    #[test]
    fn test_requirements_joined() {
        assert_eq!(record().requirements_joined(), "Python, SQL");

        let mut empty = record();
        empty.requirements.clear();
        assert_eq!(empty.requirements_joined(), "");
    }

    #[test]
    fn test_fingerprint_is_stable_and_field_sensitive() {
        let a = record();
        assert_eq!(a.fingerprint(), record().fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let mut b = record();
        b.city = "Kazan".into();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_keeps_requirement_boundaries() {
        let mut combined = record();
        combined.requirements = vec!["Python, Django".into(), "SQL".into()];
        let mut split = record();
        split.requirements = vec!["Python".into(), "Django".into(), "SQL".into()];
        assert_ne!(combined.fingerprint(), split.fingerprint());

        let mut shifted = record();
        shifted.requirements = vec!["Python".into(), "SQL".into(), "Moscow".into()];
        shifted.city = String::new();
        assert_ne!(record().fingerprint(), shifted.fingerprint());
    }

    #[test]
    fn test_aligned_fields_rejects_mismatch() {
        let mut fields = FieldArrays::new("https://example.com");
        fields.organizations = vec!["Acme".into()];
        let err = AlignedFields::new(fields).unwrap_err();
        assert_eq!(err.url, "https://example.com");
        assert_eq!(err.lengths.organizations, 1);
        assert_eq!(err.lengths.titles, 0);
    }

    #[test]
    fn test_empty_page_is_aligned() {
        let aligned = AlignedFields::new(FieldArrays::new("https://example.com")).unwrap();
        assert!(aligned.is_empty());
    }
}
