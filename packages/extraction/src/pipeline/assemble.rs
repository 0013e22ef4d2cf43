//! Record assembly: zip aligned field columns into vacancy records.

use crate::error::AlignmentError;
use crate::types::vacancy::{AlignedFields, FieldArrays, VacancyRecord};

/// Check alignment and zip the columns position-wise.
///
/// Index `i` of every column becomes record `i`; document order is kept.
/// Columns of differing lengths are rejected whole rather than truncated.
pub fn assemble(fields: FieldArrays) -> Result<Vec<VacancyRecord>, AlignmentError> {
    Ok(assemble_aligned(AlignedFields::new(fields)?))
}

/// Zip columns that are already known to line up.
pub fn assemble_aligned(aligned: AlignedFields) -> Vec<VacancyRecord> {
    let fields = aligned.into_inner();

    // Columns have equal length, so every `next()` below yields a value.
    let mut titles = fields.titles.into_iter();
    let mut general_names = fields.general_names.into_iter();
    let mut experience_levels = fields.experience_levels.into_iter();
    let mut requirements = fields.requirements.into_iter();
    let mut cities = fields.cities.into_iter();
    let mut schedules = fields.schedules.into_iter();

    fields
        .organizations
        .into_iter()
        .map(|organization| VacancyRecord {
            organization,
            vacancy_title: titles.next().unwrap_or_default(),
            general_name: general_names.next().unwrap_or_default(),
            experience_level: experience_levels.next().unwrap_or_default(),
            requirements: requirements.next().unwrap_or_default(),
            city: cities.next().unwrap_or_default(),
            work_schedule: schedules.next().unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fields(records: &[VacancyRecord]) -> FieldArrays {
        let mut fields = FieldArrays::new("https://example.com/jobs");
        for record in records {
            fields.organizations.push(record.organization.clone());
            fields.titles.push(record.vacancy_title.clone());
            fields.general_names.push(record.general_name.clone());
            fields.experience_levels.push(record.experience_level.clone());
            fields.requirements.push(record.requirements.clone());
            fields.cities.push(record.city.clone());
            fields.schedules.push(record.work_schedule.clone());
        }
        fields
    }

    fn record(organization: &str, title: &str) -> VacancyRecord {
        VacancyRecord {
            organization: organization.into(),
            vacancy_title: title.into(),
            general_name: "Backend".into(),
            experience_level: "Senior".into(),
            requirements: vec!["Rust".into(), "SQL".into()],
            city: "Moscow".into(),
            work_schedule: "Remote".into(),
        }
    }

    #[test]
    fn test_assemble_keeps_document_order() {
        let expected = vec![record("Acme", "Engineer"), record("Globex", "Analyst")];
        let records = assemble(fields(&expected)).unwrap();
        assert_eq!(records, expected);
        assert_eq!(records[1].requirements_joined(), "Rust, SQL");
    }

    #[test]
    fn test_assemble_empty_page() {
        let records = assemble(FieldArrays::new("https://example.com/jobs")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_assemble_rejects_misaligned_columns() {
        let mut misaligned = fields(&[record("Acme", "Engineer"), record("Globex", "Analyst")]);
        misaligned.cities.pop();

        let err = assemble(misaligned).unwrap_err();
        assert_eq!(err.url, "https://example.com/jobs");
        assert_eq!(err.lengths.cities, 1);
        assert_eq!(err.lengths.organizations, 2);
    }

    fn arb_record() -> impl Strategy<Value = VacancyRecord> {
        (
            "[A-Za-z ]{1,12}",
            "[A-Za-z ]{1,12}",
            "[A-Za-z]{1,8}",
            "[A-Za-z0-9 ]{1,8}",
            prop::collection::vec("[A-Za-z+#]{1,6}", 0..4),
            "[A-Za-z]{1,8}",
            "[A-Za-z, ]{1,12}",
        )
            .prop_map(
                |(
                    organization,
                    vacancy_title,
                    general_name,
                    experience_level,
                    requirements,
                    city,
                    work_schedule,
                )| VacancyRecord {
                    organization,
                    vacancy_title,
                    general_name,
                    experience_level,
                    requirements,
                    city,
                    work_schedule,
                },
            )
    }

    proptest! {
        #[test]
        fn test_assemble_reproduces_columns(records in prop::collection::vec(arb_record(), 0..20)) {
            let assembled = assemble(fields(&records)).unwrap();
            prop_assert_eq!(assembled, records);
        }

        #[test]
        fn test_any_short_column_is_rejected(
            records in prop::collection::vec(arb_record(), 1..10),
            column in 0usize..7,
        ) {
            let mut fields = fields(&records);
            match column {
                0 => { fields.organizations.pop(); }
                1 => { fields.titles.pop(); }
                2 => { fields.general_names.pop(); }
                3 => { fields.experience_levels.pop(); }
                4 => { fields.requirements.pop(); }
                5 => { fields.cities.pop(); }
                _ => { fields.schedules.pop(); }
            }
            prop_assert!(assemble(fields).is_err());
        }
    }
}
