//! Field-level comparison and merge of teacher profile change requests.

use std::collections::BTreeMap;

use crate::moderation::error::ValidationError;

use super::domain::{
    FieldDiff, FieldValue, ProfileChanges, ProfileDiff, ProfileField, ProfileFields, MAX_BIO_CHARS,
    MAX_SUBJECTS,
};

/// Trims and collapses internal whitespace runs to a single space.
pub fn normalize_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Subjects compare as the normalised, non-empty entries joined with ", ".
pub fn normalize_subjects(values: &[String]) -> String {
    clean_subjects(values).join(", ")
}

fn clean_subjects(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| normalize_text(value))
        .filter(|value| !value.is_empty())
        .collect()
}

impl FieldValue {
    pub fn normalized(&self) -> String {
        match self {
            FieldValue::Text(value) => normalize_text(value),
            FieldValue::List(values) => normalize_subjects(values),
        }
    }
}

/// Compares every proposed field with the authoritative value.
pub fn diff(authoritative: &ProfileFields, proposed: &ProfileChanges) -> ProfileDiff {
    let mut fields = BTreeMap::new();
    for field in ProfileField::ALL {
        let Some(proposed_value) = proposed.get(field) else {
            continue;
        };
        let authoritative_value = authoritative.value(field);
        let changed = proposed_value.normalized() != authoritative_value.normalized();
        fields.insert(
            field,
            FieldDiff {
                changed,
                authoritative_value,
                proposed_value,
            },
        );
    }
    ProfileDiff(fields)
}

/// Merges every proposed field into a copy of the authoritative fields.
pub fn apply(authoritative: &ProfileFields, proposed: &ProfileChanges) -> ProfileFields {
    let mut merged = authoritative.clone();
    let text = |value: &Option<String>, target: &mut String| {
        if let Some(value) = value {
            *target = value.trim().to_string();
        }
    };

    text(&proposed.position, &mut merged.position);
    text(&proposed.phone, &mut merged.phone);
    text(&proposed.university, &mut merged.university);
    text(&proposed.faculty, &mut merged.faculty);
    text(&proposed.department, &mut merged.department);
    text(&proposed.image, &mut merged.image);
    text(&proposed.bio, &mut merged.bio);
    if let Some(subjects) = &proposed.subjects {
        merged.subjects = clean_subjects(subjects);
    }
    merged
}

/// Rejects malformed change-sets before anything is diffed or stored.
pub fn validate(proposed: &ProfileChanges) -> Result<(), ValidationError> {
    if proposed.is_empty() {
        return Err(ValidationError::EmptyChangeSet);
    }

    if let Some(bio) = &proposed.bio {
        let length = bio.trim().chars().count();
        if length > MAX_BIO_CHARS {
            return Err(ValidationError::BioTooLong(length));
        }
    }

    if let Some(phone) = &proposed.phone {
        let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' ');
        if !phone.chars().all(allowed) {
            return Err(ValidationError::InvalidPhone(phone.clone()));
        }
    }

    if let Some(subjects) = &proposed.subjects {
        let count = clean_subjects(subjects).len();
        if count > MAX_SUBJECTS {
            return Err(ValidationError::TooManySubjects(count));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authoritative() -> ProfileFields {
        ProfileFields {
            position: "Associate Professor".to_string(),
            phone: "000".to_string(),
            university: "KPI".to_string(),
            faculty: "Informatics".to_string(),
            department: "Software Engineering".to_string(),
            subjects: vec!["Algorithms".to_string(), "Databases".to_string()],
            image: String::new(),
            bio: "A".to_string(),
        }
    }

    #[test]
    fn only_proposed_fields_are_compared() {
        let proposed = ProfileChanges {
            bio: Some("B".to_string()),
            ..ProfileChanges::default()
        };
        let diff = diff(&authoritative(), &proposed);
        assert_eq!(diff.0.len(), 1);
        let bio = diff.get(ProfileField::Bio).expect("bio compared");
        assert!(bio.changed);
        assert_eq!(bio.authoritative_value, FieldValue::Text("A".to_string()));
        assert_eq!(bio.proposed_value, FieldValue::Text("B".to_string()));
    }

    #[test]
    fn whitespace_only_edits_are_not_changes() {
        let proposed = ProfileChanges {
            position: Some("  Associate   Professor ".to_string()),
            subjects: Some(vec![
                " Algorithms".to_string(),
                String::new(),
                "Databases  ".to_string(),
            ]),
            ..ProfileChanges::default()
        };
        let diff = diff(&authoritative(), &proposed);
        assert_eq!(diff.0.len(), 2);
        assert!(!diff.has_changes());
    }

    #[test]
    fn reordered_subjects_count_as_changed() {
        let proposed = ProfileChanges {
            subjects: Some(vec!["Databases".to_string(), "Algorithms".to_string()]),
            ..ProfileChanges::default()
        };
        let diff = diff(&authoritative(), &proposed);
        assert_eq!(diff.changed_fields(), vec![ProfileField::Subjects]);
    }

    #[test]
    fn apply_merges_only_proposed_fields() {
        let proposed = ProfileChanges {
            bio: Some("B".to_string()),
            ..ProfileChanges::default()
        };
        let merged = apply(&authoritative(), &proposed);
        assert_eq!(merged.bio, "B");
        assert_eq!(merged.phone, "000");
        assert_eq!(merged.subjects, authoritative().subjects);
    }

    #[test]
    fn apply_then_diff_reports_nothing_changed() {
        let proposed = ProfileChanges {
            phone: Some("+380 (44) 123-45-67".to_string()),
            subjects: Some(vec!["Compilers".to_string(), " ".to_string()]),
            bio: Some("  Teaches   compilers ".to_string()),
            department: Some("Systems".to_string()),
            ..ProfileChanges::default()
        };
        let merged = apply(&authoritative(), &proposed);
        let diff = diff(&merged, &proposed);
        assert_eq!(diff.0.len(), 4);
        assert!(!diff.has_changes());
        assert_eq!(merged.subjects, vec!["Compilers".to_string()]);
    }

    #[test]
    fn validation_rejects_malformed_change_sets() {
        assert_eq!(
            validate(&ProfileChanges::default()),
            Err(ValidationError::EmptyChangeSet)
        );

        let phone = ProfileChanges {
            phone: Some("call me".to_string()),
            ..ProfileChanges::default()
        };
        assert!(matches!(
            validate(&phone),
            Err(ValidationError::InvalidPhone(_))
        ));

        let bio = ProfileChanges {
            bio: Some("x".repeat(MAX_BIO_CHARS + 1)),
            ..ProfileChanges::default()
        };
        assert_eq!(
            validate(&bio),
            Err(ValidationError::BioTooLong(MAX_BIO_CHARS + 1))
        );

        let subjects = ProfileChanges {
            subjects: Some((0..=MAX_SUBJECTS).map(|n| format!("Subject {n}")).collect()),
            ..ProfileChanges::default()
        };
        assert_eq!(
            validate(&subjects),
            Err(ValidationError::TooManySubjects(MAX_SUBJECTS + 1))
        );

        let fine = ProfileChanges {
            phone: Some("+1 (555) 010-0000".to_string()),
            ..ProfileChanges::default()
        };
        assert_eq!(validate(&fine), Ok(()));
    }
}
