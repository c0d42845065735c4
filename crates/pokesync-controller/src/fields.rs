//! Mapping from a fetched record to document fields.

use pokesync_core::{DocumentData, PokemonRecord};

pub const FIELD_ID: &str = "ID";
pub const FIELD_NAME: &str = "Name";
pub const FIELD_HEIGHT: &str = "Height";
pub const FIELD_WEIGHT: &str = "Weight";
pub const FIELD_BASE_EXPERIENCE: &str = "BaseExperience";

/// Fields derived from a record. Integers are written in base 10.
pub fn desired_fields(record: &PokemonRecord) -> DocumentData {
    DocumentData::from([
        (FIELD_ID.to_string(), record.id.to_string()),
        (FIELD_NAME.to_string(), record.name.clone()),
        (FIELD_HEIGHT.to_string(), record.height.to_string()),
        (FIELD_WEIGHT.to_string(), record.weight.to_string()),
        (
            FIELD_BASE_EXPERIENCE.to_string(),
            record.base_experience.to_string(),
        ),
    ])
}

/// Writes `fields` over `target`, leaving every other key in place.
///
/// Returns `true` if `target` changed.
pub fn overlay(target: &mut DocumentData, fields: &DocumentData) -> bool {
    let mut changed = false;
    for (name, value) in fields {
        if target.get(name) != Some(value) {
            target.insert(name.clone(), value.clone());
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pikachu() -> PokemonRecord {
        PokemonRecord {
            id: 25,
            name: "pikachu".to_string(),
            height: 4,
            weight: 60,
            base_experience: 112,
        }
    }

    #[test]
    fn test_desired_fields() {
        let fields = desired_fields(&pikachu());
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[FIELD_ID], "25");
        assert_eq!(fields[FIELD_NAME], "pikachu");
        assert_eq!(fields[FIELD_HEIGHT], "4");
        assert_eq!(fields[FIELD_WEIGHT], "60");
        assert_eq!(fields[FIELD_BASE_EXPERIENCE], "112");
    }

    #[test]
    fn test_large_and_negative_integers_are_plain_base10() {
        let mut record = pikachu();
        record.weight = 1_000_000;
        record.base_experience = -1;
        let fields = desired_fields(&record);
        assert_eq!(fields[FIELD_WEIGHT], "1000000");
        assert_eq!(fields[FIELD_BASE_EXPERIENCE], "-1");
    }

    #[test]
    fn test_overlay_keeps_foreign_fields() {
        let mut target = DocumentData::from([
            ("Owner".to_string(), "alice".to_string()),
            (FIELD_NAME.to_string(), "raichu".to_string()),
        ]);
        assert!(overlay(&mut target, &desired_fields(&pikachu())));
        assert_eq!(target["Owner"], "alice");
        assert_eq!(target[FIELD_NAME], "pikachu");
        assert_eq!(target.len(), 6);

        assert!(!overlay(&mut target, &desired_fields(&pikachu())));
    }
}
