//! User profile records and their formatting for the diet recommendation table.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Placeholder for a scalar the profile does not carry.
pub const MISSING: &str = "N/A";

const LIST_SEPARATOR: &str = ", ";

/// A profile record as stored in the document store.
///
/// Loosely typed: the mobile app writes whatever the onboarding form
/// collected, so every key is optional and values are coerced on use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(pub Map<String, Value>);

impl UserProfile {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for UserProfile {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Row payload for the `Diet_Recommendation` action table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedProfileRequest {
    #[serde(rename = "Age")]
    pub age: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Weight")]
    pub weight: String,
    #[serde(rename = "Height")]
    pub height: String,
    #[serde(rename = "Activity Level")]
    pub activity_level: String,
    #[serde(rename = "Dietary Preference")]
    pub dietary_preference: String,
    #[serde(rename = "Favourite Cuisine")]
    pub favourite_cuisine: String,
    #[serde(rename = "Food Allergies")]
    pub food_allergies: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("cannot format profile field `{field}`: {reason}")]
    Field { field: String, reason: String },
}

impl FormatError {
    fn field(field: &str, reason: &str) -> Self {
        Self::Field {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Build the table row for a profile.
///
/// Returns `Ok(None)` when there is no profile or it has no fields.
pub fn format_for_diet_recommendation(
    profile: Option<&UserProfile>,
) -> Result<Option<FormattedProfileRequest>, FormatError> {
    let profile = match profile {
        Some(p) if !p.is_empty() => p,
        _ => return Ok(None),
    };

    Ok(Some(FormattedProfileRequest {
        age: scalar_field(profile, "age")?,
        gender: scalar_field(profile, "gender")?,
        weight: scalar_field(profile, "weight")?,
        height: scalar_field(profile, "height")?,
        activity_level: scalar_field(profile, "activityLevel")?,
        dietary_preference: list_field(profile, "dietaryPreferences")?,
        favourite_cuisine: list_field(profile, "favouriteCuisines")?,
        food_allergies: list_field(profile, "foodAllergies")?,
    }))
}

fn scalar_field(profile: &UserProfile, key: &str) -> Result<String, FormatError> {
    match profile.get(key) {
        None | Some(Value::Null) => Ok(MISSING.to_string()),
        Some(value) => {
            scalar_to_string(value).ok_or_else(|| FormatError::field(key, "expected a scalar"))
        }
    }
}

/// Absent lists render as the empty string, not as `N/A`.
fn list_field(profile: &UserProfile, key: &str) -> Result<String, FormatError> {
    match profile.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::Array(items)) => {
            let parts = items
                .iter()
                .map(|item| {
                    scalar_to_string(item)
                        .ok_or_else(|| FormatError::field(key, "list items must be scalars"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(parts.join(LIST_SEPARATOR))
        }
        Some(value) => {
            scalar_to_string(value).ok_or_else(|| FormatError::field(key, "expected a list"))
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Human-readable summary of a profile, one line per field.
pub fn display_lines(profile: &UserProfile) -> Vec<String> {
    vec![
        format!("Age: {}", display_scalar(profile.get("age"))),
        format!("Gender: {}", display_scalar(profile.get("gender"))),
        format!("Height: {}", display_measure(profile.get("height"), "cm")),
        format!("Weight: {}", display_measure(profile.get("weight"), "kg")),
        format!(
            "Activity Level: {}",
            display_scalar(profile.get("activityLevel"))
        ),
        format!(
            "Dietary Preferences: {}",
            display_list(profile.get("dietaryPreferences"))
        ),
        format!(
            "Favorite Cuisines: {}",
            display_list(profile.get("favouriteCuisines"))
        ),
        format!(
            "Food Allergies: {}",
            display_list(profile.get("foodAllergies"))
        ),
    ]
}

fn display_scalar(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING.to_string(),
        Some(v) => scalar_to_string(v).unwrap_or_else(|| v.to_string()),
    }
}

/// Numeric measurements get their unit appended.
fn display_measure(value: Option<&Value>, unit: &str) -> String {
    match value {
        Some(Value::Number(n)) => format!("{} {}", n, unit),
        other => display_scalar(other),
    }
}

fn display_list(value: Option<&Value>) -> String {
    let joined = match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| scalar_to_string(item).unwrap_or_else(|| item.to_string()))
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        None | Some(Value::Null) => String::new(),
        Some(v) => display_scalar(Some(v)),
    };
    if joined.is_empty() {
        "None".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(value: Value) -> UserProfile {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_format_full_profile() {
        let p = profile(json!({
            "email": "amir@example.com",
            "age": 29,
            "gender": "Male",
            "height": 172.5,
            "weight": 68,
            "activityLevel": "Moderately Active",
            "dietaryPreferences": ["Halal", "Low Sugar"],
            "favouriteCuisines": ["Malay"],
            "foodAllergies": [],
        }));
        let formatted = format_for_diet_recommendation(Some(&p)).unwrap().unwrap();
        assert_eq!(formatted.age, "29");
        assert_eq!(formatted.height, "172.5");
        assert_eq!(formatted.weight, "68");
        assert_eq!(formatted.gender, "Male");
        assert_eq!(formatted.activity_level, "Moderately Active");
        assert_eq!(formatted.dietary_preference, "Halal, Low Sugar");
        assert_eq!(formatted.favourite_cuisine, "Malay");
        assert_eq!(formatted.food_allergies, "");
    }

    #[test]
    fn test_missing_scalars_are_na_and_missing_lists_empty() {
        let p = profile(json!({ "gender": "Female" }));
        let formatted = format_for_diet_recommendation(Some(&p)).unwrap().unwrap();
        assert_eq!(formatted.age, "N/A");
        assert_eq!(formatted.height, "N/A");
        assert_eq!(formatted.activity_level, "N/A");
        assert_eq!(formatted.dietary_preference, "");
        assert_eq!(formatted.food_allergies, "");
    }

    #[test]
    fn test_no_profile_is_no_data() {
        assert_eq!(format_for_diet_recommendation(None), Ok(None));
        assert_eq!(
            format_for_diet_recommendation(Some(&UserProfile::default())),
            Ok(None)
        );
    }

    #[test]
    fn test_nested_values_fail_formatting() {
        let p = profile(json!({ "age": { "years": 30 } }));
        let err = format_for_diet_recommendation(Some(&p)).unwrap_err();
        assert!(err.to_string().contains("`age`"));

        let p = profile(json!({ "foodAllergies": [["peanut"]] }));
        assert!(format_for_diet_recommendation(Some(&p)).is_err());
    }

    #[test]
    fn test_serialized_row_uses_table_column_names() {
        let p = profile(json!({ "age": 40, "dietaryPreferences": ["Vegan"] }));
        let formatted = format_for_diet_recommendation(Some(&p)).unwrap().unwrap();
        let row = serde_json::to_value(&formatted).unwrap();
        assert_eq!(row["Age"], "40");
        assert_eq!(row["Activity Level"], "N/A");
        assert_eq!(row["Dietary Preference"], "Vegan");
        assert_eq!(row["Favourite Cuisine"], "");
    }

    #[test]
    fn test_display_lines() {
        let p = profile(json!({
            "age": 35,
            "height": 160,
            "weight": "unknown",
            "dietaryPreferences": ["Vegetarian", "Gluten Free"],
        }));
        let lines = display_lines(&p);
        assert_eq!(lines[0], "Age: 35");
        assert_eq!(lines[1], "Gender: N/A");
        assert_eq!(lines[2], "Height: 160 cm");
        assert_eq!(lines[3], "Weight: unknown");
        assert_eq!(lines[5], "Dietary Preferences: Vegetarian, Gluten Free");
        assert_eq!(lines[6], "Favorite Cuisines: None");
    }
}
