//! Turns a table response into a fixed set of cleaned fields.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use rotiplanta_text::{normalize, NormalizationProfile, NOT_AVAILABLE};

use crate::types::{ColumnOutput, StreamChunk, TableResponse};

/// Field name to display text, in the order the fields were requested.
///
/// Every requested field is present; fields the service left empty hold
/// [`NOT_AVAILABLE`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedResult {
    fields: Vec<(String, String)>,
}

impl NormalizedResult {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, text)| text.as_str())
    }

    /// Remove a field and return its text.
    pub fn take(&mut self, field: &str) -> Option<String> {
        let index = self.fields.iter().position(|(name, _)| name == field)?;
        Some(self.fields.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for NormalizedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, text) in &self.fields {
            map.serialize_entry(name, text)?;
        }
        map.end()
    }
}

/// Extract and clean `fields` from a response.
///
/// Precedence follows the response shape: completed rows, then the first
/// row batch of a stream, then a bare chat completion. A chat completion
/// fills a single requested field with its whole text and is otherwise
/// split on `field:` markers. Returns `None` when the response carries none
/// of the requested fields at all.
pub fn route_response(
    response: &TableResponse,
    fields: &[&str],
    profile: NormalizationProfile,
) -> Option<NormalizedResult> {
    match response {
        TableResponse::CompletedRows(rows) => {
            let row = rows.first()?;
            from_columns(&row.columns, fields, profile, ColumnOutput::text)
        }
        TableResponse::StreamingChunks(chunks) => {
            // Only the first row batch counts; anything after it is ignored.
            let rows = chunks.iter().find_map(|chunk| match chunk {
                StreamChunk::Rows(rows) => Some(rows),
                _ => None,
            })?;
            let row = rows.first()?;
            from_columns(
                &row.columns,
                fields,
                profile,
                ColumnOutput::first_choice_content,
            )
        }
        TableResponse::ChatCompletion(completion) => {
            let text = completion.content();
            if let [only] = fields {
                // A single-column table answers with its whole text.
                if text.trim().is_empty() {
                    return None;
                }
                return Some(NormalizedResult {
                    fields: vec![(only.to_string(), finalize(Some(text.as_str()), profile))],
                });
            }
            let sections = split_sections(&text, fields);
            if sections.iter().all(Option::is_none) {
                return None;
            }
            Some(NormalizedResult {
                fields: fields
                    .iter()
                    .zip(sections)
                    .map(|(name, raw)| (name.to_string(), finalize(raw, profile)))
                    .collect(),
            })
        }
        TableResponse::Empty => None,
    }
}

fn from_columns(
    columns: &HashMap<String, ColumnOutput>,
    fields: &[&str],
    profile: NormalizationProfile,
    read: fn(&ColumnOutput) -> Option<&str>,
) -> Option<NormalizedResult> {
    if !fields.iter().any(|f| columns.contains_key(*f)) {
        return None;
    }
    Some(NormalizedResult {
        fields: fields
            .iter()
            .map(|name| {
                let raw = columns.get(*name).and_then(read);
                (name.to_string(), finalize(raw, profile))
            })
            .collect(),
    })
}

fn finalize(raw: Option<&str>, profile: NormalizationProfile) -> String {
    match raw {
        Some(text) if !text.trim().is_empty() => normalize(text, profile),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Cut `text` at case-insensitive `field:` markers.
///
/// A marker only counts at the start of a word, so `prelunch:` is not a
/// `lunch:` marker. Each section runs from just after its marker to the
/// nearest following marker of any field, or to the end of the text.
fn split_sections<'a>(text: &'a str, fields: &[&str]) -> Vec<Option<&'a str>> {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    let markers: Vec<Option<(usize, usize)>> = fields
        .iter()
        .map(|field| {
            let marker = format!("{}:", field.to_ascii_lowercase());
            lower
                .match_indices(&marker)
                .map(|(pos, _)| pos)
                .find(|pos| starts_word(lower.as_bytes(), *pos))
                .map(|pos| (pos, pos + marker.len()))
        })
        .collect();

    markers
        .iter()
        .map(|marker| {
            let (_, start) = (*marker)?;
            let end = markers
                .iter()
                .flatten()
                .map(|(pos, _)| *pos)
                .filter(|pos| *pos >= start)
                .min()
                .unwrap_or(text.len());
            Some(&text[start..end])
        })
        .collect()
}

fn starts_word(bytes: &[u8], pos: usize) -> bool {
    pos == 0 || !bytes[pos - 1].is_ascii_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatCompletion, Choice, ChoiceMessage, CompletedRow, RowChunk};
    use serde_json::json;

    const MEALS: [&str; 3] = ["Breakfast", "Lunch", "Dinner"];

    fn choice_column(content: &str) -> ColumnOutput {
        ColumnOutput {
            text: None,
            choices: vec![Choice {
                message: ChoiceMessage {
                    role: Some("assistant".into()),
                    content: Some(content.into()),
                },
                index: Some(0),
            }],
        }
    }

    fn chat(content: &str) -> TableResponse {
        TableResponse::ChatCompletion(ChatCompletion {
            choices: vec![Choice {
                message: ChoiceMessage {
                    role: None,
                    content: Some(content.into()),
                },
                index: None,
            }],
        })
    }

    #[test]
    fn test_meal_plan_row_with_empty_columns() {
        let body = json!({
            "rows": [{
                "columns": {
                    "Breakfast": {"text": "1. Oats\n2. Fruit"},
                    "Lunch": {},
                    "Dinner": {}
                }
            }]
        });
        let response = TableResponse::from_json(body).unwrap();
        let result = route_response(&response, &MEALS, NormalizationProfile::MealPlan).unwrap();

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "Breakfast": "1. Oats\n2. Fruit",
                "Lunch": "Not available",
                "Dinner": "Not available"
            })
        );
    }

    #[test]
    fn test_meal_plan_row_with_null_columns() {
        let body = json!({
            "rows": [{
                "columns": {
                    "Breakfast": {"text": "1. Oats"},
                    "Lunch": null,
                    "Dinner": null
                }
            }]
        });
        let response = TableResponse::from_json(body).unwrap();
        let result = route_response(&response, &MEALS, NormalizationProfile::MealPlan).unwrap();
        assert_eq!(result.get("Breakfast"), Some("1. Oats"));
        assert_eq!(result.get("Lunch"), Some(NOT_AVAILABLE));
        assert_eq!(result.get("Dinner"), Some(NOT_AVAILABLE));
    }

    #[test]
    fn test_result_keeps_requested_order() {
        let mut columns = HashMap::new();
        columns.insert("Dinner".to_string(), ColumnOutput::from_text("1. Soup"));
        let response = TableResponse::CompletedRows(vec![CompletedRow {
            row_id: None,
            columns,
        }]);
        let result = route_response(&response, &MEALS, NormalizationProfile::MealPlan).unwrap();
        let names: Vec<&str> = result.iter().map(|(k, _)| k).collect();
        assert_eq!(names, MEALS);
        assert_eq!(result.get("Dinner"), Some("1. Soup"));
    }

    #[test]
    fn test_rows_without_requested_fields_are_unavailable() {
        let mut columns = HashMap::new();
        columns.insert("Other".to_string(), ColumnOutput::from_text("x"));
        let response = TableResponse::CompletedRows(vec![CompletedRow {
            row_id: None,
            columns,
        }]);
        assert!(route_response(&response, &MEALS, NormalizationProfile::MealPlan).is_none());
        assert!(route_response(
            &TableResponse::CompletedRows(vec![]),
            &MEALS,
            NormalizationProfile::MealPlan
        )
        .is_none());
    }

    #[test]
    fn test_empty_response_is_unavailable() {
        assert!(
            route_response(&TableResponse::Empty, &["AI"], NormalizationProfile::PlainDocument)
                .is_none()
        );
    }

    #[test]
    fn test_stream_uses_first_row_batch_only() {
        let mut first = HashMap::new();
        first.insert("Result".to_string(), choice_column("**Fresh** salad"));
        let mut second = HashMap::new();
        second.insert("Result".to_string(), choice_column("later"));

        let response = TableResponse::StreamingChunks(vec![
            StreamChunk::Other {
                tag: "gen_table.completion.chunk".into(),
            },
            StreamChunk::Rows(vec![RowChunk {
                row_id: Some("r1".into()),
                columns: first,
            }]),
            StreamChunk::Rows(vec![RowChunk {
                row_id: Some("r2".into()),
                columns: second,
            }]),
        ]);
        let result =
            route_response(&response, &["Result"], NormalizationProfile::PlainDocument).unwrap();
        assert_eq!(result.get("Result"), Some("Fresh salad"));
    }

    #[test]
    fn test_stream_without_row_batch_is_unavailable() {
        let response = TableResponse::StreamingChunks(vec![StreamChunk::Other { tag: "x".into() }]);
        assert!(route_response(&response, &["AI"], NormalizationProfile::PlainDocument).is_none());
    }

    #[test]
    fn test_chat_completion_split_on_markers() {
        let response = chat(
            "Here you go.\nBREAKFAST:\n1. Oats\nLunch:\n1. Nasi lemak\n- Protein:20g\ndinner:\n1. Soup",
        );
        let result = route_response(&response, &MEALS, NormalizationProfile::MealPlan).unwrap();
        assert_eq!(result.get("Breakfast"), Some("1. Oats"));
        assert_eq!(result.get("Lunch"), Some("1. Nasi lemak\n- Protein: 20g"));
        assert_eq!(result.get("Dinner"), Some("1. Soup"));
    }

    #[test]
    fn test_chat_completion_missing_marker_defaults() {
        let response = chat("Breakfast: 1. Toast");
        let result = route_response(&response, &MEALS, NormalizationProfile::MealPlan).unwrap();
        assert_eq!(result.get("Breakfast"), Some("1. Toast"));
        assert_eq!(result.get("Lunch"), Some(NOT_AVAILABLE));
        assert_eq!(result.get("Dinner"), Some(NOT_AVAILABLE));
    }

    #[test]
    fn test_chat_completion_without_markers() {
        let response = chat("Drink more water.");
        assert!(route_response(&response, &MEALS, NormalizationProfile::MealPlan).is_none());

        let result = route_response(&response, &["AI"], NormalizationProfile::PlainDocument).unwrap();
        assert_eq!(result.get("AI"), Some("Drink more water."));
    }

    #[test]
    fn test_single_field_chat_keeps_text_before_colons() {
        let response = chat("Try Thai: green curry is mild.");
        let result = route_response(&response, &["AI"], NormalizationProfile::PlainDocument).unwrap();
        assert_eq!(result.get("AI"), Some("Try Thai: green curry is mild."));

        let response = chat("Your test result: normal. Keep it up.");
        let result =
            route_response(&response, &["Result"], NormalizationProfile::PlainDocument).unwrap();
        assert_eq!(result.get("Result"), Some("Your test result: normal. Keep it up."));
    }

    #[test]
    fn test_single_field_blank_chat_is_unavailable() {
        assert!(route_response(&chat("  \n"), &["AI"], NormalizationProfile::PlainDocument).is_none());
    }

    #[test]
    fn test_markers_only_match_whole_words() {
        let response = chat(
            "Breakfast:\n1. Oats\nLunch:\n1. Pad Thai: no peanuts\nPredinner: tea\nDinner:\n1. Soup",
        );
        let result = route_response(&response, &MEALS, NormalizationProfile::MealPlan).unwrap();
        assert_eq!(result.get("Breakfast"), Some("1. Oats"));
        assert_eq!(result.get("Lunch"), Some("1. Pad Thai: no peanuts"));
        assert_eq!(result.get("Dinner"), Some("1. Soup"));
    }

    #[test]
    fn test_take_removes_field() {
        let response = chat("Breakfast: 1. Toast");
        let mut result = route_response(&response, &MEALS, NormalizationProfile::MealPlan).unwrap();
        assert_eq!(result.take("Breakfast").as_deref(), Some("1. Toast"));
        assert_eq!(result.len(), 2);
        assert_eq!(result.take("Breakfast"), None);
    }
}
