//! Cleanup of generated table text into display-ready text.
//!
//! The AI tables answer in loose Markdown. Each endpoint picks a
//! [`NormalizationProfile`] that strips the cosmetic markup and, for meal
//! plans and photo analyses, reshapes the lines the mobile client renders.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder for a field the service did not fill.
pub const NOT_AVAILABLE: &str = "Not available";

const MEAL_PLAN_NOISE: &[&str] = &[
    "Breakfast Meal Plan",
    "Lunch Meal Plan",
    "Dinner Meal Plan",
    "Fiber-Rich, Low-GI Foods and Lean Proteins",
];

const MEAL_PLAN_KEEP_PREFIXES: &[&str] = &["1.", "2.", "3.", "-", "Total "];

const WHAT_HAPPENED_HEADER: &str = "What Happened in the Image";
const INTERPRETATION_HEADER: &str = "Interpretation";
const BULLET: &str = "• ";

/// `Calories:` also covers `Total Calories:`.
static NUTRIENT_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(Carbs|Protein|Fat|Fiber|Calories):(\S)").unwrap());

/// Which cleanup rules apply to a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizationProfile {
    /// Diet recommendation columns: keep only numbered items, bullets and totals.
    MealPlan,
    /// Photo analysis: normalized section headers, bulleted interpretation.
    ImageAnalysis,
    /// Report analysis: Markdown markers removed, nothing else.
    PlainDocument,
    /// Chatbot replies: Markdown markers and every stray `*` removed.
    ChatReply,
}

/// Clean `text` according to `profile`.
pub fn normalize(text: &str, profile: NormalizationProfile) -> String {
    match profile {
        NormalizationProfile::MealPlan => clean_meal_plan(text),
        NormalizationProfile::ImageAnalysis => clean_image_analysis(text),
        NormalizationProfile::PlainDocument => strip_markdown(text),
        NormalizationProfile::ChatReply => strip_markdown(text).replace('*', ""),
    }
}

/// Remove emphasis (`**`), horizontal rules (`---`) and heading runs (`#`..`####`).
fn strip_markdown(text: &str) -> String {
    text.replace("**", "").replace("---", "").replace('#', "")
}

fn clean_meal_plan(text: &str) -> String {
    if text == NOT_AVAILABLE {
        return text.to_string();
    }

    let mut cleaned = strip_markdown(text);
    for phrase in MEAL_PLAN_NOISE {
        cleaned = cleaned.replace(phrase, "");
    }

    cleaned
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| NUTRIENT_LABEL.replace_all(line, "$1: $2").into_owned())
        .filter(|line| {
            MEAL_PLAN_KEEP_PREFIXES
                .iter()
                .any(|prefix| line.starts_with(prefix))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn clean_image_analysis(text: &str) -> String {
    let cleaned = strip_markdown(text);
    let mut in_interpretation = false;
    let mut formatted = Vec::new();

    for line in cleaned.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }

        let line = if line.contains(WHAT_HAPPENED_HEADER) {
            header_line(line, WHAT_HAPPENED_HEADER)
        } else if line.contains(INTERPRETATION_HEADER) {
            in_interpretation = true;
            header_line(line, INTERPRETATION_HEADER)
        } else if in_interpretation {
            match line.strip_prefix("- ") {
                Some(rest) => format!("{}{}", BULLET, rest),
                None => line.to_string(),
            }
        } else {
            line.to_string()
        };

        formatted.push(line);
    }

    formatted.join("\n\n")
}

/// A header line keeps its own wording only if it already ends with a colon.
fn header_line(line: &str, header: &str) -> String {
    if line.ends_with(':') {
        line.to_string()
    } else {
        format!("{}:", header)
    }
}
