//! Table service request and response types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use rotiplanta_core::Result;

/// Kind of generative table a row is appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableType {
    Action,
    Chat,
}

impl std::fmt::Display for TableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableType::Action => write!(f, "action"),
            TableType::Chat => write!(f, "chat"),
        }
    }
}

/// Body of a `rows/add` call.
#[derive(Debug, Clone, Serialize)]
pub struct RowAddRequest {
    pub table_id: String,
    pub data: Vec<Map<String, Value>>,
    pub stream: bool,
}

impl RowAddRequest {
    /// A single non-streaming row.
    pub fn single(table_id: impl Into<String>, row: Map<String, Value>) -> Self {
        Self {
            table_id: table_id.into(),
            data: vec![row],
            stream: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: ChoiceMessage,
    #[serde(default)]
    pub index: Option<u32>,
}

/// Generated output of one column.
///
/// Completed rows carry the full completion; some deployments also flatten
/// it into `text`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnOutput {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl ColumnOutput {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            choices: Vec::new(),
        }
    }

    /// Content of the first choice, if any.
    pub fn first_choice_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }

    /// Column text: the flattened `text` if present, else the first choice.
    pub fn text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.first_choice_content())
    }
}

/// A row returned by a non-streaming `rows/add`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletedRow {
    #[serde(default)]
    pub row_id: Option<String>,
    #[serde(default, deserialize_with = "null_columns_as_empty")]
    pub columns: HashMap<String, ColumnOutput>,
}

/// A `null` column is kept as an empty column rather than rejected, and a
/// `null` column map reads as no columns.
fn null_columns_as_empty<'de, D>(
    deserializer: D,
) -> std::result::Result<HashMap<String, ColumnOutput>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let columns: Option<HashMap<String, Option<ColumnOutput>>> =
        Option::deserialize(deserializer)?;
    Ok(columns
        .unwrap_or_default()
        .into_iter()
        .map(|(name, column)| (name, column.unwrap_or_default()))
        .collect())
}

/// One column's partial completion inside a stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnDelta {
    #[serde(default)]
    pub row_id: Option<String>,
    pub output_column_name: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// A row inside a streamed row batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowChunk {
    #[serde(default)]
    pub row_id: Option<String>,
    #[serde(default, deserialize_with = "null_columns_as_empty")]
    pub columns: HashMap<String, ColumnOutput>,
}

/// One decoded event of a streamed response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// A batch of rows with per-column completions.
    Rows(Vec<RowChunk>),
    /// Partial completion for one column of one row.
    Column(ColumnDelta),
    /// Any other event, kept by its `object` tag.
    Other { tag: String },
}

/// A bare chat completion, returned when the table answers like a chat model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl ChatCompletion {
    /// Concatenated message contents of all choices.
    pub fn content(&self) -> String {
        self.choices
            .iter()
            .filter_map(|c| c.message.content.as_deref())
            .collect()
    }
}

/// Every response shape the table service is known to produce.
#[derive(Debug, Clone, PartialEq)]
pub enum TableResponse {
    CompletedRows(Vec<CompletedRow>),
    StreamingChunks(Vec<StreamChunk>),
    ChatCompletion(ChatCompletion),
    Empty,
}

impl TableResponse {
    /// Classify a JSON body by its shape.
    pub fn from_json(body: Value) -> Result<Self> {
        let Value::Object(mut object) = body else {
            return Ok(Self::Empty);
        };

        if let Some(rows) = object.remove("rows") {
            let rows: Vec<CompletedRow> = serde_json::from_value(rows)?;
            return Ok(if rows.is_empty() {
                Self::Empty
            } else {
                Self::CompletedRows(rows)
            });
        }

        if object.contains_key("choices") {
            let completion: ChatCompletion = serde_json::from_value(Value::Object(object))?;
            return Ok(Self::ChatCompletion(completion));
        }

        Ok(Self::Empty)
    }
}

/// Response of the file upload endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FileUploadResponse {
    pub uri: String,
}
