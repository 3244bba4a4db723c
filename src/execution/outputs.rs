//! Output records produced by an execution, and the two shapes the server may send them in.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// One unit of kernel output, keyed by `output_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum OutputRecord {
    Stream {
        /// "stdout" or "stderr"
        name: String,
        #[serde(deserialize_with = "deserialize_multiline")]
        text: String,
    },
    ExecuteResult {
        #[serde(default)]
        execution_count: Option<i64>,
        #[serde(default)]
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    DisplayData {
        #[serde(default)]
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    Error {
        ename: String,
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

impl OutputRecord {
    pub fn output_type(&self) -> &'static str {
        match self {
            Self::Stream { .. } => "stream",
            Self::ExecuteResult { .. } => "execute_result",
            Self::DisplayData { .. } => "display_data",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The mime bundle of rich outputs.
    pub fn data(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::ExecuteResult { data, .. } | Self::DisplayData { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Text for a given mime type, joining list-of-lines values.
    pub fn mime_text(&self, mime: &str) -> Option<String> {
        self.data()
            .and_then(|d| d.get(mime))
            .and_then(multiline_value)
    }

    pub fn text_plain(&self) -> Option<String> {
        self.mime_text("text/plain")
    }
}

/// Outputs as found in an execution result: either the raw JSON text of the
/// output list, or the list itself. Records stay undecoded until [`Outputs::parse`],
/// so an unfamiliar record never hides the rest of the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outputs {
    Records(Vec<Value>),
    Text(String),
}

impl Default for Outputs {
    fn default() -> Self {
        Self::Records(Vec::new())
    }
}

impl Outputs {
    /// Decode into records. Structured and textual outputs go through the same
    /// record decoding; blank text decodes to no records.
    pub fn parse(&self) -> Result<Vec<OutputRecord>> {
        match self {
            Self::Records(records) => records
                .iter()
                .map(|r| Ok(OutputRecord::deserialize(r)?))
                .collect(),
            Self::Text(text) if text.trim().is_empty() => Ok(Vec::new()),
            Self::Text(text) => Ok(serde_json::from_str(text)?),
        }
    }
}

/// `null` is treated like a missing field.
pub(crate) fn deserialize_outputs<'de, D>(deserializer: D) -> std::result::Result<Outputs, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Outputs>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Multiline {
    Single(String),
    Lines(Vec<String>),
}

fn deserialize_multiline<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Multiline::deserialize(deserializer)? {
        Multiline::Single(s) => s,
        Multiline::Lines(lines) => lines.concat(),
    })
}

fn multiline_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => parts
            .iter()
            .map(|p| p.as_str())
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.concat()),
        _ => None,
    }
}
