//! Response shape of a flow run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decoded body of a flow run.
///
/// `outputs` is kept as raw JSON: the proxy returns it verbatim when the run
/// produced no chat text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowOutput {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub outputs: Value,
}

impl FlowOutput {
    /// A run result carrying a single chat message.
    pub fn from_chat_text(text: impl Into<String>) -> Self {
        Self {
            session_id: None,
            outputs: serde_json::json!([{
                "outputs": [{
                    "results": { "message": { "text": text.into() } }
                }]
            }]),
        }
    }

    /// A run result with arbitrary raw outputs and no chat text.
    pub fn from_raw(outputs: Value) -> Self {
        Self {
            session_id: None,
            outputs,
        }
    }

    /// Text of the first chat message in the run, if any.
    ///
    /// Looks at `outputs[*].outputs[*].results.message.text`, then at the
    /// older `outputs[*].outputs[*].outputs.message.message` layout.
    pub fn chat_output_text(&self) -> Option<String> {
        let runs = self.outputs.as_array()?;
        runs.iter()
            .filter_map(|run| run.get("outputs").and_then(Value::as_array))
            .flatten()
            .find_map(|component| {
                component
                    .pointer("/results/message/text")
                    .or_else(|| component.pointer("/outputs/message/message"))
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
    }
}
