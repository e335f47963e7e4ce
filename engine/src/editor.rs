//! Wire types for the editor / remote-control HTTP API. All JSON is camelCase.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditorAction {
    pub id: String,
    pub label: String,
    /// Toolbar section the action is listed under.
    pub group: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditorManifest {
    pub title: String,
    pub actions: Vec<EditorAction>,
}

impl EditorManifest {
    pub fn action(&self, id: &str) -> Option<&EditorAction> {
        self.actions.iter().find(|a| a.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditorPaletteEntry {
    pub value: u8,
    pub label: String,
}

/// `cells[row][col]`, row 0 on top. Values index into `palette`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditorGrid {
    pub cells: Vec<Vec<u8>>,
    pub palette: Vec<EditorPaletteEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditorStat {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditorTimeline {
    pub frame: usize,
    pub history_len: usize,
    pub can_rewind: bool,
    pub can_forward: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub frame: usize,
    /// Raw game state as JSON, for tooling that wants more than the stats.
    pub state: serde_json::Value,
    pub stats: Vec<EditorStat>,
    pub grid: Option<EditorGrid>,
    /// Action ids that mean something in the current state.
    #[serde(default)]
    pub available: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StepRequest {
    pub action_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FramesRequest {
    pub frames: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeekRequest {
    pub frame: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_request_reads_camel_case() {
        let req: StepRequest = serde_json::from_str(r#"{"actionId":"wait"}"#).unwrap();
        assert_eq!(req.action_id, "wait");
    }

    #[test]
    fn snapshots_without_available_still_parse() {
        let snap: EditorSnapshot =
            serde_json::from_str(r#"{"frame":3,"state":null,"stats":[],"grid":null}"#).unwrap();
        assert_eq!(snap.frame, 3);
        assert!(snap.available.is_empty());
    }
}
