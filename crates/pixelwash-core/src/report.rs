//! Host-facing report for one input.
//!
//! A [`JobReport`] carries everything a job framework needs from a run: the
//! terminal state, the descriptive features, and the produced data items.
//!
//! | Outcome | State | Features | Data |
//! |---|---|---|---|
//! | `Sanitized` | `completed` | `image_convert_tool`, optional `malformed` | one `safe_png` |
//! | `OptedOut` | `opt_out` | none | none |
//! | `Failed` | `completed_with_errors` + message | `malformed` | none |
//! | harness error | `error` + message | none | none |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::pipeline::Hasher;
use crate::types::SanitizationOutcome;

/// Data label of the sanitized PNG.
pub const SAFE_PNG_LABEL: &str = "safe_png";

/// Feature naming the decoder that produced the artifact.
pub const FEATURE_TOOL: &str = "image_convert_tool";

/// Feature carrying the malformed note or failure description.
pub const FEATURE_MALFORMED: &str = "malformed";

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateLabel {
    /// An artifact was produced
    Completed,
    /// Input is not an image this tool understands
    OptOut,
    /// Input looked like an image but could not be converted
    CompletedWithErrors,
    /// The harness failed before or around the pipeline
    Error,
}

impl fmt::Display for StateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StateLabel::Completed => "completed",
            StateLabel::OptOut => "opt_out",
            StateLabel::CompletedWithErrors => "completed_with_errors",
            StateLabel::Error => "error",
        };
        f.write_str(label)
    }
}

/// State label plus optional human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub label: StateLabel,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A produced artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataItem {
    /// Always [`SAFE_PNG_LABEL`]
    pub label: String,

    /// BLAKE3 of the artifact bytes
    pub hash: String,

    /// Artifact size in bytes
    pub size: u64,

    pub width: u32,
    pub height: u32,

    /// Where the artifact was written, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Everything reported for one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    /// Input path or name as given
    pub source: String,

    /// BLAKE3 of the input bytes, when they could be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_hash: Option<String>,

    pub state: RunState,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, Vec<String>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<DataItem>,
}

impl JobReport {
    /// Shape a pipeline outcome into a report.
    pub fn from_outcome(
        source: impl Into<String>,
        input_hash: impl Into<String>,
        outcome: &SanitizationOutcome,
    ) -> Self {
        let mut report = Self {
            source: source.into(),
            input_hash: Some(input_hash.into()),
            state: RunState {
                label: StateLabel::Completed,
                message: None,
            },
            features: BTreeMap::new(),
            data: Vec::new(),
        };

        match outcome {
            SanitizationOutcome::Sanitized(image) => {
                report.data.push(DataItem {
                    label: SAFE_PNG_LABEL.to_string(),
                    hash: Hasher::content_hash(&image.png.bytes),
                    size: image.png.bytes.len() as u64,
                    width: image.png.width,
                    height: image.png.height,
                    path: None,
                });
                report.add_feature(FEATURE_TOOL, image.tool.as_str());
                if let Some(note) = &image.malformed {
                    report.add_feature(FEATURE_MALFORMED, note);
                }
            }
            SanitizationOutcome::OptedOut => {
                report.state.label = StateLabel::OptOut;
            }
            SanitizationOutcome::Failed { description, note } => {
                report.add_feature(FEATURE_MALFORMED, note);
                report.state = RunState {
                    label: StateLabel::CompletedWithErrors,
                    message: Some(description.clone()),
                };
            }
        }

        report
    }

    /// Report a harness failure (unreadable input, timeout, write error).
    pub fn from_error(source: impl Into<String>, error: &dyn fmt::Display) -> Self {
        Self {
            source: source.into(),
            input_hash: None,
            state: RunState {
                label: StateLabel::Error,
                message: Some(error.to_string()),
            },
            features: BTreeMap::new(),
            data: Vec::new(),
        }
    }

    /// Record where the `safe_png` artifact was written.
    pub fn with_artifact_path(mut self, path: PathBuf) -> Self {
        if let Some(item) = self
            .data
            .iter_mut()
            .find(|item| item.label == SAFE_PNG_LABEL)
        {
            item.path = Some(path);
        }
        self
    }

    /// The `safe_png` data item, if one was produced.
    pub fn artifact(&self) -> Option<&DataItem> {
        self.data.iter().find(|item| item.label == SAFE_PNG_LABEL)
    }

    /// Values recorded for a feature.
    pub fn feature(&self, name: &str) -> &[String] {
        self.features.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    fn add_feature(&mut self, name: &str, value: &str) {
        self.features
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EncodedPng, SanitizedImage, Tool};

    fn sanitized(tool: Tool, malformed: Option<&str>) -> SanitizationOutcome {
        SanitizationOutcome::Sanitized(SanitizedImage {
            png: EncodedPng {
                bytes: vec![1, 2, 3],
                width: 10,
                height: 5,
            },
            tool,
            malformed: malformed.map(str::to_string),
        })
    }

    #[test]
    fn test_sanitized_report() {
        let report = JobReport::from_outcome("a.jpg", "abc", &sanitized(Tool::Primary, None));

        assert_eq!(report.state.label, StateLabel::Completed);
        assert!(report.state.message.is_none());
        assert_eq!(report.feature(FEATURE_TOOL), ["primary"]);
        assert!(report.feature(FEATURE_MALFORMED).is_empty());

        let artifact = report.artifact().unwrap();
        assert_eq!(artifact.label, "safe_png");
        assert_eq!(artifact.hash, Hasher::content_hash(&[1, 2, 3]));
        assert_eq!((artifact.width, artifact.height, artifact.size), (10, 5, 3));
    }

    #[test]
    fn test_fallback_report_carries_note() {
        let report = JobReport::from_outcome(
            "map.jpg",
            "abc",
            &sanitized(Tool::Fallback, Some("truncated")),
        );

        assert_eq!(report.state.label, StateLabel::Completed);
        assert_eq!(report.feature(FEATURE_TOOL), ["fallback"]);
        assert_eq!(report.feature(FEATURE_MALFORMED), ["truncated"]);
    }

    #[test]
    fn test_opt_out_report_is_empty() {
        let report = JobReport::from_outcome("x.bin", "abc", &SanitizationOutcome::OptedOut);

        assert_eq!(report.state.label, StateLabel::OptOut);
        assert!(report.state.message.is_none());
        assert!(report.features.is_empty());
        assert!(report.data.is_empty());
    }

    #[test]
    fn test_failed_report() {
        let outcome = SanitizationOutcome::Failed {
            description: "Image is Malformed. Reason : broken stream".to_string(),
            note: "Image is Malformed".to_string(),
        };
        let report = JobReport::from_outcome("x.png", "abc", &outcome);

        assert_eq!(report.state.label, StateLabel::CompletedWithErrors);
        assert_eq!(
            report.state.message.as_deref(),
            Some("Image is Malformed. Reason : broken stream")
        );
        assert_eq!(report.feature(FEATURE_MALFORMED), ["Image is Malformed"]);
        assert!(report.artifact().is_none());
    }

    #[test]
    fn test_error_report() {
        let report = JobReport::from_error("gone.png", &"File not found: gone.png");
        assert_eq!(report.state.label, StateLabel::Error);
        assert!(report.input_hash.is_none());
        assert_eq!(
            report.state.message.as_deref(),
            Some("File not found: gone.png")
        );
    }

    #[test]
    fn test_artifact_path_and_json_shape() {
        let report = JobReport::from_outcome("a.jpg", "abc", &sanitized(Tool::Primary, None))
            .with_artifact_path(PathBuf::from("/out/x.png"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["state"]["label"], "completed");
        assert!(json["state"].get("message").is_none());
        assert_eq!(json["features"]["image_convert_tool"][0], "primary");
        assert_eq!(json["data"][0]["path"], "/out/x.png");

        let opt_out = JobReport::from_outcome("b", "def", &SanitizationOutcome::OptedOut);
        let json = serde_json::to_value(&opt_out).unwrap();
        assert_eq!(json["state"]["label"], "opt_out");
        assert!(json.get("features").is_none());
        assert!(json.get("data").is_none());
    }
}
