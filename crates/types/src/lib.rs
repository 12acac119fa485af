// crates/types/src/lib.rs
//! Wire-level types shared between the render engine, the control-plane
//! server, and the TypeScript frontend (via ts-rs exports).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Caller-supplied unique token identifying one render job.
///
/// The token is opaque to this subsystem: the desktop UI uses timestamps,
/// the headless runner uses UUIDs, automation tools can use whatever they
/// like as long as the id is not already live.
pub type JobId = String;

/// A named phase reported by the rendering executable's progress output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
#[serde(rename_all = "lowercase")]
pub enum RenderStage {
    Bundling,
    Rendering,
}

/// One render request, tracked from submission to terminal outcome.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct RenderJob {
    pub id: JobId,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

/// Lifecycle event published on the event bridge.
///
/// Every job emits zero or more `Progress` events followed by exactly one
/// terminal event (`Complete` xor `Error`), and nothing after that.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../../bindings/")]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RenderEvent {
    #[serde(rename_all = "camelCase")]
    Progress {
        job_id: JobId,
        stage: RenderStage,
        /// Always within [0, 100]; clamped at extraction time.
        percent: u8,
    },
    #[serde(rename_all = "camelCase")]
    Complete { job_id: JobId, output_path: PathBuf },
    #[serde(rename_all = "camelCase")]
    Error { job_id: JobId, error: String },
}

impl RenderEvent {
    /// The id of the job this event belongs to.
    pub fn job_id(&self) -> &str {
        match self {
            RenderEvent::Progress { job_id, .. }
            | RenderEvent::Complete { job_id, .. }
            | RenderEvent::Error { job_id, .. } => job_id,
        }
    }

    /// Whether this event ends the job's life in the registry.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RenderEvent::Progress { .. })
    }
}

/// Code payload forwarded from the control plane to the attached UI.
///
/// The UI (or the headless runner standing in for it) reacts by staging
/// the code and, when `auto_render` is set, submitting a render job.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct InjectEvent {
    pub code: String,
    pub auto_render: bool,
    /// Where the caller wants the video; `None` lets the consumer choose.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

/// Result shape of the in-process `cancel(jobId)` call.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_wire_shape() {
        let event = RenderEvent::Progress {
            job_id: "j1".to_string(),
            stage: RenderStage::Bundling,
            percent: 42,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"progress\""));
        assert!(json.contains("\"jobId\":\"j1\""));
        assert!(json.contains("\"stage\":\"bundling\""));
        assert!(json.contains("\"percent\":42"));
    }

    #[test]
    fn test_complete_event_wire_shape() {
        let event = RenderEvent::Complete {
            job_id: "j1".to_string(),
            output_path: PathBuf::from("/tmp/out.mp4"),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"complete\""));
        assert!(json.contains("\"outputPath\":\"/tmp/out.mp4\""));
    }

    #[test]
    fn test_event_job_id_and_terminal() {
        let progress = RenderEvent::Progress {
            job_id: "a".to_string(),
            stage: RenderStage::Rendering,
            percent: 0,
        };
        let error = RenderEvent::Error {
            job_id: "b".to_string(),
            error: "boom".to_string(),
        };
        assert_eq!(progress.job_id(), "a");
        assert_eq!(error.job_id(), "b");
        assert!(!progress.is_terminal());
        assert!(error.is_terminal());
    }

    #[test]
    fn test_cancel_response_omits_absent_error() {
        let ok = CancelResponse {
            success: true,
            error: None,
        };
        let json = serde_json::to_string(&ok).unwrap();
        assert_eq!(json, "{\"success\":true}");

        let not_found = CancelResponse {
            success: false,
            error: Some("Process not found".to_string()),
        };
        let json = serde_json::to_string(&not_found).unwrap();
        assert!(json.contains("\"error\":\"Process not found\""));
    }

    #[test]
    fn test_render_job_round_trip() {
        let job = RenderJob {
            id: "job-1".to_string(),
            input_path: PathBuf::from("in.tsx"),
            output_path: PathBuf::from("out.mp4"),
        };
        let json = serde_json::to_string(&job).unwrap();
        assert!(json.contains("\"inputPath\":\"in.tsx\""));
        let back: RenderJob = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "job-1");
    }
}
