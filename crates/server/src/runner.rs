// crates/server/src/runner.rs
//! Headless stand-in for the desktop UI.
//!
//! The desktop window reacts to forwarded inject events by staging the
//! code and starting a render. When the binary runs without a window
//! (pure automation mode), this runner plays that role: it attaches to
//! the UI channel, writes injected code to a temp `.tsx` file, and
//! submits a uuid-keyed job to the [`RenderManager`].

use std::sync::Arc;

use animatic_types::{InjectEvent, RenderJob};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::state::AppState;

/// Attach to the UI channel and serve inject events until it closes.
pub fn spawn_headless_runner(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    let mut inject_rx = state.ui.attach();
    let manager = Arc::clone(&state.manager);
    tokio::spawn(async move {
        loop {
            match inject_rx.recv().await {
                Ok(event) => handle_inject(&manager, event).await,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "inject events dropped, runner fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Log every bridge event. A second subscriber alongside whatever UI is
/// attached, so fan-out stays exercised even headless.
pub fn spawn_event_logger(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    let mut events = state.manager.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => tracing::info!(event = %json, "render event"),
                    Err(e) => tracing::warn!(error = %e, "unserializable render event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "render events dropped by logger");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

async fn handle_inject(manager: &animatic_render::RenderManager, event: InjectEvent) {
    let job_id = Uuid::new_v4().to_string();
    let input_path = std::env::temp_dir().join(format!("animatic-{job_id}.tsx"));

    if let Err(e) = tokio::fs::write(&input_path, &event.code).await {
        tracing::error!(error = %e, path = %input_path.display(), "failed to stage injected code");
        return;
    }

    if !event.auto_render {
        tracing::info!(path = %input_path.display(), "code staged, auto-render disabled");
        return;
    }

    let output_path = event
        .output_path
        .unwrap_or_else(|| std::env::temp_dir().join(format!("animatic-{job_id}.mp4")));

    let job = RenderJob {
        id: job_id,
        input_path,
        output_path,
    };
    if let Err(e) = manager.start_render(job) {
        // Unreachable with uuid ids, but the registry contract stands.
        tracing::error!(error = %e, "failed to start injected render");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use animatic_render::{RenderManager, RendererConfig};
    use animatic_types::RenderEvent;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_runner_attachment_flips_window_ready() {
        let manager = Arc::new(RenderManager::new(RendererConfig::new("/bin/false")));
        let state = AppState::new(manager);
        assert!(!state.ui.is_ready());

        let _runner = spawn_headless_runner(Arc::clone(&state));
        assert!(state.ui.is_ready());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_injected_code_is_rendered() {
        // Scripted renderer: succeed if the staged input file holds the
        // injected code.
        let config = RendererConfig::new("/bin/sh").with_args([
            "-c",
            "grep -q 'const scene' \"$1\" && exit 0 || exit 1",
            "renderer",
        ]);
        let manager = Arc::new(RenderManager::new(config));
        let state = AppState::new(manager);
        let mut events = state.manager.subscribe();

        let _runner = spawn_headless_runner(Arc::clone(&state));

        state
            .ui
            .send(InjectEvent {
                code: "const scene = 1;".to_string(),
                auto_render: true,
                output_path: None,
            })
            .unwrap();

        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for render event")
            .unwrap();
        assert!(
            matches!(event, RenderEvent::Complete { .. }),
            "expected completion, got {event:?}"
        );
        assert!(state.manager.registry().is_empty());
    }

    #[tokio::test]
    async fn test_auto_render_disabled_spawns_nothing() {
        let manager = Arc::new(RenderManager::new(RendererConfig::new("/bin/false")));
        let state = AppState::new(manager);
        let _runner = spawn_headless_runner(Arc::clone(&state));

        state
            .ui
            .send(InjectEvent {
                code: "const x = 1;".to_string(),
                auto_render: false,
                output_path: None,
            })
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(state.manager.registry().is_empty());
    }
}
