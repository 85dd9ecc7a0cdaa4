//! Recorded page traces and their replay.
//!
//! A trace is an ordered list of steps: page snapshots (URL plus HTML, followed by one
//! or more change notifications) and data responses seen on the wire. Replaying a trace
//! drives the real tap, page reader and engine exactly as a live session would.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use network_tap_light::{HttpClient, HttpRequest, HttpResponse, TapError, TappedClient};
use parking_lot::Mutex;
use perceiver_structural::ObservedPage;
use roundwatch_core_types::{GameState, LifecycleEvent};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::engine::ReconciliationEngine;
use crate::reconcile::Phase;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse trace {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("step {index}: {reason}")]
    InvalidStep { index: usize, reason: String },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub steps: Vec<TraceStep>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceStep {
    Page(PageStep),
    Response(ResponseStep),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageStep {
    pub url: String,
    #[serde(default)]
    pub html: Option<String>,
    /// Read relative to the trace file.
    #[serde(default)]
    pub html_file: Option<PathBuf>,
    /// How many change notifications the snapshot produces.
    #[serde(default = "default_notifications")]
    pub notifications: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponseStep {
    pub url: String,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
    /// Raw body read relative to the trace file; need not be JSON.
    #[serde(default)]
    pub body_file: Option<PathBuf>,
}

fn default_notifications() -> u32 {
    1
}

fn default_status() -> u16 {
    200
}

/// A step with its file references read in.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedStep {
    Page {
        url: String,
        html: String,
        notifications: u32,
    },
    Response {
        url: String,
        response: HttpResponse,
    },
}

impl Trace {
    /// Loads YAML (`.yaml`/`.yml`) or JSON from `path`.
    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let raw = fs::read_to_string(path).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        let parsed = if yaml {
            serde_yaml::from_str(&raw).map_err(|err| err.to_string())
        } else {
            serde_json::from_str(&raw).map_err(|err| err.to_string())
        };
        parsed.map_err(|reason| TraceError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Inlines `html_file`/`body_file` references, resolving them against `base`.
    pub fn resolve(&self, base: &Path) -> Result<Vec<ResolvedStep>, TraceError> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| match step {
                TraceStep::Page(page) => {
                    let html = match (&page.html, &page.html_file) {
                        (Some(html), _) => html.clone(),
                        (None, Some(file)) => read_text(&base.join(file))?,
                        (None, None) => {
                            return Err(TraceError::InvalidStep {
                                index,
                                reason: "page step needs `html` or `html_file`".into(),
                            })
                        }
                    };
                    Ok(ResolvedStep::Page {
                        url: page.url.clone(),
                        html,
                        notifications: page.notifications,
                    })
                }
                TraceStep::Response(response) => {
                    let body = match (&response.body, &response.body_file) {
                        (Some(value), _) => value.to_string().into_bytes(),
                        (None, Some(file)) => {
                            let path = base.join(file);
                            fs::read(&path).map_err(|source| TraceError::Io { path, source })?
                        }
                        (None, None) => Vec::new(),
                    };
                    Ok(ResolvedStep::Response {
                        url: response.url.clone(),
                        response: HttpResponse::new(response.status, body),
                    })
                }
            })
            .collect()
    }
}

fn read_text(path: &Path) -> Result<String, TraceError> {
    fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Serves canned responses in the order they were recorded, per URL.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    queues: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, url: impl Into<String>, response: HttpResponse) {
        self.queues
            .lock()
            .entry(url.into())
            .or_default()
            .push_back(response);
    }

    pub fn from_steps(steps: &[ResolvedStep]) -> Self {
        let client = Self::new();
        for step in steps {
            if let ResolvedStep::Response { url, response } = step {
                client.push(url.clone(), response.clone());
            }
        }
        client
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TapError> {
        self.queues
            .lock()
            .get_mut(&request.url)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| TapError::Transport(format!("no scripted response for {}", request.url)))
    }
}

/// What a replay produced.
#[derive(Clone, Debug, Serialize)]
pub struct ReplayReport {
    pub name: Option<String>,
    pub steps: usize,
    pub passes: u64,
    pub captured_payloads: u64,
    pub events: Vec<LifecycleEvent>,
    pub phase: Phase,
    pub state: GameState,
}

/// Feeds resolved steps through a [`TappedClient`] sharing the engine's tap and into the
/// [`ObservedPage`] the engine reads from.
pub struct Replayer<'a> {
    engine: &'a mut ReconciliationEngine<Arc<ObservedPage>>,
}

impl<'a> Replayer<'a> {
    pub fn new(engine: &'a mut ReconciliationEngine<Arc<ObservedPage>>) -> Self {
        Self { engine }
    }

    /// Replays `steps`, calling `on_event` for every lifecycle event as it fires.
    pub async fn run<F>(
        mut self,
        name: Option<String>,
        steps: &[ResolvedStep],
        mut on_event: F,
    ) -> ReplayReport
    where
        F: FnMut(&LifecycleEvent),
    {
        let client = TappedClient::new(ScriptedClient::from_steps(steps), self.engine.tap().clone());
        let mut events = Vec::new();
        for (index, step) in steps.iter().enumerate() {
            match step {
                ResolvedStep::Page {
                    url,
                    html,
                    notifications,
                } => {
                    self.engine.reader().load(url, html);
                    for _ in 0..*notifications {
                        for event in self.engine.on_page_changed() {
                            on_event(&event);
                            events.push(event);
                        }
                    }
                }
                ResolvedStep::Response { url, .. } => {
                    match client.execute(HttpRequest::get(url.clone())).await {
                        Ok(response) => {
                            debug!(index, %url, status = response.status, "response replayed")
                        }
                        Err(err) => warn!(index, %url, error = %err, "response replay failed"),
                    }
                }
            }
        }

        let report = ReplayReport {
            name,
            steps: steps.len(),
            passes: self.engine.passes(),
            captured_payloads: self.engine.tap().captured_count(),
            events,
            phase: self.engine.phase(),
            state: self.engine.state().clone(),
        };
        info!(
            steps = report.steps,
            passes = report.passes,
            events = report.events.len(),
            "trace replayed"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_steps_are_tagged_by_kind() {
        let yaml = r#"
name: sample
steps:
  - kind: page
    url: https://www.geoguessr.com/game/abc
    html: "<div class='game-layout'></div>"
    notifications: 3
  - kind: response
    url: https://www.geoguessr.com/api/v3/games/abc
    body: {token: abc, round: 1}
"#;
        let trace: Trace = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(trace.name.as_deref(), Some("sample"));
        let steps = trace.resolve(Path::new(".")).unwrap();
        assert_eq!(steps.len(), 2);
        match &steps[0] {
            ResolvedStep::Page { notifications, .. } => assert_eq!(*notifications, 3),
            other => panic!("unexpected step: {other:?}"),
        }
        match &steps[1] {
            ResolvedStep::Response { response, .. } => {
                assert_eq!(response.status, 200);
                let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
                assert_eq!(body["token"], "abc");
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn page_step_without_html_is_rejected() {
        let trace: Trace =
            serde_json::from_str(r#"{"steps":[{"kind":"page","url":"https://x/game/a"}]}"#)
                .unwrap();
        assert!(matches!(
            trace.resolve(Path::new(".")),
            Err(TraceError::InvalidStep { index: 0, .. })
        ));
    }

    #[tokio::test]
    async fn scripted_client_serves_in_order_then_fails() {
        let client = ScriptedClient::new();
        client.push("u", HttpResponse::new(200, b"one".to_vec()));
        client.push("u", HttpResponse::new(200, b"two".to_vec()));

        assert_eq!(client.execute(HttpRequest::get("u")).await.unwrap().body, b"one");
        assert_eq!(client.execute(HttpRequest::get("u")).await.unwrap().body, b"two");
        assert!(matches!(
            client.execute(HttpRequest::get("u")).await,
            Err(TapError::Transport(_))
        ));
    }
}
