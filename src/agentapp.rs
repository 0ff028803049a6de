use anyhow::{Context, Result};
use eframe::egui;
use poll_promise::Promise;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::handoff::SceneHandoff;
use crate::llmclient::{api_key_from_env, ChatRequest, LLMClient, FAILURE_MARKER, OPENROUTER_URL};
use crate::mesh_viewer::MeshViewer;
use crate::request_gate::{RequestGate, Ticket};
use crate::settings::Settings;
use crate::task_kind::TaskKind;

pub const APP_TITLE: &str = "SimpleCASCADE";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Index of the settings page, after the task tabs.
pub const SETTINGS_TAB: usize = TaskKind::ALL.len();

pub fn build_client(settings: &Settings) -> LLMClient {
    LLMClient::new(OPENROUTER_URL, api_key_from_env(settings), APP_TITLE, REQUEST_TIMEOUT)
}

/// Runs on a worker thread; owns its runtime for the single call.
fn run_request(client: LLMClient, request: ChatRequest) -> String {
    match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt.block_on(client.ask(&request)),
        Err(e) => format!("{FAILURE_MARKER}Failed to start async runtime: {e}"),
    }
}

/// Prompt, reply and in-flight requests of one task tab.
pub struct TaskTab {
    pub kind: TaskKind,
    pub input: String,
    pub output: String,
    gate: RequestGate,
    pending: Vec<(Ticket, Promise<String>)>,
}

impl TaskTab {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            input: String::new(),
            output: String::new(),
            gate: RequestGate::default(),
            pending: Vec::new(),
        }
    }

    /// True while the most recent request has not answered yet.
    pub fn is_busy(&self) -> bool {
        self.pending.iter().any(|(ticket, _)| self.gate.is_current(*ticket))
    }

    pub fn build_request(&self, settings: &Settings) -> Option<ChatRequest> {
        let prompt = self.input.trim();
        if prompt.is_empty() {
            return None;
        }
        Some(
            ChatRequest::new(self.kind.wrap_prompt(prompt))
                .with_system_prompt(self.kind.system_prompt(settings)),
        )
    }

    /// Starts a request for the current input. Returns false for blank input.
    pub fn submit(&mut self, client: &LLMClient, settings: &Settings) -> bool {
        let Some(request) = self.build_request(settings) else {
            return false;
        };
        let client = client.clone();
        let promise = Promise::spawn_thread(format!("{:?}_request", self.kind), move || {
            run_request(client, request)
        });
        self.track(promise);
        true
    }

    fn track(&mut self, promise: Promise<String>) -> Ticket {
        let ticket = self.gate.issue();
        self.pending.push((ticket, promise));
        ticket
    }

    /// Collects finished requests. Only the latest one may update `output`;
    /// returns true when it did.
    pub fn poll(&mut self) -> bool {
        let gate = &self.gate;
        let mut delivered = None;
        self.pending.retain(|(ticket, promise)| match promise.ready() {
            Some(reply) => {
                if gate.is_current(*ticket) {
                    delivered = Some(reply.clone());
                } else {
                    tracing::debug!("discarding stale reply");
                }
                false
            }
            None => true,
        });

        match delivered {
            Some(reply) => {
                self.output = reply;
                true
            }
            None => false,
        }
    }
}

pub struct AgentApp {
    pub client: LLMClient,
    /// Values in effect for requests.
    pub settings: Settings,
    /// Values being edited on the settings page.
    pub settings_draft: Settings,
    pub settings_path: Option<PathBuf>,
    pub tabs: Vec<TaskTab>,
    pub viewer: MeshViewer,
    pub handoff: SceneHandoff,
    pub active_tab: usize,
}

impl AgentApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: Settings, settings_path: Option<PathBuf>) -> Self {
        Self::with_settings(settings, settings_path)
    }

    pub fn with_settings(settings: Settings, settings_path: Option<PathBuf>) -> Self {
        Self {
            client: build_client(&settings),
            settings_draft: settings.clone(),
            settings,
            settings_path,
            tabs: TaskKind::ALL.into_iter().map(TaskTab::new).collect(),
            viewer: MeshViewer::default(),
            handoff: SceneHandoff::beside_executable(),
            active_tab: 0,
        }
    }

    pub fn tab(&self, kind: TaskKind) -> &TaskTab {
        &self.tabs[Self::tab_index(kind)]
    }

    pub fn tab_mut(&mut self, kind: TaskKind) -> &mut TaskTab {
        &mut self.tabs[Self::tab_index(kind)]
    }

    fn tab_index(kind: TaskKind) -> usize {
        match kind {
            TaskKind::Text => 0,
            TaskKind::Code => 1,
            TaskKind::Mesh => 2,
        }
    }

    pub fn send(&mut self, kind: TaskKind) {
        let tab = &mut self.tabs[Self::tab_index(kind)];
        if tab.submit(&self.client, &self.settings) {
            tracing::info!("{} request sent", kind.tab_title());
        }
    }

    pub fn process_responses(&mut self, ctx: &egui::Context) {
        for tab in &mut self.tabs {
            if tab.poll() {
                if tab.kind == TaskKind::Mesh {
                    self.viewer.load_obj(&tab.output);
                }
                ctx.request_repaint();
            }
        }
    }

    pub fn mesh_text_edited(&mut self) {
        let text = &self.tabs[Self::tab_index(TaskKind::Mesh)].output;
        self.viewer.load_obj(text);
    }

    /// Persists the draft and makes it the active configuration.
    pub fn save_settings(&mut self) -> Result<()> {
        let path = self
            .settings_path
            .as_deref()
            .context("No configuration directory available")?;
        let mut draft = self.settings_draft.clone();
        draft.api_key = draft.api_key.trim().to_string();
        draft.save_to(path)?;

        self.settings_draft = draft.clone();
        self.settings = draft;
        self.client = build_client(&self.settings);
        Ok(())
    }

    pub fn reset_settings_draft(&mut self) {
        self.settings_draft.reset();
    }

    pub fn send_to_scene(&self) -> Result<()> {
        let text = self.tab(TaskKind::Mesh).output.trim();
        anyhow::ensure!(!text.is_empty(), "No data to insert");
        self.handoff.send(text)
    }
}

/// Writes a tab's output to a user-chosen file.
pub fn write_output(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("saved output to {}", path.display());
    Ok(())
}
