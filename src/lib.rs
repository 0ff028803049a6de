pub mod agentapp;
mod agentapp_ui;
pub mod handoff;
pub mod ide_completion;
pub mod llmclient;
pub mod mesh;
pub mod mesh_viewer;
pub mod request_gate;
pub mod settings;
pub mod task_kind;
