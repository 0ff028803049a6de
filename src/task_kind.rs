use crate::settings::Settings;

const TEXT_EXTENSIONS: &[&str] = &["txt"];
const CODE_EXTENSIONS: &[&str] = &["hpp", "cpp"];
const MESH_EXTENSIONS: &[&str] = &["obj"];

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum TaskKind {
    Text,
    Code,
    Mesh,
}

impl TaskKind {
    pub const ALL: [TaskKind; 3] = [TaskKind::Text, TaskKind::Code, TaskKind::Mesh];

    pub fn tab_title(&self) -> &'static str {
        match self {
            TaskKind::Text => "Text",
            TaskKind::Code => "Code",
            TaskKind::Mesh => "3D Model",
        }
    }

    pub fn send_label(&self) -> &'static str {
        match self {
            TaskKind::Text => "Ask",
            TaskKind::Code => "Generate",
            TaskKind::Mesh => "Generate OBJ",
        }
    }

    pub fn busy_label(&self) -> &'static str {
        "Generating..."
    }

    pub fn input_hint(&self) -> &'static str {
        match self {
            TaskKind::Text => "Ask the AI a question...",
            TaskKind::Code => "Describe the code you need...",
            TaskKind::Mesh => "Describe a 3D object...",
        }
    }

    pub fn system_prompt<'a>(&self, settings: &'a Settings) -> &'a str {
        match self {
            TaskKind::Text => &settings.text_prompt,
            TaskKind::Code => &settings.code_prompt,
            TaskKind::Mesh => &settings.mesh_prompt,
        }
    }

    /// The user message actually sent for `prompt`.
    pub fn wrap_prompt(&self, prompt: &str) -> String {
        match self {
            TaskKind::Text => prompt.to_string(),
            TaskKind::Code => {
                format!("Generate C++ code. Code only, no explanations.\n{}", prompt)
            }
            TaskKind::Mesh => format!(
                "Generate a 3D model in Wavefront OBJ format.\nDescription: {}\nOutput ONLY OBJ code: v, f, vn. No comments.",
                prompt
            ),
        }
    }

    /// Save dialog filter name and extensions.
    pub fn save_filter(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            TaskKind::Text => ("Text Files", TEXT_EXTENSIONS),
            TaskKind::Code => ("C++ Files", CODE_EXTENSIONS),
            TaskKind::Mesh => ("OBJ Files", MESH_EXTENSIONS),
        }
    }
}
