//! Shader IR produced by the content parser
//!
//! `Shader` → `SubShader`s → `Pass`es, each carrying opaque GLSL text
//! (`pending_contents`), render-state maps and tags. After merging, every
//! regular pass holds its complete body in `contents`, ready for code
//! generation. All nodes are serde-serializable for JSON export.

use super::render_state::RenderStates;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "\"{}\"", s),
            Self::Number(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

pub type Tags = BTreeMap<String, TagValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShaderSource {
    pub name: String,
    pub sub_shaders: Vec<SubShaderSource>,
    pub pending_contents: Vec<String>,
    pub render_states: RenderStates,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubShaderSource {
    pub name: String,
    pub passes: Vec<ShaderPassSource>,
    pub pending_contents: Vec<String>,
    pub render_states: RenderStates,
    pub tags: Tags,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShaderPassSource {
    pub name: String,
    pub vertex_entry: Option<String>,
    pub fragment_entry: Option<String>,
    pub pending_contents: Vec<String>,
    pub render_states: RenderStates,
    pub tags: Tags,
    /// Flattened body; set on regular passes once the shader is merged
    pub contents: Option<String>,
    /// `UsePass "Shader/SubShader/Pass"` reference; `name` holds the path
    pub is_use_pass: bool,
}

impl ShaderPassSource {
    pub fn use_pass(path: &str) -> Self {
        Self {
            name: path.to_string(),
            is_use_pass: true,
            ..Default::default()
        }
    }
}

impl ShaderSource {
    pub fn passes(&self) -> impl Iterator<Item = &ShaderPassSource> {
        self.sub_shaders.iter().flat_map(|sub| sub.passes.iter())
    }

    pub fn find_pass(&self, sub_shader: &str, pass: &str) -> Option<&ShaderPassSource> {
        self.sub_shaders
            .iter()
            .find(|sub| sub.name == sub_shader)?
            .passes
            .iter()
            .find(|p| p.name == pass)
    }
}

impl fmt::Display for ShaderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shader \"{}\"", self.name)?;
        for sub in &self.sub_shaders {
            writeln!(f, "  SubShader \"{}\"", sub.name)?;
            for (key, value) in &sub.tags {
                writeln!(f, "    tag {} = {}", key, value)?;
            }
            for pass in &sub.passes {
                if pass.is_use_pass {
                    writeln!(f, "    UsePass \"{}\"", pass.name)?;
                    continue;
                }
                writeln!(
                    f,
                    "    Pass \"{}\" (vertex: {}, fragment: {})",
                    pass.name,
                    pass.vertex_entry.as_deref().unwrap_or("-"),
                    pass.fragment_entry.as_deref().unwrap_or("-")
                )?;
                for (key, value) in &pass.tags {
                    writeln!(f, "      tag {} = {}", key, value)?;
                }
                for (key, value) in &pass.render_states.constant_map {
                    writeln!(f, "      {} = {:?}", key, value)?;
                }
                for (key, variable) in &pass.render_states.variable_map {
                    writeln!(f, "      {} = ${}", key, variable)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_pass() {
        let shader = ShaderSource {
            name: "S".to_string(),
            sub_shaders: vec![SubShaderSource {
                name: "Default".to_string(),
                passes: vec![
                    ShaderPassSource {
                        name: "Forward".to_string(),
                        ..Default::default()
                    },
                    ShaderPassSource::use_pass("Other/Default/Shadow"),
                ],
                ..Default::default()
            }],
            ..Default::default()
        };

        assert!(shader.find_pass("Default", "Forward").is_some());
        assert!(shader.find_pass("Default", "Missing").is_none());
        assert_eq!(shader.passes().filter(|p| p.is_use_pass).count(), 1);
        assert!(shader.to_string().contains("UsePass \"Other/Default/Shadow\""));
    }

    #[test]
    fn test_tag_values_serialize_untagged() {
        let mut tags = Tags::new();
        tags.insert("pipelineStage".to_string(), TagValue::String("Forward".to_string()));
        tags.insert("priority".to_string(), TagValue::Number(2.0));
        let json = serde_json::to_value(&tags).unwrap();
        assert_eq!(json["pipelineStage"], "Forward");
        assert_eq!(json["priority"], 2.0);
    }
}
