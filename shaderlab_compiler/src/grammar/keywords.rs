//! Structural keywords of the shader-lab content language
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    // === BLOCKS ===
    Shader,
    SubShader,
    Pass,
    Tags,
    UsePass,

    // === RENDER STATES ===
    BlendState,
    DepthState,
    RasterState,
    StencilState,
    RenderQueueType,

    // === ENTRY POINTS ===
    VertexShader,
    FragmentShader,

    // === EDITOR-ONLY BLOCKS ===
    EditorProperties,
    EditorMacros,
    Editor,

    // === LITERALS ===
    True,
    False,
}

impl Keyword {
    pub const ALL: [Keyword; 17] = [
        Self::Shader,
        Self::SubShader,
        Self::Pass,
        Self::Tags,
        Self::UsePass,
        Self::BlendState,
        Self::DepthState,
        Self::RasterState,
        Self::StencilState,
        Self::RenderQueueType,
        Self::VertexShader,
        Self::FragmentShader,
        Self::EditorProperties,
        Self::EditorMacros,
        Self::Editor,
        Self::True,
        Self::False,
    ];

    /// Exact spelling in source
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shader => "Shader",
            Self::SubShader => "SubShader",
            Self::Pass => "Pass",
            Self::Tags => "Tags",
            Self::UsePass => "UsePass",
            Self::BlendState => "BlendState",
            Self::DepthState => "DepthState",
            Self::RasterState => "RasterState",
            Self::StencilState => "StencilState",
            Self::RenderQueueType => "RenderQueueType",
            Self::VertexShader => "VertexShader",
            Self::FragmentShader => "FragmentShader",
            Self::EditorProperties => "EditorProperties",
            Self::EditorMacros => "EditorMacros",
            Self::Editor => "Editor",
            Self::True => "true",
            Self::False => "false",
        }
    }

    /// Case-sensitive lookup
    pub fn from_str(word: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kw| kw.as_str() == word)
    }

    /// Keywords that open a nested structural construct. Opaque statement
    /// scanning never runs past one of these.
    pub const fn is_structural(self) -> bool {
        matches!(
            self,
            Self::SubShader
                | Self::Pass
                | Self::Tags
                | Self::UsePass
                | Self::BlendState
                | Self::DepthState
                | Self::RasterState
                | Self::StencilState
                | Self::RenderQueueType
                | Self::VertexShader
                | Self::FragmentShader
                | Self::EditorProperties
                | Self::EditorMacros
                | Self::Editor
        )
    }

    pub const fn is_editor_block(self) -> bool {
        matches!(
            self,
            Self::EditorProperties | Self::EditorMacros | Self::Editor
        )
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_round_trip_spelling() {
        for kw in Keyword::ALL {
            assert_eq!(Keyword::from_str(kw.as_str()), Some(kw));
        }
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(Keyword::from_str("pass"), None);
        assert_eq!(Keyword::from_str("True"), None);
        assert_eq!(Keyword::from_str("true"), Some(Keyword::True));
    }

    #[test]
    fn test_structural_classification() {
        assert!(Keyword::Pass.is_structural());
        assert!(Keyword::BlendState.is_structural());
        assert!(!Keyword::Shader.is_structural());
        assert!(!Keyword::True.is_structural());
        assert!(Keyword::EditorMacros.is_editor_block());
    }
}
