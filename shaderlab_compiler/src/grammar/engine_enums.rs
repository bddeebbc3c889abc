//! Engine enum namespaces usable in render-state values
//!
//! `BlendFactor.SourceAlpha`, `CullMode.Back`, ... resolve to the integer
//! values the rendering engine expects.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EngineEnumType {
    BlendFactor,
    BlendOperation,
    ColorWriteMask,
    CompareFunction,
    CullMode,
    StencilOperation,
    RenderQueueType,
}

const BLEND_FACTOR: &[(&str, i32)] = &[
    ("Zero", 0),
    ("One", 1),
    ("SourceColor", 2),
    ("OneMinusSourceColor", 3),
    ("DestinationColor", 4),
    ("OneMinusDestinationColor", 5),
    ("SourceAlpha", 6),
    ("OneMinusSourceAlpha", 7),
    ("DestinationAlpha", 8),
    ("OneMinusDestinationAlpha", 9),
    ("SourceAlphaSaturate", 10),
    ("BlendColor", 11),
    ("OneMinusBlendColor", 12),
];

const BLEND_OPERATION: &[(&str, i32)] = &[
    ("Add", 0),
    ("Subtract", 1),
    ("ReverseSubtract", 2),
    ("Min", 3),
    ("Max", 4),
];

const COLOR_WRITE_MASK: &[(&str, i32)] = &[
    ("None", 0),
    ("Red", 1),
    ("Green", 2),
    ("Blue", 4),
    ("Alpha", 8),
    ("All", 15),
];

const COMPARE_FUNCTION: &[(&str, i32)] = &[
    ("Never", 0),
    ("Less", 1),
    ("Equal", 2),
    ("LessEqual", 3),
    ("Greater", 4),
    ("NotEqual", 5),
    ("GreaterEqual", 6),
    ("Always", 7),
];

const CULL_MODE: &[(&str, i32)] = &[("Off", 0), ("Front", 1), ("Back", 2)];

const STENCIL_OPERATION: &[(&str, i32)] = &[
    ("Keep", 0),
    ("Zero", 1),
    ("Replace", 2),
    ("IncrementSaturate", 3),
    ("DecrementSaturate", 4),
    ("Invert", 5),
    ("IncrementWrap", 6),
    ("DecrementWrap", 7),
];

const RENDER_QUEUE_TYPE: &[(&str, i32)] = &[
    ("Opaque", 1000),
    ("AlphaTest", 2450),
    ("Transparent", 3000),
];

impl EngineEnumType {
    pub const ALL: [EngineEnumType; 7] = [
        Self::BlendFactor,
        Self::BlendOperation,
        Self::ColorWriteMask,
        Self::CompareFunction,
        Self::CullMode,
        Self::StencilOperation,
        Self::RenderQueueType,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BlendFactor => "BlendFactor",
            Self::BlendOperation => "BlendOperation",
            Self::ColorWriteMask => "ColorWriteMask",
            Self::CompareFunction => "CompareFunction",
            Self::CullMode => "CullMode",
            Self::StencilOperation => "StencilOperation",
            Self::RenderQueueType => "RenderQueueType",
        }
    }

    pub fn from_str(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|ty| ty.as_str() == name)
    }

    pub fn members(self) -> &'static [(&'static str, i32)] {
        match self {
            Self::BlendFactor => BLEND_FACTOR,
            Self::BlendOperation => BLEND_OPERATION,
            Self::ColorWriteMask => COLOR_WRITE_MASK,
            Self::CompareFunction => COMPARE_FUNCTION,
            Self::CullMode => CULL_MODE,
            Self::StencilOperation => STENCIL_OPERATION,
            Self::RenderQueueType => RENDER_QUEUE_TYPE,
        }
    }

    pub fn member_value(self, member: &str) -> Option<i32> {
        self.members()
            .iter()
            .find(|(name, _)| *name == member)
            .map(|(_, value)| *value)
    }
}

impl std::fmt::Display for EngineEnumType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_values() {
        assert_eq!(
            EngineEnumType::BlendFactor.member_value("OneMinusSourceAlpha"),
            Some(7)
        );
        assert_eq!(EngineEnumType::ColorWriteMask.member_value("All"), Some(15));
        assert_eq!(EngineEnumType::CullMode.member_value("Back"), Some(2));
        assert_eq!(
            EngineEnumType::RenderQueueType.member_value("Transparent"),
            Some(3000)
        );
        assert_eq!(EngineEnumType::CullMode.member_value("Sideways"), None);
    }

    #[test]
    fn test_namespace_lookup() {
        assert_eq!(
            EngineEnumType::from_str("StencilOperation"),
            Some(EngineEnumType::StencilOperation)
        );
        assert_eq!(EngineEnumType::from_str("BlendMode"), None);
    }
}
