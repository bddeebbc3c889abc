//! Grammar tables and the IR of the content language

pub mod engine_enums;
pub mod keywords;
pub mod nodes;
pub mod render_state;

pub use engine_enums::EngineEnumType;
pub use keywords::Keyword;
pub use nodes::{ShaderPassSource, ShaderSource, SubShaderSource, TagValue, Tags};
pub use render_state::{
    EnumValue, RenderStateElementKey, RenderStateType, RenderStateValue, RenderStates,
    StateProperty, ValueKind,
};
