//! Render-state property table and value model
//!
//! Every assignable property is a `StateProperty`; together with a blend
//! target index it forms the `RenderStateElementKey` used in the IR maps.

use super::engine_enums::EngineEnumType;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RenderStateType {
    BlendState,
    DepthState,
    StencilState,
    RasterState,
}

impl RenderStateType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BlendState => "BlendState",
            Self::DepthState => "DepthState",
            Self::StencilState => "StencilState",
            Self::RasterState => "RasterState",
        }
    }
}

impl fmt::Display for RenderStateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of value a property (or a declared variable) holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Boolean,
    Number,
    Color,
    Enum(EngineEnumType),
}

impl ValueKind {
    /// Kind of a GLSL scalar/vector declaration usable as a render-state variable
    pub fn from_glsl_type(name: &str) -> Option<Self> {
        match name {
            "bool" => Some(Self::Boolean),
            "int" | "float" => Some(Self::Number),
            "vec4" => Some(Self::Color),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => f.write_str("bool"),
            Self::Number => f.write_str("number"),
            Self::Color => f.write_str("Color"),
            Self::Enum(ty) => write!(f, "{}", ty),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateProperty {
    // BlendState, per target
    BlendEnabled,
    BlendColorBlendOperation,
    BlendAlphaBlendOperation,
    BlendSourceColorBlendFactor,
    BlendDestinationColorBlendFactor,
    BlendSourceAlphaBlendFactor,
    BlendDestinationAlphaBlendFactor,
    BlendColorWriteMask,
    // BlendState, global
    BlendBlendColor,
    BlendAlphaToCoverage,

    DepthEnabled,
    DepthWriteEnabled,
    DepthCompareFunction,

    StencilEnabled,
    StencilReferenceValue,
    StencilMask,
    StencilWriteMask,
    StencilCompareFunctionFront,
    StencilCompareFunctionBack,
    StencilPassOperationFront,
    StencilPassOperationBack,
    StencilFailOperationFront,
    StencilFailOperationBack,
    StencilZFailOperationFront,
    StencilZFailOperationBack,

    RasterCullMode,
    RasterDepthBias,
    RasterSlopeScaledDepthBias,

    RenderQueueType,
}

/// (property, owning state, name inside the block, value kind)
const PROPERTY_TABLE: &[(StateProperty, Option<RenderStateType>, &str, ValueKind)] = {
    use EngineEnumType as E;
    use RenderStateType::*;
    use StateProperty as P;
    use ValueKind::*;
    &[
        (P::BlendEnabled, Some(BlendState), "Enabled", Boolean),
        (P::BlendColorBlendOperation, Some(BlendState), "ColorBlendOperation", Enum(E::BlendOperation)),
        (P::BlendAlphaBlendOperation, Some(BlendState), "AlphaBlendOperation", Enum(E::BlendOperation)),
        (P::BlendSourceColorBlendFactor, Some(BlendState), "SourceColorBlendFactor", Enum(E::BlendFactor)),
        (P::BlendDestinationColorBlendFactor, Some(BlendState), "DestinationColorBlendFactor", Enum(E::BlendFactor)),
        (P::BlendSourceAlphaBlendFactor, Some(BlendState), "SourceAlphaBlendFactor", Enum(E::BlendFactor)),
        (P::BlendDestinationAlphaBlendFactor, Some(BlendState), "DestinationAlphaBlendFactor", Enum(E::BlendFactor)),
        (P::BlendColorWriteMask, Some(BlendState), "ColorWriteMask", Enum(E::ColorWriteMask)),
        (P::BlendBlendColor, Some(BlendState), "BlendColor", Color),
        (P::BlendAlphaToCoverage, Some(BlendState), "AlphaToCoverage", Boolean),
        (P::DepthEnabled, Some(DepthState), "Enabled", Boolean),
        (P::DepthWriteEnabled, Some(DepthState), "WriteEnabled", Boolean),
        (P::DepthCompareFunction, Some(DepthState), "CompareFunction", Enum(E::CompareFunction)),
        (P::StencilEnabled, Some(StencilState), "Enabled", Boolean),
        (P::StencilReferenceValue, Some(StencilState), "ReferenceValue", Number),
        (P::StencilMask, Some(StencilState), "Mask", Number),
        (P::StencilWriteMask, Some(StencilState), "WriteMask", Number),
        (P::StencilCompareFunctionFront, Some(StencilState), "CompareFunctionFront", Enum(E::CompareFunction)),
        (P::StencilCompareFunctionBack, Some(StencilState), "CompareFunctionBack", Enum(E::CompareFunction)),
        (P::StencilPassOperationFront, Some(StencilState), "PassOperationFront", Enum(E::StencilOperation)),
        (P::StencilPassOperationBack, Some(StencilState), "PassOperationBack", Enum(E::StencilOperation)),
        (P::StencilFailOperationFront, Some(StencilState), "FailOperationFront", Enum(E::StencilOperation)),
        (P::StencilFailOperationBack, Some(StencilState), "FailOperationBack", Enum(E::StencilOperation)),
        (P::StencilZFailOperationFront, Some(StencilState), "ZFailOperationFront", Enum(E::StencilOperation)),
        (P::StencilZFailOperationBack, Some(StencilState), "ZFailOperationBack", Enum(E::StencilOperation)),
        (P::RasterCullMode, Some(RasterState), "CullMode", Enum(E::CullMode)),
        (P::RasterDepthBias, Some(RasterState), "DepthBias", Number),
        (P::RasterSlopeScaledDepthBias, Some(RasterState), "SlopeScaledDepthBias", Number),
        (P::RenderQueueType, None, "RenderQueueType", Enum(E::RenderQueueType)),
    ]
};

impl StateProperty {
    fn entry(self) -> (Option<RenderStateType>, &'static str, ValueKind) {
        PROPERTY_TABLE
            .iter()
            .find(|(property, ..)| *property == self)
            .map(|(_, state, name, kind)| (*state, *name, *kind))
            .unwrap_or((None, "RenderQueueType", ValueKind::Enum(EngineEnumType::RenderQueueType)))
    }

    /// Property `name` inside a `state` block
    pub fn lookup(state: RenderStateType, name: &str) -> Option<Self> {
        PROPERTY_TABLE
            .iter()
            .find(|(_, owner, prop_name, _)| *owner == Some(state) && *prop_name == name)
            .map(|(property, ..)| *property)
    }

    pub fn state_type(self) -> Option<RenderStateType> {
        self.entry().0
    }

    /// Name as written inside the block (`Enabled`, `CullMode`, ...)
    pub fn name(self) -> &'static str {
        self.entry().1
    }

    pub fn value_kind(self) -> ValueKind {
        self.entry().2
    }

    /// Whether the property takes a blend target index `[n]`
    pub fn is_indexed(self) -> bool {
        matches!(
            self,
            Self::BlendEnabled
                | Self::BlendColorBlendOperation
                | Self::BlendAlphaBlendOperation
                | Self::BlendSourceColorBlendFactor
                | Self::BlendDestinationColorBlendFactor
                | Self::BlendSourceAlphaBlendFactor
                | Self::BlendDestinationAlphaBlendFactor
                | Self::BlendColorWriteMask
        )
    }

    /// `BlendStateEnabled`, `RasterStateCullMode`, `RenderQueueType`
    pub fn qualified_name(self) -> String {
        match self.state_type() {
            Some(state) => format!("{}{}", state.as_str(), self.name()),
            None => self.name().to_string(),
        }
    }

    fn from_qualified_name(name: &str) -> Option<Self> {
        PROPERTY_TABLE
            .iter()
            .map(|(property, ..)| *property)
            .find(|property| property.qualified_name() == name)
    }
}

/// Map key: a property plus its blend target (0 for everything non-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderStateElementKey {
    pub property: StateProperty,
    pub index: u8,
}

impl RenderStateElementKey {
    pub fn new(property: StateProperty) -> Self {
        Self { property, index: 0 }
    }

    pub fn indexed(property: StateProperty, index: u8) -> Self {
        Self { property, index }
    }
}

impl fmt::Display for RenderStateElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.property.is_indexed() {
            write!(f, "{}{}", self.property.qualified_name(), self.index)
        } else {
            f.write_str(&self.property.qualified_name())
        }
    }
}

impl FromStr for RenderStateElementKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim_end_matches(|c: char| c.is_ascii_digit());
        let property = StateProperty::from_qualified_name(name)
            .ok_or_else(|| format!("unknown render state key '{}'", s))?;

        let digits = &s[name.len()..];
        if property.is_indexed() {
            let index = digits
                .parse()
                .map_err(|_| format!("render state key '{}' needs a target index", s))?;
            Ok(Self::indexed(property, index))
        } else if digits.is_empty() {
            Ok(Self::new(property))
        } else {
            Err(format!("render state key '{}' takes no index", s))
        }
    }
}

// String form so the key can be a JSON object key
impl Serialize for RenderStateElementKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RenderStateElementKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub enum_type: EngineEnumType,
    pub member: String,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderStateValue {
    Number(f64),
    Boolean(bool),
    Color([f32; 4]),
    Enum(EnumValue),
}

impl RenderStateValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Number(_) => ValueKind::Number,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Color(_) => ValueKind::Color,
            Self::Enum(e) => ValueKind::Enum(e.enum_type),
        }
    }
}

/// Constant values and variable references of one node. A key lives in at
/// most one of the two maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderStates {
    pub constant_map: BTreeMap<RenderStateElementKey, RenderStateValue>,
    pub variable_map: BTreeMap<RenderStateElementKey, String>,
}

impl RenderStates {
    pub fn is_empty(&self) -> bool {
        self.constant_map.is_empty() && self.variable_map.is_empty()
    }

    pub fn set_constant(&mut self, key: RenderStateElementKey, value: RenderStateValue) {
        self.variable_map.remove(&key);
        self.constant_map.insert(key, value);
    }

    pub fn set_variable(&mut self, key: RenderStateElementKey, variable: String) {
        self.constant_map.remove(&key);
        self.variable_map.insert(key, variable);
    }

    /// Apply `child` on top of `self`; child entries win
    pub fn overlay(&mut self, child: &RenderStates) {
        for (key, value) in &child.constant_map {
            self.set_constant(*key, value.clone());
        }
        for (key, variable) in &child.variable_map {
            self.set_variable(*key, variable.clone());
        }
    }

    pub fn overlaid(parent: &RenderStates, child: &RenderStates) -> RenderStates {
        let mut merged = parent.clone();
        merged.overlay(child);
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_lookup_per_state() {
        assert_eq!(
            StateProperty::lookup(RenderStateType::DepthState, "Enabled"),
            Some(StateProperty::DepthEnabled)
        );
        assert_eq!(
            StateProperty::lookup(RenderStateType::BlendState, "Enabled"),
            Some(StateProperty::BlendEnabled)
        );
        assert_eq!(StateProperty::lookup(RenderStateType::RasterState, "Enabled"), None);
        assert_eq!(
            StateProperty::StencilZFailOperationBack.value_kind(),
            ValueKind::Enum(EngineEnumType::StencilOperation)
        );
    }

    #[test]
    fn test_key_display_and_parse() {
        let key = RenderStateElementKey::indexed(StateProperty::BlendEnabled, 3);
        assert_eq!(key.to_string(), "BlendStateEnabled3");
        assert_eq!("BlendStateEnabled3".parse::<RenderStateElementKey>(), Ok(key));

        let cull = RenderStateElementKey::new(StateProperty::RasterCullMode);
        assert_eq!(cull.to_string(), "RasterStateCullMode");
        assert_eq!("RasterStateCullMode".parse::<RenderStateElementKey>(), Ok(cull));

        assert!("RasterStateCullMode1".parse::<RenderStateElementKey>().is_err());
        assert!("BlendStateEnabled".parse::<RenderStateElementKey>().is_err());
        assert!("Nonsense".parse::<RenderStateElementKey>().is_err());
    }

    #[test]
    fn test_keys_serialize_as_json_object_keys() {
        let mut states = RenderStates::default();
        states.set_constant(
            RenderStateElementKey::indexed(StateProperty::BlendEnabled, 0),
            RenderStateValue::Boolean(true),
        );
        let json = serde_json::to_value(&states).unwrap();
        assert_eq!(json["constant_map"]["BlendStateEnabled0"]["Boolean"], true);
    }

    #[test]
    fn test_overlay_moves_key_between_maps() {
        let key = RenderStateElementKey::new(StateProperty::RenderQueueType);
        let mut parent = RenderStates::default();
        parent.set_variable(key, "queue".to_string());

        let mut child = RenderStates::default();
        child.set_constant(
            key,
            RenderStateValue::Enum(EnumValue {
                enum_type: EngineEnumType::RenderQueueType,
                member: "Opaque".to_string(),
                value: 1000,
            }),
        );

        let merged = RenderStates::overlaid(&parent, &child);
        assert!(merged.variable_map.is_empty());
        assert_eq!(merged.constant_map.len(), 1);

        // Parent-only keys survive
        let mut other = RenderStates::default();
        other.set_constant(
            RenderStateElementKey::new(StateProperty::DepthEnabled),
            RenderStateValue::Boolean(false),
        );
        let merged = RenderStates::overlaid(&other, &child);
        assert_eq!(merged.constant_map.len(), 2);
    }

    #[test]
    fn test_glsl_type_kinds() {
        assert_eq!(ValueKind::from_glsl_type("float"), Some(ValueKind::Number));
        assert_eq!(ValueKind::from_glsl_type("vec4"), Some(ValueKind::Color));
        assert_eq!(ValueKind::from_glsl_type("mat4"), None);
    }
}
