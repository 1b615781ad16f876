//! Parameter table shared by every plugin variant.
//!
//! The plugin owns a [`ParamTable`] and delegates generic behaviour to it:
//! lookup by host index, type checking, default values, edge detection for
//! event parameters, and display formatting.

use std::fmt;

use crate::error::PluginError;
use crate::types::Variant;

/// Longest display string handed back to a host.
pub const DISPLAY_WIDTH: usize = 4;

/// Parameters exposed by the light brush, indexed the way hosts address them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    Threshold,
    Darkening,
    Clear,
}

impl ParamId {
    pub const ALL: [ParamId; 3] = [ParamId::Threshold, ParamId::Darkening, ParamId::Clear];

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u32 {
        match self {
            ParamId::Threshold => 0,
            ParamId::Darkening => 1,
            ParamId::Clear => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ParamId::Threshold => "Threshold",
            ParamId::Darkening => "Darkening",
            ParamId::Clear => "Clear",
        }
    }
}

/// How a host should treat a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Continuous scalar, nominally in `[0, 1]`.
    Standard,
    /// Momentary trigger; only a rising edge has an effect.
    Event,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Standard => f.write_str("float"),
            ParamKind::Event => f.write_str("boolean"),
        }
    }
}

/// A parameter value carrying its own type.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Bool(bool),
    Text(String),
}

impl ParamValue {
    pub fn as_float(&self) -> Option<f32> {
        match self {
            ParamValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Interprets the value as a trigger; non-zero floats count as set.
    pub fn as_trigger(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(value) => Some(*value),
            ParamValue::Float(value) => Some(*value != 0.0),
            ParamValue::Text(_) => None,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Static description of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub index: u32,
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: ParamValue,
}

/// Outcome of a successful [`ParamTable::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamChange {
    Stored,
    /// An event parameter moved into its triggered state.
    Fired,
    /// An event parameter was written without a rising edge.
    Idle,
}

#[derive(Debug, Clone)]
struct ParamEntry {
    info: ParamInfo,
    value: ParamValue,
}

/// Parameter storage with host-index lookup and type checking.
#[derive(Debug, Clone)]
pub struct ParamTable {
    entries: Vec<ParamEntry>,
}

impl ParamTable {
    pub fn new(infos: Vec<ParamInfo>) -> Self {
        let entries = infos
            .into_iter()
            .map(|info| ParamEntry {
                value: info.default.clone(),
                info,
            })
            .collect();
        Self { entries }
    }

    /// Threshold, darkening, and clear with the variant's defaults.
    pub fn for_variant(variant: Variant) -> Self {
        Self::new(vec![
            ParamInfo {
                index: ParamId::Threshold.index(),
                name: ParamId::Threshold.name(),
                kind: ParamKind::Standard,
                default: ParamValue::Float(variant.default_threshold()),
            },
            ParamInfo {
                index: ParamId::Darkening.index(),
                name: ParamId::Darkening.name(),
                kind: ParamKind::Standard,
                default: ParamValue::Float(variant.default_darkening()),
            },
            ParamInfo {
                index: ParamId::Clear.index(),
                name: ParamId::Clear.name(),
                kind: ParamKind::Event,
                default: ParamValue::Bool(false),
            },
        ])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn infos(&self) -> impl Iterator<Item = &ParamInfo> {
        self.entries.iter().map(|entry| &entry.info)
    }

    pub fn info(&self, index: u32) -> Result<&ParamInfo, PluginError> {
        self.entry(index).map(|entry| &entry.info)
    }

    pub fn get(&self, index: u32) -> Result<ParamValue, PluginError> {
        self.entry(index).map(|entry| entry.value.clone())
    }

    /// Stores `value` after checking it against the parameter's kind.
    ///
    /// Range is never checked; out-of-range floats are the host's business.
    pub fn set(&mut self, index: u32, value: ParamValue) -> Result<ParamChange, PluginError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.info.index == index)
            .ok_or(PluginError::UnknownParameter(index))?;
        let (name, expected) = (entry.info.name, entry.info.kind);
        let type_error = move || PluginError::ParameterType { name, expected };

        match entry.info.kind {
            ParamKind::Standard => {
                let value = value.as_float().ok_or_else(type_error)?;
                entry.value = ParamValue::Float(value);
                Ok(ParamChange::Stored)
            }
            ParamKind::Event => {
                let triggered = value.as_trigger().ok_or_else(type_error)?;
                let was_triggered = matches!(entry.value, ParamValue::Bool(true));
                entry.value = ParamValue::Bool(triggered);
                if triggered && !was_triggered {
                    Ok(ParamChange::Fired)
                } else {
                    Ok(ParamChange::Idle)
                }
            }
        }
    }

    /// Current value of a float parameter, falling back to zero for other kinds.
    pub fn float(&self, id: ParamId) -> f32 {
        self.entry(id.index())
            .ok()
            .and_then(|entry| entry.value.as_float())
            .unwrap_or_default()
    }

    pub fn display(&self, index: u32) -> Result<String, PluginError> {
        self.entry(index).map(|entry| format_display(&entry.value))
    }

    fn entry(&self, index: u32) -> Result<&ParamEntry, PluginError> {
        self.entries
            .iter()
            .find(|entry| entry.info.index == index)
            .ok_or(PluginError::UnknownParameter(index))
    }
}

/// Short host-facing rendering of a value, at most [`DISPLAY_WIDTH`] characters.
///
/// Event parameters render their last written state as `on` or `off`.
pub fn format_display(value: &ParamValue) -> String {
    let full = match value {
        ParamValue::Float(value) => value.to_string(),
        ParamValue::Bool(true) => "on".to_string(),
        ParamValue::Bool(false) => "off".to_string(),
        ParamValue::Text(text) => text.clone(),
    };
    full.chars().take(DISPLAY_WIDTH).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_variant() {
        let table = ParamTable::for_variant(Variant::Simple);
        assert_eq!(table.get(0).unwrap(), ParamValue::Float(0.5));
        assert_eq!(table.get(1).unwrap(), ParamValue::Float(0.5));
        assert_eq!(table.get(2).unwrap(), ParamValue::Bool(false));

        let table = ParamTable::for_variant(Variant::Advanced);
        assert_eq!(table.float(ParamId::Threshold), 0.95);
        assert_eq!(table.float(ParamId::Darkening), 0.95);
    }

    #[test]
    fn unknown_index_is_rejected_without_mutation() {
        let mut table = ParamTable::for_variant(Variant::Simple);
        let err = table.set(7, ParamValue::Float(0.1)).unwrap_err();
        assert!(matches!(err, PluginError::UnknownParameter(7)));
        assert!(matches!(table.get(3), Err(PluginError::UnknownParameter(3))));
        assert_eq!(table.float(ParamId::Threshold), 0.5);
    }

    #[test]
    fn out_of_range_floats_are_accepted() {
        let mut table = ParamTable::for_variant(Variant::Simple);
        assert_eq!(
            table.set(0, ParamValue::Float(1.7)).unwrap(),
            ParamChange::Stored
        );
        assert_eq!(table.float(ParamId::Threshold), 1.7);
        table.set(1, ParamValue::Float(-0.5)).unwrap();
        assert_eq!(table.float(ParamId::Darkening), -0.5);
    }

    #[test]
    fn wrong_type_fails_and_keeps_value() {
        let mut table = ParamTable::for_variant(Variant::Simple);
        let err = table.set(0, ParamValue::Bool(true)).unwrap_err();
        assert!(matches!(
            err,
            PluginError::ParameterType {
                expected: ParamKind::Standard,
                ..
            }
        ));
        assert!(table.set(2, ParamValue::Text("now".into())).is_err());
        assert_eq!(table.float(ParamId::Threshold), 0.5);
    }

    #[test]
    fn clear_fires_only_on_rising_edge() {
        let mut table = ParamTable::for_variant(Variant::Advanced);
        assert_eq!(table.set(2, true.into()).unwrap(), ParamChange::Fired);
        assert_eq!(table.set(2, true.into()).unwrap(), ParamChange::Idle);
        assert_eq!(table.set(2, ParamValue::Float(0.0)).unwrap(), ParamChange::Idle);
        assert_eq!(table.set(2, ParamValue::Float(1.0)).unwrap(), ParamChange::Fired);
        assert_eq!(table.get(2).unwrap(), ParamValue::Bool(true));
    }

    #[test]
    fn display_is_bounded() {
        assert_eq!(format_display(&ParamValue::Float(0.95)), "0.95");
        assert_eq!(format_display(&ParamValue::Float(0.123456)), "0.12");
        assert_eq!(format_display(&ParamValue::Float(0.5)), "0.5");
        assert_eq!(format_display(&ParamValue::Float(-0.75)), "-0.7");
        assert_eq!(format_display(&ParamValue::Bool(false)), "off");
        assert_eq!(format_display(&ParamValue::Text("trail".into())), "trai");

        let mut table = ParamTable::for_variant(Variant::Advanced);
        assert_eq!(table.display(2).unwrap(), "off");
        table.set(2, true.into()).unwrap();
        assert_eq!(table.display(2).unwrap(), "on");
    }
}
