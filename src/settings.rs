use serde::Serialize;
use thiserror::Error;

/// A value a UI control can write back into a system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum SettingValue {
    Number(f32),
    Flag(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SettingBounds {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

/// Descriptor for one tunable parameter, as advertised to the UI.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Setting {
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub value: SettingValue,
    pub bounds: Option<SettingBounds>,
}

impl Setting {
    pub fn number(
        name: &'static str,
        label: &'static str,
        value: f32,
        (min, max, step): (f32, f32, f32),
        description: &'static str,
    ) -> Self {
        Self {
            name,
            label,
            description,
            value: SettingValue::Number(value),
            bounds: Some(SettingBounds { min, max, step }),
        }
    }

    pub fn flag(
        name: &'static str,
        label: &'static str,
        value: bool,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            label,
            description,
            value: SettingValue::Flag(value),
            bounds: None,
        }
    }

    /// Clamp an incoming numeric value into this setting's bounds.
    pub fn clamp_number(&self, value: f32) -> f32 {
        match self.bounds {
            Some(b) => value.clamp(b.min, b.max),
            None => value,
        }
    }
}

/// All settings belonging to one system.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SettingsGroup {
    pub group: &'static str,
    pub settings: Vec<Setting>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("unknown settings group `{0}`")]
    UnknownGroup(String),
    #[error("unknown setting `{name}` in group `{group}`")]
    UnknownSetting { group: &'static str, name: String },
    #[error("setting `{name}` expects a {expected} value")]
    WrongType {
        name: String,
        expected: &'static str,
    },
}

impl SettingsError {
    pub fn unknown(group: &'static str, name: &str) -> Self {
        Self::UnknownSetting {
            group,
            name: name.to_string(),
        }
    }
}

/// Plain configuration that can describe and update itself from UI values.
pub trait Configurable {
    fn settings_group(&self) -> &'static str;

    fn settings(&self) -> Vec<Setting>;

    fn apply_setting(&mut self, name: &str, value: SettingValue) -> Result<(), SettingsError>;

    fn describe(&self) -> SettingsGroup {
        SettingsGroup {
            group: self.settings_group(),
            settings: self.settings(),
        }
    }
}

/// Look up `name` among `settings` and return the bounded number for it.
pub(crate) fn expect_number(
    group: &'static str,
    settings: &[Setting],
    name: &str,
    value: SettingValue,
) -> Result<f32, SettingsError> {
    let setting = settings
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| SettingsError::unknown(group, name))?;
    match value {
        SettingValue::Number(v) if matches!(setting.value, SettingValue::Number(_)) => {
            Ok(setting.clamp_number(v))
        }
        _ => Err(SettingsError::WrongType {
            name: name.to_string(),
            expected: "numeric",
        }),
    }
}

pub(crate) fn expect_flag(name: &str, value: SettingValue) -> Result<bool, SettingsError> {
    match value {
        SettingValue::Flag(v) => Ok(v),
        SettingValue::Number(_) => Err(SettingsError::WrongType {
            name: name.to_string(),
            expected: "boolean",
        }),
    }
}
