//! Command line construction for the external dump, restore and archive tools.
//!
//! Options are kept as an ordered list of [`CommandArg`] so that flags are
//! emitted exactly in the order they were configured. Values are not escaped:
//! the rendered command is handed to a shell, callers must only supply
//! trusted values.

use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use derive_more::{Display, From};
use itertools::Itertools;
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt::Formatter;
use std::result;

/// Flag that is rendered as `--archive=<value>` for single file archive mode.
static ASSIGNED_FLAG: &str = "archive";

/// One token group of a command line.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum CommandArg {
    /// `--name value`
    #[display("{}", render_string_flag(name, value))]
    StringFlag { name: String, value: String },
    /// `--name`
    #[display("--{_0}")]
    ToggleFlag(String),
    /// Positional token emitted verbatim.
    #[display("{_0}")]
    RawToken(String),
}

fn render_string_flag(name: &str, value: &str) -> String {
    if name == ASSIGNED_FLAG {
        format!("--{name}={value}")
    } else {
        format!("--{name} {value}")
    }
}

impl CommandArg {
    pub fn flag<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        CommandArg::StringFlag {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn toggle<N: Into<String>>(name: N) -> Self {
        CommandArg::ToggleFlag(name.into())
    }

    pub fn raw<V: Into<String>>(value: V) -> Self {
        CommandArg::RawToken(value.into())
    }

    fn flag_name(&self) -> Option<&str> {
        match self {
            CommandArg::StringFlag { name, .. } | CommandArg::ToggleFlag(name) => Some(name),
            CommandArg::RawToken(_) => None,
        }
    }
}

/// Ordered option set passed to an external tool.
///
/// Deserializes from a map: a string value becomes `--key value`, `true`
/// becomes `--key`, and `false` keeps the key itself as a positional token.
#[derive(Clone, Debug, Default, PartialEq, Eq, From)]
pub struct BackupOptions {
    args: Vec<CommandArg>,
}

impl BackupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a YAML (or JSON) mapping, reporting anything else as invalid options.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        serde_yml::from_str(s).map_err(|e| Error::InvalidOptions(e.to_string()))
    }

    pub fn push(&mut self, arg: CommandArg) -> &mut Self {
        self.args.push(arg);
        self
    }

    pub fn with(mut self, arg: CommandArg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn contains_flag(&self, name: &str) -> bool {
        self.args.iter().any(|a| a.flag_name() == Some(name))
    }

    pub fn args(&self) -> &[CommandArg] {
        &self.args
    }
}

impl FromIterator<CommandArg> for BackupOptions {
    fn from_iter<T: IntoIterator<Item = CommandArg>>(iter: T) -> Self {
        iter.into_iter().collect_vec().into()
    }
}

/// Renders `binary` followed by every option, space separated.
pub fn build(options: &BackupOptions, binary: &str) -> Result<String> {
    if binary.trim().is_empty() {
        return Err(Error::InvalidOptions("binary name must not be empty".into()));
    }
    if let Some(arg) = options
        .args
        .iter()
        .find(|a| a.flag_name().is_some_and(|n| n.trim().is_empty()))
    {
        return Err(Error::InvalidOptions(format!(
            "flag name must not be empty in {arg:?}"
        )));
    }

    Ok(std::iter::once(binary.to_string())
        .chain(options.args.iter().map(CommandArg::to_string))
        .join(" "))
}

struct BackupOptionsVisitor;

impl<'de> Visitor<'de> for BackupOptionsVisitor {
    type Value = BackupOptions;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a map of flag names to string or boolean values")
    }

    fn visit_unit<E: serde::de::Error>(self) -> result::Result<Self::Value, E> {
        Ok(BackupOptions::default())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, _seq: A) -> result::Result<Self::Value, A::Error> {
        Err(serde::de::Error::custom(
            "options parameter must be a map, not a sequence",
        ))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> result::Result<Self::Value, A::Error> {
        let mut args = Vec::new();
        while let Some((name, value)) = map.next_entry::<String, OptionValue>()? {
            args.push(match value {
                OptionValue::Text(value) => CommandArg::StringFlag { name, value },
                OptionValue::Toggle(true) => CommandArg::ToggleFlag(name),
                OptionValue::Toggle(false) => CommandArg::RawToken(name),
            });
        }
        Ok(args.into())
    }
}

impl<'de> Deserialize<'de> for BackupOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> result::Result<Self, D::Error> {
        deserializer.deserialize_any(BackupOptionsVisitor)
    }
}

enum OptionValue {
    Text(String),
    Toggle(bool),
}

struct OptionValueVisitor;

impl Visitor<'_> for OptionValueVisitor {
    type Value = OptionValue;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a string, number or boolean")
    }

    fn visit_bool<E: serde::de::Error>(self, v: bool) -> result::Result<Self::Value, E> {
        Ok(OptionValue::Toggle(v))
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> result::Result<Self::Value, E> {
        Ok(OptionValue::Text(v.to_string()))
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> result::Result<Self::Value, E> {
        Ok(OptionValue::Text(v.to_string()))
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> result::Result<Self::Value, E> {
        Ok(OptionValue::Text(v.to_string()))
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> result::Result<Self::Value, E> {
        Ok(OptionValue::Text(v.to_string()))
    }
}

impl<'de> Deserialize<'de> for OptionValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> result::Result<Self, D::Error> {
        deserializer.deserialize_any(OptionValueVisitor)
    }
}
