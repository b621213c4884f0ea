// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared argument structs for CLI commands.
//!
//! These structs are used with `#[command(flatten)]` by the commands that
//! write course fields.

use clap::Args;
use serde_json::Value;

use sb_core::Fields;

/// Field assignments shared by `add` and `update`.
#[derive(Args, Clone, Debug, Default)]
pub struct FieldArgs {
    /// Course title
    #[arg(long, short, value_parser = super::non_empty_string)]
    pub title: Option<String>,

    /// Set a field (key=value, repeatable); JSON values are kept typed
    #[arg(long = "field", short = 'f', value_name = "KEY=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, Value)>,
}

impl FieldArgs {
    /// Collects the arguments into a field map. A `--title` wins over a
    /// `--field title=…`.
    pub fn into_fields(self) -> Fields {
        let mut fields: Fields = self.fields.into_iter().collect();
        if let Some(title) = self.title {
            fields.insert("title".to_string(), Value::String(title));
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.fields.is_empty()
    }
}

/// Parses `key=value`. The value is read as JSON when it parses as JSON
/// (`credits=3`, `tags=["a"]`), otherwise kept as a string.
pub(crate) fn parse_field(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("field name cannot be empty".to_string());
    }
    if key == "id" {
        return Err("'id' is assigned by the server".to_string());
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
