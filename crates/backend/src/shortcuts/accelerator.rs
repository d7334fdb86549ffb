//! Parsing and canonical formatting of key-combination strings such as
//! `CommandOrControl+Shift+S`.

use crate::types::BackendError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Modifier tokens, ordered the way they appear in canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    CommandOrControl,
    Super,
    Control,
    Alt,
    Shift,
}

impl Modifier {
    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "commandorcontrol" | "cmdorctrl" | "commandorctrl" | "cmdorcontrol" => {
                Some(Self::CommandOrControl)
            }
            "command" | "cmd" | "super" | "meta" => Some(Self::Super),
            "control" | "ctrl" => Some(Self::Control),
            "alt" | "option" => Some(Self::Alt),
            "shift" => Some(Self::Shift),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CommandOrControl => "CommandOrControl",
            Self::Super => "Super",
            Self::Control => "Control",
            Self::Alt => "Alt",
            Self::Shift => "Shift",
        }
    }
}

const NAMED_KEYS: &[(&[&str], &str)] = &[
    (&["space"], "Space"),
    (&["tab"], "Tab"),
    (&["enter", "return"], "Enter"),
    (&["escape", "esc"], "Escape"),
    (&["backspace"], "Backspace"),
    (&["delete", "del"], "Delete"),
    (&["insert"], "Insert"),
    (&["home"], "Home"),
    (&["end"], "End"),
    (&["pageup"], "PageUp"),
    (&["pagedown"], "PageDown"),
    (&["up", "arrowup"], "Up"),
    (&["down", "arrowdown"], "Down"),
    (&["left", "arrowleft"], "Left"),
    (&["right", "arrowright"], "Right"),
];

const PUNCTUATION: &str = "-=,./;'[]\\`";

fn canonical_key(token: &str) -> Option<String> {
    let mut chars = token.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphanumeric() {
            return Some(c.to_ascii_uppercase().to_string());
        }
        if PUNCTUATION.contains(c) {
            return Some(c.to_string());
        }
        return None;
    }

    let lower = token.to_ascii_lowercase();
    if let Some(number) = lower.strip_prefix('f') {
        if let Ok(n) = number.parse::<u8>() {
            return (1..=24).contains(&n).then(|| format!("F{n}"));
        }
    }

    NAMED_KEYS
        .iter()
        .find(|(aliases, _)| aliases.contains(&lower.as_str()))
        .map(|(_, name)| (*name).to_string())
}

/// A validated modifier+key combination.
///
/// Two accelerators compare equal when they describe the same keys, whatever
/// spelling or token order was used to write them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Accelerator {
    modifiers: BTreeSet<Modifier>,
    key: String,
}

impl Accelerator {
    pub fn modifiers(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.modifiers.iter().copied()
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl FromStr for Accelerator {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| BackendError::InvalidAccelerator(format!("{s:?}: {reason}"));

        let tokens: Vec<&str> = s.split('+').map(str::trim).collect();
        if tokens.iter().any(|t| t.is_empty()) {
            return Err(invalid("empty token"));
        }

        let (key_token, modifier_tokens) = tokens
            .split_last()
            .ok_or_else(|| invalid("missing key"))?;

        let mut modifiers = BTreeSet::new();
        for token in modifier_tokens {
            let modifier = Modifier::parse(token)
                .ok_or_else(|| invalid(&format!("unknown modifier {token:?}")))?;
            if !modifiers.insert(modifier) {
                return Err(invalid(&format!("duplicate modifier {token:?}")));
            }
        }

        if Modifier::parse(key_token).is_some() {
            return Err(invalid("missing key"));
        }
        let key = canonical_key(key_token)
            .ok_or_else(|| invalid(&format!("unknown key {key_token:?}")))?;

        if modifiers.is_empty() {
            return Err(invalid("a global shortcut needs at least one modifier"));
        }

        Ok(Self { modifiers, key })
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier.as_str())?;
        }
        f.write_str(&self.key)
    }
}

impl Serialize for Accelerator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Accelerator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
