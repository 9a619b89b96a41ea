use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Mouse button pressed at a recorded position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl ClickButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClickButton::Left => "left",
            ClickButton::Right => "right",
            ClickButton::Middle => "middle",
        }
    }

    /// Parses a button name, falling back to `Left` for anything unknown.
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl fmt::Display for ClickButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClickButton {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(ClickButton::Left),
            "right" => Ok(ClickButton::Right),
            "middle" => Ok(ClickButton::Middle),
            _ => Err(format!(
                "Unknown button: {} (use left, right, middle)",
                s.trim()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_serialization() {
        for (button, expected) in [
            (ClickButton::Left, "\"left\""),
            (ClickButton::Right, "\"right\""),
            (ClickButton::Middle, "\"middle\""),
        ] {
            assert_eq!(serde_json::to_string(&button).unwrap(), expected);
            let back: ClickButton = serde_json::from_str(expected).unwrap();
            assert_eq!(back, button);
        }
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("RIGHT".parse::<ClickButton>().unwrap(), ClickButton::Right);
        assert_eq!(" Middle ".parse::<ClickButton>().unwrap(), ClickButton::Middle);
    }

    #[test]
    fn test_parse_unknown_is_error() {
        assert!("back".parse::<ClickButton>().is_err());
    }

    #[test]
    fn test_unknown_name_falls_back_to_left() {
        assert_eq!(ClickButton::from_name_or_default("x1"), ClickButton::Left);
        assert_eq!(ClickButton::from_name_or_default(""), ClickButton::Left);
        assert_eq!(
            ClickButton::from_name_or_default("middle"),
            ClickButton::Middle
        );
    }
}
