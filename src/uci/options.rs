//! # UCI options
//!
//! Engines advertise their settings with `option` lines during the `uci`
//! handshake. These are parsed into [`UciOption`]s, which allows checking a value
//! against the advertised type and range before sending it with `setoption`.

use std::convert::Infallible;

use thiserror::Error;

use super::commands::UciParseError;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Error)]
pub enum UciOptionAssignError {
    #[error("Mismatched types: expected {expected}, got {got}")]
    MismatchedTypes { expected: String, got: String },
    #[error("Value out of range")]
    OutOfRange,
}

/// The different types of UCI fields available.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum UciOptionField {
    Boolean {
        actual: bool,
        default: bool,
    },
    IntegerRange {
        actual: i32,
        default: i32,
        min: i32,
        max: i32,
    },
    Choice {
        default: usize,
        actual: usize,
        possibilities: Vec<String>,
    },
    String {
        default: String,
        actual: String,
    },
    Button,
}
impl UciOptionField {
    /// Returns the current value of this option field.
    pub fn value(&self) -> UciValue {
        match self {
            Self::Boolean { actual, .. } => UciValue::Boolean(*actual),
            Self::IntegerRange { actual, .. } => UciValue::Integer(*actual),
            Self::Choice {
                actual,
                possibilities,
                ..
            } => UciValue::Str(possibilities[*actual].clone()),
            Self::String { actual, .. } => UciValue::Str(actual.clone()),
            Self::Button => UciValue::Button,
        }
    }

    /// Returns the name of the type of this field, as written in `option` lines.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean { .. } => "check",
            Self::IntegerRange { .. } => "spin",
            Self::Choice { .. } => "combo",
            Self::String { .. } => "string",
            Self::Button => "button",
        }
    }

    /// Clamps an integer into the range of a spin field. Other fields return
    /// the value untouched.
    pub fn clamp(&self, value: i32) -> i32 {
        match self {
            Self::IntegerRange { min, max, .. } => value.clamp(*min, *max.max(min)),
            _ => value,
        }
    }

    /// Assigns the given value to this option field.
    /// # Errors
    /// This function returns an error if the given value cannot be assigned to
    /// this field.
    pub fn assign(&mut self, value: UciValue) -> Result<(), UciOptionAssignError> {
        let mismatch = |expected: &str, value: &UciValue| UciOptionAssignError::MismatchedTypes {
            expected: expected.to_string(),
            got: value.type_name().to_string(),
        };

        match self {
            Self::Boolean { actual, .. } => match value {
                UciValue::Boolean(value) => *actual = value,
                value => return Err(mismatch("boolean", &value)),
            },
            Self::IntegerRange {
                actual, min, max, ..
            } => match value {
                UciValue::Integer(value) if (*min..=*max).contains(&value) => *actual = value,
                UciValue::Integer(_) => return Err(UciOptionAssignError::OutOfRange),
                value => return Err(mismatch("integer", &value)),
            },
            Self::Choice {
                actual,
                possibilities,
                ..
            } => match value {
                UciValue::Str(value) => {
                    *actual = possibilities
                        .iter()
                        .position(|p| p.eq_ignore_ascii_case(&value))
                        .ok_or(UciOptionAssignError::OutOfRange)?
                }
                value => return Err(mismatch("string", &value)),
            },
            Self::String { actual, .. } => match value {
                UciValue::Str(value) => *actual = value,
                value => return Err(mismatch("string", &value)),
            },
            Self::Button => match value {
                UciValue::Button => (),
                value => return Err(mismatch("button", &value)),
            },
        }
        Ok(())
    }
}

/// The different types of UCI values available.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum UciValue {
    Boolean(bool),
    Integer(i32),
    Str(String),
    Button,
}
impl UciValue {
    /// Returns a string indicating the type name of this value.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Str(_) => "string",
            Self::Button => "button",
        }
    }
}
impl std::str::FromStr for UciValue {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if let Ok(b) = s.parse::<bool>() {
            Self::Boolean(b)
        } else if let Ok(i) = s.parse::<i32>() {
            Self::Integer(i)
        } else if !s.is_empty() {
            Self::Str(s.to_string())
        } else {
            Self::Button
        })
    }
}
impl std::fmt::Display for UciValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Button => Ok(()),
        }
    }
}

/// Defines an UCI option advertised by an engine.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct UciOption {
    pub name: String,
    pub value: UciOptionField,
}
impl UciOption {
    /// Parses the body of an `option` line, after the `option` keyword.
    /// # Example
    /// ```
    /// # use kibitzer::uci::options::*;
    /// let option = UciOption::parse("name Skill Level type spin default 20 min 0 max 20").unwrap();
    /// assert_eq!(option.name, "Skill Level");
    /// assert_eq!(option.value.clamp(25), 20);
    /// ```
    pub fn parse(s: &str) -> Result<Self, UciParseError> {
        const KEYWORDS: [&str; 6] = ["name", "type", "default", "min", "max", "var"];

        // Values may span several tokens ("Skill Level"), so gather every token
        // up to the next keyword.
        let mut name = Vec::new();
        let mut kind = Vec::new();
        let mut default: Option<Vec<&str>> = None;
        let mut min = Vec::new();
        let mut max = Vec::new();
        let mut vars: Vec<Vec<&str>> = Vec::new();
        let mut current = "";
        for token in s.split_whitespace() {
            // Names are free text, only `type` ends them.
            if KEYWORDS.contains(&token) && (current != "name" || token == "type") {
                current = token;
                match token {
                    "default" => default = Some(Vec::new()),
                    "var" => vars.push(Vec::new()),
                    _ => (),
                }
                continue;
            }
            match current {
                "name" => name.push(token),
                "type" => kind.push(token),
                "default" => default.get_or_insert_with(Vec::new).push(token),
                "min" => min.push(token),
                "max" => max.push(token),
                "var" => {
                    if let Some(var) = vars.last_mut() {
                        var.push(token)
                    }
                }
                _ => return Err(UciParseError::UnexpectedToken(token.to_string())),
            }
        }

        let name = name.join(" ");
        if name.is_empty() {
            return Err(UciParseError::MissingField("name"));
        }
        let default = default.map(|d| d.join(" "));
        let integer = |field: &'static str, tokens: &[&str]| -> Result<i32, UciParseError> {
            let value = tokens.join(" ");
            value.parse().map_err(|_| UciParseError::InvalidValue {
                field,
                value: value.clone(),
            })
        };

        let value = match kind.join(" ").as_str() {
            "check" => {
                let default = match default.as_deref() {
                    Some("true") => true,
                    Some("false") | None => false,
                    Some(other) => {
                        return Err(UciParseError::InvalidValue {
                            field: "default",
                            value: other.to_string(),
                        })
                    }
                };
                UciOptionField::Boolean {
                    actual: default,
                    default,
                }
            }
            "spin" => {
                let min = integer("min", &min)?;
                let max = integer("max", &max)?;
                let default = match default.as_deref() {
                    Some(d) => integer("default", &[d])?,
                    None => min,
                };
                UciOptionField::IntegerRange {
                    actual: default,
                    default,
                    min,
                    max,
                }
            }
            "combo" => {
                let possibilities: Vec<String> = vars.iter().map(|v| v.join(" ")).collect();
                let default = default
                    .and_then(|d| possibilities.iter().position(|p| *p == d))
                    .unwrap_or(0);
                if possibilities.is_empty() {
                    return Err(UciParseError::MissingField("var"));
                }
                UciOptionField::Choice {
                    default,
                    actual: default,
                    possibilities,
                }
            }
            "string" => {
                let default = default
                    .filter(|d| d != "<empty>")
                    .unwrap_or_default();
                UciOptionField::String {
                    actual: default.clone(),
                    default,
                }
            }
            "button" => UciOptionField::Button,
            "" => return Err(UciParseError::MissingField("type")),
            other => {
                return Err(UciParseError::InvalidValue {
                    field: "type",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self { name, value })
    }
}
impl std::fmt::Display for UciOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "option name {} type {}", self.name, self.value.type_name())?;
        match &self.value {
            UciOptionField::Boolean { default, .. } => write!(f, " default {default}"),
            UciOptionField::IntegerRange {
                min, max, default, ..
            } => write!(f, " default {default} min {min} max {max}"),
            UciOptionField::Choice {
                possibilities,
                default,
                ..
            } => {
                write!(f, " default {}", possibilities[*default])?;
                for possibility in possibilities {
                    write!(f, " var {possibility}")?
                }
                Ok(())
            }
            UciOptionField::String { default, .. } => write!(f, " default {default}"),
            UciOptionField::Button => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn spin_options() {
        let mut option =
            UciOption::parse("name Skill Level type spin default 20 min 0 max 20").unwrap();
        assert_eq!(
            option.value,
            UciOptionField::IntegerRange {
                actual: 20,
                default: 20,
                min: 0,
                max: 20
            }
        );
        assert_eq!(option.value.clamp(-3), 0);
        assert_eq!(
            option.value.assign(UciValue::Integer(21)),
            Err(UciOptionAssignError::OutOfRange)
        );
        assert_eq!(
            option.value.assign(UciValue::Boolean(true)),
            Err(UciOptionAssignError::MismatchedTypes {
                expected: "integer".to_string(),
                got: "boolean".to_string()
            })
        );
        option.value.assign(UciValue::Integer(15)).unwrap();
        assert_eq!(option.value.value(), UciValue::Integer(15));
    }

    #[test]
    fn other_option_types() {
        let ponder = UciOption::parse("name Ponder type check default false").unwrap();
        assert_eq!(
            ponder.value,
            UciOptionField::Boolean {
                actual: false,
                default: false
            }
        );

        let mut style = UciOption::parse(
            "name Style type combo default Normal var Solid var Normal var Risky",
        )
        .unwrap();
        assert_eq!(style.value.value(), UciValue::Str("Normal".to_string()));
        style.value.assign(UciValue::Str("risky".to_string())).unwrap();
        assert_eq!(style.value.value(), UciValue::Str("Risky".to_string()));

        let path = UciOption::parse("name SyzygyPath type string default <empty>").unwrap();
        assert_eq!(path.value.value(), UciValue::Str(String::new()));

        let clear = UciOption::parse("name Clear Hash type button").unwrap();
        assert_eq!(clear.to_string(), "option name Clear Hash type button");
    }

    #[test]
    fn malformed_options() {
        assert_eq!(
            UciOption::parse("type spin default 1 min 0 max 2"),
            Err(UciParseError::MissingField("name"))
        );
        assert!(matches!(
            UciOption::parse("name Threads type spin default 1 min zero max 2"),
            Err(UciParseError::InvalidValue { field: "min", .. })
        ));
    }
}
