//! Effect parameter schema and validation
//!
//! `FIELDS` is the one place the effect parameters are declared. Form
//! validation, the effect stage's command line and the `/api/effects`
//! listing are all driven from it.

use std::fmt;

use serde::Serialize;

/// Version of the effect-stage argument contract. Bump when a flag name,
/// the flag order or the value rendering changes.
pub const ARGS_VERSION: u32 = 1;

pub const FIELD_COUNT: usize = 19;

/// Declared type, bounds and default of one parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Float { min: f64, max: f64, default: f64 },
    Int { min: i64, max: i64, default: i64 },
    Bool { default: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
}

const fn float(name: &'static str, min: f64, max: f64, default: f64) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Float { min, max, default },
    }
}

const fn int(name: &'static str, min: i64, max: i64, default: i64) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Int { min, max, default },
    }
}

const fn boolean(name: &'static str, default: bool) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Bool { default },
    }
}

/// All effect parameters, in the order they are passed to the effect stage.
pub static FIELDS: [FieldSpec; FIELD_COUNT] = [
    float("blackWhiteLevel", 0.0, 1.0, 0.2),
    int("posterizeBits", 1, 8, 4),
    float("contrastFactor", 0.1, 3.0, 1.0),
    float("overlayAlpha", 0.0, 1.0, 0.5),
    float("blackLevel", 0.0, 1.0, 0.2),
    float("whiteLevel", 0.0, 1.0, 0.8),
    boolean("faceEnhance", false),
    float("brightness", -1.0, 1.0, 0.0),
    float("saturation", -1.0, 1.0, 0.0),
    float("sharpness", -1.0, 1.0, 0.0),
    float("hue", -180.0, 180.0, 0.0),
    float("blur", 0.0, 100.0, 0.0),
    float("vignette", 0.0, 1.0, 0.0),
    float("skinSmooth", 0.0, 1.0, 0.0),
    float("eyeBrighten", 0.0, 1.0, 0.0),
    float("teethWhiten", 0.0, 1.0, 0.0),
    float("lipstick", 0.0, 1.0, 0.0),
    float("eyelashEnhance", 0.0, 1.0, 0.0),
    boolean("addGlasses", false),
];

/// A validated parameter value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid {field} parameter: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: ValidationReason,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationReason {
    #[error("expected a number, got {0:?}")]
    NotANumber(String),
    #[error("expected an integer, got {0:?}")]
    NotAnInteger(String),
    #[error("expected true or false, got {0:?}")]
    NotABool(String),
    #[error("{value} is outside [{min}, {max}]")]
    OutOfRange {
        value: String,
        min: String,
        max: String,
    },
    #[error("{0}")]
    Rejected(String),
}

impl ValidationError {
    pub fn new(field: &'static str, reason: ValidationReason) -> Self {
        Self { field, reason }
    }
}

/// A fully populated, in-range set of effect parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    values: [ParamValue; FIELD_COUNT],
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            values: FIELDS.map(|spec| match spec.kind {
                FieldKind::Float { default, .. } => ParamValue::Float(default),
                FieldKind::Int { default, .. } => ParamValue::Int(default),
                FieldKind::Bool { default } => ParamValue::Bool(default),
            }),
        }
    }
}

impl ParameterSet {
    /// Build a parameter set from raw text fields.
    ///
    /// `lookup` returns the submitted text for a field name, or `None` when the
    /// field was not submitted (the default applies). Fails on the first
    /// invalid field; nothing is returned partially filled.
    pub fn from_fields<'a, F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let mut set = Self::default();
        for (slot, spec) in set.values.iter_mut().zip(FIELDS.iter()) {
            if let Some(raw) = lookup(spec.name) {
                *slot = parse_field(spec, raw)?;
            }
        }
        Ok(set)
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        FIELDS
            .iter()
            .position(|spec| spec.name == name)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static FieldSpec, ParamValue)> + '_ {
        FIELDS.iter().zip(self.values.iter().copied())
    }

    /// Command-line flags for the effect stage: `--<name> <value>` per field,
    /// in schema order.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(FIELD_COUNT * 2);
        for (spec, value) in self.iter() {
            args.push(format!("--{}", spec.name));
            args.push(value.to_string());
        }
        args
    }
}

fn parse_field(spec: &FieldSpec, raw: &str) -> Result<ParamValue, ValidationError> {
    let text = raw.trim();
    let reject = |reason| ValidationError::new(spec.name, reason);

    match spec.kind {
        FieldKind::Float { min, max, .. } => {
            let value = text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| reject(ValidationReason::NotANumber(raw.to_string())))?;
            if value < min || value > max {
                return Err(reject(ValidationReason::OutOfRange {
                    value: text.to_string(),
                    min: min.to_string(),
                    max: max.to_string(),
                }));
            }
            Ok(ParamValue::Float(value))
        }
        FieldKind::Int { min, max, .. } => {
            let value = match text.parse::<i64>() {
                Ok(v) => v,
                Err(_) => {
                    let f = text
                        .parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| reject(ValidationReason::NotANumber(raw.to_string())))?;
                    if f.fract() != 0.0 || f < i64::MIN as f64 || f > i64::MAX as f64 {
                        return Err(reject(ValidationReason::NotAnInteger(raw.to_string())));
                    }
                    f as i64
                }
            };
            if value < min || value > max {
                return Err(reject(ValidationReason::OutOfRange {
                    value: value.to_string(),
                    min: min.to_string(),
                    max: max.to_string(),
                }));
            }
            Ok(ParamValue::Int(value))
        }
        FieldKind::Bool { .. } => match text.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(ParamValue::Bool(true)),
            "false" | "0" | "no" | "off" => Ok(ParamValue::Bool(false)),
            _ => Err(reject(ValidationReason::NotABool(raw.to_string()))),
        },
    }
}
