// ── Knobs ──
//
// A knob's datatype is fixed when the server creates it. Only the value
// changes afterwards, and the value's kind always matches the datatype's.

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::Named;

/// Discriminant shared by datatypes and values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum KnobKind {
    Button,
    Picker,
    Rate,
    UFloat,
    Bipolar,
    Unipolar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WigglePolarity {
    Bipolar,
    Unipolar,
}

/// What kind of control a knob is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnobDatatype {
    Button,
    /// A choice among an ordered set of named options.
    Picker(IndexSet<String>),
    Rate,
    UFloat,
    Wiggle(WigglePolarity),
}

impl KnobDatatype {
    pub fn kind(&self) -> KnobKind {
        match self {
            Self::Button => KnobKind::Button,
            Self::Picker(_) => KnobKind::Picker,
            Self::Rate => KnobKind::Rate,
            Self::UFloat => KnobKind::UFloat,
            Self::Wiggle(WigglePolarity::Bipolar) => KnobKind::Bipolar,
            Self::Wiggle(WigglePolarity::Unipolar) => KnobKind::Unipolar,
        }
    }

    /// Slider geometry for numeric datatypes.
    pub fn range(&self) -> Option<NumericRange> {
        match self {
            Self::Button | Self::Picker(_) => None,
            Self::Rate => Some(NumericRange {
                min: 0.0,
                max: 10.0,
                step: 0.01,
                detents: &[0.0, 1.0],
            }),
            Self::UFloat | Self::Wiggle(WigglePolarity::Unipolar) => Some(NumericRange {
                min: 0.0,
                max: 1.0,
                step: 0.001,
                detents: &[0.0, 1.0],
            }),
            Self::Wiggle(WigglePolarity::Bipolar) => Some(NumericRange {
                min: -1.0,
                max: 1.0,
                step: 0.001,
                detents: &[-1.0, 0.0, 1.0],
            }),
        }
    }

    /// The value a freshly created knob of this datatype shows.
    pub fn default_value(&self) -> KnobValue {
        match self {
            Self::Button => KnobValue::Button(false),
            Self::Picker(options) => {
                KnobValue::Picker(options.first().cloned().unwrap_or_default())
            }
            Self::Rate => KnobValue::Rate(1.0),
            Self::UFloat => KnobValue::UFloat(0.0),
            Self::Wiggle(WigglePolarity::Bipolar) => KnobValue::Bipolar(0.0),
            Self::Wiggle(WigglePolarity::Unipolar) => KnobValue::Unipolar(0.0),
        }
    }

    /// Wrap a raw number in the value variant matching this datatype.
    fn numeric(&self, x: f64) -> Option<KnobValue> {
        let x = self.range()?.clamp(x);
        match self {
            Self::Rate => Some(KnobValue::Rate(x)),
            Self::UFloat => Some(KnobValue::UFloat(x)),
            Self::Wiggle(WigglePolarity::Bipolar) => Some(KnobValue::Bipolar(x)),
            Self::Wiggle(WigglePolarity::Unipolar) => Some(KnobValue::Unipolar(x)),
            Self::Button | Self::Picker(_) => None,
        }
    }
}

/// Min/max/step/detents of a numeric knob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub detents: &'static [f64],
}

impl NumericRange {
    /// Clamp into `[min, max]`. NaN lands on `min`.
    pub fn clamp(&self, x: f64) -> f64 {
        if x.is_nan() {
            self.min
        } else {
            x.clamp(self.min, self.max)
        }
    }
}

/// A knob's live value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KnobValue {
    Button(bool),
    Picker(String),
    Rate(f64),
    UFloat(f64),
    Bipolar(f64),
    Unipolar(f64),
}

impl KnobValue {
    pub fn kind(&self) -> KnobKind {
        match self {
            Self::Button(_) => KnobKind::Button,
            Self::Picker(_) => KnobKind::Picker,
            Self::Rate(_) => KnobKind::Rate,
            Self::UFloat(_) => KnobKind::UFloat,
            Self::Bipolar(_) => KnobKind::Bipolar,
            Self::Unipolar(_) => KnobKind::Unipolar,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Rate(x) | Self::UFloat(x) | Self::Bipolar(x) | Self::Unipolar(x) => Some(x),
            Self::Button(_) | Self::Picker(_) => None,
        }
    }
}

impl fmt::Display for KnobValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Button(true) => f.write_str("on"),
            Self::Button(false) => f.write_str("off"),
            Self::Picker(choice) => f.write_str(choice),
            Self::Rate(x) => write!(f, "{x:.2} Hz"),
            Self::UFloat(x) | Self::Bipolar(x) | Self::Unipolar(x) => write!(f, "{x:.3}"),
        }
    }
}

/// An edit coming from the knob's own widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KnobEdit {
    /// Button pressed (`true`) or released.
    Press(bool),
    /// Picker option chosen.
    Select(String),
    /// Slider dragged to a raw position.
    Drag(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnobDescription {
    pub name: String,
    pub datatype: KnobDatatype,
}

/// A knob description paired with its live value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Knob {
    pub description: KnobDescription,
    pub value: KnobValue,
}

impl Knob {
    /// A knob showing its datatype's default value.
    pub fn new(description: KnobDescription) -> Self {
        let value = description.datatype.default_value();
        Self { description, value }
    }

    pub fn kind(&self) -> KnobKind {
        self.description.datatype.kind()
    }

    pub fn range(&self) -> Option<NumericRange> {
        self.description.datatype.range()
    }

    /// Whether an externally supplied value fits this knob's datatype.
    pub fn accepts(&self, value: &KnobValue) -> bool {
        value.kind() == self.kind()
    }

    /// Shape a widget edit into a value of this knob's datatype.
    ///
    /// Numeric drags are clamped into the slider range. Returns `None` only
    /// when the edit belongs to a different widget family altogether.
    pub fn value_for_edit(&self, edit: KnobEdit) -> Option<KnobValue> {
        match (&self.description.datatype, edit) {
            (KnobDatatype::Button, KnobEdit::Press(pressed)) => Some(KnobValue::Button(pressed)),
            (KnobDatatype::Picker(_), KnobEdit::Select(choice)) => Some(KnobValue::Picker(choice)),
            (datatype, KnobEdit::Drag(x)) => datatype.numeric(x),
            _ => None,
        }
    }

    /// The same knob showing `value`.
    pub fn with_value(&self, value: KnobValue) -> Self {
        Self {
            description: self.description.clone(),
            value,
        }
    }
}

impl Named for Knob {
    fn name(&self) -> &str {
        &self.description.name
    }

    fn set_name(&mut self, name: String) {
        self.description.name = name;
    }
}
