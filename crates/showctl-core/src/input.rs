// ── Validated input cells ──
//
// Every editable field pairs the raw text the operator typed with a
// parser. A failed parse keeps the raw text verbatim so it can be shown
// and corrected; nothing is ever thrown away.

use std::fmt;

use crate::dmx;

/// Parses raw field text, returning a human-readable reason on failure.
pub type Parser<T> = fn(&str) -> Result<T, String>;

/// Messages a cell's widget sends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellMsg {
    /// The operator changed the text.
    Update(String),
    /// Reset to the untouched state.
    Clear,
}

// ── Widget ids ───────────────────────────────────────────────────────

/// Identifier for one transient widget.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(String);

impl WidgetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-form id counter. Each form owns one, so ids are unique within the
/// form and never depend on process-wide state.
#[derive(Debug, Clone)]
pub struct IdSource {
    prefix: String,
    next: u64,
}

impl IdSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }

    pub fn next_id(&mut self) -> WidgetId {
        let id = WidgetId(format!("{}-{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

// ── ValidatedInput ───────────────────────────────────────────────────

/// A text field with a parser attached.
///
/// `value` is `None` while untouched, `Some(Ok(v))` after a successful
/// parse and `Some(Err(raw))` when the last edit failed.
#[derive(Debug, Clone)]
pub struct ValidatedInput<T> {
    id: Option<WidgetId>,
    label: String,
    placeholder: String,
    parser: Parser<T>,
    value: Option<Result<T, String>>,
    error: Option<String>,
}

impl<T> ValidatedInput<T> {
    pub fn new(
        label: impl Into<String>,
        parser: Parser<T>,
        placeholder: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            label: label.into(),
            placeholder: placeholder.into(),
            parser,
            value: None,
            error: None,
        }
    }

    pub fn with_id(mut self, id: WidgetId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn update(&mut self, msg: CellMsg) {
        match msg {
            CellMsg::Update(text) => match (self.parser)(&text) {
                Ok(v) => self.set_parsed(v),
                Err(reason) => {
                    self.value = Some(Err(text));
                    self.error = Some(reason);
                }
            },
            CellMsg::Clear => {
                self.value = None;
                self.error = None;
            }
        }
    }

    /// Replace any in-progress edit with an authoritative value.
    pub fn set_parsed(&mut self, value: T) {
        self.value = Some(Ok(value));
        self.error = None;
    }

    /// Put the cell into the failed state showing `raw`.
    pub fn set_failed(&mut self, raw: impl Into<String>) {
        self.value = Some(Err(raw.into()));
        self.error = None;
    }

    /// True unless the last edit failed to parse.
    pub fn is_ok(&self) -> bool {
        !matches!(self.value, Some(Err(_)))
    }

    pub fn is_touched(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&Result<T, String>> {
        self.value.as_ref()
    }

    pub fn parsed(&self) -> Option<&T> {
        match &self.value {
            Some(Ok(v)) => Some(v),
            _ => None,
        }
    }

    /// Why the last parse failed, when the parser said so.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn id(&self) -> Option<&WidgetId> {
        self.id.as_ref()
    }
}

impl<T: Clone> ValidatedInput<T> {
    pub fn parsed_value_or(&self, default: T) -> T {
        self.parsed().cloned().unwrap_or(default)
    }
}

impl<T: fmt::Display> ValidatedInput<T> {
    /// Text to put in the field: the failed raw text, the parsed value,
    /// or nothing (the widget shows the placeholder).
    pub fn display_text(&self) -> String {
        match &self.value {
            None => String::new(),
            Some(Ok(v)) => v.to_string(),
            Some(Err(raw)) => raw.clone(),
        }
    }
}

// ── Stock parsers ────────────────────────────────────────────────────

pub fn parse_name(text: &str) -> Result<String, String> {
    match text.trim() {
        "" => Err("name cannot be empty".into()),
        name => Ok(name.to_owned()),
    }
}

pub fn parse_int(text: &str) -> Result<i64, String> {
    text.trim()
        .parse()
        .map_err(|_| format!("'{}' is not a whole number", text.trim()))
}

pub fn parse_positive_int(text: &str) -> Result<i64, String> {
    match parse_int(text)? {
        n if n >= 1 => Ok(n),
        n => Err(format!("{n} must be at least 1")),
    }
}

pub fn parse_universe(text: &str) -> Result<u32, String> {
    dmx::valid_universe(parse_int(text)?).map_err(|e| e.to_string())
}

pub fn parse_dmx_address(text: &str) -> Result<u16, String> {
    dmx::valid_dmx_address(parse_int(text)?).map_err(|e| e.to_string())
}

/// Empty text means "no universe".
pub fn parse_optional_universe(text: &str) -> Result<Option<u32>, String> {
    optional(text, parse_universe)
}

/// Empty text means "no address".
pub fn parse_optional_dmx_address(text: &str) -> Result<Option<u16>, String> {
    optional(text, parse_dmx_address)
}

fn optional<T>(text: &str, parser: Parser<T>) -> Result<Option<T>, String> {
    if text.trim().is_empty() {
        Ok(None)
    } else {
        parser(text).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_parse_retains_raw_text() {
        let mut qty = ValidatedInput::new("Qty", parse_positive_int, "1");
        qty.update(CellMsg::Update("abc".into()));

        assert_eq!(qty.value(), Some(&Err("abc".to_owned())));
        assert!(!qty.is_ok());
        assert_eq!(qty.display_text(), "abc");
        assert!(qty.error_message().is_some());

        qty.update(CellMsg::Clear);
        assert_eq!(qty.value(), None);
        assert!(qty.is_ok());
    }

    #[test]
    fn successful_parse_replaces_error() {
        let mut qty = ValidatedInput::new("Qty", parse_positive_int, "1");
        qty.update(CellMsg::Update("0".into()));
        assert!(!qty.is_ok());

        qty.update(CellMsg::Update(" 4 ".into()));
        assert_eq!(qty.parsed(), Some(&4));
        assert_eq!(qty.error_message(), None);
        assert_eq!(qty.display_text(), "4");
    }

    #[test]
    fn parsed_value_or_falls_back_unless_ok() {
        let mut qty = ValidatedInput::new("Qty", parse_positive_int, "1");
        assert_eq!(qty.parsed_value_or(1), 1);
        qty.update(CellMsg::Update("x".into()));
        assert_eq!(qty.parsed_value_or(1), 1);
        qty.update(CellMsg::Update("3".into()));
        assert_eq!(qty.parsed_value_or(1), 3);
    }

    #[test]
    fn server_values_override_edits() {
        let mut name = ValidatedInput::new("Name", parse_name, "");
        name.update(CellMsg::Update("   ".into()));
        assert!(!name.is_ok());

        name.set_parsed("Front wash".into());
        assert_eq!(name.parsed().map(String::as_str), Some("Front wash"));

        name.set_failed("???");
        assert_eq!(name.display_text(), "???");
        assert!(!name.is_ok());
    }

    #[test]
    fn optional_parsers_accept_blank() {
        assert_eq!(parse_optional_universe(""), Ok(None));
        assert_eq!(parse_optional_universe("2"), Ok(Some(2)));
        assert!(parse_optional_universe("-1").is_err());
        assert_eq!(parse_optional_dmx_address("  "), Ok(None));
        assert!(parse_optional_dmx_address("513").is_err());
    }

    #[test]
    fn id_source_is_per_form() {
        let mut a = IdSource::new("patch");
        let mut b = IdSource::new("patch");
        assert_eq!(a.next_id().as_str(), "patch-0");
        assert_eq!(a.next_id().as_str(), "patch-1");
        assert_eq!(b.next_id().as_str(), "patch-0");
    }
}
