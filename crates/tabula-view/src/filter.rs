#![forbid(unsafe_code)]

//! Filter engine.
//!
//! A row is included iff it passes the free-text query (every token is a
//! substring of the searchable text) AND every structured rule. Rules are
//! stored as written and compiled against the current column registry on
//! each recompute, so a rule naming a column that is not (yet) declared is
//! simply inactive.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Rules payload is not JSON / not an array | No rules (fail open) |
//! | Rule entry without a usable `column` | Entry dropped |
//! | Rule column does not resolve | Rule dropped at compile time |
//! | Numeric rule, cell not numeric | Row excluded (fail closed) |
//! | Numeric rule, value not numeric | Every row excluded (fail closed) |

use serde::Deserialize;
use serde_json::Value;

use tabula_core::Row;
use tabula_core::text::{fold, parse_number, query_tokens};

use crate::column::{ColumnRef, ColumnRegistry};
use crate::error::{ConfigError, ConfigResult};

/// Comparison operator of a structured rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterOp {
    /// Case-insensitive substring; also the fallback for unknown operators.
    #[default]
    Contains,
    /// Case-insensitive full-string equality.
    Equals,
    /// Negated [`FilterOp::Equals`].
    NotEquals,
    /// Case-insensitive prefix.
    StartsWith,
    /// Case-insensitive suffix.
    EndsWith,
    /// Matches any entry of a value list.
    In,
    /// Numeric `>`.
    Gt,
    /// Numeric `>=`.
    Gte,
    /// Numeric `<`.
    Lt,
    /// Numeric `<=`.
    Lte,
    /// Numeric inclusive range, bounds in either order.
    Between,
    /// Blank after trimming.
    Empty,
    /// Not blank after trimming.
    NotEmpty,
}

impl FilterOp {
    /// Parse an operator name. Unknown names mean `contains`.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "equals" | "eq" | "=" | "==" => Self::Equals,
            "neq" | "ne" | "!=" | "notequals" => Self::NotEquals,
            "startswith" | "starts" => Self::StartsWith,
            "endswith" | "ends" => Self::EndsWith,
            "in" => Self::In,
            "gt" | ">" => Self::Gt,
            "gte" | ">=" => Self::Gte,
            "lt" | "<" => Self::Lt,
            "lte" | "<=" => Self::Lte,
            "between" => Self::Between,
            "empty" => Self::Empty,
            "notempty" => Self::NotEmpty,
            _ => Self::Contains,
        }
    }

    /// Canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Equals => "equals",
            Self::NotEquals => "neq",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::In => "in",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Between => "between",
            Self::Empty => "empty",
            Self::NotEmpty => "notempty",
        }
    }
}

/// Rule operand: a single text or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleValue {
    /// Scalar operand.
    Text(String),
    /// List operand (`in`, `between`).
    List(Vec<String>),
}

impl Default for RuleValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl RuleValue {
    /// Entries of the operand. A scalar splits on commas.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        match self {
            Self::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Self::List(items) => items.iter().map(|s| s.trim().to_string()).collect(),
        }
    }

    /// Scalar form; lists are comma-joined.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::List(items) => items.join(","),
        }
    }

    fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self::List(items.iter().map(json_scalar).collect()),
            other => Self::Text(json_scalar(other)),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        }
    }
}

fn json_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One structured rule as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRule {
    /// Column the rule reads.
    pub column: ColumnRef,
    /// Operator.
    pub op: FilterOp,
    /// Operand.
    pub value: RuleValue,
}

#[derive(Deserialize)]
struct RawRule {
    #[serde(default)]
    column: Value,
    #[serde(default)]
    op: Option<String>,
    #[serde(default)]
    value: Value,
}

impl FilterRule {
    /// Create a rule.
    #[must_use]
    pub fn new(column: ColumnRef, op: FilterOp, value: RuleValue) -> Self {
        Self { column, op, value }
    }

    /// Shorthand for a rule on a column key with a text operand.
    #[must_use]
    pub fn on(column: &str, op: FilterOp, value: impl Into<String>) -> Self {
        Self::new(ColumnRef::parse(column), op, RuleValue::Text(value.into()))
    }

    /// Parse a JSON array of `{column, op, value}` strictly.
    pub fn parse_list(json: &str) -> ConfigResult<Vec<Self>> {
        let trimmed = json.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<Value> = serde_json::from_str(trimmed)?;
        raw.into_iter()
            .enumerate()
            .map(|(position, entry)| {
                let rule: RawRule =
                    serde_json::from_value(entry).map_err(|e| ConfigError::InvalidRule {
                        position,
                        reason: e.to_string(),
                    })?;
                let column = match &rule.column {
                    Value::Number(n) => n.as_u64().map(|i| ColumnRef::Index(i as usize)),
                    Value::String(s) if !s.trim().is_empty() => Some(ColumnRef::parse(s)),
                    _ => None,
                }
                .ok_or_else(|| ConfigError::InvalidRule {
                    position,
                    reason: format!("unusable column reference {}", rule.column),
                })?;
                Ok(Self {
                    column,
                    op: FilterOp::parse(rule.op.as_deref().unwrap_or("")),
                    value: RuleValue::from_json(&rule.value),
                })
            })
            .collect()
    }

    /// Parse leniently: a malformed payload yields no rules, a malformed
    /// entry is skipped.
    #[must_use]
    pub fn parse_list_lenient(json: &str) -> Vec<Self> {
        let Ok(raw) = serde_json::from_str::<Vec<Value>>(json.trim()) else {
            return Vec::new();
        };
        raw.iter()
            .filter_map(|entry| Self::parse_list(&format!("[{entry}]")).ok())
            .flatten()
            .collect()
    }

    /// Serialize rules back to the JSON array form.
    #[must_use]
    pub fn list_to_json(rules: &[Self]) -> String {
        let entries: Vec<Value> = rules
            .iter()
            .map(|rule| {
                let column = match &rule.column {
                    ColumnRef::Index(i) => Value::from(*i as u64),
                    ColumnRef::Key(k) => Value::String(k.clone()),
                };
                serde_json::json!({
                    "column": column,
                    "op": rule.op.as_str(),
                    "value": rule.value.to_json(),
                })
            })
            .collect();
        Value::Array(entries).to_string()
    }
}

/// Effective rule as reported in change notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSummary {
    /// Resolved column key.
    pub column: String,
    /// Operator name.
    pub op: &'static str,
    /// Operand as text.
    pub value: String,
}

/// User-controlled filter parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterState {
    /// Free-text query.
    pub query: String,
    /// Column the query is scoped to; `None` searches every cell.
    pub query_column: Option<ColumnRef>,
    /// Structured rules, AND-combined.
    pub rules: Vec<FilterRule>,
}

impl FilterState {
    /// Whether nothing filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty() && self.rules.is_empty()
    }

    /// Rewrite positional column references as keys. Returns whether any
    /// reference changed.
    pub fn anchor(&mut self, registry: &ColumnRegistry) -> bool {
        let mut changed = false;
        let references = self
            .query_column
            .iter_mut()
            .chain(self.rules.iter_mut().map(|rule| &mut rule.column));
        for reference in references {
            if matches!(reference, ColumnRef::Index(_)) {
                let anchored = registry.anchor(reference.clone());
                changed |= anchored != *reference;
                *reference = anchored;
            }
        }
        changed
    }

    /// Resolve column references and pre-parse operands.
    ///
    /// A query scoped to a column that does not resolve searches every
    /// cell.
    #[must_use]
    pub fn compile(&self, registry: &ColumnRegistry) -> CompiledFilter {
        let query_source = self
            .query_column
            .as_ref()
            .and_then(|r| registry.resolve(r))
            .and_then(|index| registry.source_at(index));
        let rules = self
            .rules
            .iter()
            .filter_map(|rule| {
                let index = registry.resolve(&rule.column)?;
                Some(CompiledRule {
                    source: registry.source_at(index)?,
                    key: registry.key_at(index)?.to_string(),
                    op: rule.op,
                    operand: Operand::compile(rule.op, &rule.value),
                    value_text: rule.value.as_text(),
                })
            })
            .collect();
        CompiledFilter {
            tokens: query_tokens(&self.query),
            query_source,
            rules,
        }
    }
}

#[derive(Debug, Clone)]
enum Operand {
    Text(String),
    List(Vec<String>),
    Number(Option<f64>),
    Range(Option<(f64, f64)>),
    Unused,
}

impl Operand {
    fn compile(op: FilterOp, value: &RuleValue) -> Self {
        match op {
            FilterOp::Empty | FilterOp::NotEmpty => Self::Unused,
            FilterOp::In => Self::List(value.entries().iter().map(|s| fold(s)).collect()),
            FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
                Self::Number(parse_number(&value.as_text()))
            }
            FilterOp::Between => {
                let bounds: Vec<f64> =
                    value.entries().iter().filter_map(|s| parse_number(s)).collect();
                match bounds.as_slice() {
                    [a, b, ..] => Self::Range(Some((a.min(*b), a.max(*b)))),
                    _ => Self::Range(None),
                }
            }
            _ => Self::Text(fold(&value.as_text())),
        }
    }
}

/// A rule bound to a declared column.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    source: usize,
    key: String,
    op: FilterOp,
    operand: Operand,
    value_text: String,
}

impl CompiledRule {
    /// Evaluate against one cell's text.
    #[must_use]
    pub fn matches(&self, cell: &str) -> bool {
        match (&self.operand, self.op) {
            (Operand::Unused, FilterOp::Empty) => cell.trim().is_empty(),
            (Operand::Unused, _) => !cell.trim().is_empty(),
            (Operand::List(entries), _) => {
                let cell = fold(cell.trim());
                entries.iter().any(|e| *e == cell)
            }
            (Operand::Number(bound), op) => {
                let (Some(bound), Some(n)) = (*bound, parse_number(cell)) else {
                    return false;
                };
                match op {
                    FilterOp::Gt => n > bound,
                    FilterOp::Gte => n >= bound,
                    FilterOp::Lt => n < bound,
                    _ => n <= bound,
                }
            }
            (Operand::Range(range), _) => match (*range, parse_number(cell)) {
                (Some((lo, hi)), Some(n)) => lo <= n && n <= hi,
                _ => false,
            },
            (Operand::Text(value), op) => {
                let cell = fold(cell);
                match op {
                    FilterOp::Equals => cell == *value,
                    FilterOp::NotEquals => cell != *value,
                    FilterOp::StartsWith => cell.starts_with(value.as_str()),
                    FilterOp::EndsWith => cell.ends_with(value.as_str()),
                    _ => cell.contains(value.as_str()),
                }
            }
        }
    }

    /// Summary for notifications.
    #[must_use]
    pub fn summary(&self) -> RuleSummary {
        RuleSummary {
            column: self.key.clone(),
            op: self.op.as_str(),
            value: self.value_text.clone(),
        }
    }
}

/// Filter ready to evaluate rows.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilter {
    tokens: Vec<String>,
    query_source: Option<usize>,
    rules: Vec<CompiledRule>,
}

impl CompiledFilter {
    /// Whether every row passes.
    #[must_use]
    pub fn is_pass_all(&self) -> bool {
        self.tokens.is_empty() && self.rules.is_empty()
    }

    /// Rules that survived resolution.
    #[must_use]
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Evaluate one row.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        self.matches_query(row)
            && self
                .rules
                .iter()
                .all(|rule| rule.matches(row.cell(rule.source)))
    }

    fn matches_query(&self, row: &Row) -> bool {
        if self.tokens.is_empty() {
            return true;
        }
        let haystack = match self.query_source {
            Some(source) => fold(row.cell(source)),
            None => fold(&row.joined_text()),
        };
        self.tokens.iter().all(|t| haystack.contains(t.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDecl;

    fn registry() -> ColumnRegistry {
        ColumnRegistry::from_decls(&[
            ColumnDecl::new("Name"),
            ColumnDecl::new("Role"),
            ColumnDecl::new("Salary"),
        ])
    }

    fn rows() -> Vec<Row> {
        vec![
            Row::new(1, ["Ava", "Admin", "1,200"]),
            Row::new(2, ["Liam", "Editor", "900"]),
            Row::new(3, ["Mia", "Admin", "n/a"]),
            Row::new(4, ["Noah", "  ", "3,000.50"]),
        ]
    }

    fn included(state: &FilterState) -> Vec<u64> {
        let compiled = state.compile(&registry());
        rows()
            .iter()
            .filter(|r| compiled.matches(r))
            .map(|r| r.id().get())
            .collect()
    }

    fn with_rules(rules: Vec<FilterRule>) -> FilterState {
        FilterState {
            rules,
            ..FilterState::default()
        }
    }

    #[test]
    fn equals_rule_is_case_insensitive() {
        let state = with_rules(vec![FilterRule::on("role", FilterOp::Equals, "admin")]);
        assert_eq!(included(&state), vec![1, 3]);
    }

    #[test]
    fn query_tokens_are_and_not_phrase() {
        let state = FilterState {
            query: "admin AVA".into(),
            ..FilterState::default()
        };
        assert_eq!(included(&state), vec![1]);
    }

    #[test]
    fn scoped_query_reads_one_column() {
        let mut state = FilterState {
            query: "a".into(),
            query_column: Some(ColumnRef::Key("name".into())),
            ..FilterState::default()
        };
        assert_eq!(included(&state), vec![1, 2, 3, 4]);
        state.query = "admin".into();
        assert!(included(&state).is_empty());
        state.query_column = Some(ColumnRef::Key("missing".into()));
        assert_eq!(included(&state), vec![1, 3]);
    }

    #[test]
    fn numeric_rules_fail_closed() {
        let state = with_rules(vec![FilterRule::on("salary", FilterOp::Gte, "1000")]);
        assert_eq!(included(&state), vec![1, 4]);
        let state = with_rules(vec![FilterRule::on("salary", FilterOp::Lt, "lots")]);
        assert!(included(&state).is_empty());
    }

    #[test]
    fn between_normalizes_bounds() {
        let state = with_rules(vec![FilterRule::new(
            ColumnRef::Key("salary".into()),
            FilterOp::Between,
            RuleValue::List(vec!["1500".into(), "800".into()]),
        )]);
        assert_eq!(included(&state), vec![1, 2]);
        let state = with_rules(vec![FilterRule::on("salary", FilterOp::Between, "900,900")]);
        assert_eq!(included(&state), vec![2]);
    }

    #[test]
    fn in_accepts_list_or_csv() {
        let state = with_rules(vec![FilterRule::on("name", FilterOp::In, "ava, NOAH")]);
        assert_eq!(included(&state), vec![1, 4]);
    }

    #[test]
    fn empty_ignores_value() {
        let state = with_rules(vec![FilterRule::on("role", FilterOp::Empty, "ignored")]);
        assert_eq!(included(&state), vec![4]);
        let state = with_rules(vec![FilterRule::on("role", FilterOp::NotEmpty, "")]);
        assert_eq!(included(&state), vec![1, 2, 3]);
    }

    #[test]
    fn affixes_and_fallback_contains() {
        let state = with_rules(vec![FilterRule::on("name", FilterOp::StartsWith, "l")]);
        assert_eq!(included(&state), vec![2]);
        let state = with_rules(vec![FilterRule::on("name", FilterOp::EndsWith, "A")]);
        assert_eq!(included(&state), vec![1, 3]);
        let rules = FilterRule::parse_list(r#"[{"column":"role","op":"fuzzy","value":"dit"}]"#)
            .expect("valid");
        assert_eq!(rules[0].op, FilterOp::Contains);
        assert_eq!(included(&with_rules(rules)), vec![2]);
    }

    #[test]
    fn unresolvable_rule_is_dropped() {
        let state = with_rules(vec![
            FilterRule::on("ghost", FilterOp::Equals, "x"),
            FilterRule::on("role", FilterOp::Equals, "editor"),
        ]);
        assert_eq!(state.compile(&registry()).rules().len(), 1);
        assert_eq!(included(&state), vec![2]);
    }

    #[test]
    fn json_payloads() {
        let rules = FilterRule::parse_list(
            r#"[{"column":"role","op":"equals","value":"Admin"},
                {"column":2,"op":"in","value":["900", 1200]}]"#,
        )
        .expect("valid");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].column, ColumnRef::Index(2));
        assert_eq!(
            rules[1].value,
            RuleValue::List(vec!["900".into(), "1200".into()])
        );
        let back = FilterRule::parse_list(&FilterRule::list_to_json(&rules)).expect("round trip");
        assert_eq!(back, rules);

        assert!(FilterRule::parse_list("{not json").is_err());
        assert!(FilterRule::parse_list_lenient("{not json").is_empty());
        assert!(FilterRule::parse_list_lenient(r#"{"column":"role"}"#).is_empty());

        let mixed =
            FilterRule::parse_list_lenient(r#"[{"op":"equals"},{"column":"name","value":"a"}]"#);
        assert_eq!(mixed.len(), 1);
        assert!(matches!(
            FilterRule::parse_list(r#"[{"op":"equals"}]"#),
            Err(ConfigError::InvalidRule { position: 0, .. })
        ));
    }

    #[test]
    fn summaries_use_resolved_keys() {
        let state = with_rules(vec![FilterRule::on("1", FilterOp::Equals, "Admin")]);
        let compiled = state.compile(&registry());
        assert_eq!(
            compiled.rules()[0].summary(),
            RuleSummary {
                column: "role".into(),
                op: "equals",
                value: "Admin".into()
            }
        );
    }

    #[test]
    fn anchoring_pins_positions_to_keys() {
        let mut reg = registry();
        let mut state = FilterState {
            query: "admin".into(),
            query_column: Some(ColumnRef::Index(1)),
            rules: vec![
                FilterRule::on("2", FilterOp::Gte, "1000"),
                FilterRule::on("9", FilterOp::Equals, "x"),
            ],
        };
        assert!(state.anchor(&reg));
        assert_eq!(state.query_column, Some(ColumnRef::Key("role".into())));
        assert_eq!(state.rules[0].column, ColumnRef::Key("salary".into()));
        assert_eq!(state.rules[1].column, ColumnRef::Index(9));
        assert!(!state.anchor(&reg));

        reg.move_column(2, 0);
        let compiled = state.compile(&reg);
        let ids: Vec<u64> = rows()
            .iter()
            .filter(|r| compiled.matches(r))
            .map(|r| r.id().get())
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn numeric_column_keys_are_addressable() {
        let reg = ColumnRegistry::from_decls(&[ColumnDecl::new("Name"), ColumnDecl::new("2024")]);
        let state = with_rules(vec![FilterRule::on("2024", FilterOp::Equals, "x")]);
        let compiled = state.compile(&reg);
        assert_eq!(compiled.rules().len(), 1);
        let rows = [Row::new(1, ["a", "x"]), Row::new(2, ["b", "y"])];
        let ids: Vec<u64> = rows
            .iter()
            .filter(|r| compiled.matches(r))
            .map(|r| r.id().get())
            .collect();
        assert_eq!(ids, vec![1]);
    }
}
