//! # MySQL Dialect
//!
//! Literal and identifier quoting for MySQL. Strings are single-quoted with
//! backslash escapes, identifiers are backtick-quoted with embedded
//! backticks doubled.

use crate::{format::Dialect, value::Value};

/// The MySQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

/// Quotes a string literal, escaping what MySQL would otherwise interpret.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\x08' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x1a' => out.push_str("\\Z"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

impl Dialect for MysqlDialect {
    fn escape(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => escape_string(s),
            Value::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S%.3f")),
            Value::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            Value::Uuid(u) => escape_string(&u.to_string()),
            Value::List(items) => items
                .iter()
                .map(|item| match item {
                    Value::List(_) => format!("({})", self.escape(item)),
                    other => self.escape(other),
                })
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    fn quote_id(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn strings_are_escaped() {
        let d = MysqlDialect;
        assert_eq!(d.escape(&Value::from("it's")), r"'it\'s'");
        assert_eq!(d.escape(&Value::from("a\nb\\c\"")), r#"'a\nb\\c\"'"#);
        assert_eq!(d.escape(&Value::from("\0\x1a")), r"'\0\Z'");
    }

    #[test]
    fn scalars_and_lists() {
        let d = MysqlDialect;
        assert_eq!(d.escape(&Value::Null), "NULL");
        assert_eq!(d.escape(&Value::from(true)), "true");
        assert_eq!(d.escape(&Value::from(u64::MAX)), "18446744073709551615");
        assert_eq!(d.escape(&Value::from(vec![1, 2])), "1, 2");
        assert_eq!(
            d.escape(&Value::List(vec![Value::from(vec![1, 2]), Value::from(vec![3, 4])])),
            "(1, 2), (3, 4)"
        );
    }

    #[test]
    fn dates() {
        let d = MysqlDialect;
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(d.escape(&Value::from(date)), "'2024-02-29'");
        let dt = date.and_hms_milli_opt(13, 5, 9, 42).unwrap();
        assert_eq!(d.escape(&Value::from(dt)), "'2024-02-29 13:05:09.042'");
    }

    #[test]
    fn identifiers() {
        let d = MysqlDialect;
        assert_eq!(d.escape_id("U.name"), "`U`.`name`");
        assert_eq!(d.escape_id("we`ird"), "`we``ird`");
        assert_eq!(d.quote_id("user.name"), "`user.name`");
    }
}
