//! Canonical string rendering.
//!
//! Every element that leaves the core inside a [`MatchResult`](crate::MatchResult)
//! is ordered by its canonical string. The rendering is a fixed sequence of
//! `field:value` tokens separated by single spaces. Decimals are normalised
//! (`10.50` and `10.5` render identically) so numerically equal values never
//! split into different sort positions.

use rust_decimal::Decimal;

/// Types with a deterministic textual form used as their sort key.
pub trait Canonical {
    fn canonical_string(&self) -> String;
}

/// Incremental builder for canonical strings.
#[derive(Debug, Default)]
pub struct CanonicalWriter {
    buf: String,
}

impl CanonicalWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sep(&mut self) {
        if !self.buf.is_empty() {
            self.buf.push(' ');
        }
    }

    #[must_use]
    pub fn num(mut self, field: &str, value: u64) -> Self {
        self.sep();
        self.buf.push_str(field);
        self.buf.push(':');
        self.buf.push_str(&value.to_string());
        self
    }

    #[must_use]
    pub fn str(mut self, field: &str, value: &str) -> Self {
        self.sep();
        self.buf.push_str(field);
        self.buf.push_str(":\"");
        for ch in value.chars() {
            if ch == '"' || ch == '\\' {
                self.buf.push('\\');
            }
            self.buf.push(ch);
        }
        self.buf.push('"');
        self
    }

    #[must_use]
    pub fn dec(mut self, field: &str, value: Decimal) -> Self {
        self.sep();
        self.buf.push_str(field);
        self.buf.push(':');
        self.buf.push_str(&value.normalize().to_string());
        self
    }

    /// Enum-like token written bare (`side:LONG`).
    #[must_use]
    pub fn tag(mut self, field: &str, value: &str) -> Self {
        self.sep();
        self.buf.push_str(field);
        self.buf.push(':');
        self.buf.push_str(value);
        self
    }

    #[must_use]
    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_in_call_order() {
        let s = CanonicalWriter::new()
            .num("id", 7)
            .str("account", "alice")
            .tag("side", "LONG")
            .finish();
        assert_eq!(s, "id:7 account:\"alice\" side:LONG");
    }

    #[test]
    fn decimals_are_normalised() {
        let a = CanonicalWriter::new().dec("p", Decimal::new(1050, 2)).finish();
        let b = CanonicalWriter::new().dec("p", Decimal::new(105, 1)).finish();
        assert_eq!(a, b);
        assert_eq!(a, "p:10.5");
    }

    #[test]
    fn quotes_are_escaped() {
        let s = CanonicalWriter::new().str("data", "a\"b").finish();
        assert_eq!(s, "data:\"a\\\"b\"");
    }
}
