//! Parse options: immutable once the parser is constructed. Mirrors the
//! `csv_parse_options_t` field set from the original C header, expressed as
//! a builder rather than a struct literal with every field public, so new
//! options can be added without breaking callers.

use crate::error::{Error, ErrorKind};

/// Default maximum field size: 10 MiB.
pub const DEFAULT_MAX_FIELD_SIZE: usize = 10 * 1024 * 1024;
/// Default maximum row size: 100 MiB.
pub const DEFAULT_MAX_ROW_SIZE: usize = 100 * 1024 * 1024;
/// Default buffer hint for `parse_stream`/`parse_file`: 64 KiB.
pub const DEFAULT_BUFFER_HINT: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    pub delimiter: u8,
    pub quote: u8,
    pub double_quote: bool,
    pub trim: bool,
    pub ignore_empty_lines: bool,
    pub strict: bool,
    pub max_field_size: usize,
    pub max_row_size: usize,
    pub buffer_hint: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            delimiter: b',',
            quote: b'"',
            double_quote: true,
            trim: false,
            ignore_empty_lines: true,
            strict: false,
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
            max_row_size: DEFAULT_MAX_ROW_SIZE,
            buffer_hint: DEFAULT_BUFFER_HINT,
        }
    }
}

impl ParserOptions {
    pub fn builder() -> ParserOptionsBuilder {
        ParserOptionsBuilder::default()
    }

    /// Reject configurations that could never parse anything sensibly.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.delimiter == self.quote {
            return Err(Error::new(
                ErrorKind::InvalidArguments,
                "delimiter and quote must differ",
            ));
        }
        if self.max_field_size == 0 || self.max_row_size == 0 {
            return Err(Error::new(
                ErrorKind::InvalidArguments,
                "max_field_size and max_row_size must be nonzero",
            ));
        }
        if self.max_field_size > self.max_row_size {
            return Err(Error::new(
                ErrorKind::InvalidArguments,
                "max_field_size must not exceed max_row_size",
            ));
        }
        if self.buffer_hint == 0 {
            return Err(Error::new(
                ErrorKind::InvalidArguments,
                "buffer_hint must be nonzero",
            ));
        }
        Ok(())
    }
}

/// Builder for [`ParserOptions`], so call sites read as a sequence of named
/// overrides rather than a large positional struct literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptionsBuilder {
    opts: OptionalOptions,
}

// Every field optional so `build()` can fall back to `ParserOptions::default()`
// field-by-field without re-deriving Default bookkeeping by hand.
#[derive(Debug, Clone, Copy, Default)]
struct OptionalOptions {
    delimiter: Option<u8>,
    quote: Option<u8>,
    double_quote: Option<bool>,
    trim: Option<bool>,
    ignore_empty_lines: Option<bool>,
    strict: Option<bool>,
    max_field_size: Option<usize>,
    max_row_size: Option<usize>,
    buffer_hint: Option<usize>,
}

impl ParserOptionsBuilder {
    pub fn delimiter(mut self, b: u8) -> Self {
        self.opts.delimiter = Some(b);
        self
    }

    pub fn quote(mut self, b: u8) -> Self {
        self.opts.quote = Some(b);
        self
    }

    pub fn double_quote(mut self, on: bool) -> Self {
        self.opts.double_quote = Some(on);
        self
    }

    pub fn trim(mut self, on: bool) -> Self {
        self.opts.trim = Some(on);
        self
    }

    pub fn ignore_empty_lines(mut self, on: bool) -> Self {
        self.opts.ignore_empty_lines = Some(on);
        self
    }

    pub fn strict(mut self, on: bool) -> Self {
        self.opts.strict = Some(on);
        self
    }

    pub fn max_field_size(mut self, n: usize) -> Self {
        self.opts.max_field_size = Some(n);
        self
    }

    pub fn max_row_size(mut self, n: usize) -> Self {
        self.opts.max_row_size = Some(n);
        self
    }

    pub fn buffer_hint(mut self, n: usize) -> Self {
        self.opts.buffer_hint = Some(n);
        self
    }

    pub fn build(self) -> Result<ParserOptions, Error> {
        let defaults = ParserOptions::default();
        let opts = ParserOptions {
            delimiter: self.opts.delimiter.unwrap_or(defaults.delimiter),
            quote: self.opts.quote.unwrap_or(defaults.quote),
            double_quote: self.opts.double_quote.unwrap_or(defaults.double_quote),
            trim: self.opts.trim.unwrap_or(defaults.trim),
            ignore_empty_lines: self
                .opts
                .ignore_empty_lines
                .unwrap_or(defaults.ignore_empty_lines),
            strict: self.opts.strict.unwrap_or(defaults.strict),
            max_field_size: self.opts.max_field_size.unwrap_or(defaults.max_field_size),
            max_row_size: self.opts.max_row_size.unwrap_or(defaults.max_row_size),
            buffer_hint: self.opts.buffer_hint.unwrap_or(defaults.buffer_hint),
        };
        opts.validate()?;
        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_wire_contract() {
        let o = ParserOptions::default();
        assert_eq!(o.delimiter, b',');
        assert_eq!(o.quote, b'"');
        assert!(o.double_quote);
        assert!(!o.trim);
        assert!(o.ignore_empty_lines);
        assert!(!o.strict);
        assert_eq!(o.max_field_size, DEFAULT_MAX_FIELD_SIZE);
        assert_eq!(o.max_row_size, DEFAULT_MAX_ROW_SIZE);
        assert_eq!(o.buffer_hint, DEFAULT_BUFFER_HINT);
    }

    #[test]
    fn builder_overrides_selected_fields() {
        let o = ParserOptions::builder()
            .delimiter(b'\t')
            .strict(true)
            .build()
            .unwrap();
        assert_eq!(o.delimiter, b'\t');
        assert!(o.strict);
        assert_eq!(o.quote, b'"'); // untouched field keeps the default
    }

    #[test]
    fn rejects_delimiter_equal_to_quote() {
        let err = ParserOptions::builder().delimiter(b'"').build().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArguments);
    }

    #[test]
    fn rejects_zero_limits() {
        assert!(ParserOptions::builder().max_field_size(0).build().is_err());
        assert!(ParserOptions::builder().max_row_size(0).build().is_err());
        assert!(ParserOptions::builder().buffer_hint(0).build().is_err());
    }

    #[test]
    fn rejects_field_cap_exceeding_row_cap() {
        let err = ParserOptions::builder()
            .max_field_size(100)
            .max_row_size(50)
            .build()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArguments);
    }
}
