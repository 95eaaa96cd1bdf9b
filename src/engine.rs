//! The tokenizer state machine: the core of the crate. Drives three states
//! (`FieldStart`, `InQuoted`, `AfterClosingQuote`) across a single call's
//! buffer, suspending cleanly at the end of input and resuming from exactly
//! where it left off on the next call.
//!
//! The buffers it operates on (`FieldTable`, `FieldAccumulator`,
//! `Carryover`, `Stats`) are owned by [`crate::parser::Parser`] and passed
//! in by reference each call; `Engine` itself holds only the small scalar
//! state that must persist between calls (state, accumulation offsets,
//! stream position, pending-CR flag).

use crate::buffers::{Carryover, FieldAccumulator};
use crate::charclass::{CharClass, CharClassTable};
use crate::error::{Error, ErrorKind};
use crate::field::{FieldTable, Row, Source};
use crate::options::ParserOptions;
use crate::simd::{self, ScanResult};
use crate::stats::Stats;

const LF: u8 = b'\n';
const CR: u8 = b'\r';
const SPACE: u8 = b' ';
const TAB: u8 = b'\t';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenizerState {
    FieldStart,
    InQuoted,
    AfterClosingQuote,
}

/// Persistent tokenizer state, carried across `parse_buffer` calls.
#[derive(Debug)]
pub struct Engine {
    state: TokenizerState,
    /// True while the field currently open in `FieldStart` mode has its
    /// bytes-so-far living in the accumulator rather than a zero-copy slice
    /// of the caller's buffer — set the first time such a field straddles
    /// a chunk boundary, cleared when that field is emitted.
    field_in_accum: bool,
    /// Start offset into the accumulator of the field currently being
    /// built, valid whenever `field_in_accum` is true or `state` is
    /// `InQuoted` / `AfterClosingQuote`.
    field_accum_start: usize,
    pending_cr: bool,
    current_row_byte_offset: u64,
    stream_bytes_consumed: u64,
    row_number: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            state: TokenizerState::FieldStart,
            field_in_accum: false,
            field_accum_start: 0,
            pending_cr: false,
            current_row_byte_offset: 0,
            stream_bytes_consumed: 0,
            row_number: 0,
        }
    }

    /// Restore just-constructed state. Retains nothing buffer-related —
    /// callers are expected to clear `FieldTable`/`FieldAccumulator`/
    /// `Carryover` themselves, as `Parser::reset` does.
    pub fn reset(&mut self) {
        *self = Engine::new();
    }

    pub fn row_number(&self) -> u64 {
        self.row_number
    }

    /// Feed one buffer through the state machine, emitting zero or more
    /// complete rows via `on_row` before returning.
    ///
    /// `is_final` marks end of stream: any field or row left open at EOF is
    /// force-closed per the non-strict recovery policy, or reported as
    /// `ParseError` in strict mode.
    pub fn process<F>(
        &mut self,
        input: &[u8],
        is_final: bool,
        options: &ParserOptions,
        char_table: &CharClassTable,
        accumulator: &mut FieldAccumulator,
        carryover: &mut Carryover,
        field_table: &mut FieldTable,
        stats: &mut Stats,
        mut on_row: F,
    ) -> Result<(), Error>
    where
        F: FnMut(Row<'_>),
    {
        let started_at = std::time::Instant::now();
        stats.note_bytes_in(input.len());

        let mut cursor = 0usize;

        if self.pending_cr {
            self.pending_cr = false;
            if input.first() == Some(&LF) {
                cursor = 1;
            }
        }

        if !carryover.is_empty() {
            let start = accumulator.mark();
            let fold_result = accumulator.push_slice(carryover.as_slice(), start, options.max_field_size);
            carryover.clear();
            fold_result?;
            self.field_accum_start = start;
            self.field_in_accum = true;
        }

        let mut field_begin = cursor;

        let outcome = self.run(
            input,
            is_final,
            options,
            char_table,
            accumulator,
            field_table,
            stats,
            &mut cursor,
            &mut field_begin,
            &mut on_row,
        );

        self.stream_bytes_consumed += input.len() as u64;
        stats.note_peak_memory(
            accumulator.as_slice().len()
                + carryover.as_slice().len()
                + field_table.capacity() * std::mem::size_of::<crate::field::FieldSlot>(),
        );
        stats.note_parse_time(started_at.elapsed());

        match outcome {
            Ok(()) => {
                if self.state == TokenizerState::FieldStart
                    && !self.field_in_accum
                    && field_begin < input.len()
                {
                    carryover.set(&input[field_begin..], options.max_row_size)?;
                }
                Ok(())
            }
            Err(e) => {
                stats.note_error();
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run<F>(
        &mut self,
        input: &[u8],
        is_final: bool,
        options: &ParserOptions,
        char_table: &CharClassTable,
        accumulator: &mut FieldAccumulator,
        field_table: &mut FieldTable,
        stats: &mut Stats,
        cursor: &mut usize,
        field_begin: &mut usize,
        on_row: &mut F,
    ) -> Result<(), Error>
    where
        F: FnMut(Row<'_>),
    {
        // A flush call (typically `parse_buffer(&[], true)`, or one that
        // exhausted itself purely swallowing a pending CR's LF) that finds
        // nothing pending must not synthesize a spurious empty row.
        if is_final
            && self.state == TokenizerState::FieldStart
            && !self.field_in_accum
            && field_table.is_empty()
            && *cursor >= input.len()
        {
            return Ok(());
        }

        loop {
            match self.state {
                TokenizerState::FieldStart => {
                    let at_fresh_field_start = !self.field_in_accum && *cursor == *field_begin;
                    if at_fresh_field_start
                        && *cursor < input.len()
                        && input[*cursor] == options.quote
                    {
                        self.state = TokenizerState::InQuoted;
                        self.field_accum_start = accumulator.mark();
                        *cursor += 1;
                        continue;
                    }

                    // An empty remainder flows straight to `ScanResult::NotFound(0)`
                    // below, which already knows how to finalize on `is_final`
                    // rather than silently dropping an open field at EOF.
                    stats_note_scan(stats, input.len() - *cursor);
                    match scan(&input[*cursor..], options) {
                        ScanResult::Found(k) => {
                            let abs = *cursor + k;
                            let byte = input[abs];

                            if byte == options.quote {
                                if options.strict {
                                    return self.fail(
                                        ErrorKind::ParseError,
                                        "quote byte inside unquoted field",
                                        field_table,
                                        accumulator,
                                    );
                                }
                                log::warn!(
                                    "streamcsv: quote byte inside unquoted field near row {}, treating as data (non-strict)",
                                    self.row_number + 1
                                );
                                if self.field_in_accum {
                                    accumulator.push_slice(
                                        &input[*cursor..=abs],
                                        self.field_accum_start,
                                        options.max_field_size,
                                    )?;
                                }
                                *cursor = abs + 1;
                                continue;
                            }

                            let (source, offset, length) = if self.field_in_accum {
                                accumulator.push_slice(
                                    &input[*cursor..abs],
                                    self.field_accum_start,
                                    options.max_field_size,
                                )?;
                                let (o, l) = maybe_trim(
                                    options,
                                    accumulator.as_slice(),
                                    self.field_accum_start,
                                    accumulator.len() - self.field_accum_start,
                                );
                                (Source::Accum, o, l)
                            } else {
                                let (o, l) =
                                    maybe_trim(options, input, *field_begin, abs - *field_begin);
                                (Source::Input, o, l)
                            };
                            field_table.push(source, offset, length, false);
                            self.field_in_accum = false;

                            if byte == options.delimiter {
                                *cursor = abs + 1;
                                *field_begin = *cursor;
                                continue;
                            }

                            let (next_cursor, set_pending) =
                                consume_terminator(input, abs, is_final);
                            *cursor = next_cursor;
                            self.pending_cr = set_pending;
                            self.finish_row(input, options, accumulator, field_table, stats, on_row)?;
                            self.current_row_byte_offset =
                                self.stream_bytes_consumed + *cursor as u64;
                            *field_begin = *cursor;
                        }
                        ScanResult::NotFound(_) => {
                            if is_final {
                                let (source, offset, length) = if self.field_in_accum {
                                    accumulator.push_slice(
                                        &input[*cursor..],
                                        self.field_accum_start,
                                        options.max_field_size,
                                    )?;
                                    let (o, l) = maybe_trim(
                                        options,
                                        accumulator.as_slice(),
                                        self.field_accum_start,
                                        accumulator.len() - self.field_accum_start,
                                    );
                                    (Source::Accum, o, l)
                                } else {
                                    let (o, l) = maybe_trim(
                                        options,
                                        input,
                                        *field_begin,
                                        input.len() - *field_begin,
                                    );
                                    (Source::Input, o, l)
                                };
                                field_table.push(source, offset, length, false);
                                self.field_in_accum = false;
                                *cursor = input.len();
                                self.finish_row(
                                    input, options, accumulator, field_table, stats, on_row,
                                )?;
                                *field_begin = *cursor;
                            } else {
                                if self.field_in_accum {
                                    accumulator.push_slice(
                                        &input[*cursor..],
                                        self.field_accum_start,
                                        options.max_field_size,
                                    )?;
                                }
                                *cursor = input.len();
                            }
                            return Ok(());
                        }
                    }
                }

                TokenizerState::InQuoted => {
                    // An empty remainder flows straight to `ScanResult::NotFound(0)`
                    // below, which already knows how to finalize on `is_final`.
                    match simd::quote_scan(&input[*cursor..], options.quote) {
                        ScanResult::Found(k) => {
                            let abs = *cursor + k;
                            accumulator.push_slice(
                                &input[*cursor..abs],
                                self.field_accum_start,
                                options.max_field_size,
                            )?;
                            let next = abs + 1;
                            if options.double_quote
                                && next < input.len()
                                && input[next] == options.quote
                            {
                                accumulator.push_byte(
                                    options.quote,
                                    self.field_accum_start,
                                    options.max_field_size,
                                )?;
                                *cursor = next + 1;
                                continue;
                            }
                            self.state = TokenizerState::AfterClosingQuote;
                            *cursor = next;
                        }
                        ScanResult::NotFound(_) => {
                            accumulator.push_slice(
                                &input[*cursor..],
                                self.field_accum_start,
                                options.max_field_size,
                            )?;
                            *cursor = input.len();
                            if is_final {
                                if options.strict {
                                    return self.fail(
                                        ErrorKind::ParseError,
                                        "unterminated quoted field",
                                        field_table,
                                        accumulator,
                                    );
                                }
                                log::warn!(
                                    "streamcsv: unterminated quoted field at EOF near row {}, closing with bytes accumulated so far (non-strict)",
                                    self.row_number + 1
                                );
                                let length = accumulator.len() - self.field_accum_start;
                                field_table.push(
                                    Source::Accum,
                                    self.field_accum_start,
                                    length,
                                    true,
                                );
                                self.field_in_accum = false;
                                self.state = TokenizerState::FieldStart;
                                self.finish_row(
                                    input, options, accumulator, field_table, stats, on_row,
                                )?;
                                *field_begin = *cursor;
                            }
                            return Ok(());
                        }
                    }
                }

                TokenizerState::AfterClosingQuote => {
                    if *cursor >= input.len() {
                        if is_final {
                            let length = accumulator.len() - self.field_accum_start;
                            field_table.push(Source::Accum, self.field_accum_start, length, true);
                            self.field_in_accum = false;
                            self.state = TokenizerState::FieldStart;
                            self.finish_row(input, options, accumulator, field_table, stats, on_row)?;
                            *field_begin = *cursor;
                        }
                        return Ok(());
                    }

                    let byte = input[*cursor];
                    match char_table.classify(byte) {
                        CharClass::Delimiter => {
                            let length = accumulator.len() - self.field_accum_start;
                            field_table.push(Source::Accum, self.field_accum_start, length, true);
                            self.field_in_accum = false;
                            *cursor += 1;
                            *field_begin = *cursor;
                            self.state = TokenizerState::FieldStart;
                        }
                        CharClass::LineTerminator => {
                            let length = accumulator.len() - self.field_accum_start;
                            field_table.push(Source::Accum, self.field_accum_start, length, true);
                            self.field_in_accum = false;
                            let (next_cursor, set_pending) =
                                consume_terminator(input, *cursor, is_final);
                            *cursor = next_cursor;
                            self.pending_cr = set_pending;
                            self.state = TokenizerState::FieldStart;
                            self.finish_row(input, options, accumulator, field_table, stats, on_row)?;
                            self.current_row_byte_offset =
                                self.stream_bytes_consumed + *cursor as u64;
                            *field_begin = *cursor;
                        }
                        CharClass::Whitespace => {
                            *cursor += 1;
                        }
                        _ => {
                            if options.strict {
                                return self.fail(
                                    ErrorKind::ParseError,
                                    "unexpected character after closing quote",
                                    field_table,
                                    accumulator,
                                );
                            }
                            log::warn!(
                                "streamcsv: unexpected byte {:#04x} after closing quote near row {}, reopening the field (non-strict)",
                                byte,
                                self.row_number + 1
                            );
                            accumulator.push_byte(
                                options.quote,
                                self.field_accum_start,
                                options.max_field_size,
                            )?;
                            accumulator.push_byte(
                                byte,
                                self.field_accum_start,
                                options.max_field_size,
                            )?;
                            *cursor += 1;
                            self.state = TokenizerState::InQuoted;
                        }
                    }
                }
            }
        }
    }

    fn finish_row<F: FnMut(Row<'_>)>(
        &mut self,
        input: &[u8],
        options: &ParserOptions,
        accumulator: &mut FieldAccumulator,
        field_table: &mut FieldTable,
        stats: &mut Stats,
        on_row: &mut F,
    ) -> Result<(), Error> {
        if field_table.is_empty() {
            if options.ignore_empty_lines {
                return Ok(());
            }
        } else if options.ignore_empty_lines
            && field_table.len() == 1
            && field_table.slots()[0].length == 0
        {
            field_table.clear();
            accumulator.clear();
            return Ok(());
        }

        let total: usize = field_table.slots().iter().map(|s| s.length).sum();
        if total > options.max_row_size {
            log::warn!(
                "streamcsv: row near {} rejected, {} bytes exceeds max_row_size {}",
                self.row_number + 1,
                total,
                options.max_row_size
            );
            field_table.clear();
            accumulator.clear();
            return Err(
                Error::new(ErrorKind::RowTooLarge, "row exceeds max_row_size")
                    .at_row(self.row_number + 1),
            );
        }

        self.row_number += 1;
        stats.note_row(field_table.len());
        let row_number = self.row_number;
        let byte_offset = self.current_row_byte_offset;
        {
            let row = Row::new(
                input,
                accumulator.as_slice(),
                field_table.slots(),
                row_number,
                byte_offset,
            );
            on_row(row);
        }
        field_table.clear();
        accumulator.clear();
        Ok(())
    }

    fn fail(
        &mut self,
        kind: ErrorKind,
        message: &str,
        field_table: &mut FieldTable,
        accumulator: &mut FieldAccumulator,
    ) -> Result<(), Error> {
        field_table.clear();
        accumulator.clear();
        Err(Error::new(kind, message).at_row(self.row_number + 1))
    }
}

fn scan(bytes: &[u8], options: &ParserOptions) -> ScanResult {
    simd::scan_structural(bytes, options.delimiter, options.quote, LF, CR)
}

fn stats_note_scan(stats: &mut Stats, len: usize) {
    if simd::used_simd_for(len) {
        stats.note_simd_chunk();
    } else {
        stats.note_scalar_chunk();
    }
}

/// Trims ASCII space/tab from both ends of `buf[offset..offset+length]`
/// when `options.trim` is set; returns the (possibly narrowed) range
/// unchanged otherwise. Quoted fields never pass through here.
fn maybe_trim(options: &ParserOptions, buf: &[u8], offset: usize, length: usize) -> (usize, usize) {
    if !options.trim || length == 0 {
        return (offset, length);
    }
    let slice = &buf[offset..offset + length];
    let start = slice
        .iter()
        .position(|&b| b != SPACE && b != TAB)
        .unwrap_or(slice.len());
    let end = slice
        .iter()
        .rposition(|&b| b != SPACE && b != TAB)
        .map(|i| i + 1)
        .unwrap_or(start);
    (offset + start, end - start)
}

/// Given that `input[at]` is known to be LF or CR, determines how far past
/// it the cursor should advance and whether a trailing bare CR must set
/// `pending_cr` for the next call to resolve (swallowing a following LF
/// that hasn't arrived yet).
fn consume_terminator(input: &[u8], at: usize, is_final: bool) -> (usize, bool) {
    if input[at] == LF {
        return (at + 1, false);
    }
    debug_assert_eq!(input[at], CR);
    match input.get(at + 1) {
        Some(&LF) => (at + 2, false),
        Some(_) => (at + 1, false),
        None => {
            if is_final {
                (at + 1, false)
            } else {
                (at + 1, true)
            }
        }
    }
}
