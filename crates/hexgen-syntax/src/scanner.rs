//! Whitespace-skipping scanner over one syntax string.
//!
//! Every terminal match first skips whitespace, then matches at the next
//! character only. The scanner remembers the furthest offset at which any
//! terminal was tried, which is where a failed parse is reported.

use std::cell::Cell;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static WORD: LazyLock<Regex> = LazyLock::new(|| pattern(r"^[A-Za-z]+"));
static DIGIT: LazyLock<Regex> = LazyLock::new(|| pattern(r"^[0-9]"));
static SIGNED: LazyLock<Regex> = LazyLock::new(|| pattern(r"^[+-]?[0-9]+"));
static IMM: LazyLock<Regex> = LazyLock::new(|| pattern(r"^#([rRsSuUm])([0-9]+)(?::([0-9]+))?"));
static REG: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^([MNORCPQXSGVZA])([stuvwxyzdefg]+)\.?([LlHh]?)([0-9]+)S?"));

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("valid terminal pattern")
}

/// Byte range of a match in the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Parts of a register terminal such as `Rt.L32`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegMatch {
    pub class: char,
    pub id: String,
    /// `L`, `l`, `H`, `h` or empty.
    pub half: String,
}

pub struct Scanner<'a> {
    src: &'a str,
    furthest: Cell<usize>,
}

impl<'a> Scanner<'a> {
    pub const fn new(src: &'a str) -> Self {
        Self {
            src,
            furthest: Cell::new(0),
        }
    }

    /// Source text of a span.
    pub fn text(&self, span: Span) -> &'a str {
        &self.src[span.start..span.end]
    }

    /// Offset of the first non-whitespace character at or after `pos`.
    pub fn skip_ws(&self, pos: usize) -> usize {
        let rest = &self.src[pos..];
        pos + (rest.len() - rest.trim_start().len())
    }

    pub fn at_end(&self, pos: usize) -> bool {
        self.skip_ws(pos) == self.src.len()
    }

    /// Furthest offset any terminal was tried at.
    pub fn furthest(&self) -> usize {
        self.furthest.get()
    }

    fn start(&self, pos: usize) -> usize {
        let start = self.skip_ws(pos);
        if start > self.furthest.get() {
            self.furthest.set(start);
        }
        start
    }

    /// Match a literal.
    pub fn lit(&self, pos: usize, s: &str) -> Option<Span> {
        let start = self.start(pos);
        self.src[start..].starts_with(s).then(|| Span {
            start,
            end: start + s.len(),
        })
    }

    /// Every literal of `options` that matches, in order.
    pub fn any_lit(&self, pos: usize, options: &[&str]) -> Vec<Span> {
        options.iter().filter_map(|s| self.lit(pos, s)).collect()
    }

    fn capture(&self, pos: usize, re: &Regex) -> Option<(Span, Captures<'a>)> {
        let start = self.start(pos);
        let caps = re.captures(&self.src[start..])?;
        let whole = caps.get(0)?;
        if whole.start() != 0 || whole.is_empty() {
            return None;
        }
        let span = Span {
            start,
            end: start + whole.end(),
        };
        Some((span, caps))
    }

    /// Longest run of ASCII letters.
    pub fn word(&self, pos: usize) -> Option<Span> {
        self.capture(pos, &WORD).map(|(span, _)| span)
    }

    pub fn digit(&self, pos: usize) -> Option<Span> {
        self.capture(pos, &DIGIT).map(|(span, _)| span)
    }

    /// Optionally signed decimal integer.
    pub fn signed_number(&self, pos: usize) -> Option<(Span, i64)> {
        let (span, _) = self.capture(pos, &SIGNED)?;
        let value = self.text(span).parse().ok()?;
        Some((span, value))
    }

    /// Immediate operand `#<letter><bits>[:<shift>]`; returns the letter.
    pub fn imm(&self, pos: usize) -> Option<(Span, char)> {
        let (span, caps) = self.capture(pos, &IMM)?;
        let letter = caps.get(1)?.as_str().chars().next()?;
        Some((span, letter))
    }

    /// Register operand `<class><id>[.][<half>]<bits>[S]`.
    pub fn reg(&self, pos: usize) -> Option<(Span, RegMatch)> {
        let (span, caps) = self.capture(pos, &REG)?;
        let reg = RegMatch {
            class: caps.get(1)?.as_str().chars().next()?,
            id: caps.get(2)?.as_str().to_string(),
            half: caps.get(3).map_or_else(String::new, |m| m.as_str().to_string()),
        };
        Some((span, reg))
    }
}
