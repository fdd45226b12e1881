//! Token-level macro expansion over C-like preprocessing tokens.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::{Result, SemError};

/// Preprocessing token class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PpKind {
    Ident,
    /// pp-number: `0`, `0xff`, `4_4`.
    Number,
    Punct,
    Str,
}

/// A preprocessing token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PpToken {
    pub kind: PpKind,
    pub text: String,
    /// Byte offset in the source, or of the macro use it came from.
    pub pos: usize,
    /// Macros that must not expand this token again.
    hide: Vec<String>,
}

impl PpToken {
    #[must_use]
    pub fn new(kind: PpKind, text: impl Into<String>, pos: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
            hide: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == PpKind::Punct && self.text == p
    }

    #[must_use]
    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == PpKind::Ident && self.text == name
    }

    fn hidden(&self, name: &str) -> bool {
        self.hide.iter().any(|h| h == name)
    }
}

const PUNCT3: [&str; 3] = ["<<=", ">>=", "..."];
const PUNCT2: [&str; 20] = [
    "##", "->", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+=", "-=", "*=",
    "/=", "%=", "&=", "|=", "^=",
];

/// Split C-like source into preprocessing tokens. Whitespace and comments
/// are dropped.
///
/// # Errors
///
/// Returns [`SemError::Lex`] on a character outside the C source set or an
/// unterminated string.
pub fn pp_tokenize(src: &str) -> Result<Vec<PpToken>> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if src[i..].starts_with("/*") {
            i = src[i + 2..].find("*/").map_or(bytes.len(), |end| i + 2 + end + 2);
            continue;
        }
        if src[i..].starts_with("//") {
            i = src[i..].find('\n').map_or(bytes.len(), |end| i + end);
            continue;
        }

        let kind = if c.is_ascii_alphabetic() || c == b'_' {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            PpKind::Ident
        } else if c.is_ascii_digit()
            || (c == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit))
        {
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.')
            {
                i += 1;
            }
            PpKind::Number
        } else if c == b'"' || c == b'\'' {
            i += 1;
            while i < bytes.len() && bytes[i] != c {
                i += if bytes[i] == b'\\' { 2 } else { 1 };
            }
            if i >= bytes.len() {
                return Err(SemError::Lex {
                    text: src[start..].to_string(),
                    pos: start,
                });
            }
            i += 1;
            PpKind::Str
        } else if c.is_ascii_punctuation() {
            let rest = &src[i..];
            let len = PUNCT3
                .iter()
                .chain(PUNCT2.iter())
                .find(|p| rest.starts_with(*p))
                .map_or(1, |p| p.len());
            i += len;
            PpKind::Punct
        } else {
            let ch = src[i..].chars().next().unwrap_or('?');
            return Err(SemError::Lex {
                text: ch.to_string(),
                pos: start,
            });
        };

        tokens.push(PpToken::new(kind, &src[start..i], start));
    }

    Ok(tokens)
}

/// Render tokens back to text, inserting a space only where two tokens
/// would otherwise run together.
#[must_use]
pub fn render(tokens: &[PpToken]) -> String {
    let mut out = String::new();
    let mut prev: Option<&PpToken> = None;
    for tok in tokens {
        if let Some(p) = prev
            && needs_space(p, tok)
        {
            out.push(' ');
        }
        out.push_str(&tok.text);
        prev = Some(tok);
    }
    out
}

fn needs_space(prev: &PpToken, next: &PpToken) -> bool {
    let wordy = |t: &PpToken| matches!(t.kind, PpKind::Ident | PpKind::Number);
    if wordy(prev) && wordy(next) {
        return true;
    }
    if prev.kind == PpKind::Punct && next.kind == PpKind::Punct {
        let joined = format!("{}{}", prev.text, next.text);
        return PUNCT3
            .iter()
            .chain(PUNCT2.iter())
            .any(|p| joined.starts_with(p) && p.len() > prev.text.len());
    }
    false
}

/// One macro definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacroDef {
    pub name: String,
    /// `None` for object-like macros.
    pub params: Option<Vec<String>>,
    pub body: Vec<PpToken>,
}

impl MacroDef {
    /// Parse a definition in `#define` form without the directive:
    /// `NAME body` or `NAME(A, B) body`.
    ///
    /// # Errors
    ///
    /// Returns [`SemError::Macro`] when the name or parameter list is
    /// malformed.
    pub fn parse(def: &str) -> Result<Self> {
        let tokens = pp_tokenize(def)?;
        let mut iter = tokens.into_iter().peekable();

        let name = match iter.next() {
            Some(t) if t.kind == PpKind::Ident => t,
            _ => return Err(SemError::Macro(format!("bad definition '{def}'"))),
        };
        let name_end = name.pos + name.text.len();

        // Function-like only when '(' follows the name directly.
        let params = if iter
            .peek()
            .is_some_and(|t| t.is_punct("(") && t.pos == name_end)
        {
            iter.next();
            let mut params = Vec::new();
            loop {
                match iter.next() {
                    Some(t) if t.is_punct(")") && params.is_empty() => break,
                    Some(t) if t.kind == PpKind::Ident => params.push(t.text),
                    _ => return Err(SemError::Macro(format!("bad parameter list in '{def}'"))),
                }
                match iter.next() {
                    Some(t) if t.is_punct(",") => {}
                    Some(t) if t.is_punct(")") => break,
                    _ => return Err(SemError::Macro(format!("bad parameter list in '{def}'"))),
                }
            }
            Some(params)
        } else {
            None
        };

        Ok(Self {
            name: name.text,
            params,
            body: iter.collect(),
        })
    }

    fn param_index(&self, tok: &PpToken) -> Option<usize> {
        if tok.kind != PpKind::Ident {
            return None;
        }
        self.params.as_ref()?.iter().position(|p| *p == tok.text)
    }
}

/// Standard normalization rules, in definition order.
const STANDARD: &[&str] = &[
    // No-op macros.
    "fBRANCH_SPECULATE_STALL(DOTNEWVAL, JUMP_COND, SPEC_DIR, HINTBITNUM, STRBITNUM)",
    "fHIDE(A)",
    "CANCEL",
    "LOAD_CANCEL(A)",
    "STORE_CANCEL(A)",
    "fFRAMECHECK(ADDR, EA)",
    "fBARRIER()",
    "fSYNCH()",
    "fISYNC()",
    "fICFETCH(REG)",
    "fDCFETCH(REG)",
    "fICINVA(REG)",
    "fL2FETCH(ADDR, HEIGHT, WIDTH, STRIDE, FLAGS)",
    "fDCCLEANA(REG)",
    "fDCCLEANINVA(REG)",
    "fDCINVA(REG)",
    "fPAUSE(IMM)",
    // Aliases.
    "fFRAME_UNSCRAMBLE(VAL) VAL",
    "fECHO(A) A",
    "fLSBOLDNOT(VAL) !fLSBOLD(VAL)",
    "fCONSTLL(A) fCAST8s(A)",
    // Zero and sign extension.
    "fZXTN(N, M, VAL) ((VAL) & ((1<<(N))-1))",
    "fSXTN(N, M, VAL) ((fZXTN(N,M,VAL) ^ (1<<((N)-1))) - (1<<((N)-1)))",
    // Calls.
    "fCALL(A) { fBRANCH(A, COF_TYPE_CALL); }",
    "fCALLR(A) { fBRANCH(A, COF_TYPE_CALLR); }",
    // Effective address.
    "fEA_RI(REG, IMM) { EA = REG + IMM; }",
    "fEA_RRs(REG, REG2, SCALE) { EA = REG + (REG2 << SCALE); }",
    "fEA_IRs(IMM, REG, SCALE) { EA = IMM + (REG << SCALE); }",
    "fEA_IMM(IMM) { EA = (IMM); }",
    "fEA_REG(REG) { EA = (REG); }",
    "fEA_GPI(IMM) { EA = (fREAD_GP() + (IMM)); }",
    "fPM_I(REG, IMM) { REG = REG + (IMM); }",
    "fPM_M(REG, MVAL) { REG = REG + (MVAL); }",
    // Casts and shifts.
    "fCAST4_4s(A) fCAST4s(A)",
    "fCAST4_4u(A) fCAST4u(A)",
    "fCAST8_8s(A) fCAST8s(A)",
    "fCAST8_8u(A) fCAST8u(A)",
    "fASHIFTL(SRC, SHAMT, REGSTYPE) (fCAST##REGSTYPE##s(SRC) << (SHAMT))",
    "fASHIFTR(SRC, SHAMT, REGSTYPE) (fCAST##REGSTYPE##s(SRC) >> (SHAMT))",
    "fLSHIFTR(SRC, SHAMT, REGSTYPE) (fCAST##REGSTYPE##u(SRC) >> (SHAMT))",
    "fROTL(SRC, SHAMT, REGSTYPE) (fROTL##REGSTYPE##u(SRC, SHAMT))",
    // Multiplies.
    "fSE32_64(A) (fCAST8s(fCAST4s(A)))",
    "fZE32_64(A) (fCAST8u(fCAST4u(A)))",
    "fMPY32SS(A, B) (fSE32_64(A) * fSE32_64(B))",
    "fMPY32UU(A, B) (fZE32_64(A) * fZE32_64(B))",
    "fMPY32SU(A, B) (fSE32_64(A) * fZE32_64(B))",
    // Object-like forms to calls.
    "fLSBNEW0 fLSBNEW(0)",
    "fLSBNEW1 fLSBNEW(1)",
    "fLSBNEW0NOT !fLSBNEW(0)",
    "fLSBNEW1NOT !fLSBNEW(1)",
    "fLSBNEWNOT(PNUM) !fLSBNEW(PNUM)",
    "fGET_LPCFG fREAD_LPCFG()",
    "fREAD_SA0 fREAD_SA(0)",
    "fREAD_SA1 fREAD_SA(1)",
    "fREAD_LC0 fREAD_LC(0)",
    "fREAD_LC1 fREAD_LC(1)",
    "fWRITE_LC0(VAL) fWRITE_LC(0, VAL)",
    "fWRITE_LC1(VAL) fWRITE_LC(1, VAL)",
    "fWRITE_LOOP_REGS0(START, COUNT) fWRITE_LOOP_REGS(0, START, COUNT)",
    "fWRITE_LOOP_REGS1(START, COUNT) fWRITE_LOOP_REGS(1, START, COUNT)",
    // Locked memory access.
    "fLOAD_LOCKED(NUM, SIZE, SIGN, EA, DST) fLOAD(NUM, SIZE, SIGN, EA, DST);",
    "fSTORE_LOCKED(NUM, SIZE, EA, SRC, PRED) fSTORE_LOCKED(NUM, SIZE, EA, SRC, PRED);",
    // Must-extend immediates.
    "fMUST_IMMEXT(IMM) fIMMEXT(IMM)",
];

/// A set of macro definitions and the expander over them.
#[derive(Clone, Debug, Default)]
pub struct MacroTable {
    defs: FxHashMap<String, MacroDef>,
}

impl MacroTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The normalization rules for Hexagon semantics.
    ///
    /// # Errors
    ///
    /// Fails only if a built-in definition does not parse.
    pub fn standard() -> Result<Self> {
        let mut table = Self::new();
        for def in STANDARD {
            table.define(def)?;
        }
        Ok(table)
    }

    /// Add or replace a definition.
    ///
    /// # Errors
    ///
    /// Returns [`SemError::Macro`] for a malformed definition.
    pub fn define(&mut self, def: &str) -> Result<()> {
        let def = MacroDef::parse(def)?;
        self.defs.insert(def.name.clone(), def);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MacroDef> {
        self.defs.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    fn lookup(&self, tok: &PpToken) -> Option<&MacroDef> {
        if tok.kind != PpKind::Ident || tok.hidden(&tok.text) {
            return None;
        }
        self.defs.get(&tok.text)
    }

    /// Fully expand a token sequence.
    ///
    /// # Errors
    ///
    /// Fails on an unterminated macro call, an argument-count mismatch or an
    /// invalid `##` paste.
    pub fn expand(&self, tokens: Vec<PpToken>) -> Result<Vec<PpToken>> {
        let mut pending: VecDeque<PpToken> = tokens.into();
        let mut out = Vec::with_capacity(pending.len());

        while let Some(tok) = pending.pop_front() {
            let Some(def) = self.lookup(&tok) else {
                out.push(tok);
                continue;
            };

            let expansion = match &def.params {
                None => def.body.clone(),
                Some(params) => {
                    if !pending.front().is_some_and(|t| t.is_punct("(")) {
                        out.push(tok);
                        continue;
                    }
                    let args = take_args(&mut pending, &def.name)?;
                    let args = match_arity(&def.name, params.len(), args)?;
                    self.substitute(def, &args)?
                }
            };

            for mut t in expansion.into_iter().rev() {
                t.pos = tok.pos;
                for h in &tok.hide {
                    if !t.hidden(h) {
                        t.hide.push(h.clone());
                    }
                }
                if !t.hidden(&def.name) {
                    t.hide.push(def.name.clone());
                }
                pending.push_front(t);
            }
        }

        Ok(out)
    }

    fn substitute(&self, def: &MacroDef, args: &[Vec<PpToken>]) -> Result<Vec<PpToken>> {
        let body = &def.body;
        let mut out: Vec<PpToken> = Vec::new();
        let mut i = 0;

        while i < body.len() {
            let tok = &body[i];
            if tok.is_punct("##") {
                let Some(next) = body.get(i + 1) else {
                    return Err(SemError::Macro(format!("'##' ends {}", def.name)));
                };
                let rhs = def
                    .param_index(next)
                    .map_or_else(|| vec![next.clone()], |p| args[p].clone());
                paste(&mut out, rhs)?;
                i += 2;
                continue;
            }

            match def.param_index(tok) {
                // Operands of '##' are pasted unexpanded.
                Some(p) if body.get(i + 1).is_some_and(|t| t.is_punct("##")) => {
                    out.extend(args[p].iter().cloned());
                }
                Some(p) => out.extend(self.expand(args[p].clone())?),
                None => out.push(tok.clone()),
            }
            i += 1;
        }

        Ok(out)
    }
}

/// Consume `( arg, arg, ... )` from the front of `pending`.
fn take_args(pending: &mut VecDeque<PpToken>, name: &str) -> Result<Vec<Vec<PpToken>>> {
    pending.pop_front();
    let mut args = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0usize;

    loop {
        let Some(tok) = pending.pop_front() else {
            return Err(SemError::Macro(format!("unterminated call to {name}")));
        };
        if tok.is_punct("(") {
            depth += 1;
        } else if tok.is_punct(")") {
            if depth == 0 {
                args.push(current);
                return Ok(args);
            }
            depth -= 1;
        } else if tok.is_punct(",") && depth == 0 {
            args.push(std::mem::take(&mut current));
            continue;
        }
        current.push(tok);
    }
}

fn match_arity(name: &str, expected: usize, args: Vec<Vec<PpToken>>) -> Result<Vec<Vec<PpToken>>> {
    // `f()` passes one empty argument.
    if expected == 0 && args.len() == 1 && args[0].is_empty() {
        return Ok(Vec::new());
    }
    if args.len() != expected {
        return Err(SemError::Arity {
            name: name.to_string(),
            expected,
            found: args.len(),
        });
    }
    Ok(args)
}

fn paste(out: &mut Vec<PpToken>, rhs: Vec<PpToken>) -> Result<()> {
    let mut rhs = rhs.into_iter();
    let Some(first) = rhs.next() else {
        return Ok(());
    };
    let Some(left) = out.pop() else {
        out.push(first);
        out.extend(rhs);
        return Ok(());
    };

    let text = format!("{}{}", left.text, first.text);
    let pasted = pp_tokenize(&text)?;
    let [tok] = pasted.as_slice() else {
        return Err(SemError::Macro(format!(
            "pasting '{}' and '{}' does not give a token",
            left.text, first.text
        )));
    };
    out.push(PpToken::new(tok.kind, text, left.pos));
    out.extend(rhs);
    Ok(())
}
