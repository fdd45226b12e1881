//! Lexical classes of normalized semantics.

use crate::macros::{PpKind, PpToken, pp_tokenize};
use crate::{Result, SemError};

/// Token class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Old-value register operand, `RsV`.
    RegOld,
    /// New-value register operand, `NtN`.
    RegNew,
    RegLr,
    /// Immediate operand, `siV`.
    Imm,
    Macro,
    Ea,
    /// Load sign selector, `s` or `u`.
    Sign,
    BranchType,
    /// Lifter temporaries: `tmp`, `width`, `offset`, `shamt`.
    Tmp,
    IntCon,
    StringCon,

    If,
    Else,
    While,
    For,
    Return,
    Cancel,

    /// `+= -= &= ^= |=`
    AssignOp,
    /// `+ - * / | & ^ << >>`
    BinOp,
    /// `== != <= < >= >`
    RelOp,
    /// `&& ||`
    LogOp,
    Assign,
    Bang,
    Tilde,
    Question,
    Colon,
    Comma,
    Semi,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
}

impl TokenKind {
    /// Classes that can name an operand or macro.
    #[must_use]
    pub const fn is_id(self) -> bool {
        matches!(
            self,
            Self::RegOld
                | Self::RegNew
                | Self::RegLr
                | Self::Imm
                | Self::Macro
                | Self::Ea
                | Self::Sign
                | Self::BranchType
                | Self::Tmp
        )
    }
}

/// A classified semantics token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: usize,
}

const REG_TYPES: &[u8] = b"CNPRMQVO";
const REG_IDS: &[&str] = &[
    "d", "e", "dd", "s", "t", "u", "v", "w", "ss", "tt", "uu", "vv", "x", "y", "xx", "yy",
];

fn classify_ident(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "return" => TokenKind::Return,
        "CANCEL" => TokenKind::Cancel,
        "REG_LR" => TokenKind::RegLr,
        "EA" => TokenKind::Ea,
        "s" | "u" => TokenKind::Sign,
        "tmp" | "width" | "offset" | "shamt" => TokenKind::Tmp,
        _ if text.starts_with("COF_TYPE_") => TokenKind::BranchType,
        _ if is_imm(text) => TokenKind::Imm,
        _ => return reg_kind(text).or_else(|| text.starts_with('f').then_some(TokenKind::Macro)),
    };
    Some(kind)
}

fn is_imm(text: &str) -> bool {
    let b = text.as_bytes();
    b.len() == 3 && b"rRsSuUm".contains(&b[0]) && &text[1..] == "iV"
}

fn reg_kind(text: &str) -> Option<TokenKind> {
    let b = text.as_bytes();
    if b.len() < 3 || !REG_TYPES.contains(&b[0]) {
        return None;
    }
    let id = &text[1..text.len() - 1];
    if !REG_IDS.contains(&id) {
        return None;
    }
    match b[b.len() - 1] {
        b'V' => Some(TokenKind::RegOld),
        b'N' => Some(TokenKind::RegNew),
        _ => None,
    }
}

fn is_intcon(text: &str) -> bool {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return hex.bytes().all(|c| c.is_ascii_hexdigit());
    }
    text == "0"
        || (text.as_bytes()[0] != b'0'
            && text.bytes().all(|c| c.is_ascii_digit() || c == b'_'))
}

fn classify_punct(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "+=" | "-=" | "&=" | "^=" | "|=" => TokenKind::AssignOp,
        "+" | "-" | "*" | "/" | "|" | "&" | "^" | "<<" | ">>" => TokenKind::BinOp,
        "==" | "!=" | "<=" | "<" | ">=" | ">" => TokenKind::RelOp,
        "&&" | "||" => TokenKind::LogOp,
        "=" => TokenKind::Assign,
        "!" => TokenKind::Bang,
        "~" => TokenKind::Tilde,
        "?" => TokenKind::Question,
        ":" => TokenKind::Colon,
        "," => TokenKind::Comma,
        ";" => TokenKind::Semi,
        "(" => TokenKind::LParen,
        ")" => TokenKind::RParen,
        "{" => TokenKind::LBrace,
        "}" => TokenKind::RBrace,
        "[" => TokenKind::LBracket,
        "]" => TokenKind::RBracket,
        _ => return None,
    };
    Some(kind)
}

/// Classify preprocessing tokens.
///
/// # Errors
///
/// Returns [`SemError::Lex`] for a token outside every class.
pub fn lex_tokens(tokens: &[PpToken]) -> Result<Vec<Token>> {
    tokens
        .iter()
        .map(|t| {
            let kind = match t.kind {
                PpKind::Ident => classify_ident(&t.text),
                PpKind::Number => is_intcon(&t.text).then_some(TokenKind::IntCon),
                PpKind::Punct => classify_punct(&t.text),
                PpKind::Str => Some(TokenKind::StringCon),
            };
            kind.map(|kind| Token {
                kind,
                text: t.text.clone(),
                pos: t.pos,
            })
            .ok_or_else(|| SemError::Lex {
                text: t.text.clone(),
                pos: t.pos,
            })
        })
        .collect()
}

/// Tokenize and classify normalized semantics text.
///
/// # Errors
///
/// Returns [`SemError::Lex`] for unrecognized input.
pub fn lex(src: &str) -> Result<Vec<Token>> {
    lex_tokens(&pp_tokenize(src)?)
}
