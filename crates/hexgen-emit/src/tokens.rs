//! Tokenizer source: one `tokenize_<tag>` function per tag.
//!
//! Symbolic tokens become host expressions over the decoded instruction;
//! the two extension-dependent tokens become a `?:` and an `if`/`else`.

use std::fmt::Write;

use hexgen_facts::TagFacts;
use hexgen_ir::{IntToken, RegToken, Token};

use crate::dispatch::gen_dispatch_table;

const PRELUDE: &str = r#"
#include <vector>

#include "binaryninjaapi.h"
#include "absl/strings/str_cat.h"
#include "plugin/text_util.h"
#include "third_party/qemu-hexagon/attribs.h"
#include "third_party/qemu-hexagon/iclass.h"
#include "third_party/qemu-hexagon/insn.h"
#include "third_party/qemu-hexagon/opcodes.h"

using namespace BinaryNinja;
using absl::Hex;
using absl::StrCat;

"#;

const SIGNATURE: &str =
    "uint64_t pc, const Packet &pkt, const Insn &insn, std::vector<InstructionTextToken> &result";

/// C string literal for `s`.
fn c_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn emplace(kind: &str, args: &str) -> String {
    format!("result.emplace_back({kind}, {args});")
}

/// Host statement appending `token` to `result`.
#[must_use]
pub fn token_line(token: &Token) -> String {
    match token {
        Token::Text(s) => emplace("TextToken", &c_str(s)),
        Token::Instruction(s) => emplace("InstructionToken", &c_str(s)),
        Token::Register(RegToken::Named(s)) => emplace("RegisterToken", &c_str(s)),
        Token::Register(RegToken::Operand {
            class,
            subfield,
            slot,
            pair_high,
        }) => {
            let regno = if *pair_high {
                format!("insn.regno[{slot}]+1")
            } else {
                format!("insn.regno[{slot}]")
            };
            let name = format!(
                "GetRegisterName({}, {}, {regno})",
                c_str(&class.to_string()),
                c_str(subfield)
            );
            emplace("RegisterToken", &name)
        }
        Token::Integer(IntToken::Literal(v)) => {
            emplace("IntegerToken", &format!("StrCat(\"0x\", Hex({v})), {v}"))
        }
        Token::Integer(IntToken::Immediate(i)) => emplace(
            "IntegerToken",
            &format!("StrCat(\"0x\", Hex(insn.immed[{i}])), insn.immed[{i}]"),
        ),
        Token::Address { slot } => emplace(
            "CodeRelativeAddressToken",
            &format!("StrCat(\"0x\", Hex(pc + insn.immed[{slot}])), pc + insn.immed[{slot}]"),
        ),
        Token::ImmPrefix => emplace("TextToken", "(insn.extension_valid ? \"##\" : \"#\")"),
        Token::GpOrZero(name) => format!(
            "if (insn.extension_valid) {{\n  {}\n}} else {{\n  {}\n}}",
            emplace("IntegerToken", "\"0\", 0"),
            emplace("RegisterToken", &c_str(name))
        ),
    }
}

#[must_use]
pub fn gen_tokenize_fn(facts: &TagFacts, tokens: &[Token]) -> String {
    let mut s = String::new();
    writeln!(s, "/*\n{}:  {}\n*/", facts.tag, c_str(&facts.syntax)).unwrap();
    writeln!(s, "void tokenize_{}({SIGNATURE}) {{", facts.tag).unwrap();
    for token in tokens {
        writeln!(s, "{}", token_line(token)).unwrap();
    }
    s.push_str("}\n\n");
    s
}

/// Whole tokenizer source; see [`crate::gen_lifter_file`] for `entries`.
#[must_use]
pub fn gen_text_file(entries: &[(&str, Option<&str>)]) -> String {
    let mut s = String::from(PRELUDE);
    for func in entries.iter().filter_map(|(_, f)| *f) {
        s.push_str(func);
    }
    writeln!(s, "typedef void (*InsnTextFunc)({SIGNATURE});\n").unwrap();
    let tags: Vec<(&str, bool)> = entries.iter().map(|(t, f)| (*t, f.is_some())).collect();
    s.push_str(&gen_dispatch_table("InsnTextFunc", "opcode_textptr", "tokenize", &tags));
    s
}
