//! Lifter source: one `lift_<tag>` function per tag.

use std::fmt::Write;

use hexgen_facts::TagFacts;
use hexgen_ir::Effect;
use hexgen_sem::LiftedBody;

use crate::dispatch::gen_dispatch_table;

const PRELUDE: &str = r#"
#include "binaryninjaapi.h"
#include "third_party/qemu-hexagon/attribs.h"
#include "third_party/qemu-hexagon/iclass.h"
#include "third_party/qemu-hexagon/insn.h"
#include "third_party/qemu-hexagon/opcodes.h"
#include "plugin/packet_context.h"
#include "plugin/hex_regs.h"
#include "glog/logging.h"

using namespace BinaryNinja;

#define PCALIGN 4
#define PCALIGN_MASK (PCALIGN - 1)

#define EA_REG  LLIL_TEMP(100)
#define TMP_REG LLIL_TEMP(101)
#define WIDTH_REG LLIL_TEMP(104)
#define OFFSET_REG LLIL_TEMP(105)
#define SHAMT_REG LLIL_TEMP(106)

"#;

const SIGNATURE: &str = "Architecture *arch, uint64_t pc, const Packet &pkt, const Insn &insn, \
                         int insn_num, PacketContext &ctx";

/// One host line for an effect.
fn effect_line(effect: &Effect) -> String {
    match effect {
        Effect::Raw(text) => text.clone(),
        Effect::Label(label) => format!("il.MarkLabel({label});"),
        other => format!("il.AddInstruction({other});"),
    }
}

/// Function for one tag. Branch effects are not written; the packet adds
/// them after all instructions.
#[must_use]
pub fn gen_lift_fn(facts: &TagFacts, body: &LiftedBody) -> String {
    let mut s = String::new();
    writeln!(s, "/*\n{}:\n{}\n{}\n*/", facts.tag, facts.syntax, facts.semantics).unwrap();
    writeln!(s, "void lift_{}({SIGNATURE}) {{", facts.tag).unwrap();
    s.push_str("LowLevelILFunction &il = ctx.IL();\n");
    for effect in body.emitted() {
        writeln!(s, "{}", effect_line(&effect)).unwrap();
    }
    s.push_str("}\n\n");
    s
}

/// Whole lifter source.
///
/// `entries` lists every known tag in declaration order, with its function
/// when the tag is lifted.
#[must_use]
pub fn gen_lifter_file(entries: &[(&str, Option<&str>)]) -> String {
    let mut s = String::from(PRELUDE);
    for func in entries.iter().filter_map(|(_, f)| *f) {
        s.push_str(func);
    }
    writeln!(s, "typedef void (*IlLiftFunc)({SIGNATURE});\n").unwrap();
    let tags: Vec<(&str, bool)> = entries.iter().map(|(t, f)| (*t, f.is_some())).collect();
    s.push_str(&gen_dispatch_table("IlLiftFunc", "opcode_liftptr", "lift", &tags));
    s
}
