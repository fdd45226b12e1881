//! Dense opcode dispatch tables.

use std::fmt::Write;

/// `extern const <ty> <name>[XX_LAST_OPCODE]` with one designated
/// initializer per tag, in the order given. Tags without a generated
/// function map to `nullptr`.
#[must_use]
pub fn gen_dispatch_table(ty: &str, name: &str, prefix: &str, tags: &[(&str, bool)]) -> String {
    let mut s = String::new();
    writeln!(s, "extern const {ty} {name}[XX_LAST_OPCODE] = {{").unwrap();
    for (tag, present) in tags {
        if *present {
            writeln!(s, "[{tag}] = {prefix}_{tag},").unwrap();
        } else {
            writeln!(s, "[{tag}] = nullptr,").unwrap();
        }
    }
    s.push_str("};\n");
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table() {
        let table = gen_dispatch_table(
            "InsnTextFunc",
            "opcode_textptr",
            "tokenize",
            &[("A2_add", true), ("A2_nop", false), ("J2_jump", true)],
        );
        assert_eq!(
            table,
            "extern const InsnTextFunc opcode_textptr[XX_LAST_OPCODE] = {\n\
             [A2_add] = tokenize_A2_add,\n\
             [A2_nop] = nullptr,\n\
             [J2_jump] = tokenize_J2_jump,\n\
             };\n"
        );
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(
            gen_dispatch_table("IlLiftFunc", "opcode_liftptr", "lift", &[]),
            "extern const IlLiftFunc opcode_liftptr[XX_LAST_OPCODE] = {\n};\n"
        );
    }
}
