//! End-to-end tests for the generator pipeline and CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use hexgen::{
    Artifacts, Error, GenOptions, HexRegisterNamer, InsnContext, generate_to_dir, load_facts,
    render, resolve_all, tokenize_tag,
};
use pretty_assertions::assert_eq;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/facts.json")
}

fn hexgen_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_hexgen"))
}

#[test]
fn test_generate_writes_both_sources() {
    let dir = tempfile::tempdir().unwrap();
    let written = generate_to_dir(fixture(), dir.path(), &GenOptions::default()).unwrap();
    assert_eq!(
        written,
        [dir.path().join("hexagon_il.cc"), dir.path().join("hexagon_text.cc")]
    );

    let lifter = fs::read_to_string(dir.path().join("hexagon_il.cc")).unwrap();
    assert!(lifter.contains("void lift_A2_add("));
    assert!(lifter.contains("[A2_nop] = nullptr,\n"));
    assert!(lifter.contains("[J4_cmpeqi_tp0_jump_t] = lift_J4_cmpeqi_tp0_jump_t,\n"));
    assert!(lifter.contains("if (insn.part1) {"));
    assert!(lifter.contains("{ RdV = fBYTESWAP(RsV); }"));
    assert!(!lifter.contains("il.Jump("));

    let text = fs::read_to_string(dir.path().join("hexagon_text.cc")).unwrap();
    assert!(text.contains("[A2_nop] = tokenize_A2_nop,\n"));
    assert!(text.contains("extern const InsnTextFunc opcode_textptr[XX_LAST_OPCODE] = {"));
    assert!(text.contains("CodeRelativeAddressToken"));
}

#[test]
fn test_generate_single_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let opts = GenOptions::default()
        .with_base_name("hex")
        .with_artifacts(Artifacts::Lift)
        .with_jobs(2);
    let written = generate_to_dir(fixture(), dir.path(), &opts).unwrap();
    assert_eq!(written, [dir.path().join("hex_il.cc")]);
    assert!(!dir.path().join("hex_text.cc").exists());
}

#[test]
fn test_failure_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let facts = dir.path().join("bad.json");
    fs::write(
        &facts,
        r#"{"tags": [{"tag": "X_bad", "syntax": "Rd32=foo(Rs32)", "semantics": "{ RdV=fFOO(RsV); }"}]}"#,
    )
    .unwrap();
    let out = dir.path().join("out");
    let err = generate_to_dir(&facts, &out, &GenOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Emit(ref e) if e.tag() == Some("X_bad")));
    assert!(!out.exists());
}

#[test]
fn test_missing_facts_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_facts(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, Error::Facts(_)));
}

#[test]
fn test_tokens_render_compound_jump() {
    let file = load_facts(fixture()).unwrap();
    let tokens = tokenize_tag(&file, "J4_cmpeqi_tp0_jump_t").unwrap();
    let ctx = InsnContext {
        pc: 0x1000,
        regno: vec![2],
        immed: [0x20, 7],
        ..InsnContext::default()
    };
    let resolved = resolve_all(&tokens, &ctx, &HexRegisterNamer).unwrap();
    assert_eq!(
        render(&resolved),
        "P0 = cmp.eq(R2,#0x7);if (P0.new) jump:t 0x1020"
    );
}

#[test]
fn test_cli_generate() {
    let dir = tempfile::tempdir().unwrap();
    let status = hexgen_bin()
        .args(["-q", "generate"])
        .arg(fixture())
        .arg("-o")
        .arg(dir.path())
        .args(["--only", "text"])
        .status()
        .unwrap();
    assert!(status.success());
    assert!(dir.path().join("hexagon_text.cc").exists());
    assert!(!dir.path().join("hexagon_il.cc").exists());
}

#[test]
fn test_cli_inspect() {
    let output = hexgen_bin()
        .arg("lift")
        .arg(fixture())
        .arg("A2_add")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("il.SetRegister(4, RdV, il.Add(4, il.Register(4, RsV), il.Register(4, RtV)))"));

    let output = hexgen_bin()
        .arg("normalize")
        .arg(fixture())
        .arg("J4_cmpeqi_tp0_jump_t")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("part1: "));
    assert!(stdout.contains("part2: "));
}

#[test]
fn test_cli_unknown_tag_fails() {
    let status = hexgen_bin()
        .arg("tokens")
        .arg(fixture())
        .arg("A2_missing")
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}
