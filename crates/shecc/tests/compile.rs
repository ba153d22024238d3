//! End-to-end pipeline tests. No ARM/RISC-V hardware or emulator is
//! assumed to be present (spec §8's example programs are exercised
//! structurally: magic bytes, `e_machine`, non-empty `.text`/`.data`,
//! and `main` present in the symbol table) rather than executed.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use shecc::pipeline;
use shecc_ir::{CompileOptions, Context, Opcode, RegOrSlot, Target};

struct TempSource {
    dir: tempfile::TempDir,
    path: PathBuf,
}

impl TempSource {
    fn new(name: &str, text: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).expect("create source");
        f.write_all(text.as_bytes()).expect("write source");
        Self { dir, path }
    }

    fn output_path(&self) -> PathBuf {
        self.dir.path().join("a.out")
    }
}

fn compile(source: &TempSource, target: Target, include_libc: bool) -> Vec<u8> {
    let options = CompileOptions {
        target,
        output_path: source.output_path(),
        dump_ir: false,
        include_libc,
    };
    let mut ctx = Context::new(options);
    pipeline::run(&source.path, &mut ctx)
        .unwrap_or_else(|e| panic!("compilation failed: {e} at {:?}", e.loc()));
    fs::read(source.output_path()).expect("read produced ELF")
}

fn e_machine(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[18], bytes[19]])
}

fn has_magic(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes[0] == 0x7f && &bytes[1..4] == b"ELF"
}

#[test]
fn minimal_return_zero_compiles_on_arm() {
    let src = TempSource::new("min.c", "int main() { return 0; }");
    let bytes = compile(&src, Target::Arm, false);
    assert!(has_magic(&bytes));
    assert_eq!(e_machine(&bytes), 0x28);
    assert!(bytes.len() > shecc_elf::HEADER_LEN as usize);
}

#[test]
fn minimal_return_zero_compiles_on_riscv() {
    let src = TempSource::new("min.c", "int main() { return 0; }");
    let bytes = compile(&src, Target::RiscV32, false);
    assert!(has_magic(&bytes));
    assert_eq!(e_machine(&bytes), 0xf3);
}

#[test]
fn arithmetic_return_compiles() {
    let src = TempSource::new("arith.c", "int main() { return 2 * 3 + 4; }");
    let bytes = compile(&src, Target::Arm, false);
    assert!(has_magic(&bytes));
}

#[test]
fn switch_statement_compiles() {
    let source = r#"
        int classify(int n)
        {
            switch (n) {
            case 0:
                return 10;
            case 1:
                return 20;
            default:
                return 30;
            }
        }

        int main() { return classify(1); }
    "#;
    let src = TempSource::new("switch.c", source);
    let bytes = compile(&src, Target::Arm, false);
    assert!(has_magic(&bytes));
}

#[test]
fn array_zero_init_loop_compiles() {
    let source = r#"
        int main()
        {
            int arr[5];
            int i;
            int sum = 0;
            for (i = 0; i < 5; i = i + 1)
                arr[i] = 0;
            for (i = 0; i < 5; i = i + 1)
                sum = sum + arr[i];
            return sum;
        }
    "#;
    let src = TempSource::new("zeroinit.c", source);
    let bytes = compile(&src, Target::Arm, false);
    assert!(has_magic(&bytes));
}

#[test]
fn fixture_fib_compiles_with_bundled_libc() {
    let text = include_str!("fixtures/fib.c");
    let src = TempSource::new("fib.c", text);
    let bytes = compile(&src, Target::Arm, true);
    assert!(has_magic(&bytes));
    assert!(bytes.len() > shecc_elf::HEADER_LEN as usize);
}

#[test]
fn fixture_array_ptr_compiles_with_bundled_libc() {
    let text = include_str!("fixtures/array_ptr.c");
    let src = TempSource::new("array_ptr.c", text);
    let bytes = compile(&src, Target::Arm, true);
    assert!(has_magic(&bytes));
}

#[test]
fn fixture_def_redeclares_a_local_in_the_same_scope() {
    // `def.c` declares `struct_t *s2` twice in `main`'s single block
    // scope — legal to the original bare C parser (which never tracked
    // per-scope declarations) but rejected here, since `declare_var`
    // enforces one declaration per name per scope (spec's stricter
    // local-variable model). Carried verbatim per the fixture mandate
    // rather than edited to fit; this test documents the divergence
    // instead of asserting a successful compile.
    let text = include_str!("fixtures/def.c");
    let src = TempSource::new("def.c", text);
    let options = CompileOptions {
        target: Target::RiscV32,
        output_path: src.output_path(),
        dump_ir: false,
        include_libc: true,
    };
    let mut ctx = Context::new(options);
    let err = pipeline::run(&src.path, &mut ctx).unwrap_err();
    assert!(matches!(err, shecc_ir::CompileError::Redeclaration { ref name, .. } if name == "s2"));
}

/// Runs the pipeline through register allocation only (no architecture
/// lowering or ELF encoding) so a test can inspect the phase-2 stream
/// the allocator produced for itself.
fn compile_to_phase2(text: &str) -> Context {
    let options = CompileOptions {
        target: Target::Arm,
        output_path: PathBuf::from("unused.out"),
        dump_ir: false,
        include_libc: false,
    };
    let mut ctx = Context::new(options);
    let file = ctx.intern("argcheck.c");
    let tokens = shecc_lex::lex(text, file, &mut ctx.interner).expect("lex");
    let mut loader = shecc::loader::FsLoader;
    let tokens = shecc_pp::preprocess(tokens, file, &mut ctx, &mut loader).expect("preprocess");
    shecc_parse::parse(tokens, &mut ctx).expect("parse");

    let funcs: Vec<_> = ctx.funcs.iter().map(|(id, _)| id).collect();
    for &f in &funcs {
        shecc_ssa::build_ssa(&mut ctx, f);
        shecc_ssa::run_sccp(&mut ctx, f);
    }
    shecc_regalloc::layout_globals(&mut ctx);
    for &f in &funcs {
        shecc_regalloc::allocate(&mut ctx, f).expect("register allocation");
    }
    ctx
}

#[test]
fn call_arguments_are_routed_into_argument_registers() {
    let source = r#"
        int add(int a, int b) { return a + b; }
        int main() { int x; int y; x = 3; y = 4; return add(x, y); }
    "#;
    let ctx = compile_to_phase2(source);

    let (_, main_func) = ctx.funcs.iter().find(|(_, f)| ctx.interner.resolve(f.name) == "main").expect("main exists");
    let mut stream = Vec::new();
    for &b in &main_func.bb_list {
        stream.extend(ctx.blocks.get(b).phase2_instructions.iter());
    }

    // The phase-2 stream must never contain a `Push`: arguments are
    // bound directly into argument registers, not spilled to the stack.
    assert!(!stream.iter().any(|i| i.op == Opcode::Push), "a bare stack Push survived into phase 2");

    let call_idx = stream
        .iter()
        .position(|i| i.op == Opcode::Call && i.func_name.map_or(false, |s| ctx.interner.resolve(s) == "add"))
        .expect("call to add is present");

    // Walking backward from the call, the most recent write to
    // register 0 and the most recent write to register 1 establish the
    // two argument bindings; register 0's binding must come first.
    let reg0_idx = stream[..call_idx]
        .iter()
        .rposition(|i| i.dest == RegOrSlot::Reg(0))
        .expect("argument 0 is bound into register 0 before the call");
    let reg1_idx = stream[..call_idx]
        .iter()
        .rposition(|i| i.dest == RegOrSlot::Reg(1))
        .expect("argument 1 is bound into register 1 before the call");
    assert!(reg0_idx < reg1_idx, "argument registers must be bound in argument order");
    assert!(reg1_idx < call_idx, "both arguments must be bound before the call instruction");
}

#[test]
fn missing_file_is_a_located_io_error() {
    let options = CompileOptions {
        target: Target::Arm,
        output_path: PathBuf::from("unused.out"),
        dump_ir: false,
        include_libc: false,
    };
    let mut ctx = Context::new(options);
    let err = pipeline::run(&PathBuf::from("/no/such/file.c"), &mut ctx).unwrap_err();
    assert!(matches!(err, shecc_ir::CompileError::Io(_)));
}
