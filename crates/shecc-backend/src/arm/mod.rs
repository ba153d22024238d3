//! ARMv7-A instruction selection and two-pass emission (spec §4.H).
//!
//! Physical register assignment is the identity map: IR register index
//! `r` (0..NUM_REGISTERS) is ARM register `r` directly, so `r0` also
//! doubles as the ABI return-value register. `r7` is a backend-private
//! scratch register (never handed to the allocator), `r11` is the frame
//! pointer, `r12` is the global-data pointer (spec §4.H: "use `r12` as
//! the global-data pointer"), `r13`/`r14`/`r15` are sp/lr/pc.

mod encode;

use shecc_ir::{CompileError, Context, FuncId, Opcode, Phase2Instr, RegOrSlot, Result};

use crate::layout::{self, Backend, Layout};

const SCRATCH: u8 = encode::R7;

pub(crate) struct ArmBackend;

/// How a `Read`/`Write`/`AddressOf` memory operand resolves to
/// addressing-mode words: a register already holding the address, a
/// base+offset that fits ARM's 12-bit immediate transfer range, or an
/// offset wide enough that the address must be materialized into the
/// scratch register first.
enum MemForm {
    RegAddr(u8),
    Based(u8, i32),
    Split(u8, i32),
}

fn mem_form(operand: RegOrSlot) -> MemForm {
    match operand {
        RegOrSlot::Reg(r) => MemForm::RegAddr(r),
        RegOrSlot::Slot(off) => based_or_split(encode::FP, off),
        RegOrSlot::Imm(off) => based_or_split(encode::GP, off),
        RegOrSlot::None => unreachable!("memory operand must be Reg/Slot/Imm"),
    }
}

fn based_or_split(base: u8, offset: i32) -> MemForm {
    if (-4095..=4095).contains(&offset) {
        MemForm::Based(base, offset)
    } else {
        MemForm::Split(base, offset)
    }
}

/// Emit the two-instruction split-`add` sequence that materializes
/// `base + offset` in `dest`, used both for `&local` and for memory
/// operands whose offset doesn't fit a single transfer immediate.
fn emit_split_add(cond: u32, dest: u8, base: u8, offset: i32, out: &mut Vec<u32>) {
    let lo = offset & 0xff;
    let hi = offset - lo;
    out.push(encode::add_i(cond, dest, base, lo));
    out.push(encode::add_i(cond, dest, dest, hi));
}

fn emit_load(dest: u8, operand: RegOrSlot, size: u8, out: &mut Vec<u32>) {
    let byte = size == 1;
    match mem_form(operand) {
        MemForm::RegAddr(r) => out.push(if byte { encode::lb(encode::AL, dest, r, 0) } else { encode::lw(encode::AL, dest, r, 0) }),
        MemForm::Based(base, off) => out.push(if byte { encode::lb(encode::AL, dest, base, off) } else { encode::lw(encode::AL, dest, base, off) }),
        MemForm::Split(base, off) => {
            emit_split_add(encode::AL, SCRATCH, base, off, out);
            out.push(if byte { encode::lb(encode::AL, dest, SCRATCH, 0) } else { encode::lw(encode::AL, dest, SCRATCH, 0) });
        }
    }
}

fn emit_store(src: u8, operand: RegOrSlot, size: u8, out: &mut Vec<u32>) {
    let byte = size == 1;
    match mem_form(operand) {
        MemForm::RegAddr(r) => out.push(if byte { encode::sb(encode::AL, src, r, 0) } else { encode::sw(encode::AL, src, r, 0) }),
        MemForm::Based(base, off) => out.push(if byte { encode::sb(encode::AL, src, base, off) } else { encode::sw(encode::AL, src, base, off) }),
        MemForm::Split(base, off) => {
            emit_split_add(encode::AL, SCRATCH, base, off, out);
            out.push(if byte { encode::sb(encode::AL, src, SCRATCH, 0) } else { encode::sw(encode::AL, src, SCRATCH, 0) });
        }
    }
}

fn r(o: RegOrSlot) -> u8 {
    match o {
        RegOrSlot::Reg(r) => r,
        _ => unreachable!("expected a register operand"),
    }
}

fn bound_params(ctx: &Context, func: FuncId) -> usize {
    ctx.funcs.get(func).params.len().min(shecc_ir::NUM_REGISTERS)
}

/// `__syscall` is never a real function (spec §4.H: "a hand-emitted
/// `__syscall` shim shuffles argument registers and executes the
/// architecture's syscall instruction") — it has no prologue to resolve
/// a target against, so `Call`s to it are recognized by name and lowered
/// to an inline register shuffle plus `svc` instead of a `bl`.
fn is_syscall(ctx: &Context, instr: &Phase2Instr) -> bool {
    instr.op == Opcode::Call
        && instr
            .func_name
            .map(|n| ctx.interner.resolve(n) == "__syscall")
            .unwrap_or(false)
}

/// Lowers one phase-2 instruction into ARM words. `site` carries the
/// resolved addresses pass 2 needs for branch/call targets; during
/// pass 1 (word counting) it is `None` and every target is treated as
/// zero, which never changes word count since branch/call encodings
/// are fixed-width regardless of the offset's magnitude.
struct Site {
    pc: u32,
    then_pc: u32,
    else_pc: u32,
    jump_pc: u32,
    call_pc: u32,
}

fn lower(instr: &Phase2Instr, site: Option<&Site>, syscall: bool) -> Vec<u32> {
    let mut out = Vec::new();
    let pc = site.map(|s| s.pc).unwrap_or(0);
    use Opcode::*;
    if syscall {
        debug_assert_eq!(instr.op, Call, "is_syscall only ever marks a Call");
        out.push(encode::mov_r(encode::AL, encode::R7, encode::R0));
        for i in 0..shecc_ir::NUM_REGISTERS as u8 - 1 {
            out.push(encode::mov_r(encode::AL, i, i + 1));
        }
        out.push(encode::svc());
        if instr.dest != RegOrSlot::None {
            let d = r(instr.dest);
            if d != encode::R0 {
                out.push(encode::mov_r(encode::AL, d, encode::R0));
            }
        }
        return out;
    }
    match instr.op {
        Allocat | BlockStart | BlockEnd | Phi | Label => {}
        Push => unreachable!("regalloc binds call arguments straight into argument registers; Push never reaches phase 2"),
        LoadConstant => {
            let RegOrSlot::Imm(v) = instr.src0 else { unreachable!() };
            let d = r(instr.dest);
            if (0..256).contains(&v) {
                out.push(encode::mov_i(encode::AL, d, v));
            } else {
                out.push(encode::movw(encode::AL, d, v as u32));
                out.push(encode::movt(encode::AL, d, v as u32));
            }
        }
        LoadDataAddress => {
            let RegOrSlot::Imm(off) = instr.src0 else { unreachable!() };
            let d = r(instr.dest);
            out.push(encode::movw(encode::AL, d, off as u32));
            out.push(encode::movt(encode::AL, d, off as u32));
            out.push(encode::add_r(encode::AL, d, d, encode::GP));
        }
        AddressOf => {
            let d = r(instr.dest);
            match instr.src0 {
                RegOrSlot::Imm(off) => {
                    out.push(encode::movw(encode::AL, d, off as u32));
                    out.push(encode::movt(encode::AL, d, off as u32));
                    out.push(encode::add_r(encode::AL, d, d, encode::GP));
                }
                RegOrSlot::Slot(off) => emit_split_add(encode::AL, d, encode::FP, off, &mut out),
                _ => unreachable!("AddressOf operand must be Imm or Slot"),
            }
        }
        Read => emit_load(r(instr.dest), instr.src0, instr.size, &mut out),
        Write => emit_store(r(instr.src1), instr.src0, instr.size, &mut out),
        Assign | UnwoundPhi => out.push(encode::mov_r(encode::AL, r(instr.dest), r(instr.src0))),
        Add => out.push(encode::add_r(encode::AL, r(instr.dest), r(instr.src0), r(instr.src1))),
        Sub => out.push(encode::sub_r(encode::AL, r(instr.dest), r(instr.src0), r(instr.src1))),
        Mul => out.push(encode::mul(encode::AL, r(instr.dest), r(instr.src0), r(instr.src1))),
        Div => out.push(encode::sdiv(encode::AL, r(instr.dest), r(instr.src0), r(instr.src1))),
        Mod => {
            let (d, n, m) = (r(instr.dest), r(instr.src0), r(instr.src1));
            out.push(encode::sdiv(encode::AL, SCRATCH, n, m));
            out.push(encode::mls(encode::AL, d, SCRATCH, m, n));
        }
        BitAnd => match instr.src1 {
            RegOrSlot::Imm(k) => out.push(encode::and_i(encode::AL, r(instr.dest), r(instr.src0), k)),
            _ => out.push(encode::and_r(encode::AL, r(instr.dest), r(instr.src0), r(instr.src1))),
        },
        BitOr | LogAnd | LogOr => {
            let op = if matches!(instr.op, BitOr | LogOr) { encode::or_r } else { encode::and_r };
            out.push(op(encode::AL, r(instr.dest), r(instr.src0), r(instr.src1)));
        }
        BitXor => out.push(encode::eor_r(encode::AL, r(instr.dest), r(instr.src0), r(instr.src1))),
        BitNot => out.push(encode::mvn_r(encode::AL, r(instr.dest), r(instr.src0))),
        Negate => out.push(encode::rsb_i(encode::AL, r(instr.dest), 0, r(instr.src0))),
        LogNot => out.push(encode::rsb_i(encode::AL, r(instr.dest), 1, r(instr.src0))),
        Lshift => match instr.src1 {
            RegOrSlot::Imm(n) => out.push(encode::sll_imm(encode::AL, r(instr.dest), r(instr.src0), n as u32)),
            _ => out.push(encode::sll(encode::AL, r(instr.dest), r(instr.src0), r(instr.src1))),
        },
        Rshift => match instr.src1 {
            RegOrSlot::Imm(n) => out.push(encode::srl_imm(encode::AL, r(instr.dest), r(instr.src0), n as u32)),
            _ => out.push(encode::srl(encode::AL, r(instr.dest), r(instr.src0), r(instr.src1))),
        },
        SignExt => out.push(encode::sxtb(encode::AL, r(instr.dest), r(instr.src0))),
        Trunc => out.push(encode::and_i(encode::AL, r(instr.dest), r(instr.src0), 0xff)),
        Eq | Neq | Lt | Leq | Gt | Geq => {
            let d = r(instr.dest);
            out.push(encode::cmp_r(encode::AL, r(instr.src0), r(instr.src1)));
            out.push(encode::mov_i(encode::AL, d, 0));
            out.push(encode::mov_i(encode::cond_for(instr.op), d, 1));
        }
        FuncRet => {
            let s = r(instr.src0);
            if s != encode::R0 {
                out.push(encode::mov_r(encode::AL, encode::R0, s));
            }
        }
        Call => {
            let target = site.map(|s| s.call_pc).unwrap_or(0);
            out.push(encode::bl(encode::AL, target as i32 - pc as i32));
            if instr.dest != RegOrSlot::None {
                let d = r(instr.dest);
                if d != encode::R0 {
                    out.push(encode::mov_r(encode::AL, d, encode::R0));
                }
            }
        }
        Indirect => {
            let fnptr = r(instr.src0);
            out.push(encode::blx_r(encode::AL, fnptr));
            if instr.dest != RegOrSlot::None {
                let d = r(instr.dest);
                if d != encode::R0 {
                    out.push(encode::mov_r(encode::AL, d, encode::R0));
                }
            }
        }
        Branch => {
            let then_pc = site.map(|s| s.then_pc).unwrap_or(0);
            out.push(encode::teq(encode::AL, r(instr.src0)));
            let branch_pc = pc + 4;
            out.push(encode::b(encode::NE, then_pc as i32 - branch_pc as i32));
            if instr.is_branch_detached {
                let else_pc = site.map(|s| s.else_pc).unwrap_or(0);
                let jump_pc = pc + 8;
                out.push(encode::b(encode::AL, else_pc as i32 - jump_pc as i32));
            }
        }
        Jump => {
            let target = site.map(|s| s.jump_pc).unwrap_or(0);
            out.push(encode::b(encode::AL, target as i32 - pc as i32));
        }
        Return => {
            let target = site.map(|s| s.jump_pc).unwrap_or(0);
            out.push(encode::b(encode::AL, target as i32 - pc as i32));
        }
    }
    out
}

impl Backend for ArmBackend {
    fn runtime_start_words(&self, _ctx: &Context, _main: FuncId) -> u32 {
        7
    }

    fn prologue_words(&self, ctx: &Context, func: FuncId) -> u32 {
        5 + bound_params(ctx, func) as u32
    }

    fn epilogue_words(&self) -> u32 {
        5
    }

    fn instr_words(&self, ctx: &Context, instr: &Phase2Instr) -> u32 {
        lower(instr, None, is_syscall(ctx, instr)).len() as u32
    }
}

/// `data_base` is the absolute load address of `.data`, needed to
/// materialize the global-data pointer; it is only knowable once the
/// code segment's length (and therefore where `.data` starts) has been
/// fully laid out, which is why `encode` takes it as a parameter rather
/// than computing it itself.
fn emit_runtime_start(layout: &Layout, main: FuncId, data_base: u32, out: &mut Vec<u32>) {
    let main_pc = layout.entry_pc(main);
    let here = (out.len() as u32) * 4;
    out.push(encode::lw(encode::AL, encode::R0, encode::SP, 0));
    out.push(encode::add_i(encode::AL, 1, encode::SP, 4));
    out.push(encode::movw(encode::AL, encode::GP, data_base));
    out.push(encode::movt(encode::AL, encode::GP, data_base));
    let bl_pc = here + 16;
    out.push(encode::bl(encode::AL, main_pc as i32 - bl_pc as i32));
    out.push(encode::mov_i(encode::AL, encode::R7, 1));
    out.push(encode::svc());
}

fn emit_prologue(ctx: &Context, func: FuncId, out: &mut Vec<u32>) {
    let f = ctx.funcs.get(func);
    let stack = f.stack_size;
    out.push(encode::add_i(encode::AL, encode::SP, encode::SP, -4));
    out.push(encode::sw(encode::AL, encode::LR, encode::SP, 0));
    emit_split_add(encode::AL, encode::SP, encode::SP, -stack, out);
    out.push(encode::mov_r(encode::AL, encode::FP, encode::SP));
    for (i, &p) in f.params.iter().take(shecc_ir::NUM_REGISTERS).enumerate() {
        let off = ctx.var(p).offset;
        out.push(encode::sw(encode::AL, i as u8, encode::FP, off));
    }
}

fn emit_epilogue(ctx: &Context, func: FuncId, out: &mut Vec<u32>) {
    let stack = ctx.funcs.get(func).stack_size;
    emit_split_add(encode::AL, encode::SP, encode::FP, stack, out);
    out.push(encode::lw(encode::AL, encode::LR, encode::SP, 0));
    out.push(encode::add_i(encode::AL, encode::SP, encode::SP, 4));
    out.push(encode::mov_r(encode::AL, encode::PC, encode::LR));
}

/// Runs pass 1 only, returning the total code length in bytes. The
/// driver uses this to compute `.data`'s load address before calling
/// [`encode`], since every global-data-pointer load needs that address
/// baked in as an immediate.
pub(crate) fn code_len(ctx: &Context, funcs: &[FuncId]) -> u32 {
    let backend = ArmBackend;
    let main = layout::find_main(ctx, funcs);
    layout::build(ctx, funcs, main, &backend).code_len
}

/// Runs pass 2: walks the layout's units in order, emitting each one's
/// words with now-fully-resolved branch/call/prologue/epilogue targets.
/// Returns the code words alongside each function's entry offset, for
/// the symbol table.
pub(crate) fn encode(
    ctx: &Context,
    funcs: &[FuncId],
    data_base: u32,
) -> Result<(Vec<u32>, Vec<(shecc_ir::Symbol, u32)>)> {
    let backend = ArmBackend;
    let main = layout::find_main(ctx, funcs);
    let layout = layout::build(ctx, funcs, main, &backend);

    let mut words = Vec::with_capacity((layout.code_len / 4) as usize);
    for (i, unit) in layout.units.iter().enumerate() {
        let pc = layout.offsets[i];
        match unit {
            crate::layout::Unit::RuntimeStart => emit_runtime_start(&layout, main, data_base, &mut words),
            crate::layout::Unit::Prologue(f) => emit_prologue(ctx, *f, &mut words),
            crate::layout::Unit::Epilogue(f) => emit_epilogue(ctx, *f, &mut words),
            crate::layout::Unit::Instr(f, b, k) => {
                let instr = &ctx.blocks.get(*b).phase2_instructions[*k];
                let site = match instr.op {
                    Opcode::Branch => {
                        let bb = ctx.blocks.get(*b);
                        let then_pc = layout.block_pc(*f, bb.then_.expect("Branch has a then_ successor"));
                        let else_pc = layout.block_pc(*f, bb.else_.expect("Branch has an else_ successor"));
                        Some(Site { pc, then_pc, else_pc, jump_pc: 0, call_pc: 0 })
                    }
                    Opcode::Jump => {
                        let bb = ctx.blocks.get(*b);
                        let target = layout.block_pc(*f, bb.next.expect("Jump has a next successor"));
                        Some(Site { pc, then_pc: 0, else_pc: 0, jump_pc: target, call_pc: 0 })
                    }
                    Opcode::Return => Some(Site { pc, then_pc: 0, else_pc: 0, jump_pc: layout.exit_pc(*f), call_pc: 0 }),
                    Opcode::Call if !is_syscall(ctx, instr) => {
                        let name = instr.func_name.expect("Call carries the callee's name");
                        let callee = funcs
                            .iter()
                            .copied()
                            .find(|&ff| ctx.funcs.get(ff).name == name)
                            .ok_or_else(|| CompileError::InvalidInstructionForm { reason: "call to unknown function".into() })?;
                        Some(Site { pc, then_pc: 0, else_pc: 0, jump_pc: 0, call_pc: layout.entry_pc(callee) })
                    }
                    _ => None,
                };
                words.extend(lower(instr, site.as_ref(), is_syscall(ctx, instr)));
            }
        }
    }
    let symbols = funcs.iter().map(|&f| (ctx.funcs.get(f).name, layout.entry_pc(f))).collect();
    Ok((words, symbols))
}
