//! RV32IM instruction selection and two-pass emission (spec §4.H).
//!
//! IR register index `r` (0..NUM_REGISTERS) maps to `a{r}` (x10+r), so
//! `a0` doubles as both the first argument and the ABI return register.
//! `t0` (x5) is a backend-private scratch register, `s0` (x8) is the
//! frame pointer, `gp` (x3) is repurposed as the global-data pointer
//! (spec §4.H), `ra` (x1) is the link register, `a7` (x17) carries the
//! syscall number.

mod encode;

use shecc_ir::{CompileError, Context, FuncId, Opcode, Phase2Instr, RegOrSlot, Result};

use crate::layout::{self, Backend, Layout};

const T0: u8 = 5; // scratch
const S0: u8 = encode::S0;
const GP: u8 = encode::GP;
const RA: u8 = encode::RA;
const SP: u8 = encode::SP;
const A0: u8 = encode::A0;
const A7: u8 = encode::A7;

pub(crate) struct RiscVBackend;

enum MemForm {
    RegAddr(u8),
    Based(u8, i32),
    Split(u8, i32),
}

fn mem_form(operand: RegOrSlot) -> MemForm {
    match operand {
        RegOrSlot::Reg(r) => MemForm::RegAddr(r),
        RegOrSlot::Slot(off) => based_or_split(S0, off),
        RegOrSlot::Imm(off) => based_or_split(GP, off),
        RegOrSlot::None => unreachable!("memory operand must be Reg/Slot/Imm"),
    }
}

fn based_or_split(base: u8, offset: i32) -> MemForm {
    if (-2047..=2047).contains(&offset) {
        MemForm::Based(base, offset)
    } else {
        MemForm::Split(base, offset)
    }
}

fn emit_split_addr(dest: u8, base: u8, offset: i32, out: &mut Vec<u32>) {
    out.push(encode::lui(dest, encode::hi(offset)));
    out.push(encode::addi(dest, dest, encode::lo(offset)));
    out.push(encode::add(dest, dest, base));
}

fn emit_load(dest: u8, operand: RegOrSlot, size: u8, out: &mut Vec<u32>) {
    let byte = size == 1;
    match mem_form(operand) {
        MemForm::RegAddr(r) => out.push(if byte { encode::lb(dest, r, 0) } else { encode::lw(dest, r, 0) }),
        MemForm::Based(base, off) => out.push(if byte { encode::lb(dest, base, off) } else { encode::lw(dest, base, off) }),
        MemForm::Split(base, off) => {
            emit_split_addr(T0, base, off, out);
            out.push(if byte { encode::lb(dest, T0, 0) } else { encode::lw(dest, T0, 0) });
        }
    }
}

fn emit_store(src: u8, operand: RegOrSlot, size: u8, out: &mut Vec<u32>) {
    let byte = size == 1;
    match mem_form(operand) {
        MemForm::RegAddr(r) => out.push(if byte { encode::sb(r, src, 0) } else { encode::sw(r, src, 0) }),
        MemForm::Based(base, off) => out.push(if byte { encode::sb(base, src, off) } else { encode::sw(base, src, off) }),
        MemForm::Split(base, off) => {
            emit_split_addr(T0, base, off, out);
            out.push(if byte { encode::sb(T0, src, 0) } else { encode::sw(T0, src, 0) });
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

/// See the ARM backend's identically-named helper: `__syscall` has no
/// prologue to branch to, so a `Call` naming it is recognized and
/// lowered inline instead of going through the normal callee lookup.
fn is_syscall(ctx: &Context, instr: &Phase2Instr) -> bool {
    instr.op == Opcode::Call
        && instr
            .func_name
            .map(|n| ctx.interner.resolve(n) == "__syscall")
            .unwrap_or(false)
}

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
        out.push(encode::addi(A7, A0, 0));
        for i in 0..shecc_ir::NUM_REGISTERS as u8 - 1 {
            out.push(encode::addi(A0 + i, A0 + i + 1, 0));
        }
        out.push(encode::ecall());
        if instr.dest != RegOrSlot::None {
            let d = r(instr.dest);
            if d != A0 {
                out.push(encode::addi(d, A0, 0));
            }
        }
        return out;
    }
    match instr.op {
        Allocat | BlockStart | BlockEnd | Phi | Label => {}
        LoadConstant => {
            let RegOrSlot::Imm(v) = instr.src0 else { unreachable!() };
            let d = r(instr.dest);
            if (0..2048).contains(&v) {
                out.push(encode::addi(d, encode::ZERO, v));
            } else {
                out.push(encode::lui(d, encode::hi(v)));
                out.push(encode::addi(d, d, encode::lo(v)));
            }
        }
        LoadDataAddress => {
            let RegOrSlot::Imm(off) = instr.src0 else { unreachable!() };
            let d = r(instr.dest);
            out.push(encode::lui(d, encode::hi(off)));
            out.push(encode::addi(d, d, encode::lo(off)));
            out.push(encode::add(d, d, GP));
        }
        AddressOf => {
            let d = r(instr.dest);
            match instr.src0 {
                RegOrSlot::Imm(off) => {
                    out.push(encode::lui(d, encode::hi(off)));
                    out.push(encode::addi(d, d, encode::lo(off)));
                    out.push(encode::add(d, d, GP));
                }
                RegOrSlot::Slot(off) => out.push(encode::addi(d, S0, off)),
                _ => unreachable!("AddressOf operand must be Imm or Slot"),
            }
        }
        Read => emit_load(r(instr.dest), instr.src0, instr.size, &mut out),
        Write => emit_store(r(instr.src1), instr.src0, instr.size, &mut out),
        Assign | UnwoundPhi => out.push(encode::addi(r(instr.dest), r(instr.src0), 0)),
        Add => out.push(encode::add(r(instr.dest), r(instr.src0), r(instr.src1))),
        Sub => out.push(encode::sub(r(instr.dest), r(instr.src0), r(instr.src1))),
        Mul => out.push(encode::mul(r(instr.dest), r(instr.src0), r(instr.src1))),
        Div => out.push(encode::div(r(instr.dest), r(instr.src0), r(instr.src1))),
        Mod => out.push(encode::rem(r(instr.dest), r(instr.src0), r(instr.src1))),
        BitAnd => match instr.src1 {
            RegOrSlot::Imm(k) => out.push(encode::andi(r(instr.dest), r(instr.src0), k)),
            _ => out.push(encode::and(r(instr.dest), r(instr.src0), r(instr.src1))),
        },
        BitOr | LogAnd | LogOr => {
            let op = if matches!(instr.op, BitOr | LogOr) { encode::or } else { encode::and };
            out.push(op(r(instr.dest), r(instr.src0), r(instr.src1)));
        }
        BitXor => out.push(encode::xor(r(instr.dest), r(instr.src0), r(instr.src1))),
        BitNot => out.push(encode::xori(r(instr.dest), r(instr.src0), -1)),
        Negate => out.push(encode::sub(r(instr.dest), encode::ZERO, r(instr.src0))),
        LogNot => out.push(encode::xori(r(instr.dest), r(instr.src0), 1)),
        Lshift => match instr.src1 {
            RegOrSlot::Imm(n) => out.push(encode::slli(r(instr.dest), r(instr.src0), n)),
            _ => out.push(encode::sll(r(instr.dest), r(instr.src0), r(instr.src1))),
        },
        Rshift => match instr.src1 {
            RegOrSlot::Imm(n) => out.push(encode::srli(r(instr.dest), r(instr.src0), n)),
            _ => out.push(encode::srl(r(instr.dest), r(instr.src0), r(instr.src1))),
        },
        SignExt => {
            let d = r(instr.dest);
            let s = r(instr.src0);
            out.push(encode::slli(d, s, 24));
            out.push(encode::srai(d, d, 24));
        }
        Trunc => out.push(encode::andi(r(instr.dest), r(instr.src0), 0xff)),
        Eq | Neq | Lt | Leq | Gt | Geq => {
            encode::set_cmp(instr.op, r(instr.dest), r(instr.src0), r(instr.src1), &mut out)
        }
        Push => unreachable!("regalloc binds call arguments straight into argument registers; Push never reaches phase 2"),
        FuncRet => {
            let s = r(instr.src0);
            if s != A0 {
                out.push(encode::addi(A0, s, 0));
            }
        }
        Call => {
            let target = site.map(|s| s.call_pc).unwrap_or(0);
            out.push(encode::jal(RA, target as i32 - pc as i32));
            if instr.dest != RegOrSlot::None {
                let d = r(instr.dest);
                if d != A0 {
                    out.push(encode::addi(d, A0, 0));
                }
            }
        }
        Indirect => {
            let fnptr = r(instr.src0);
            out.push(encode::jalr(RA, fnptr, 0));
            if instr.dest != RegOrSlot::None {
                let d = r(instr.dest);
                if d != A0 {
                    out.push(encode::addi(d, A0, 0));
                }
            }
        }
        Branch => {
            let then_pc = site.map(|s| s.then_pc).unwrap_or(0);
            out.push(encode::bne(r(instr.src0), encode::ZERO, then_pc as i32 - pc as i32));
            if instr.is_branch_detached {
                let else_pc = site.map(|s| s.else_pc).unwrap_or(0);
                let jump_pc = pc + 4;
                out.push(encode::jal(encode::ZERO, else_pc as i32 - jump_pc as i32));
            }
        }
        Jump => {
            let target = site.map(|s| s.jump_pc).unwrap_or(0);
            out.push(encode::jal(encode::ZERO, target as i32 - pc as i32));
        }
        Return => {
            let target = site.map(|s| s.jump_pc).unwrap_or(0);
            out.push(encode::jal(encode::ZERO, target as i32 - pc as i32));
        }
    }
    out
}

impl Backend for RiscVBackend {
    fn runtime_start_words(&self, _ctx: &Context, _main: FuncId) -> u32 {
        6
    }

    fn prologue_words(&self, ctx: &Context, func: FuncId) -> u32 {
        4 + bound_params(ctx, func) as u32
    }

    fn epilogue_words(&self) -> u32 {
        4
    }

    fn instr_words(&self, ctx: &Context, instr: &Phase2Instr) -> u32 {
        lower(instr, None, is_syscall(ctx, instr)).len() as u32
    }
}

/// `data_base`: see the ARM backend's identically-named parameter.
fn emit_runtime_start(layout: &Layout, main: FuncId, data_base: u32, out: &mut Vec<u32>) {
    let main_pc = layout.entry_pc(main);
    let here = (out.len() as u32) * 4;
    out.push(encode::lw(10, SP, 0)); // a0 = argc
    out.push(encode::addi(11, SP, 4)); // a1 = argv
    out.push(encode::lui(GP, encode::hi(data_base as i32)));
    out.push(encode::addi(GP, GP, encode::lo(data_base as i32)));
    let jal_pc = here + 8;
    out.push(encode::jal(RA, main_pc as i32 - jal_pc as i32));
    out.push(encode::ecall());
}

fn emit_prologue(ctx: &Context, func: FuncId, out: &mut Vec<u32>) {
    let f = ctx.funcs.get(func);
    let stack = f.stack_size;
    out.push(encode::addi(SP, SP, -4));
    out.push(encode::sw(SP, RA, 0));
    out.push(encode::addi(SP, SP, -stack));
    out.push(encode::addi(S0, SP, 0));
    for (i, &p) in f.params.iter().take(shecc_ir::NUM_REGISTERS).enumerate() {
        let off = ctx.var(p).offset;
        out.push(encode::sw(S0, (A0 + i as u8) as u8, off));
    }
}

fn emit_epilogue(ctx: &Context, func: FuncId, out: &mut Vec<u32>) {
    let stack = ctx.funcs.get(func).stack_size;
    out.push(encode::addi(SP, S0, stack));
    out.push(encode::lw(RA, SP, 0));
    out.push(encode::addi(SP, SP, 4));
    out.push(encode::jalr(encode::ZERO, RA, 0));
}

/// Pass-1-only entry point; see the ARM backend's `code_len`.
pub(crate) fn code_len(ctx: &Context, funcs: &[FuncId]) -> u32 {
    let backend = RiscVBackend;
    let main = layout::find_main(ctx, funcs);
    layout::build(ctx, funcs, main, &backend).code_len
}

pub(crate) fn encode(
    ctx: &Context,
    funcs: &[FuncId],
    data_base: u32,
) -> Result<(Vec<u32>, Vec<(shecc_ir::Symbol, u32)>)> {
    let backend = RiscVBackend;
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
