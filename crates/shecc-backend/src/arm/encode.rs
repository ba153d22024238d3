//! ARMv7-A instruction word encoders, ported function-for-function from
//! the original `arm.c` encoder (spec §4.H). Every function here returns
//! a raw 32-bit instruction word; nothing in this module knows about the
//! IR, the register allocator's virtual registers, or layout — it only
//! knows how to turn condition/register/immediate values into bytes.

/// Condition field values (bits 31-28).
pub(crate) const AL: u32 = 14;
pub(crate) const EQ: u32 = 0;
pub(crate) const NE: u32 = 1;
pub(crate) const LT: u32 = 11;
pub(crate) const LE: u32 = 13;
pub(crate) const GT: u32 = 12;
pub(crate) const GE: u32 = 10;

pub(crate) const R0: u8 = 0;
pub(crate) const R7: u8 = 7;
pub(crate) const FP: u8 = 11;
pub(crate) const GP: u8 = 12;
pub(crate) const SP: u8 = 13;
pub(crate) const LR: u8 = 14;
pub(crate) const PC: u8 = 15;

fn encode(cond: u32, opcode: u32, rn: u8, rd: u8, op2: u32) -> u32 {
    (cond << 28) + (opcode << 20) + ((rn as u32) << 16) + ((rd as u32) << 12) + op2
}

/// Extract `n_end - n_start + 1` bits of `val` starting at `n_start`.
fn extract_bits(val: i32, start: u32, end: u32) -> u32 {
    ((val as u32) >> start) & ((1u32 << (end - start + 1)) - 1)
}

/// Rotate an arbitrary 32-bit value right by `amount` bit positions (the
/// inverse of the rotated-immediate encoding `__mov` searches over).
fn ror(val: u32, amount: u32) -> u32 {
    if amount == 0 {
        val
    } else {
        (val >> amount) | (val << (32 - amount))
    }
}

/// ARM data-processing immediates are an 8-bit value rotated right by an
/// even amount. Search for a rotation that reproduces `val` exactly;
/// `None` if no rotation of an 8-bit value can.
fn split_imm(val: u32) -> Option<(u32, u32)> {
    for rot in (0..32).step_by(2) {
        let candidate = ror(val, rot);
        if candidate < 256 {
            // op2 encodes the rotation as rot/2 in bits 11-8.
            return Some((candidate, (32 - rot) % 32 / 2));
        }
    }
    None
}

/// Data-processing instruction with an immediate operand (opcode per
/// ARM's 4-bit DP opcode field, `s` sets the condition-code-update bit).
fn dp_imm(cond: u32, dp_opcode: u32, s: bool, rn: u8, rd: u8, val: u32) -> u32 {
    let (imm8, rot4) = split_imm(val)
        .or_else(|| split_imm((!val).wrapping_add(1)))
        .expect("immediate too wide for a single rotated-8-bit encoding");
    let op2 = (rot4 << 8) + imm8;
    let s_bit = if s { 1 << 20 } else { 0 };
    encode(cond, (1 << 25) + (dp_opcode << 21) + s_bit, rn, rd, op2)
}

pub(crate) fn mov_i(cond: u32, rd: u8, val: i32) -> u32 {
    dp_imm(cond, 0b1101, false, 0, rd, val as u32)
}

pub(crate) fn mov_r(cond: u32, rd: u8, rm: u8) -> u32 {
    encode(cond, 0b0001101_0000_0, 0, rd, rm as u32)
}

pub(crate) fn add_i(cond: u32, rd: u8, rn: u8, val: i32) -> u32 {
    if val < 0 {
        dp_imm(cond, 0b0010, false, rn, rd, (-val) as u32)
    } else {
        dp_imm(cond, 0b0100, false, rn, rd, val as u32)
    }
}

pub(crate) fn add_r(cond: u32, rd: u8, rn: u8, rm: u8) -> u32 {
    encode(cond, 0b0000100_0000_0, rn, rd, rm as u32)
}

pub(crate) fn sub_r(cond: u32, rd: u8, rn: u8, rm: u8) -> u32 {
    encode(cond, 0b0000010_0000_0, rn, rd, rm as u32)
}

pub(crate) fn rsb_i(cond: u32, rd: u8, val: i32, rn: u8) -> u32 {
    dp_imm(cond, 0b0011, false, rn, rd, val as u32)
}

pub(crate) fn and_r(cond: u32, rd: u8, rn: u8, rm: u8) -> u32 {
    encode(cond, 0b0000000_0000_0, rn, rd, rm as u32)
}

pub(crate) fn or_r(cond: u32, rd: u8, rn: u8, rm: u8) -> u32 {
    encode(cond, 0b0001100_0000_0, rn, rd, rm as u32)
}

pub(crate) fn eor_r(cond: u32, rd: u8, rn: u8, rm: u8) -> u32 {
    encode(cond, 0b0000001_0000_0, rn, rd, rm as u32)
}

pub(crate) fn mvn_r(cond: u32, rd: u8, rm: u8) -> u32 {
    encode(cond, 0b0001111_0000_0, 0, rd, rm as u32)
}

pub(crate) fn sll(cond: u32, rd: u8, rm: u8, rs: u8) -> u32 {
    encode(cond, 0b0001101_0000_0, 0, rd, ((rs as u32) << 8) + (1 << 4) + rm as u32)
}

pub(crate) fn srl(cond: u32, rd: u8, rm: u8, rs: u8) -> u32 {
    encode(cond, 0b0001101_0000_0, 0, rd, ((rs as u32) << 8) + (3 << 4) + rm as u32)
}

pub(crate) fn sra(cond: u32, rd: u8, rm: u8, rs: u8) -> u32 {
    encode(cond, 0b0001101_0000_0, 0, rd, ((rs as u32) << 8) + (5 << 4) + rm as u32)
}

pub(crate) fn mul(cond: u32, rd: u8, rm: u8, rs: u8) -> u32 {
    encode(cond, 0, rd, 0, ((rs as u32) << 8) + (9 << 4) + rm as u32)
}

pub(crate) fn and_i(cond: u32, rd: u8, rn: u8, val: i32) -> u32 {
    dp_imm(cond, 0b0000, false, rn, rd, val as u32)
}

/// Shift-by-constant forms of `MOV`, used when the peephole pass folds
/// a shift/mask amount into an immediate (`shift_type`: 0 = LSL, 1 =
/// LSR, 2 = ASR).
fn shift_imm(cond: u32, rd: u8, rm: u8, shift_type: u32, amount: u32) -> u32 {
    encode(cond, 0b0001101_0000_0, 0, rd, (amount << 7) + (shift_type << 5) + rm as u32)
}

pub(crate) fn sll_imm(cond: u32, rd: u8, rm: u8, amount: u32) -> u32 {
    shift_imm(cond, rd, rm, 0, amount)
}

pub(crate) fn srl_imm(cond: u32, rd: u8, rm: u8, amount: u32) -> u32 {
    shift_imm(cond, rd, rm, 1, amount)
}

pub(crate) fn sra_imm(cond: u32, rd: u8, rm: u8, amount: u32) -> u32 {
    shift_imm(cond, rd, rm, 2, amount)
}

/// `SXTB Rd, Rm` — sign-extend the low byte of `Rm` into `Rd`.
pub(crate) fn sxtb(cond: u32, rd: u8, rm: u8) -> u32 {
    encode(cond, 0b0110101_0000_1111, rd, 0, rm as u32)
}

/// `SDIV Rd, Rn, Rm` — ARMv7-A's optional hardware integer divide.
pub(crate) fn sdiv(cond: u32, rd: u8, rn: u8, rm: u8) -> u32 {
    encode(cond, 0x71, rd, 0xf, ((rm as u32) << 8) + (1 << 4) + rn as u32)
}

/// `MLS Rd, Rn, Rm, Ra` — `Rd = Ra - Rn*Rm`, used to turn a quotient
/// into a remainder (`mod = dividend - quotient*divisor`).
pub(crate) fn mls(cond: u32, rd: u8, rn: u8, rm: u8, ra: u8) -> u32 {
    encode(cond, 0x06, rd, ra, ((rm as u32) << 8) + (9 << 4) + rn as u32)
}

pub(crate) fn cmp_r(cond: u32, rn: u8, rm: u8) -> u32 {
    encode(cond, 0b0001010_0000_1, rn, 0, rm as u32)
}

pub(crate) fn teq(cond: u32, rn: u8) -> u32 {
    encode(cond, 0b0001001_0000_1, rn, 0, 0)
}

/// Materialize an arbitrary 32-bit value in two instructions (spec
/// §4.H: "the target's two-instruction immediate sequence").
pub(crate) fn movw(cond: u32, rd: u8, val: u32) -> u32 {
    let imm16 = val & 0xffff;
    encode(
        cond,
        0b0011_0000,
        ((imm16 >> 12) & 0xf) as u8,
        rd,
        imm16 & 0xfff,
    )
}

pub(crate) fn movt(cond: u32, rd: u8, val: u32) -> u32 {
    let imm16 = (val >> 16) & 0xffff;
    encode(
        cond,
        0b0011_0100,
        ((imm16 >> 12) & 0xf) as u8,
        rd,
        imm16 & 0xfff,
    )
}

fn transfer(cond: u32, load: bool, byte: bool, rd: u8, rn: u8, ofs: i32) -> u32 {
    let up = ofs >= 0;
    let mag = ofs.unsigned_abs();
    assert!(mag < 4096, "load/store offset out of 12-bit range");
    let l = if load { 1 } else { 0 };
    let b = if byte { 1 } else { 0 };
    let u = if up { 1 } else { 0 };
    encode(cond, 0b010_0_1_0_0_1 | (u << 3) | (b << 1) | l, rn, rd, mag)
}

pub(crate) fn lw(cond: u32, rd: u8, rn: u8, ofs: i32) -> u32 {
    transfer(cond, true, false, rd, rn, ofs)
}

pub(crate) fn sw(cond: u32, rd: u8, rn: u8, ofs: i32) -> u32 {
    transfer(cond, false, false, rd, rn, ofs)
}

pub(crate) fn lb(cond: u32, rd: u8, rn: u8, ofs: i32) -> u32 {
    transfer(cond, true, true, rd, rn, ofs)
}

pub(crate) fn sb(cond: u32, rd: u8, rn: u8, ofs: i32) -> u32 {
    transfer(cond, false, true, rd, rn, ofs)
}

/// Branch, with the PC-relative-plus-8 pipeline offset folded in.
pub(crate) fn b(cond: u32, ofs: i32) -> u32 {
    let rel = (ofs - 8) >> 2;
    encode(cond, 0b1010_0000, 0, 0, extract_bits(rel, 0, 23))
}

pub(crate) fn bl(cond: u32, ofs: i32) -> u32 {
    let rel = (ofs - 8) >> 2;
    encode(cond, 0b1011_0000, 0, 0, extract_bits(rel, 0, 23))
}

pub(crate) fn blx_r(cond: u32, rm: u8) -> u32 {
    encode(cond, 0b0001_0010, 0xf, 0xf, 0b0011 << 4 | rm as u32)
}

/// `STMDB sp!, {regs...}` — push a register list, lowest bit = r0.
pub(crate) fn stmdb(cond: u32, reg_list: u16) -> u32 {
    encode(cond, 0b1001_0010, SP, 0, reg_list as u32)
}

pub(crate) fn ldm(cond: u32, reg_list: u16) -> u32 {
    encode(cond, 0b1000_1011, SP, 0, reg_list as u32)
}

pub(crate) fn svc() -> u32 {
    encode(AL, 0b1111_0000, 0, 0, 0)
}

/// Maps a signed-integer comparison opcode to the ARM condition code
/// that makes a following `mov{cond} rd, #1` set `rd` correctly.
pub(crate) fn cond_for(op: shecc_ir::Opcode) -> u32 {
    use shecc_ir::Opcode::*;
    match op {
        Eq => EQ,
        Neq => NE,
        Lt => LT,
        Leq => LE,
        Gt => GT,
        Geq => GE,
        _ => unreachable!("cond_for is only called for comparison opcodes"),
    }
}
