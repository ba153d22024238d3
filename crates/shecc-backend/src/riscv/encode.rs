//! RV32IM instruction word encoders, ported function-for-function from
//! the original `riscv.c` encoder (spec §4.H). Raw words only — no IR,
//! no virtual registers, no layout.

pub(crate) const ZERO: u8 = 0;
pub(crate) const RA: u8 = 1;
pub(crate) const SP: u8 = 2;
pub(crate) const GP: u8 = 3;
pub(crate) const S0: u8 = 8; // frame pointer
pub(crate) const A0: u8 = 10;
pub(crate) const A7: u8 = 17;

const OP_ADD: u32 = 0b0110011;
const OP_SUB: u32 = OP_ADD | (0x20 << 25);
const OP_XOR: u32 = 0b0110011 | (4 << 12);
const OP_OR: u32 = 0b0110011 | (6 << 12);
const OP_AND: u32 = 0b0110011 | (7 << 12);
const OP_SLL: u32 = 0b0110011 | (1 << 12);
const OP_SRL: u32 = 0b0110011 | (5 << 12);
const OP_SRA: u32 = OP_SRL | (0x20 << 25);
const OP_SLT: u32 = 0b0110011 | (2 << 12);
const OP_SLTU: u32 = 0b0110011 | (3 << 12);
const OP_ADDI: u32 = 0b0010011;
const OP_XORI: u32 = 0b0010011 | (4 << 12);
const OP_ANDI: u32 = 0b0010011 | (7 << 12);
const OP_SLTIU: u32 = 0b0010011 | (3 << 12);
const OP_LB: u32 = 0b0000011;
const OP_LW: u32 = 0b0000011 | (2 << 12);
const OP_SB: u32 = 0b0100011;
const OP_SW: u32 = 0b0100011 | (2 << 12);
const OP_BEQ: u32 = 0b1100011;
const OP_BNE: u32 = 0b1100011 | (1 << 12);
const OP_BLT: u32 = 0b1100011 | (4 << 12);
const OP_BGE: u32 = 0b1100011 | (5 << 12);
const OP_JAL: u32 = 0b1101111;
const OP_JALR: u32 = 0b1100111;
const OP_LUI: u32 = 0b0110111;
const OP_ECALL: u32 = 0b1110011;
const OP_MUL: u32 = 0b0110011 | (1 << 25);
const OP_DIV: u32 = 0b0110011 | (1 << 25) | (4 << 12);
const OP_REM: u32 = 0b0110011 | (1 << 25) | (6 << 12);

fn extract_bits(imm: i32, i_start: u32, i_end: u32, d_start: u32, d_end: u32) -> u32 {
    debug_assert_eq!(d_end - d_start, i_end - i_start);
    let v = (imm as u32) >> i_start;
    let v = v & ((2 << (i_end - i_start)) - 1);
    v << d_start
}

/// Split an absolute/immediate value into RV32's `lui`/`addi` pair: the
/// low 12 bits are sign-extended by `addi`, so the high 20 bits loaded
/// by `lui` must be bumped by one when bit 11 of the low half is set.
pub(crate) fn hi(val: i32) -> i32 {
    if val & (1 << 11) != 0 {
        val.wrapping_add(4096)
    } else {
        val
    }
}

pub(crate) fn lo(val: i32) -> i32 {
    if val & (1 << 11) != 0 {
        (val & 0xfff) - 4096
    } else {
        val & 0xfff
    }
}

fn encode_r(op: u32, rd: u8, rs1: u8, rs2: u8) -> u32 {
    op + ((rd as u32) << 7) + ((rs1 as u32) << 15) + ((rs2 as u32) << 20)
}

fn encode_i(op: u32, rd: u8, rs1: u8, imm: i32) -> u32 {
    assert!((-2048..=2047).contains(&imm), "I-type immediate out of range");
    let imm = if imm < 0 { (imm + 4096) & ((1 << 13) - 1) } else { imm };
    op + ((rd as u32) << 7) + ((rs1 as u32) << 15) + ((imm as u32) << 20)
}

fn encode_s(op: u32, rs1: u8, rs2: u8, imm: i32) -> u32 {
    assert!((-2048..=2047).contains(&imm), "S-type immediate out of range");
    let imm = if imm < 0 { (imm + 4096) & ((1 << 13) - 1) } else { imm };
    op + ((rs1 as u32) << 15)
        + ((rs2 as u32) << 20)
        + extract_bits(imm, 0, 4, 7, 11)
        + extract_bits(imm, 5, 11, 25, 31)
}

fn encode_b(op: u32, rs1: u8, rs2: u8, imm: i32) -> u32 {
    assert!((-4096..=4095).contains(&imm), "B-type immediate out of range");
    let sign = if imm < 0 { 1u32 } else { 0 };
    op + ((rs1 as u32) << 15)
        + ((rs2 as u32) << 20)
        + extract_bits(imm, 11, 11, 7, 7)
        + extract_bits(imm, 1, 4, 8, 11)
        + extract_bits(imm, 5, 10, 25, 30)
        + (sign << 31)
}

fn encode_j(op: u32, rd: u8, imm: i32) -> u32 {
    let (sign, imm) = if imm < 0 { (1u32, (1 << 21) - (-imm)) } else { (0, imm) };
    op + ((rd as u32) << 7)
        + extract_bits(imm, 1, 10, 21, 30)
        + extract_bits(imm, 11, 11, 20, 20)
        + extract_bits(imm, 12, 19, 12, 19)
        + (sign << 31)
}

fn encode_u(op: u32, rd: u8, imm: i32) -> u32 {
    op + ((rd as u32) << 7) + extract_bits(imm, 12, 31, 12, 31)
}

pub(crate) fn add(rd: u8, rs1: u8, rs2: u8) -> u32 {
    encode_r(OP_ADD, rd, rs1, rs2)
}
pub(crate) fn sub(rd: u8, rs1: u8, rs2: u8) -> u32 {
    encode_r(OP_SUB, rd, rs1, rs2)
}
pub(crate) fn xor(rd: u8, rs1: u8, rs2: u8) -> u32 {
    encode_r(OP_XOR, rd, rs1, rs2)
}
pub(crate) fn or(rd: u8, rs1: u8, rs2: u8) -> u32 {
    encode_r(OP_OR, rd, rs1, rs2)
}
pub(crate) fn and(rd: u8, rs1: u8, rs2: u8) -> u32 {
    encode_r(OP_AND, rd, rs1, rs2)
}
pub(crate) fn sll(rd: u8, rs1: u8, rs2: u8) -> u32 {
    encode_r(OP_SLL, rd, rs1, rs2)
}
pub(crate) fn srl(rd: u8, rs1: u8, rs2: u8) -> u32 {
    encode_r(OP_SRL, rd, rs1, rs2)
}
pub(crate) fn sra(rd: u8, rs1: u8, rs2: u8) -> u32 {
    encode_r(OP_SRA, rd, rs1, rs2)
}
pub(crate) fn slt(rd: u8, rs1: u8, rs2: u8) -> u32 {
    encode_r(OP_SLT, rd, rs1, rs2)
}
pub(crate) fn sltu(rd: u8, rs1: u8, rs2: u8) -> u32 {
    encode_r(OP_SLTU, rd, rs1, rs2)
}
pub(crate) fn mul(rd: u8, rs1: u8, rs2: u8) -> u32 {
    encode_r(OP_MUL, rd, rs1, rs2)
}
pub(crate) fn div(rd: u8, rs1: u8, rs2: u8) -> u32 {
    encode_r(OP_DIV, rd, rs1, rs2)
}
pub(crate) fn rem(rd: u8, rs1: u8, rs2: u8) -> u32 {
    encode_r(OP_REM, rd, rs1, rs2)
}

pub(crate) fn addi(rd: u8, rs1: u8, imm: i32) -> u32 {
    encode_i(OP_ADDI, rd, rs1, imm)
}
pub(crate) fn xori(rd: u8, rs1: u8, imm: i32) -> u32 {
    encode_i(OP_XORI, rd, rs1, imm)
}
pub(crate) fn andi(rd: u8, rs1: u8, imm: i32) -> u32 {
    encode_i(OP_ANDI, rd, rs1, imm)
}
pub(crate) fn sltiu(rd: u8, rs1: u8, imm: i32) -> u32 {
    encode_i(OP_SLTIU, rd, rs1, imm)
}
pub(crate) fn slli(rd: u8, rs1: u8, shamt: i32) -> u32 {
    encode_i(0b0010011 | (1 << 12), rd, rs1, shamt)
}
pub(crate) fn srli(rd: u8, rs1: u8, shamt: i32) -> u32 {
    encode_i(0b0010011 | (5 << 12), rd, rs1, shamt)
}
pub(crate) fn srai(rd: u8, rs1: u8, shamt: i32) -> u32 {
    encode_i(0b0010011 | (5 << 12) | (0x20 << 25) as i32 as u32, rd, rs1, shamt)
}

pub(crate) fn lb(rd: u8, rs1: u8, imm: i32) -> u32 {
    encode_i(OP_LB, rd, rs1, imm)
}
pub(crate) fn lw(rd: u8, rs1: u8, imm: i32) -> u32 {
    encode_i(OP_LW, rd, rs1, imm)
}
pub(crate) fn sb(rs1: u8, rs2: u8, imm: i32) -> u32 {
    encode_s(OP_SB, rs1, rs2, imm)
}
pub(crate) fn sw(rs1: u8, rs2: u8, imm: i32) -> u32 {
    encode_s(OP_SW, rs1, rs2, imm)
}

pub(crate) fn beq(rs1: u8, rs2: u8, imm: i32) -> u32 {
    encode_b(OP_BEQ, rs1, rs2, imm)
}
pub(crate) fn bne(rs1: u8, rs2: u8, imm: i32) -> u32 {
    encode_b(OP_BNE, rs1, rs2, imm)
}
pub(crate) fn blt(rs1: u8, rs2: u8, imm: i32) -> u32 {
    encode_b(OP_BLT, rs1, rs2, imm)
}
pub(crate) fn bge(rs1: u8, rs2: u8, imm: i32) -> u32 {
    encode_b(OP_BGE, rs1, rs2, imm)
}

pub(crate) fn jal(rd: u8, imm: i32) -> u32 {
    encode_j(OP_JAL, rd, imm)
}
pub(crate) fn jalr(rd: u8, rs1: u8, imm: i32) -> u32 {
    encode_i(OP_JALR, rd, rs1, imm)
}
pub(crate) fn lui(rd: u8, imm: i32) -> u32 {
    encode_u(OP_LUI, rd, imm)
}
pub(crate) fn ecall() -> u32 {
    encode_i(OP_ECALL, ZERO, ZERO, 0)
}

/// Signed-integer comparison lowered with `slt`/`sltu` (RV32 has no
/// conditional-set instruction beyond `slt`), producing 0/1 in `rd`.
pub(crate) fn set_cmp(op: shecc_ir::Opcode, rd: u8, rs1: u8, rs2: u8, out: &mut Vec<u32>) {
    use shecc_ir::Opcode::*;
    match op {
        Lt => out.push(slt(rd, rs1, rs2)),
        Geq => {
            out.push(slt(rd, rs1, rs2));
            out.push(xori(rd, rd, 1));
        }
        Gt => out.push(slt(rd, rs2, rs1)),
        Leq => {
            out.push(slt(rd, rs2, rs1));
            out.push(xori(rd, rd, 1));
        }
        Eq => {
            out.push(sub(rd, rs1, rs2));
            out.push(sltiu(rd, rd, 1));
        }
        Neq => {
            out.push(sub(rd, rs1, rs2));
            out.push(sltu(rd, ZERO, rd));
        }
        _ => unreachable!("set_cmp is only called for comparison opcodes"),
    }
}
