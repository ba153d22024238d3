//! The section-header table plus the fixed `.shstrtab` string blob
//! (spec §4.I: "Six section headers in order: `NULL`, `.text`, `.data`,
//! `.symtab`, `.strtab`, `.shstrtab`").

use crate::constants::*;

#[allow(clippy::too_many_arguments)]
pub(crate) fn build(
    code_len: u32,
    data_len: u32,
    symtab_len: u32,
    strtab_len: u32,
    symbol_count: u32,
) -> Vec<u8> {
    let mut buf = Vec::new();

    let text_offset = HEADER_LEN;
    let data_offset = text_offset + code_len;
    let symtab_offset = data_offset + data_len;
    let strtab_offset = symtab_offset + symtab_len;
    let shstrtab_offset = strtab_offset + strtab_len;

    null_section(&mut buf);

    section(
        &mut buf,
        0xb,
        SHT_PROGBITS,
        SHF_WRITE | SHF_ALLOC | SHF_EXECINSTR,
        ELF_START + HEADER_LEN,
        text_offset,
        code_len,
        0,
        0,
        4,
        0,
    );

    section(
        &mut buf,
        0x11,
        SHT_PROGBITS,
        SHF_WRITE | SHF_ALLOC,
        ELF_START + HEADER_LEN + code_len,
        data_offset,
        data_len,
        0,
        0,
        4,
        0,
    );

    section(
        &mut buf,
        0x17,
        SHT_SYMTAB,
        0,
        0,
        symtab_offset,
        symtab_len,
        4, // sh_link: string table section index (.strtab)
        symbol_count,
        4,
        16,
    );

    section(
        &mut buf, 0x1f, SHT_STRTAB, 0, 0, strtab_offset, strtab_len, 0, 0, 1, 0,
    );

    section(
        &mut buf,
        1,
        SHT_STRTAB,
        0,
        0,
        shstrtab_offset,
        SHSTRTAB_LEN,
        0,
        0,
        1,
        0,
    );

    buf
}

pub(crate) fn shoff(code_len: u32, data_len: u32, symtab_len: u32, strtab_len: u32) -> u32 {
    HEADER_LEN + code_len + data_len + SHSTRTAB_LEN + symtab_len + strtab_len
}

fn null_section(buf: &mut Vec<u8>) {
    for _ in 0..10 {
        buf.extend_from_slice(&0u32.to_le_bytes());
    }
}

#[allow(clippy::too_many_arguments)]
fn section(
    buf: &mut Vec<u8>,
    name: u32,
    ty: u32,
    flags: u32,
    addr: u32,
    offset: u32,
    size: u32,
    link: u32,
    info: u32,
    align: u32,
    entsize: u32,
) {
    for field in [name, ty, flags, addr, offset, size, link, info, align, entsize] {
        buf.extend_from_slice(&field.to_le_bytes());
    }
}
