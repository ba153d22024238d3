//! `.symtab` / `.strtab` assembly (spec §4.I: "each symbol is 16 bytes
//! `{name_offset, value, size=0, info=0 or 0x10000}`").

use crate::constants::SHNDX_TEXT;
use crate::Symbol;

/// Builds both tables together since every symbol's name offset is into
/// the strtab being built alongside it. The mandatory empty symbol at
/// index 0 (`STN_UNDEF`) is prepended automatically.
pub(crate) fn build(symbols: &[Symbol]) -> (Vec<u8>, Vec<u8>) {
    let mut symtab = Vec::new();
    let mut strtab = Vec::new();

    write_entry(&mut symtab, &mut strtab, "", 0);
    for sym in symbols {
        write_entry(&mut symtab, &mut strtab, &sym.name, sym.value);
    }

    (symtab, strtab)
}

fn write_entry(symtab: &mut Vec<u8>, strtab: &mut Vec<u8>, name: &str, value: u32) {
    let name_offset = strtab.len() as u32;
    symtab.extend_from_slice(&name_offset.to_le_bytes());
    symtab.extend_from_slice(&value.to_le_bytes());
    symtab.extend_from_slice(&0u32.to_le_bytes()); // st_size

    // info(1) + other(1) + shndx(2) packed as one little-endian word,
    // matching the original writer's `0` / `1 << 16` shorthand.
    let info_other_shndx: u32 = if value == 0 { 0 } else { SHNDX_TEXT << 16 };
    symtab.extend_from_slice(&info_other_shndx.to_le_bytes());

    strtab.extend_from_slice(name.as_bytes());
    strtab.push(0);
}
