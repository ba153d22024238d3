//! ELF header + the one program header (spec §4.I), 0x54 bytes total.

use crate::constants::*;
use crate::Machine;

pub(crate) fn build(machine: Machine, code_len: u32, data_len: u32, shoff: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN as usize);

    // e_ident
    buf.extend_from_slice(&0x464c457fu32.to_le_bytes()); // magic
    buf.push(1); // EI_CLASS: ELFCLASS32
    buf.push(1); // EI_DATA: ELFDATA2LSB
    buf.push(1); // EI_VERSION
    buf.push(0); // EI_OSABI: System V
    buf.extend_from_slice(&0u32.to_le_bytes()); // EI_ABIVERSION + padding start
    buf.extend_from_slice(&0u32.to_le_bytes()); // rest of e_ident padding

    buf.extend_from_slice(&ET_EXEC.to_le_bytes());
    buf.extend_from_slice(&machine.e_machine().to_le_bytes());
    buf.extend_from_slice(&1u32.to_le_bytes()); // e_version
    buf.extend_from_slice(&(ELF_START + HEADER_LEN).to_le_bytes()); // e_entry
    buf.extend_from_slice(&0x34u32.to_le_bytes()); // e_phoff
    buf.extend_from_slice(&shoff.to_le_bytes()); // e_shoff
    buf.extend_from_slice(&machine.e_flags().to_le_bytes());
    buf.extend_from_slice(&0x34u16.to_le_bytes()); // e_ehsize
    buf.extend_from_slice(&0x20u16.to_le_bytes()); // e_phentsize
    buf.extend_from_slice(&1u16.to_le_bytes()); // e_phnum
    buf.extend_from_slice(&0x28u16.to_le_bytes()); // e_shentsize
    buf.extend_from_slice(&6u16.to_le_bytes()); // e_shnum
    buf.extend_from_slice(&5u16.to_le_bytes()); // e_shstrndx

    debug_assert_eq!(buf.len(), 0x34);

    // Program header: one PT_LOAD covering code + data.
    buf.extend_from_slice(&PT_LOAD.to_le_bytes());
    buf.extend_from_slice(&HEADER_LEN.to_le_bytes()); // p_offset
    buf.extend_from_slice(&(ELF_START + HEADER_LEN).to_le_bytes()); // p_vaddr
    buf.extend_from_slice(&(ELF_START + HEADER_LEN).to_le_bytes()); // p_paddr
    buf.extend_from_slice(&(code_len + data_len).to_le_bytes()); // p_filesz
    buf.extend_from_slice(&(code_len + data_len).to_le_bytes()); // p_memsz
    buf.extend_from_slice(&7u32.to_le_bytes()); // p_flags: RWX
    buf.extend_from_slice(&4u32.to_le_bytes()); // p_align

    debug_assert_eq!(buf.len(), HEADER_LEN as usize);
    buf
}
