//! ELF32 image assembly (spec §4.I): takes the finished machine code,
//! data section, and symbol table the backend produced and lays them
//! out into a byte-identical, statically-linked `ET_EXEC` image.
//!
//! Deliberately independent of `shecc-ir`: this crate only ever sees
//! raw bytes and `(name, offset)` pairs, never the IR's `Context` or
//! arenas. Everything upstream of it (lowering, encoding, label
//! resolution) happens in `shecc-backend`, which hands this crate a
//! finished `ElfImage` to serialize. Keeping the boundary here means
//! this crate has no opinion about ARM vs RISC-V beyond the one-byte
//! `e_machine` distinction `Machine` carries.

mod constants;
mod error;
mod header;
mod sections;
mod symtab;

pub use constants::{align4, ELF_START, HEADER_LEN};
pub use error::ElfError;

use constants::{EF_ARM_EABI, EM_ARM, EM_RISCV};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Machine {
    Arm,
    RiscV,
}

impl Machine {
    fn e_machine(self) -> u16 {
        match self {
            Machine::Arm => EM_ARM,
            Machine::RiscV => EM_RISCV,
        }
    }

    fn e_flags(self) -> u32 {
        match self {
            Machine::Arm => EF_ARM_EABI,
            Machine::RiscV => 0,
        }
    }
}

/// One named entry in `.symtab`: a function or a top-level local,
/// addressed by its offset into `.text` (spec §4.I: "Symbol names are
/// appended to `.strtab` with NUL terminators").
#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub value: u32,
}

/// Everything needed to serialize a finished binary: the encoded
/// instruction stream, the initialized-data bytes, and the symbol
/// table, already laid out by `shecc-backend`'s two-pass encoder.
#[derive(Clone, Debug)]
pub struct ElfImage {
    pub machine: Machine,
    pub code: Vec<u8>,
    pub data: Vec<u8>,
    pub symbols: Vec<Symbol>,
}

impl ElfImage {
    pub fn new(machine: Machine) -> Self {
        Self { machine, code: Vec::new(), data: Vec::new(), symbols: Vec::new() }
    }

    /// Serialize to the exact byte layout spec §4.I and §6 describe:
    /// header+phdr, `.text`, `.data`, `.symtab`, `.strtab`, the
    /// `.shstrtab` blob, then the section header table.
    pub fn to_bytes(&self) -> Vec<u8> {
        tracing::debug!(
            machine = ?self.machine,
            code_bytes = self.code.len(),
            data_bytes = self.data.len(),
            symbols = self.symbols.len(),
            "assembling ELF image"
        );
        let code_len = self.code.len() as u32;
        let data_len = align4(self.data.len() as u32);
        let mut data = self.data.clone();
        data.resize(data_len as usize, 0);

        let (symtab, strtab) = symtab::build(&self.symbols);
        let symtab_len = align4(symtab.len() as u32);
        let strtab_len = align4(strtab.len() as u32);
        let mut symtab = symtab;
        symtab.resize(symtab_len as usize, 0);
        let mut strtab = strtab;
        strtab.resize(strtab_len as usize, 0);

        let shoff = sections::shoff(code_len, data_len, symtab_len, strtab_len);
        let header = header::build(self.machine, code_len, data_len, shoff);
        let symbol_count = self.symbols.len() as u32 + 1; // + STN_UNDEF
        let section_headers = sections::build(code_len, data_len, symtab_len, strtab_len, symbol_count);

        let mut out = Vec::with_capacity(
            header.len() + code_len as usize + data.len() + symtab.len() + strtab.len() + constants::SHSTRTAB_BLOB.len() + section_headers.len(),
        );
        out.extend_from_slice(&header);
        out.extend_from_slice(&self.code);
        out.extend_from_slice(&data);
        out.extend_from_slice(&symtab);
        out.extend_from_slice(&strtab);
        out.extend_from_slice(constants::SHSTRTAB_BLOB);
        out.extend_from_slice(&section_headers);
        out
    }

    pub fn write(&self, path: &std::path::Path) -> Result<(), ElfError> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_image_has_header_plus_shstrtab_plus_six_section_headers() {
        let image = ElfImage::new(Machine::Arm);
        let bytes = image.to_bytes();
        assert_eq!(&bytes[0..4], &[0x7f, b'E', b'L', b'F']);
        assert_eq!(
            bytes.len(),
            HEADER_LEN as usize + constants::SHSTRTAB_BLOB.len() + 6 * 40
        );
    }

    #[test]
    fn entry_point_is_load_address_plus_header_len() {
        let image = ElfImage::new(Machine::Arm);
        let bytes = image.to_bytes();
        let entry = u32::from_le_bytes(bytes[24..28].try_into().unwrap());
        assert_eq!(entry, ELF_START + HEADER_LEN);
        assert_eq!(entry, 0x10054);
    }

    #[test]
    fn riscv_machine_byte_is_0xf3() {
        let image = ElfImage::new(Machine::RiscV);
        let bytes = image.to_bytes();
        let machine = u16::from_le_bytes(bytes[18..20].try_into().unwrap());
        assert_eq!(machine, 0xf3);
    }

    #[test]
    fn symbol_table_includes_the_mandatory_undef_entry() {
        let mut image = ElfImage::new(Machine::Arm);
        image.symbols.push(Symbol { name: "main".into(), value: 0 });
        let bytes = image.to_bytes();
        // header + code(0) + data(0) then symtab starts; each entry is
        // 16 bytes and there must be exactly two (undef + main).
        let symtab_start = HEADER_LEN as usize;
        let name_off_of_second = u32::from_le_bytes(bytes[symtab_start + 16..symtab_start + 20].try_into().unwrap());
        assert_eq!(name_off_of_second, 1); // "main" follows the undef symbol's empty name + NUL
    }
}
