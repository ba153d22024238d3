//! Filesystem-backed [`SourceLoader`]: the only place this crate talks
//! to the filesystem on the preprocessor's behalf (spec §5's "scoped
//! acquisition" boundary — `shecc-pp` only decides *when* to ask).

use std::path::Path;

use shecc_ir::{CompileError, Context, Result, SourceLoc, Symbol};
use shecc_pp::SourceLoader;

#[derive(Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&mut self, path: &str, including_file: Symbol, ctx: &mut Context) -> Result<(String, Symbol)> {
        let including_path = ctx.interner.resolve(including_file).to_string();
        let resolved = Path::new(&including_path)
            .parent()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|| Path::new(path).to_path_buf());

        let text = std::fs::read_to_string(&resolved).map_err(|_| CompileError::IncludeNotFound {
            path: path.to_string(),
            // The trait has no caller location to attach; this points
            // at the including file with an unknown line/column.
            loc: SourceLoc::new(including_file, 0, 0, 0, 0),
        })?;
        let sym = ctx.intern(&resolved.to_string_lossy());
        Ok((text, sym))
    }
}
