//! External declarations (spec §4.C "Grammar (subset)", top level):
//! `typedef`, a bare `struct`/`enum` declaration, function prototypes
//! and definitions, and global variables with constant-only
//! initializers.

use shecc_ir::{
    CompileError, Function, Keyword, Opcode, Phase1Instr, Punct, Result, Symbol, TypeId, Variable,
    MAX_PARAMS,
};

use crate::types_parse::Declarator;
use crate::{FuncState, Parser};

impl<'a, 'b> Parser<'a, 'b> {
    pub(crate) fn parse_external_declaration(&mut self) -> Result<()> {
        if self.cursor.accept_keyword(Keyword::Typedef) {
            return self.parse_typedef();
        }
        let ty = self
            .try_parse_type_specifier()?
            .ok_or_else(|| self.cursor.unexpected())?;
        // A bare `struct Foo { ... };` or `enum { ... };` with no
        // declarator at all — the type/constants it registered are the
        // whole point.
        if self.cursor.accept_punct(Punct::Semi) {
            return Ok(());
        }
        loop {
            let mut ptr_depth = 0u8;
            while self.cursor.accept_punct(Punct::Star) {
                ptr_depth += 1;
            }
            let name = self.cursor.expect_identifier()?;
            if self.cursor.at_punct(Punct::LParen) {
                return self.parse_function(ty, name);
            }
            self.parse_global_var(ty, ptr_depth, name)?;
            if !self.cursor.accept_punct(Punct::Comma) {
                break;
            }
        }
        self.cursor.expect_punct(Punct::Semi)?;
        Ok(())
    }

    fn parse_global_var(&mut self, ty: TypeId, ptr_depth: u8, name: Symbol) -> Result<()> {
        let mut array_size = 0i32;
        if self.cursor.accept_punct(Punct::LBracket) {
            if !self.cursor.at_punct(Punct::RBracket) {
                array_size = self.parse_const_expr()?;
            }
            self.cursor.expect_punct(Punct::RBracket)?;
        }
        let decl = Declarator { name, ptr_depth, array_size };
        let (ptr_depth, array_size) = self.effective_shape(ty, &decl);
        let mut var = Variable::new_local(ty, name, ptr_depth, array_size);
        var.is_global = true;
        if self.cursor.accept_punct(Punct::Eq) {
            if array_size > 0 {
                return Err(CompileError::UnsupportedConstruct {
                    what: "initializer for a global array",
                    loc: self.cursor.loc(),
                });
            }
            var.init_val = Some(self.parse_const_expr()?);
        }
        self.declare_var(name, var, true)?;
        Ok(())
    }

    /// `(` (`void` | param (`,` param)*)? `)` — parses and returns the
    /// parameter list's `(type, ptr_depth, name)` triples. Array
    /// parameters decay to a pointer, as in any C subset.
    fn parse_param_list(&mut self) -> Result<(Vec<(TypeId, u8, Symbol)>, bool)> {
        self.cursor.expect_punct(Punct::LParen)?;
        let mut params = Vec::new();
        if self.cursor.at_punct(Punct::RParen) {
            self.cursor.bump();
            return Ok((params, false));
        }
        if self.cursor.at_keyword(Keyword::Void) && self.cursor.at_punct_n(1, Punct::RParen) {
            self.cursor.bump();
            self.cursor.bump();
            return Ok((params, false));
        }
        let mut variadic = false;
        loop {
            // A trailing `, ...` marks the function variadic (spec §1's
            // libc collaborator declares `printf`/`sprintf` this way);
            // this subset has no `va_arg` — the ellipsis only has to
            // parse, not bind further arguments to anything.
            if self.cursor.accept_punct(Punct::Ellipsis) {
                variadic = true;
                break;
            }
            let pty = self
                .try_parse_type_specifier()?
                .ok_or_else(|| self.cursor.unexpected())?;
            let mut pptr = 0u8;
            while self.cursor.accept_punct(Punct::Star) {
                pptr += 1;
            }
            let pname = self.cursor.expect_identifier()?;
            if self.cursor.accept_punct(Punct::LBracket) {
                if !self.cursor.at_punct(Punct::RBracket) {
                    self.parse_const_expr()?;
                }
                self.cursor.expect_punct(Punct::RBracket)?;
                pptr = pptr.max(1);
            }
            params.push((pty, pptr, pname));
            if params.len() > MAX_PARAMS {
                return Err(CompileError::TooManyParams { loc: self.cursor.loc() });
            }
            if !self.cursor.accept_punct(Punct::Comma) {
                break;
            }
        }
        self.cursor.expect_punct(Punct::RParen)?;
        Ok((params, variadic))
    }

    /// Register a function's signature without a body, for a prototype
    /// or a call seen ahead of its definition. A second prototype (or
    /// the eventual definition) trusts whichever signature was recorded
    /// first — this subset has no prototype-mismatch diagnostics.
    fn register_signature(
        &mut self,
        name: Symbol,
        return_type: TypeId,
        params: &[(TypeId, u8, Symbol)],
        variadic: bool,
    ) -> shecc_ir::FuncId {
        if let Some(&id) = self.funcs_by_name.get(&name) {
            return id;
        }
        let entry_bb = self.new_block();
        let exit_bb = self.new_block();
        let mut f = Function::new(name, return_type, entry_bb, exit_bb, self.cursor.loc());
        f.is_variadic = variadic;
        for (pty, pptr, pname) in params {
            let var = Variable::new_local(*pty, *pname, *pptr, 0);
            let vid = self.ctx.alloc_var(var);
            f.params.push(vid);
        }
        let id = self.ctx.funcs.alloc(f);
        self.funcs_by_name.insert(name, id);
        id
    }

    /// `(` params `)` (`;` | `{` body `}`). A declared return type with
    /// pointer stars collapses to its base type here — the phase-1
    /// `Function` carries one `TypeId` for its return slot, the same
    /// shape the rest of this crate's IR already commits to.
    fn parse_function(&mut self, return_type: TypeId, name: Symbol) -> Result<()> {
        let (params, variadic) = self.parse_param_list()?;
        let func_id = self.register_signature(name, return_type, &params, variadic);

        if self.cursor.accept_punct(Punct::Semi) {
            return Ok(());
        }

        let entry_bb = self.ctx.funcs.get(func_id).entry_bb;

        self.push_scope();
        self.func = Some(FuncState {
            id: func_id,
            locals_count: 0,
            loop_stack: Vec::new(),
            switch_stack: Vec::new(),
            side_effects: Vec::new(),
            nesting: 0,
        });

        let mut param_ids = Vec::with_capacity(params.len());
        for (pty, pptr, pname) in &params {
            let var = Variable::new_local(*pty, *pname, *pptr, 0);
            param_ids.push(self.declare_var(*pname, var, false)?);
        }
        self.ctx.funcs.get_mut(func_id).params = param_ids;

        let mut cur = entry_bb;
        self.parse_block(&mut cur)?;
        // Every path must terminate somehow; a function whose body
        // already returns on all paths gets a harmless extra `return`
        // appended to its last block (no reachability analysis tracks
        // whether that block is already dead — see DESIGN.md).
        self.emit(cur, Phase1Instr::new(Opcode::Return));

        self.func = None;
        self.pop_scope();
        Ok(())
    }
}
