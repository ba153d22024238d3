//! Statement lowering (spec §4.C "Statement lowering"): each construct
//! allocates the basic blocks its control flow needs and wires them
//! with `emit_branch`/`emit_jump`, threading the "current block"
//! through the body exactly the way the original cfront-style lowering
//! does, just onto an explicit block graph instead of emitted assembly.

use shecc_ir::{BlockId, CompileError, Keyword, Opcode, Phase1Instr, Punct, Result, Variable};

use crate::lvalue::Addressable;
use crate::{Parser, SwitchState};

impl<'a, 'b> Parser<'a, 'b> {
    /// `{` stmt* `}` — a fresh lexical scope, bracketed by `BlockStart`/
    /// `BlockEnd` markers the stack-layout pass uses to know when a
    /// scope's locals go dead (spec §4.C "Compound statement").
    pub(crate) fn parse_block(&mut self, block: &mut BlockId) -> Result<()> {
        self.cursor.expect_punct(Punct::LBrace)?;
        self.push_scope();
        self.emit(*block, Phase1Instr::new(Opcode::BlockStart));
        while !self.cursor.at_punct(Punct::RBrace) {
            self.parse_stmt(block)?;
        }
        self.cursor.expect_punct(Punct::RBrace)?;
        self.emit(*block, Phase1Instr::new(Opcode::BlockEnd));
        self.pop_scope();
        Ok(())
    }

    fn at_type_specifier_start(&self) -> bool {
        use Keyword::*;
        if self.cursor.at_keyword(Void)
            || self.cursor.at_keyword(Int)
            || self.cursor.at_keyword(Char)
            || self.cursor.at_keyword(Struct)
            || self.cursor.at_keyword(Enum)
            || self.cursor.at_keyword(Const)
            || self.cursor.at_keyword(Union)
        {
            return true;
        }
        self.cursor
            .peek_identifier()
            .is_some_and(|sym| self.ctx.types.lookup(sym).is_some())
    }

    pub(crate) fn parse_stmt(&mut self, block: &mut BlockId) -> Result<()> {
        if self.cursor.accept_punct(Punct::Semi) {
            return Ok(());
        }
        if self.cursor.at_punct(Punct::LBrace) {
            return self.parse_block(block);
        }
        if self.cursor.accept_keyword(Keyword::Typedef) {
            return self.parse_typedef();
        }
        if self.at_type_specifier_start() {
            return self.parse_local_decl(block);
        }
        if self.cursor.at_keyword(Keyword::If) {
            return self.parse_if(block);
        }
        if self.cursor.at_keyword(Keyword::While) {
            return self.parse_while(block);
        }
        if self.cursor.at_keyword(Keyword::Do) {
            return self.parse_do_while(block);
        }
        if self.cursor.at_keyword(Keyword::For) {
            return self.parse_for(block);
        }
        if self.cursor.at_keyword(Keyword::Switch) {
            return self.parse_switch(block);
        }
        if self.cursor.accept_keyword(Keyword::Case) {
            return self.parse_case(block);
        }
        if self.cursor.accept_keyword(Keyword::Default) {
            return self.parse_default(block);
        }
        if self.cursor.accept_keyword(Keyword::Break) {
            let target = self.break_target().ok_or_else(|| CompileError::UnsupportedConstruct {
                what: "break outside a loop or switch",
                loc: self.cursor.loc(),
            })?;
            self.emit_jump(*block, target);
            self.cursor.expect_punct(Punct::Semi)?;
            return Ok(());
        }
        if self.cursor.accept_keyword(Keyword::Continue) {
            let target = self.continue_target().ok_or_else(|| CompileError::UnsupportedConstruct {
                what: "continue outside a loop",
                loc: self.cursor.loc(),
            })?;
            self.emit_jump(*block, target);
            self.cursor.expect_punct(Punct::Semi)?;
            return Ok(());
        }
        if self.cursor.accept_keyword(Keyword::Return) {
            return self.parse_return(block);
        }
        if self.cursor.at_keyword(Keyword::Goto) {
            return Err(CompileError::UnsupportedConstruct {
                what: "goto",
                loc: self.cursor.loc(),
            });
        }
        // Expression statement.
        self.parse_expr(block)?;
        self.drain_side_effects(*block);
        self.cursor.expect_punct(Punct::Semi)?;
        Ok(())
    }

    /// `return [expr] ;` — `func_ret` copies the value into the return
    /// slot, `return` is the actual terminator (spec §4.C "Return").
    fn parse_return(&mut self, block: &mut BlockId) -> Result<()> {
        if !self.cursor.at_punct(Punct::Semi) {
            let val = self.parse_expr(block)?;
            let mut ret = Phase1Instr::new(Opcode::FuncRet);
            ret.src0 = Some(val);
            self.emit(*block, ret);
        }
        self.cursor.expect_punct(Punct::Semi)?;
        self.emit(*block, Phase1Instr::new(Opcode::Return));
        Ok(())
    }

    /// A declaration used as a statement: `type` `*`*ident`[n]`? (`=`
    /// expr)? (`,` ...)* `;`. Each comma is a sequence point, so queued
    /// post-increment/decrement side effects drain there too.
    fn parse_local_decl(&mut self, block: &mut BlockId) -> Result<()> {
        let ty = self
            .try_parse_type_specifier()?
            .expect("caller already confirmed a type specifier starts here");
        loop {
            let decl = self.parse_declarator()?;
            let (ptr_depth, array_size) = self.effective_shape(ty, &decl);
            let var = Variable::new_local(ty, decl.name, ptr_depth, array_size);
            let id = self.declare_var(decl.name, var, false)?;
            if self.cursor.accept_punct(Punct::Eq) {
                if array_size > 0 {
                    return Err(CompileError::UnsupportedConstruct {
                        what: "initializer for a local array",
                        loc: self.cursor.loc(),
                    });
                }
                let val = self.parse_expr(block)?;
                self.store(*block, Addressable::Var(id), val);
            }
            self.drain_side_effects(*block);
            if !self.cursor.accept_punct(Punct::Comma) {
                break;
            }
        }
        self.cursor.expect_punct(Punct::Semi)?;
        Ok(())
    }

    /// `if` `(` expr `)` stmt (`else` stmt)?
    fn parse_if(&mut self, block: &mut BlockId) -> Result<()> {
        self.cursor.expect_keyword(Keyword::If)?;
        self.cursor.expect_punct(Punct::LParen)?;
        let cond = self.parse_expr(block)?;
        self.cursor.expect_punct(Punct::RParen)?;
        self.enter_nesting()?;

        let then_block = self.new_block();
        let else_block = self.new_block();
        let join = self.new_block();
        self.emit_branch(*block, cond, then_block, else_block);

        let mut then_cur = then_block;
        self.parse_stmt(&mut then_cur)?;
        self.emit_jump(then_cur, join);

        let mut else_cur = else_block;
        if self.cursor.accept_keyword(Keyword::Else) {
            self.parse_stmt(&mut else_cur)?;
        }
        self.emit_jump(else_cur, join);

        self.exit_nesting();
        *block = join;
        Ok(())
    }

    /// `while` `(` expr `)` stmt
    fn parse_while(&mut self, block: &mut BlockId) -> Result<()> {
        self.cursor.expect_keyword(Keyword::While)?;
        self.cursor.expect_punct(Punct::LParen)?;
        self.enter_nesting()?;

        let cond_block = self.new_block();
        let body_block = self.new_block();
        let after_block = self.new_block();
        self.emit_jump(*block, cond_block);

        let mut cond_cur = cond_block;
        let cond = self.parse_expr(&mut cond_cur)?;
        self.cursor.expect_punct(Punct::RParen)?;
        self.emit_branch(cond_cur, cond, body_block, after_block);

        self.push_loop(Some(cond_block), after_block);
        let mut body_cur = body_block;
        self.parse_stmt(&mut body_cur)?;
        self.emit_jump(body_cur, cond_block);
        self.pop_loop();

        self.exit_nesting();
        *block = after_block;
        Ok(())
    }

    /// `do` stmt `while` `(` expr `)` `;`
    fn parse_do_while(&mut self, block: &mut BlockId) -> Result<()> {
        self.cursor.expect_keyword(Keyword::Do)?;
        self.enter_nesting()?;

        let body_block = self.new_block();
        let cond_block = self.new_block();
        let after_block = self.new_block();
        self.emit_jump(*block, body_block);

        self.push_loop(Some(cond_block), after_block);
        let mut body_cur = body_block;
        self.parse_stmt(&mut body_cur)?;
        self.emit_jump(body_cur, cond_block);
        self.pop_loop();

        self.cursor.expect_keyword(Keyword::While)?;
        self.cursor.expect_punct(Punct::LParen)?;
        let mut cond_cur = cond_block;
        let cond = self.parse_expr(&mut cond_cur)?;
        self.cursor.expect_punct(Punct::RParen)?;
        self.cursor.expect_punct(Punct::Semi)?;
        self.emit_branch(cond_cur, cond, body_block, after_block);

        self.exit_nesting();
        *block = after_block;
        Ok(())
    }

    /// `for` `(` init? `;` cond? `;` step? `)` stmt. The step clause is
    /// parsed here, ahead of the body, but emitted into a block that
    /// only runs after the body — textual order and execution order
    /// differ, same as any single-pass `for` lowering.
    fn parse_for(&mut self, block: &mut BlockId) -> Result<()> {
        self.cursor.expect_keyword(Keyword::For)?;
        self.cursor.expect_punct(Punct::LParen)?;
        self.enter_nesting()?;
        self.push_scope();

        if self.cursor.accept_punct(Punct::Semi) {
            // empty init clause
        } else if self.at_type_specifier_start() {
            self.parse_local_decl(block)?;
        } else {
            self.parse_expr(block)?;
            self.drain_side_effects(*block);
            self.cursor.expect_punct(Punct::Semi)?;
        }

        let cond_block = self.new_block();
        let body_block = self.new_block();
        let step_block = self.new_block();
        let after_block = self.new_block();
        self.emit_jump(*block, cond_block);

        let mut cond_cur = cond_block;
        let cond = if self.cursor.at_punct(Punct::Semi) {
            self.load_constant(cond_cur, 1)
        } else {
            self.parse_expr(&mut cond_cur)?
        };
        self.cursor.expect_punct(Punct::Semi)?;
        self.emit_branch(cond_cur, cond, body_block, after_block);

        let mut step_cur = step_block;
        if !self.cursor.at_punct(Punct::RParen) {
            self.parse_expr(&mut step_cur)?;
            self.drain_side_effects(step_cur);
        }
        self.cursor.expect_punct(Punct::RParen)?;
        self.emit_jump(step_cur, cond_block);

        self.push_loop(Some(step_block), after_block);
        let mut body_cur = body_block;
        self.parse_stmt(&mut body_cur)?;
        self.emit_jump(body_cur, step_block);
        self.pop_loop();

        self.pop_scope();
        self.exit_nesting();
        *block = after_block;
        Ok(())
    }

    /// `switch` `(` expr `)` `{` (`case` const-expr `:` | `default` `:`
    /// | stmt)* `}` — lowered as a chain of equality tests against the
    /// switch value rather than a jump table (spec §4.C "Switch"); `case`
    /// falls through to the next label exactly like C, since nothing
    /// inserts a jump between adjacent case bodies.
    fn parse_switch(&mut self, block: &mut BlockId) -> Result<()> {
        self.cursor.expect_keyword(Keyword::Switch)?;
        self.cursor.expect_punct(Punct::LParen)?;
        let switch_val = self.parse_expr(block)?;
        self.cursor.expect_punct(Punct::RParen)?;
        self.enter_nesting()?;

        let first_test = self.new_block();
        let after_block = self.new_block();
        self.emit_jump(*block, first_test);

        self.push_loop(None, after_block);
        self.func
            .as_mut()
            .expect("switch only inside a function body")
            .switch_stack
            .push(SwitchState {
                switch_val,
                test_block: first_test,
                after_block,
                default_block: None,
            });

        let mut body_cur = first_test;
        self.parse_block(&mut body_cur)?;

        let state = self
            .func
            .as_mut()
            .expect("switch only inside a function body")
            .switch_stack
            .pop()
            .expect("just pushed");
        let fallback = state.default_block.unwrap_or(state.after_block);
        self.emit_jump(state.test_block, fallback);
        self.pop_loop();

        self.exit_nesting();
        *block = after_block;
        Ok(())
    }

    /// `case` const-expr `:` — emits the next equality test in the
    /// enclosing switch's chain and starts this case's body block.
    fn parse_case(&mut self, block: &mut BlockId) -> Result<()> {
        let loc = self.cursor.loc();
        let value = self.parse_const_expr()?;
        self.cursor.expect_punct(Punct::Colon)?;

        let state = self
            .func
            .as_mut()
            .expect("case only inside a function body")
            .switch_stack
            .pop()
            .ok_or(CompileError::UnsupportedConstruct {
                what: "case outside a switch",
                loc,
            })?;

        let case_block = self.new_block();
        let next_test = self.new_block();
        let test_block = state.test_block;
        let switch_val = state.switch_val;
        let constant = self.load_constant(test_block, value);
        let cond = self.emit_binop(test_block, Opcode::Eq, switch_val, constant);
        self.emit_branch(test_block, cond, case_block, next_test);

        self.func
            .as_mut()
            .expect("case only inside a function body")
            .switch_stack
            .push(SwitchState {
                switch_val,
                test_block: next_test,
                after_block: state.after_block,
                default_block: state.default_block,
            });

        *block = case_block;
        Ok(())
    }

    /// `default` `:` — records the fallback target for the switch's
    /// final comparison without touching the test chain itself.
    fn parse_default(&mut self, block: &mut BlockId) -> Result<()> {
        let loc = self.cursor.loc();
        self.cursor.expect_punct(Punct::Colon)?;
        let default_block = self.new_block();

        let state = self
            .func
            .as_mut()
            .expect("default only inside a function body")
            .switch_stack
            .last_mut()
            .ok_or(CompileError::UnsupportedConstruct {
                what: "default outside a switch",
                loc,
            })?;
        state.default_block = Some(default_block);

        *block = default_block;
        Ok(())
    }
}
