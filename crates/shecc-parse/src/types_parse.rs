//! Type specifiers and declarators (spec §4.C "Grammar (subset)"):
//! `typedef`/`struct`/`enum` at translation-unit scope, and the
//! pointer-star / array-bracket declarator grammar shared by variable
//! declarations, parameters, and struct fields.

use shecc_ir::{BaseKind, CompileError, Field, Keyword, Punct, Result, Symbol, Type, TypeId};

use crate::Parser;

/// The three built-in scalar types, registered once before parsing
/// begins so every later lookup of `void`/`int`/`char` hits the table.
#[derive(Clone, Copy)]
pub struct BaseTypes {
    pub void: TypeId,
    pub int: TypeId,
    pub char: TypeId,
}

pub fn register_base_types(ctx: &mut shecc_ir::Context) -> BaseTypes {
    let void_name = ctx.intern("void");
    let int_name = ctx.intern("int");
    let char_name = ctx.intern("char");
    let void = ctx.types.insert(Type::scalar(void_name, BaseKind::Void, 0));
    let int = ctx.types.insert(Type::scalar(int_name, BaseKind::Int, 4));
    let char = ctx.types.insert(Type::scalar(char_name, BaseKind::Char, 1));
    BaseTypes { void, int, char }
}

#[derive(Clone)]
pub struct Declarator {
    pub name: Symbol,
    pub ptr_depth: u8,
    pub array_size: i32,
}

impl<'a, 'b> Parser<'a, 'b> {
    /// Parses a type specifier (`void`, `int`, `char`, a typedef name,
    /// or `struct IDENT [{ fields }]`). Returns `None` if the current
    /// token cannot start one, so callers can distinguish "no type
    /// here" from a genuine error.
    pub(crate) fn try_parse_type_specifier(&mut self) -> Result<Option<TypeId>> {
        if self.cursor.accept_keyword(Keyword::Void) {
            return Ok(Some(self.base_types.void));
        }
        if self.cursor.accept_keyword(Keyword::Int) {
            return Ok(Some(self.base_types.int));
        }
        if self.cursor.accept_keyword(Keyword::Char) {
            return Ok(Some(self.base_types.char));
        }
        if self.cursor.accept_keyword(Keyword::Const) {
            // `const` is recognized but unsupported (Open Question
            // resolution in SPEC_FULL.md): a `const`-qualified
            // declaration is rejected outright rather than silently
            // accepted and ignored.
            return Err(CompileError::UnsupportedConstruct {
                what: "const-qualified declaration",
                loc: self.cursor.loc(),
            });
        }
        if self.cursor.accept_keyword(Keyword::Union) {
            return Err(CompileError::UnsupportedConstruct {
                what: "union",
                loc: self.cursor.loc(),
            });
        }
        if self.cursor.accept_keyword(Keyword::Struct) {
            return self.parse_struct_specifier().map(Some);
        }
        if self.cursor.accept_keyword(Keyword::Enum) {
            return self.parse_enum_specifier().map(Some);
        }
        if let Some(sym) = self.cursor.peek_identifier() {
            if let Some(ty) = self.ctx.types.lookup(sym) {
                self.cursor.bump();
                return Ok(Some(ty));
            }
        }
        Ok(None)
    }

    fn parse_struct_specifier(&mut self) -> Result<TypeId> {
        let name = self.cursor.expect_identifier()?;
        if self.cursor.accept_punct(Punct::LBrace) {
            let (fields, size) = self.parse_field_list()?;
            self.cursor.expect_punct(Punct::RBrace)?;
            let existing = self.ctx.types.lookup(name);
            if let Some(id) = existing {
                if self.ctx.types.get(id).published {
                    return Err(CompileError::Redeclaration {
                        name: self.ctx.interner.resolve(name).to_string(),
                        loc: self.cursor.loc(),
                    });
                }
                self.ctx.types.get_mut(id).publish_struct(fields, size);
                return Ok(id);
            }
            let mut ty = Type::forward_struct(name);
            ty.publish_struct(fields, size);
            return Ok(self.ctx.types.insert(ty));
        }
        // Plain `struct IDENT` reference: look it up, or register an
        // (as-yet-unpublished) forward declaration.
        if let Some(id) = self.ctx.types.lookup(name) {
            return Ok(id);
        }
        Ok(self.ctx.types.insert(Type::forward_struct(name)))
    }

    fn parse_field_list(&mut self) -> Result<(Vec<Field>, i32)> {
        let mut fields = Vec::new();
        let mut offset = 0;
        while !self.cursor.at_punct(Punct::RBrace) {
            let ty = self
                .try_parse_type_specifier()?
                .ok_or_else(|| self.cursor.unexpected())?;
            loop {
                let decl = self.parse_declarator()?;
                let size = if decl.ptr_depth > 0 {
                    4
                } else if decl.array_size > 0 {
                    decl.array_size * self.ctx.types.get(ty).size
                } else {
                    self.ctx.types.get(ty).size
                };
                fields.push(Field {
                    type_name: self.ctx.types.get(ty).name,
                    var_name: decl.name,
                    ptr_depth: decl.ptr_depth,
                    is_func: false,
                    array_size: decl.array_size,
                    offset,
                });
                offset += shecc_ir::align4(size);
                if !self.cursor.accept_punct(Punct::Comma) {
                    break;
                }
            }
            self.cursor.expect_punct(Punct::Semi)?;
        }
        Ok((fields, offset))
    }

    fn parse_enum_specifier(&mut self) -> Result<TypeId> {
        // Anonymous `enum { A, B = 3, C }`: each member becomes a
        // process-wide compile-time integer constant; the enum itself
        // reuses the `int` type id, matching the subset's "enum is an
        // int" rule.
        self.cursor.expect_punct(Punct::LBrace)?;
        let mut next = 0i32;
        while !self.cursor.at_punct(Punct::RBrace) {
            let name = self.cursor.expect_identifier()?;
            let value = if self.cursor.accept_punct(Punct::Eq) {
                self.parse_const_expr()?
            } else {
                next
            };
            self.enum_constants.insert(name, value);
            next = value + 1;
            if !self.cursor.accept_punct(Punct::Comma) {
                break;
            }
        }
        self.cursor.expect_punct(Punct::RBrace)?;
        Ok(self.base_types.int)
    }

    /// `typedef` <type-specifier> <declarator> `;` — the declared name
    /// becomes usable as a type specifier from here on. The teacher's
    /// subset flattens a typedef to a clone of its target type rather
    /// than an indirection, since a struct's layout never changes after
    /// publication.
    pub(crate) fn parse_typedef(&mut self) -> Result<()> {
        let ty = self
            .try_parse_type_specifier()?
            .ok_or_else(|| self.cursor.unexpected())?;
        let decl = self.parse_declarator()?;
        // `ptr_depth`/`array_size` on a typedef'd declarator describe the
        // aliased type's own shape (`typedef int *IntPtr`); that shape
        // is recorded on each `Variable`/`Field` that uses the typedef
        // name, not on the `Type` entry itself, so a plain clone under
        // the new name is enough regardless of declarator shape.
        let mut cloned = self.ctx.types.get(ty).clone();
        cloned.name = decl.name;
        self.typedef_shapes.insert(decl.name, (decl.ptr_depth, decl.array_size));
        self.ctx.types.insert(cloned);
        self.cursor.expect_punct(Punct::Semi)?;
        Ok(())
    }

    /// Combine a declarator's own pointer-stars/array-brackets with
    /// whatever shape its type name already carries (relevant only when
    /// that name came from a `typedef` to a pointer or array type).
    pub(crate) fn effective_shape(&self, ty: TypeId, decl: &Declarator) -> (u8, i32) {
        let type_name = self.ctx.types.get(ty).name;
        let (base_ptr, base_arr) = self.typedef_shapes.get(&type_name).copied().unwrap_or((0, 0));
        let ptr_depth = decl.ptr_depth + base_ptr;
        let array_size = if decl.array_size != 0 { decl.array_size } else { base_arr };
        (ptr_depth, array_size)
    }

    /// `*` `*`... IDENT (`[` [const-expr] `]`)?
    pub(crate) fn parse_declarator(&mut self) -> Result<Declarator> {
        let mut ptr_depth = 0u8;
        while self.cursor.accept_punct(Punct::Star) {
            ptr_depth += 1;
        }
        let name = self.cursor.expect_identifier()?;
        let mut array_size = 0i32;
        if self.cursor.accept_punct(Punct::LBracket) {
            if !self.cursor.at_punct(Punct::RBracket) {
                array_size = self.parse_const_expr()?;
            }
            self.cursor.expect_punct(Punct::RBracket)?;
        }
        Ok(Declarator {
            name,
            ptr_depth,
            array_size,
        })
    }
}
