//! Lexer: byte stream to a located, terminator-terminated token stream
//! (spec §4.A). Whitespace, tabs, newlines, and backslashes are emitted
//! as explicit tokens so the preprocessor can observe line structure.

mod cursor;
mod numeric;
mod string_lit;

use shecc_ir::{
    CompileError, Interner, Keyword, Punct, Result, SourceLoc, Symbol, Token, TokenKind,
    MAX_TOKEN_LEN,
};
use tracing::trace;

use crate::cursor::Cursor;

pub use numeric::parse_numeric;
pub use string_lit::{decode_char_escape, decode_escapes};

/// Tokenize an entire source buffer into a flat `Vec<Token>` terminated
/// by exactly one EOF token. The token stream is materialized eagerly
/// (spec §9 "Generators"): downstream phases consume it as an ordered
/// sequence rather than pulling from an iterator.
pub fn lex(source: &str, file: Symbol, interner: &mut Interner) -> Result<Vec<Token>> {
    let mut cursor = Cursor::new(source, file);
    let mut tokens = Vec::new();

    loop {
        let tok = next_token(&mut cursor, interner)?;
        let is_eof = tok.is_eof();
        tokens.push(tok);
        if is_eof {
            break;
        }
    }

    Ok(tokens)
}

fn next_token(cursor: &mut Cursor, interner: &mut Interner) -> Result<Token> {
    let start_loc = cursor.loc();

    let Some(ch) = cursor.peek() else {
        return Ok(Token::new(TokenKind::Eof, start_loc));
    };

    match ch {
        ' ' => {
            cursor.bump();
            Ok(Token::new(TokenKind::Whitespace, start_loc))
        }
        '\t' => {
            cursor.bump();
            Ok(Token::new(TokenKind::Tab, start_loc))
        }
        '\n' => {
            cursor.bump_newline();
            Ok(Token::new(TokenKind::Newline, start_loc))
        }
        '\\' => {
            cursor.bump();
            Ok(Token::new(TokenKind::Backslash, start_loc))
        }
        '/' if cursor.peek_at(1) == Some('/') => {
            while let Some(c) = cursor.peek() {
                if c == '\n' {
                    break;
                }
                cursor.bump();
            }
            Ok(Token::new(TokenKind::Whitespace, start_loc))
        }
        '/' if cursor.peek_at(1) == Some('*') => {
            cursor.bump();
            cursor.bump();
            loop {
                match cursor.peek() {
                    None => {
                        return Err(CompileError::UnterminatedComment { loc: start_loc });
                    }
                    Some('*') if cursor.peek_at(1) == Some('/') => {
                        cursor.bump();
                        cursor.bump();
                        break;
                    }
                    Some('\n') => cursor.bump_newline(),
                    Some(_) => {
                        cursor.bump();
                    }
                }
            }
            Ok(Token::new(TokenKind::Whitespace, start_loc))
        }
        '#' if cursor.at_column_one() => {
            cursor.bump();
            lex_directive(cursor, interner, start_loc)
        }
        '"' => string_lit::lex_string(cursor, interner, start_loc),
        '\'' => string_lit::lex_char(cursor, interner, start_loc),
        c if c.is_ascii_digit() => numeric::lex_numeric(cursor, interner, start_loc),
        c if c.is_ascii_alphabetic() || c == '_' => lex_identifier(cursor, interner, start_loc),
        _ => lex_punct(cursor, start_loc),
    }
}

fn lex_identifier(cursor: &mut Cursor, interner: &mut Interner, start: SourceLoc) -> Result<Token> {
    let mut text = String::new();
    while let Some(c) = cursor.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            text.push(c);
            cursor.bump();
        } else {
            break;
        }
    }
    if text.len() > MAX_TOKEN_LEN {
        return Err(CompileError::TokenTooLong { loc: start });
    }
    if let Some(kw) = Keyword::lookup(&text) {
        trace!(keyword = %text, "lexed keyword");
        return Ok(Token::new(TokenKind::Keyword(kw), start));
    }
    let sym = interner.intern(&text);
    Ok(Token::new(TokenKind::Identifier(sym), start))
}

fn lex_directive(cursor: &mut Cursor, interner: &mut Interner, start: SourceLoc) -> Result<Token> {
    // Skip spaces/tabs between '#' and the directive name, per common
    // preprocessor grammar (`#   include`).
    while matches!(cursor.peek(), Some(' ') | Some('\t')) {
        cursor.bump();
    }
    let mut name = String::new();
    while let Some(c) = cursor.peek() {
        if c.is_ascii_alphabetic() {
            name.push(c);
            cursor.bump();
        } else {
            break;
        }
    }
    use shecc_ir::Directive::*;
    let directive = match name.as_str() {
        "include" => Include,
        "define" => Define,
        "undef" => Undef,
        "if" => If,
        "ifdef" => Ifdef,
        "ifndef" => Ifndef,
        "elif" => Elif,
        "else" => Else,
        "endif" => Endif,
        "error" => Error,
        "pragma" => Pragma,
        _ => {
            return Err(CompileError::UnexpectedToken {
                found: format!("#{name}"),
                loc: start,
            });
        }
    };
    let _ = interner; // reserved for directives that intern argument text later
    Ok(Token::new(TokenKind::Directive(directive), start))
}

fn lex_punct(cursor: &mut Cursor, start: SourceLoc) -> Result<Token> {
    let ch = cursor.peek().unwrap();
    cursor.bump();
    let two = |cursor: &mut Cursor| cursor.peek();

    macro_rules! maybe_two {
        ($next:expr, $two_punct:expr, $one_punct:expr) => {{
            if two(cursor) == Some($next) {
                cursor.bump();
                $two_punct
            } else {
                $one_punct
            }
        }};
    }

    let p = match ch {
        '(' => Punct::LParen,
        ')' => Punct::RParen,
        '{' => Punct::LBrace,
        '}' => Punct::RBrace,
        '[' => Punct::LBracket,
        ']' => Punct::RBracket,
        ';' => Punct::Semi,
        ',' => Punct::Comma,
        '~' => Punct::Tilde,
        '?' => Punct::Question,
        ':' => Punct::Colon,
        '.' => {
            if two(cursor) == Some('.') && cursor.peek_at(1) == Some('.') {
                cursor.bump();
                cursor.bump();
                Punct::Ellipsis
            } else {
                Punct::Dot
            }
        }
        '^' => Punct::Caret,
        '%' => Punct::Percent,
        '*' => Punct::Star,
        '/' => Punct::Slash,
        '&' => {
            if two(cursor) == Some('&') {
                cursor.bump();
                Punct::AmpAmp
            } else {
                maybe_two!('=', Punct::AmpEq, Punct::Amp)
            }
        }
        '|' => {
            if two(cursor) == Some('|') {
                cursor.bump();
                Punct::PipePipe
            } else {
                maybe_two!('=', Punct::PipeEq, Punct::Pipe)
            }
        }
        '!' => maybe_two!('=', Punct::BangEq, Punct::Bang),
        '=' => maybe_two!('=', Punct::EqEq, Punct::Eq),
        '+' => {
            if two(cursor) == Some('+') {
                cursor.bump();
                Punct::PlusPlus
            } else {
                maybe_two!('=', Punct::PlusEq, Punct::Plus)
            }
        }
        '-' => {
            if two(cursor) == Some('-') {
                cursor.bump();
                Punct::MinusMinus
            } else if two(cursor) == Some('>') {
                cursor.bump();
                Punct::Arrow
            } else {
                maybe_two!('=', Punct::MinusEq, Punct::Minus)
            }
        }
        '<' => {
            if two(cursor) == Some('<') {
                cursor.bump();
                Punct::LtLt
            } else {
                maybe_two!('=', Punct::LtEq, Punct::Lt)
            }
        }
        '>' => {
            if two(cursor) == Some('>') {
                cursor.bump();
                Punct::GtGt
            } else {
                maybe_two!('=', Punct::GtEq, Punct::Gt)
            }
        }
        other => {
            return Err(CompileError::UnrecognizedChar {
                ch: other,
                loc: start,
            });
        }
    };
    Ok(Token::new(TokenKind::Punct(p), start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_str(src: &str) -> (Vec<Token>, Interner) {
        let mut interner = Interner::new();
        let file = interner.intern("test.c");
        let tokens = lex(src, file, &mut interner).expect("lex should succeed");
        (tokens, interner)
    }

    #[test]
    fn lexes_keyword_and_identifier() {
        let (tokens, interner) = lex_str("int main");
        let kinds: Vec<_> = tokens
            .iter()
            .filter(|t| !t.is_trivia() && !matches!(t.kind, TokenKind::Whitespace))
            .collect();
        assert!(matches!(kinds[0].kind, TokenKind::Keyword(Keyword::Int)));
        match &kinds[1].kind {
            TokenKind::Identifier(sym) => assert_eq!(interner.resolve(*sym), "main"),
            other => panic!("expected identifier, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unrecognized_character() {
        let mut interner = Interner::new();
        let file = interner.intern("test.c");
        let err = lex("int x = `;", file, &mut interner).unwrap_err();
        assert!(matches!(err, CompileError::UnrecognizedChar { ch: '`', .. }));
    }

    #[test]
    fn unterminated_block_comment_errors() {
        let mut interner = Interner::new();
        let file = interner.intern("test.c");
        let err = lex("/* never closed", file, &mut interner).unwrap_err();
        assert!(matches!(err, CompileError::UnterminatedComment { .. }));
    }

    #[test]
    fn directive_at_column_one_is_recognized() {
        let (tokens, _) = lex_str("#include \"a.h\"\n");
        assert!(matches!(
            tokens[0].kind,
            TokenKind::Directive(shecc_ir::Directive::Include)
        ));
    }

    #[test]
    fn hash_not_at_column_one_is_lex_error() {
        let mut interner = Interner::new();
        let file = interner.intern("test.c");
        let err = lex(" #include \"a.h\"\n", file, &mut interner).unwrap_err();
        assert!(matches!(err, CompileError::UnrecognizedChar { ch: '#', .. }));
    }
}
