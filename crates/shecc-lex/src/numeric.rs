//! Numeric literal recognition (spec §4.A "Numeric recognition"):
//! decimal, hexadecimal (`0x`/`0X`), binary (`0b`/`0B`), and octal
//! (leading `0`, digits restricted to `0`-`7`).

use shecc_ir::{CompileError, Interner, Result, SourceLoc, Token, TokenKind, MAX_TOKEN_LEN};

use crate::cursor::Cursor;

pub fn lex_numeric(cursor: &mut Cursor, interner: &mut Interner, start: SourceLoc) -> Result<Token> {
    let mut text = String::new();
    let first = cursor.peek().unwrap();
    text.push(first);
    cursor.bump();

    if first == '0' {
        match cursor.peek() {
            Some('x') | Some('X') => {
                text.push(cursor.bump().unwrap());
                let mut any = false;
                while let Some(c) = cursor.peek() {
                    if c.is_ascii_hexdigit() {
                        text.push(c);
                        cursor.bump();
                        any = true;
                    } else {
                        break;
                    }
                }
                if !any {
                    return Err(CompileError::InvalidNumericDigit { loc: start });
                }
                return finish(text, start, interner);
            }
            Some('b') | Some('B') => {
                text.push(cursor.bump().unwrap());
                let mut any = false;
                while let Some(c) = cursor.peek() {
                    if c == '0' || c == '1' {
                        text.push(c);
                        cursor.bump();
                        any = true;
                    } else {
                        break;
                    }
                }
                if !any {
                    return Err(CompileError::InvalidNumericDigit { loc: start });
                }
                return finish(text, start, interner);
            }
            Some(c) if c.is_ascii_digit() => {
                // Octal: every subsequent digit must be 0-7.
                while let Some(c) = cursor.peek() {
                    if c.is_ascii_digit() {
                        if !('0'..='7').contains(&c) {
                            return Err(CompileError::InvalidNumericDigit { loc: start });
                        }
                        text.push(c);
                        cursor.bump();
                    } else {
                        break;
                    }
                }
                return finish(text, start, interner);
            }
            _ => return finish(text, start, interner),
        }
    }

    // Decimal: leading non-zero digit, consume all following digits.
    while let Some(c) = cursor.peek() {
        if c.is_ascii_digit() {
            text.push(c);
            cursor.bump();
        } else {
            break;
        }
    }
    finish(text, start, interner)
}

fn finish(text: String, start: SourceLoc, interner: &mut Interner) -> Result<Token> {
    if text.len() > MAX_TOKEN_LEN {
        return Err(CompileError::TokenTooLong { loc: start });
    }
    let sym = interner.intern(&text);
    Ok(Token::new(TokenKind::Numeric(sym), start))
}

/// Parse a previously-lexed numeric literal's text into its i32 value.
/// Used by the parser and the preprocessor's constant evaluator, both of
/// which need the decoded value rather than the literal text.
pub fn parse_numeric(text: &str) -> Option<i32> {
    if let Some(rest) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return i64::from_str_radix(rest, 16).ok().map(|v| v as i32);
    }
    if let Some(rest) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        return i64::from_str_radix(rest, 2).ok().map(|v| v as i32);
    }
    if text.len() > 1 && text.starts_with('0') {
        return i64::from_str_radix(text, 8).ok().map(|v| v as i32);
    }
    text.parse::<i64>().ok().map(|v| v as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_base() {
        assert_eq!(parse_numeric("0x1F"), Some(31));
        assert_eq!(parse_numeric("0b101"), Some(5));
        assert_eq!(parse_numeric("017"), Some(15));
        assert_eq!(parse_numeric("42"), Some(42));
    }
}
