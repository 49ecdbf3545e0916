//! Tokenization for PScript using logos.
//!
//! Keywords are case-insensitive. Comments (`// ...`, `{ ... }`,
//! `(* ... *)`) and whitespace are skipped. Identifier-like directives such
//! as `virtual` or `helper` are left as identifiers and recognized by the
//! parser in context.

use std::ops::Range;

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"\{[^}]*\}")]
#[logos(skip r"\(\*([^*]|\*+[^*)])*\*+\)")]
pub enum Token {
    // === Keywords ===
    #[token("program", ignore(ascii_case))]
    Program,
    #[token("unit", ignore(ascii_case))]
    Unit,
    #[token("interface", ignore(ascii_case))]
    Interface,
    #[token("implementation", ignore(ascii_case))]
    Implementation,
    #[token("uses", ignore(ascii_case))]
    Uses,
    #[token("var", ignore(ascii_case))]
    Var,
    #[token("const", ignore(ascii_case))]
    Const,
    #[token("type", ignore(ascii_case))]
    Type,
    #[token("class", ignore(ascii_case))]
    Class,
    #[token("record", ignore(ascii_case))]
    Record,
    #[token("begin", ignore(ascii_case))]
    Begin,
    #[token("end", ignore(ascii_case))]
    End,
    #[token("procedure", ignore(ascii_case))]
    Procedure,
    #[token("function", ignore(ascii_case))]
    Function,
    #[token("constructor", ignore(ascii_case))]
    Constructor,
    #[token("destructor", ignore(ascii_case))]
    Destructor,
    #[token("property", ignore(ascii_case))]
    Property,
    #[token("array", ignore(ascii_case))]
    Array,
    #[token("of", ignore(ascii_case))]
    Of,
    #[token("set", ignore(ascii_case))]
    Set,
    #[token("if", ignore(ascii_case))]
    If,
    #[token("then", ignore(ascii_case))]
    Then,
    #[token("else", ignore(ascii_case))]
    Else,
    #[token("while", ignore(ascii_case))]
    While,
    #[token("do", ignore(ascii_case))]
    Do,
    #[token("for", ignore(ascii_case))]
    For,
    #[token("to", ignore(ascii_case))]
    To,
    #[token("downto", ignore(ascii_case))]
    Downto,
    #[token("in", ignore(ascii_case))]
    In,
    #[token("repeat", ignore(ascii_case))]
    Repeat,
    #[token("until", ignore(ascii_case))]
    Until,
    #[token("case", ignore(ascii_case))]
    Case,
    #[token("try", ignore(ascii_case))]
    Try,
    #[token("except", ignore(ascii_case))]
    Except,
    #[token("finally", ignore(ascii_case))]
    Finally,
    #[token("raise", ignore(ascii_case))]
    Raise,
    #[token("not", ignore(ascii_case))]
    Not,
    #[token("and", ignore(ascii_case))]
    And,
    #[token("or", ignore(ascii_case))]
    Or,
    #[token("xor", ignore(ascii_case))]
    Xor,
    #[token("div", ignore(ascii_case))]
    Div,
    #[token("mod", ignore(ascii_case))]
    Mod,
    #[token("shl", ignore(ascii_case))]
    Shl,
    #[token("shr", ignore(ascii_case))]
    Shr,
    #[token("is", ignore(ascii_case))]
    Is,
    #[token("as", ignore(ascii_case))]
    As,
    #[token("nil", ignore(ascii_case))]
    Nil,
    #[token("true", ignore(ascii_case))]
    True,
    #[token("false", ignore(ascii_case))]
    False,
    #[token("inherited", ignore(ascii_case))]
    Inherited,

    // === Literals ===
    #[regex(r"[\p{L}_][\p{L}\p{N}_]*")]
    Ident,
    #[regex(r"[0-9]+")]
    #[regex(r"\$[0-9A-Fa-f]+")]
    Number,
    #[regex(r"'([^'\n]|'')*'")]
    #[regex(r#""([^"\n]|"")*""#)]
    String,
    #[regex(r"#[0-9]+")]
    #[regex(r"#\$[0-9A-Fa-f]+")]
    CharCode,

    // === Punctuation ===
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("..")]
    DotDot,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(":=")]
    Assign,
    #[token("=")]
    Eq,
    #[token("<>")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    Caret,
    #[token("@")]
    At,
}

impl Token {
    pub fn describe(&self) -> &'static str {
        match self {
            Token::Ident => "identifier",
            Token::Number => "number",
            Token::String | Token::CharCode => "string",
            Token::Semicolon => "';'",
            Token::Colon => "':'",
            Token::Comma => "','",
            Token::Dot => "'.'",
            Token::DotDot => "'..'",
            Token::LParen => "'('",
            Token::RParen => "')'",
            Token::LBracket => "'['",
            Token::RBracket => "']'",
            Token::Assign => "':='",
            Token::Eq => "'='",
            Token::End => "'end'",
            Token::Begin => "'begin'",
            Token::Then => "'then'",
            Token::Do => "'do'",
            Token::Of => "'of'",
            _ => "keyword",
        }
    }
}

/// A token with its byte range in the source.
#[derive(Clone, Debug, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub range: Range<usize>,
}

/// Split `source` into lexemes. Unrecognized bytes are returned separately
/// as error ranges and otherwise ignored.
pub fn tokenize(source: &str) -> (Vec<Lexeme>, Vec<Range<usize>>) {
    let mut lexemes = Vec::new();
    let mut errors = Vec::new();
    for (result, range) in Token::lexer(source).spanned() {
        match result {
            Ok(token) => lexemes.push(Lexeme { token, range }),
            Err(()) => errors.push(range),
        }
    }
    (lexemes, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).0.into_iter().map(|l| l.token).collect()
    }

    #[test]
    fn test_keywords_ignore_case() {
        assert_eq!(
            kinds("BEGIN End bEgIn"),
            vec![Token::Begin, Token::End, Token::Begin]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "x // line\n{ brace } (* paren\n comment *) y";
        assert_eq!(kinds(source), vec![Token::Ident, Token::Ident]);
    }

    #[test]
    fn test_range_is_not_a_float() {
        assert_eq!(
            kinds("1..10"),
            vec![Token::Number, Token::DotDot, Token::Number]
        );
    }

    #[test]
    fn test_string_with_escaped_quote() {
        let (lexemes, errors) = tokenize("'it''s'");
        assert!(errors.is_empty());
        assert_eq!(lexemes.len(), 1);
        assert_eq!(lexemes[0].token, Token::String);
        assert_eq!(lexemes[0].range, 0..7);
    }

    #[test]
    fn test_assignment_and_comparison() {
        assert_eq!(
            kinds("a := b <> c"),
            vec![
                Token::Ident,
                Token::Assign,
                Token::Ident,
                Token::NotEq,
                Token::Ident
            ]
        );
    }
}
