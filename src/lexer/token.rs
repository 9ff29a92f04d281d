use std::fmt;

use phf::phf_map;

pub static KEYWORDS: phf::Map<&str, Keyword> = phf_map! {
    "auto" => Keyword::Auto,
    "break" => Keyword::Break,
    "case" => Keyword::Case,
    "char" => Keyword::Char,
    "const" => Keyword::Const,
    "continue" => Keyword::Continue,
    "default" => Keyword::Default,
    "defer" => Keyword::Defer,
    "do" => Keyword::Do,
    "double" => Keyword::Double,
    "else" => Keyword::Else,
    "enum" => Keyword::Enum,
    "extern" => Keyword::Extern,
    "float" => Keyword::Float,
    "for" => Keyword::For,
    "if" => Keyword::If,
    "import" => Keyword::Import,
    "inline" => Keyword::Inline,
    "int" => Keyword::Int,
    "long" => Keyword::Long,
    "pub" => Keyword::Pub,
    "register" => Keyword::Register,
    "restrict" => Keyword::Restrict,
    "return" => Keyword::Return,
    "short" => Keyword::Short,
    "signed" => Keyword::Signed,
    "sizeof" => Keyword::Sizeof,
    "static" => Keyword::Static,
    "struct" => Keyword::Struct,
    "switch" => Keyword::Switch,
    "typedef" => Keyword::Typedef,
    "union" => Keyword::Union,
    "unsigned" => Keyword::Unsigned,
    "void" => Keyword::Void,
    "volatile" => Keyword::Volatile,
    "while" => Keyword::While,
};

pub static THREE_SYMBOLS_TOKENS: phf::Map<&str, Symbol> = phf_map! {
    "..." => Symbol::Ellipsis,
    "<<=" => Symbol::ShlAssign,
    ">>=" => Symbol::ShrAssign,
};

pub static TWO_SYMBOLS_TOKENS: phf::Map<&str, Symbol> = phf_map! {
    "->" => Symbol::Arrow,
    "++" => Symbol::PlusPlus,
    "--" => Symbol::MinusMinus,
    "<<" => Symbol::Shl,
    ">>" => Symbol::Shr,
    "<=" => Symbol::Le,
    ">=" => Symbol::Ge,
    "==" => Symbol::EqEq,
    "!=" => Symbol::NotEq,
    "&&" => Symbol::AndAnd,
    "||" => Symbol::OrOr,
    "+=" => Symbol::PlusAssign,
    "-=" => Symbol::MinusAssign,
    "*=" => Symbol::StarAssign,
    "/=" => Symbol::SlashAssign,
    "%=" => Symbol::PercentAssign,
    "&=" => Symbol::AmpAssign,
    "^=" => Symbol::CaretAssign,
    "|=" => Symbol::PipeAssign,
};

pub static ONE_SYMBOL_TOKENS: phf::Map<char, Symbol> = phf_map! {
    '+' => Symbol::Plus,
    '-' => Symbol::Minus,
    '*' => Symbol::Star,
    '/' => Symbol::Slash,
    '%' => Symbol::Percent,
    '<' => Symbol::Lt,
    '>' => Symbol::Gt,
    '=' => Symbol::Assign,
    '!' => Symbol::Bang,
    '~' => Symbol::Tilde,
    '&' => Symbol::Amp,
    '|' => Symbol::Pipe,
    '^' => Symbol::Caret,
    '?' => Symbol::Question,
    ':' => Symbol::Colon,
    ';' => Symbol::Semicolon,
    ',' => Symbol::Comma,
    '.' => Symbol::Dot,
    '(' => Symbol::LParen,
    ')' => Symbol::RParen,
    '[' => Symbol::LBracket,
    ']' => Symbol::RBracket,
    '{' => Symbol::LBrace,
    '}' => Symbol::RBrace,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
    Auto,
    Break,
    Case,
    Char,
    Const,
    Continue,
    Default,
    Defer,
    Do,
    Double,
    Else,
    Enum,
    Extern,
    Float,
    For,
    If,
    Import,
    Inline,
    Int,
    Long,
    Pub,
    Register,
    Restrict,
    Return,
    Short,
    Signed,
    Sizeof,
    Static,
    Struct,
    Switch,
    Typedef,
    Union,
    Unsigned,
    Void,
    Volatile,
    While,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Auto => "auto",
            Keyword::Break => "break",
            Keyword::Case => "case",
            Keyword::Char => "char",
            Keyword::Const => "const",
            Keyword::Continue => "continue",
            Keyword::Default => "default",
            Keyword::Defer => "defer",
            Keyword::Do => "do",
            Keyword::Double => "double",
            Keyword::Else => "else",
            Keyword::Enum => "enum",
            Keyword::Extern => "extern",
            Keyword::Float => "float",
            Keyword::For => "for",
            Keyword::If => "if",
            Keyword::Import => "import",
            Keyword::Inline => "inline",
            Keyword::Int => "int",
            Keyword::Long => "long",
            Keyword::Pub => "pub",
            Keyword::Register => "register",
            Keyword::Restrict => "restrict",
            Keyword::Return => "return",
            Keyword::Short => "short",
            Keyword::Signed => "signed",
            Keyword::Sizeof => "sizeof",
            Keyword::Static => "static",
            Keyword::Struct => "struct",
            Keyword::Switch => "switch",
            Keyword::Typedef => "typedef",
            Keyword::Union => "union",
            Keyword::Unsigned => "unsigned",
            Keyword::Void => "void",
            Keyword::Volatile => "volatile",
            Keyword::While => "while",
        }
    }

    /// Builtin type specifiers: each of these names (part of) a base type.
    pub fn is_base_type(&self) -> bool {
        matches!(
            self,
            Keyword::Void
                | Keyword::Char
                | Keyword::Short
                | Keyword::Int
                | Keyword::Long
                | Keyword::Float
                | Keyword::Double
                | Keyword::Signed
                | Keyword::Unsigned
        )
    }

    /// Storage classes and qualifiers that may precede or decorate a type.
    pub fn is_type_modifier(&self) -> bool {
        matches!(
            self,
            Keyword::Const
                | Keyword::Volatile
                | Keyword::Static
                | Keyword::Extern
                | Keyword::Inline
                | Keyword::Register
                | Keyword::Auto
                | Keyword::Restrict
        )
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Keyword::Struct | Keyword::Union | Keyword::Enum)
    }

    /// Whether a type can start with this keyword.
    pub fn starts_type(&self) -> bool {
        self.is_base_type() || self.is_type_modifier() || self.is_record()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    Ellipsis,
    ShlAssign,
    ShrAssign,
    Arrow,
    PlusPlus,
    MinusMinus,
    Shl,
    Shr,
    Le,
    Ge,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    AmpAssign,
    CaretAssign,
    PipeAssign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Gt,
    Assign,
    Bang,
    Tilde,
    Amp,
    Pipe,
    Caret,
    Question,
    Colon,
    Semicolon,
    Comma,
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
}

impl Symbol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Symbol::Ellipsis => "...",
            Symbol::ShlAssign => "<<=",
            Symbol::ShrAssign => ">>=",
            Symbol::Arrow => "->",
            Symbol::PlusPlus => "++",
            Symbol::MinusMinus => "--",
            Symbol::Shl => "<<",
            Symbol::Shr => ">>",
            Symbol::Le => "<=",
            Symbol::Ge => ">=",
            Symbol::EqEq => "==",
            Symbol::NotEq => "!=",
            Symbol::AndAnd => "&&",
            Symbol::OrOr => "||",
            Symbol::PlusAssign => "+=",
            Symbol::MinusAssign => "-=",
            Symbol::StarAssign => "*=",
            Symbol::SlashAssign => "/=",
            Symbol::PercentAssign => "%=",
            Symbol::AmpAssign => "&=",
            Symbol::CaretAssign => "^=",
            Symbol::PipeAssign => "|=",
            Symbol::Plus => "+",
            Symbol::Minus => "-",
            Symbol::Star => "*",
            Symbol::Slash => "/",
            Symbol::Percent => "%",
            Symbol::Lt => "<",
            Symbol::Gt => ">",
            Symbol::Assign => "=",
            Symbol::Bang => "!",
            Symbol::Tilde => "~",
            Symbol::Amp => "&",
            Symbol::Pipe => "|",
            Symbol::Caret => "^",
            Symbol::Question => "?",
            Symbol::Colon => ":",
            Symbol::Semicolon => ";",
            Symbol::Comma => ",",
            Symbol::Dot => ".",
            Symbol::LParen => "(",
            Symbol::RParen => ")",
            Symbol::LBracket => "[",
            Symbol::RBracket => "]",
            Symbol::LBrace => "{",
            Symbol::RBrace => "}",
        }
    }
}

/// 1-based line and column of a token's first character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Keyword(Keyword),
    Symbol(Symbol),
    Word(String),
    /// Literal text, suffixes included.
    Number(String),
    /// Contents between the quotes, escapes kept verbatim.
    String(String),
    Char(String),
    Comment(String),
    /// A whole `#...` line, verbatim.
    Macro(String),
    Error(String),
    Eof,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Position) -> Self {
        Self { kind, pos }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    pub fn is_symbol(&self, symbol: Symbol) -> bool {
        self.kind == TokenKind::Symbol(symbol)
    }

    pub fn word(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Word(w) => Some(w),
            _ => None,
        }
    }

    /// How the token reads in a diagnostic.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Keyword(k) => format!("keyword `{}`", k.as_str()),
            TokenKind::Symbol(s) => format!("`{}`", s.as_str()),
            TokenKind::Word(w) => format!("word `{}`", w),
            TokenKind::Number(n) => format!("number `{}`", n),
            TokenKind::String(_) => "string literal".to_string(),
            TokenKind::Char(_) => "char literal".to_string(),
            TokenKind::Comment(_) => "comment".to_string(),
            TokenKind::Macro(m) => format!("macro line `{}`", m),
            TokenKind::Error(e) => format!("invalid input ({})", e),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Keyword(k) => write!(f, "{}", k.as_str()),
            TokenKind::Symbol(s) => write!(f, "{}", s.as_str()),
            TokenKind::Word(s) | TokenKind::Number(s) | TokenKind::Macro(s) => write!(f, "{}", s),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Char(s) => write!(f, "'{}'", s),
            TokenKind::Comment(s) => write!(f, "/*{}*/", s),
            TokenKind::Error(e) => write!(f, "<error: {}>", e),
            TokenKind::Eof => Ok(()),
        }
    }
}
