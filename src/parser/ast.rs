use std::{path::PathBuf, rc::Rc};

use crate::lexer::{Keyword, Position, Symbol};

/// One parsed file or merged package.
#[derive(Clone, Debug, PartialEq)]
pub struct Module {
    pub name: String,
    pub path: PathBuf,
    pub elements: Vec<Element>,
    /// Type names the module itself declares, in declaration order.
    pub type_names: Vec<String>,
}

impl Module {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            elements: vec![],
            type_names: vec![],
        }
    }

    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.elements.iter().filter_map(|e| match e {
            Element::Import(i) => Some(i),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    Import(Import),
    /// `#include <header>` produced by header inference.
    Include(String),
    /// A preprocessor line passed through verbatim.
    Macro(String),
    /// `#type NAME`
    TypeDirective(String),
    /// `#link NAME`
    Link(String),
    Typedef(Typedef),
    StructForward(StructForward),
    StructDef(StructDef),
    EnumDef(EnumDef),
    Function(Function),
    Variable(Declaration),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Import {
    pub path: String,
    pub pos: Position,
    /// Filled in by the resolver.
    pub module: Option<Rc<Module>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Typedef {
    pub public: bool,
    pub ty: Type,
    pub form: Form,
}

impl Typedef {
    pub fn name(&self) -> Option<&str> {
        self.form.name()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Struct,
    Union,
    Enum,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Struct => "struct",
            RecordKind::Union => "union",
            RecordKind::Enum => "enum",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructForward {
    pub kind: RecordKind,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructDef {
    pub public: bool,
    pub kind: RecordKind,
    pub name: String,
    pub fields: Vec<Declaration>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumDef {
    pub public: bool,
    pub name: String,
    pub variants: Vec<Enumerator>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enumerator {
    pub name: String,
    pub value: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub public: bool,
    pub ty: Type,
    pub form: Form,
    /// `None` for a prototype.
    pub body: Option<Vec<Stmt>>,
}

impl Function {
    pub fn name(&self) -> Option<&str> {
        self.form.name()
    }

    pub fn returns_void(&self) -> bool {
        self.form.pointers.is_empty()
            && self
                .ty
                .parts
                .iter()
                .filter(|p| !matches!(p, TypePart::Keyword(k) if k.is_type_modifier()))
                .eq([&TypePart::Keyword(Keyword::Void)])
    }

    pub fn forward(&self) -> Function {
        Function {
            body: None,
            ..self.clone()
        }
    }
}

/// `type form [= init], form [= init] ...`
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub ty: Type,
    pub declarators: Vec<Declarator>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Declarator {
    pub form: Form,
    pub init: Option<Expr>,
}

/// The base type: keywords, a type name and/or a record, in source order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Type {
    pub parts: Vec<TypePart>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypePart {
    Keyword(Keyword),
    Name(String),
    Record(Record),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub kind: RecordKind,
    pub name: Option<String>,
    pub body: Option<RecordBody>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RecordBody {
    Fields(Vec<Declaration>),
    Enumerators(Vec<Enumerator>),
}

/// A declarator: a (possibly absent) name with its pointer, array and
/// parameter-list modifiers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Form {
    pub pointers: Vec<Pointer>,
    pub core: FormCore,
    pub modifiers: Vec<Modifier>,
}

impl Form {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            core: FormCore::Name(name.into()),
            ..Default::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.core {
            FormCore::Name(n) => Some(n),
            FormCore::Nested(f) => f.name(),
            FormCore::Abstract => None,
        }
    }

    /// A plain name whose last modifier is a parameter list. `(*fp)(int)` is
    /// a variable, not a function.
    pub fn is_function(&self) -> bool {
        matches!(self.core, FormCore::Name(_)) && matches!(self.modifiers.last(), Some(Modifier::Params(_)))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum FormCore {
    Name(String),
    Nested(Box<Form>),
    #[default]
    Abstract,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pointer {
    pub qualifiers: Vec<Keyword>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Modifier {
    Array(Option<Expr>),
    Params(Params),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params {
    pub params: Vec<Param>,
    pub variadic: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub ty: Type,
    pub form: Form,
}

/// The operand of a cast or `sizeof`.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeName {
    pub ty: Type,
    pub form: Form,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Option<ForInit>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    Switch {
        value: Expr,
        cases: Vec<Case>,
    },
    Return(Option<Expr>),
    Defer(Expr),
    Declaration(Declaration),
    Expr(Expr),
    Break,
    Continue,
    Empty,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ForInit {
    Declaration(Declaration),
    Expr(Expr),
}

/// `case label:` or, with no label, `default:`.
#[derive(Clone, Debug, PartialEq)]
pub struct Case {
    pub label: Option<Expr>,
    pub body: Vec<Stmt>,
}

pub const ASSIGN_STRENGTH: u8 = 1;
pub const TERNARY_STRENGTH: u8 = 2;
pub const UNARY_STRENGTH: u8 = 13;
pub const MEMBER_STRENGTH: u8 = 14;
pub const ATOM_STRENGTH: u8 = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    ShlAssign,
    ShrAssign,
    AndAssign,
    XorAssign,
    OrAssign,
    LogicalOr,
    LogicalAnd,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Member,
    PtrMember,
}

impl BinaryOp {
    pub fn from_symbol(symbol: Symbol) -> Option<Self> {
        let op = match symbol {
            Symbol::Assign => BinaryOp::Assign,
            Symbol::PlusAssign => BinaryOp::AddAssign,
            Symbol::MinusAssign => BinaryOp::SubAssign,
            Symbol::StarAssign => BinaryOp::MulAssign,
            Symbol::SlashAssign => BinaryOp::DivAssign,
            Symbol::PercentAssign => BinaryOp::RemAssign,
            Symbol::ShlAssign => BinaryOp::ShlAssign,
            Symbol::ShrAssign => BinaryOp::ShrAssign,
            Symbol::AmpAssign => BinaryOp::AndAssign,
            Symbol::CaretAssign => BinaryOp::XorAssign,
            Symbol::PipeAssign => BinaryOp::OrAssign,
            Symbol::OrOr => BinaryOp::LogicalOr,
            Symbol::AndAnd => BinaryOp::LogicalAnd,
            Symbol::Pipe => BinaryOp::BitOr,
            Symbol::Caret => BinaryOp::BitXor,
            Symbol::Amp => BinaryOp::BitAnd,
            Symbol::EqEq => BinaryOp::Eq,
            Symbol::NotEq => BinaryOp::Ne,
            Symbol::Lt => BinaryOp::Lt,
            Symbol::Le => BinaryOp::Le,
            Symbol::Gt => BinaryOp::Gt,
            Symbol::Ge => BinaryOp::Ge,
            Symbol::Shl => BinaryOp::Shl,
            Symbol::Shr => BinaryOp::Shr,
            Symbol::Plus => BinaryOp::Add,
            Symbol::Minus => BinaryOp::Sub,
            Symbol::Star => BinaryOp::Mul,
            Symbol::Slash => BinaryOp::Div,
            Symbol::Percent => BinaryOp::Rem,
            Symbol::Dot => BinaryOp::Member,
            Symbol::Arrow => BinaryOp::PtrMember,
            _ => return None,
        };
        Some(op)
    }

    /// Binding strength; higher binds tighter.
    pub fn strength(&self) -> u8 {
        match self {
            BinaryOp::Assign
            | BinaryOp::AddAssign
            | BinaryOp::SubAssign
            | BinaryOp::MulAssign
            | BinaryOp::DivAssign
            | BinaryOp::RemAssign
            | BinaryOp::ShlAssign
            | BinaryOp::ShrAssign
            | BinaryOp::AndAssign
            | BinaryOp::XorAssign
            | BinaryOp::OrAssign => ASSIGN_STRENGTH,
            BinaryOp::LogicalOr => 3,
            BinaryOp::LogicalAnd => 4,
            BinaryOp::BitOr => 5,
            BinaryOp::BitXor => 6,
            BinaryOp::BitAnd => 7,
            BinaryOp::Eq | BinaryOp::Ne => 8,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 9,
            BinaryOp::Shl | BinaryOp::Shr => 10,
            BinaryOp::Add | BinaryOp::Sub => 11,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 12,
            BinaryOp::Member | BinaryOp::PtrMember => MEMBER_STRENGTH,
        }
    }

    pub fn is_right_assoc(&self) -> bool {
        self.strength() == ASSIGN_STRENGTH
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Assign => "=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::RemAssign => "%=",
            BinaryOp::ShlAssign => "<<=",
            BinaryOp::ShrAssign => ">>=",
            BinaryOp::AndAssign => "&=",
            BinaryOp::XorAssign => "^=",
            BinaryOp::OrAssign => "|=",
            BinaryOp::LogicalOr => "||",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Member => ".",
            BinaryOp::PtrMember => "->",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrefixOp {
    Not,
    PreDec,
    PreInc,
    Deref,
    BitNot,
    AddrOf,
    Neg,
}

impl PrefixOp {
    pub fn from_symbol(symbol: Symbol) -> Option<Self> {
        let op = match symbol {
            Symbol::Bang => PrefixOp::Not,
            Symbol::MinusMinus => PrefixOp::PreDec,
            Symbol::PlusPlus => PrefixOp::PreInc,
            Symbol::Star => PrefixOp::Deref,
            Symbol::Tilde => PrefixOp::BitNot,
            Symbol::Amp => PrefixOp::AddrOf,
            Symbol::Minus => PrefixOp::Neg,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrefixOp::Not => "!",
            PrefixOp::PreDec => "--",
            PrefixOp::PreInc => "++",
            PrefixOp::Deref => "*",
            PrefixOp::BitNot => "~",
            PrefixOp::AddrOf => "&",
            PrefixOp::Neg => "-",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostfixOp {
    Inc,
    Dec,
}

impl PostfixOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostfixOp::Inc => "++",
            PostfixOp::Dec => "--",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Number(String),
    String(String),
    Char(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrayEntry {
    /// `[index] = value`
    pub index: Option<Expr>,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemberInit {
    pub name: String,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    Prefix(PrefixOp, Box<Expr>),
    Postfix(PostfixOp, Box<Expr>),
    Cast(Box<TypeName>, Box<Expr>),
    SizeofType(Box<TypeName>),
    SizeofExpr(Box<Expr>),
    Ident(String),
    Literal(Literal),
    Call(Box<Expr>, Vec<Expr>),
    Index(Box<Expr>, Box<Expr>),
    ArrayLiteral(Vec<ArrayEntry>),
    StructLiteral(Vec<MemberInit>),
}

impl Expr {
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn number(text: impl Into<String>) -> Self {
        Expr::Literal(Literal::Number(text.into()))
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call(Box::new(Expr::Ident(name.into())), args)
    }

    pub fn strength(&self) -> u8 {
        match self {
            Expr::Binary(op, _, _) => op.strength(),
            Expr::Conditional(..) => TERNARY_STRENGTH,
            Expr::Prefix(..) | Expr::Cast(..) | Expr::SizeofType(_) | Expr::SizeofExpr(_) => UNARY_STRENGTH,
            Expr::Postfix(..)
            | Expr::Ident(_)
            | Expr::Literal(_)
            | Expr::Call(..)
            | Expr::Index(..)
            | Expr::ArrayLiteral(_)
            | Expr::StructLiteral(_) => ATOM_STRENGTH,
        }
    }
}
