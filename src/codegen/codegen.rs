use crate::parser::{
    ArrayEntry, BinaryOp, Case, Declaration, Declarator, Element, EnumDef, Enumerator, Expr,
    ForInit, Form, FormCore, Function, Literal, MemberInit, Modifier, Module, Params, PrefixOp,
    Record, RecordBody, Stmt, StructDef, Type, TypeName, TypePart, ATOM_STRENGTH, MEMBER_STRENGTH,
    TERNARY_STRENGTH, UNARY_STRENGTH,
};

/// Turns AST nodes back into C text. Holds no state between calls; nesting
/// depth is threaded through as an argument and each level is one tab.
#[derive(Clone, Copy, Debug, Default)]
pub struct Codegen;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

fn tabs(depth: usize) -> String {
    "\t".repeat(depth)
}

fn is_comparison(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
    )
}

fn is_bitwise(op: BinaryOp) -> bool {
    matches!(op, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor)
}

/// Groupings that are already implied by strength but that gcc's
/// `-Wparentheses` still wants spelled out. These are the only parentheses
/// emitted around an operand that binds tighter than its parent, so
/// `a || b && c` prints as `a || (b && c)`.
fn needs_clarity(parent: BinaryOp, child: BinaryOp) -> bool {
    match parent {
        BinaryOp::LogicalOr => child == BinaryOp::LogicalAnd,
        BinaryOp::Shl | BinaryOp::Shr => matches!(child, BinaryOp::Add | BinaryOp::Sub),
        p if is_bitwise(p) => child != p && child.strength() < MEMBER_STRENGTH,
        p if is_comparison(p) => is_comparison(child),
        _ => false,
    }
}

impl Codegen {
    pub fn new() -> Self {
        Self
    }

    pub fn gen_module(&self, module: &Module) -> String {
        let mut out = String::new();
        for (i, element) in module.elements.iter().enumerate() {
            let is_definition = matches!(element, Element::Function(f) if f.body.is_some());
            if i > 0 && is_definition {
                out.push('\n');
            }
            out.push_str(&self.gen_element(element));
            out.push('\n');
        }
        out
    }

    pub fn gen_element(&self, element: &Element) -> String {
        match element {
            Element::Import(i) => format!("/* import \"{}\" */", i.path),
            Element::Include(header) => format!("#include <{}>", header),
            Element::Macro(line) => line.clone(),
            Element::TypeDirective(name) => format!("/* #type {} */", name),
            Element::Link(name) => format!("/* #link {} */", name),
            Element::Typedef(t) => format!("typedef {};", self.gen_typed(&t.ty, &t.form, 0)),
            Element::StructForward(f) => format!("{} {};", f.kind.as_str(), f.name),
            Element::StructDef(s) => self.gen_struct_def(s),
            Element::EnumDef(e) => self.gen_enum_def(e),
            Element::Function(f) => self.gen_function(f),
            Element::Variable(d) => format!("{};", self.gen_declaration(d, 0)),
        }
    }

    fn gen_struct_def(&self, def: &StructDef) -> String {
        format!(
            "{} {} {};",
            def.kind.as_str(),
            def.name,
            self.gen_fields(&def.fields, 0)
        )
    }

    fn gen_enum_def(&self, def: &EnumDef) -> String {
        format!("enum {} {};", def.name, self.gen_enumerators(&def.variants, 0))
    }

    fn gen_function(&self, function: &Function) -> String {
        let head = self.gen_typed(&function.ty, &function.form, 0);
        match &function.body {
            None => format!("{};", head),
            Some(body) => format!("{} {}", head, self.gen_block(body, 0)),
        }
    }

    fn gen_fields(&self, fields: &[Declaration], depth: usize) -> String {
        let mut out = String::from("{\n");
        for field in fields {
            out.push_str(&tabs(depth + 1));
            out.push_str(&self.gen_declaration(field, depth + 1));
            out.push_str(";\n");
        }
        out.push_str(&tabs(depth));
        out.push('}');
        out
    }

    fn gen_enumerators(&self, variants: &[Enumerator], depth: usize) -> String {
        let lines = variants
            .iter()
            .map(|v| match &v.value {
                Some(value) => format!("{}{} = {}", tabs(depth + 1), v.name, self.gen_expr(value)),
                None => format!("{}{}", tabs(depth + 1), v.name),
            })
            .collect::<Vec<_>>();
        format!("{{\n{}\n{}}}", lines.join(",\n"), tabs(depth))
    }

    pub fn gen_type(&self, ty: &Type, depth: usize) -> String {
        ty.parts
            .iter()
            .map(|part| match part {
                TypePart::Keyword(k) => k.as_str().to_string(),
                TypePart::Name(name) => name.clone(),
                TypePart::Record(record) => self.gen_record(record, depth),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn gen_record(&self, record: &Record, depth: usize) -> String {
        let mut out = record.kind.as_str().to_string();
        if let Some(name) = &record.name {
            out.push(' ');
            out.push_str(name);
        }
        match &record.body {
            Some(RecordBody::Fields(fields)) => {
                out.push(' ');
                out.push_str(&self.gen_fields(fields, depth));
            }
            Some(RecordBody::Enumerators(variants)) => {
                out.push(' ');
                out.push_str(&self.gen_enumerators(variants, depth));
            }
            None => {}
        }
        out
    }

    pub fn gen_form(&self, form: &Form) -> String {
        let mut out = String::new();
        for pointer in &form.pointers {
            out.push('*');
            for qualifier in &pointer.qualifiers {
                out.push_str(qualifier.as_str());
                out.push(' ');
            }
        }
        match &form.core {
            FormCore::Name(name) => out.push_str(name),
            FormCore::Nested(inner) => {
                out.push('(');
                out.push_str(&self.gen_form(inner));
                out.push(')');
            }
            FormCore::Abstract => {}
        }
        for modifier in &form.modifiers {
            match modifier {
                Modifier::Array(None) => out.push_str("[]"),
                Modifier::Array(Some(size)) => {
                    out.push('[');
                    out.push_str(&self.gen_expr(size));
                    out.push(']');
                }
                Modifier::Params(params) => {
                    out.push('(');
                    out.push_str(&self.gen_params(params));
                    out.push(')');
                }
            }
        }
        // `char *const ` leaves a dangling space when nothing follows
        out.trim_end().to_string()
    }

    fn gen_params(&self, params: &Params) -> String {
        let mut parts = params
            .params
            .iter()
            .map(|p| self.gen_typed(&p.ty, &p.form, 0))
            .collect::<Vec<_>>();
        if params.variadic {
            parts.push("...".to_string());
        }
        parts.join(", ")
    }

    /// `type form`, leaving out the space when the form is abstract.
    fn gen_typed(&self, ty: &Type, form: &Form, depth: usize) -> String {
        let ty = self.gen_type(ty, depth);
        let form = self.gen_form(form);
        if form.is_empty() {
            ty
        } else {
            format!("{} {}", ty, form)
        }
    }

    pub fn gen_type_name(&self, type_name: &TypeName) -> String {
        self.gen_typed(&type_name.ty, &type_name.form, 0)
    }

    fn gen_declaration(&self, declaration: &Declaration, depth: usize) -> String {
        let declarators = declaration
            .declarators
            .iter()
            .map(|Declarator { form, init }| match init {
                Some(init) => format!("{} = {}", self.gen_form(form), self.gen_expr(init)),
                None => self.gen_form(form),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let ty = self.gen_type(&declaration.ty, depth);
        if declarators.is_empty() {
            ty
        } else {
            format!("{} {}", ty, declarators)
        }
    }

    /// `{`, the statements one level deeper, then `}` at `depth`. No
    /// trailing newline.
    fn gen_block(&self, stmts: &[Stmt], depth: usize) -> String {
        let mut out = String::from("{\n");
        for stmt in stmts {
            out.push_str(&self.gen_stmt(stmt, depth + 1));
        }
        out.push_str(&tabs(depth));
        out.push('}');
        out
    }

    /// Bodies of control statements always get braces.
    fn gen_braced(&self, stmt: &Stmt, depth: usize) -> String {
        match stmt {
            Stmt::Block(stmts) => self.gen_block(stmts, depth),
            other => self.gen_block(std::slice::from_ref(other), depth),
        }
    }

    /// A condition in `if`/`while`; a bare assignment gets a second pair
    /// of parentheses.
    fn gen_condition(&self, cond: &Expr) -> String {
        match cond {
            Expr::Binary(BinaryOp::Assign, _, _) => format!("(({}))", self.gen_expr(cond)),
            _ => format!("({})", self.gen_expr(cond)),
        }
    }

    /// One statement as complete lines, indented to `depth`.
    pub fn gen_stmt(&self, stmt: &Stmt, depth: usize) -> String {
        let indent = tabs(depth);
        match stmt {
            Stmt::Block(stmts) => format!("{}{}\n", indent, self.gen_block(stmts, depth)),
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                let mut out = format!(
                    "{}if {} {}",
                    indent,
                    self.gen_condition(cond),
                    self.gen_braced(then, depth)
                );
                match otherwise.as_deref() {
                    Some(chained @ Stmt::If { .. }) => {
                        out.push_str(" else ");
                        out.push_str(self.gen_stmt(chained, depth).trim_start_matches('\t'));
                    }
                    Some(other) => {
                        out.push_str(" else ");
                        out.push_str(&self.gen_braced(other, depth));
                        out.push('\n');
                    }
                    None => out.push('\n'),
                }
                out
            }
            Stmt::While { cond, body } => format!(
                "{}while {} {}\n",
                indent,
                self.gen_condition(cond),
                self.gen_braced(body, depth)
            ),
            Stmt::DoWhile { body, cond } => format!(
                "{}do {} while {};\n",
                indent,
                self.gen_braced(body, depth),
                self.gen_condition(cond)
            ),
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                let init = match init {
                    Some(ForInit::Declaration(d)) => self.gen_declaration(d, depth),
                    Some(ForInit::Expr(e)) => self.gen_expr(e),
                    None => String::new(),
                };
                let cond = cond
                    .as_ref()
                    .map(|c| format!(" {}", self.gen_expr(c)))
                    .unwrap_or_default();
                let step = step
                    .as_ref()
                    .map(|s| format!(" {}", self.gen_expr(s)))
                    .unwrap_or_default();
                format!(
                    "{}for ({};{};{}) {}\n",
                    indent,
                    init,
                    cond,
                    step,
                    self.gen_braced(body, depth)
                )
            }
            Stmt::Switch { value, cases } => {
                let mut out = format!("{}switch ({}) {{\n", indent, self.gen_expr(value));
                for case in cases {
                    out.push_str(&self.gen_case(case, depth + 1));
                }
                out.push_str(&indent);
                out.push_str("}\n");
                out
            }
            Stmt::Return(None) => format!("{}return;\n", indent),
            Stmt::Return(Some(value)) => format!("{}return {};\n", indent, self.gen_expr(value)),
            Stmt::Defer(e) => format!("{}defer {};\n", indent, self.gen_expr(e)),
            Stmt::Declaration(d) => format!("{}{};\n", indent, self.gen_declaration(d, depth)),
            Stmt::Expr(e) => format!("{}{};\n", indent, self.gen_expr(e)),
            Stmt::Break => format!("{}break;\n", indent),
            Stmt::Continue => format!("{}continue;\n", indent),
            Stmt::Empty => format!("{};\n", indent),
        }
    }

    fn gen_case(&self, case: &Case, depth: usize) -> String {
        let mut out = match &case.label {
            Some(label) => format!("{}case {}:\n", tabs(depth), self.gen_expr(label)),
            None => format!("{}default:\n", tabs(depth)),
        };
        for stmt in &case.body {
            out.push_str(&self.gen_stmt(stmt, depth + 1));
        }
        out
    }

    pub fn gen_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.gen_operand(lhs, *op, Side::Left);
                let rhs = self.gen_operand(rhs, *op, Side::Right);
                match op {
                    BinaryOp::Member | BinaryOp::PtrMember => format!("{}{}{}", lhs, op.as_str(), rhs),
                    _ => format!("{} {} {}", lhs, op.as_str(), rhs),
                }
            }
            Expr::Conditional(cond, then, otherwise) => {
                let cond = self.gen_bounded(cond, TERNARY_STRENGTH + 1);
                let otherwise = self.gen_bounded(otherwise, TERNARY_STRENGTH);
                format!("{} ? {} : {}", cond, self.gen_expr(then), otherwise)
            }
            Expr::Prefix(op, operand) => {
                let operand = self.gen_bounded(operand, UNARY_STRENGTH);
                let symbol = op.as_str();
                if merges(*op, &operand) {
                    format!("{} {}", symbol, operand)
                } else {
                    format!("{}{}", symbol, operand)
                }
            }
            Expr::Postfix(op, operand) => {
                format!("{}{}", self.gen_bounded(operand, MEMBER_STRENGTH), op.as_str())
            }
            Expr::Cast(ty, operand) => format!(
                "({}){}",
                self.gen_type_name(ty),
                self.gen_bounded(operand, UNARY_STRENGTH)
            ),
            Expr::SizeofType(ty) => format!("sizeof({})", self.gen_type_name(ty)),
            Expr::SizeofExpr(operand) => format!("sizeof({})", self.gen_expr(operand)),
            Expr::Ident(name) => name.clone(),
            Expr::Literal(Literal::Number(n)) => n.clone(),
            Expr::Literal(Literal::String(s)) => format!("\"{}\"", s),
            Expr::Literal(Literal::Char(c)) => format!("'{}'", c),
            Expr::Call(callee, args) => {
                let args = args.iter().map(|a| self.gen_expr(a)).collect::<Vec<_>>();
                format!("{}({})", self.gen_bounded(callee, MEMBER_STRENGTH), args.join(", "))
            }
            Expr::Index(base, index) => format!(
                "{}[{}]",
                self.gen_bounded(base, MEMBER_STRENGTH),
                self.gen_expr(index)
            ),
            Expr::ArrayLiteral(entries) => {
                let entries = entries
                    .iter()
                    .map(|ArrayEntry { index, value }| match index {
                        Some(index) => format!("[{}] = {}", self.gen_expr(index), self.gen_expr(value)),
                        None => self.gen_expr(value),
                    })
                    .collect::<Vec<_>>();
                braces(entries)
            }
            Expr::StructLiteral(members) => {
                let members = members
                    .iter()
                    .map(|MemberInit { name, value }| format!(".{} = {}", name, self.gen_expr(value)))
                    .collect::<Vec<_>>();
                braces(members)
            }
        }
    }

    /// Parenthesizes `expr` when it binds looser than `min`.
    fn gen_bounded(&self, expr: &Expr, min: u8) -> String {
        if expr.strength() < min {
            format!("({})", self.gen_expr(expr))
        } else {
            self.gen_expr(expr)
        }
    }

    fn gen_operand(&self, operand: &Expr, parent: BinaryOp, side: Side) -> String {
        let strength = operand.strength();
        let wrong_side = if parent.is_right_assoc() {
            side == Side::Left
        } else {
            side == Side::Right
        };
        let clarity = match operand {
            Expr::Binary(child, _, _) => needs_clarity(parent, *child),
            _ => false,
        };
        let wrap = strength < parent.strength()
            || (strength == parent.strength() && wrong_side && strength < ATOM_STRENGTH)
            || clarity;
        if wrap {
            format!("({})", self.gen_expr(operand))
        } else {
            self.gen_expr(operand)
        }
    }
}

/// `- -x` and `- --x` must not run together into `--x` / `---x`.
fn merges(op: PrefixOp, operand: &str) -> bool {
    let last = op.as_str().chars().last();
    matches!(last, Some('-' | '+' | '&')) && operand.starts_with(last.unwrap_or_default())
}

fn braces(items: Vec<String>) -> String {
    if items.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", items.join(", "))
    }
}
