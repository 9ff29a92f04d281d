mod ast;
mod expr;
mod parser;
mod type_names;

use std::path::Path;

pub use ast::*;
pub use parser::*;
pub use type_names::*;

use crate::error::Result;
use crate::lexer::Lexer;

/// Tokenizes and parses one file's source. `names` must already hold every
/// type name visible to the file; the file's own declarations are added.
pub fn parse_source(source: &str, names: &mut TypeNames, path: &Path) -> Result<Module> {
    let tokens = Lexer::tokenize(source);
    Parser::new(tokens, names, path).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::lexer::Keyword;
    use test_log::test;

    fn parse(source: &str) -> Result<Module> {
        parse_source(source, &mut TypeNames::new(), Path::new("test.c"))
    }

    fn function_body(module: &Module, name: &str) -> Vec<Stmt> {
        module
            .elements
            .iter()
            .find_map(|e| match e {
                Element::Function(f) if f.name() == Some(name) => f.body.clone(),
                _ => None,
            })
            .unwrap()
    }

    fn return_value(source: &str) -> Expr {
        let module = parse(&format!("int f(int a, int b, int c) {{ return {}; }}", source)).unwrap();
        match &function_body(&module, "f")[0] {
            Stmt::Return(Some(e)) => e.clone(),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn module_name_drops_os_tag() {
        let module = parse_source("", &mut TypeNames::new(), Path::new("dir/io.linux.c")).unwrap();
        assert_eq!(module.name, "io");
    }

    #[test]
    fn multiplication_binds_tighter() {
        let e = return_value("a + b * c");
        assert_eq!(
            e,
            Expr::binary(
                BinaryOp::Add,
                Expr::ident("a"),
                Expr::binary(BinaryOp::Mul, Expr::ident("b"), Expr::ident("c"))
            )
        );
    }

    #[test]
    fn subtraction_groups_left() {
        let e = return_value("a - b - c");
        assert_eq!(
            e,
            Expr::binary(
                BinaryOp::Sub,
                Expr::binary(BinaryOp::Sub, Expr::ident("a"), Expr::ident("b")),
                Expr::ident("c")
            )
        );
    }

    #[test]
    fn assignment_groups_right() {
        let e = return_value("a = b = c");
        assert_eq!(
            e,
            Expr::binary(
                BinaryOp::Assign,
                Expr::ident("a"),
                Expr::binary(BinaryOp::Assign, Expr::ident("b"), Expr::ident("c"))
            )
        );
    }

    #[test]
    fn conditional_sits_below_logical_or() {
        let e = return_value("a || b ? c : a");
        let Expr::Conditional(cond, _, _) = e else {
            panic!("expected a conditional");
        };
        assert!(matches!(*cond, Expr::Binary(BinaryOp::LogicalOr, _, _)));
    }

    #[test]
    fn prefix_applies_after_member_access() {
        let e = return_value("*a.b");
        let Expr::Prefix(PrefixOp::Deref, operand) = e else {
            panic!("expected a dereference");
        };
        assert!(matches!(*operand, Expr::Binary(BinaryOp::Member, _, _)));
    }

    #[test]
    fn cast_needs_a_known_type() {
        let mut names = TypeNames::new();
        names.supply(["foo_t"]);
        let module = parse_source(
            "int f(int x) { return (foo_t)x + (x); }",
            &mut names,
            Path::new("test.c"),
        )
        .unwrap();
        let Stmt::Return(Some(Expr::Binary(BinaryOp::Add, lhs, rhs))) = &function_body(&module, "f")[0] else {
            panic!("expected an addition");
        };
        assert!(matches!(**lhs, Expr::Cast(..)));
        assert_eq!(**rhs, Expr::ident("x"));
    }

    #[test]
    fn typedef_registers_its_name() {
        let mut names = TypeNames::new();
        let module = parse_source(
            "typedef unsigned long u64;\nu64 twice(u64 x) { u64 y = x * 2; return y; }",
            &mut names,
            Path::new("test.c"),
        )
        .unwrap();
        assert!(names.contains("u64"));
        assert_eq!(module.type_names, vec!["u64".to_string()]);
        assert!(matches!(function_body(&module, "twice")[0], Stmt::Declaration(_)));
    }

    #[test]
    fn typedef_twice_is_a_redefinition() {
        let err = parse("typedef int a;\ntypedef long a;").unwrap_err();
        let Error::Redefinition { name, pos, .. } = err else {
            panic!("unexpected {:?}", err);
        };
        assert_eq!(name, "a");
        assert_eq!(pos.line, 2);
    }

    #[test]
    fn type_directive_registers_and_link_is_kept() {
        let mut names = TypeNames::new();
        let module = parse_source("#type FILE\n#link m\n#define N 3\n", &mut names, Path::new("t.c")).unwrap();
        assert!(names.contains("FILE"));
        assert_eq!(
            module.elements,
            vec![
                Element::TypeDirective("FILE".to_string()),
                Element::Link("m".to_string()),
                Element::Macro("#define N 3".to_string()),
            ]
        );
    }

    #[test]
    fn pub_variable_is_rejected() {
        let err = parse("pub int counter = 0;").unwrap_err();
        assert!(matches!(err, Error::PubVariable { ref name, .. } if name == "counter"));
    }

    #[test]
    fn struct_definition_then_forward() {
        let module = parse("pub struct node { int value; struct node *next; };\nstruct node;").unwrap();
        assert!(matches!(
            &module.elements[0],
            Element::StructDef(StructDef { public: true, name, fields, .. }) if name == "node" && fields.len() == 2
        ));
        assert!(matches!(&module.elements[1], Element::StructForward(f) if f.name == "node"));
    }

    #[test]
    fn struct_variable_falls_back_to_declaration() {
        let module = parse("struct point { int x; int y; } origin;").unwrap();
        assert!(matches!(&module.elements[0], Element::Variable(_)));
    }

    #[test]
    fn anonymous_struct_typedef_keeps_body() {
        let module = parse("pub typedef struct { int x; } point;").unwrap();
        let Element::Typedef(t) = &module.elements[0] else {
            panic!("expected a typedef");
        };
        assert!(t.public);
        assert_eq!(t.name(), Some("point"));
        assert!(matches!(
            &t.ty.parts[0],
            TypePart::Record(Record { name: None, body: Some(RecordBody::Fields(_)), .. })
        ));
    }

    #[test]
    fn function_pointer_is_not_a_function() {
        let module = parse("int (*handler)(int);\nint apply(int (*fp)(int), int v);").unwrap();
        assert!(matches!(module.elements[0], Element::Variable(_)));
        let Element::Function(f) = &module.elements[1] else {
            panic!("expected a prototype");
        };
        assert!(f.body.is_none());
    }

    #[test]
    fn enum_with_values() {
        let module = parse("enum color { RED = 1, GREEN, BLUE, };").unwrap();
        let Element::EnumDef(e) = &module.elements[0] else {
            panic!("expected an enum");
        };
        assert_eq!(e.variants.len(), 3);
        assert_eq!(e.variants[0].value, Some(Expr::number("1")));
    }

    #[test]
    fn statements() {
        let module = parse(
            "void f(int n) {
                defer g();
                for (int i = 0; i < n; i++) { if (i == 2) continue; else break; }
                do n--; while (n > 0);
                switch (n) { case 1: g(); break; default: ; }
                ;
            }",
        )
        .unwrap();
        let body = function_body(&module, "f");
        assert!(matches!(body[0], Stmt::Defer(_)));
        assert!(matches!(body[1], Stmt::For { init: Some(ForInit::Declaration(_)), .. }));
        assert!(matches!(body[2], Stmt::DoWhile { .. }));
        let Stmt::Switch { cases, .. } = &body[3] else {
            panic!("expected a switch");
        };
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].body.len(), 2);
        assert_eq!(body[4], Stmt::Empty);
    }

    #[test]
    fn literals() {
        let module = parse(
            "struct p { int x; int y; };\nint a[] = { [0] = 1, 2 };\nvoid f(void) { g((struct p){ .x = 1, .y = 2 }); }",
        )
        .unwrap();
        let Element::Variable(d) = &module.elements[1] else {
            panic!("expected a variable");
        };
        assert!(matches!(&d.declarators[0].init, Some(Expr::ArrayLiteral(entries)) if entries.len() == 2));
        let Stmt::Expr(Expr::Call(_, args)) = &function_body(&module, "f")[0] else {
            panic!("expected a call");
        };
        assert!(matches!(&args[0], Expr::Cast(_, inner) if matches!(**inner, Expr::StructLiteral(_))));
    }

    #[test]
    fn qualifiers_and_modifiers_stay_in_type() {
        let module = parse("static const char *name;").unwrap();
        let Element::Variable(d) = &module.elements[0] else {
            panic!("expected a variable");
        };
        assert_eq!(
            d.ty.parts,
            vec![
                TypePart::Keyword(Keyword::Static),
                TypePart::Keyword(Keyword::Const),
                TypePart::Keyword(Keyword::Char)
            ]
        );
        assert_eq!(d.declarators[0].form.pointers.len(), 1);
    }

    #[test]
    fn syntax_error_reports_position_and_context() {
        let err = parse("int main(void) {\n  return 1 +;\n}").unwrap_err();
        let Error::Syntax { pos, expected, context, .. } = err else {
            panic!("unexpected {:?}", err);
        };
        assert_eq!(pos.line, 2);
        assert_eq!(expected, "expression");
        assert!(context.contains("1 + ;"));
    }

    #[test]
    fn lexer_error_wins() {
        let err = parse("int x = 12abc;").unwrap_err();
        assert!(matches!(err, Error::Lex { .. }));
    }

    #[test]
    fn failed_speculation_does_not_leak_names() {
        let mut names = TypeNames::new();
        let module = parse_source("struct s { int a; } v;", &mut names, Path::new("t.c")).unwrap();
        assert!(names.is_empty());
        assert!(module.type_names.is_empty());
    }
}
