mod codegen;

pub use codegen::*;

use crate::parser::{Element, Expr, Module, Stmt};

pub fn format_module(module: &Module) -> String {
    Codegen::new().gen_module(module)
}

pub fn format_element(element: &Element) -> String {
    Codegen::new().gen_element(element)
}

pub fn format_stmt(stmt: &Stmt, depth: usize) -> String {
    Codegen::new().gen_stmt(stmt, depth)
}

pub fn format_expr(expr: &Expr) -> String {
    Codegen::new().gen_expr(expr)
}
