use std::collections::BTreeSet;

use phf::{phf_map, phf_set};

use crate::parser::{
    BinaryOp, Declaration, Element, Expr, ForInit, Form, FormCore, Function, Modifier, Record, RecordBody,
    Stmt, Type, TypeName, TypePart,
};

/// Type names owned by a standard header, known to every parse.
pub static STANDARD_TYPES: phf::Set<&'static str> = phf_set! {
    "FILE", "fpos_t", "size_t", "ptrdiff_t", "wchar_t", "va_list", "bool",
    "int8_t", "int16_t", "int32_t", "int64_t",
    "uint8_t", "uint16_t", "uint32_t", "uint64_t",
    "intptr_t", "uintptr_t", "intmax_t", "uintmax_t",
    "time_t", "clock_t", "div_t", "ldiv_t",
};

/// Identifier -> the standard header that declares it.
pub static HEADERS: phf::Map<&'static str, &'static str> = phf_map! {
    // assert.h
    "assert" => "assert.h",
    // ctype.h
    "isalnum" => "ctype.h",
    "isalpha" => "ctype.h",
    "iscntrl" => "ctype.h",
    "isdigit" => "ctype.h",
    "isgraph" => "ctype.h",
    "islower" => "ctype.h",
    "isprint" => "ctype.h",
    "ispunct" => "ctype.h",
    "isspace" => "ctype.h",
    "isupper" => "ctype.h",
    "isxdigit" => "ctype.h",
    "tolower" => "ctype.h",
    "toupper" => "ctype.h",
    // errno.h
    "errno" => "errno.h",
    "EDOM" => "errno.h",
    "ERANGE" => "errno.h",
    "EINVAL" => "errno.h",
    "ENOENT" => "errno.h",
    "ENOMEM" => "errno.h",
    // limits.h
    "CHAR_BIT" => "limits.h",
    "CHAR_MAX" => "limits.h",
    "CHAR_MIN" => "limits.h",
    "SCHAR_MAX" => "limits.h",
    "SCHAR_MIN" => "limits.h",
    "UCHAR_MAX" => "limits.h",
    "SHRT_MAX" => "limits.h",
    "SHRT_MIN" => "limits.h",
    "USHRT_MAX" => "limits.h",
    "INT_MAX" => "limits.h",
    "INT_MIN" => "limits.h",
    "UINT_MAX" => "limits.h",
    "LONG_MAX" => "limits.h",
    "LONG_MIN" => "limits.h",
    "ULONG_MAX" => "limits.h",
    // math.h
    "acos" => "math.h",
    "asin" => "math.h",
    "atan" => "math.h",
    "atan2" => "math.h",
    "ceil" => "math.h",
    "cos" => "math.h",
    "cosh" => "math.h",
    "exp" => "math.h",
    "fabs" => "math.h",
    "floor" => "math.h",
    "fmod" => "math.h",
    "frexp" => "math.h",
    "ldexp" => "math.h",
    "log" => "math.h",
    "log10" => "math.h",
    "modf" => "math.h",
    "pow" => "math.h",
    "sin" => "math.h",
    "sinh" => "math.h",
    "sqrt" => "math.h",
    "tan" => "math.h",
    "tanh" => "math.h",
    "HUGE_VAL" => "math.h",
    // stdarg.h
    "va_list" => "stdarg.h",
    "va_start" => "stdarg.h",
    "va_arg" => "stdarg.h",
    "va_end" => "stdarg.h",
    "va_copy" => "stdarg.h",
    // stdbool.h
    "bool" => "stdbool.h",
    "true" => "stdbool.h",
    "false" => "stdbool.h",
    // stddef.h
    "size_t" => "stddef.h",
    "ptrdiff_t" => "stddef.h",
    "wchar_t" => "stddef.h",
    "NULL" => "stddef.h",
    "offsetof" => "stddef.h",
    // stdint.h
    "int8_t" => "stdint.h",
    "int16_t" => "stdint.h",
    "int32_t" => "stdint.h",
    "int64_t" => "stdint.h",
    "uint8_t" => "stdint.h",
    "uint16_t" => "stdint.h",
    "uint32_t" => "stdint.h",
    "uint64_t" => "stdint.h",
    "intptr_t" => "stdint.h",
    "uintptr_t" => "stdint.h",
    "intmax_t" => "stdint.h",
    "uintmax_t" => "stdint.h",
    "INT8_MAX" => "stdint.h",
    "INT16_MAX" => "stdint.h",
    "INT32_MAX" => "stdint.h",
    "INT64_MAX" => "stdint.h",
    "UINT8_MAX" => "stdint.h",
    "UINT16_MAX" => "stdint.h",
    "UINT32_MAX" => "stdint.h",
    "UINT64_MAX" => "stdint.h",
    "SIZE_MAX" => "stdint.h",
    // stdio.h
    "FILE" => "stdio.h",
    "fpos_t" => "stdio.h",
    "EOF" => "stdio.h",
    "BUFSIZ" => "stdio.h",
    "stdin" => "stdio.h",
    "stdout" => "stdio.h",
    "stderr" => "stdio.h",
    "printf" => "stdio.h",
    "fprintf" => "stdio.h",
    "sprintf" => "stdio.h",
    "snprintf" => "stdio.h",
    "vprintf" => "stdio.h",
    "vfprintf" => "stdio.h",
    "vsprintf" => "stdio.h",
    "vsnprintf" => "stdio.h",
    "scanf" => "stdio.h",
    "fscanf" => "stdio.h",
    "sscanf" => "stdio.h",
    "fopen" => "stdio.h",
    "freopen" => "stdio.h",
    "fclose" => "stdio.h",
    "fflush" => "stdio.h",
    "fread" => "stdio.h",
    "fwrite" => "stdio.h",
    "fgetc" => "stdio.h",
    "fgets" => "stdio.h",
    "fputc" => "stdio.h",
    "fputs" => "stdio.h",
    "getc" => "stdio.h",
    "getchar" => "stdio.h",
    "putc" => "stdio.h",
    "putchar" => "stdio.h",
    "puts" => "stdio.h",
    "ungetc" => "stdio.h",
    "fseek" => "stdio.h",
    "ftell" => "stdio.h",
    "rewind" => "stdio.h",
    "feof" => "stdio.h",
    "ferror" => "stdio.h",
    "perror" => "stdio.h",
    "remove" => "stdio.h",
    "rename" => "stdio.h",
    "SEEK_SET" => "stdio.h",
    "SEEK_CUR" => "stdio.h",
    "SEEK_END" => "stdio.h",
    // stdlib.h
    "malloc" => "stdlib.h",
    "calloc" => "stdlib.h",
    "realloc" => "stdlib.h",
    "free" => "stdlib.h",
    "abort" => "stdlib.h",
    "exit" => "stdlib.h",
    "atexit" => "stdlib.h",
    "getenv" => "stdlib.h",
    "system" => "stdlib.h",
    "atoi" => "stdlib.h",
    "atol" => "stdlib.h",
    "atof" => "stdlib.h",
    "strtol" => "stdlib.h",
    "strtoul" => "stdlib.h",
    "strtod" => "stdlib.h",
    "abs" => "stdlib.h",
    "labs" => "stdlib.h",
    "div" => "stdlib.h",
    "ldiv" => "stdlib.h",
    "div_t" => "stdlib.h",
    "ldiv_t" => "stdlib.h",
    "rand" => "stdlib.h",
    "srand" => "stdlib.h",
    "qsort" => "stdlib.h",
    "bsearch" => "stdlib.h",
    "EXIT_SUCCESS" => "stdlib.h",
    "EXIT_FAILURE" => "stdlib.h",
    "RAND_MAX" => "stdlib.h",
    // string.h
    "memcpy" => "string.h",
    "memmove" => "string.h",
    "memset" => "string.h",
    "memcmp" => "string.h",
    "memchr" => "string.h",
    "strcpy" => "string.h",
    "strncpy" => "string.h",
    "strcat" => "string.h",
    "strncat" => "string.h",
    "strcmp" => "string.h",
    "strncmp" => "string.h",
    "strchr" => "string.h",
    "strrchr" => "string.h",
    "strstr" => "string.h",
    "strlen" => "string.h",
    "strerror" => "string.h",
    "strtok" => "string.h",
    "strspn" => "string.h",
    "strcspn" => "string.h",
    "strpbrk" => "string.h",
    // time.h
    "time_t" => "time.h",
    "clock_t" => "time.h",
    "time" => "time.h",
    "clock" => "time.h",
    "difftime" => "time.h",
    "mktime" => "time.h",
    "localtime" => "time.h",
    "gmtime" => "time.h",
    "strftime" => "time.h",
    "CLOCKS_PER_SEC" => "time.h",
};

/// Collects every identifier a module refers to and returns the headers
/// declaring them, sorted and without repeats.
pub fn infer(elements: &[Element]) -> Vec<&'static str> {
    let mut seen = Collector::default();
    for element in elements {
        seen.element(element);
    }
    seen.headers.into_iter().collect()
}

#[derive(Default)]
struct Collector {
    headers: BTreeSet<&'static str>,
}

impl Collector {
    fn name(&mut self, name: &str) {
        if let Some(header) = HEADERS.get(name) {
            self.headers.insert(*header);
        }
    }

    fn element(&mut self, element: &Element) {
        match element {
            Element::Typedef(t) => {
                self.ty(&t.ty);
                self.form(&t.form);
            }
            Element::StructDef(s) => s.fields.iter().for_each(|d| self.declaration(d)),
            Element::EnumDef(e) => e
                .variants
                .iter()
                .filter_map(|v| v.value.as_ref())
                .for_each(|v| self.expr(v)),
            Element::Function(f) => self.function(f),
            Element::Variable(d) => self.declaration(d),
            Element::Import(_)
            | Element::Include(_)
            | Element::Macro(_)
            | Element::TypeDirective(_)
            | Element::Link(_)
            | Element::StructForward(_) => {}
        }
    }

    fn function(&mut self, function: &Function) {
        self.ty(&function.ty);
        self.form(&function.form);
        for stmt in function.body.iter().flatten() {
            self.stmt(stmt);
        }
    }

    fn ty(&mut self, ty: &Type) {
        for part in &ty.parts {
            match part {
                TypePart::Keyword(_) => {}
                TypePart::Name(name) => self.name(name),
                TypePart::Record(Record { body, .. }) => match body {
                    Some(RecordBody::Fields(fields)) => fields.iter().for_each(|d| self.declaration(d)),
                    Some(RecordBody::Enumerators(variants)) => variants
                        .iter()
                        .filter_map(|v| v.value.as_ref())
                        .for_each(|v| self.expr(v)),
                    None => {}
                },
            }
        }
    }

    // The declared name itself is not a reference.
    fn form(&mut self, form: &Form) {
        if let FormCore::Nested(inner) = &form.core {
            self.form(inner);
        }
        for modifier in &form.modifiers {
            match modifier {
                Modifier::Array(Some(size)) => self.expr(size),
                Modifier::Array(None) => {}
                Modifier::Params(params) => {
                    for param in &params.params {
                        self.ty(&param.ty);
                        self.form(&param.form);
                    }
                }
            }
        }
    }

    fn type_name(&mut self, type_name: &TypeName) {
        self.ty(&type_name.ty);
        self.form(&type_name.form);
    }

    fn declaration(&mut self, declaration: &Declaration) {
        self.ty(&declaration.ty);
        for declarator in &declaration.declarators {
            self.form(&declarator.form);
            if let Some(init) = &declarator.init {
                self.expr(init);
            }
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(stmts) => stmts.iter().for_each(|s| self.stmt(s)),
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                self.expr(cond);
                self.stmt(then);
                if let Some(otherwise) = otherwise {
                    self.stmt(otherwise);
                }
            }
            Stmt::While { cond, body } | Stmt::DoWhile { body, cond } => {
                self.expr(cond);
                self.stmt(body);
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                match init {
                    Some(ForInit::Declaration(d)) => self.declaration(d),
                    Some(ForInit::Expr(e)) => self.expr(e),
                    None => {}
                }
                cond.iter().chain(step.iter()).for_each(|e| self.expr(e));
                self.stmt(body);
            }
            Stmt::Switch { value, cases } => {
                self.expr(value);
                for case in cases {
                    if let Some(label) = &case.label {
                        self.expr(label);
                    }
                    case.body.iter().for_each(|s| self.stmt(s));
                }
            }
            Stmt::Return(value) => value.iter().for_each(|e| self.expr(e)),
            Stmt::Defer(e) | Stmt::Expr(e) => self.expr(e),
            Stmt::Declaration(d) => self.declaration(d),
            Stmt::Break | Stmt::Continue | Stmt::Empty => {}
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Binary(BinaryOp::Member | BinaryOp::PtrMember, lhs, rhs) => {
                self.expr(lhs);
                self.member(rhs);
            }
            Expr::Binary(_, lhs, rhs) => {
                self.expr(lhs);
                self.expr(rhs);
            }
            Expr::Conditional(cond, then, otherwise) => {
                self.expr(cond);
                self.expr(then);
                self.expr(otherwise);
            }
            Expr::Prefix(_, e) | Expr::Postfix(_, e) | Expr::SizeofExpr(e) => self.expr(e),
            Expr::Cast(ty, e) => {
                self.type_name(ty);
                self.expr(e);
            }
            Expr::SizeofType(ty) => self.type_name(ty),
            Expr::Ident(name) => self.name(name),
            Expr::Literal(_) => {}
            Expr::Call(callee, args) => {
                self.expr(callee);
                args.iter().for_each(|a| self.expr(a));
            }
            Expr::Index(base, index) => {
                self.expr(base);
                self.expr(index);
            }
            Expr::ArrayLiteral(entries) => {
                for entry in entries {
                    if let Some(index) = &entry.index {
                        self.expr(index);
                    }
                    self.expr(&entry.value);
                }
            }
            Expr::StructLiteral(members) => members.iter().for_each(|m| self.expr(&m.value)),
        }
    }

    /// The right side of `.`/`->`: skip the member name itself but keep
    /// looking inside call arguments and index expressions hanging off it.
    fn member(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(_) => {}
            Expr::Call(callee, args) => {
                self.member(callee);
                args.iter().for_each(|a| self.expr(a));
            }
            Expr::Index(base, index) => {
                self.member(base);
                self.expr(index);
            }
            Expr::Postfix(_, e) => self.member(e),
            other => self.expr(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::parser::{parse_source, TypeNames};
    use test_log::test;

    fn headers(source: &str) -> Vec<&'static str> {
        let module = parse_source(source, &mut TypeNames::with_standard(), Path::new("t.c")).unwrap();
        infer(&module.elements)
    }

    #[test]
    fn calls_types_and_constants() {
        let found = headers(
            "size_t count(const char *s) { return strlen(s); }\nint main(void) { printf(\"%d\\n\", INT_MAX); return EXIT_SUCCESS; }",
        );
        assert_eq!(found, vec!["limits.h", "stddef.h", "stdio.h", "stdlib.h", "string.h"]);
    }

    #[test]
    fn sorted_and_deduplicated() {
        let found = headers("void f(void) { free(malloc(1)); free(0); }");
        assert_eq!(found, vec!["stdlib.h"]);
    }

    #[test]
    fn member_names_are_not_references() {
        let found = headers("struct s { int time; };\nint f(struct s *p) { return p->time + (*p).time; }");
        assert!(found.is_empty());
    }

    #[test]
    fn every_standard_type_has_a_header() {
        for name in STANDARD_TYPES.iter() {
            assert!(HEADERS.contains_key(*name), "{} has no header", name);
        }
    }

    #[test]
    fn nothing_for_plain_code() {
        assert!(headers("int add(int a, int b) { return a + b; }").is_empty());
    }
}
