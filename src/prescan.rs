//! Finds the type names and imports a file declares by looking at its tokens
//! only. The resolver uses this to hand each file of a package the names its
//! siblings declare before anything is parsed.

use crate::lexer::{Keyword, Symbol, Token, TokenKind};

/// Names introduced by `typedef` and `#type`, in source order.
pub fn type_names(tokens: &[Token]) -> Vec<String> {
    let mut names = vec![];
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i].kind {
            TokenKind::Keyword(Keyword::Typedef) => {
                let (name, next) = typedef_name(tokens, i + 1);
                names.extend(name);
                i = next;
            }
            TokenKind::Macro(line) => {
                let mut words = line.trim_start_matches('#').split_whitespace();
                if let (Some("type"), Some(name)) = (words.next(), words.next()) {
                    names.push(name.to_string());
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    log::trace!("prescan found type names {:?}", names);
    names
}

/// Import paths, in source order.
pub fn imports(tokens: &[Token]) -> Vec<String> {
    tokens
        .windows(2)
        .filter_map(|pair| match (&pair[0].kind, &pair[1].kind) {
            (TokenKind::Keyword(Keyword::Import), TokenKind::String(path)) => Some(path.clone()),
            _ => None,
        })
        .collect()
}

/// Name declared by the typedef whose body starts at `start`, and the index
/// just past its `;`.
fn typedef_name(tokens: &[Token], start: usize) -> (Option<String>, usize) {
    let end = statement_end(tokens, start);
    let body = &tokens[start..end];
    let next = (end + 1).min(tokens.len());

    // typedef struct { ... } name;
    if let Some(open) = body.iter().position(|t| t.is_symbol(Symbol::LBrace)) {
        let after = skip_group(body, open, Symbol::LBrace, Symbol::RBrace);
        let name = body[after..].iter().find_map(|t| t.word()).map(str::to_string);
        return (name, next);
    }

    // typedef int (*handler)(int); drops the trailing parameter list first
    let mut rest = body;
    if rest.last().is_some_and(|t| t.is_symbol(Symbol::RParen)) {
        rest = &rest[..open_of_trailing_group(rest)];
    }
    let name = rest.iter().rev().find_map(|t| t.word()).map(str::to_string);
    (name, next)
}

/// Index of the `;` ending the declaration that starts at `start`, ignoring
/// semicolons inside braces.
fn statement_end(tokens: &[Token], start: usize) -> usize {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(start) {
        match token.kind {
            TokenKind::Symbol(Symbol::LBrace) => depth += 1,
            TokenKind::Symbol(Symbol::RBrace) => depth = depth.saturating_sub(1),
            TokenKind::Symbol(Symbol::Semicolon) if depth == 0 => return i,
            TokenKind::Eof => return i,
            _ => {}
        }
    }
    tokens.len()
}

/// Index just past the group opened at `open`.
fn skip_group(tokens: &[Token], open: usize, left: Symbol, right: Symbol) -> usize {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.is_symbol(left) {
            depth += 1;
        } else if token.is_symbol(right) {
            depth -= 1;
            if depth == 0 {
                return i + 1;
            }
        }
    }
    tokens.len()
}

/// Index of the `(` matching the final `)`.
fn open_of_trailing_group(tokens: &[Token]) -> usize {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().rev() {
        if token.is_symbol(Symbol::RParen) {
            depth += 1;
        } else if token.is_symbol(Symbol::LParen) {
            depth -= 1;
            if depth == 0 {
                return i;
            }
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use test_log::test;

    fn names(source: &str) -> Vec<String> {
        type_names(&Lexer::tokenize(source))
    }

    #[test]
    fn simple_and_pointer_typedefs() {
        assert_eq!(
            names("typedef unsigned long u64;\ntypedef char *string;"),
            vec!["u64", "string"]
        );
    }

    #[test]
    fn struct_bodies_are_skipped() {
        assert_eq!(
            names("typedef struct { struct { int a; } inner; int b; } outer_t;\ntypedef int after;"),
            vec!["outer_t", "after"]
        );
    }

    #[test]
    fn function_typedefs() {
        assert_eq!(
            names("typedef int (*handler)(int, char *);\ntypedef void callback(void *data);"),
            vec!["handler", "callback"]
        );
    }

    #[test]
    fn type_directive() {
        assert_eq!(names("#type FILE\n#define X 1\nint x;"), vec!["FILE"]);
    }

    #[test]
    fn ignores_everything_else() {
        assert!(names("struct s { int a; };\nint f(void) { return 0; }").is_empty());
    }

    #[test]
    fn finds_imports() {
        let tokens = Lexer::tokenize("import \"./util\"\nimport \"io\";\nint x;");
        assert_eq!(imports(&tokens), vec!["./util", "io"]);
    }
}
