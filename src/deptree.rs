use crate::parser::Module;

/// Draws the import graph below `module`, one module per line:
///
/// ```text
/// main
/// ├ list
/// │ └ alloc
/// └ io
/// ```
pub fn render(module: &Module) -> String {
    let mut out = format!("{}\n", module.name);
    children(module, "", &mut out);
    out
}

fn children(module: &Module, prefix: &str, out: &mut String) {
    let imports = module.imports().collect::<Vec<_>>();
    for (i, import) in imports.iter().enumerate() {
        let last = i + 1 == imports.len();
        out.push_str(prefix);
        out.push_str(if last { "└ " } else { "├ " });
        match &import.module {
            Some(child) => {
                out.push_str(&child.name);
                out.push('\n');
                let prefix = format!("{}{}", prefix, if last { "  " } else { "│ " });
                children(child, &prefix, out);
            }
            None => {
                out.push_str(&import.path);
                out.push('\n');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::lexer::Position;
    use crate::parser::{Element, Import};
    use test_log::test;

    fn module(name: &str, imports: Vec<Rc<Module>>) -> Rc<Module> {
        let mut module = Module::new(name, format!("/{}.c", name));
        for import in imports {
            module.elements.push(Element::Import(Import {
                path: format!("./{}", import.name),
                pos: Position::new(1, 1),
                module: Some(import),
            }));
        }
        Rc::new(module)
    }

    #[test]
    fn siblings_and_continuation_lines() {
        let d = module("D", vec![]);
        let b = module("B", vec![d]);
        let c = module("C", vec![]);
        let a = module("A", vec![b, c]);
        assert_eq!(render(&a), "A\n├ B\n│ └ D\n└ C\n");
    }

    #[test]
    fn last_child_continues_with_spaces() {
        let e = module("E", vec![]);
        let c = module("C", vec![e]);
        let a = module("A", vec![c]);
        assert_eq!(render(&a), "A\n└ C\n  └ E\n");
    }

    #[test]
    fn no_imports() {
        assert_eq!(render(&module("solo", vec![])), "solo\n");
    }
}
