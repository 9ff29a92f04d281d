use crate::error::{Error, Result};
use crate::parser::{Element, Import, Module};

/// The part of `module` an importer gets to see: macros, `#type` names, public
/// type definitions, every struct forward declaration and prototypes of the
/// public functions. Imports are expanded in place.
pub fn synopsis(module: &Module) -> Result<Vec<Element>> {
    let mut out = vec![];
    for element in &module.elements {
        match element {
            Element::Import(import) => out.extend(expand(import)?),
            Element::Macro(_) | Element::TypeDirective(_) | Element::StructForward(_) => {
                out.push(element.clone())
            }
            Element::Typedef(t) if t.public => out.push(element.clone()),
            Element::StructDef(s) if s.public => out.push(element.clone()),
            Element::EnumDef(e) if e.public => out.push(element.clone()),
            Element::Function(f) if f.public => out.push(Element::Function(f.forward())),
            _ => {}
        }
    }
    Ok(out)
}

fn expand(import: &Import) -> Result<Vec<Element>> {
    match &import.module {
        Some(module) => synopsis(module),
        None => Err(Error::UnresolvedImport {
            path: import.path.clone(),
        }),
    }
}

/// Replaces each import with the synopsis of what it resolved to.
pub fn flatten(elements: Vec<Element>) -> Result<Vec<Element>> {
    let mut out = Vec::with_capacity(elements.len());
    for element in elements {
        match element {
            Element::Import(import) => {
                let expanded = expand(&import)?;
                log::trace!("import \"{}\" expands to {} elements", import.path, expanded.len());
                out.extend(expanded);
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::{path::Path, rc::Rc};

    use super::*;
    use crate::parser::{parse_source, TypeNames};
    use test_log::test;

    fn module(source: &str) -> Module {
        parse_source(source, &mut TypeNames::new(), Path::new("lib.c")).unwrap()
    }

    #[test]
    fn only_public_surface_is_visible() {
        let lib = module(
            "#define LIMIT 4\n\
             typedef int hidden_t;\n\
             pub typedef int shown_t;\n\
             struct list;\n\
             struct secret { int x; };\n\
             pub enum mode { ON, OFF };\n\
             static int helper(void) { return 1; }\n\
             pub int api(int x) { return helper() + x; }\n\
             int counter = 0;\n",
        );
        let visible = synopsis(&lib).unwrap();
        assert_eq!(visible.len(), 5);
        assert!(matches!(&visible[0], Element::Macro(_)));
        assert!(matches!(&visible[1], Element::Typedef(t) if t.name() == Some("shown_t")));
        assert!(matches!(&visible[2], Element::StructForward(_)));
        assert!(matches!(&visible[3], Element::EnumDef(_)));
        assert!(matches!(&visible[4], Element::Function(f) if f.body.is_none() && f.name() == Some("api")));
    }

    #[test]
    fn unresolved_import_is_an_error() {
        let main = module("import \"missing\"\nint main(void) { return 0; }");
        let err = flatten(main.elements).unwrap_err();
        assert!(matches!(err, Error::UnresolvedImport { path } if path == "missing"));
    }

    #[test]
    fn imports_expand_transitively() {
        let inner = Rc::new(module("pub typedef int inner_t;"));
        let mut outer = module("import \"inner\"\npub int outer(void) { return 0; }");
        let Element::Import(import) = &mut outer.elements[0] else {
            panic!("expected an import");
        };
        import.module = Some(inner);
        let visible = synopsis(&outer).unwrap();
        assert!(matches!(&visible[0], Element::Typedef(t) if t.name() == Some("inner_t")));
        assert!(matches!(&visible[1], Element::Function(_)));
    }
}
