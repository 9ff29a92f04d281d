mod defer;
mod headers;
mod hoist;
mod structs;
mod synopsis;

pub use headers::{infer as infer_headers, HEADERS, STANDARD_TYPES};
pub use hoist::{add_prototypes, dedup, hoist};
pub use synopsis::{flatten, synopsis};

use crate::error::Result;
use crate::parser::{Element, Module};

/// A module ready for emission plus the libraries its `#link` lines asked
/// for.
#[derive(Clone, Debug, PartialEq)]
pub struct Lowered {
    pub module: Module,
    pub links: Vec<String>,
}

/// Runs the lowering passes over a resolved module: import flattening, defer
/// rewriting, struct extraction, header inference, hoisting and
/// deduplication. The input is left untouched.
pub fn lower(module: &Module) -> Result<Lowered> {
    let mut links = vec![];
    let elements = flatten(module.elements.clone())?
        .into_iter()
        .filter_map(|element| match element {
            Element::Link(name) => {
                if !links.contains(&name) {
                    links.push(name);
                }
                None
            }
            Element::TypeDirective(_) => None,
            other => Some(other),
        })
        .map(|element| match element {
            Element::Function(mut f) => {
                defer::rewrite(&mut f);
                Element::Function(f)
            }
            other => other,
        })
        .collect::<Vec<_>>();

    let elements = structs::extract(elements);

    let headers = infer_headers(&elements);
    let mut elements = headers
        .iter()
        .map(|h| Element::Include(h.to_string()))
        .chain(elements)
        .collect::<Vec<_>>();

    add_prototypes(&mut elements);
    let elements = dedup(hoist(elements))?;

    log::debug!(
        "lowered {}: {} elements, headers {:?}, links {:?}",
        module.name,
        elements.len(),
        headers,
        links
    );

    Ok(Lowered {
        module: Module {
            name: module.name.clone(),
            path: module.path.clone(),
            elements,
            type_names: module.type_names.clone(),
        },
        links,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::codegen::format_module;
    use crate::parser::{parse_source, TypeNames};
    use test_log::test;

    fn lower_source(source: &str) -> Lowered {
        let module = parse_source(source, &mut TypeNames::with_standard(), Path::new("main.c")).unwrap();
        lower(&module).unwrap()
    }

    #[test]
    fn full_pipeline_output() {
        let lowered = lower_source(
            "#link m\n\
             #type opaque_t\n\
             typedef struct { opaque_t *handle; double scale; } ctx_t;\n\
             void run(ctx_t *c) { defer free(c); c->scale = sqrt(c->scale); }\n\
             int main(void) { run(0); return 0; }\n",
        );
        assert_eq!(lowered.links, vec!["m".to_string()]);
        assert_eq!(
            format_module(&lowered.module),
            "#include <math.h>\n\
             #include <stdlib.h>\n\
             struct __ctx_t_struct;\n\
             typedef struct __ctx_t_struct ctx_t;\n\
             struct __ctx_t_struct {\n\topaque_t *handle;\n\tdouble scale;\n};\n\
             void run(ctx_t *c);\n\
             int main(void);\n\
             \n\
             void run(ctx_t *c) {\n\tc->scale = sqrt(c->scale);\n\tfree(c);\n\treturn;\n}\n\
             \n\
             int main(void) {\n\trun(0);\n\treturn 0;\n}\n"
        );
    }

    #[test]
    fn lowering_does_not_touch_the_input() {
        let module = parse_source("void f(void) { defer g(); }", &mut TypeNames::new(), Path::new("t.c")).unwrap();
        let before = module.clone();
        lower(&module).unwrap();
        assert_eq!(module, before);
    }
}
