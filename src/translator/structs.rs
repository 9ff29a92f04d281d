use crate::parser::{Element, RecordBody, RecordKind, StructDef, StructForward, TypePart, Typedef};

/// Splits every typedef of an inline struct or union body into a forward
/// declaration, the definition, and a typedef of the bare tag. Anonymous
/// bodies are tagged `__<alias>_struct`.
pub fn extract(elements: Vec<Element>) -> Vec<Element> {
    let mut out = Vec::with_capacity(elements.len());
    for element in elements {
        match element {
            Element::Typedef(t) => out.extend(split(t)),
            other => out.push(other),
        }
    }
    out
}

fn split(typedef: Typedef) -> Vec<Element> {
    let Some(alias) = typedef.name().map(str::to_string) else {
        return vec![Element::Typedef(typedef)];
    };
    let Typedef {
        public,
        mut ty,
        form,
    } = typedef;

    let inline = ty.parts.iter_mut().find_map(|part| match part {
        TypePart::Record(record) if record.kind != RecordKind::Enum => match record.body.take() {
            Some(RecordBody::Fields(fields)) => Some((record, fields)),
            other => {
                record.body = other;
                None
            }
        },
        _ => None,
    });
    let Some((record, fields)) = inline else {
        return vec![Element::Typedef(Typedef { public, ty, form })];
    };

    let kind = record.kind;
    let tag = record
        .name
        .get_or_insert_with(|| format!("__{}_struct", alias))
        .clone();
    log::trace!("typedef {} splits off {} {}", alias, kind.as_str(), tag);

    vec![
        Element::StructForward(StructForward {
            kind,
            name: tag.clone(),
        }),
        Element::StructDef(StructDef {
            public,
            kind,
            name: tag,
            fields,
        }),
        Element::Typedef(Typedef { public, ty, form }),
    ]
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::codegen::format_element;
    use crate::parser::{parse_source, TypeNames};
    use test_log::test;

    fn split_source(source: &str) -> Vec<String> {
        let module = parse_source(source, &mut TypeNames::new(), Path::new("t.c")).unwrap();
        extract(module.elements).iter().map(format_element).collect()
    }

    #[test]
    fn anonymous_struct_gets_synthesized_tag() {
        assert_eq!(
            split_source("typedef struct { int x; } point_t;"),
            vec![
                "struct __point_t_struct;",
                "struct __point_t_struct {\n\tint x;\n};",
                "typedef struct __point_t_struct point_t;",
            ]
        );
    }

    #[test]
    fn named_body_keeps_its_tag() {
        assert_eq!(
            split_source("typedef struct node { struct node *next; } node_t;"),
            vec![
                "struct node;",
                "struct node {\n\tstruct node *next;\n};",
                "typedef struct node node_t;",
            ]
        );
    }

    #[test]
    fn unions_split_too() {
        assert_eq!(split_source("typedef union { int i; float f; } num;")[0], "union __num_struct;");
    }

    #[test]
    fn other_typedefs_are_untouched() {
        assert_eq!(
            split_source("typedef struct list list_t;\ntypedef enum { A, B } ab;"),
            vec!["typedef struct list list_t;", "typedef enum {\n\tA,\n\tB\n} ab;"]
        );
    }
}
