use std::collections::{HashMap, HashSet};

use crate::codegen::format_element;
use crate::error::{Error, Result};
use crate::parser::Element;

fn tier(element: &Element) -> u8 {
    match element {
        Element::Include(_) | Element::Macro(_) => 0,
        Element::StructForward(_) => 1,
        Element::Typedef(_) => 2,
        Element::StructDef(_) | Element::EnumDef(_) => 3,
        Element::Function(f) if f.body.is_none() => 4,
        _ => 5,
    }
}

/// Stable sort into declare-before-use order: includes and macros, struct
/// forwards, typedefs, struct and enum definitions, prototypes, the rest.
pub fn hoist(mut elements: Vec<Element>) -> Vec<Element> {
    elements.sort_by_key(tier);
    elements
}

/// Appends a prototype for every function definition.
pub fn add_prototypes(elements: &mut Vec<Element>) {
    let prototypes = elements
        .iter()
        .filter_map(|e| match e {
            Element::Function(f) if f.body.is_some() => Some(Element::Function(f.forward())),
            _ => None,
        })
        .collect::<Vec<_>>();
    elements.extend(prototypes);
}

/// What a definition defines, for spotting two different bodies under one
/// name.
fn defined_name(element: &Element) -> Option<String> {
    match element {
        Element::Typedef(t) => t.name().map(|n| format!("typedef {}", n)),
        Element::StructDef(s) => Some(format!("{} {}", s.kind.as_str(), s.name)),
        Element::EnumDef(e) => Some(format!("enum {}", e.name)),
        _ => None,
    }
}

fn is_deduplicated(element: &Element) -> bool {
    match element {
        Element::Typedef(_)
        | Element::StructDef(_)
        | Element::StructForward(_)
        | Element::EnumDef(_)
        | Element::Include(_) => true,
        Element::Function(f) => f.body.is_none(),
        _ => false,
    }
}

/// Keeps the first of every group of declarations that render to the same
/// text. Two different definitions of one type name are an error.
pub fn dedup(elements: Vec<Element>) -> Result<Vec<Element>> {
    let mut seen = HashSet::new();
    let mut definitions: HashMap<String, String> = HashMap::new();
    let mut out = Vec::with_capacity(elements.len());

    for element in elements {
        if !is_deduplicated(&element) {
            out.push(element);
            continue;
        }
        let text = format_element(&element);
        if seen.contains(&text) {
            continue;
        }
        if let Some(name) = defined_name(&element) {
            if let Some(first) = definitions.get(&name) {
                return Err(Error::ConflictingDefinition {
                    name,
                    first: first.clone(),
                    second: text,
                });
            }
            definitions.insert(name, text.clone());
        }
        seen.insert(text);
        out.push(element);
    }
    Ok(out)
}
