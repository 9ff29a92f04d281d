mod package;

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

pub use package::{is_member, members, module_name};

use crate::config::{Config, STDLIB_ENV};
use crate::error::{Error, Result};
use crate::lexer::{Lexer, Token};
use crate::parser::{Element, Module, Parser, TypeNames};
use crate::prescan;

/// Type names an importer sees from `module`: its `#type` names and public
/// typedefs, plus whatever its own imports expose.
pub fn exported_type_names(module: &Module) -> Vec<String> {
    let mut names = vec![];
    for element in &module.elements {
        match element {
            Element::TypeDirective(name) => names.push(name.clone()),
            Element::Typedef(t) if t.public => names.extend(t.name().map(str::to_string)),
            Element::Import(import) => {
                if let Some(module) = &import.module {
                    names.extend(exported_type_names(module));
                }
            }
            _ => {}
        }
    }
    names
}

/// A lexed package member waiting to be parsed.
struct Member {
    path: PathBuf,
    tokens: Vec<Token>,
    own_names: Vec<String>,
    imports: HashMap<String, Rc<Module>>,
}

/// Turns paths into parsed modules, caching each by its canonical path for
/// the lifetime of one run.
#[derive(Debug)]
pub struct Resolver {
    config: Config,
    cache: HashMap<PathBuf, Rc<Module>>,
    order: Vec<Rc<Module>>,
    in_progress: Vec<PathBuf>,
}

impl Resolver {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cache: HashMap::new(),
            order: vec![],
            in_progress: vec![],
        }
    }

    /// Every module resolved so far, imports before their importers.
    pub fn modules(&self) -> &[Rc<Module>] {
        &self.order
    }

    /// Resolves a source file or package directory.
    pub fn resolve(&mut self, path: &Path) -> Result<Rc<Module>> {
        let path = fs::canonicalize(path)?;
        if let Some(module) = self.cache.get(&path) {
            log::trace!("cache hit for {}", path.display());
            return Ok(Rc::clone(module));
        }
        if let Some(start) = self.in_progress.iter().position(|p| *p == path) {
            let mut chain = self.in_progress[start..].to_vec();
            chain.push(path);
            return Err(Error::ImportCycle { chain });
        }

        self.in_progress.push(path.clone());
        let module = self.load(&path);
        self.in_progress.pop();

        let module = Rc::new(module?);
        self.cache.insert(path, Rc::clone(&module));
        self.order.push(Rc::clone(&module));
        Ok(module)
    }

    /// Resolves `import` as written in a file living in `from_dir`.
    ///
    /// `./x` and `../x` are relative to `from_dir`. Anything else is looked
    /// up under the standard-library root, then `from_dir`, then taken
    /// literally. Each candidate is tried as a package directory or `.c`
    /// file, then with `.c` appended.
    pub fn resolve_import(&mut self, import: &str, from_dir: &Path) -> Result<Rc<Module>> {
        let bases = if import.starts_with('.') {
            vec![from_dir.join(import)]
        } else {
            let mut bases = vec![];
            if let Some(root) = &self.config.stdlib_root {
                bases.push(root.join(import));
            }
            bases.push(from_dir.join(import));
            bases.push(PathBuf::from(import));
            bases
        };

        for base in bases {
            let mut with_suffix = base.clone().into_os_string();
            with_suffix.push(".c");
            let with_suffix = PathBuf::from(with_suffix);

            let as_is = base.is_dir() || (base.is_file() && base.extension().is_some_and(|e| e == "c"));
            let candidate = if as_is {
                Some(base)
            } else if with_suffix.is_file() {
                Some(with_suffix)
            } else {
                None
            };
            if let Some(candidate) = candidate {
                log::debug!("import \"{}\" -> {}", import, candidate.display());
                return self.resolve(&candidate);
            }
        }

        Err(Error::ImportResolution {
            import: import.to_string(),
            from: from_dir.to_path_buf(),
            env: STDLIB_ENV,
        })
    }

    /// Resolves source text that does not live on disk, such as standard
    /// input. Its imports resolve against `dir`. The result is not cached.
    pub fn resolve_source(&mut self, source: &str, path: &Path, dir: &Path) -> Result<Rc<Module>> {
        let module = self.build(path, dir, vec![(path.to_path_buf(), source.to_string())])?;
        let module = Rc::new(module);
        self.order.push(Rc::clone(&module));
        Ok(module)
    }

    /// Reads every member of `path`.
    fn load(&mut self, path: &Path) -> Result<Module> {
        let (files, dir) = if path.is_dir() {
            (members(path, &self.config.target_os)?, path.to_path_buf())
        } else {
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (vec![path.to_path_buf()], dir)
        };
        let mut sources = vec![];
        for file in files {
            let source = fs::read_to_string(&file)?;
            sources.push((file, source));
        }
        self.build(path, &dir, sources)
    }

    /// Pre-scans every member, resolves their imports, parses each member
    /// with the names its siblings and imports declare, then merges them.
    fn build(&mut self, path: &Path, dir: &Path, sources: Vec<(PathBuf, String)>) -> Result<Module> {
        let mut pending = vec![];
        for (file, source) in sources {
            let tokens = Lexer::tokenize(&source);
            let own_names = prescan::type_names(&tokens);
            let mut imports = HashMap::new();
            for import in prescan::imports(&tokens) {
                if !imports.contains_key(&import) {
                    let module = self.resolve_import(&import, dir)?;
                    imports.insert(import, module);
                }
            }
            pending.push(Member {
                path: file,
                tokens,
                own_names,
                imports,
            });
        }

        let imported_names = pending
            .iter()
            .flat_map(|m| m.imports.values())
            .flat_map(|module| exported_type_names(module))
            .collect::<Vec<_>>();

        let mut parsed = vec![];
        for (i, member) in pending.iter().enumerate() {
            let mut names = TypeNames::with_standard();
            names.supply(imported_names.iter().cloned());
            for (j, sibling) in pending.iter().enumerate() {
                if i != j {
                    names.supply(sibling.own_names.iter().cloned());
                }
            }

            let mut module = Parser::new(member.tokens.clone(), &mut names, &member.path).parse()?;
            for element in &mut module.elements {
                if let Element::Import(import) = element {
                    import.module = member.imports.get(&import.path).cloned();
                }
            }
            parsed.push(module);
        }

        let module = merge(module_name(path), path, parsed);
        log::debug!(
            "resolved {} from {} with {} elements",
            module.name,
            path.display(),
            module.elements.len()
        );
        Ok(module)
    }
}

/// Concatenates package members in order. An import of a module some earlier
/// member already imports is dropped.
fn merge(name: String, path: &Path, parts: Vec<Module>) -> Module {
    let mut module = Module::new(name, path);
    let mut imported = HashSet::new();
    for part in parts {
        for element in part.elements {
            if let Element::Import(import) = &element {
                let key = import
                    .module
                    .as_ref()
                    .map(|m| m.path.clone())
                    .unwrap_or_else(|| PathBuf::from(&import.path));
                if !imported.insert(key) {
                    continue;
                }
            }
            module.elements.push(element);
        }
        module.type_names.extend(part.type_names);
    }
    module
}
