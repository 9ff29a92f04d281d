use std::{
    env,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use crate::codegen::format_module;
use crate::config::Config;
use crate::deptree;
use crate::error::{Error, Result};
use crate::resolver::Resolver;
use crate::translator::lower;

/// Flags every backend invocation gets.
pub const BACKEND_FLAGS: [&str; 7] = [
    "-Wall",
    "-Wextra",
    "-Werror",
    "-pedantic",
    "-pedantic-errors",
    "-fmax-errors=3",
    "-g",
];

/// Lowered C for every module reachable from `path`, imports first.
pub struct Translation {
    /// Root module name, the default output name.
    pub name: String,
    /// `(module name, C source)` per module.
    pub units: Vec<(String, String)>,
    /// Libraries requested with `#link`, without repeats.
    pub links: Vec<String>,
}

pub fn translate(config: &Config, path: &Path) -> Result<Translation> {
    let mut resolver = Resolver::new(config.clone());
    let root = resolver.resolve(path)?;

    let mut units = vec![];
    let mut links: Vec<String> = vec![];
    for module in resolver.modules() {
        let lowered = lower(module)?;
        for link in lowered.links {
            if !links.contains(&link) {
                links.push(link);
            }
        }
        units.push((module.name.clone(), format_module(&lowered.module)));
    }

    Ok(Translation {
        name: root.name.clone(),
        units,
        links,
    })
}

/// Arguments for the backend compiler, after the program name.
pub fn backend_args(files: &[PathBuf], output: &str, links: &[String]) -> Vec<OsString> {
    let mut args = BACKEND_FLAGS.iter().map(OsString::from).collect::<Vec<_>>();
    args.extend(files.iter().map(|f| f.as_os_str().to_owned()));
    args.push("-o".into());
    args.push(output.into());
    args.extend(links.iter().map(|l| OsString::from(format!("-l{}", l))));
    args
}

/// Translates `path`, writes one temporary `.c` file per module and runs the
/// backend compiler on them. A failing backend becomes [`Error::Backend`]
/// carrying its exit status.
pub fn build(config: &Config, path: &Path, output: Option<&str>) -> Result<()> {
    let translation = translate(config, path)?;
    let output = output.unwrap_or(&translation.name).to_string();

    let dir = tempfile::Builder::new().prefix("modc-").tempdir()?;
    let mut files = vec![];
    for (i, (name, source)) in translation.units.iter().enumerate() {
        let file = dir.path().join(format!("{}_{}.c", name, i));
        fs::write(&file, source)?;
        files.push(file);
    }

    let args = backend_args(&files, &output, &translation.links);
    log::debug!("running {} {:?}", config.cc, args);
    let status = Command::new(&config.cc).args(&args).status()?;
    if !status.success() {
        return Err(Error::Backend {
            code: status.code().unwrap_or(1),
        });
    }
    Ok(())
}

/// Lowered C for a single file or package.
pub fn emit_file(config: &Config, path: &Path) -> Result<String> {
    let mut resolver = Resolver::new(config.clone());
    let module = resolver.resolve(path)?;
    Ok(format_module(&lower(&module)?.module))
}

/// Lowered C for source text that is not on disk, such as standard input.
/// Its imports resolve against the working directory.
pub fn emit_source(config: &Config, source: &str) -> Result<String> {
    let mut resolver = Resolver::new(config.clone());
    let module = resolver.resolve_source(source, Path::new("<stdin>"), &env::current_dir()?)?;
    Ok(format_module(&lower(&module)?.module))
}

pub fn deptree(config: &Config, path: &Path) -> Result<String> {
    let mut resolver = Resolver::new(config.clone());
    let root = resolver.resolve(path)?;
    Ok(deptree::render(&root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn backend_command_line() {
        let args = backend_args(
            &[PathBuf::from("/tmp/a_0.c"), PathBuf::from("/tmp/main_1.c")],
            "app",
            &["m".to_string(), "pthread".to_string()],
        );
        let args = args.iter().map(|a| a.to_string_lossy().into_owned()).collect::<Vec<_>>();
        assert_eq!(
            args,
            vec![
                "-Wall",
                "-Wextra",
                "-Werror",
                "-pedantic",
                "-pedantic-errors",
                "-fmax-errors=3",
                "-g",
                "/tmp/a_0.c",
                "/tmp/main_1.c",
                "-o",
                "app",
                "-lm",
                "-lpthread",
            ]
        );
    }

    #[test]
    fn translate_collects_links_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mathx.c"), "#link m\npub double half(double x) { return x / 2; }").unwrap();
        fs::write(
            dir.path().join("main.c"),
            "#link m\nimport \"./mathx\"\nint main(void) { return (int)half(4.0); }",
        )
        .unwrap();
        let translation = translate(&Config::default(), &dir.path().join("main.c")).unwrap();
        assert_eq!(translation.name, "main");
        assert_eq!(translation.links, vec!["m".to_string()]);
        let names = translation.units.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["mathx", "main"]);
        assert!(translation.units[1].1.contains("double half(double x);"));
    }

    #[test]
    fn emitted_source_gets_headers() {
        let out = emit_source(&Config::default(), "int main(void) { printf(\"hi\\n\"); return 0; }").unwrap();
        assert!(out.starts_with("#include <stdio.h>\n"));
        assert!(out.contains("int main(void)"));
    }

    #[test]
    fn backend_failure_is_relayed() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("main.c");
        fs::write(&main, "int main(void) { return 0; }").unwrap();
        let config = Config {
            cc: "false".to_string(),
            ..Config::default()
        };
        let err = build(&config, &main, Some("out")).unwrap_err();
        assert!(matches!(err, Error::Backend { code: 1 }));
        assert_eq!(err.exit_code(), 1);
    }
}
