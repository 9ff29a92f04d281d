use std::{fs, path::Path};

use modc::codegen::format_module;
use modc::driver;
use modc::lexer::{Lexer, TokenKind};
use modc::parser::{parse_source, Element, TypePart, TypeNames};
use modc::resolver::Resolver;
use modc::translator::{dedup, hoist, lower};
use modc::{Config, Error};

fn write(dir: &Path, name: &str, source: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, source).unwrap();
}

fn emit(source: &str) -> String {
    driver::emit_source(&Config::default(), source).unwrap()
}

const PROGRAM: &str = "\
typedef struct { int x; int y; } point;
enum color { RED, GREEN = 2, BLUE };
static int area(point *p) {
    if (p->x < 0 || p->y < 0 && p->x != p->y) return -1;
    for (int i = 0; i < 3; i++) { p->x += i; }
    return p->x * (p->y + 1);
}
int main(int argc, char **argv) {
    point p = { .x = 1, .y = 2 };
    unsigned long n = sizeof(point) << 2;
    char *name = argc > 1 ? argv[1] : \"none\";
    switch (argc) {
    case 1: n++; break;
    default: n = (unsigned long)area(&p);
    }
    return (int)n + (name[0] == 'n');
}
";

#[test]
fn printed_source_lexes_cleanly_and_reprints_identically() {
    let first = parse_source(PROGRAM, &mut TypeNames::with_standard(), Path::new("main.c")).unwrap();
    let printed = format_module(&first);
    assert!(Lexer::tokenize(&printed)
        .iter()
        .all(|t| !matches!(t.kind, TokenKind::Error(_))));

    let second = parse_source(&printed, &mut TypeNames::with_standard(), Path::new("main.c")).unwrap();
    assert_eq!(format_module(&second), printed);
}

#[test]
fn lowered_output_is_a_fixed_point_of_hoist_and_dedup() {
    let module = parse_source(PROGRAM, &mut TypeNames::with_standard(), Path::new("main.c")).unwrap();
    let lowered = lower(&module).unwrap().module;
    let again = dedup(hoist(lowered.elements.clone())).unwrap();
    assert_eq!(again, lowered.elements);
}

#[test]
fn defers_run_in_registration_order_before_each_exit() {
    let out = emit(
        "int work(int fail) {\n\
             defer first();\n\
             defer second();\n\
             if (fail) return 1;\n\
             step();\n\
             return 0;\n\
         }",
    );
    assert!(out.contains("\tif (fail) {\n\t\tfirst();\n\t\tsecond();\n\t\treturn 1;\n\t}\n"));
    assert!(out.contains("\tstep();\n\tfirst();\n\tsecond();\n\treturn 0;\n"));
    assert!(!out.contains("defer"));
}

#[test]
fn parentheses_follow_precedence() {
    let out = emit("int main(void) { int a = (1 + 2) * 3; int b = 1 + (2 * 3); int c = (1 - 2) - 3; int d = 1 - (2 - 3); return a + b + c + d; }");
    assert!(out.contains("int a = (1 + 2) * 3;"));
    assert!(out.contains("int b = 1 + 2 * 3;"));
    assert!(out.contains("int c = 1 - 2 - 3;"));
    assert!(out.contains("int d = 1 - (2 - 3);"));
}

#[test]
fn anonymous_typedef_is_split_into_a_tagged_struct() {
    let out = emit("typedef struct { int x; } point;\nint main(void) { point p; p.x = 0; return p.x; }");
    assert!(out.contains("struct __point_struct;\n"));
    assert!(out.contains("typedef struct __point_struct point;\n"));
    assert!(out.contains("struct __point_struct {\n\tint x;\n};\n"));
    assert!(!out.contains("typedef struct {"));
}

#[test]
fn package_members_share_type_names() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "handles/types.c", "pub typedef int handle_t;\n");
    write(
        dir.path(),
        "handles/open.c",
        "pub handle_t open_handle(void) { return 3; }\n",
    );
    write(
        dir.path(),
        "main.c",
        "import \"./handles\"\nint main(void) { handle_t h = open_handle(); return h; }\n",
    );

    let out = driver::emit_file(&Config::default(), &dir.path().join("main.c")).unwrap();
    assert!(out.contains("typedef int handle_t;\n"));
    assert!(out.contains("handle_t open_handle(void);\n"));
    assert!(out.contains("\thandle_t h = open_handle();\n"));
}

#[test]
fn package_variable_takes_its_siblings_typedef() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pkg/a.c", "typedef int foo_t;\n");
    write(dir.path(), "pkg/b.c", "foo_t x;\n");

    let module = Resolver::new(Config::default())
        .resolve(&dir.path().join("pkg"))
        .unwrap();
    let Element::Variable(x) = &module.elements[1] else {
        panic!("expected a variable, got {:?}", module.elements[1]);
    };
    assert_eq!(x.ty.parts, vec![TypePart::Name("foo_t".to_string())]);
    assert_eq!(x.declarators[0].form.name(), Some("x"));
}

fn diamond(dir: &Path) {
    write(dir, "base.c", "pub typedef struct { int v; } box;\n");
    write(dir, "left.c", "import \"./base\"\npub int left(box b) { return b.v; }\n");
    write(dir, "right.c", "import \"./base\"\npub int right(box b) { return -b.v; }\n");
    write(
        dir,
        "main.c",
        "import \"./left\"\nimport \"./right\"\nint main(void) { return 0; }\n",
    );
}

#[test]
fn diamond_imports_are_emitted_once() {
    let dir = tempfile::tempdir().unwrap();
    diamond(dir.path());

    let translation = driver::translate(&Config::default(), &dir.path().join("main.c")).unwrap();
    let names = translation.units.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["base", "left", "right", "main"]);

    let main = &translation.units[3].1;
    assert_eq!(main.matches("typedef struct __box_struct box;").count(), 1);
    assert_eq!(main.matches("struct __box_struct {").count(), 1);
    assert!(main.contains("int left(box b);\n"));
    assert!(main.contains("int right(box b);\n"));
}

#[test]
fn deptree_draws_every_import_path() {
    let dir = tempfile::tempdir().unwrap();
    diamond(dir.path());
    let tree = driver::deptree(&Config::default(), &dir.path().join("main.c")).unwrap();
    assert_eq!(tree, "main\n├ left\n│ └ base\n└ right\n  └ base\n");
}

#[test]
fn import_cycles_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.c", "import \"./b\"\nint a(void) { return 0; }\n");
    write(dir.path(), "b.c", "import \"./a\"\nint b(void) { return 0; }\n");
    let err = driver::emit_file(&Config::default(), &dir.path().join("a.c")).unwrap_err();
    assert!(matches!(err, Error::ImportCycle { .. }));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn syntax_errors_carry_the_file_and_position() {
    let err = driver::emit_source(&Config::default(), "int main(void) { return 1 +; }").unwrap_err();
    assert!(matches!(err, Error::Syntax { .. }));
    assert!(err.to_string().starts_with("<stdin>:1:"));
}
