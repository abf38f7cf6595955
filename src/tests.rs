use std::fs;
use std::io;
use std::path::Path;

use super::*;
use crate::diag::{CompileContext, Diagnostic};
use crate::program::Program;

fn memory_loader(files: &[(&str, &str)]) -> MemoryLoader {
    let mut loader = MemoryLoader::new();
    for &(path, text) in files {
        loader.insert(path, text);
    }
    loader
}

/// Parse in-memory files, rooted at the first one.
pub(crate) fn program(files: &[(&str, &str)]) -> (Program, CompileContext) {
    let loader = memory_loader(files);
    let mut context = CompileContext::new();
    let program = parse_program(Path::new(files[0].0), &Config::default(), &loader, &mut context)
        .expect("root file is readable");
    match program {
        Some(program) => (program, context),
        None => panic!("parse failed: {:?}", messages(context.diagnostics())),
    }
}

/// Compile in-memory files, rooted at the first one.
pub(crate) fn compile_memory(files: &[(&str, &str)]) -> CompileResult {
    let loader = memory_loader(files);
    compile(Path::new(files[0].0), &Config::default(), &loader).expect("root file is readable")
}

pub(crate) fn messages(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics
        .iter()
        .map(|diagnostic| diagnostic.to_string())
        .collect()
}

#[test]
fn missing_root_file_is_an_error() {
    let loader = MemoryLoader::new();
    let result = compile(Path::new("nope.thrift"), &Config::default(), &loader);
    assert!(matches!(result, Err(Error::Read { .. })));
}

#[test]
fn parse_failure_skips_analysis() {
    let result = compile_memory(&[("main.thrift", "struct {")]);
    assert!(result.program.is_none());
    assert_eq!(result.analysis.completed, None);
    assert!(!result.succeeded());
    assert_eq!(
        messages(&result.diagnostics),
        ["main.thrift (line 1, col 8): expected struct name, but found '{'"]
    );
}

#[test]
fn realistic_schema_compiles() {
    let result = compile_memory(&[
        (
            "api/user.thrift",
            r#"
namespace * example.user
namespace go user

include "../common/types"

enum Role {
  GUEST,
  MEMBER = 10,
  ADMIN,
}

struct User {
  1: required types.Id id
  2: required string name
  3: optional list<Role> roles = [Role.MEMBER]
  4: map<string, string> labels = {}
}

exception NotFound {
  1: types.Id id
}

const User ANONYMOUS = {"id": 0, "name": "anonymous", "labels": {"kind": "guest"}}

service Users extends types.Base {
  User get(1: types.Id id) throws (1: NotFound missing),
  oneway void touch(1: types.Id id);
  list<User> find(1: i32 limit, 2: Role role)
}
"#,
        ),
        (
            "common/types.thrift",
            "typedef i64 Id\nservice Base {\n  void ping()\n}\n",
        ),
    ]);
    assert_eq!(messages(&result.diagnostics), Vec::<String>::new());
    assert!(result.succeeded());

    let program = result.program.as_ref().unwrap();
    assert_eq!(program.trees.len(), 2);
    assert_eq!(program.root().package, "user");
    let values = &result.analysis.values[program.root];
    assert_eq!(values.constants.len(), 1);
    assert_eq!(values.defaults.len(), 2);
}

#[test]
fn diagnostics_from_included_files_name_that_file() {
    let result = compile_memory(&[
        ("main.thrift", "include \"shared\"\nconst shared.T X = 1"),
        ("shared.thrift", "typedef Missing T"),
    ]);
    assert_eq!(
        messages(&result.diagnostics),
        ["shared.thrift (line 1, col 9): could not find any definition or package for name 'Missing'"]
    );
}

#[test]
fn colored_output_keeps_the_text() {
    let result = compile_memory(&[("main.thrift", "typedef Missing T")]);
    let mut plain = vec![];
    diag::print_diagnostics(&result.diagnostics, &mut plain, false).unwrap();
    let mut colored = vec![];
    diag::print_diagnostics(&result.diagnostics, &mut colored, true).unwrap();
    let plain = String::from_utf8(plain).unwrap();
    let colored = String::from_utf8(colored).unwrap();
    assert!(plain.starts_with("main.thrift (line 1, col 9):"));
    assert!(colored.contains("main.thrift (line 1, col 9):"));
    assert!(colored.ends_with("could not find any definition or package for name 'Missing'\n"));
}

// Each input writes test-files/output/{name}.errors when it has diagnostics.
#[test]
fn baseline() -> io::Result<()> {
    let test_dir = Path::new("test-files");
    let input_dir = test_dir.join("input");
    let expected_dir = test_dir.join("expected");
    let output_dir = test_dir.join("output");
    fs::create_dir_all(&expected_dir)?;
    match fs::remove_dir_all(&output_dir) {
        Err(error) if error.kind() != io::ErrorKind::NotFound => return Err(error),
        _ => {}
    }
    fs::create_dir_all(&output_dir)?;

    let config = Config {
        include_paths: vec![test_dir.join("include")],
    };

    for entry in input_dir.read_dir()? {
        let input_path = entry?.path();
        if input_path.extension() != Some(std::ffi::OsStr::new(program::EXTENSION)) {
            continue;
        }
        let name = input_path
            .file_stem()
            .expect("missing file name?")
            .to_str()
            .expect("not unicode file name?")
            .to_string();
        println!("testing {name}...");
        let result = match std::panic::catch_unwind(|| compile(&input_path, &config, &FsLoader)) {
            Err(panic) => {
                // panic!() may have a payload of either &str or String
                let output_path = output_dir.join(format!("{name}.panic"));
                if let Some(str) = panic.downcast_ref::<&str>() {
                    fs::write(output_path, str)?;
                } else if let Some(str) = panic.downcast_ref::<String>() {
                    fs::write(output_path, str)?;
                } else {
                    std::panic::panic_any(panic);
                }
                continue;
            }
            Ok(result) => result.map_err(io::Error::other)?,
        };

        if !result.diagnostics.is_empty() {
            let mut output = String::new();
            diag::write_diagnostics(&result.diagnostics, &mut output).map_err(io::Error::other)?;
            fs::write(output_dir.join(format!("{name}.errors")), output)?;
        }
    }

    let actual_names = read_file_names(&output_dir)?;
    let expected_names = read_file_names(&expected_dir)?;

    let (equal_names, added_names): (Vec<_>, _) = actual_names
        .iter()
        .partition(|name| expected_names.contains(name));
    let removed_names = expected_names
        .iter()
        .filter(|name| !actual_names.contains(name))
        .collect::<Vec<_>>();

    let mut result = Ok(());

    for name in equal_names {
        let actual = fs::read_to_string(output_dir.join(name))?;
        let expected = fs::read_to_string(expected_dir.join(name))?;
        if actual != expected {
            println!("changes in output {}:", name.to_string_lossy());
            for (line, diff) in diff::lines(&expected, &actual).iter().enumerate() {
                match diff {
                    diff::Result::Left(l) => {
                        println!("{line:>2}: -{l}");
                    }
                    diff::Result::Both(l, _) => {
                        println!("{line:>2}:  {l}");
                    }
                    diff::Result::Right(r) => {
                        println!("{line:>2}: +{r}");
                    }
                }
            }
            result = result.and(Err("changed output"));
        }
    }

    for name in added_names {
        println!("added output: {}", name.to_string_lossy());
        result = result.and(Err("added output"));
    }

    for name in removed_names {
        println!("removed output: {}", name.to_string_lossy());
        result = result.and(Err("removed output"));
    }

    result.map_err(io::Error::other)
}

fn read_file_names(path: &Path) -> io::Result<Vec<std::ffi::OsString>> {
    path.read_dir()?
        .map(|entry| entry.map(|entry| entry.file_name()))
        .collect()
}
