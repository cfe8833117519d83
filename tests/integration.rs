use std::env as stdenv;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tinysh::{Interpreter, ShellError};

fn make_unique_temp_dir(tag: &str) -> PathBuf {
    let mut p = stdenv::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    p.push(format!("tinysh_it_{}_{}_{}", tag, std::process::id(), nanos));
    fs::create_dir_all(&p).unwrap();
    fs::canonicalize(&p).unwrap()
}

fn shell_in(tag: &str) -> (PathBuf, Interpreter) {
    let dir = make_unique_temp_dir(tag);
    let mut sh = Interpreter::default();
    sh.env_mut().current_dir = dir.clone();
    (dir, sh)
}

fn run(sh: &mut Interpreter, line: &str) -> (Result<(), ShellError>, String) {
    let mut out = Vec::new();
    let res = sh.evaluate_with_input(line, &mut io::empty(), &mut out);
    (res, String::from_utf8(out).unwrap())
}

fn output_of(line: &str) -> String {
    let (dir, mut sh) = shell_in("out");
    let (res, out) = run(&mut sh, line);
    res.unwrap_or_else(|e| panic!("line {:?} failed: {}", line, e));
    let _ = fs::remove_dir_all(dir);
    out
}

macro_rules! output_test {
    ($name:ident, $line:expr, $expected:expr) => {
        #[test]
        fn $name() {
            assert_eq!(output_of($line), $expected, "line: {}", $line);
        }
    };
}

// ── End-to-end lines ──

output_test!(pipe_into_cut, "echo hello | cut -c 1-3", "hel\n");
output_test!(sequence_of_two, "echo a; echo b", "a\nb\n");
output_test!(adjacent_substitutions_merge, "echo `echo 1`2`echo 3`", "123\n");
output_test!(three_stage_pipe, "echo b a c | cut -c 3 | cat", "a\n");
output_test!(single_quotes_keep_spaces, "echo 'a   b'", "a   b\n");
output_test!(double_quotes_keep_spaces, "echo \"a   b\"", "a   b\n");
output_test!(quoted_operators, "echo 'a;b' \"c|d\" '<x>'", "a;b c|d <x>\n");
output_test!(unquoted_substitution_splits, "echo `echo a   b`", "a b\n");
output_test!(quoted_substitution_keeps_spaces, "echo \"`echo a   b`\"", "a   b\n");
output_test!(substitution_with_pipe, "echo `echo abc | cut -c 2`", "b\n");
output_test!(empty_quoted_argument, "echo '' x", " x\n");
output_test!(empty_unquoted_substitution_drops, "echo `echo` x", "x\n");
output_test!(nested_quote_in_double, "echo \"it's\"", "it's\n");
output_test!(trailing_semicolon, "echo done;", "done\n");
output_test!(sort_pipeline, "echo c; echo a | sort", "c\na\n");

// ── Failure semantics ──

#[test]
fn sequence_continues_after_failure() {
    let (dir, mut sh) = shell_in("seq_fail");
    let (res, out) = run(&mut sh, "echo one; cat missing.txt; echo three");
    res.unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "one");
    assert!(lines[1].starts_with("cat: missing.txt"), "got {:?}", lines[1]);
    assert_eq!(lines[2], "three");
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn missing_input_redirect_propagates() {
    let (dir, mut sh) = shell_in("nofile");
    let (res, out) = run(&mut sh, "cat < nofile.txt");
    assert!(res.unwrap_err().is_not_found());
    assert!(out.is_empty());
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn double_output_redirect_is_syntax_error() {
    let (dir, mut sh) = shell_in("twoout");
    let (res, _) = run(&mut sh, "echo x > out.txt > out2.txt");
    assert!(res.unwrap_err().is_syntax());
    assert!(!dir.join("out.txt").exists());
    assert!(!dir.join("out2.txt").exists());
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn unmatched_quotes_are_syntax_errors() {
    let (dir, mut sh) = shell_in("quotes");
    for line in ["echo 'a", "echo \"a", "echo `a", "echo a'b"] {
        let (res, out) = run(&mut sh, line);
        assert!(res.unwrap_err().is_syntax(), "line {:?}", line);
        assert!(out.is_empty());
    }
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn exit_stops_the_line() {
    let (dir, mut sh) = shell_in("exit");
    let (res, out) = run(&mut sh, "echo a; exit 3; echo b");
    assert!(matches!(res, Err(ShellError::Exit(3))));
    assert_eq!(out, "a\n");
    let _ = fs::remove_dir_all(dir);
}

// ── Files, globbing and directories ──

#[test]
fn globbing_and_quoting() {
    let (dir, mut sh) = shell_in("glob");
    for name in ["a1.txt", "a2.txt", "b.txt", ".ahidden"] {
        fs::write(dir.join(name), name).unwrap();
    }

    let (res, out) = run(&mut sh, "echo a*");
    res.unwrap();
    assert_eq!(out, "a1.txt a2.txt\n");

    let (res, out) = run(&mut sh, "echo 'a*' \"a*\" a\\* z*");
    res.unwrap();
    assert_eq!(out, "a* a* a* z*\n");
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn redirect_then_read_back() {
    let (dir, mut sh) = shell_in("roundtrip");
    let (res, _) = run(&mut sh, "echo banana > fruit.txt; echo apple >`echo more.txt`");
    res.unwrap();
    let (res, out) = run(&mut sh, "cat fruit.txt more.txt | sort");
    res.unwrap();
    assert_eq!(out, "apple\nbanana\n");

    let (res, out) = run(&mut sh, "grep an < fruit.txt");
    res.unwrap();
    assert_eq!(out, "banana\n");
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn cd_changes_relative_resolution() {
    let (dir, mut sh) = shell_in("cd");
    fs::create_dir(dir.join("inner")).unwrap();
    fs::write(dir.join("inner/note.txt"), "inside\n").unwrap();

    let (res, out) = run(&mut sh, "cd inner; cat note.txt; pwd");
    res.unwrap();
    assert_eq!(out, format!("inside\n{}\n", dir.join("inner").display()));
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn failed_redirect_in_sequence_names_the_application() {
    let (dir, mut sh) = shell_in("origin");
    let not_found = fs::File::open(dir.join("nofile.txt")).unwrap_err();
    let (res, out) = run(&mut sh, "cat < nofile.txt; echo b");
    res.unwrap();
    assert_eq!(out, format!("cat: nofile.txt: {}\nb\n", not_found));

    let (res, out) = run(&mut sh, "echo hi > ''; echo b");
    res.unwrap();
    assert_eq!(out, "tinysh: syntax error: '': ambiguous redirect\nb\n");
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn exit_inside_substitution_unwinds() {
    let (dir, mut sh) = shell_in("exit_subst");
    let (res, out) = run(&mut sh, "echo `exit 2`; echo after");
    assert!(matches!(res, Err(ShellError::Exit(2))));
    assert!(out.is_empty());
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn file_management_and_text_filters() {
    let (dir, mut sh) = shell_in("files");
    let (res, _) = run(
        &mut sh,
        "echo one > a.txt; cp a.txt b.txt; mv b.txt c.txt; rm a.txt",
    );
    res.unwrap();
    assert!(!dir.join("a.txt").exists());
    assert!(!dir.join("b.txt").exists());
    assert_eq!(fs::read_to_string(dir.join("c.txt")).unwrap(), "one\n");

    let (res, out) = run(&mut sh, "echo hello world | sed 's/o/0/g'");
    res.unwrap();
    assert_eq!(out, "hell0 w0rld\n");

    let (res, out) = run(&mut sh, "echo two > d.txt; paste -d , c.txt d.txt");
    res.unwrap();
    assert_eq!(out, "one,two\n");
    let _ = fs::remove_dir_all(dir);
}
