use super::{BuiltinCommand, read_source};
use crate::env::Environment;
use anyhow::{Context, Result};
use argh::FromArgs;
use regex::{Regex, RegexBuilder};
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};

#[derive(FromArgs)]
/// Print the first lines of a file or standard input.
pub struct Head {
    #[argh(option, short = 'n', default = "10")]
    /// number of lines to print.
    pub lines: usize,

    #[argh(positional)]
    /// file to read; standard input when omitted.
    pub file: Option<String>,
}

impl BuiltinCommand for Head {
    fn name() -> &'static str {
        "head"
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        let text = read_source(self.file.as_deref(), stdin, env)?;
        for line in text.lines().take(self.lines) {
            writeln!(stdout, "{}", line)?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Print the last lines of a file or standard input.
pub struct Tail {
    #[argh(option, short = 'n', default = "10")]
    /// number of lines to print.
    pub lines: usize,

    #[argh(positional)]
    /// file to read; standard input when omitted.
    pub file: Option<String>,
}

impl BuiltinCommand for Tail {
    fn name() -> &'static str {
        "tail"
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        let text = read_source(self.file.as_deref(), stdin, env)?;
        let lines: Vec<&str> = text.lines().collect();
        let start = lines.len().saturating_sub(self.lines);
        for line in &lines[start..] {
            writeln!(stdout, "{}", line)?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Print lines matching a pattern.
pub struct Grep {
    #[argh(positional)]
    /// the pattern to search for (a regular expression)
    pub pattern: String,

    #[argh(positional, greedy)]
    /// files to search. If none provided, reads from stdin.
    pub files: Vec<String>,

    #[argh(switch, short = 'w')]
    /// match only whole words (using non-word characters as boundaries)
    pub word_regexp: bool,

    #[argh(switch, short = 'i')]
    /// ignore case distinctions
    pub ignore_case: bool,

    #[argh(option, short = 'A', default = "0")]
    /// print NUM lines of trailing context after matching lines
    pub after_context: usize,
}

impl Grep {
    fn process_source(
        &self,
        reader: &mut dyn Read,
        stdout: &mut dyn Write,
        file_name: Option<&str>,
        re: &regex::Regex,
    ) -> Result<()> {
        let reader = BufReader::new(reader);

        let mut lines = Vec::new();
        let mut match_indices = Vec::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line.context("read error")?;
            if re.is_match(&line) {
                match_indices.push(line_num);
            }
            lines.push(line);
        }

        let total_lines = lines.len();
        let mut to_print = vec![false; total_lines];
        for &match_line in &match_indices {
            let end_print = (match_line + self.after_context + 1).min(total_lines);
            for flag in &mut to_print[match_line..end_print] {
                *flag = true;
            }
        }

        let prefix = file_name
            .map(|name| format!("{}:", name))
            .unwrap_or_default();
        let mut last_printed_index: Option<usize> = None;

        for (i, line) in lines.iter().enumerate() {
            if !to_print[i] {
                continue;
            }
            if self.after_context > 0 && last_printed_index.is_some_and(|last| i > last + 1) {
                stdout.write_all(b"--\n")?;
            }
            writeln!(stdout, "{}{}", prefix, line)?;
            last_printed_index = Some(i);
        }

        Ok(())
    }
}

impl BuiltinCommand for Grep {
    fn name() -> &'static str {
        "grep"
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        let pattern = if self.word_regexp {
            format!(r"\b({})\b", self.pattern)
        } else {
            self.pattern.clone()
        };

        let re = RegexBuilder::new(&pattern)
            .case_insensitive(self.ignore_case)
            .build()
            .with_context(|| format!("invalid regex pattern: {}", pattern))?;

        if self.files.is_empty() {
            return self.process_source(stdin, stdout, None, &re);
        }
        for file_name in &self.files {
            let path = env.resolve_path(file_name);
            if path.is_dir() {
                anyhow::bail!("{}: Is a directory", file_name);
            }
            let mut f = fs::File::open(&path).with_context(|| file_name.clone())?;
            self.process_source(&mut f, stdout, Some(file_name.as_str()), &re)?;
        }
        Ok(())
    }
}

/// One `N`, `N-M`, `N-` or `-M` item of a cut list, 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Range {
    start: usize,
    end: Option<usize>,
}

impl Range {
    fn contains(&self, position: usize) -> bool {
        position >= self.start && self.end.is_none_or(|end| position <= end)
    }
}

fn parse_position(s: &str, list: &str) -> Result<usize> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => anyhow::bail!("invalid list '{}': positions are numbered from 1", list),
    }
}

fn parse_ranges(list: &str) -> Result<Vec<Range>> {
    list.split(',')
        .map(|item| {
            let range = match item.split_once('-') {
                None => {
                    let n = parse_position(item, list)?;
                    Range {
                        start: n,
                        end: Some(n),
                    }
                }
                Some(("", "")) => anyhow::bail!("invalid list '{}': invalid range", list),
                Some(("", end)) => Range {
                    start: 1,
                    end: Some(parse_position(end, list)?),
                },
                Some((start, "")) => Range {
                    start: parse_position(start, list)?,
                    end: None,
                },
                Some((start, end)) => Range {
                    start: parse_position(start, list)?,
                    end: Some(parse_position(end, list)?),
                },
            };
            if range.end.is_some_and(|end| end < range.start) {
                anyhow::bail!("invalid list '{}': decreasing range", list);
            }
            Ok(range)
        })
        .collect()
}

fn select<T: Copy>(items: &[T], ranges: &[Range]) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .filter(|(i, _)| ranges.iter().any(|r| r.contains(i + 1)))
        .map(|(_, item)| *item)
        .collect()
}

#[derive(FromArgs)]
/// Print selected characters or bytes of each line.
pub struct Cut {
    #[argh(option, short = 'c')]
    /// comma-separated character positions or ranges, e.g. 1-3,5,8-
    pub chars: Option<String>,

    #[argh(option, short = 'b')]
    /// comma-separated byte positions or ranges
    pub bytes: Option<String>,

    #[argh(positional)]
    /// file to read; standard input when omitted.
    pub file: Option<String>,
}

impl BuiltinCommand for Cut {
    fn name() -> &'static str {
        "cut"
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        let (list, by_bytes) = match (&self.chars, &self.bytes) {
            (Some(list), None) => (list, false),
            (None, Some(list)) => (list, true),
            _ => anyhow::bail!("exactly one of -c or -b must be given"),
        };
        let ranges = parse_ranges(list)?;
        let text = read_source(self.file.as_deref(), stdin, env)?;

        for line in text.lines() {
            if by_bytes {
                stdout.write_all(&select(line.as_bytes(), &ranges))?;
                stdout.write_all(b"\n")?;
            } else {
                let chars: Vec<char> = line.chars().collect();
                let selected: String = select(&chars, &ranges).into_iter().collect();
                writeln!(stdout, "{}", selected)?;
            }
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Sort lines of a file or standard input.
pub struct Sort {
    #[argh(switch, short = 'r')]
    /// reverse the order.
    pub reverse: bool,

    #[argh(positional)]
    /// file to read; standard input when omitted.
    pub file: Option<String>,
}

impl BuiltinCommand for Sort {
    fn name() -> &'static str {
        "sort"
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        let text = read_source(self.file.as_deref(), stdin, env)?;
        let mut lines: Vec<&str> = text.lines().collect();
        lines.sort_unstable();
        if self.reverse {
            lines.reverse();
        }
        for line in lines {
            writeln!(stdout, "{}", line)?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Collapse adjacent duplicate lines.
pub struct Uniq {
    #[argh(switch, short = 'i')]
    /// compare lines case-insensitively.
    pub ignore_case: bool,

    #[argh(positional)]
    /// file to read; standard input when omitted.
    pub file: Option<String>,
}

impl BuiltinCommand for Uniq {
    fn name() -> &'static str {
        "uniq"
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        let text = read_source(self.file.as_deref(), stdin, env)?;
        let mut previous: Option<&str> = None;
        for line in text.lines() {
            let duplicate = previous.is_some_and(|prev| {
                if self.ignore_case {
                    prev.to_lowercase() == line.to_lowercase()
                } else {
                    prev == line
                }
            });
            if !duplicate {
                writeln!(stdout, "{}", line)?;
            }
            previous = Some(line);
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Count lines, words and bytes.
pub struct Wc {
    #[argh(switch, short = 'l')]
    /// print the line count.
    pub lines: bool,

    #[argh(switch, short = 'w')]
    /// print the word count.
    pub words: bool,

    #[argh(switch, short = 'c')]
    /// print the byte count.
    pub bytes: bool,

    #[argh(positional, greedy)]
    /// files to count; standard input when none are given.
    pub files: Vec<String>,
}

impl Wc {
    fn counts(&self, text: &str) -> String {
        let all = !(self.lines || self.words || self.bytes);
        let mut fields = Vec::new();
        if all || self.lines {
            fields.push(text.lines().count().to_string());
        }
        if all || self.words {
            fields.push(text.split_whitespace().count().to_string());
        }
        if all || self.bytes {
            fields.push(text.len().to_string());
        }
        fields.join(" ")
    }
}

impl BuiltinCommand for Wc {
    fn name() -> &'static str {
        "wc"
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        if self.files.is_empty() {
            let text = read_source(None, stdin, env)?;
            writeln!(stdout, "{}", self.counts(&text))?;
            return Ok(());
        }
        for fname in &self.files {
            let text = read_source(Some(fname.as_str()), stdin, env)?;
            writeln!(stdout, "{} {}", self.counts(&text), fname)?;
        }
        Ok(())
    }
}

/// Expand the `\t`, `\n`, `\\` and `\0` (empty) escapes of a paste delimiter list.
fn parse_delimiters(list: &str) -> Vec<String> {
    let mut delimiters = Vec::new();
    let mut chars = list.chars();
    while let Some(c) = chars.next() {
        let delimiter = match c {
            '\\' => match chars.next() {
                Some('t') => "\t".to_string(),
                Some('n') => "\n".to_string(),
                Some('0') => String::new(),
                Some(other) => other.to_string(),
                None => "\\".to_string(),
            },
            c => c.to_string(),
        };
        delimiters.push(delimiter);
    }
    if delimiters.is_empty() {
        delimiters.push(String::new());
    }
    delimiters
}

#[derive(FromArgs)]
/// Merge lines of files side by side.
pub struct Paste {
    #[argh(option, short = 'd', default = "String::from(\"\\\\t\")")]
    /// delimiters used in turn to join lines; a tab by default.
    pub delimiters: String,

    #[argh(switch, short = 's')]
    /// paste each file's lines onto one line instead of in parallel.
    pub serial: bool,

    #[argh(positional)]
    /// files to merge; standard input when none are given.
    pub files: Vec<String>,
}

impl BuiltinCommand for Paste {
    fn name() -> &'static str {
        "paste"
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        let delimiters = parse_delimiters(&self.delimiters);
        let texts = if self.files.is_empty() {
            vec![read_source(None, stdin, env)?]
        } else {
            self.files
                .iter()
                .map(|name| read_source(Some(name.as_str()), stdin, env))
                .collect::<Result<Vec<_>>>()?
        };
        let columns: Vec<Vec<&str>> = texts.iter().map(|t| t.lines().collect()).collect();

        let join = |cells: &[&str]| {
            let mut line = String::new();
            for (i, cell) in cells.iter().enumerate() {
                if i > 0 {
                    line.push_str(&delimiters[(i - 1) % delimiters.len()]);
                }
                line.push_str(cell);
            }
            line
        };

        if self.serial {
            for column in &columns {
                writeln!(stdout, "{}", join(column.as_slice()))?;
            }
        } else {
            let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
            for row in 0..rows {
                let cells: Vec<&str> = columns
                    .iter()
                    .map(|column| column.get(row).copied().unwrap_or(""))
                    .collect();
                writeln!(stdout, "{}", join(cells.as_slice()))?;
            }
        }
        Ok(())
    }
}

/// A parsed `s/REGEX/REPLACEMENT/FLAGS` command.
#[derive(Debug)]
struct Substitution {
    re: Regex,
    /// Replacement in `regex` expansion syntax.
    replacement: String,
    global: bool,
    /// 1-based index of the first match to replace.
    occurrence: usize,
    print: bool,
}

impl Substitution {
    fn parse(script: &str) -> Result<Self> {
        let mut chars = script.chars();
        if chars.next() != Some('s') {
            anyhow::bail!("unknown command: '{}'", script);
        }
        let delim = match chars.next() {
            Some(c) if c != '\\' && c != '\n' => c,
            _ => anyhow::bail!("unterminated `s' command"),
        };

        let mut fields = vec![String::new()];
        while fields.len() < 3 {
            let last = fields.len() - 1;
            match chars.next() {
                None => anyhow::bail!("unterminated `s' command"),
                Some('\\') => match chars.next() {
                    Some(c) if c == delim => fields[last].push(c),
                    Some(c) => {
                        fields[last].push('\\');
                        fields[last].push(c);
                    }
                    None => anyhow::bail!("unterminated `s' command"),
                },
                Some(c) if c == delim => fields.push(String::new()),
                Some(c) => fields[last].push(c),
            }
        }

        let mut global = false;
        let mut ignore_case = false;
        let mut print = false;
        let mut occurrence: Option<usize> = None;
        for flag in chars {
            match flag {
                'g' => global = true,
                'i' | 'I' => ignore_case = true,
                'p' => print = true,
                d if d.is_ascii_digit() => {
                    let digit = d as usize - '0' as usize;
                    occurrence = Some(occurrence.unwrap_or(0).saturating_mul(10).saturating_add(digit));
                }
                other => anyhow::bail!("unknown option to `s': '{}'", other),
            }
        }
        if occurrence == Some(0) {
            anyhow::bail!("number option to `s' command may not be zero");
        }

        let re = RegexBuilder::new(&fields[0])
            .case_insensitive(ignore_case)
            .build()
            .with_context(|| format!("invalid regex pattern: {}", fields[0]))?;
        Ok(Substitution {
            re,
            replacement: translate_replacement(&fields[1]),
            global,
            occurrence: occurrence.unwrap_or(1),
            print,
        })
    }

    /// The rewritten line, or `None` when nothing was replaced.
    fn apply(&self, line: &str) -> Option<String> {
        let mut out = String::with_capacity(line.len());
        let mut last = 0;
        let mut replaced = false;
        for (n, caps) in self.re.captures_iter(line).enumerate() {
            if n + 1 < self.occurrence {
                continue;
            }
            let Some(m) = caps.get(0) else { continue };
            out.push_str(&line[last..m.start()]);
            caps.expand(&self.replacement, &mut out);
            last = m.end();
            replaced = true;
            if !self.global {
                break;
            }
        }
        if !replaced {
            return None;
        }
        out.push_str(&line[last..]);
        Some(out)
    }
}

/// Rewrite sed's `&` and `\N` references into `${0}` and `${N}`.
fn translate_replacement(replacement: &str) -> String {
    let mut out = String::new();
    let mut chars = replacement.chars();
    while let Some(c) = chars.next() {
        match c {
            '&' => out.push_str("${0}"),
            '$' => out.push_str("$$"),
            '\\' => match chars.next() {
                Some(d) if d.is_ascii_digit() => {
                    out.push_str("${");
                    out.push(d);
                    out.push('}');
                }
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('$') => out.push_str("$$"),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            c => out.push(c),
        }
    }
    out
}

#[derive(FromArgs)]
/// Stream editor supporting the substitute command.
pub struct Sed {
    #[argh(switch, short = 'n')]
    /// print only lines a `p` flag asks for.
    pub quiet: bool,

    #[argh(positional)]
    /// the script, s/REGEX/REPLACEMENT/[FLAGS] where FLAGS are g, i, p or a number.
    pub script: String,

    #[argh(positional)]
    /// file to read; standard input when omitted.
    pub file: Option<String>,
}

impl BuiltinCommand for Sed {
    fn name() -> &'static str {
        "sed"
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<()> {
        let substitution = Substitution::parse(&self.script)?;
        let text = read_source(self.file.as_deref(), stdin, env)?;
        for line in text.lines() {
            match substitution.apply(line) {
                Some(edited) => {
                    if !self.quiet {
                        writeln!(stdout, "{}", edited)?;
                    }
                    if substitution.print {
                        writeln!(stdout, "{}", edited)?;
                    }
                }
                None if !self.quiet => writeln!(stdout, "{}", line)?,
                None => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::test_support::temp_env;
    use std::io::Cursor;

    fn run_on_stdin(cmd: impl BuiltinCommand, input: &str) -> String {
        let mut env = Environment::with_current_dir("/");
        let mut out = Vec::new();
        cmd.execute(&mut Cursor::new(input.as_bytes().to_vec()), &mut out, &mut env)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn cut_chars(list: &str) -> Cut {
        Cut {
            chars: Some(list.to_string()),
            bytes: None,
            file: None,
        }
    }

    #[test]
    fn test_head_and_tail() {
        let input = "1\n2\n3\n4\n5\n";
        assert_eq!(run_on_stdin(Head { lines: 2, file: None }, input), "1\n2\n");
        assert_eq!(run_on_stdin(Tail { lines: 2, file: None }, input), "4\n5\n");
        assert_eq!(run_on_stdin(Tail { lines: 10, file: None }, input), input);
    }

    #[test]
    fn test_cut_ranges() {
        assert_eq!(run_on_stdin(cut_chars("1-3"), "hello\n"), "hel\n");
        assert_eq!(run_on_stdin(cut_chars("1,3,5"), "hello\nab\n"), "hlo\na\n");
        assert_eq!(run_on_stdin(cut_chars("-2,4-"), "abcdef\n"), "abdef\n");
        // overlapping and out-of-order items print each position once, in order
        assert_eq!(run_on_stdin(cut_chars("3,1-2,2"), "abcd\n"), "abc\n");
    }

    #[test]
    fn test_cut_bytes() {
        let cmd = Cut {
            chars: None,
            bytes: Some("2-3".to_string()),
            file: None,
        };
        assert_eq!(run_on_stdin(cmd, "xyz\n"), "yz\n");
    }

    #[test]
    fn test_cut_rejects_bad_lists() {
        for list in ["0", "3-1", "a", "-", "1,,2"] {
            let mut env = Environment::with_current_dir("/");
            let res = cut_chars(list).execute(&mut Cursor::new(b"abc\n".to_vec()), &mut Vec::new(), &mut env);
            assert!(res.is_err(), "list {}", list);
        }
        let mut env = Environment::with_current_dir("/");
        let both = Cut {
            chars: Some("1".to_string()),
            bytes: Some("1".to_string()),
            file: None,
        };
        assert!(both.execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env).is_err());
    }

    #[test]
    fn test_sort_and_uniq() {
        let sort = Sort { reverse: false, file: None };
        assert_eq!(run_on_stdin(sort, "b\na\nc\n"), "a\nb\nc\n");
        let sort = Sort { reverse: true, file: None };
        assert_eq!(run_on_stdin(sort, "b\na\nc\n"), "c\nb\na\n");

        let uniq = Uniq { ignore_case: false, file: None };
        assert_eq!(run_on_stdin(uniq, "a\na\nb\na\n"), "a\nb\na\n");
        let uniq = Uniq { ignore_case: true, file: None };
        assert_eq!(run_on_stdin(uniq, "a\nA\nb\n"), "a\nb\n");
    }

    #[test]
    fn test_wc_counts_stdin_when_no_args() {
        let wc = Wc { lines: false, words: false, bytes: false, files: Vec::new() };
        assert_eq!(run_on_stdin(wc, "a b c\n"), "1 3 6\n");
        let wc = Wc { lines: true, words: false, bytes: false, files: Vec::new() };
        assert_eq!(run_on_stdin(wc, "a\nb\n"), "2\n");
    }

    #[test]
    fn test_wc_counts_files() {
        let (dir, mut env) = temp_env("wc");
        fs::write(dir.join("f.txt"), "one two\nthree\n").unwrap();

        let wc = Wc { lines: false, words: false, bytes: false, files: vec!["f.txt".to_string()] };
        let mut out = Vec::new();
        wc.execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "2 3 14 f.txt\n");
        let _ = fs::remove_dir_all(dir);
    }

    fn grep(pattern: &str, files: Vec<String>) -> Grep {
        Grep {
            pattern: pattern.to_string(),
            files,
            word_regexp: false,
            ignore_case: false,
            after_context: 0,
        }
    }

    #[test]
    fn test_grep_stdin() {
        let out = run_on_stdin(grep("pipe", Vec::new()), "Line 1\nLine with pipe target\nLine 3\n");
        // reading stdin adds no file prefix
        assert_eq!(out, "Line with pipe target\n");
    }

    #[test]
    fn test_grep_ignore_case_with_file_prefix() {
        let (dir, mut env) = temp_env("grep_i");
        fs::write(dir.join("data.txt"), "Target 1\nTaRgEt 2\nNo match\n").unwrap();

        let mut cmd = grep("target", vec!["data.txt".to_string()]);
        cmd.ignore_case = true;
        let mut out = Vec::new();
        cmd.execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "data.txt:Target 1\ndata.txt:TaRgEt 2\n"
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_grep_trailing_context() {
        let mut cmd = grep("MATCH", Vec::new());
        cmd.after_context = 1;
        let content = "Line 1\nMATCH 1\nLine 3\nLine 4\nMATCH 2\nLine 6\nLine 7\n";
        assert_eq!(
            run_on_stdin(cmd, content),
            "MATCH 1\nLine 3\n--\nMATCH 2\nLine 6\n"
        );
    }

    #[test]
    fn test_grep_whole_words_and_bad_regex() {
        let mut cmd = grep("cat", Vec::new());
        cmd.word_regexp = true;
        assert_eq!(run_on_stdin(cmd, "cat\nconcatenate\na cat!\n"), "cat\na cat!\n");

        let mut env = Environment::with_current_dir("/");
        let res = grep("(", Vec::new()).execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env);
        assert!(res.is_err());
    }

    fn sed(script: &str) -> Sed {
        Sed {
            quiet: false,
            script: script.to_string(),
            file: None,
        }
    }

    #[test]
    fn test_sed_substitutes_first_or_all() {
        assert_eq!(run_on_stdin(sed("s/o/0/"), "foo\nbar\n"), "f0o\nbar\n");
        assert_eq!(run_on_stdin(sed("s/o/0/g"), "foo\nbar\n"), "f00\nbar\n");
        assert_eq!(run_on_stdin(sed("s/a/X/2"), "aaa\n"), "aXa\n");
        assert_eq!(run_on_stdin(sed("s/A/x/gi"), "aAa\n"), "xxx\n");
    }

    #[test]
    fn test_sed_delimiters_and_references() {
        assert_eq!(run_on_stdin(sed("s|/|_|g"), "a/b/c\n"), "a_b_c\n");
        assert_eq!(run_on_stdin(sed("s/\\//-/"), "a/b\n"), "a-b\n");
        assert_eq!(run_on_stdin(sed("s/(b)(a)/\\2\\1&/"), "bar\n"), "abbar\n");
        assert_eq!(run_on_stdin(sed("s/x/$1 \\&/"), "x\n"), "$1 &\n");
    }

    #[test]
    fn test_sed_quiet_prints_only_substituted_lines() {
        let cmd = Sed {
            quiet: true,
            script: "s/x/y/p".to_string(),
            file: None,
        };
        assert_eq!(run_on_stdin(cmd, "x\nz\nxx\n"), "y\nyx\n");
    }

    #[test]
    fn test_sed_rejects_bad_scripts() {
        for script in ["s/a/b", "y/a/b/", "s/a/b/q", "s/(/x/", "s/a/b/0", "s"] {
            let mut env = Environment::with_current_dir("/");
            let res = sed(script).execute(&mut Cursor::new(b"abc\n".to_vec()), &mut Vec::new(), &mut env);
            assert!(res.is_err(), "script {}", script);
        }
    }

    #[test]
    fn test_sed_reads_file() {
        let (dir, mut env) = temp_env("sed");
        fs::write(dir.join("in.txt"), "hello world\n").unwrap();

        let mut cmd = sed("s/world/there/");
        cmd.file = Some("in.txt".to_string());
        let mut out = Vec::new();
        cmd.execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "hello there\n");
        let _ = fs::remove_dir_all(dir);
    }

    fn paste(delimiters: &str, serial: bool, files: &[&str]) -> Paste {
        Paste {
            delimiters: delimiters.to_string(),
            serial,
            files: files.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_paste_parallel_and_serial() {
        let (dir, mut env) = temp_env("paste");
        fs::write(dir.join("nums.txt"), "1\n2\n3\n").unwrap();
        fs::write(dir.join("letters.txt"), "x\ny\n").unwrap();

        let run = |env: &mut Environment, cmd: Paste| {
            let mut out = Vec::new();
            cmd.execute(&mut Cursor::new(Vec::new()), &mut out, env)
                .unwrap();
            String::from_utf8(out).unwrap()
        };

        let files = ["nums.txt", "letters.txt"];
        assert_eq!(run(&mut env, paste("\\t", false, &files)), "1\tx\n2\ty\n3\t\n");
        assert_eq!(run(&mut env, paste(",", false, &files)), "1,x\n2,y\n3,\n");
        assert_eq!(run(&mut env, paste("\\t", true, &files)), "1\t2\t3\nx\ty\n");
        assert_eq!(run(&mut env, paste(",;", true, &["nums.txt"])), "1,2;3\n");
        assert_eq!(run(&mut env, paste("\\0", true, &["nums.txt"])), "123\n");
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_paste_reads_stdin_when_no_files() {
        assert_eq!(run_on_stdin(paste("\\t", true, &[]), "a\nb\n"), "a\tb\n");
        assert_eq!(run_on_stdin(paste("\\t", false, &[]), "a\nb\n"), "a\nb\n");
    }
}
