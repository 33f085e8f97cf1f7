use std::env;
use simple_script::Interpreter;

use crate::repl;

pub fn print_help() {
    println!(
"usage: simple_script [-v] [FILE...]
       simple_script [-v] -n [FILE]

  -h, --help            print this message.
  -v, --verbose         print the AST of each statement and trace its evaluation.
  -n, --no-interactive  run FILE (or stdin) and exit.

Files given without -n are run before the interactive prompt starts."
    );
}

/// Options read from the command line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub help: bool,
    pub verbose: bool,
    pub non_interactive: bool,
    pub files: Vec<String>,
}

pub fn parse_cmdline_options<I>(args: I) -> Options
    where I: IntoIterator<Item = String>
{
    let mut opts = Options::default();
    // skip program name
    for arg in args.into_iter().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => opts.help = true,
            "-v" | "--verbose" => opts.verbose = true,
            "-n" | "--no-interactive" => opts.non_interactive = true,
            _ => opts.files.push(arg),
        }
    }
    opts
}

pub fn options_from_env() -> Options {
    parse_cmdline_options(env::args())
}

// returns true if the REPL should be run afterwards, false otherwise.
pub fn apply_options(opts: &Options, interpreter: &mut Interpreter) -> bool {
    if opts.help {
        print_help();
        return false;
    }
    interpreter.set_verbose(opts.verbose);
    if opts.non_interactive {
        // never start interactive prompt when -n is used
        load_file(opts.files.first().map(String::as_str), interpreter);
        return false;
    }
    // everything else is a file to be loaded.
    for name in &opts.files {
        if !load_file(Some(name), interpreter) {
            return false;
        }
    }
    true
}

fn load_file(filename: Option<&str>, interpreter: &mut Interpreter) -> bool {
    let result = interpreter.run_file(filename, repl::print_outcome);
    if let Err(e) = result {
        eprintln!("failed to load file '{}': {}", filename.unwrap_or("stdin"), e);
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_args() {
        assert_eq!(parse_cmdline_options(args(&["simple_script"])), Options::default());
    }

    #[test]
    fn flags_and_files() {
        let opts = parse_cmdline_options(args(&["simple_script", "-v", "a.ss", "b.ss"]));
        assert!(opts.verbose);
        assert!(!opts.non_interactive);
        assert_eq!(opts.files, vec!["a.ss", "b.ss"]);
    }

    #[test]
    fn long_flags() {
        let opts = parse_cmdline_options(args(&["simple_script", "--no-interactive", "--help"]));
        assert!(opts.non_interactive);
        assert!(opts.help);
        assert!(opts.files.is_empty());
    }
}
