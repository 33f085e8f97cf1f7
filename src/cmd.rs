/// Commands understood by the REPL, typed with a leading ':'.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Load,
    Verbose,
    Tokens,
    Calc,
    Env,
}

pub struct CommandClassifier<'a> {
    pub short_name: &'a str,
    pub long_name: &'a str,
    pub cmd: Command,
    pub arg_expected: bool,
    description: &'a str,
}

pub const COMMAND_CLASSIFIER : &[CommandClassifier] = &[
    CommandClassifier {
        short_name: "h",
        long_name: "help",
        cmd: Command::Help,
        arg_expected: false,
        description: "print this message.",
    },
    CommandClassifier {
        short_name: "l",
        long_name: "load",
        cmd: Command::Load,
        arg_expected: true,
        description: "run all statements from a file.",
    },
    CommandClassifier {
        short_name: "v",
        long_name: "verbose",
        cmd: Command::Verbose,
        arg_expected: false,
        description: "toggle verbose mode, which prints the AST and traces each evaluation step.",
    },
    CommandClassifier {
        short_name: "t",
        long_name: "tokens",
        cmd: Command::Tokens,
        arg_expected: true,
        description: "print the tokens of the rest of the line.",
    },
    CommandClassifier {
        short_name: "c",
        long_name: "calc",
        cmd: Command::Calc,
        arg_expected: true,
        description: "evaluate a single expression, no semicolon needed.",
    },
    CommandClassifier {
        short_name: "e",
        long_name: "env",
        cmd: Command::Env,
        arg_expected: false,
        description: "list declared variables and their values.",
    },
];

pub fn print_usage() {
    println!(
"A simple script language: integer variables and arithmetic.

    > int age = 10;
    > age = age * 2 + 1;
    > exit();

Available commands:"
    );
    for command in COMMAND_CLASSIFIER {
        println!(":{}, :{}\t{}",
                 command.short_name,
                 command.long_name,
                 command.description);
    }
}

// get the command entry in COMMAND_CLASSIFIER whose long name starts with prefix.
pub fn get_command_starts_with(prefix: &str) -> Option<&'static CommandClassifier<'static>> {
    COMMAND_CLASSIFIER
        .iter()
        .find(|class| class.long_name.starts_with(prefix))
}

pub fn get_command(name: &str) -> Option<&'static CommandClassifier<'static>> {
    COMMAND_CLASSIFIER
        .iter()
        .find(|class| name == class.short_name || name == class.long_name)
}

/// Splits a line such as `:load foo.ss` into its command and argument.
/// Returns `None` if the line isn't a command at all, and `Some(Err(name))`
/// for an unknown command.
pub fn parse_command_line(line: &str) -> Option<Result<(Command, Option<&str>), &str>> {
    let rest = line.trim().strip_prefix(':')?;
    let (name, arg) = match rest.find(char::is_whitespace) {
        Some(pos) => (&rest[..pos], rest[pos..].trim()),
        None => (rest, ""),
    };
    let class = match get_command(name) {
        Some(class) => class,
        None => return Some(Err(name)),
    };
    let arg = if class.arg_expected && !arg.is_empty() {
        Some(arg)
    } else {
        None
    };
    Some(Ok((class.cmd, arg)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_a_command() {
        assert_eq!(parse_command_line("int a = 1;"), None);
    }

    #[test]
    fn short_and_long_names() {
        assert_eq!(parse_command_line(":h"), Some(Ok((Command::Help, None))));
        assert_eq!(parse_command_line("  :help  "), Some(Ok((Command::Help, None))));
        assert_eq!(parse_command_line(":env"), Some(Ok((Command::Env, None))));
    }

    #[test]
    fn command_arg_multi_word() {
        assert_eq!(
            parse_command_line(":tokens int a = 45;"),
            Some(Ok((Command::Tokens, Some("int a = 45;"))))
        );
        assert_eq!(
            parse_command_line(":l  foo bar.ss"),
            Some(Ok((Command::Load, Some("foo bar.ss"))))
        );
    }

    #[test]
    fn missing_arg() {
        assert_eq!(parse_command_line(":calc"), Some(Ok((Command::Calc, None))));
    }

    #[test]
    fn arg_ignored_when_not_expected() {
        assert_eq!(parse_command_line(":verbose on"), Some(Ok((Command::Verbose, None))));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(parse_command_line(":frobnicate x"), Some(Err("frobnicate")));
    }

    #[test]
    fn completion_prefix() {
        assert_eq!(get_command_starts_with("to").map(|c| c.cmd), Some(Command::Tokens));
        assert_eq!(get_command_starts_with("x").map(|c| c.cmd), None);
    }
}
