use std::{
    env,
    borrow::Cow,
    cell::RefCell,
    rc::Rc,
};
use rustyline::{
    At,
    Cmd,
    CompletionType,
    Context,
    Editor,
    KeyPress,
    Movement,
    Word,
    completion::{Completer, FilenameCompleter, Pair},
    error::ReadlineError,
    highlight::{Highlighter, MatchingBracketHighlighter},
    hint::Hinter,
    line_buffer::LineBuffer,
};
use rustyline_derive::Helper;
use simple_script::{tokenize, Interpreter, Outcome};

use crate::{
    cmd::{self, Command},
    logging::{self, LogHandle},
};

const EXIT_STATEMENT: &str = "exit();";

#[derive(Helper)]
struct RustylineHelper {
    filename_completer: FilenameCompleter, // for :load
    highlighter: MatchingBracketHighlighter,
    interpreter: Rc<RefCell<Interpreter>>,
}

impl Hinter for RustylineHelper {
    fn hint(&self, _line: &str, _pos:usize, _context: &Context) -> Option<String> {
        None
    }
}

impl Completer for RustylineHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, cursor_pos: usize, context: &Context)
        -> Result<(usize, Vec<Self::Candidate>), ReadlineError>
    {
        let null_completion = (0, Vec::with_capacity(0));
        if cursor_pos == 0 {
            return Ok(null_completion);
        }
        match line.chars().next() {
            None => Ok(null_completion),
            Some(':') => {
                let compl_str = &line[1..cursor_pos];
                match compl_str.chars().position(|c| c == ' ') {
                    None => {
                        // no space: complete the command's name.
                        match cmd::get_command_starts_with(compl_str) {
                            None => Ok(null_completion),
                            Some(cmd) => {
                                let compl_pair = Pair {
                                    display: cmd.long_name.to_string(),
                                    replacement: cmd.long_name.to_string(),
                                };
                                Ok((1, vec![compl_pair]))
                            },
                        }
                    },
                    Some(pos) => {
                        // with space: complete the argument's name.
                        match cmd::get_command(&compl_str[..pos]) {
                            Some(class) if class.cmd == Command::Load => {
                                self.filename_completer.complete(line, cursor_pos, context)
                            },
                            // :tokens and :calc take source text.
                            Some(class) if class.arg_expected => {
                                Ok(self.complete_variable(line, cursor_pos))
                            },
                            _ => Ok(null_completion),
                        }
                    },
                }
            },
            Some(_) => Ok(self.complete_variable(line, cursor_pos)),
        }
    }

    fn update(&self, line: &mut LineBuffer, start: usize, elected: &str) {
        self.filename_completer.update(line, start, elected)
    }
}

impl RustylineHelper {
    fn complete_variable(&self, line: &str, cursor_pos: usize) -> (usize, Vec<Pair>) {
        let word_begin = get_start_word_under_cursor(line, cursor_pos);
        let completion = self.interpreter
            .borrow()
            .get_variable_names_with_prefix(&line[word_begin..cursor_pos])
            .iter()
            .map(|s| Pair { display: s.to_string(), replacement: s.to_string(), })
            .collect();
        (word_begin, completion)
    }
}

impl Highlighter for RustylineHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool
    ) -> Cow<'b, str> {
        self.highlighter.highlight_prompt(prompt, default)
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        self.highlighter.highlight_hint(hint)
    }

    fn highlight_candidate<'c>(
        &self,
        candidate: &'c str,
        completion: CompletionType
    ) -> Cow<'c, str> {
        self.highlighter.highlight_candidate(candidate, completion)
    }

    fn highlight_char(&self, line: &str, pos: usize) -> bool {
        self.highlighter.highlight_char(line, pos)
    }
}

fn make_rustyline_editor(histfile: &str, interpreter: Rc<RefCell<Interpreter>>)
    -> Editor<RustylineHelper>
{
    let mut rl = Editor::<RustylineHelper>::new();

    let rustyline_helper = RustylineHelper {
        filename_completer: FilenameCompleter::new(),
        highlighter: MatchingBracketHighlighter::new(),
        interpreter,
    };
    rl.set_helper(Some(rustyline_helper));

    // a missing history file is normal on first run.
    let _ = rl.load_history(histfile);

    rl.bind_sequence(KeyPress::ControlRight,
                     Cmd::Move(Movement::ForwardWord(1, At::Start, Word::Vi)));
    rl.bind_sequence(KeyPress::ControlLeft,
                     Cmd::Move(Movement::BackwardWord(1, Word::Vi)));
    rl
}

fn get_histfile_path() -> String {
    let home_key = "HOME";
    let fallback = "/tmp";
    let filename = "simple_script_hist";
    match env::var(home_key) {
        Ok(home) => format!("{}/.cache/{}", home, filename),
        Err(e) => {
            eprintln!("warning: failed to read env variable {} ({}), using fallback {}.",
                      home_key, e, fallback);
            format!("{}/{}", fallback, filename)
        },
    }
}

pub fn print_outcome(outcome: &Outcome) {
    println!("{}", outcome);
}

// A statement is complete once the buffered text ends with a semicolon.
fn needs_more_input(buffer: &str) -> bool {
    let trimmed = buffer.trim_end();
    !trimmed.is_empty() && !trimmed.ends_with(';')
}

pub fn read_eval_print_loop(interpreter: Interpreter, log: LogHandle) {

    let interpreter = Rc::new(RefCell::new(interpreter));

    let histfile = get_histfile_path();
    let mut rl = make_rustyline_editor(&histfile, Rc::clone(&interpreter));

    println!("Simple script language! Type :help for help, {} to quit.", EXIT_STATEMENT);
    loop {
        let mut script = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("error: {:?}", err);
                break;
            },
        };

        if let Some(command) = cmd::parse_command_line(&script) {
            rl.add_history_entry(script.as_str());
            match command {
                Ok((command, arg)) => {
                    run_command(command, arg, &mut interpreter.borrow_mut(), &log);
                },
                Err(name) => eprintln!("unknown command ':{}', see :help", name),
            }
            continue;
        }
        if script.trim() == EXIT_STATEMENT {
            println!("good bye!");
            break;
        }

        let mut complete = true;
        while needs_more_input(&script) {
            match rl.readline("& ") {
                Ok(new_line) => {
                    script.push('\n');
                    script.push_str(&new_line);
                },
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    complete = false;
                    break;
                },
                Err(err) => {
                    eprintln!("error: {:?}", err);
                    complete = false;
                    break;
                },
            };
        }
        if !complete || script.trim().is_empty() {
            continue;
        }
        rl.add_history_entry(script.as_str());

        if let Err(e) = interpreter.borrow_mut().run(&script, print_outcome) {
            eprintln!("{}", e);
        }
    }
    if rl.save_history(&histfile).is_err() {
        eprintln!("failed to save history file");
    };
}

fn run_command(command: Command, arg: Option<&str>, interpreter: &mut Interpreter, log: &LogHandle) {
    match command {
        Command::Help => cmd::print_usage(),
        Command::Load => match arg {
            None => eprintln!("usage: :load FILE"),
            Some(filename) => {
                if let Err(e) = interpreter.run_file(Some(filename), print_outcome) {
                    eprintln!("{}", e);
                }
            },
        },
        Command::Verbose => println!("{}", toggle_verbose(interpreter, log)),
        Command::Tokens => {
            println!("text\t\ttype");
            for token in tokenize(arg.unwrap_or("")) {
                println!("{}\t\t{}", token.text(), token.kind());
            }
        },
        Command::Calc => match arg {
            None => eprintln!("usage: :calc EXPRESSION"),
            Some(expr) => match interpreter.calculate(expr) {
                Ok(value) => println!("{}", value),
                Err(e) => eprintln!("{}", e),
            },
        },
        Command::Env => {
            for (name, value) in interpreter.environment().variables() {
                print_outcome(&Outcome::Variable { name: name.to_string(), value });
            }
        },
    }
}

fn toggle_verbose(interpreter: &mut Interpreter, log: &LogHandle) -> String {
    if log.filter_from_env() {
        return format!("verbose mode unchanged: the log filter is set by {}", logging::LOG_ENV_VAR);
    }
    let verbose = !interpreter.is_verbose();
    interpreter.set_verbose(verbose);
    log.set_verbose(verbose);
    format!("verbose mode {}", if verbose { "on" } else { "off" })
}

// find the beginning of the word in line which is currently under the cursor,
// whose position is cursor_pos.
//
fn get_start_word_under_cursor(line: &str, cursor_pos: usize) -> usize {
    let mut chars = line[..cursor_pos].chars();
    let mut res = cursor_pos;
    while let Some(c) = chars.next_back() {
        if !c.is_ascii_alphanumeric() {
            break
        }
        res -= c.len_utf8();
    };
    // if iter == None, res == 0.
    res
}
