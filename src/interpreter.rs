use std::fmt;
use std::fs;
use std::io::{self, Read};
use tracing::{debug, info};

use crate::ast::{Ast, NodeId, NodeType};
use crate::error::ScriptError;
use crate::eval::{evaluate_node, Environment};
use crate::parser::{parse, parse_expression};

/// What one top-level statement evaluated to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A declaration or assignment; `None` for a declaration without value.
    Variable { name: String, value: Option<i64> },
    Value(i64),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::Variable { name, value: Some(value) } => write!(f, "{}: {}", name, value),
            Outcome::Variable { name, value: None } => write!(f, "{}: uninitialized", name),
            Outcome::Value(value) => write!(f, "{}", value),
        }
    }
}

/// An evaluation session: one environment shared by everything run through it.
///
/// ```
/// # use simple_script::{Interpreter, Outcome};
/// let mut interpreter = Interpreter::new();
/// let mut outcomes = Vec::new();
/// interpreter.run("int a = 2; a * 21;", |o| outcomes.push(o.to_string())).unwrap();
/// assert_eq!(outcomes, vec!["a: 2", "42"]);
/// ```
///
#[derive(Debug)]
pub struct Interpreter {
    env: Environment,
    verbose: bool,
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter {
            env: Environment::new(),
            verbose: false,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn get_variable_names_with_prefix(&self, prefix: &str) -> Vec<&str> {
        self.env.names_with_prefix(prefix)
    }

    /// Parses `source` and evaluates its statements one by one, handing each
    /// outcome to `on_outcome` as soon as it is known.
    ///
    /// Stops at the first error. Statements evaluated before it keep their
    /// effect on the environment.
    pub fn run<F>(&mut self, source: &str, on_outcome: F) -> Result<(), ScriptError>
        where F: FnMut(&Outcome)
    {
        let ast = parse(source)?;
        debug!("parsed program:\n{}", ast);
        self.execute(&ast, on_outcome)
    }

    /// Like `run`, for a single expression without semicolon.
    pub fn calculate(&mut self, source: &str) -> Result<i64, ScriptError> {
        let ast = parse_expression(source)?;
        let mut result = 0;
        self.execute(&ast, |outcome| {
            if let Outcome::Value(value) = outcome {
                result = *value;
            }
        })?;
        Ok(result)
    }

    /// Evaluates an already parsed program.
    pub fn execute<F>(&mut self, ast: &Ast, mut on_outcome: F) -> Result<(), ScriptError>
        where F: FnMut(&Outcome)
    {
        for statement in ast.statements() {
            let outcome = self.execute_statement(ast, statement)?;
            on_outcome(&outcome);
        }
        Ok(())
    }

    fn execute_statement(&mut self, ast: &Ast, statement: NodeId) -> Result<Outcome, ScriptError> {
        let value = evaluate_node(ast, statement, &mut self.env)?;
        let outcome = match (ast.statement_type(statement), value) {
            (NodeType::IntDeclaration, value) | (NodeType::AssignmentStmt, value) => {
                Outcome::Variable {
                    name: ast.text(statement).to_string(),
                    value,
                }
            },
            (_, Some(value)) => Outcome::Value(value),
            // expressions always have a value.
            (_, None) => Outcome::Variable {
                name: ast.text(statement).to_string(),
                value: None,
            },
        };
        Ok(outcome)
    }

    /// Runs a whole script file, or standard input when `filename` is `None`.
    pub fn run_file<F>(&mut self, filename: Option<&str>, on_outcome: F) -> Result<(), ScriptError>
        where F: FnMut(&Outcome)
    {
        let name = filename.unwrap_or("stdin");
        let source = read_source(filename).map_err(|source| ScriptError::Io {
            name: name.to_string(),
            source,
        })?;
        info!(file = name, bytes = source.len(), "loading script");
        self.run(&source, on_outcome)
    }
}

fn read_source(filename: Option<&str>) -> io::Result<String> {
    match filename {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            Ok(source)
        },
    }
}
