use std::collections::HashMap;
use tracing::debug;

use crate::ast::{AdditiveOp, Ast, MultiplicativeOp, NodeId, NodeKind};
use crate::error::EvalError;

/// Variables of one evaluation session. A declared variable holds `None`
/// until it is given a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    variables: HashMap<String, Option<i64>>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment {
            variables: HashMap::new(),
        }
    }

    /// Declares `name`, replacing whatever state it had before.
    pub fn declare(&mut self, name: &str, value: Option<i64>) {
        self.variables.insert(name.to_string(), value);
    }

    /// Sets an already declared variable.
    pub fn assign(&mut self, name: &str, value: i64) -> Result<(), EvalError> {
        match self.variables.get_mut(name) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            },
            None => Err(EvalError::UnknownVariable(name.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Result<i64, EvalError> {
        match self.variables.get(name) {
            Some(Some(value)) => Ok(*value),
            Some(None) => Err(EvalError::UninitializedVariable(name.to_string())),
            None => Err(EvalError::UndefinedVariable(name.to_string())),
        }
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// All variables, sorted by name.
    pub fn variables(&self) -> Vec<(&str, Option<i64>)> {
        let mut vars: Vec<(&str, Option<i64>)> = self
            .variables
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
            .collect();
        vars.sort();
        vars
    }

    pub fn names_with_prefix(&self, prefix: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .variables
            .keys()
            .filter(|name| name.starts_with(prefix))
            .map(String::as_str)
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Evaluates a whole program: every statement in order, returning the value
/// of the last one.
///
/// `None` means the last statement produced no value (a declaration without
/// initializer), or that there were no statements at all.
///
/// ```
/// # use simple_script::{parse, evaluate, Environment};
/// let mut env = Environment::new();
/// let ast = parse("int a = 10; a = a - 3 - 2; a * 2;").unwrap();
/// assert_eq!(evaluate(&ast, &mut env), Ok(Some(10)));
/// assert_eq!(env.get("a"), Ok(5));
/// ```
///
/// Division truncates toward zero:
///
/// ```
/// # use simple_script::{parse, evaluate, Environment};
/// let ast = parse("(0-7)/2;").unwrap();
/// assert_eq!(evaluate(&ast, &mut Environment::new()), Ok(Some(-3)));
/// ```
///
pub fn evaluate(ast: &Ast, env: &mut Environment) -> Result<Option<i64>, EvalError> {
    match ast.root() {
        Some(root) => evaluate_node(ast, root, env),
        None => Ok(None),
    }
}

/// Evaluates the subtree rooted at `id`, left child before right child.
pub fn evaluate_node(ast: &Ast, id: NodeId, env: &mut Environment) -> Result<Option<i64>, EvalError> {
    eval_recur(ast, id, env, 0)
}

fn eval_recur(ast: &Ast, id: NodeId, env: &mut Environment, depth: usize)
    -> Result<Option<i64>, EvalError>
{
    trace_calculating(ast, id, depth);

    let result = match ast.kind(id) {
        NodeKind::Program(statements) => {
            let mut result = None;
            for statement in statements {
                result = eval_recur(ast, *statement, env, depth + 1)?;
            }
            result
        },
        NodeKind::IntDeclaration { name, init } => {
            let value = match init {
                Some(init) => Some(eval_int(ast, *init, env, depth + 1)?),
                None => None,
            };
            env.declare(name, value);
            value
        },
        NodeKind::AssignmentStmt { name, value } => {
            if !env.is_declared(name) {
                return Err(EvalError::UnknownVariable(name.clone()));
            }
            let value = eval_int(ast, *value, env, depth + 1)?;
            env.assign(name, value)?;
            Some(value)
        },
        NodeKind::Additive { .. } | NodeKind::Multiplicative { .. } => {
            Some(eval_chain(ast, id, env, depth)?)
        },
        NodeKind::IntLiteral(text) => {
            let value = text
                .parse::<i64>()
                .map_err(|_| EvalError::InvalidLiteral(text.clone()))?;
            Some(value)
        },
        NodeKind::Identifier(name) => Some(env.get(name)?),
    };

    trace_result(depth, result);
    Ok(result)
}

#[derive(Debug, Copy, Clone)]
enum Operator {
    Additive(AdditiveOp),
    Multiplicative(MultiplicativeOp),
}

impl Operator {
    fn apply(self, lhs: i64, rhs: i64) -> Result<i64, EvalError> {
        let (result, operator) = match self {
            Operator::Additive(op) => {
                let result = match op {
                    AdditiveOp::Plus => lhs.checked_add(rhs),
                    AdditiveOp::Minus => lhs.checked_sub(rhs),
                };
                (result, op.symbol())
            },
            Operator::Multiplicative(op) => {
                let result = match op {
                    MultiplicativeOp::Star => lhs.checked_mul(rhs),
                    MultiplicativeOp::Slash => {
                        if rhs == 0 {
                            return Err(EvalError::DivisionByZero);
                        }
                        lhs.checked_div(rhs)
                    },
                };
                (result, op.symbol())
            },
        };
        result.ok_or(EvalError::Overflow { lhs, operator, rhs })
    }
}

fn binary(kind: &NodeKind) -> Option<(Operator, NodeId, NodeId)> {
    match *kind {
        NodeKind::Additive { op, lhs, rhs } => Some((Operator::Additive(op), lhs, rhs)),
        NodeKind::Multiplicative { op, lhs, rhs } => Some((Operator::Multiplicative(op), lhs, rhs)),
        _ => None,
    }
}

// Operator chains are left-deep and can be as long as the input, so the left
// spine is walked with an explicit stack and only right operands recurse.
// Right operands nest no deeper than the parentheses the parser allows.
fn eval_chain(ast: &Ast, id: NodeId, env: &mut Environment, depth: usize) -> Result<i64, EvalError> {
    let mut spine = Vec::new();
    let mut leftmost = id;
    while let Some((op, lhs, rhs)) = binary(ast.kind(leftmost)) {
        if leftmost != id {
            trace_calculating(ast, leftmost, depth + spine.len());
        }
        spine.push((op, rhs));
        leftmost = lhs;
    }

    let mut value = eval_int(ast, leftmost, env, depth + spine.len())?;
    while let Some((op, rhs)) = spine.pop() {
        let rhs = eval_int(ast, rhs, env, depth + spine.len() + 1)?;
        value = op.apply(value, rhs)?;
        // the caller reports the outermost result.
        if !spine.is_empty() {
            trace_result(depth + spine.len(), Some(value));
        }
    }
    Ok(value)
}

fn trace_calculating(ast: &Ast, id: NodeId, depth: usize) {
    let node = ast.node(id);
    debug!(depth, node = %node.node_type(), text = node.text(), "calculating");
}

fn trace_result(depth: usize, result: Option<i64>) {
    debug!(depth, ?result, "result");
}

// Evaluates a node that always yields a value: any expression.
fn eval_int(ast: &Ast, id: NodeId, env: &mut Environment, depth: usize) -> Result<i64, EvalError> {
    match eval_recur(ast, id, env, depth)? {
        Some(value) => Ok(value),
        // only statements can come out empty, and they never nest in expressions.
        None => Err(EvalError::UninitializedVariable(ast.text(id).to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, parse_expression};

    fn run(source: &str) -> Result<Option<i64>, EvalError> {
        let ast = parse(source).expect("test source should parse");
        evaluate(&ast, &mut Environment::new())
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(run("10-3-2;"), Ok(Some(5)));
    }

    #[test]
    fn precedence() {
        assert_eq!(run("2+3*5;"), Ok(Some(17)));
        assert_eq!(run("(2+3)*5;"), Ok(Some(25)));
    }

    #[test]
    fn multiplication_chain() {
        assert_eq!(run("2*3*4;"), Ok(Some(24)));
    }

    #[test]
    fn division_is_left_associative_and_truncating() {
        assert_eq!(run("100/10/5;"), Ok(Some(2)));
        assert_eq!(run("7/2;"), Ok(Some(3)));
        assert_eq!(run("(0-7)/2;"), Ok(Some(-3)));
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(run("1/0;"), Err(EvalError::DivisionByZero));
        assert_eq!(run("int z = 0; 5/z;"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn overflow() {
        assert_eq!(
            run("9223372036854775807 + 1;"),
            Err(EvalError::Overflow {
                lhs: i64::MAX,
                operator: "+",
                rhs: 1
            })
        );
    }

    #[test]
    fn literal_out_of_range() {
        assert_eq!(
            run("99999999999999999999;"),
            Err(EvalError::InvalidLiteral("99999999999999999999".to_string()))
        );
    }

    #[test]
    fn long_addition_chain() {
        let source = format!("1{};", "+1".repeat(50_000));
        assert_eq!(run(&source), Ok(Some(50_001)));
    }

    #[test]
    fn long_mixed_chain_keeps_order() {
        // the last term is 1*2/2, the rest subtracts left to right.
        let source = format!("100{}*2/2;", "-1".repeat(50_000));
        assert_eq!(run(&source), Ok(Some(100 - 50_000)));
    }

    #[test]
    fn long_multiplication_chain() {
        let source = format!("1{};", "*1".repeat(50_000));
        assert_eq!(run(&source), Ok(Some(1)));

        let source = format!("2{};", "*2".repeat(50_000));
        assert_eq!(
            run(&source),
            Err(EvalError::Overflow {
                lhs: 1 << 62,
                operator: "*",
                rhs: 2
            })
        );
    }

    #[test]
    fn error_deep_in_chain() {
        let source = format!("1{}/0{};", "+1".repeat(20_000), "+1".repeat(20_000));
        assert_eq!(run(&source), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn deepest_right_nesting() {
        use crate::parser::MAX_NESTING;
        let source = format!("{}1{};", "1+(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(run(&source), Ok(Some(MAX_NESTING as i64 + 1)));
    }

    #[test]
    fn program_value_is_last_statement() {
        assert_eq!(run("1; 2; 3;"), Ok(Some(3)));
        assert_eq!(run(""), Ok(None));
    }

    #[test]
    fn declaration_and_assignment() {
        let mut env = Environment::new();
        let ast = parse("int age = 10; int b; b = 10*2; age = age + b;").unwrap();
        assert_eq!(evaluate(&ast, &mut env), Ok(Some(30)));
        assert_eq!(env.get("age"), Ok(30));
        assert_eq!(env.get("b"), Ok(20));
    }

    #[test]
    fn declaration_without_initializer_has_no_value() {
        let mut env = Environment::new();
        assert_eq!(evaluate(&parse("int a;").unwrap(), &mut env), Ok(None));
        assert!(env.is_declared("a"));
        assert_eq!(env.variables(), vec![("a", None)]);
    }

    #[test]
    fn redeclaration_overwrites() {
        let mut env = Environment::new();
        evaluate(&parse("int a = 1;").unwrap(), &mut env).unwrap();
        evaluate(&parse("int a;").unwrap(), &mut env).unwrap();
        assert_eq!(env.get("a"), Err(EvalError::UninitializedVariable("a".to_string())));
        evaluate(&parse("int a = 7;").unwrap(), &mut env).unwrap();
        assert_eq!(env.get("a"), Ok(7));
    }

    #[test]
    fn assignment_to_undeclared() {
        assert_eq!(run("int a = 45; b = 10;"), Err(EvalError::UnknownVariable("b".to_string())));
    }

    #[test]
    fn unknown_variable_checked_before_value() {
        // the right-hand side would fail too, but the target is checked first.
        assert_eq!(run("b = c;"), Err(EvalError::UnknownVariable("b".to_string())));
    }

    #[test]
    fn uninitialized_read() {
        assert_eq!(run("int a; a;"), Err(EvalError::UninitializedVariable("a".to_string())));
    }

    #[test]
    fn undefined_read() {
        assert_eq!(run("x + 1;"), Err(EvalError::UndefinedVariable("x".to_string())));
    }

    #[test]
    fn self_reference_in_initializer() {
        assert_eq!(run("int a = a;"), Err(EvalError::UndefinedVariable("a".to_string())));
    }

    #[test]
    fn error_keeps_earlier_effects() {
        let mut env = Environment::new();
        let ast = parse("int a = 1; a = 2; b = 3; a = 4;").unwrap();
        assert!(evaluate(&ast, &mut env).is_err());
        assert_eq!(env.get("a"), Ok(2));
    }

    #[test]
    fn evaluate_single_statement() {
        let mut env = Environment::new();
        let ast = parse("int a = 45; b = 10;").unwrap();
        let statements = ast.statements();
        assert_eq!(evaluate_node(&ast, statements[0], &mut env), Ok(Some(45)));
        assert_eq!(
            evaluate_node(&ast, statements[1], &mut env),
            Err(EvalError::UnknownVariable("b".to_string()))
        );
    }

    #[test]
    fn calculation_uses_environment() {
        let mut env = Environment::new();
        env.declare("x", Some(4));
        let ast = parse_expression("x*x - 1").unwrap();
        assert_eq!(evaluate(&ast, &mut env), Ok(Some(15)));
    }

    #[test]
    fn separate_sessions_do_not_share() {
        let mut first = Environment::new();
        let mut second = Environment::new();
        evaluate(&parse("int a = 1;").unwrap(), &mut first).unwrap();
        assert_eq!(
            evaluate(&parse("a;").unwrap(), &mut second),
            Err(EvalError::UndefinedVariable("a".to_string()))
        );
    }

    #[test]
    fn names_with_prefix_sorted() {
        let mut env = Environment::new();
        env.declare("apple", Some(1));
        env.declare("age", None);
        env.declare("bee", Some(2));
        assert_eq!(env.names_with_prefix("a"), vec!["age", "apple"]);
        assert_eq!(env.names_with_prefix(""), vec!["age", "apple", "bee"]);
        assert!(env.names_with_prefix("z").is_empty());
    }

    #[test]
    fn assign_requires_declaration() {
        let mut env = Environment::new();
        assert_eq!(env.assign("q", 1), Err(EvalError::UnknownVariable("q".to_string())));
        env.declare("q", None);
        assert_eq!(env.assign("q", 1), Ok(()));
        assert_eq!(env.get("q"), Ok(1));
    }
}
