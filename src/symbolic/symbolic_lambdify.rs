use crate::symbolic::symbolic_engine::Expr;
use std::fmt;

/// Errors of binding expression variables to data columns.
///
/// Binding is resolved by name at compile time, never by silent positional
/// zipping: a symbol the variable list does not know, a repeated name, or a
/// data row of the wrong width all fail loudly before any number is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingError {
    UnboundVariable { variable: String, expression: String },
    DuplicateVariable { variable: String },
    DimensionMismatch { expected: usize, found: usize },
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BindingError::UnboundVariable {
                variable,
                expression,
            } => write!(
                f,
                "Variable '{}' in '{}' is not in the variable list",
                variable, expression
            ),
            BindingError::DuplicateVariable { variable } => {
                write!(f, "Variable '{}' appears twice in the variable list", variable)
            }
            BindingError::DimensionMismatch { expected, found } => write!(
                f,
                "Expected {} values to bind, found {}",
                expected, found
            ),
        }
    }
}

impl std::error::Error for BindingError {}

/// Rejects variable lists that cannot define an unambiguous binding.
pub fn validate_variable_names(variable_names: &[String]) -> Result<(), BindingError> {
    for (i, name) in variable_names.iter().enumerate() {
        if variable_names[..i].contains(name) {
            return Err(BindingError::DuplicateVariable {
                variable: name.clone(),
            });
        }
    }
    Ok(())
}

/// Compiled, slot-resolved form of an expression.
///
/// Variables are replaced by positions into the argument slice, so evaluation
/// is a plain recursive fold with no name lookups. Compile once per term,
/// evaluate once per sample row.
#[derive(Debug, Clone, PartialEq)]
pub enum Lambda {
    Var(usize),
    Const(f64),
    Add(Box<Lambda>, Box<Lambda>),
    Sub(Box<Lambda>, Box<Lambda>),
    Mul(Box<Lambda>, Box<Lambda>),
    Div(Box<Lambda>, Box<Lambda>),
    Pow(Box<Lambda>, Box<Lambda>),
    Exp(Box<Lambda>),
    Ln(Box<Lambda>),
    Sin(Box<Lambda>),
    Cos(Box<Lambda>),
    Tg(Box<Lambda>),
    Ctg(Box<Lambda>),
}

impl Expr {
    /// Resolves every variable of the expression to its slot in `variable_names`.
    ///
    /// Fails with [`BindingError::UnboundVariable`] when the expression references
    /// a symbol the list does not contain.
    pub fn compile(&self, variable_names: &[String]) -> Result<Lambda, BindingError> {
        match self {
            Expr::Var(name) => match variable_names.iter().position(|v| v == name) {
                Some(idx) => Ok(Lambda::Var(idx)),
                None => Err(BindingError::UnboundVariable {
                    variable: name.clone(),
                    expression: self.to_string(),
                }),
            },
            Expr::Const(v) => Ok(Lambda::Const(*v)),
            Expr::Add(a, b) => Ok(Lambda::Add(
                Box::new(a.compile(variable_names)?),
                Box::new(b.compile(variable_names)?),
            )),
            Expr::Sub(a, b) => Ok(Lambda::Sub(
                Box::new(a.compile(variable_names)?),
                Box::new(b.compile(variable_names)?),
            )),
            Expr::Mul(a, b) => Ok(Lambda::Mul(
                Box::new(a.compile(variable_names)?),
                Box::new(b.compile(variable_names)?),
            )),
            Expr::Div(a, b) => Ok(Lambda::Div(
                Box::new(a.compile(variable_names)?),
                Box::new(b.compile(variable_names)?),
            )),
            Expr::Pow(a, b) => Ok(Lambda::Pow(
                Box::new(a.compile(variable_names)?),
                Box::new(b.compile(variable_names)?),
            )),
            Expr::Exp(e) => Ok(Lambda::Exp(Box::new(e.compile(variable_names)?))),
            Expr::Ln(e) => Ok(Lambda::Ln(Box::new(e.compile(variable_names)?))),
            Expr::sin(e) => Ok(Lambda::Sin(Box::new(e.compile(variable_names)?))),
            Expr::cos(e) => Ok(Lambda::Cos(Box::new(e.compile(variable_names)?))),
            Expr::tg(e) => Ok(Lambda::Tg(Box::new(e.compile(variable_names)?))),
            Expr::ctg(e) => Ok(Lambda::Ctg(Box::new(e.compile(variable_names)?))),
        }
    }

    /// Numeric value of a fully substituted expression.
    ///
    /// The substitution counterpart of the compiled path: apply
    /// `set_variable_from_map` first, then fold what remains. A leftover
    /// variable means the binding was incomplete.
    pub fn eval_number(&self) -> Result<f64, BindingError> {
        match self {
            Expr::Var(name) => Err(BindingError::UnboundVariable {
                variable: name.clone(),
                expression: self.to_string(),
            }),
            Expr::Const(v) => Ok(*v),
            Expr::Add(a, b) => Ok(a.eval_number()? + b.eval_number()?),
            Expr::Sub(a, b) => Ok(a.eval_number()? - b.eval_number()?),
            Expr::Mul(a, b) => Ok(a.eval_number()? * b.eval_number()?),
            Expr::Div(a, b) => Ok(a.eval_number()? / b.eval_number()?),
            Expr::Pow(a, b) => Ok(a.eval_number()?.powf(b.eval_number()?)),
            Expr::Exp(e) => Ok(e.eval_number()?.exp()),
            Expr::Ln(e) => Ok(e.eval_number()?.ln()),
            Expr::sin(e) => Ok(e.eval_number()?.sin()),
            Expr::cos(e) => Ok(e.eval_number()?.cos()),
            Expr::tg(e) => Ok(e.eval_number()?.tan()),
            Expr::ctg(e) => Ok(1.0 / e.eval_number()?.tan()),
        }
    }
}

impl Lambda {
    #[inline(always)]
    pub fn eval(&self, args: &[f64]) -> f64 {
        match self {
            Lambda::Var(i) => args[*i],
            Lambda::Const(v) => *v,
            Lambda::Add(a, b) => a.eval(args) + b.eval(args),
            Lambda::Sub(a, b) => a.eval(args) - b.eval(args),
            Lambda::Mul(a, b) => a.eval(args) * b.eval(args),
            Lambda::Div(a, b) => a.eval(args) / b.eval(args),
            Lambda::Pow(a, b) => a.eval(args).powf(b.eval(args)),
            Lambda::Exp(e) => e.eval(args).exp(),
            Lambda::Ln(e) => e.eval(args).ln(),
            Lambda::Sin(e) => e.eval(args).sin(),
            Lambda::Cos(e) => e.eval(args).cos(),
            Lambda::Tg(e) => e.eval(args).tan(),
            Lambda::Ctg(e) => 1.0 / e.eval(args).tan(),
        }
    }

    /// Optional API for compatibility with closure-based code
    pub fn as_closure(self) -> impl Fn(&[f64]) -> f64 + Send + Sync {
        move |args| self.eval(args)
    }
}

/// One-shot evaluation of a term at a single sample row.
///
/// Validates the row width, compiles, evaluates. Prefer compiling once and
/// reusing the [`Lambda`] when the same term is evaluated over many rows.
pub fn evaluate_term(
    term: &Expr,
    variable_names: &[String],
    values: &[f64],
) -> Result<f64, BindingError> {
    if variable_names.len() != values.len() {
        return Err(BindingError::DimensionMismatch {
            expected: variable_names.len(),
            found: values.len(),
        });
    }
    validate_variable_names(variable_names)?;
    let lambda = term.compile(variable_names)?;
    Ok(lambda.eval(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_compile_resolves_slots() {
        let expr = Expr::parse_expression("y + 2*x").unwrap();
        let lambda = expr.compile(&names(&["x", "y"])).unwrap();
        // x binds to slot 0, y to slot 1, not to their order of appearance
        assert_relative_eq!(lambda.eval(&[10.0, 1.0]), 21.0);
    }

    #[test]
    fn test_compile_rejects_unbound_variable() {
        let expr = Expr::parse_expression("x + q").unwrap();
        let err = expr.compile(&names(&["x", "y"])).unwrap_err();
        assert_eq!(
            err,
            BindingError::UnboundVariable {
                variable: "q".to_string(),
                expression: "q".to_string()
            }
        );
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let err = validate_variable_names(&names(&["x", "y", "x"])).unwrap_err();
        assert_eq!(
            err,
            BindingError::DuplicateVariable {
                variable: "x".to_string()
            }
        );
        assert!(validate_variable_names(&names(&["x", "y", "z"])).is_ok());
    }

    #[test]
    fn test_evaluate_term_checks_row_width() {
        let expr = Expr::parse_expression("x + y").unwrap();
        let err = evaluate_term(&expr, &names(&["x", "y"]), &[1.0]).unwrap_err();
        assert_eq!(
            err,
            BindingError::DimensionMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_eval_matches_substitution_path() {
        let expr = Expr::parse_expression("2*sin(x) - 3*x**2 + x/y + exp(y)").unwrap();
        let vars = names(&["x", "y"]);
        let lambda = expr.compile(&vars).unwrap();
        for (x, y) in [(0.5, 1.0), (-1.2, 2.0), (3.0, 0.25)] {
            let mut map = HashMap::new();
            map.insert("x".to_string(), x);
            map.insert("y".to_string(), y);
            let substituted = expr.set_variable_from_map(&map).eval_number().unwrap();
            assert_relative_eq!(lambda.eval(&[x, y]), substituted, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_eval_number_reports_leftover_variable() {
        let expr = Expr::parse_expression("x + y").unwrap();
        let partially = expr.set_variable("x", 1.0);
        let err = partially.eval_number().unwrap_err();
        assert_eq!(
            err,
            BindingError::UnboundVariable {
                variable: "y".to_string(),
                expression: "y".to_string()
            }
        );
    }

    #[test]
    fn test_closure_wrapper() {
        let expr = Expr::parse_expression("x*y").unwrap();
        let f = expr.compile(&names(&["x", "y"])).unwrap().as_closure();
        assert_relative_eq!(f(&[3.0, 4.0]), 12.0);
    }

    #[test]
    fn test_ieee_semantics_in_eval() {
        // evaluation itself is total; finiteness is policed by the aggregator
        let expr = Expr::parse_expression("1/x").unwrap();
        let lambda = expr.compile(&names(&["x"])).unwrap();
        assert!(lambda.eval(&[0.0]).is_infinite());
        let expr = Expr::parse_expression("ln(x)").unwrap();
        let lambda = expr.compile(&names(&["x"])).unwrap();
        assert!(lambda.eval(&[-1.0]).is_nan());
    }
}
