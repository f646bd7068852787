//! # Symbolic Engine Module
//!
//! Core symbolic expression type for the equation purification pipeline. An equation
//! discovered by a data-driven method arrives as a string; this module gives it a tree
//! representation that the rest of the crate can take apart into additive terms,
//! evaluate over sample data, and print back in a canonical text form.
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! The symbolic expression type supporting:
//! - **Variables**: `Var(String)` - symbolic variables like "x", "y"
//! - **Constants**: `Const(f64)` - numerical constants
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow` - basic arithmetic
//! - **Functions**: `Exp`, `Ln`, `sin`, `cos`, `tg`, `ctg` - mathematical functions
//!
//! ### Key Methods
//! - `Symbols(symbols: &str)` - Create multiple variables from comma-separated string
//! - `parse_expression(input: &str)` - Parse a string into an expression tree
//! - `set_variable()` / `set_variable_from_map()` - Substitute variables with values
//! - `extract_variables()` - Collect the variable names an expression references
//!
//! ## Canonical rendering
//!
//! `Display` prints the minimal-parenthesis infix form with `**` for powers:
//! `-3*x**2`, `2*sin(x)`, `0.099*y/z`, `x/(y*z)`. The printed text is a contract, not
//! a convenience: term ordering throughout the crate is the byte-wise comparison of
//! the rendered pure-term text, and downstream tooling may re-parse printed equations.
//! A summand whose leading numeric factor is negative is folded into the surrounding
//! sum sign, so `a + (-3)*x` prints as `a - 3*x`.

#![allow(non_camel_case_types)]

use std::collections::HashMap;
use std::fmt;

/// Core symbolic expression enum representing mathematical expressions as an abstract syntax tree.
///
/// Each variant represents a different type of mathematical construct, from simple variables
/// and constants to nested operations. The enum uses Box<Expr> for recursive structures,
/// allowing arbitrarily deep expression trees.
///
/// # Examples
/// ```rust, ignore
/// use symbolic_engine::Expr;
/// let x = Expr::Var("x".to_string());
/// let expr = Expr::Add(Box::new(x), Box::new(Expr::Const(2.0)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable with a name (e.g., "x", "y", "velocity")
    Var(String),
    /// Numerical constant value
    Const(f64),
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ** exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Exponential function: e^x
    Exp(Box<Expr>),
    /// Natural logarithm: ln(x)
    Ln(Box<Expr>),
    /// Sine function: sin(x)
    sin(Box<Expr>),
    /// Cosine function: cos(x)
    cos(Box<Expr>),
    /// Tangent function: tan(x) - uses mathematical notation 'tg'
    tg(Box<Expr>),
    /// Cotangent function: cot(x) - uses mathematical notation 'ctg'
    ctg(Box<Expr>),
}

// Operator precedence levels used by the canonical renderer: sums (1), products and
// quotients (2), powers (3), atoms and function calls (4).
impl Expr {
    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(_, _) | Expr::Sub(_, _) => 1,
            Expr::Mul(_, _) | Expr::Div(_, _) => 2,
            Expr::Pow(_, _) => 3,
            _ => 4,
        }
    }

    /// True when the expression would print with a leading minus sign: a negative
    /// constant, or a product/quotient whose leading factor does.
    pub fn has_negative_head(&self) -> bool {
        match self {
            Expr::Const(val) => *val < 0.0,
            Expr::Mul(lhs, _) => lhs.has_negative_head(),
            Expr::Div(num, _) => num.has_negative_head(),
            _ => false,
        }
    }

    /// The same expression with the sign of its leading numeric factor flipped.
    /// Used by the renderer to fold `a + (-c)*x` into `a - c*x`.
    pub fn negated_head(&self) -> Expr {
        match self {
            Expr::Const(val) => Expr::Const(-val),
            Expr::Mul(lhs, rhs) => Expr::Mul(lhs.negated_head().boxed(), rhs.clone()),
            Expr::Div(num, den) => Expr::Div(num.negated_head().boxed(), den.clone()),
            other => Expr::Mul(Expr::Const(-1.0).boxed(), other.clone().boxed()),
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter, parent: u8) -> fmt::Result {
        // unit coefficients never reach the printed text
        if let Expr::Mul(lhs, rhs) = self {
            if **lhs == Expr::Const(1.0) {
                return rhs.fmt_prec(f, parent);
            }
            if **lhs == Expr::Const(-1.0) {
                let needs_parens = parent >= 2;
                if needs_parens {
                    write!(f, "(")?;
                }
                write!(f, "-")?;
                rhs.fmt_prec(f, 2)?;
                if needs_parens {
                    write!(f, ")")?;
                }
                return Ok(());
            }
        }
        let needs_parens = self.precedence() < parent;
        if needs_parens {
            write!(f, "(")?;
        }
        match self {
            Expr::Var(name) => write!(f, "{}", name)?,
            Expr::Const(val) => write!(f, "{}", val)?,
            Expr::Add(lhs, rhs) => {
                lhs.fmt_prec(f, 1)?;
                if rhs.has_negative_head() {
                    write!(f, " - ")?;
                    rhs.negated_head().fmt_prec(f, 2)?;
                } else {
                    write!(f, " + ")?;
                    rhs.fmt_prec(f, 2)?;
                }
            }
            Expr::Sub(lhs, rhs) => {
                lhs.fmt_prec(f, 1)?;
                if rhs.has_negative_head() {
                    write!(f, " + ")?;
                    rhs.negated_head().fmt_prec(f, 2)?;
                } else {
                    write!(f, " - ")?;
                    rhs.fmt_prec(f, 2)?;
                }
            }
            Expr::Mul(lhs, rhs) => {
                lhs.fmt_prec(f, 2)?;
                write!(f, "*")?;
                rhs.fmt_prec(f, 2)?;
            }
            Expr::Div(num, den) => {
                num.fmt_prec(f, 2)?;
                write!(f, "/")?;
                den.fmt_prec(f, 3)?;
            }
            Expr::Pow(base, exp) => {
                // a negative constant base must keep its parentheses: -3**2 re-parses
                // as -(3**2)
                if base.has_negative_head() {
                    write!(f, "(")?;
                    base.fmt_prec(f, 0)?;
                    write!(f, ")")?;
                } else {
                    base.fmt_prec(f, 4)?;
                }
                write!(f, "**")?;
                exp.fmt_prec(f, 3)?;
            }
            Expr::Exp(expr) => write!(f, "exp({})", expr)?,
            Expr::Ln(expr) => write!(f, "ln({})", expr)?,
            Expr::sin(expr) => write!(f, "sin({})", expr)?,
            Expr::cos(expr) => write!(f, "cos({})", expr)?,
            Expr::tg(expr) => write!(f, "tg({})", expr)?,
            Expr::ctg(expr) => write!(f, "ctg({})", expr)?,
        }
        if needs_parens {
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Canonical rendering of symbolic expressions.
///
/// Minimal parentheses, `**` for powers, no spaces inside products, single spaces
/// around the `+`/`-` of a sum. This text form defines the term ordering used by the
/// decomposer, so any change here changes the observable output order.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}
impl std::ops::AddAssign for Expr {
    fn add_assign(&mut self, rhs: Self) {
        *self = Expr::Add(Box::new(self.clone()), Box::new(rhs));
    }
}

impl std::ops::SubAssign for Expr {
    fn sub_assign(&mut self, rhs: Self) {
        *self = Expr::Sub(Box::new(self.clone()), Box::new(rhs));
    }
}

impl std::ops::MulAssign for Expr {
    fn mul_assign(&mut self, rhs: Self) {
        *self = Expr::Mul(Box::new(self.clone()), Box::new(rhs));
    }
}

impl std::ops::DivAssign for Expr {
    fn div_assign(&mut self, rhs: Self) {
        *self = Expr::Div(Box::new(self.clone()), Box::new(rhs));
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

impl Expr {
    /// BASIC FEATURES

    /// Creates multiple symbolic variables from a comma-separated string.
    ///
    /// Parses a string containing variable names separated by commas and returns
    /// a vector of Expr::Var instances. Whitespace is automatically trimmed.
    ///
    /// # Arguments
    /// * `symbols` - Comma-separated string of variable names (e.g., "x, y, z")
    ///
    /// # Returns
    /// Vector of Expr::Var instances for each variable name
    ///
    /// # Examples
    /// ```rust, ignore
    /// let vars = Expr::Symbols("x, y, z");
    /// assert_eq!(vars.len(), 3);
    /// ```
    pub fn Symbols(symbols: &str) -> Vec<Expr> {
        let symbols = symbols.to_string();
        let vec_trimmed: Vec<String> = symbols.split(',').map(|s| s.trim().to_string()).collect();
        let vector_of_symbolic_vars: Vec<Expr> = vec_trimmed
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| Expr::Var(s.to_string()))
            .collect();
        vector_of_symbolic_vars
    }

    /// Substitutes a variable with a constant value throughout the expression.
    ///
    /// Recursively traverses the expression tree and replaces all occurrences
    /// of the specified variable with the given constant value.
    ///
    /// # Arguments
    /// * `var` - Name of the variable to substitute
    /// * `value` - Numerical value to substitute for the variable
    ///
    /// # Returns
    /// New expression with the variable substituted
    pub fn set_variable(&self, var: &str, value: f64) -> Expr {
        match self {
            Expr::Var(name) if name == var => Expr::Const(value),
            Expr::Add(lhs, rhs) => Expr::Add(
                Box::new(lhs.set_variable(var, value)),
                Box::new(rhs.set_variable(var, value)),
            ),
            Expr::Sub(lhs, rhs) => Expr::Sub(
                Box::new(lhs.set_variable(var, value)),
                Box::new(rhs.set_variable(var, value)),
            ),
            Expr::Mul(lhs, rhs) => Expr::Mul(
                Box::new(lhs.set_variable(var, value)),
                Box::new(rhs.set_variable(var, value)),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(lhs.set_variable(var, value)),
                Box::new(rhs.set_variable(var, value)),
            ),
            Expr::Pow(base, exp) => Expr::Pow(
                Box::new(base.set_variable(var, value)),
                Box::new(exp.set_variable(var, value)),
            ),
            Expr::Exp(expr) => Expr::Exp(Box::new(expr.set_variable(var, value))),
            Expr::Ln(expr) => Expr::Ln(Box::new(expr.set_variable(var, value))),
            Expr::sin(expr) => Expr::sin(Box::new(expr.set_variable(var, value))),
            Expr::cos(expr) => Expr::cos(Box::new(expr.set_variable(var, value))),
            Expr::tg(expr) => Expr::tg(Box::new(expr.set_variable(var, value))),
            Expr::ctg(expr) => Expr::ctg(Box::new(expr.set_variable(var, value))),
            _ => self.clone(),
        }
    }

    /// Substitutes multiple variables with constant values using a HashMap.
    ///
    /// More efficient than multiple set_variable calls when substituting many variables.
    /// Only variables present in the map are substituted.
    ///
    /// # Arguments
    /// * `var_map` - HashMap mapping variable names to their replacement values
    ///
    /// # Returns
    /// New expression with all mapped variables substituted
    pub fn set_variable_from_map(&self, var_map: &HashMap<String, f64>) -> Expr {
        match self {
            Expr::Var(name) if var_map.contains_key(name) => Expr::Const(var_map[name]),
            Expr::Add(lhs, rhs) => Expr::Add(
                Box::new(lhs.set_variable_from_map(var_map)),
                Box::new(rhs.set_variable_from_map(var_map)),
            ),
            Expr::Sub(lhs, rhs) => Expr::Sub(
                Box::new(lhs.set_variable_from_map(var_map)),
                Box::new(rhs.set_variable_from_map(var_map)),
            ),
            Expr::Mul(lhs, rhs) => Expr::Mul(
                Box::new(lhs.set_variable_from_map(var_map)),
                Box::new(rhs.set_variable_from_map(var_map)),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(lhs.set_variable_from_map(var_map)),
                Box::new(rhs.set_variable_from_map(var_map)),
            ),
            Expr::Pow(base, exp) => Expr::Pow(
                Box::new(base.set_variable_from_map(var_map)),
                Box::new(exp.set_variable_from_map(var_map)),
            ),
            Expr::Exp(expr) => Expr::Exp(Box::new(expr.set_variable_from_map(var_map))),
            Expr::Ln(expr) => Expr::Ln(Box::new(expr.set_variable_from_map(var_map))),
            Expr::sin(expr) => Expr::sin(Box::new(expr.set_variable_from_map(var_map))),
            Expr::cos(expr) => Expr::cos(Box::new(expr.set_variable_from_map(var_map))),
            Expr::tg(expr) => Expr::tg(Box::new(expr.set_variable_from_map(var_map))),
            Expr::ctg(expr) => Expr::ctg(Box::new(expr.set_variable_from_map(var_map))),
            _ => self.clone(),
        }
    }

    /// Checks whether the expression is a bare numeric literal.
    ///
    /// Only `Const` counts: a composite expression over constants (like `2*3`) is not
    /// a literal, matching how the term decomposer partitions multiplicative factors.
    pub fn is_const(&self) -> bool {
        matches!(self, Expr::Const(_))
    }

    /// Checks whether the expression references the given variable anywhere in its tree.
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            Expr::Const(_) => false,
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => {
                lhs.contains_variable(var_name) || rhs.contains_variable(var_name)
            }
            Expr::Exp(expr)
            | Expr::Ln(expr)
            | Expr::sin(expr)
            | Expr::cos(expr)
            | Expr::tg(expr)
            | Expr::ctg(expr) => expr.contains_variable(var_name),
        }
    }

    /// Collects the names of all variables referenced by the expression.
    ///
    /// # Returns
    /// Sorted, deduplicated vector of variable names
    pub fn extract_variables(&self) -> Vec<String> {
        fn collect(expr: &Expr, vars: &mut Vec<String>) {
            match expr {
                Expr::Var(name) => vars.push(name.clone()),
                Expr::Const(_) => {}
                Expr::Add(lhs, rhs)
                | Expr::Sub(lhs, rhs)
                | Expr::Mul(lhs, rhs)
                | Expr::Div(lhs, rhs)
                | Expr::Pow(lhs, rhs) => {
                    collect(lhs, vars);
                    collect(rhs, vars);
                }
                Expr::Exp(inner)
                | Expr::Ln(inner)
                | Expr::sin(inner)
                | Expr::cos(inner)
                | Expr::tg(inner)
                | Expr::ctg(inner) => collect(inner, vars),
            }
        }
        let mut vars = Vec::new();
        collect(self, &mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }
}
