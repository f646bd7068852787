#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// a module turns a String expression into a symbolic expression
///
///# Example
/// ```
/// use RustedPurifier::symbolic::symbolic_engine::Expr;
/// let input = "3*y+2*sin(x)-3*x**2+2*x*y";
/// let parsed_expression = Expr::parse_expression(input).unwrap();
/// println!(" parsed_expression {}", parsed_expression);
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// a module
/// 1) turns a String expression into a symbolic expression
/// 2) renders a symbolic expression back into canonical string form for printing and term ordering
/// 3) substitutes variables with numeric values
///# Example#
/// ```
/// use RustedPurifier::symbolic::symbolic_engine::Expr;
/// let input = "2*sin(x) + y/z - x**2";
/// // here you've got symbolic expression
/// let parsed_expression = Expr::parse_expression(input).unwrap();
/// println!(" parsed_expression {}", parsed_expression);
/// // canonical text form: minimal parentheses, ** for powers
/// let printed = parsed_expression.to_string();
/// println!("{}, canonical form: {}  \n", input, printed);
/// // return vec of all variables
/// let variables = parsed_expression.extract_variables();
/// println!("variables {:?}", variables);
/// // substitute a variable with a value
/// let substituted = parsed_expression.set_variable("y", 2.0);
/// println!("substituted {}", substituted);
/// ```
/// ________________________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
///________________________________________________________________________________________________________________________________________________
///
/// compile a symbolic expression into a slot-resolved evaluator
/// Example#
/// ```
/// use RustedPurifier::symbolic::symbolic_engine::Expr;
/// let expr = Expr::parse_expression("x**2 + y").unwrap();
/// let names: Vec<String> = vec!["x".to_string(), "y".to_string()];
/// // variables resolve to slots by name, unknown symbols are an error
/// let compiled = expr.compile(&names).unwrap();
/// let value = compiled.eval(&[2.0, 1.0]);
/// println!("value = {}", value);
/// ```
pub mod symbolic_lambdify;
///______________________________________________________________________________________________________________________________________________
/// additive term flattening and coefficient splitting: the structural view the
/// purification pipeline works on
///# Example#
/// ```
/// use RustedPurifier::symbolic::symbolic_engine::Expr;
/// use RustedPurifier::symbolic::symbolic_terms::{flatten_add, split_coefficient};
/// let expr = Expr::parse_expression("3*y - 3*x**2").unwrap();
/// let mut terms = Vec::new();
/// flatten_add(&expr, &mut terms);
/// for term in &terms {
///     let (coefficient, pure_term) = split_coefficient(term);
///     println!("term {} = {} * {}", term, coefficient, pure_term);
/// }
/// ```
/// _____________________________________________________________________________________________________________________________________________
pub mod symbolic_terms;
