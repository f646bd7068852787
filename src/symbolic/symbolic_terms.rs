//! # Term Structure Module
//!
//! Additive and multiplicative structure of parsed equations. The purification
//! pipeline never simplifies algebra; it only needs to see an equation as a flat
//! list of additive terms and to split each term into a numeric coefficient and
//! the non-numeric rest ("pure term"). Both views live here.
//!
//! `flatten_add` walks the Add/Sub spine of a tree and emits one entry per
//! summand, folding subtraction signs into each subtracted term's leading
//! numeric factor (so `a - 3*x` yields the term `-3*x`, not `-1*(3*x)`), and
//! distributing a bare numeric factor over a parenthesized sum (`2*(x+y)` is the
//! two terms `2*x` and `2*y`, matching how such input is conventionally read).
//!
//! `split_coefficient` partitions a term's multiplicative factors into numeric
//! literals and everything else, descending through quotients so that
//! `1.00926*x/z` splits into coefficient `1.00926` and pure term `x/z`.

use crate::symbolic::symbolic_engine::Expr;

fn is_sum(expr: &Expr) -> bool {
    matches!(expr, Expr::Add(_, _) | Expr::Sub(_, _))
}

/// Multiplies a numeric constant into a term's leading coefficient.
///
/// The constant folds into an existing leading numeric factor when the term has
/// one; otherwise it becomes a new leading factor. Quotients scale through the
/// numerator so the denominator text stays untouched.
fn scale_term(c: f64, term: Expr) -> Expr {
    match term {
        Expr::Const(val) => Expr::Const(c * val),
        Expr::Mul(lhs, rhs) => match *lhs {
            Expr::Const(val) => Expr::Mul(Expr::Const(c * val).boxed(), rhs),
            other => Expr::Mul(
                Expr::Const(c).boxed(),
                Expr::Mul(other.boxed(), rhs).boxed(),
            ),
        },
        Expr::Div(num, den) => Expr::Div(scale_term(c, *num).boxed(), den),
        other => Expr::Mul(Expr::Const(c).boxed(), other.boxed()),
    }
}

/// A term with the sign of its leading numeric factor flipped.
pub fn negate_term(term: Expr) -> Expr {
    scale_term(-1.0, term)
}

/// Flattens the Add/Sub spine of an expression into a list of additive terms.
///
/// A non-sum expression yields a single-element list. Subtraction folds the
/// sign into each subtracted summand. A numeric constant multiplied onto (or a
/// sum divided by) a parenthesized sum distributes over it; any deeper product
/// structure is left alone, so `x*(y+z)` stays one term.
pub fn flatten_add(expr: &Expr, out: &mut Vec<Expr>) {
    match expr {
        Expr::Add(a, b) => {
            flatten_add(a, out);
            flatten_add(b, out);
        }
        Expr::Sub(a, b) => {
            flatten_add(a, out);
            let mut subtracted = Vec::new();
            flatten_add(b, &mut subtracted);
            for term in subtracted {
                out.push(negate_term(term));
            }
        }
        Expr::Mul(lhs, rhs) => {
            if let Expr::Const(c) = lhs.as_ref() {
                if is_sum(rhs) {
                    let mut inner = Vec::new();
                    flatten_add(rhs, &mut inner);
                    for term in inner {
                        out.push(scale_term(*c, term));
                    }
                    return;
                }
            }
            if let Expr::Const(c) = rhs.as_ref() {
                if is_sum(lhs) {
                    let mut inner = Vec::new();
                    flatten_add(lhs, &mut inner);
                    for term in inner {
                        out.push(scale_term(*c, term));
                    }
                    return;
                }
            }
            out.push(expr.clone());
        }
        Expr::Div(num, den) => {
            if den.is_const() && is_sum(num) {
                let mut inner = Vec::new();
                flatten_add(num, &mut inner);
                for term in inner {
                    out.push(Expr::Div(term.boxed(), den.clone()));
                }
                return;
            }
            out.push(expr.clone());
        }
        _ => out.push(expr.clone()),
    }
}

// Factors of a term, split by which side of the quotient line they sit on.
// Div swaps the sides for its denominator, so a/(b/c) yields numerator [a, c]
// and denominator [b].
fn collect_factors(expr: &Expr, numerator: &mut Vec<Expr>, denominator: &mut Vec<Expr>) {
    match expr {
        Expr::Mul(a, b) => {
            collect_factors(a, numerator, denominator);
            collect_factors(b, numerator, denominator);
        }
        Expr::Div(num, den) => {
            collect_factors(num, numerator, denominator);
            collect_factors(den, denominator, numerator);
        }
        _ => numerator.push(expr.clone()),
    }
}

/// Splits one additive term into its numeric coefficient and its pure part.
///
/// The coefficient is the product of all numeric-literal factors (denominator
/// literals divide); the pure term is the product/quotient of everything else,
/// factor order preserved. An all-numeric term has pure part 1; a term without
/// numeric factors has coefficient 1. `coefficient * pure_term` always equals
/// the original term.
pub fn split_coefficient(term: &Expr) -> (f64, Expr) {
    let mut numerator = Vec::new();
    let mut denominator = Vec::new();
    collect_factors(term, &mut numerator, &mut denominator);

    let mut coefficient = 1.0;
    let mut pure_num: Option<Expr> = None;
    for factor in numerator {
        match factor {
            Expr::Const(c) => coefficient *= c,
            other => {
                pure_num = Some(match pure_num {
                    Some(acc) => acc * other,
                    None => other,
                })
            }
        }
    }
    let mut pure_den: Option<Expr> = None;
    for factor in denominator {
        match factor {
            Expr::Const(c) => coefficient /= c,
            other => {
                pure_den = Some(match pure_den {
                    Some(acc) => acc * other,
                    None => other,
                })
            }
        }
    }

    let pure_term = match (pure_num, pure_den) {
        (Some(num), Some(den)) => Expr::Div(num.boxed(), den.boxed()),
        (Some(num), None) => num,
        (None, Some(den)) => Expr::Div(Expr::Const(1.0).boxed(), den.boxed()),
        (None, None) => Expr::Const(1.0),
    };
    (coefficient, pure_term)
}

/// Sums a list of terms back into a single expression.
///
/// The empty list sums to the additive identity 0.
pub fn sum_terms(terms: &[Expr]) -> Expr {
    let mut iter = terms.iter().cloned();
    match iter.next() {
        Some(first) => iter.fold(first, |acc, term| acc + term),
        None => Expr::Const(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Expr {
        Expr::parse_expression(input).unwrap()
    }

    fn flattened(input: &str) -> Vec<String> {
        let mut terms = Vec::new();
        flatten_add(&parse(input), &mut terms);
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_flatten_simple_sum() {
        assert_eq!(flattened("x + y + z"), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_flatten_non_sum_is_single_term() {
        assert_eq!(flattened("2*x*y"), vec!["2*x*y"]);
    }

    #[test]
    fn test_flatten_folds_subtraction_signs() {
        assert_eq!(
            flattened("3*y - 3*x**2 - sin(x)"),
            vec!["3*y", "-3*x**2", "-sin(x)"]
        );
    }

    #[test]
    fn test_flatten_nested_subtraction() {
        // a - (b - c) = a - b + c
        assert_eq!(flattened("a - (b - c)"), vec!["a", "-b", "c"]);
    }

    #[test]
    fn test_flatten_distributes_constant_over_sum() {
        assert_eq!(flattened("2*(x + y)"), vec!["2*x", "2*y"]);
        assert_eq!(flattened("-(x + y)"), vec!["-x", "-y"]);
        assert_eq!(flattened("(x + y)/2"), vec!["x/2", "y/2"]);
    }

    #[test]
    fn test_flatten_keeps_symbolic_products_whole() {
        assert_eq!(flattened("x*(y + z)"), vec!["x*(y + z)"]);
    }

    #[test]
    fn test_split_plain_product() {
        let (coeff, pure) = split_coefficient(&parse("2*x*y"));
        assert_eq!(coeff, 2.0);
        assert_eq!(pure.to_string(), "x*y");
    }

    #[test]
    fn test_split_quotient_term() {
        let (coeff, pure) = split_coefficient(&parse("1.00926*x/z"));
        assert_eq!(coeff, 1.00926);
        assert_eq!(pure.to_string(), "x/z");
    }

    #[test]
    fn test_split_negative_coefficient() {
        let (coeff, pure) = split_coefficient(&negate_term(parse("3*x**2")));
        assert_eq!(coeff, -3.0);
        assert_eq!(pure.to_string(), "x**2");
    }

    #[test]
    fn test_split_pure_number_term() {
        let (coeff, pure) = split_coefficient(&parse("10.33025"));
        assert_eq!(coeff, 10.33025);
        assert_eq!(pure, Expr::Const(1.0));
    }

    #[test]
    fn test_split_no_numeric_factor() {
        let (coeff, pure) = split_coefficient(&parse("sin(x)"));
        assert_eq!(coeff, 1.0);
        assert_eq!(pure.to_string(), "sin(x)");
    }

    #[test]
    fn test_split_multiple_numeric_factors() {
        let (coeff, pure) = split_coefficient(&parse("2*3*x"));
        assert_eq!(coeff, 6.0);
        assert_eq!(pure.to_string(), "x");
    }

    #[test]
    fn test_split_numeric_denominator() {
        let (coeff, pure) = split_coefficient(&parse("3*x/2"));
        assert_eq!(coeff, 1.5);
        assert_eq!(pure.to_string(), "x");
    }

    #[test]
    fn test_split_constant_over_variable() {
        let (coeff, pure) = split_coefficient(&parse("3/z"));
        assert_eq!(coeff, 3.0);
        assert_eq!(pure.to_string(), "1/z");
    }

    #[test]
    fn test_sum_terms_rebuilds_sum() {
        let mut terms = Vec::new();
        flatten_add(&parse("x - 3*y + 2"), &mut terms);
        assert_eq!(sum_terms(&terms).to_string(), "x - 3*y + 2");
    }

    #[test]
    fn test_sum_of_no_terms_is_zero() {
        assert_eq!(sum_terms(&[]), Expr::Const(0.0));
    }
}
