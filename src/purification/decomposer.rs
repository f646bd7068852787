//! Decomposition of an equation string into canonically ordered additive
//! terms. Every term is split into a numeric coefficient and a "pure" term
//! (the term with the coefficient factored out); the three sequences
//! (full terms, pure terms, coefficients) are index-aligned and sorted by
//! the rendered text of the pure term.
use crate::symbolic::parse_expr::ParseError;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_terms::{flatten_add, split_coefficient};
use itertools::Itertools;

/// The three index-aligned views of a decomposed equation:
/// `full_terms[i] == coefficients[i] * pure_terms[i]` for every i.
#[derive(Debug, Clone, PartialEq)]
pub struct TermDecomposition {
    pub full_terms: Vec<Expr>,
    pub pure_terms: Vec<Expr>,
    pub coefficients: Vec<f64>,
}

impl TermDecomposition {
    pub fn len(&self) -> usize {
        self.full_terms.len()
    }
    pub fn is_empty(&self) -> bool {
        self.full_terms.is_empty()
    }
}

/// Parses an equation string and decomposes it into additive terms.
///
/// The sum spine is flattened (subtraction folds the sign into the
/// subtracted term's coefficient, a numeric factor on a parenthesized sum
/// distributes over it), each term is split into coefficient and pure part,
/// and the terms are sorted by the rendered pure-term text. A non-sum
/// expression yields a single term; a bare number yields pure term 1.
/// Terms with identical pure parts are kept as separate entries.
pub fn extract_terms(equation_text: &str) -> Result<TermDecomposition, ParseError> {
    let expression = Expr::parse_expression(equation_text)?;
    let mut summands: Vec<Expr> = Vec::new();
    flatten_add(&expression, &mut summands);
    let mut keyed: Vec<(String, Expr, Expr, f64)> = summands
        .into_iter()
        .map(|term| {
            let (coefficient, pure_term) = split_coefficient(&term);
            (pure_term.to_string(), term, pure_term, coefficient)
        })
        .collect();
    // stable sort: equal pure terms keep their original relative order
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    let (full_terms, pure_terms, coefficients): (Vec<Expr>, Vec<Expr>, Vec<f64>) = keyed
        .into_iter()
        .map(|(_, full, pure, coefficient)| (full, pure, coefficient))
        .multiunzip();
    Ok(TermDecomposition {
        full_terms,
        pure_terms,
        coefficients,
    })
}
