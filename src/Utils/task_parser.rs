/// parse a task document with structure like
/// " purification equation: ... variables: x, y, z threshold: 0.01 " which has
/// section titles and pairs key: vector-of-values. The generic document layer
/// returns HashMap<String, HashMap<String, Vec<Value>>>; the typed layer
/// extracts the `purification` section into a PurificationTask.
use crate::purification::dispatcher::DispatchMode;
use crate::purification::purifier::{DEFAULT_RATIO_THRESHOLD, EquationPurifier};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{alpha1, alphanumeric1, multispace0, space0},
    combinator::{map, map_res, recognize},
    multi::{many0, many1, separated_list0},
    sequence::{delimited, pair, separated_pair, terminated},
};
use std::collections::HashMap;
use std::fmt::Display;
use std::fs;

type DocumentMap = HashMap<String, HashMap<String, Vec<Value>>>;

/// enum to represent different value types:
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float(f64),
    Integer(i64),
    Boolean(bool),
}

#[allow(dead_code)]
impl Value {
    // Helper functions to access different value types
    pub fn as_string(&self) -> Option<&String> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        if let Value::Float(f) = self {
            Some(*f)
        } else {
            None
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    /// Integer values count as numbers too
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    // Try to convert to string representation
    pub fn to_string_value(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Float(f) => f.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Boolean(b) => b.to_string(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Float(val) => write!(f, "{}", val),
            Value::Integer(val) => write!(f, "{}", val),
            Value::Boolean(val) => write!(f, "{}", val),
        }
    }
}

/// Parses a title (word characters without spaces)
fn parse_title(input: &str) -> IResult<&str, String> {
    let parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));

    let mut parser = map(parser, String::from);
    let (input, result) = parser.parse(input)?;

    // Ignore trailing whitespace and newline characters
    let input = input.trim();
    Ok((input, result))
}

/// Parses a key (word characters without spaces)
fn parse_key(input: &str) -> IResult<&str, String> {
    let parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));

    let mut parser = map(parser, String::from);
    let (input, result) = parser.parse(input)?;

    Ok((input, result))
}

fn parse_value(input: &str) -> IResult<&str, Value> {
    // Parse a single value - excluding commas, whitespace, newlines, and semicolons
    let value_parser = take_while1(|c: char| !matches!(c, ',' | ' ' | '\t' | '\n' | ';'));
    let mut value_parser = map_res(value_parser, |s: &str| -> Result<Value, String> {
        let s = s.trim();
        // Try parsing as different types in order
        if let Ok(val) = s.parse::<i64>() {
            Ok(Value::Integer(val))
        } else if let Ok(val) = s.parse::<f64>() {
            Ok(Value::Float(val))
        } else if let Ok(val) = s.parse::<bool>() {
            Ok(Value::Boolean(val))
        } else {
            Ok(Value::String(s.to_string()))
        }
    });

    let (input, result) = value_parser.parse(input)?;

    Ok((input, result))
}

fn parse_value_list(input: &str) -> IResult<&str, Vec<Value>> {
    let (input, _) = multispace0(input)?;
    // Parse the comma-separated values; spaces around each comma are dropped
    let separator_coma = delimited(space0, tag(","), space0);
    let mut value_parser = separated_list0(separator_coma, parse_value);
    let (input, result) = value_parser.parse(input)?;

    Ok((input, result))
}

/// Parses a key-value pair where value is a list
fn parse_key_value_pair(input: &str) -> IResult<&str, (String, Vec<Value>)> {
    let colon_separator = delimited(space0, tag(":"), space0);
    let mut parser = separated_pair(parse_key, colon_separator, parse_value_list);
    let (input, result) = parser.parse(input)?;
    Ok((input.trim(), result))
}

/// Parses a section with a title and multiple key-value pairs
fn parse_section(input: &str) -> IResult<&str, (String, HashMap<String, Vec<Value>>)> {
    let (input, _) = space0(input)?;
    let (input, title) = parse_title(input)?;
    let (input, _) = multispace0(input)?;
    let mut parser = many1(terminated(parse_key_value_pair, space0));
    let (input, pairs) = parser.parse(input)?;

    let mut section_map = HashMap::new();
    for (key, values) in pairs {
        section_map.insert(key, values);
    }

    Ok((input, (title, section_map)))
}

/// Filters out comment lines (starting with //, #, %, or ;)
fn filter_comments(input: &str) -> String {
    input
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("//")
                && !trimmed.starts_with('#')
                && !trimmed.starts_with('%')
                && !trimmed.starts_with(';')
                && !trimmed.is_empty()
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Parses the entire document into a section map
fn parse_document(input: &str) -> IResult<&str, DocumentMap> {
    let mut parser = many1(delimited(space0, parse_section, multispace0));

    let (input, sections) = parser.parse(input)?;

    let mut result = HashMap::new();
    for (title, section_map) in sections.into_iter() {
        result.insert(title, section_map);
    }

    Ok((input, result))
}

/// Parses a whole document, comment lines removed, and requires that nothing
/// unparseable is left over
pub fn parse_document_as(input: &str) -> Result<DocumentMap, String> {
    let filtered_input = filter_comments(input);
    match parse_document(&filtered_input) {
        Ok((remaining, parsed)) => {
            if !remaining.trim().is_empty() {
                return Err(format!(
                    "Failed to parse entire document. Remaining: '{}'",
                    remaining
                ));
            }
            Ok(parsed)
        }
        Err(e) => Err(format!("Parsing error: {:?}", e)),
    }
}

/// A parsed `purification` section. `equation` and `variables` are required;
/// the rest fall back to the purifier defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct PurificationTask {
    pub equation: String,
    pub variables: Vec<String>,
    pub threshold: f64,
    pub mode: DispatchMode,
    pub max_workers: Option<usize>,
    pub data_path: Option<String>,
}

impl PurificationTask {
    /// Moves the task settings onto a fresh purifier instance.
    pub fn into_purifier(self) -> EquationPurifier {
        let mut purifier = EquationPurifier::new();
        purifier.set_equation(&self.equation, self.variables);
        purifier.set_threshold(self.threshold);
        purifier.set_mode(self.mode, self.max_workers);
        purifier
    }
}

// the value grammar splits an equation on spaces; joining the pieces back
// with single spaces restores text the expression parser accepts
fn collect_equation(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.to_string_value())
        .collect::<Vec<String>>()
        .join(" ")
}

/// Extracts the `purification` section of a task document into a typed task.
pub fn parse_purification_task(input: &str) -> Result<PurificationTask, String> {
    let document = parse_document_as(input)?;
    let section = document
        .get("purification")
        .ok_or_else(|| "Task document has no 'purification' section.".to_string())?;

    let equation_values = section
        .get("equation")
        .ok_or_else(|| "Key 'equation' not found in purification section.".to_string())?;
    let equation = collect_equation(equation_values);
    if equation.trim().is_empty() {
        return Err("Key 'equation' is empty.".to_string());
    }

    let variable_values = section
        .get("variables")
        .ok_or_else(|| "Key 'variables' not found in purification section.".to_string())?;
    let variables: Vec<String> = variable_values
        .iter()
        .map(|v| v.to_string_value())
        .collect();
    if variables.is_empty() {
        return Err("Key 'variables' is empty.".to_string());
    }

    let threshold = match section.get("threshold") {
        Some(values) => values
            .first()
            .and_then(|v| v.as_number())
            .ok_or_else(|| "Key 'threshold' must be a number.".to_string())?,
        None => DEFAULT_RATIO_THRESHOLD,
    };

    let mode = match section.get("mode") {
        Some(values) => {
            let text = values
                .first()
                .map(|v| v.to_string_value())
                .unwrap_or_default();
            text.parse::<DispatchMode>().map_err(|_| {
                format!("Key 'mode' must be sequential or parallel, got '{}'.", text)
            })?
        }
        None => DispatchMode::Sequential,
    };

    let max_workers = match section.get("max_workers") {
        Some(values) => {
            let workers = values
                .first()
                .and_then(|v| v.as_integer())
                .filter(|&w| w > 0)
                .ok_or_else(|| "Key 'max_workers' must be a positive integer.".to_string())?;
            Some(workers as usize)
        }
        None => None,
    };

    let data_path = section
        .get("data")
        .and_then(|values| values.first())
        .map(|v| v.to_string_value());

    Ok(PurificationTask {
        equation,
        variables,
        threshold,
        mode,
        max_workers,
        data_path,
    })
}

/// Reads and parses a task file from disk.
pub fn parse_task_file(path: &str) -> Result<PurificationTask, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read task file '{}': {}", path, e))?;
    parse_purification_task(&contents)
}

/////////////////////////////TESTS////////////////////////////////////////////////////


#[cfg(test)]
mod file_tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_parse_task_from_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("purification_task.txt");

        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "purification").unwrap();
        writeln!(file, "  equation: 1.00926*x/z - 0.099*y/z - 10.33025").unwrap();
        writeln!(file, "  variables: x, y, z").unwrap();
        writeln!(file, "  threshold: 0.01").unwrap();
        writeln!(file, "  mode: sequential").unwrap();

        let task = parse_task_file(file_path.to_str().unwrap()).unwrap();
        assert_eq!(task.equation, "1.00926*x/z - 0.099*y/z - 10.33025");
        assert_eq!(task.variables.len(), 3);
        assert_eq!(task.threshold, 0.01);
        assert_eq!(task.mode, DispatchMode::Sequential);
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(parse_task_file("no_such_task_file.txt").is_err());
    }
}
