//! GraphViz import and export for all three machine flavors.
//!
//! Reading is line-based: node lines (`ID [attrs]`) and edge lines
//! (`ID -> ID [label = "…"]`) are recognized, everything else is ignored.
//! The first node encountered becomes the initial state. What the labels
//! mean depends on the flavor: a Mealy edge label is `input / output`, a
//! Moore node label is `display / output`, a recognizer node may carry
//! `final = true` and an unlabeled recognizer edge is an ε-edge.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex as Pattern;

use crate::error::{FsmError, Result};
use crate::machine::{MealyMachine, MealyTable, MooreMachine, MooreTable};
use crate::math::OrderedMap;
use crate::recognizer::{Recognizer, RecognizerTable};

static EDGE_LINE: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new(
        r#"^\s*(\w+|"[^"]+")\s*->\s*(\w+|"[^"]+")\s*(?:\[\s*label\s*=\s*"([^"]*)"\s*\])?\s*;?\s*$"#,
    )
    .expect("edge line pattern is valid")
});

static NODE_LINE: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new(r#"^\s*(\w+|"[^"]+")\s*(?:\[([^\]]*)\])?\s*;?\s*$"#)
        .expect("node line pattern is valid")
});

static LABEL_ATTR: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new(r#"label\s*=\s*"([^"]*)""#).expect("label attribute pattern is valid")
});

static FINAL_ATTR: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(r"final\s*=\s*true").expect("final attribute pattern is valid"));

fn quote(text: &str) -> String {
    format!("\"{text}\"")
}

fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|stripped| stripped.strip_suffix('"'))
        .unwrap_or(text)
}

/// Writes an already rendered dot text to a file.
pub fn write_dot_to_path(path: impl AsRef<Path>, dot: &str) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, dot).map_err(|source| FsmError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| FsmError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Renders a Mealy machine; edge labels carry `input / output`.
pub fn mealy_to_dot(machine: &MealyMachine) -> String {
    let table = machine.table();
    let mut out = String::from("digraph MealyMachine {\n    rankdir = LR;\n\n");

    out.push_str(&format!("    {};\n", quote(&table.initial)));
    for id in &table.states {
        if *id != table.initial {
            out.push_str(&format!("    {};\n", quote(id)));
        }
    }
    out.push('\n');

    for ((from, input), (to, output)) in &table.transitions {
        out.push_str(&format!(
            "    {} -> {} [label = {}];\n",
            quote(from),
            quote(to),
            quote(&format!("{input} / {output}"))
        ));
    }
    out.push_str("}\n");
    out
}

/// Renders a Moore machine; node labels carry `state / output`. Fails if an
/// involved state has no output.
pub fn moore_to_dot(machine: &MooreMachine) -> Result<String> {
    let table = machine.table();
    let mut out = String::from("digraph MooreMachine {\n    rankdir = LR;\n\n");

    let node_line = |id: &str| -> Result<String> {
        let output = table
            .outputs
            .get(id)
            .ok_or_else(|| FsmError::UndefinedOutput {
                state: id.to_string(),
            })?;
        Ok(format!(
            "    {} [label = {}];\n",
            quote(id),
            quote(&format!("{id} / {output}"))
        ))
    };

    out.push_str(&node_line(&table.initial)?);
    for id in &table.states {
        if *id != table.initial {
            out.push_str(&node_line(id)?);
        }
    }
    out.push('\n');

    for ((from, input), to) in &table.transitions {
        out.push_str(&format!(
            "    {} -> {} [label = {}];\n",
            quote(from),
            quote(to),
            quote(input)
        ));
    }
    out.push_str("}\n");
    Ok(out)
}

/// Renders a recognizer; accepting states carry `final = true` and a double
/// circle, ε-edges are written without a label.
pub fn recognizer_to_dot(machine: &Recognizer) -> String {
    let table = machine.table();
    let mut out = String::from("digraph Recognizer {\n    rankdir = LR;\n\n");

    out.push_str(&format!("    {};\n", quote(&table.initial)));
    for id in &table.states {
        let (is_final, shape) = if table.finals.contains(id) {
            ("true", "doublecircle")
        } else {
            ("false", "circle")
        };
        out.push_str(&format!(
            "    {} [final = {is_final}, shape = {shape}];\n",
            quote(id)
        ));
    }
    out.push('\n');

    for ((from, input), targets) in &table.transitions {
        for to in targets {
            match input {
                Some(input) => out.push_str(&format!(
                    "    {} -> {} [label = {}];\n",
                    quote(from),
                    quote(to),
                    quote(input)
                )),
                None => out.push_str(&format!("    {} -> {};\n", quote(from), quote(to))),
            }
        }
    }
    out.push_str("}\n");
    out
}

/// Parses a Mealy machine from dot text.
pub fn mealy_from_dot(text: &str) -> Result<MealyMachine> {
    let mut table = MealyTable::default();

    for (index, line) in text.lines().enumerate() {
        if let Some(caps) = EDGE_LINE.captures(line) {
            let from = unquote(caps.get(1).expect("edge line has a source").as_str());
            let to = unquote(caps.get(2).expect("edge line has a target").as_str());
            let label = caps
                .get(3)
                .ok_or_else(|| FsmError::MalformedDot {
                    line_no: index + 1,
                    reason: "mealy edge without a label".to_string(),
                })?
                .as_str();
            let (input, output) =
                label.split_once('/').ok_or_else(|| FsmError::MalformedDot {
                    line_no: index + 1,
                    reason: format!("mealy edge label `{label}` lacks `input / output`"),
                })?;
            table.insert_transition(from, input.trim(), to, output.trim());
        } else if let Some(caps) = NODE_LINE.captures(line) {
            let id = unquote(caps.get(1).expect("node line has an id").as_str());
            table.states.insert(id.to_string());
            if table.initial.is_empty() {
                table.initial = id.to_string();
                table.current = id.to_string();
            }
        }
    }

    if table.initial.is_empty() {
        return Err(FsmError::InconsistentMachine {
            reason: "dot input defines no states".to_string(),
        });
    }
    Ok(MealyMachine::new(table))
}

/// Parses a Moore machine from dot text; the node label part after `/` is
/// the state's output.
pub fn moore_from_dot(text: &str) -> Result<MooreMachine> {
    let mut table = MooreTable::default();

    for (index, line) in text.lines().enumerate() {
        if let Some(caps) = EDGE_LINE.captures(line) {
            let from = unquote(caps.get(1).expect("edge line has a source").as_str());
            let to = unquote(caps.get(2).expect("edge line has a target").as_str());
            let input = caps
                .get(3)
                .ok_or_else(|| FsmError::MalformedDot {
                    line_no: index + 1,
                    reason: "moore edge without an input label".to_string(),
                })?
                .as_str();
            table.insert_transition(from, input, to);
        } else if let Some(caps) = NODE_LINE.captures(line) {
            let id = unquote(caps.get(1).expect("node line has an id").as_str()).to_string();
            table.states.insert(id.clone());

            if let Some(label) = caps
                .get(2)
                .and_then(|attrs| LABEL_ATTR.captures(attrs.as_str()))
            {
                let label = label.get(1).expect("label attribute has a value").as_str();
                let (_display, output) =
                    label.split_once('/').ok_or_else(|| FsmError::MalformedDot {
                        line_no: index + 1,
                        reason: format!("moore node label `{label}` lacks `display / output`"),
                    })?;
                table.outputs.insert(id.clone(), output.trim().to_string());
            }

            if table.initial.is_empty() {
                table.initial = id.clone();
                table.current = id;
            }
        }
    }

    if table.initial.is_empty() {
        return Err(FsmError::InconsistentMachine {
            reason: "dot input defines no states".to_string(),
        });
    }
    Ok(MooreMachine::new(table))
}

/// Parses a recognizer from dot text. Determinism is inferred: the result is
/// deterministic iff there are no ε-edges and no duplicate `(state, input)`
/// keys.
pub fn recognizer_from_dot(text: &str) -> Result<Recognizer> {
    let mut table = RecognizerTable::default();
    let mut deterministic = true;
    let mut seen: OrderedMap<(String, Option<String>), usize> = OrderedMap::new();

    for line in text.lines() {
        if let Some(caps) = EDGE_LINE.captures(line) {
            let from = unquote(caps.get(1).expect("edge line has a source").as_str()).to_string();
            let to = unquote(caps.get(2).expect("edge line has a target").as_str()).to_string();
            let input = caps.get(3).map(|label| label.as_str().to_string());

            if input.is_none() {
                deterministic = false;
            }
            let count = seen.entry((from.clone(), input.clone())).or_insert(0);
            *count += 1;
            if *count > 1 {
                deterministic = false;
            }

            table.insert_transition(from, input, to);
        } else if let Some(caps) = NODE_LINE.captures(line) {
            let id = unquote(caps.get(1).expect("node line has an id").as_str()).to_string();
            table.states.insert(id.clone());

            if let Some(attrs) = caps.get(2) {
                if FINAL_ATTR.is_match(attrs.as_str()) {
                    table.finals.insert(id.clone());
                }
            }
            if table.initial.is_empty() {
                table.initial = id.clone();
                table.current = id;
            }
        }
    }

    if table.initial.is_empty() {
        return Err(FsmError::InconsistentMachine {
            reason: "dot input defines no states".to_string(),
        });
    }
    table.deterministic = deterministic;
    Ok(Recognizer::new(table))
}

/// Reads a Mealy machine from a dot file.
pub fn mealy_from_path(path: impl AsRef<Path>) -> Result<MealyMachine> {
    mealy_from_dot(&read_to_string(path.as_ref())?)
}

/// Reads a Moore machine from a dot file.
pub fn moore_from_path(path: impl AsRef<Path>) -> Result<MooreMachine> {
    moore_from_dot(&read_to_string(path.as_ref())?)
}

/// Reads a recognizer from a dot file.
pub fn recognizer_from_path(path: impl AsRef<Path>) -> Result<Recognizer> {
    recognizer_from_dot(&read_to_string(path.as_ref())?)
}
