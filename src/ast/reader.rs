//! Deserializer for the parser's textual AST dump.
//!
//! The upstream parser serializes its tree one node per line, indented by two
//! spaces per depth level, with the node tag first and the payload (if any)
//! after a single space:
//!
//! ```text
//! STATEMENT_LIST
//!   DECL_INT x
//!   STATEMENT_LIST
//!     PRINT
//!       IDENTIFIER x
//! ```
//!
//! Children appear in order, left before right. This module is a boundary
//! adapter, not a language parser: it reconstructs exactly the tree the
//! external parser built.

use crate::ast::{AstNode, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    EmptyDump,
    BadIndentation { line: usize },
    UnknownNodeKind { line: usize, tag: String },
    TooManyChildren { line: usize },
    TrailingNodes { line: usize },
}

impl core::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::EmptyDump => write!(f, "AST dump contains no nodes"),
            ReadError::BadIndentation { line } => {
                write!(f, "line {line}: indentation does not match any open node")
            }
            ReadError::UnknownNodeKind { line, tag } => {
                write!(f, "line {line}: unknown node kind `{tag}`")
            }
            ReadError::TooManyChildren { line } => {
                write!(f, "line {line}: node has more than two children")
            }
            ReadError::TrailingNodes { line } => {
                write!(f, "line {line}: node outside of the root tree")
            }
        }
    }
}

struct Line {
    number: usize,
    depth: usize,
    kind: NodeKind,
    value: Option<String>,
}

/// Parses a full AST dump into its root node.
pub fn parse(source: &str) -> Result<AstNode, ReadError> {
    let mut lines = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let number = index + 1;

        if raw.trim().is_empty() {
            continue;
        }

        let indent = raw.len() - raw.trim_start_matches(' ').len();
        if indent % 2 != 0 {
            return Err(ReadError::BadIndentation { line: number });
        }

        let rest = raw.trim();
        let (tag, value) = match rest.split_once(' ') {
            Some((tag, value)) => (tag, Some(value.to_owned())),
            None => (rest, None),
        };

        let kind = tag
            .parse::<NodeKind>()
            .map_err(|_| ReadError::UnknownNodeKind {
                line: number,
                tag: tag.to_owned(),
            })?;

        lines.push(Line {
            number,
            depth: indent / 2,
            kind,
            value,
        });
    }

    if lines.is_empty() {
        return Err(ReadError::EmptyDump);
    }

    let mut cursor = 0;
    let root = parse_node(&lines, &mut cursor, 0)?;

    if cursor != lines.len() {
        return Err(ReadError::TrailingNodes {
            line: lines[cursor].number,
        });
    }

    Ok(root)
}

fn parse_node(lines: &[Line], cursor: &mut usize, depth: usize) -> Result<AstNode, ReadError> {
    let line = &lines[*cursor];

    if line.depth != depth {
        return Err(ReadError::BadIndentation { line: line.number });
    }

    *cursor += 1;

    let mut node = AstNode::new(line.kind);
    node.value = line.value.clone();

    let mut children = Vec::new();

    while *cursor < lines.len() && lines[*cursor].depth > depth {
        if children.len() == 2 {
            return Err(ReadError::TooManyChildren {
                line: lines[*cursor].number,
            });
        }

        children.push(parse_node(lines, cursor, depth + 1)?);
    }

    let mut children = children.into_iter();
    node.left = children.next().map(Box::new);
    node.right = children.next().map(Box::new);

    Ok(node)
}

/// Serializes a tree back into the dump format accepted by [`parse`].
pub fn dump(root: &AstNode) -> String {
    let mut out = String::new();
    dump_node(root, 0, &mut out);
    out
}

fn dump_node(node: &AstNode, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }

    out.push_str(&node.kind.to_string());

    if let Some(value) = &node.value {
        out.push(' ');
        out.push_str(value);
    }

    out.push('\n');

    if let Some(left) = &node.left {
        dump_node(left, depth + 1, out);
    }
    if let Some(right) = &node.right {
        dump_node(right, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn parses_a_nested_dump() {
        let source = indoc! {"
            STATEMENT_LIST
              DECL_INT x
              STATEMENT_LIST
                PRINT
                  ADD
                    NUMBER 2
                    NUMBER 3
        "};

        let root = parse(source).unwrap();

        assert_eq!(root.kind, NodeKind::StatementList);

        let decl = root.left.as_deref().unwrap();
        assert_eq!(decl.kind, NodeKind::DeclInt);
        assert_eq!(decl.value.as_deref(), Some("x"));

        let print = root.right.as_deref().unwrap().left.as_deref().unwrap();
        assert_eq!(print.kind, NodeKind::Print);

        let add = print.left.as_deref().unwrap();
        assert_eq!(add.kind, NodeKind::Add);
        assert_eq!(add.left.as_deref().unwrap().value.as_deref(), Some("2"));
        assert_eq!(add.right.as_deref().unwrap().value.as_deref(), Some("3"));
    }

    #[test]
    fn payload_keeps_embedded_spaces_and_quotes() {
        let root = parse("STRING \"ab cd\"\n").unwrap();

        assert_eq!(root.kind, NodeKind::String);
        assert_eq!(root.value.as_deref(), Some("\"ab cd\""));
    }

    #[test]
    fn dump_round_trips() {
        let source = indoc! {"
            LOOP
              NUMBER 3
              PRINT
                IDENTIFIER i
        "};

        let root = parse(source).unwrap();
        assert_eq!(dump(&root), source);
        assert_eq!(parse(&dump(&root)).unwrap(), root);
    }

    #[test]
    fn rejects_unknown_tags() {
        assert_eq!(
            parse("BOGUS x\n"),
            Err(ReadError::UnknownNodeKind {
                line: 1,
                tag: "BOGUS".to_owned()
            })
        );
    }

    #[test]
    fn rejects_a_third_child() {
        let source = indoc! {"
            ADD
              NUMBER 1
              NUMBER 2
              NUMBER 3
        "};

        assert_eq!(parse(source), Err(ReadError::TooManyChildren { line: 4 }));
    }

    #[test]
    fn rejects_nodes_after_the_root() {
        let source = indoc! {"
            NUMBER 1
            NUMBER 2
        "};

        assert_eq!(parse(source), Err(ReadError::TrailingNodes { line: 2 }));
    }

    #[test]
    fn rejects_odd_indentation() {
        assert_eq!(
            parse("PRINT\n   NUMBER 1\n"),
            Err(ReadError::BadIndentation { line: 2 })
        );
    }

    #[test]
    fn rejects_an_empty_dump() {
        assert_eq!(parse("\n  \n"), Err(ReadError::EmptyDump));
    }
}
