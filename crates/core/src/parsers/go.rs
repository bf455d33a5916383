use crate::models::{ImportHeader, ImportSpec};
use std::str::Chars;
use tree_sitter::{Node, Parser};

use super::{ImportParser, ParserError};

pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    pub fn new() -> Result<Self, ParserError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| ParserError::InitError(e.to_string()))?;

        Ok(Self { parser })
    }

    /// Collect the top-level import declarations and the comments inside
    /// their line span.
    fn extract_header(
        &self,
        source: &str,
        tree: &tree_sitter::Tree,
    ) -> Result<ImportHeader, ParserError> {
        let root = tree.root_node();

        if root.has_error() {
            let line = first_error_row(&root).map_or(1, |row| row + 1);
            return Err(ParserError::Syntax { line });
        }

        let mut cursor = root.walk();
        let top_level: Vec<Node> = root.children(&mut cursor).collect();

        // `import ()` declarations without specs don't open the header
        let declarations: Vec<&Node> = top_level
            .iter()
            .filter(|node| node.kind() == "import_declaration" && has_import_spec(node))
            .collect();

        let (Some(first), Some(last)) = (declarations.first(), declarations.last()) else {
            return Ok(ImportHeader::default());
        };

        let start_byte = first.start_byte();
        let last_end = last.end_byte();
        let end_row = last.end_position().row;
        let mut end_byte = last_end;

        let mut collector = SpecCollector::default();
        for node in &top_level {
            if node.start_byte() < start_byte || node.start_position().row > end_row {
                continue;
            }

            // Past the last declaration only a trailing comment belongs to
            // the header; `; var x = 1` and the like stay in place.
            if node.start_byte() >= last_end && node.kind() != "comment" {
                break;
            }

            match node.kind() {
                "import_declaration" => self.collect_declaration(node, source, &mut collector)?,
                "comment" => {
                    collector.comment(node, source);
                    end_byte = end_byte.max(node.end_byte());
                }
                _ => {}
            }
        }

        Ok(ImportHeader {
            specs: collector.specs,
            start_line: first.start_position().row + 1,
            end_line: end_row + 1,
            start_byte,
            end_byte,
            dangling_comments: collector.pending,
        })
    }

    /// `import "x"` or `import ( ... )`
    fn collect_declaration(
        &self,
        decl: &Node,
        source: &str,
        collector: &mut SpecCollector,
    ) -> Result<(), ParserError> {
        let mut cursor = decl.walk();
        for child in decl.children(&mut cursor) {
            match child.kind() {
                "import_spec" => collector.spec(&child, source)?,
                "import_spec_list" => {
                    let mut list_cursor = child.walk();
                    for item in child.children(&mut list_cursor) {
                        match item.kind() {
                            "import_spec" => collector.spec(&item, source)?,
                            "comment" => collector.comment(&item, source),
                            _ => {}
                        }
                    }
                }
                "comment" => collector.comment(&child, source),
                _ => {}
            }
        }

        Ok(())
    }
}

impl ImportParser for GoParser {
    fn parse(&mut self, source: &str) -> Result<ImportHeader, ParserError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ParserError::ParseError("parser returned no tree".to_string()))?;

        self.extract_header(source, &tree)
    }
}

/// Accumulates specs in source order, attaching comments as it goes.
#[derive(Default)]
struct SpecCollector {
    specs: Vec<ImportSpec>,
    /// Comments waiting for the next spec
    pending: Vec<String>,
    /// Row the last spec ended on
    last_row: Option<usize>,
}

impl SpecCollector {
    fn spec(&mut self, node: &Node, source: &str) -> Result<(), ParserError> {
        let line = node.start_position().row + 1;

        let path_node = node
            .child_by_field_name("path")
            .ok_or(ParserError::Syntax { line })?;
        let literal = node_text(&path_node, source);
        let path = unquote(&literal).ok_or_else(|| ParserError::Decode {
            literal: literal.clone(),
            line,
        })?;

        let mut spec =
            ImportSpec::new(path, literal, line).with_doc(std::mem::take(&mut self.pending));
        if let Some(name) = node.child_by_field_name("name") {
            spec = spec.with_name(node_text(&name, source));
        }

        self.specs.push(spec);
        self.last_row = Some(node.end_position().row);
        Ok(())
    }

    fn comment(&mut self, node: &Node, source: &str) {
        let text = node_text(node, source).trim_end().to_string();

        if self.last_row == Some(node.start_position().row) {
            if let Some(last) = self.specs.last_mut() {
                last.comment = Some(match last.comment.take() {
                    Some(existing) => format!("{} {}", existing, text),
                    None => text,
                });
                return;
            }
        }

        self.pending.push(text);
    }
}

fn node_text(node: &Node, source: &str) -> String {
    source[node.byte_range()].to_string()
}

fn has_import_spec(decl: &Node) -> bool {
    let mut cursor = decl.walk();
    let found = decl.children(&mut cursor).any(|child| match child.kind() {
        "import_spec" => true,
        "import_spec_list" => {
            let mut list_cursor = child.walk();
            let nested = child
                .children(&mut list_cursor)
                .any(|item| item.kind() == "import_spec");
            nested
        }
        _ => false,
    });
    found
}

fn first_error_row(node: &Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.iter().find_map(first_error_row)
}

/// Decode a Go string literal, interpreted (`"a\tb"`) or raw (`` `a` ``).
pub fn unquote(literal: &str) -> Option<String> {
    if literal.len() < 2 {
        return None;
    }

    let raw = literal.starts_with('`') && literal.ends_with('`');
    if !raw && !(literal.starts_with('"') && literal.ends_with('"')) {
        return None;
    }
    let inner = &literal[1..literal.len() - 1];

    if raw {
        return Some(inner.replace('\r', ""));
    }

    let mut out: Vec<u8> = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' | '\n' => return None,
            '\\' => match chars.next()? {
                'a' => out.push(0x07),
                'b' => out.push(0x08),
                'f' => out.push(0x0c),
                'n' => out.push(b'\n'),
                'r' => out.push(b'\r'),
                't' => out.push(b'\t'),
                'v' => out.push(0x0b),
                '\\' => out.push(b'\\'),
                '"' => out.push(b'"'),
                'x' => out.push(u8::try_from(digits(&mut chars, 16, 2)?).ok()?),
                first @ '0'..='7' => {
                    let value = first.to_digit(8)? * 64 + digits(&mut chars, 8, 2)?;
                    out.push(u8::try_from(value).ok()?);
                }
                'u' => push_char(&mut out, digits(&mut chars, 16, 4)?)?,
                'U' => push_char(&mut out, digits(&mut chars, 16, 8)?)?,
                _ => return None,
            },
            _ => push_char(&mut out, c as u32)?,
        }
    }

    String::from_utf8(out).ok()
}

fn digits(chars: &mut Chars, radix: u32, count: usize) -> Option<u32> {
    (0..count).try_fold(0u32, |acc, _| {
        let digit = chars.next()?.to_digit(radix)?;
        acc.checked_mul(radix)?.checked_add(digit)
    })
}

fn push_char(out: &mut Vec<u8>, code: u32) -> Option<()> {
    let c = char::from_u32(code)?;
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    Some(())
}
