//! Selector parsing and matching
//!
//! Supports the subset needed for element lookup: type, universal, `#id`,
//! `.class`, `[attr]` and `[attr=value]` compounds joined by descendant or
//! child combinators, with comma-separated groups.

use std::iter::Peekable;
use std::str::Chars;

use crate::{DomError, DomResult, DomTree, ElementData, NodeId};

/// Simple selector for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Universal,
    Tag(String),
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
}

impl SimpleSelector {
    /// Check a single element against this selector
    pub fn matches(&self, elem: &ElementData) -> bool {
        match self {
            Self::Universal => true,
            Self::Tag(tag) => elem.tag.eq_ignore_ascii_case(tag),
            Self::Id(id) => elem.get_attr("id") == Some(id.as_str()),
            Self::Class(class) => elem.has_class(class),
            Self::Attribute { name, value: None } => elem.has_attr(name),
            Self::Attribute {
                name,
                value: Some(value),
            } => elem.get_attr(name) == Some(value.as_str()),
        }
    }
}

/// Sequence of simple selectors that all apply to one element
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Compound {
    pub parts: Vec<SimpleSelector>,
}

impl Compound {
    pub fn matches(&self, elem: &ElementData) -> bool {
        self.parts.iter().all(|part| part.matches(elem))
    }
}

/// Relationship between two compounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
}

/// One comma-separated alternative
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

/// Parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    groups: Vec<Complex>,
}

impl Selector {
    /// Parse a selector list
    pub fn parse(input: &str) -> DomResult<Self> {
        let mut parser = Parser {
            source: input,
            chars: input.chars().peekable(),
        };
        let groups = parser.list().inspect_err(|e| tracing::debug!("{}", e))?;
        Ok(Self { groups })
    }

    /// Check whether `element` matches any group
    pub fn matches(&self, tree: &DomTree, element: NodeId) -> bool {
        tree.element(element).is_some() && self.groups.iter().any(|g| g.matches(tree, element))
    }

    /// First matching descendant of `root`, in document order
    pub fn query_first(&self, tree: &DomTree, root: NodeId) -> Option<NodeId> {
        tree.descendant_elements(root)
            .into_iter()
            .find(|&id| self.matches(tree, id))
    }

    /// All matching descendants of `root`, in document order
    pub fn query_all(&self, tree: &DomTree, root: NodeId) -> Vec<NodeId> {
        tree.descendant_elements(root)
            .into_iter()
            .filter(|&id| self.matches(tree, id))
            .collect()
    }
}

impl Complex {
    fn matches(&self, tree: &DomTree, element: NodeId) -> bool {
        let last = self.compounds.len() - 1;
        self.compound_matches(tree, element, last) && self.match_from(tree, element, last)
    }

    fn compound_matches(&self, tree: &DomTree, element: NodeId, index: usize) -> bool {
        tree.element(element)
            .is_some_and(|elem| self.compounds[index].matches(elem))
    }

    /// `element` matched `compounds[index]`; check everything to its left
    fn match_from(&self, tree: &DomTree, element: NodeId, index: usize) -> bool {
        if index == 0 {
            return true;
        }
        let left = index - 1;
        match self.combinators[left] {
            Combinator::Child => tree.parent_element(element).is_some_and(|parent| {
                self.compound_matches(tree, parent, left) && self.match_from(tree, parent, left)
            }),
            Combinator::Descendant => {
                let mut cur = tree.parent_element(element);
                while let Some(ancestor) = cur {
                    if self.compound_matches(tree, ancestor, left)
                        && self.match_from(tree, ancestor, left)
                    {
                        return true;
                    }
                    cur = tree.parent_element(ancestor);
                }
                false
            }
        }
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Peekable<Chars<'a>>,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> DomError {
        DomError::selector(self.source, reason)
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {
            skipped = true;
        }
        skipped
    }

    fn list(&mut self) -> DomResult<Vec<Complex>> {
        let mut groups = Vec::new();
        loop {
            groups.push(self.complex()?);
            match self.chars.next() {
                None => return Ok(groups),
                Some(',') => continue,
                Some(c) => return Err(self.error(format!("unexpected '{c}'"))),
            }
        }
    }

    fn complex(&mut self) -> DomResult<Complex> {
        self.skip_whitespace();
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let spaced = self.skip_whitespace();
            let combinator = match self.chars.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.chars.next();
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some(_) if spaced => Combinator::Descendant,
                Some(&c) => return Err(self.error(format!("unexpected '{c}'"))),
            };
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> DomResult<Compound> {
        let mut parts = Vec::new();
        match self.chars.peek() {
            Some('*') => {
                self.chars.next();
                parts.push(SimpleSelector::Universal);
            }
            Some(&c) if is_ident_char(c) => {
                parts.push(SimpleSelector::Tag(self.ident()?.to_ascii_lowercase()));
            }
            _ => {}
        }
        loop {
            match self.chars.peek() {
                Some('#') => {
                    self.chars.next();
                    parts.push(SimpleSelector::Id(self.ident()?));
                }
                Some('.') => {
                    self.chars.next();
                    parts.push(SimpleSelector::Class(self.ident()?));
                }
                Some('[') => {
                    self.chars.next();
                    parts.push(self.attribute()?);
                }
                _ => break,
            }
        }
        if parts.is_empty() {
            return Err(self.error("expected a selector"));
        }
        Ok(Compound { parts })
    }

    fn attribute(&mut self) -> DomResult<SimpleSelector> {
        self.skip_whitespace();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_whitespace();
        let value = match self.chars.next() {
            Some(']') => None,
            Some('=') => {
                self.skip_whitespace();
                let value = match self.chars.peek() {
                    Some(&quote) if quote == '"' || quote == '\'' => {
                        self.chars.next();
                        let mut value = String::new();
                        loop {
                            match self.chars.next() {
                                Some(c) if c == quote => break,
                                Some(c) => value.push(c),
                                None => return Err(self.error("unterminated string")),
                            }
                        }
                        value
                    }
                    _ => self.ident()?,
                };
                self.skip_whitespace();
                if self.chars.next() != Some(']') {
                    return Err(self.error("expected ']'"));
                }
                Some(value)
            }
            _ => return Err(self.error("malformed attribute selector")),
        };
        Ok(SimpleSelector::Attribute { name, value })
    }

    fn ident(&mut self) -> DomResult<String> {
        let mut out = String::new();
        while let Some(c) = self.chars.next_if(|&c| is_ident_char(c)) {
            out.push(c);
        }
        if out.is_empty() {
            return Err(self.error("expected an identifier"));
        }
        Ok(out)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}
