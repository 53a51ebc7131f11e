//! Parsing and evaluation of the template tag language.
//!
//! Supported: `{{ path }}`, `{% for x in path %}...{% endfor %}`,
//! `{% if [not] path %}...{% else %}...{% endif %}` and `{# comments #}`.
//! Paths are dotted names (`row.col1_caption`). Anything else is rejected.

use lazy_static::lazy_static;
use quick_xml::escape::partial_escape;
use regex::Regex;

use super::value::{Context, InlineImage, Value};
use super::RenderError;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"(?s)\{\{(.*?)\}\}|\{%(.*?)%\}|\{#.*?#\}").unwrap();
    static ref PATH: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*$").unwrap();
    static ref NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Expr(String),
    For {
        var: String,
        iterable: String,
        body: Vec<Node>,
    },
    If {
        negate: bool,
        cond: String,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// What closed a block while parsing.
#[derive(Debug, PartialEq)]
enum Terminator {
    End,
    EndFor,
    Else,
    EndIf,
}

enum Token<'a> {
    Text(&'a str),
    Expr(&'a str),
    Stmt(&'a str),
}

fn tokenize(src: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for caps in TOKEN.captures_iter(src) {
        let whole = caps.get(0).expect("group 0 always matches");
        if whole.start() > last {
            tokens.push(Token::Text(&src[last..whole.start()]));
        }
        if let Some(expr) = caps.get(1) {
            tokens.push(Token::Expr(expr.as_str()));
        } else if let Some(stmt) = caps.get(2) {
            tokens.push(Token::Stmt(stmt.as_str()));
        }
        last = whole.end();
    }
    if last < src.len() {
        tokens.push(Token::Text(&src[last..]));
    }
    tokens
}

fn parse_path(raw: &str) -> Result<String, RenderError> {
    let path = raw.trim();
    if PATH.is_match(path) {
        Ok(path.to_string())
    } else {
        Err(RenderError::Syntax(format!("unsupported expression '{path}'")))
    }
}

/// A parsed template part.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(src: &str) -> Result<Self, RenderError> {
        let tokens = tokenize(src);
        let mut iter = tokens.into_iter();
        let (nodes, terminator) = parse_block(&mut iter)?;
        match terminator {
            Terminator::End => Ok(Self { nodes }),
            other => Err(RenderError::Syntax(format!(
                "unexpected {} without an open block",
                terminator_tag(&other)
            ))),
        }
    }

    /// Render against `context`. Inline images are handed to `embed`, which
    /// returns the markup to splice in.
    pub fn render(
        &self,
        context: &Context,
        embed: &mut dyn FnMut(&InlineImage) -> Result<String, RenderError>,
    ) -> Result<String, RenderError> {
        let mut out = String::new();
        let mut scope = Scope {
            context,
            locals: Vec::new(),
        };
        render_nodes(&self.nodes, &mut scope, embed, &mut out)?;
        Ok(out)
    }
}

fn terminator_tag(terminator: &Terminator) -> &'static str {
    match terminator {
        Terminator::End => "end of template",
        Terminator::EndFor => "{% endfor %}",
        Terminator::Else => "{% else %}",
        Terminator::EndIf => "{% endif %}",
    }
}

fn parse_block<'a>(
    tokens: &mut impl Iterator<Item = Token<'a>>,
) -> Result<(Vec<Node>, Terminator), RenderError> {
    let mut nodes = Vec::new();
    while let Some(token) = tokens.next() {
        match token {
            Token::Text(text) => nodes.push(Node::Text(text.to_string())),
            Token::Expr(expr) => nodes.push(Node::Expr(parse_path(expr)?)),
            Token::Stmt(stmt) => {
                let words: Vec<&str> = stmt.split_whitespace().collect();
                match words.as_slice() {
                    ["for", var, "in", iterable] => {
                        if !NAME.is_match(var) {
                            return Err(RenderError::Syntax(format!(
                                "invalid loop variable '{var}'"
                            )));
                        }
                        let iterable = parse_path(iterable)?;
                        let (body, end) = parse_block(tokens)?;
                        if end != Terminator::EndFor {
                            return Err(RenderError::Syntax(format!(
                                "loop over '{iterable}' closed by {}",
                                terminator_tag(&end)
                            )));
                        }
                        nodes.push(Node::For {
                            var: var.to_string(),
                            iterable,
                            body,
                        });
                    }
                    ["if", rest @ ..] => {
                        let (negate, cond) = match rest {
                            ["not", path] => (true, parse_path(path)?),
                            [path] => (false, parse_path(path)?),
                            _ => {
                                return Err(RenderError::Syntax(format!(
                                    "unsupported condition '{}'",
                                    rest.join(" ")
                                )))
                            }
                        };
                        let (then, end) = parse_block(tokens)?;
                        let otherwise = match end {
                            Terminator::EndIf => Vec::new(),
                            Terminator::Else => {
                                let (otherwise, end) = parse_block(tokens)?;
                                if end != Terminator::EndIf {
                                    return Err(RenderError::Syntax(format!(
                                        "condition '{cond}' closed by {}",
                                        terminator_tag(&end)
                                    )));
                                }
                                otherwise
                            }
                            other => {
                                return Err(RenderError::Syntax(format!(
                                    "condition '{cond}' closed by {}",
                                    terminator_tag(&other)
                                )))
                            }
                        };
                        nodes.push(Node::If {
                            negate,
                            cond,
                            then,
                            otherwise,
                        });
                    }
                    ["endfor"] => return Ok((nodes, Terminator::EndFor)),
                    ["else"] => return Ok((nodes, Terminator::Else)),
                    ["endif"] => return Ok((nodes, Terminator::EndIf)),
                    _ => return Err(RenderError::UnsupportedTag(stmt.trim().to_string())),
                }
            }
        }
    }
    Ok((nodes, Terminator::End))
}

/// Context plus the loop variables currently in scope, innermost last.
struct Scope<'a> {
    context: &'a Context,
    locals: Vec<(String, Value)>,
}

impl Scope<'_> {
    fn lookup(&self, path: &str) -> Result<Value, RenderError> {
        let mut segments = path.split('.');
        let head = segments.next().unwrap_or_default();
        let mut current = self
            .locals
            .iter()
            .rev()
            .find(|(name, _)| name == head)
            .map(|(_, value)| value)
            .or_else(|| self.context.get(head))
            .ok_or_else(|| RenderError::UndefinedVariable(path.to_string()))?;

        for segment in segments {
            current = current
                .get(segment)
                .ok_or_else(|| RenderError::UndefinedVariable(path.to_string()))?;
        }
        Ok(current.clone())
    }
}

fn render_nodes(
    nodes: &[Node],
    scope: &mut Scope<'_>,
    embed: &mut dyn FnMut(&InlineImage) -> Result<String, RenderError>,
    out: &mut String,
) -> Result<(), RenderError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Expr(path) => match scope.lookup(path)? {
                Value::Text(text) => out.push_str(&partial_escape(text.as_str())),
                Value::Int(n) => out.push_str(&n.to_string()),
                Value::Image(image) => out.push_str(&embed(&image)?),
                other => {
                    return Err(RenderError::NotRenderable {
                        path: path.clone(),
                        kind: other.kind(),
                    })
                }
            },
            Node::For {
                var,
                iterable,
                body,
            } => {
                let items = match scope.lookup(iterable)? {
                    Value::List(items) => items,
                    other => {
                        return Err(RenderError::NotIterable {
                            path: iterable.clone(),
                            kind: other.kind(),
                        })
                    }
                };
                for item in items {
                    scope.locals.push((var.clone(), item));
                    let result = render_nodes(body, scope, embed, out);
                    scope.locals.pop();
                    result?;
                }
            }
            Node::If {
                negate,
                cond,
                then,
                otherwise,
            } => {
                let truthy = scope.lookup(cond)?.is_truthy();
                let branch = if truthy != *negate { then } else { otherwise };
                render_nodes(branch, scope, embed, out)?;
            }
        }
    }
    Ok(())
}
