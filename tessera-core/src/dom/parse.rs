//! HTML fragment parser.
//!
//! A lenient parser for the HTML that compiled templates produce. It
//! understands elements, void elements, raw text in `script` and `style`,
//! quoted, unquoted and valueless attributes, comments and the common
//! character references. Stray end tags are ignored and unclosed elements
//! are closed at the end of input. It does not implement the HTML tree
//! construction rules (implied `<tbody>`, `<p>` auto-closing and so on).

use super::node::{Element, Node, RAW_TEXT_ELEMENTS, VOID_ELEMENTS};
use crate::error::HtmlError;

/// Parse `html` into a fragment.
pub fn parse_fragment(html: &str) -> Result<Node, HtmlError> {
    let root = Node::fragment();
    let mut open: Vec<(String, Node)> = vec![(String::new(), root.clone())];
    let mut parser = Parser { input: html, pos: 0 };

    while !parser.at_end() {
        let parent = open.last().map_or_else(|| root.clone(), |(_, node)| node.clone());

        if parser.eat("<!--") {
            let data = parser.take_until("-->", "comment")?;
            parent.append_child(&Node::comment(data));
        } else if parser.rest().starts_with("</") && parser.peek_at(2).is_some_and(is_tag_start) {
            parser.advance(2);
            let name = parser.take_tag_name()?;
            parser.take_until(">", "end tag")?;
            if let Some(depth) = open.iter().rposition(|(tag, _)| *tag == name) {
                if depth > 0 {
                    open.truncate(depth);
                }
            }
        } else if parser.rest().starts_with("<!") {
            parser.advance(2);
            parser.take_until(">", "declaration")?;
        } else if parser.rest().starts_with('<') && parser.peek_at(1).is_some_and(is_tag_start) {
            parser.advance(1);
            let (element, self_closing) = parser.take_start_tag()?;
            parent.append_child(&element);
            let tag = element.tag_name().to_string();

            if self_closing || VOID_ELEMENTS.contains(&tag.as_str()) {
                continue;
            }
            if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
                let text = parser.take_raw_text(&tag)?;
                if !text.is_empty() {
                    element.append_child(&Node::text(text));
                }
                continue;
            }
            open.push((tag, element.node().clone()));
        } else {
            let text = parser.take_text();
            parent.append_child(&Node::text(decode_entities(text)));
        }
    }

    Ok(root)
}

fn is_tag_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn advance(&mut self, chars: usize) {
        for c in self.rest().chars().take(chars).collect::<Vec<_>>() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, prefix: &str) -> bool {
        if self.rest().starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance(1);
        }
    }

    /// Everything up to `terminator`, consuming the terminator too.
    fn take_until(&mut self, terminator: &str, context: &'static str) -> Result<&'a str, HtmlError> {
        let rest = self.rest();
        let end = rest.find(terminator).ok_or(HtmlError::UnexpectedEof(context))?;
        self.pos += end + terminator.len();
        Ok(&rest[..end])
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest.find(|c: char| !predicate(c)).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn take_tag_name(&mut self) -> Result<String, HtmlError> {
        let start = self.pos;
        let name = self.take_while(is_tag_char);
        if name.is_empty() {
            return Err(HtmlError::InvalidTagName(start));
        }
        Ok(name.to_ascii_lowercase())
    }

    /// Text up to the next `<` that opens markup.
    fn take_text(&mut self) -> &'a str {
        let rest = self.rest();
        let mut end = rest.len();
        for (offset, _) in rest.match_indices('<') {
            let next = rest[offset + 1..].chars().next();
            if offset > 0 && next.is_some_and(|c| is_tag_start(c) || c == '/' || c == '!') {
                end = offset;
                break;
            }
        }
        self.pos += end;
        &rest[..end]
    }

    /// The tag name, attributes and closing `>` of a start tag.
    fn take_start_tag(&mut self) -> Result<(Element, bool), HtmlError> {
        let name = self.take_tag_name()?;
        let element = Element::new(&name);

        loop {
            self.skip_whitespace();
            if self.at_end() {
                return Err(HtmlError::UnexpectedEof("start tag"));
            }
            if self.eat("/>") {
                return Ok((element, true));
            }
            if self.eat(">") {
                return Ok((element, false));
            }

            let attribute = self
                .take_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\''))
                .to_ascii_lowercase();
            if attribute.is_empty() {
                self.advance(1);
                continue;
            }

            self.skip_whitespace();
            let value = if self.eat("=") {
                self.skip_whitespace();
                self.take_attribute_value()?
            } else {
                String::new()
            };
            if !element.has_attribute(&attribute) {
                element.set_attribute(&attribute, &value);
            }
        }
    }

    fn take_attribute_value(&mut self) -> Result<String, HtmlError> {
        let raw = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.advance(1);
                let mut terminator = [0; 4];
                self.take_until(quote.encode_utf8(&mut terminator), "attribute value")?
            }
            _ => self.take_while(|c| !c.is_whitespace() && c != '>'),
        };
        Ok(decode_entities(raw))
    }

    /// Raw text up to the matching end tag, consuming the end tag.
    fn take_raw_text(&mut self, tag: &str) -> Result<String, HtmlError> {
        let rest = self.rest();
        let closing = format!("</{tag}");
        let end = rest
            .to_ascii_lowercase()
            .find(&closing)
            .ok_or(HtmlError::UnexpectedEof("raw text element"))?;
        let text = rest[..end].to_string();
        self.pos += end;
        self.take_until(">", "end tag")?;
        Ok(text)
    }
}

/// Replace the common named and numeric character references.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];
        let decoded = rest.find(';').filter(|end| *end <= 10).and_then(|end| {
            let entity = &rest[1..end];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity.strip_prefix('#').and_then(|number| {
                    let hex = number.strip_prefix('x').or_else(|| number.strip_prefix('X'));
                    let code = match hex {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => number.parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            };
            c.map(|c| (c, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
