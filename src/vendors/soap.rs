//! Minimal SOAP 1.2 plumbing: envelope construction and flattening of the
//! response document into a JSON value tree.
//!
//! Leaf elements become strings, elements with children become objects,
//! empty elements become `null`, and repeated siblings become arrays.
//! Namespace prefixes are dropped.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::{GatewayError, Result};

pub const CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

pub fn envelope(namespace: &str, method: &str, params: &[(&str, &str)]) -> String {
    let body: String = params
        .iter()
        .map(|(name, value)| format!("<ns:{name}>{}</ns:{name}>", escape(*value)))
        .collect();

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap12:Envelope xmlns:soap12="http://www.w3.org/2003/05/soap-envelope" xmlns:ns="{ns}">"#,
            "<soap12:Body><ns:{method}>{body}</ns:{method}></soap12:Body>",
            "</soap12:Envelope>"
        ),
        ns = namespace,
        method = method,
        body = body,
    )
}

struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Map::new(),
            text: String::new(),
        }
    }

    fn into_value(self) -> (String, Value) {
        let value = if !self.children.is_empty() {
            Value::Object(self.children)
        } else if self.text.is_empty() {
            Value::Null
        } else {
            Value::String(self.text)
        };
        (self.name, value)
    }
}

fn malformed(e: impl std::fmt::Display) -> GatewayError {
    GatewayError::Vendor(format!("malformed SOAP response: {}", e))
}

fn insert(map: &mut Map<String, Value>, name: String, value: Value) {
    match map.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(name, value);
        }
    }
}

/// Parses a whole XML document into an object keyed by root element name.
pub fn parse(xml: &str) -> Result<Value> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack = vec![Frame::new(String::new())];

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                stack.push(Frame::new(name));
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                let parent = stack.last_mut().ok_or_else(|| malformed("unbalanced document"))?;
                insert(&mut parent.children, name, Value::Null);
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(malformed)?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                let inner = c.into_inner();
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&inner));
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(malformed("unexpected closing tag"));
                }
                let (name, value) = stack.pop().ok_or_else(|| malformed("unbalanced document"))?.into_value();
                let parent = stack.last_mut().ok_or_else(|| malformed("unbalanced document"))?;
                insert(&mut parent.children, name, value);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(malformed("unclosed element"));
    }
    let root = stack.pop().ok_or_else(|| malformed("empty document"))?;
    if root.children.is_empty() {
        return Err(malformed("empty document"));
    }
    Ok(Value::Object(root.children))
}

/// Depth-first search for the first element with the given local name.
pub fn find<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map
            .get(name)
            .or_else(|| map.values().find_map(|child| find(child, name))),
        Value::Array(items) => items.iter().find_map(|item| find(item, name)),
        _ => None,
    }
}

/// Human-readable reason of a SOAP 1.1 or 1.2 fault, if the document is one.
pub fn fault_reason(document: &Value) -> Option<String> {
    let fault = find(document, "Fault")?;
    let reason = find(fault, "Text")
        .or_else(|| find(fault, "faultstring"))
        .and_then(Value::as_str)
        .unwrap_or("unknown fault");
    Some(reason.to_string())
}
