//! XML to JSON conversion for CHPP responses.
//!
//! The conversion mirrors the shape the rest of the pipeline expects from a
//! raw attribute bag:
//! - child elements become object keys, repeated names collapse into arrays;
//! - numeric-looking text becomes JSON numbers, everything else stays a
//!   string (an empty element is the empty string);
//! - attributes merge into the element's object; mixed content keeps its
//!   text under `"_text"`.
//!
//! Element names are preserved byte-for-byte: they end up as PlayerChange
//! field names and as Position-Scorer input keys.

use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::{Map, Value};
use thiserror::Error;

/// The response was not well-formed XML.
#[derive(Debug, Error)]
#[error("malformed XML: {0}")]
pub struct XmlError(pub String);

struct Frame {
    name: String,
    map: Map<String, Value>,
    text: String,
}

/// Convert an XML document into a JSON value rooted at an object keyed by
/// the document's top-level element name(s).
pub fn xml_to_value(xml: &str) -> Result<Value, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack = vec![Frame {
        name: String::new(),
        map: Map::new(),
        text: String::new(),
    }];

    loop {
        match reader.read_event().map_err(|e| XmlError(e.to_string()))? {
            Event::Start(start) => {
                let mut frame = Frame {
                    name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                    map: Map::new(),
                    text: String::new(),
                };
                collect_attributes(&start, &mut frame.map)?;
                stack.push(frame);
            }
            Event::Empty(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                let mut map = Map::new();
                collect_attributes(&start, &mut map)?;
                let value = finalize(map, "");
                push_child(&mut stack, name, value);
            }
            Event::Text(text) => {
                let chunk = text.unescape().map_err(|e| XmlError(e.to_string()))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&chunk);
                }
            }
            Event::CData(cdata) => {
                let raw = cdata.into_inner();
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&raw));
                }
            }
            Event::End(_) => {
                let frame = stack.pop().ok_or_else(|| XmlError("unbalanced end tag".into()))?;
                if stack.is_empty() {
                    return Err(XmlError("unbalanced end tag".into()));
                }
                let value = finalize(frame.map, &frame.text);
                push_child(&mut stack, frame.name, value);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(XmlError("unclosed element at end of document".into()));
    }
    let root = stack.pop().ok_or_else(|| XmlError("empty document".into()))?;
    Ok(Value::Object(root.map))
}

fn collect_attributes(
    start: &quick_xml::events::BytesStart<'_>,
    map: &mut Map<String, Value>,
) -> Result<(), XmlError> {
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError(e.to_string()))?
            .into_owned();
        map.insert(key, scalar(&value));
    }
    Ok(())
}

fn push_child(stack: &mut [Frame], name: String, value: Value) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    match parent.map.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.map.insert(name, value);
        }
    }
}

fn finalize(map: Map<String, Value>, text: &str) -> Value {
    if map.is_empty() {
        scalar(text)
    } else if text.trim().is_empty() {
        Value::Object(map)
    } else {
        let mut map = map;
        map.insert("_text".to_string(), scalar(text));
        Value::Object(map)
    }
}

fn scalar(text: &str) -> Value {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        if let Ok(int) = trimmed.parse::<i64>() {
            return Value::from(int);
        }
        if let Ok(float) = trimmed.parse::<f64>() {
            if float.is_finite() {
                return Value::from(float);
            }
        }
    }
    Value::String(text.to_string())
}
