// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use super::xml::XmlElement;
use crate::common::Error;
use quick_xml::escape::escape;
use std::collections::BTreeMap;
use std::fmt::Write;

/// A decoded node of the provider's self-describing response tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A node tagged `xsi:nil="true"`.
    Null,
    /// `xsd:string`
    String(String),
    /// `xsd:int`
    Int(i64),
    /// `xsd:float`
    Float(f64),
    /// `ns2:Map`, a sequence of (key, value) items.
    Map(BTreeMap<String, Value>),
    /// `SOAP-ENC:Array`
    List(Vec<Value>),
}

impl Value {
    /// Decode a typed node, recursing into containers. Untyped nodes are
    /// passed through as their serialized XML.
    pub fn decode(node: &XmlElement) -> Result<Self, Error> {
        if let Some(type_name) = node.attribute("type") {
            let local = type_name.rsplit(':').next().unwrap_or(type_name);
            match local {
                "string" => Ok(Value::String(node.text().to_string())),
                "int" => node
                    .text()
                    .trim()
                    .parse()
                    .map(Value::Int)
                    .map_err(|e| Error::Decode(format!("{type_name} {:?}: {e}", node.text()))),
                "float" => node
                    .text()
                    .trim()
                    .parse()
                    .map(Value::Float)
                    .map_err(|e| Error::Decode(format!("{type_name} {:?}: {e}", node.text()))),
                "Map" => Self::decode_pairs(node.children()),
                "Array" => node
                    .children()
                    .iter()
                    .map(Self::decode)
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List),
                _ => Err(Error::Decode(format!("Unsupported type {type_name}"))),
            }
        } else if node.attribute("nil") == Some("true") {
            Ok(Value::Null)
        } else {
            Ok(Value::String(node.to_xml()))
        }
    }

    /// Decode a sequence of `<item><key/><value/></item>` pairs into a map.
    pub fn decode_pairs(items: &[XmlElement]) -> Result<Self, Error> {
        let mut map = BTreeMap::new();
        for item in items {
            let (key, value) = match item.children() {
                [key, value, ..] => (key, value),
                _ => {
                    return Err(Error::Decode(format!(
                        "<{}> is not a key/value pair",
                        item.name()
                    )))
                }
            };
            let key = match Self::decode(key)? {
                Value::String(s) => s,
                Value::Int(n) => n.to_string(),
                other => return Err(Error::Decode(format!("unsupported map key {other:?}"))),
            };
            map.insert(key, Self::decode(value)?);
        }
        Ok(Value::Map(map))
    }

    /// Encode as a typed node named `tag`; the inverse of `decode`.
    pub fn to_xml(&self, tag: &str) -> String {
        let mut out = String::new();
        self.write_xml(tag, &mut out);
        out
    }

    fn write_xml(&self, tag: &str, out: &mut String) {
        // Writing to a String cannot fail.
        let _ = match self {
            Value::Null => write!(out, r#"<{tag} xsi:nil="true"/>"#),
            Value::String(s) => write!(out, r#"<{tag} xsi:type="xsd:string">{}</{tag}>"#, escape(s.as_str())),
            Value::Int(n) => write!(out, r#"<{tag} xsi:type="xsd:int">{n}</{tag}>"#),
            Value::Float(x) => write!(out, r#"<{tag} xsi:type="xsd:float">{x}</{tag}>"#),
            Value::Map(map) => {
                let _ = write!(out, r#"<{tag} xsi:type="ns2:Map">"#);
                for (key, value) in map {
                    out.push_str("<item>");
                    Value::String(key.clone()).write_xml("key", out);
                    value.write_xml("value", out);
                    out.push_str("</item>");
                }
                write!(out, "</{tag}>")
            }
            Value::List(list) => {
                let _ = write!(out, r#"<{tag} xsi:type="SOAP-ENC:Array">"#);
                for value in list {
                    value.write_xml("item", out);
                }
                write!(out, "</{tag}>")
            }
        };
    }

    /// Member of a map, if this is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// The string, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The elements, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Numeric value of an int, a float, or a numeric string.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Text form of a scalar; ints and floats are formatted.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Int(n) => Some(n.to_string()),
            Value::Float(x) => Some(x.to_string()),
            _ => None,
        }
    }
}
