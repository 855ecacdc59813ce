// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Signature grammar.
//!
//! A type signature is a compact token string (`i`, `s`, `[i]`, `{sm}`, ...)
//! shared by reflection and the wire codec. A method signature wraps the
//! parameter tokens in a tuple envelope: `name::(s1s2...)`. The return
//! signature is tracked separately.

use crate::config::{
    COMPLETE_SEPARATOR, MAX_NESTING_DEPTH, METHOD_SEPARATOR, SIG_BOOL, SIG_DOUBLE, SIG_DYNAMIC,
    SIG_FLOAT, SIG_INT16, SIG_INT32, SIG_INT64, SIG_INT8, SIG_LIST_BEGIN, SIG_LIST_END,
    SIG_MAP_BEGIN, SIG_MAP_END, SIG_OBJECT, SIG_STRING, SIG_TUPLE_BEGIN, SIG_TUPLE_END,
    SIG_UINT16, SIG_UINT32, SIG_UINT64, SIG_UINT8, SIG_VOID,
};
use std::fmt;

/// Errors raised while parsing signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    Empty,
    UnexpectedEnd {
        signature: String,
    },
    UnexpectedToken {
        signature: String,
        position: usize,
        token: char,
    },
    Trailing {
        signature: String,
        position: usize,
    },
    TooDeep {
        signature: String,
    },
    NotAMethod(String),
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty signature"),
            Self::UnexpectedEnd { signature } => {
                write!(f, "Unexpected end of signature '{}'", signature)
            }
            Self::UnexpectedToken {
                signature,
                position,
                token,
            } => write!(
                f,
                "Unexpected token '{}' at {} in signature '{}'",
                token, position, signature
            ),
            Self::Trailing {
                signature,
                position,
            } => write!(
                f,
                "Trailing characters at {} in signature '{}'",
                position, signature
            ),
            Self::TooDeep { signature } => {
                write!(f, "Signature '{}' exceeds maximum nesting", signature)
            }
            Self::NotAMethod(sig) => write!(f, "Not a method signature: '{}'", sig),
        }
    }
}

impl std::error::Error for SignatureError {}

/// Parsed type signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Signature {
    Void,
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
    Dynamic,
    Object,
    List(Box<Signature>),
    Map(Box<Signature>, Box<Signature>),
    Tuple(Vec<Signature>),
}

impl Signature {
    /// Parse exactly one type signature.
    pub fn parse(text: &str) -> Result<Self, SignatureError> {
        if text.is_empty() {
            return Err(SignatureError::Empty);
        }
        let mut parser = Parser::new(text);
        let sig = parser.parse_one(0)?;
        parser.finish()?;
        Ok(sig)
    }

    /// Parse a concatenation of signatures (`"is[d]"` -> `[Int32, String, List(Double)]`).
    pub fn parse_sequence(text: &str) -> Result<Vec<Self>, SignatureError> {
        let mut parser = Parser::new(text);
        let mut out = Vec::new();
        while !parser.at_end() {
            out.push(parser.parse_one(0)?);
        }
        Ok(out)
    }

    fn token(&self) -> Option<u8> {
        Some(match self {
            Self::Void => SIG_VOID,
            Self::Bool => SIG_BOOL,
            Self::Int8 => SIG_INT8,
            Self::UInt8 => SIG_UINT8,
            Self::Int16 => SIG_INT16,
            Self::UInt16 => SIG_UINT16,
            Self::Int32 => SIG_INT32,
            Self::UInt32 => SIG_UINT32,
            Self::Int64 => SIG_INT64,
            Self::UInt64 => SIG_UINT64,
            Self::Float => SIG_FLOAT,
            Self::Double => SIG_DOUBLE,
            Self::String => SIG_STRING,
            Self::Dynamic => SIG_DYNAMIC,
            Self::Object => SIG_OBJECT,
            Self::List(_) | Self::Map(..) | Self::Tuple(_) => return None,
        })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(token) = self.token() {
            return write!(f, "{}", token as char);
        }
        match self {
            Self::List(elem) => write!(f, "[{}]", elem),
            Self::Map(key, value) => write!(f, "{{{}{}}}", key, value),
            Self::Tuple(items) => {
                write!(f, "(")?;
                for item in items {
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            _ => Ok(()),
        }
    }
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn finish(&self) -> Result<(), SignatureError> {
        if self.at_end() {
            Ok(())
        } else {
            Err(SignatureError::Trailing {
                signature: self.text.to_string(),
                position: self.pos,
            })
        }
    }

    fn next(&mut self) -> Result<u8, SignatureError> {
        let byte = self
            .bytes
            .get(self.pos)
            .copied()
            .ok_or_else(|| SignatureError::UnexpectedEnd {
                signature: self.text.to_string(),
            })?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, token: u8) -> Result<(), SignatureError> {
        let position = self.pos;
        match self.next()? {
            b if b == token => Ok(()),
            other => Err(self.unexpected(position, other)),
        }
    }

    fn unexpected(&self, position: usize, token: u8) -> SignatureError {
        SignatureError::UnexpectedToken {
            signature: self.text.to_string(),
            position,
            token: token as char,
        }
    }

    fn parse_one(&mut self, depth: usize) -> Result<Signature, SignatureError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(SignatureError::TooDeep {
                signature: self.text.to_string(),
            });
        }
        let position = self.pos;
        let sig = match self.next()? {
            SIG_VOID => Signature::Void,
            SIG_BOOL => Signature::Bool,
            SIG_INT8 => Signature::Int8,
            SIG_UINT8 => Signature::UInt8,
            SIG_INT16 => Signature::Int16,
            SIG_UINT16 => Signature::UInt16,
            SIG_INT32 => Signature::Int32,
            SIG_UINT32 => Signature::UInt32,
            SIG_INT64 => Signature::Int64,
            SIG_UINT64 => Signature::UInt64,
            SIG_FLOAT => Signature::Float,
            SIG_DOUBLE => Signature::Double,
            SIG_STRING => Signature::String,
            SIG_DYNAMIC => Signature::Dynamic,
            SIG_OBJECT => Signature::Object,
            SIG_LIST_BEGIN => {
                let elem = self.parse_one(depth + 1)?;
                self.expect(SIG_LIST_END)?;
                Signature::List(Box::new(elem))
            }
            SIG_MAP_BEGIN => {
                let key = self.parse_one(depth + 1)?;
                let value = self.parse_one(depth + 1)?;
                self.expect(SIG_MAP_END)?;
                Signature::Map(Box::new(key), Box::new(value))
            }
            SIG_TUPLE_BEGIN => {
                let mut items = Vec::new();
                loop {
                    match self.bytes.get(self.pos) {
                        Some(&SIG_TUPLE_END) => {
                            self.pos += 1;
                            break;
                        }
                        Some(_) => items.push(self.parse_one(depth + 1)?),
                        None => {
                            return Err(SignatureError::UnexpectedEnd {
                                signature: self.text.to_string(),
                            })
                        }
                    }
                }
                Signature::Tuple(items)
            }
            other => return Err(self.unexpected(position, other)),
        };
        Ok(sig)
    }
}

/// Parsed `name::(params)` method signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<Signature>,
}

impl MethodSignature {
    pub fn parse(text: &str) -> Result<Self, SignatureError> {
        let not_a_method = || SignatureError::NotAMethod(text.to_string());
        let (name, envelope) = text.split_once(METHOD_SEPARATOR).ok_or_else(not_a_method)?;
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(not_a_method());
        }
        match Signature::parse(envelope)? {
            Signature::Tuple(params) => Ok(Self {
                name: name.to_string(),
                params,
            }),
            _ => Err(not_a_method()),
        }
    }

    /// The parameter envelope, e.g. `(is)`.
    pub fn params_signature(&self) -> String {
        Signature::Tuple(self.params.clone()).to_string()
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, METHOD_SEPARATOR, self.params_signature())
    }
}

/// Build `name::(params)` from a name and concatenated parameter tokens.
pub fn make_method_signature(name: &str, params: &str) -> String {
    format!("{}{}({})", name, METHOD_SEPARATOR, params)
}

/// Split the complete `"<ret> <name>::(<params>)"` form into
/// `(sigreturn, method signature)`, validating both halves.
pub fn split_complete(complete: &str) -> Result<(String, String), SignatureError> {
    let (ret, method) = complete
        .trim()
        .split_once(COMPLETE_SEPARATOR)
        .ok_or_else(|| SignatureError::NotAMethod(complete.to_string()))?;
    Signature::parse(ret)?;
    let method = MethodSignature::parse(method.trim())?;
    Ok((ret.to_string(), method.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitives() {
        assert_eq!(Signature::parse("i"), Ok(Signature::Int32));
        assert_eq!(Signature::parse("L"), Ok(Signature::UInt64));
        assert_eq!(Signature::parse("m"), Ok(Signature::Dynamic));
        assert_eq!(Signature::parse(""), Err(SignatureError::Empty));
    }

    #[test]
    fn test_parse_containers() {
        let sig = Signature::parse("{s[d]}").expect("map");
        assert_eq!(
            sig,
            Signature::Map(
                Box::new(Signature::String),
                Box::new(Signature::List(Box::new(Signature::Double)))
            )
        );
        assert_eq!(sig.to_string(), "{s[d]}");

        let tuple = Signature::parse("(is[b])").expect("tuple");
        assert_eq!(tuple.to_string(), "(is[b])");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Signature::parse("[i"),
            Err(SignatureError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            Signature::parse("ii"),
            Err(SignatureError::Trailing { position: 1, .. })
        ));
        assert!(matches!(
            Signature::parse("[x]"),
            Err(SignatureError::UnexpectedToken {
                position: 1,
                token: 'x',
                ..
            })
        ));
        let deep = format!("{}i{}", "[".repeat(40), "]".repeat(40));
        assert!(matches!(
            Signature::parse(&deep),
            Err(SignatureError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_parse_sequence() {
        let seq = Signature::parse_sequence("is[d]").expect("sequence");
        assert_eq!(seq.len(), 3);
        assert!(Signature::parse_sequence("").expect("empty").is_empty());
    }

    #[test]
    fn test_method_signature() {
        let m = MethodSignature::parse("echo::(s)").expect("method");
        assert_eq!(m.name, "echo");
        assert_eq!(m.params, vec![Signature::String]);
        assert_eq!(m.to_string(), "echo::(s)");

        let empty = MethodSignature::parse("ping::()").expect("no params");
        assert!(empty.params.is_empty());

        assert!(MethodSignature::parse("echo").is_err());
        assert!(MethodSignature::parse("::(s)").is_err());
        assert!(MethodSignature::parse("echo::s").is_err());
    }

    #[test]
    fn test_split_complete() {
        let (ret, method) = split_complete("s echo::(s)").expect("complete");
        assert_eq!(ret, "s");
        assert_eq!(method, "echo::(s)");
        assert!(split_complete("echo::(s)").is_err());
    }
}
