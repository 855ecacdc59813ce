// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Argument and result buffers.
//!
//! Little-endian, CDR-style aligned encoding driven by a signature:
//!
//! - integers and floats are aligned to their size
//! - strings are a `u32` length (including NUL), the bytes, then NUL
//! - lists are a `u32` count followed by the elements
//! - maps are a `u32` count followed by key/value pairs
//! - dynamic values are the inner signature (as a string) then the inner value
//! - void encodes nothing; a tuple encodes its elements in order
//!
//! Object handles (`o`) cannot cross a buffer.

use crate::config::MAX_NESTING_DEPTH;
use crate::signature::{Signature, SignatureError};
use crate::types::TypeRegistry;
use crate::value::{ConversionError, DynamicValue, Value, ValueRef};
use std::fmt;

/// Errors for buffer encoding and decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    BufferTooSmall { need: usize, have: usize },
    InvalidData(String),
    UnsupportedType(String),
    Utf8Error(std::string::FromUtf8Error),
    TypeMismatch { expected: String, found: String },
    TrailingBytes(usize),
    ArgumentCount { expected: usize, found: usize },
    InvalidSignature(SignatureError),
    Conversion(ConversionError),
    TooDeep,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall { need, have } => {
                write!(f, "Buffer too small: need {} bytes, have {}", need, have)
            }
            Self::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            Self::UnsupportedType(t) => write!(f, "Unsupported type: {}", t),
            Self::Utf8Error(e) => write!(f, "UTF-8 error: {}", e),
            Self::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
            Self::TrailingBytes(count) => write!(f, "{} trailing bytes after last value", count),
            Self::ArgumentCount { expected, found } => {
                write!(f, "Expected {} arguments, found {}", expected, found)
            }
            Self::InvalidSignature(e) => write!(f, "Invalid signature: {}", e),
            Self::Conversion(e) => write!(f, "Conversion failed: {}", e),
            Self::TooDeep => write!(f, "Value nesting exceeds {}", MAX_NESTING_DEPTH),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Utf8Error(e) => Some(e),
            Self::InvalidSignature(e) => Some(e),
            Self::Conversion(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::string::FromUtf8Error> for CodecError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::Utf8Error(e)
    }
}

impl From<SignatureError> for CodecError {
    fn from(e: SignatureError) -> Self {
        Self::InvalidSignature(e)
    }
}

impl From<ConversionError> for CodecError {
    fn from(e: ConversionError) -> Self {
        Self::Conversion(e)
    }
}

/// Encode `args` in order, each by its own type signature.
pub fn encode_arguments(args: &[ValueRef<'_>]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = Encoder::new();
    for arg in args {
        let signature = Signature::parse(arg.signature())?;
        encoder.encode_value(&dynamic_of(*arg)?, &signature, 0)?;
    }
    Ok(encoder.into_bytes())
}

/// Encode `args` against a parameter list, converting each argument to the
/// canonical type of its parameter first.
pub fn encode_arguments_for(
    args: &[ValueRef<'_>],
    params: &[Signature],
) -> Result<Vec<u8>, CodecError> {
    if args.len() != params.len() {
        return Err(CodecError::ArgumentCount {
            expected: params.len(),
            found: args.len(),
        });
    }
    let registry = TypeRegistry::builtin();
    let mut encoder = Encoder::new();
    for (arg, param) in args.iter().zip(params) {
        let target = registry
            .for_signature(param)
            .ok_or_else(|| CodecError::UnsupportedType(param.to_string()))?;
        let converted = arg.convert(&target)?;
        encoder.encode_value(&dynamic_of(converted.view())?, param, 0)?;
    }
    Ok(encoder.into_bytes())
}

/// Decode an argument buffer into values of the canonical parameter types.
///
/// The whole buffer must be consumed.
pub fn decode_arguments(bytes: &[u8], params: &[Signature]) -> Result<Vec<Value>, CodecError> {
    let registry = TypeRegistry::builtin();
    let mut decoder = Decoder::new(bytes);
    let mut values = Vec::with_capacity(params.len());
    for param in params {
        let dynamic = decoder.decode_value(param, 0)?;
        values.push(rebuild(registry, param, &dynamic)?);
    }
    decoder.finish()?;
    Ok(values)
}

/// Encode a return value against the method's return signature.
pub fn encode_result(value: ValueRef<'_>, signature: &Signature) -> Result<Vec<u8>, CodecError> {
    let mut encoder = Encoder::new();
    encoder.encode_value(&dynamic_of(value)?, signature, 0)?;
    Ok(encoder.into_bytes())
}

/// Decode a result buffer produced for return signature `signature`.
pub fn decode_result(bytes: &[u8], signature: &str) -> Result<Value, CodecError> {
    let signature = Signature::parse(signature)?;
    let dynamic = decode_dynamic(bytes, &signature)?;
    rebuild(TypeRegistry::builtin(), &signature, &dynamic)
}

/// Encode a structural value against `signature`.
pub fn encode_dynamic(value: &DynamicValue, signature: &Signature) -> Result<Vec<u8>, CodecError> {
    let mut encoder = Encoder::new();
    encoder.encode_value(value, signature, 0)?;
    Ok(encoder.into_bytes())
}

/// Decode exactly one structural value of `signature`.
pub fn decode_dynamic(bytes: &[u8], signature: &Signature) -> Result<DynamicValue, CodecError> {
    let mut decoder = Decoder::new(bytes);
    let value = decoder.decode_value(signature, 0)?;
    decoder.finish()?;
    Ok(value)
}

fn dynamic_of(value: ValueRef<'_>) -> Result<DynamicValue, CodecError> {
    value
        .to_dynamic()
        .ok_or_else(|| CodecError::UnsupportedType(value.type_descriptor().name().to_string()))
}

fn rebuild(
    registry: &TypeRegistry,
    signature: &Signature,
    dynamic: &DynamicValue,
) -> Result<Value, CodecError> {
    let ty = registry
        .for_signature(signature)
        .ok_or_else(|| CodecError::UnsupportedType(signature.to_string()))?;
    ty.from_dynamic(dynamic).ok_or_else(|| {
        CodecError::InvalidData(format!("cannot build '{}' from {:?}", signature, dynamic))
    })
}

fn mismatch(signature: &Signature, value: &DynamicValue) -> CodecError {
    CodecError::TypeMismatch {
        expected: signature.to_string(),
        found: format!("{:?}", value),
    }
}

struct Encoder {
    buffer: Vec<u8>,
}

impl Encoder {
    fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    fn align(&mut self, alignment: usize) {
        let padding = (alignment - (self.buffer.len() % alignment)) % alignment;
        self.buffer.extend(std::iter::repeat_n(0, padding));
    }

    fn write_u32(&mut self, v: u32) {
        self.align(4);
        self.buffer.extend(&v.to_le_bytes());
    }

    fn write_len(&mut self, len: usize) -> Result<(), CodecError> {
        let len = u32::try_from(len)
            .map_err(|_| CodecError::InvalidData(format!("length {} exceeds u32", len)))?;
        self.write_u32(len);
        Ok(())
    }

    fn write_string(&mut self, s: &str) -> Result<(), CodecError> {
        let bytes = s.as_bytes();
        // Length includes null terminator
        self.write_len(bytes.len() + 1)?;
        self.buffer.extend(bytes);
        self.buffer.push(0);
        Ok(())
    }

    fn encode_value(
        &mut self,
        value: &DynamicValue,
        signature: &Signature,
        depth: usize,
    ) -> Result<(), CodecError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(CodecError::TooDeep);
        }
        macro_rules! int {
            ($ty:ty, $get:ident) => {{
                let v = value
                    .$get()
                    .and_then(|v| <$ty>::try_from(v).ok())
                    .ok_or_else(|| mismatch(signature, value))?;
                self.align(std::mem::size_of::<$ty>());
                self.buffer.extend(&v.to_le_bytes());
            }};
        }

        match signature {
            Signature::Void => {
                if !value.is_void() {
                    return Err(mismatch(signature, value));
                }
            }
            Signature::Bool => {
                let v = value.as_bool().ok_or_else(|| mismatch(signature, value))?;
                self.buffer.push(u8::from(v));
            }
            Signature::Int8 => int!(i8, as_i64),
            Signature::UInt8 => int!(u8, as_u64),
            Signature::Int16 => int!(i16, as_i64),
            Signature::UInt16 => int!(u16, as_u64),
            Signature::Int32 => int!(i32, as_i64),
            Signature::UInt32 => int!(u32, as_u64),
            Signature::Int64 => int!(i64, as_i64),
            Signature::UInt64 => int!(u64, as_u64),
            Signature::Float => {
                let v = value.as_f64().ok_or_else(|| mismatch(signature, value))? as f32;
                self.align(4);
                self.buffer.extend(&v.to_le_bytes());
            }
            Signature::Double => {
                let v = value.as_f64().ok_or_else(|| mismatch(signature, value))?;
                self.align(8);
                self.buffer.extend(&v.to_le_bytes());
            }
            Signature::String => {
                let s = value.as_str().ok_or_else(|| mismatch(signature, value))?;
                self.write_string(s)?;
            }
            Signature::Dynamic => {
                let DynamicValue::Dynamic(inner_signature, inner) = value else {
                    return Err(mismatch(signature, value));
                };
                let parsed = Signature::parse(inner_signature)?;
                self.write_string(inner_signature)?;
                self.encode_value(inner, &parsed, depth + 1)?;
            }
            Signature::Object => {
                return Err(CodecError::UnsupportedType(signature.to_string()));
            }
            Signature::List(element) => {
                let items = value.as_list().ok_or_else(|| mismatch(signature, value))?;
                self.write_len(items.len())?;
                for item in items {
                    self.encode_value(item, element, depth + 1)?;
                }
            }
            Signature::Map(key, val) => {
                let entries = value.as_map().ok_or_else(|| mismatch(signature, value))?;
                self.write_len(entries.len())?;
                for (k, v) in entries {
                    self.encode_value(k, key, depth + 1)?;
                    self.encode_value(v, val, depth + 1)?;
                }
            }
            Signature::Tuple(members) => {
                let items = value
                    .as_list()
                    .filter(|items| items.len() == members.len())
                    .ok_or_else(|| mismatch(signature, value))?;
                for (item, member) in items.iter().zip(members) {
                    self.encode_value(item, member, depth + 1)?;
                }
            }
        }
        Ok(())
    }
}

struct Decoder<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Decoder<'a> {
    fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    fn finish(&self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            extra => Err(CodecError::TrailingBytes(extra)),
        }
    }

    fn align(&mut self, alignment: usize) {
        self.offset = (self.offset + alignment - 1) & !(alignment - 1);
    }

    fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], CodecError> {
        if count > self.remaining() {
            return Err(CodecError::BufferTooSmall {
                need: count,
                have: self.remaining(),
            });
        }
        let slice = &self.buffer[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        self.align(N);
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.read_array::<4>()?))
    }

    fn read_len(&mut self) -> Result<usize, CodecError> {
        let len = self.read_u32()? as usize;
        // untrusted counts are bounded by the buffer size
        if len > self.buffer.len() {
            return Err(CodecError::InvalidData(format!(
                "length {} exceeds buffer size {}",
                len,
                self.buffer.len()
            )));
        }
        Ok(len)
    }

    fn read_string(&mut self) -> Result<String, CodecError> {
        let len = self.read_len()?;
        if len == 0 {
            return Ok(String::new());
        }
        let bytes = self.read_bytes(len)?;
        let (text, terminator) = bytes.split_at(len - 1);
        if terminator != [0] {
            return Err(CodecError::InvalidData("string is not NUL-terminated".into()));
        }
        Ok(String::from_utf8(text.to_vec())?)
    }

    fn decode_value(
        &mut self,
        signature: &Signature,
        depth: usize,
    ) -> Result<DynamicValue, CodecError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(CodecError::TooDeep);
        }
        let value = match signature {
            Signature::Void => DynamicValue::Void,
            Signature::Bool => DynamicValue::Bool(self.read_bytes(1)?[0] != 0),
            Signature::Int8 => DynamicValue::Int(i64::from(i8::from_le_bytes(self.read_array()?))),
            Signature::UInt8 => DynamicValue::UInt(u64::from(self.read_bytes(1)?[0])),
            Signature::Int16 => {
                DynamicValue::Int(i64::from(i16::from_le_bytes(self.read_array()?)))
            }
            Signature::UInt16 => {
                DynamicValue::UInt(u64::from(u16::from_le_bytes(self.read_array()?)))
            }
            Signature::Int32 => {
                DynamicValue::Int(i64::from(i32::from_le_bytes(self.read_array()?)))
            }
            Signature::UInt32 => {
                DynamicValue::UInt(u64::from(u32::from_le_bytes(self.read_array()?)))
            }
            Signature::Int64 => DynamicValue::Int(i64::from_le_bytes(self.read_array()?)),
            Signature::UInt64 => DynamicValue::UInt(u64::from_le_bytes(self.read_array()?)),
            Signature::Float => {
                DynamicValue::Float(f64::from(f32::from_le_bytes(self.read_array()?)))
            }
            Signature::Double => DynamicValue::Float(f64::from_le_bytes(self.read_array()?)),
            Signature::String => DynamicValue::String(self.read_string()?),
            Signature::Dynamic => {
                let inner_signature = self.read_string()?;
                let parsed = Signature::parse(&inner_signature)?;
                let inner = self.decode_value(&parsed, depth + 1)?;
                DynamicValue::Dynamic(inner_signature, Box::new(inner))
            }
            Signature::Object => {
                return Err(CodecError::UnsupportedType(signature.to_string()));
            }
            Signature::List(element) => {
                let count = self.read_len()?;
                let mut items = Vec::with_capacity(count.min(self.remaining()));
                for _ in 0..count {
                    items.push(self.decode_value(element, depth + 1)?);
                }
                DynamicValue::List(items)
            }
            Signature::Map(key, val) => {
                let count = self.read_len()?;
                let mut entries = Vec::with_capacity(count.min(self.remaining()));
                for _ in 0..count {
                    let k = self.decode_value(key, depth + 1)?;
                    let v = self.decode_value(val, depth + 1)?;
                    entries.push((k, v));
                }
                DynamicValue::Map(entries)
            }
            Signature::Tuple(members) => DynamicValue::List(
                members
                    .iter()
                    .map(|member| self.decode_value(member, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sigs(text: &str) -> Vec<Signature> {
        Signature::parse_sequence(text).expect("valid signature")
    }

    #[test]
    fn test_string_layout() {
        let bytes = encode_arguments(&[Value::from_native("abc".to_string()).view()])
            .expect("encode");
        assert_eq!(bytes, vec![4, 0, 0, 0, b'a', b'b', b'c', 0]);
    }

    #[test]
    fn test_alignment_between_arguments() {
        let args = [Value::from_native(1u8), Value::from_native(2i32)];
        let views: Vec<_> = args.iter().map(Value::view).collect();
        let bytes = encode_arguments(&views).expect("encode");
        // u8, three bytes padding, i32
        assert_eq!(bytes, vec![1, 0, 0, 0, 2, 0, 0, 0]);

        let decoded = decode_arguments(&bytes, &sigs("Ci")).expect("decode");
        assert_eq!(decoded[0].downcast_ref::<u8>(), Some(&1));
        assert_eq!(decoded[1].downcast_ref::<i32>(), Some(&2));
    }

    #[test]
    fn test_decode_list_as_erased() {
        let list = Value::from_native(vec![1.5f64, -2.0]);
        let bytes = encode_arguments(&[list.view()]).expect("encode");
        let decoded = decode_arguments(&bytes, &sigs("[d]")).expect("decode");
        assert_eq!(decoded[0].signature(), "[d]");
        let floats: Vec<f64> = decoded[0]
            .elements()
            .expect("list")
            .filter_map(|item| item.as_float())
            .collect();
        assert_eq!(floats, vec![1.5, -2.0]);
    }

    #[test]
    fn test_decode_large_map() {
        let count = 40_000i32;
        let mut bytes = (count as u32 + 1).to_le_bytes().to_vec();
        for key in 0..count {
            bytes.extend(key.to_le_bytes());
            bytes.extend((key * 3).to_le_bytes());
        }
        // a repeated key on the wire replaces the earlier value
        bytes.extend(7i32.to_le_bytes());
        bytes.extend((-1i32).to_le_bytes());

        let decoded = decode_arguments(&bytes, &sigs("{ii}")).expect("decode");
        assert_eq!(decoded[0].len(), Some(count as usize));
        let map = decoded[0]
            .downcast_ref::<crate::types::ErasedMap>()
            .expect("erased map");
        let key = Value::from_native(7i32);
        assert_eq!(map.get(key.view()).and_then(|v| v.as_int()), Some(-1));
        let key = Value::from_native(count - 1);
        assert_eq!(map.get(key.view()).and_then(|v| v.as_int()), Some(i64::from(count - 1) * 3));
    }

    #[test]
    fn test_dynamic_carries_inner_signature() {
        let value = Value::dynamic(Value::from_native(7u16));
        let bytes = encode_arguments(&[value.view()]).expect("encode");
        let decoded = decode_arguments(&bytes, &sigs("m")).expect("decode");
        let inner = decoded[0].view().dynamic_inner().expect("dynamic");
        assert_eq!(inner.signature(), "W");
        assert_eq!(inner.as_int(), Some(7));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let bytes = encode_arguments(&[Value::from_native(5i32).view()]).expect("encode");
        let mut longer = bytes.clone();
        longer.extend([0, 0, 0, 0]);
        assert_eq!(
            decode_arguments(&longer, &sigs("i")),
            Err(CodecError::TrailingBytes(4))
        );
    }

    #[test]
    fn test_truncated_buffer() {
        assert!(matches!(
            decode_arguments(&[1, 0], &sigs("i")),
            Err(CodecError::BufferTooSmall { .. })
        ));
        assert!(matches!(
            decode_arguments(&[200, 0, 0, 0, b'x'], &sigs("s")),
            Err(CodecError::InvalidData(_))
        ));
    }

    #[test]
    fn test_encode_for_converts_arguments() {
        let arg = Value::from_native(3i32);
        let bytes = encode_arguments_for(&[arg.view()], &sigs("d")).expect("encode");
        assert_eq!(bytes, 3.0f64.to_le_bytes().to_vec());
        assert!(matches!(
            encode_arguments_for(&[arg.view()], &sigs("ii")),
            Err(CodecError::ArgumentCount { .. })
        ));
    }

    #[test]
    fn test_out_of_range_integer() {
        let tree = DynamicValue::Int(300);
        assert!(matches!(
            encode_dynamic(&tree, &Signature::UInt8),
            Err(CodecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_object_unsupported() {
        assert!(matches!(
            decode_result(&[], "o"),
            Err(CodecError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_void_result() {
        let bytes = encode_result(Value::void().view(), &Signature::Void).expect("encode");
        assert!(bytes.is_empty());
        let value = decode_result(&bytes, "v").expect("decode");
        assert_eq!(value.signature(), "v");
    }
}
