//! Typed response payloads and request payload reading.
//!
//! Response payloads are heterogeneous: a command returns a scalar, a
//! fixed-layout array, or pre-packed raw bytes (direct-variable runs, the
//! emergency-info record). [`DcpValue`] captures that and owns the default
//! encodings: f64 → 8-byte IEEE754, bool → 1 byte, i32 → 4-byte signed, all
//! little-endian. Anything needing an explicit overriding tag is packed
//! upstream and travels as `Raw`.

use crate::errors::DcpError;

#[derive(Debug, Clone, PartialEq)]
pub enum DcpValue {
    /// Header-only response.
    Unit,
    Bool(bool),
    Int(i32),
    Float(f64),
    BoolArray(Vec<bool>),
    IntArray(Vec<i32>),
    FloatArray(Vec<f64>),
    /// Already packed bytes; the caller chose the layout.
    Raw(Vec<u8>),
}

impl DcpValue {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            DcpValue::Unit => Vec::new(),
            DcpValue::Bool(v) => vec![u8::from(*v)],
            DcpValue::Int(v) => v.to_le_bytes().to_vec(),
            DcpValue::Float(v) => v.to_le_bytes().to_vec(),
            DcpValue::BoolArray(vs) => vs.iter().map(|v| u8::from(*v)).collect(),
            DcpValue::IntArray(vs) => {
                let mut out = Vec::with_capacity(vs.len() * 4);
                for v in vs {
                    out.extend_from_slice(&v.to_le_bytes());
                }
                out
            }
            DcpValue::FloatArray(vs) => {
                let mut out = Vec::with_capacity(vs.len() * 8);
                for v in vs {
                    out.extend_from_slice(&v.to_le_bytes());
                }
                out
            }
            DcpValue::Raw(bytes) => bytes.clone(),
        }
    }
}

/// Cursor over a request payload.
///
/// Handlers read their arguments in declaration order; any short read is a
/// parse failure for the whole command.
pub struct PayloadReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    pub fn new(buf: &'a [u8]) -> PayloadReader<'a> {
        PayloadReader { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DcpError> {
        if self.remaining() < n {
            return Err(DcpError::Decode(format!(
                "payload needs {} more bytes at offset {}, {} left",
                n,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, DcpError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool, DcpError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i32(&mut self) -> Result<i32, DcpError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_f64(&mut self) -> Result<f64, DcpError> {
        let b = self.take(8)?;
        Ok(f64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_f64_array(&mut self, n: usize) -> Result<Vec<f64>, DcpError> {
        (0..n).map(|_| self.read_f64()).collect()
    }

    pub fn read_bool_array(&mut self, n: usize) -> Result<Vec<bool>, DcpError> {
        (0..n).map(|_| self.read_bool()).collect()
    }

    /// Hands the unread tail to the caller, consuming it.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = &self.buf[self.pos..];
        self.pos = self.buf.len();
        rest
    }
}
