//! Direct variables: flatly addressed typed values exposed for external
//! read/write.
//!
//! A request names a wire type tag, a start address, and optionally a count;
//! the run of consecutive addresses must all be of that one type. Seven wire
//! tags cover five logical kinds (the three integer widths share one kind,
//! the two float widths another).

use crate::errors::{DcpError, DcpErrorCode};
use int_enum::IntEnum;

/// Exclusive upper bound of the direct-variable address space.
pub const ADDRESS_LIMIT: i32 = 2000;
/// Maximum number of consecutive addresses one batched request may touch.
pub const REFNUM_LIMIT: i32 = 20;

/// Wire type tags for direct variables.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntEnum)]
pub enum DirectVarType {
    Byte = 0,
    Word = 1,
    DWord = 2,
    LWord = 3,
    Float = 4,
    DFloat = 5,
    ModbusReg = 10,
}

impl DirectVarType {
    /// Encoded width of one value of this type.
    pub fn width(self) -> usize {
        match self {
            DirectVarType::Byte => 1,
            DirectVarType::Word | DirectVarType::ModbusReg => 2,
            DirectVarType::DWord | DirectVarType::Float => 4,
            DirectVarType::LWord | DirectVarType::DFloat => 8,
        }
    }
}

/// One direct-variable value, carrying its wire type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DirectValue {
    Byte(u8),
    Word(i16),
    DWord(i32),
    LWord(i64),
    Float(f32),
    DFloat(f64),
    ModbusReg(u16),
}

impl DirectValue {
    pub fn var_type(&self) -> DirectVarType {
        match self {
            DirectValue::Byte(_) => DirectVarType::Byte,
            DirectValue::Word(_) => DirectVarType::Word,
            DirectValue::DWord(_) => DirectVarType::DWord,
            DirectValue::LWord(_) => DirectVarType::LWord,
            DirectValue::Float(_) => DirectVarType::Float,
            DirectValue::DFloat(_) => DirectVarType::DFloat,
            DirectValue::ModbusReg(_) => DirectVarType::ModbusReg,
        }
    }

    /// The zero value of a type, used for unwritten addresses.
    pub fn zero(var_type: DirectVarType) -> DirectValue {
        match var_type {
            DirectVarType::Byte => DirectValue::Byte(0),
            DirectVarType::Word => DirectValue::Word(0),
            DirectVarType::DWord => DirectValue::DWord(0),
            DirectVarType::LWord => DirectValue::LWord(0),
            DirectVarType::Float => DirectValue::Float(0.0),
            DirectVarType::DFloat => DirectValue::DFloat(0.0),
            DirectVarType::ModbusReg => DirectValue::ModbusReg(0),
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        match *self {
            DirectValue::Byte(v) => out.push(v),
            DirectValue::Word(v) => out.extend_from_slice(&v.to_le_bytes()),
            DirectValue::DWord(v) => out.extend_from_slice(&v.to_le_bytes()),
            DirectValue::LWord(v) => out.extend_from_slice(&v.to_le_bytes()),
            DirectValue::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
            DirectValue::DFloat(v) => out.extend_from_slice(&v.to_le_bytes()),
            DirectValue::ModbusReg(v) => out.extend_from_slice(&v.to_le_bytes()),
        }
    }

    pub fn decode(var_type: DirectVarType, buf: &[u8]) -> Result<DirectValue, DcpError> {
        let width = var_type.width();
        if buf.len() < width {
            return Err(DcpError::Decode(format!(
                "direct value of type {:?} needs {} bytes, got {}",
                var_type,
                width,
                buf.len()
            )));
        }
        let value = match var_type {
            DirectVarType::Byte => DirectValue::Byte(buf[0]),
            DirectVarType::Word => DirectValue::Word(i16::from_le_bytes([buf[0], buf[1]])),
            DirectVarType::DWord => {
                DirectValue::DWord(i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
            }
            DirectVarType::LWord => DirectValue::LWord(i64::from_le_bytes([
                buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
            ])),
            DirectVarType::Float => {
                DirectValue::Float(f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
            }
            DirectVarType::DFloat => DirectValue::DFloat(f64::from_le_bytes([
                buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
            ])),
            DirectVarType::ModbusReg => {
                DirectValue::ModbusReg(u16::from_le_bytes([buf[0], buf[1]]))
            }
        };
        Ok(value)
    }
}

/// Packs a run of values into payload bytes.
pub fn pack_values(values: &[DirectValue]) -> Vec<u8> {
    let mut out = Vec::new();
    for value in values {
        value.encode(&mut out);
    }
    out
}

/// Unpacks `count` consecutive values of one type from payload bytes.
pub fn unpack_values(
    var_type: DirectVarType,
    count: usize,
    buf: &[u8],
) -> Result<Vec<DirectValue>, DcpError> {
    let width = var_type.width();
    if buf.len() < width * count {
        return Err(DcpError::Decode(format!(
            "{} values of type {:?} need {} bytes, got {}",
            count,
            var_type,
            width * count,
            buf.len()
        )));
    }
    (0..count)
        .map(|i| DirectValue::decode(var_type, &buf[i * width..]))
        .collect()
}

/// Validates a requested address run.
///
/// Order is part of the contract: the batch count is checked before the
/// address range, so an oversized batch reports refnum-limit regardless of
/// address.
pub fn validate_range(addr: i32, count: i32) -> Result<(), DcpErrorCode> {
    if count < 1 || count > REFNUM_LIMIT {
        return Err(DcpErrorCode::DirectVariableRefnumLimit);
    }
    if addr < 0 || addr.saturating_add(count) > ADDRESS_LIMIT {
        return Err(DcpErrorCode::DirectVariableInvalidAddress);
    }
    Ok(())
}
