//! Message walker over a GRIB2 payload.

use bytes::Bytes;

use crate::error::{GribError, GribResult};
use crate::sections::{
    parse_data_representation, parse_grid_definition, parse_identification, parse_indicator,
    parse_product_definition, DataRepresentation, GridDefinition, Identification, Indicator,
    ProductDefinition,
};
use crate::unpack::unpack_simple;

/// One decoded GRIB2 message (one field).
#[derive(Debug, Clone)]
pub struct GribMessage {
    pub indicator: Indicator,
    pub identification: Identification,
    pub grid: GridDefinition,
    pub product: ProductDefinition,
    pub representation: DataRepresentation,
    bitmap: Option<Bytes>,
    data: Bytes,
}

impl GribMessage {
    /// Unpack the field values, row-major in grid storage order.
    ///
    /// Bitmap-masked points come back as NaN. Fails if the unpacked count
    /// does not match the grid size.
    pub fn values(&self) -> GribResult<Vec<f32>> {
        let values = unpack_simple(
            &self.data,
            self.representation.num_points,
            self.representation.bits_per_value,
            self.representation.reference_value,
            self.representation.binary_scale_factor,
            self.representation.decimal_scale_factor,
            self.bitmap.as_deref(),
        )?;

        if values.len() != self.grid.num_points() {
            return Err(GribError::Unpack(format!(
                "unpacked {} values for a {}x{} grid",
                values.len(),
                self.grid.nj,
                self.grid.ni
            )));
        }

        Ok(values)
    }
}

/// Decode every message in a payload.
///
/// Order files concatenate one message per field; an empty payload or any
/// malformed message is an error.
pub fn decode_all(data: &[u8]) -> GribResult<Vec<GribMessage>> {
    let mut messages = Vec::new();
    let mut offset = 0usize;

    while offset < data.len() {
        let indicator = parse_indicator(&data[offset..])?;
        let len = indicator.message_length as usize;

        if len < 20 || offset + len > data.len() {
            return Err(GribError::Truncated {
                expected: offset + len,
                actual: data.len(),
            });
        }

        messages.push(decode_message(&data[offset..offset + len], indicator)?);
        offset += len;
    }

    if messages.is_empty() {
        return Err(GribError::BadMagic);
    }

    Ok(messages)
}

/// Decode the sections of a single message.
fn decode_message(message: &[u8], indicator: Indicator) -> GribResult<GribMessage> {
    let mut identification = None;
    let mut grid = None;
    let mut product = None;
    let mut representation = None;
    let mut bitmap = None;
    let mut data = None;

    let mut offset = 16; // after section 0
    loop {
        if offset + 4 > message.len() {
            return Err(GribError::section(0, "message ended without end section"));
        }
        if &message[offset..offset + 4] == b"7777" {
            break;
        }
        if offset + 5 > message.len() {
            return Err(GribError::section(0, "truncated section header"));
        }

        let length = u32::from_be_bytes([
            message[offset],
            message[offset + 1],
            message[offset + 2],
            message[offset + 3],
        ]) as usize;
        let number = message[offset + 4];

        if length < 5 || offset + length > message.len() {
            return Err(GribError::section(number, "invalid section length"));
        }

        let body = &message[offset + 5..offset + length];
        match number {
            1 => identification = Some(parse_identification(body)?),
            2 => {} // local use, ignored
            3 => grid = Some(parse_grid_definition(body)?),
            4 => product = Some(parse_product_definition(body, indicator.discipline)?),
            5 => representation = Some(parse_data_representation(body)?),
            6 => {
                // Indicator 255 means "no bitmap"; 0 means one follows.
                if body.first().copied() == Some(0) {
                    bitmap = Some(Bytes::copy_from_slice(&body[1..]));
                }
            }
            7 => data = Some(Bytes::copy_from_slice(body)),
            n => return Err(GribError::section(n, "unknown section number")),
        }

        offset += length;
    }

    Ok(GribMessage {
        indicator,
        identification: identification.ok_or_else(|| GribError::section(1, "missing"))?,
        grid: grid.ok_or_else(|| GribError::section(3, "missing"))?,
        product: product.ok_or_else(|| GribError::section(4, "missing"))?,
        representation: representation.ok_or_else(|| GribError::section(5, "missing"))?,
        bitmap,
        data: data.ok_or_else(|| GribError::section(7, "missing"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_rejected() {
        let err = decode_all(b"not a grib file.").unwrap_err();
        assert!(matches!(err, GribError::BadMagic));
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert!(decode_all(&[]).is_err());
    }
}
