//! Field value unpacking.
//!
//! Only simple packing (data representation template 5.0) is implemented:
//! `value = (R + packed * 2^E) * 10^-D`. Points masked out by the bitmap
//! decode to NaN.

use crate::error::{GribError, GribResult};

/// Unpack simple-packed field values.
pub fn unpack_simple(
    packed: &[u8],
    num_points: u32,
    bits_per_value: u8,
    reference_value: f32,
    binary_scale_factor: i16,
    decimal_scale_factor: i16,
    bitmap: Option<&[u8]>,
) -> GribResult<Vec<f32>> {
    let num_points = num_points as usize;

    if bits_per_value == 0 {
        // Constant field: every point is the reference value.
        return Ok(vec![reference_value; num_points]);
    }

    let binary_scale = 2.0_f32.powi(binary_scale_factor as i32);
    let decimal_scale = 10.0_f32.powi(-(decimal_scale_factor as i32));
    let bits = bits_per_value as usize;

    let mut values = Vec::with_capacity(num_points);
    let mut bit_position = 0usize;

    for i in 0..num_points {
        if let Some(bm) = bitmap {
            let byte = i / 8;
            let bit = 7 - (i % 8);
            let present = bm.get(byte).map_or(true, |b| (b >> bit) & 1 == 1);
            if !present {
                values.push(f32::NAN);
                continue;
            }
        }

        let packed_value = extract_bits(packed, bit_position, bits)?;
        bit_position += bits;

        values.push((reference_value + packed_value as f32 * binary_scale) * decimal_scale);
    }

    Ok(values)
}

/// Read `num_bits` MSB-first bits starting at `start_bit`.
fn extract_bits(data: &[u8], start_bit: usize, num_bits: usize) -> GribResult<u32> {
    if num_bits == 0 || num_bits > 32 {
        return Err(GribError::Unpack(format!(
            "invalid bits per value: {}",
            num_bits
        )));
    }

    let mut result = 0u32;
    for i in 0..num_bits {
        let absolute = start_bit + i;
        let byte = absolute / 8;
        let bit = 7 - (absolute % 8);

        let b = data
            .get(byte)
            .ok_or_else(|| GribError::Unpack("packed data ran out of bits".to_string()))?;
        result = (result << 1) | ((b >> bit) & 1) as u32;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bits_msb_first() {
        let data = [0b1011_0101];
        assert_eq!(extract_bits(&data, 0, 2).unwrap(), 0b10);
        assert_eq!(extract_bits(&data, 2, 2).unwrap(), 0b11);
        assert_eq!(extract_bits(&data, 0, 8).unwrap(), 0b1011_0101);
    }

    #[test]
    fn extract_bits_across_byte_boundary() {
        let data = [0b0000_0001, 0b1000_0000];
        assert_eq!(extract_bits(&data, 4, 8).unwrap(), 0b0001_1000);
    }

    #[test]
    fn simple_unpacking_identity_scales() {
        let packed = [100u8, 200u8];
        let values = unpack_simple(&packed, 2, 8, 0.0, 0, 0, None).unwrap();
        assert_eq!(values.len(), 2);
        assert!((values[0] - 100.0).abs() < 1e-3);
        assert!((values[1] - 200.0).abs() < 1e-3);
    }

    #[test]
    fn constant_field_uses_reference_value() {
        let values = unpack_simple(&[], 4, 0, 273.15, 0, 0, None).unwrap();
        assert_eq!(values, vec![273.15; 4]);
    }

    #[test]
    fn bitmap_masks_to_nan() {
        // Bitmap 0b1010_0000: points 0 and 2 present, 1 and 3 missing.
        let packed = [5u8, 7u8];
        let bitmap = [0b1010_0000u8];
        let values = unpack_simple(&packed, 4, 8, 0.0, 0, 0, Some(&bitmap)).unwrap();
        assert!((values[0] - 5.0).abs() < 1e-3);
        assert!(values[1].is_nan());
        assert!((values[2] - 7.0).abs() < 1e-3);
        assert!(values[3].is_nan());
    }
}
