//! GRIB2 section parsing.
//!
//! Each GRIB2 message is a sequence of length-prefixed sections. The parsers
//! here take the section *body* (the bytes after the 4-byte length and
//! 1-byte section number) so the walker in [`crate::reader`] owns all offset
//! arithmetic between sections.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{GribError, GribResult};
use crate::tables;

/// Section 0: indicator (16 bytes, not length-prefixed).
#[derive(Debug, Clone)]
pub struct Indicator {
    pub discipline: u8,
    pub edition: u8,
    /// Total message length in bytes, including this section.
    pub message_length: u64,
}

/// Section 1: identification.
#[derive(Debug, Clone)]
pub struct Identification {
    pub centre: u16,
    pub sub_centre: u16,
    /// Forecast-run initialisation time (the `time` coordinate downstream).
    pub reference_time: DateTime<Utc>,
}

/// Section 3: grid definition, template 3.0 (regular latitude/longitude).
#[derive(Debug, Clone)]
pub struct GridDefinition {
    /// Points along a parallel (columns).
    pub ni: usize,
    /// Points along a meridian (rows).
    pub nj: usize,
    /// First/last grid point, degrees.
    pub first_lat: f64,
    pub first_lon: f64,
    pub last_lat: f64,
    pub last_lon: f64,
    /// Increments, degrees (always positive; direction comes from scanning mode).
    pub lat_step: f64,
    pub lon_step: f64,
    pub scanning_mode: u8,
}

impl GridDefinition {
    /// Latitude of each row, in storage order.
    pub fn latitudes(&self) -> Vec<f64> {
        // Bit 0x40: +j scanning, rows run south to north.
        let step = if self.scanning_mode & 0x40 != 0 {
            self.lat_step
        } else {
            -self.lat_step
        };
        (0..self.nj)
            .map(|j| self.first_lat + step * j as f64)
            .collect()
    }

    /// Longitude of each column, in storage order.
    pub fn longitudes(&self) -> Vec<f64> {
        // Bit 0x80: -i scanning, columns run east to west.
        let step = if self.scanning_mode & 0x80 != 0 {
            -self.lon_step
        } else {
            self.lon_step
        };
        (0..self.ni)
            .map(|i| self.first_lon + step * i as f64)
            .collect()
    }

    /// Total number of grid points.
    pub fn num_points(&self) -> usize {
        self.ni * self.nj
    }
}

/// Section 4: product definition, template 4.0.
#[derive(Debug, Clone)]
pub struct ProductDefinition {
    pub parameter_category: u8,
    pub parameter_number: u8,
    /// eccodes-style short name derived from (discipline, category, number).
    pub short_name: String,
    pub level_type: u8,
    pub level_value: u32,
    /// Coordinate name the level surfaces map to (e.g. `heightAboveGround`).
    pub level_coordinate: &'static str,
    pub level_description: String,
    /// Lead time in hours from the reference time.
    pub forecast_hour: u32,
}

/// Section 5: data representation, template 5.0 (simple packing).
#[derive(Debug, Clone)]
pub struct DataRepresentation {
    pub num_points: u32,
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub bits_per_value: u8,
}

fn need(body: &[u8], len: usize, section: u8) -> GribResult<()> {
    if body.len() < len {
        return Err(GribError::section(
            section,
            format!("need {} bytes, have {}", len, body.len()),
        ));
    }
    Ok(())
}

fn be_u16(b: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([b[at], b[at + 1]])
}

fn be_u32(b: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

fn be_i32(b: &[u8], at: usize) -> i32 {
    i32::from_be_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

/// Parse section 0 from the start of a message.
pub fn parse_indicator(data: &[u8]) -> GribResult<Indicator> {
    if data.len() < 16 {
        return Err(GribError::Truncated {
            expected: 16,
            actual: data.len(),
        });
    }
    if &data[0..4] != b"GRIB" {
        return Err(GribError::BadMagic);
    }

    let discipline = data[6];
    let edition = data[7];
    if edition != 2 {
        return Err(GribError::UnsupportedEdition(edition));
    }

    let message_length = u64::from_be_bytes([
        data[8], data[9], data[10], data[11], data[12], data[13], data[14], data[15],
    ]);

    Ok(Indicator {
        discipline,
        edition,
        message_length,
    })
}

/// Parse section 1 body.
pub fn parse_identification(body: &[u8]) -> GribResult<Identification> {
    need(body, 14, 1)?;

    let centre = be_u16(body, 0);
    let sub_centre = be_u16(body, 2);

    let year = be_u16(body, 7);
    let (month, day, hour, minute, second) = (body[9], body[10], body[11], body[12], body[13]);

    let reference_time = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .and_then(|d| d.and_hms_opt(hour as u32, minute as u32, second as u32))
        .ok_or_else(|| {
            GribError::section(
                1,
                format!(
                    "invalid reference time {}-{:02}-{:02} {:02}:{:02}:{:02}",
                    year, month, day, hour, minute, second
                ),
            )
        })?;

    Ok(Identification {
        centre,
        sub_centre,
        reference_time: DateTime::<Utc>::from_naive_utc_and_offset(reference_time, Utc),
    })
}

/// Parse section 3 body (template 3.0 only).
pub fn parse_grid_definition(body: &[u8]) -> GribResult<GridDefinition> {
    need(body, 9, 3)?;

    let template = be_u16(body, 7);
    if template != 0 {
        return Err(GribError::UnsupportedTemplate {
            section: 3,
            template,
        });
    }

    // Template 3.0 layout, relative to the template start at body offset 9:
    //   16-19 Ni, 20-23 Nj, 32-35 La1, 36-39 Lo1, 41-44 La2, 45-48 Lo2,
    //   49-52 Di, 53-56 Dj, 57 scanning mode. Angles are microdegrees.
    let t = &body[9..];
    need(t, 58, 3)?;

    const MICRO: f64 = 1e-6;
    let ni = be_u32(t, 16) as usize;
    let nj = be_u32(t, 20) as usize;

    if ni == 0 || nj == 0 {
        return Err(GribError::section(3, "zero-sized grid"));
    }

    let scanning_mode = t[57];
    // Bit 0x20 would mean adjacent points run along meridians; the order
    // files are always row-major along parallels.
    if scanning_mode & 0x20 != 0 {
        return Err(GribError::section(3, "j-consecutive scanning unsupported"));
    }

    Ok(GridDefinition {
        ni,
        nj,
        first_lat: be_i32(t, 32) as f64 * MICRO,
        first_lon: be_i32(t, 36) as f64 * MICRO,
        last_lat: be_i32(t, 41) as f64 * MICRO,
        last_lon: be_i32(t, 45) as f64 * MICRO,
        lat_step: be_u32(t, 53) as f64 * MICRO,
        lon_step: be_u32(t, 49) as f64 * MICRO,
        scanning_mode,
    })
}

/// Parse section 4 body (template 4.0 only).
pub fn parse_product_definition(body: &[u8], discipline: u8) -> GribResult<ProductDefinition> {
    need(body, 23, 4)?;

    let template = be_u16(body, 2);
    if template != 0 {
        return Err(GribError::UnsupportedTemplate {
            section: 4,
            template,
        });
    }

    let parameter_category = body[4];
    let parameter_number = body[5];

    // Octet layout (body-relative): 12 time unit, 13-16 forecast time,
    // 17 first surface type, 18 scale factor, 19-22 scaled value.
    let time_unit = body[12];
    let forecast_time = be_u32(body, 13);
    let forecast_hour = match time_unit {
        0 => forecast_time / 60, // minutes
        1 => forecast_time,      // hours
        2 => forecast_time * 24, // days
        u => {
            return Err(GribError::section(
                4,
                format!("unsupported forecast time unit {}", u),
            ))
        }
    };

    let level_type = body[17];
    let scale_factor = body[18] as i8;
    let scaled_value = be_u32(body, 19);
    // Levels in these files use scale factor 0; anything else is scaled down.
    let level_value = if scale_factor > 0 {
        scaled_value / 10u32.pow(scale_factor as u32)
    } else {
        scaled_value
    };

    Ok(ProductDefinition {
        parameter_category,
        parameter_number,
        short_name: tables::parameter_short_name(discipline, parameter_category, parameter_number),
        level_type,
        level_value,
        level_coordinate: tables::level_coordinate(level_type),
        level_description: tables::level_description(level_type, level_value),
        forecast_hour,
    })
}

/// Parse section 5 body (template 5.0 only).
pub fn parse_data_representation(body: &[u8]) -> GribResult<DataRepresentation> {
    need(body, 16, 5)?;

    let num_points = be_u32(body, 0);
    let template = be_u16(body, 4);
    if template != 0 {
        return Err(GribError::UnsupportedTemplate {
            section: 5,
            template,
        });
    }

    Ok(DataRepresentation {
        num_points,
        reference_value: f32::from_be_bytes([body[6], body[7], body[8], body[9]]),
        binary_scale_factor: i16::from_be_bytes([body[10], body[11]]),
        decimal_scale_factor: i16::from_be_bytes([body[12], body[13]]),
        bits_per_value: body[14],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_rejects_bad_magic() {
        let data = [0u8; 16];
        assert!(matches!(parse_indicator(&data), Err(GribError::BadMagic)));
    }

    #[test]
    fn indicator_rejects_edition_1() {
        let mut data = [0u8; 16];
        data[0..4].copy_from_slice(b"GRIB");
        data[7] = 1;
        assert!(matches!(
            parse_indicator(&data),
            Err(GribError::UnsupportedEdition(1))
        ));
    }

    #[test]
    fn grid_coordinates_follow_scanning_mode() {
        let grid = GridDefinition {
            ni: 3,
            nj: 2,
            first_lat: 60.0,
            first_lon: -10.0,
            last_lat: 59.0,
            last_lon: -8.0,
            lat_step: 1.0,
            lon_step: 1.0,
            // +i, -j: west-to-east columns, north-to-south rows.
            scanning_mode: 0x00,
        };
        assert_eq!(grid.latitudes(), vec![60.0, 59.0]);
        assert_eq!(grid.longitudes(), vec![-10.0, -9.0, -8.0]);
    }
}
