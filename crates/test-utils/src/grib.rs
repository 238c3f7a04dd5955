//! Synthetic GRIB2 message builder.
//!
//! Creates minimal GRIB2 edition-2 messages (regular lat/lon grid, product
//! template 4.0, simple packing) for testing the decoder and the pipeline
//! without real order files. The generated files have valid structure but
//! minimal data.

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Build a minimal GRIB2 message with the specified parameters.
pub struct GribBuilder {
    discipline: u8,
    centre: u16,
    reference_time: DateTime<Utc>,
    // Grid definition
    ni: u32, // columns
    nj: u32, // rows
    la1: i32, // first lat (microdegrees)
    lo1: i32, // first lon (microdegrees)
    la2: i32, // last lat (microdegrees)
    lo2: i32, // last lon (microdegrees)
    di: u32,  // lon increment (microdegrees)
    dj: u32,  // lat increment (microdegrees)
    scanning_mode: u8,
    // Product definition
    param_category: u8,
    param_number: u8,
    level_type: u8,
    level_value: u32,
    forecast_hour: u32,
    // Data
    data_values: Vec<f32>,
}

impl GribBuilder {
    /// Builder with defaults for a small UK-area temperature field.
    pub fn new() -> Self {
        // 10x10 grid covering roughly the British Isles.
        let ni = 10;
        let nj = 10;
        Self {
            discipline: 0, // Meteorological
            centre: 74,    // UK Met Office
            reference_time: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            ni,
            nj,
            la1: 61_000_000, // 61.0N
            lo1: -11_000_000, // 11.0W
            la2: 52_000_000, // 52.0N
            lo2: -2_000_000, // 2.0W
            di: 1_000_000,   // 1.0 degree
            dj: 1_000_000,   // 1.0 degree
            scanning_mode: 0x00, // +i, -j: rows run north to south
            param_category: 0,
            param_number: 0, // temperature
            level_type: 103, // height above ground
            level_value: 2,
            forecast_hour: 0,
            data_values: vec![288.15; (ni * nj) as usize],
        }
    }

    pub fn with_reference_time(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = reference_time;
        self
    }

    pub fn with_grid(mut self, ni: u32, nj: u32) -> Self {
        self.ni = ni;
        self.nj = nj;
        self.data_values = vec![0.0; (ni * nj) as usize];
        self
    }

    pub fn with_extent(mut self, la1: f64, lo1: f64, la2: f64, lo2: f64) -> Self {
        self.la1 = (la1 * 1e6).round() as i32;
        self.lo1 = (lo1 * 1e6).round() as i32;
        self.la2 = (la2 * 1e6).round() as i32;
        self.lo2 = (lo2 * 1e6).round() as i32;
        self
    }

    pub fn with_increments(mut self, dlon: f64, dlat: f64) -> Self {
        self.di = (dlon * 1e6).round() as u32;
        self.dj = (dlat * 1e6).round() as u32;
        self
    }

    pub fn with_scanning_mode(mut self, scanning_mode: u8) -> Self {
        self.scanning_mode = scanning_mode;
        self
    }

    pub fn with_parameter(mut self, category: u8, number: u8) -> Self {
        self.param_category = category;
        self.param_number = number;
        self
    }

    pub fn with_level(mut self, level_type: u8, level_value: u32) -> Self {
        self.level_type = level_type;
        self.level_value = level_value;
        self
    }

    pub fn with_forecast_hour(mut self, hour: u32) -> Self {
        self.forecast_hour = hour;
        self
    }

    pub fn with_constant_value(mut self, value: f32) -> Self {
        self.data_values = vec![value; (self.ni * self.nj) as usize];
        self
    }

    pub fn with_gradient(mut self, min_val: f32, max_val: f32) -> Self {
        let n = (self.ni * self.nj) as usize;
        self.data_values = (0..n)
            .map(|i| min_val + (max_val - min_val) * (i as f32 / n as f32))
            .collect();
        self
    }

    pub fn with_data(mut self, data: Vec<f32>) -> Self {
        self.data_values = data;
        self
    }

    /// Build the complete GRIB2 message bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut message = Vec::new();

        let section1 = self.build_section1();
        let section3 = self.build_section3();
        let section4 = self.build_section4();
        let section5 = self.build_section5();
        let section6 = self.build_section6();
        let section7 = self.build_section7();

        let message_length = 16 // Section 0
            + section1.len()
            + section3.len()
            + section4.len()
            + section5.len()
            + section6.len()
            + section7.len()
            + 4; // Section 8 (end)

        // Section 0: Indicator
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0]); // Reserved
        message.push(self.discipline);
        message.push(2); // Edition 2
        message.extend_from_slice(&(message_length as u64).to_be_bytes());

        message.extend_from_slice(&section1);
        message.extend_from_slice(&section3);
        message.extend_from_slice(&section4);
        message.extend_from_slice(&section5);
        message.extend_from_slice(&section6);
        message.extend_from_slice(&section7);

        // Section 8: End
        message.extend_from_slice(b"7777");

        message
    }

    fn build_section1(&self) -> Vec<u8> {
        let mut section = Vec::new();
        let section_length: u32 = 21;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(1); // Section number

        section.extend_from_slice(&self.centre.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Sub-centre
        section.push(2); // Master table version
        section.push(1); // Local table version
        section.push(1); // Significance of reference time (start of forecast)

        let t = self.reference_time;
        section.extend_from_slice(&(t.year() as u16).to_be_bytes());
        section.push(t.month() as u8);
        section.push(t.day() as u8);
        section.push(t.hour() as u8);
        section.push(t.minute() as u8);
        section.push(t.second() as u8);

        section.push(0); // Production status (operational)
        section.push(1); // Type of data (forecast)

        section
    }

    fn build_section3(&self) -> Vec<u8> {
        let mut section = Vec::new();

        // Template 3.0: Latitude/Longitude
        let template_data_len = 58;
        let section_length: u32 = 14 + template_data_len;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(3); // Section number

        section.push(0); // Source of grid definition
        let num_data_points = self.ni * self.nj;
        section.extend_from_slice(&num_data_points.to_be_bytes());
        section.push(0); // Number of octets for optional list
        section.push(0); // Interpretation of optional list
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 3.0

        // Template 3.0 data (58 bytes)
        section.push(6); // Shape of Earth (spherical, radius 6371229m)
        section.push(0); // Scale factor of radius
        section.extend_from_slice(&0u32.to_be_bytes()); // Scaled value of radius
        section.push(0); // Scale factor of major axis
        section.extend_from_slice(&0u32.to_be_bytes()); // Scaled value of major axis
        section.push(0); // Scale factor of minor axis
        section.extend_from_slice(&0u32.to_be_bytes()); // Scaled value of minor axis

        section.extend_from_slice(&self.ni.to_be_bytes()); // Ni
        section.extend_from_slice(&self.nj.to_be_bytes()); // Nj
        section.extend_from_slice(&0u32.to_be_bytes()); // Basic angle
        section.extend_from_slice(&0xFFFFFFFFu32.to_be_bytes()); // Subdivisions

        section.extend_from_slice(&self.la1.to_be_bytes()); // La1
        section.extend_from_slice(&self.lo1.to_be_bytes()); // Lo1
        section.push(48); // Resolution and component flags
        section.extend_from_slice(&self.la2.to_be_bytes()); // La2
        section.extend_from_slice(&self.lo2.to_be_bytes()); // Lo2
        section.extend_from_slice(&self.di.to_be_bytes()); // Di
        section.extend_from_slice(&self.dj.to_be_bytes()); // Dj
        section.push(self.scanning_mode);

        section
    }

    fn build_section4(&self) -> Vec<u8> {
        let mut section = Vec::new();

        // Template 4.0: Analysis or forecast at horizontal level
        let section_length: u32 = 34;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(4); // Section number

        section.extend_from_slice(&0u16.to_be_bytes()); // Number of coordinate values
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 4.0

        section.push(self.param_category);
        section.push(self.param_number);
        section.push(2); // Type of generating process (forecast)
        section.push(0); // Background generating process
        section.push(0); // Analysis or forecast process
        section.extend_from_slice(&0u16.to_be_bytes()); // Hours of cutoff
        section.push(0); // Minutes of cutoff
        section.push(1); // Time range unit (hours)
        section.extend_from_slice(&self.forecast_hour.to_be_bytes());

        section.push(self.level_type); // Type of first fixed surface
        section.push(0); // Scale factor
        section.extend_from_slice(&self.level_value.to_be_bytes());

        section.push(255); // Type of second fixed surface (none)
        section.push(0); // Scale factor
        section.extend_from_slice(&0u32.to_be_bytes());

        section
    }

    fn build_section5(&self) -> Vec<u8> {
        let mut section = Vec::new();

        // Template 5.0: simple packing
        let num_data_points = self.ni * self.nj;

        let (min_val, max_val) = self
            .data_values
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &v| {
                (min.min(v), max.max(v))
            });

        let reference_value = min_val;
        let range = max_val - min_val;
        let bits_per_value: u8 = if range == 0.0 { 0 } else { 16 };

        // Packing: packed = (value - reference) / 2^E, so for 16 bits
        // E = ceil(log2(range / 65535)).
        let binary_scale_factor: i16 = if range == 0.0 {
            0
        } else {
            (range / 65535.0).log2().ceil() as i16
        };

        let section_length: u32 = 21;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(5); // Section number

        section.extend_from_slice(&num_data_points.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 5.0

        section.extend_from_slice(&reference_value.to_be_bytes());
        section.extend_from_slice(&binary_scale_factor.to_be_bytes());
        section.extend_from_slice(&0i16.to_be_bytes()); // Decimal scale factor
        section.push(bits_per_value);
        section.push(0); // Original field type (floating point)

        section
    }

    fn build_section6(&self) -> Vec<u8> {
        let mut section = Vec::new();
        let section_length: u32 = 6;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(6); // Section number
        section.push(255); // Bitmap indicator (255 = no bitmap)

        section
    }

    fn build_section7(&self) -> Vec<u8> {
        let mut section = Vec::new();

        let packed_data = self.pack_simple();

        let section_length: u32 = 5 + packed_data.len() as u32;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(7); // Section number
        section.extend_from_slice(&packed_data);

        section
    }

    fn pack_simple(&self) -> Vec<u8> {
        let (min_val, max_val) = self
            .data_values
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &v| {
                (min.min(v), max.max(v))
            });

        let range = max_val - min_val;

        if range == 0.0 {
            // Constant field, 0 bits per value, no data needed.
            return Vec::new();
        }

        // Must match build_section5.
        let binary_scale_factor = (range / 65535.0).log2().ceil() as i16;
        let binary_scale = 2.0_f32.powi(binary_scale_factor as i32);

        let mut packed = Vec::new();
        for &val in &self.data_values {
            let packed_value = ((val - min_val) / binary_scale).round() as u16;
            packed.extend_from_slice(&packed_value.to_be_bytes());
        }

        packed
    }
}

impl Default for GribBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Concatenate several built messages into one multi-message payload,
/// the shape real order files arrive in.
pub fn concat_messages(messages: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = Vec::new();
    for message in messages {
        payload.extend_from_slice(message);
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_default_message() {
        let data = GribBuilder::new().build();

        assert_eq!(&data[0..4], b"GRIB");
        assert_eq!(data[7], 2); // Edition
        assert_eq!(data[6], 0); // Meteorological discipline
        assert_eq!(&data[data.len() - 4..], b"7777");
    }

    #[test]
    fn message_length_matches_payload() {
        let data = GribBuilder::new().with_grid(5, 4).build();
        let declared = u64::from_be_bytes(data[8..16].try_into().unwrap());
        assert_eq!(declared as usize, data.len());
    }

    #[test]
    fn concat_places_messages_back_to_back() {
        let a = GribBuilder::new().with_grid(2, 2).build();
        let b = GribBuilder::new().with_grid(3, 3).build();
        let payload = concat_messages(&[a.clone(), b.clone()]);
        assert_eq!(payload.len(), a.len() + b.len());
        assert_eq!(&payload[a.len()..a.len() + 4], b"GRIB");
    }
}
