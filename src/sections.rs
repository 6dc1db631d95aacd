use chrono::{DateTime, LocalResult, TimeZone, Utc};

use crate::{
    codetables::TimeUnit,
    error::*,
    utils::{read_as, GribInt},
};

pub(crate) const SECT0_IS_MAGIC: &[u8] = b"GRIB";
pub(crate) const SECT0_IS_SIZE: usize = 16;
pub(crate) const SECT_HEADER_SIZE: usize = 5;
pub(crate) const SECT8_ES_MAGIC: &[u8] = b"7777";
pub(crate) const SECT8_ES_SIZE: usize = SECT8_ES_MAGIC.len();

/// A section of a message. `payload` excludes the 5-octet section header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Section<'a> {
    pub(crate) num: u8,
    pub(crate) offset: usize,
    pub(crate) payload: &'a [u8],
}

impl<'a> Section<'a> {
    /// Fails with `TruncatedData` if the payload is shorter than `size`.
    pub(crate) fn ensure_size(&self, size: usize) -> Result<&'a [u8]> {
        if self.payload.len() < size {
            Err(Error::TruncatedData {
                offset: self.offset,
                needed: size + SECT_HEADER_SIZE,
                available: self.payload.len() + SECT_HEADER_SIZE,
            })
        } else {
            Ok(self.payload)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    /// Discipline - GRIB Master Table Number (see Code Table 0.0)
    pub discipline: u8,
    /// GRIB edition number
    pub edition: u8,
    /// Total length of GRIB message in octets (including Section 0)
    pub total_length: u64,
}

impl Indicator {
    pub(crate) fn from_slice(slice: &[u8]) -> Self {
        Self {
            discipline: slice[6],
            edition: slice[7],
            total_length: read_as!(u64, slice, 8),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    /// Identification of originating/generating centre (see Common Code Table
    /// C-1)
    pub centre_id: u16,
    pub subcentre_id: u16,
    /// GRIB Master Tables Version Number (see Code Table 1.0)
    pub master_table_version: u8,
    pub local_table_version: u8,
    /// Significance of Reference Time (see Code Table 1.2)
    pub ref_time_significance: u8,
    pub ref_time: DateTime<Utc>,
    /// Production status of processed data (see Code Table 1.3)
    pub prod_status: u8,
    /// Type of processed data (see Code Table 1.4)
    pub data_type: u8,
}

impl Identification {
    pub(crate) const SIZE: usize = 16;

    pub(crate) fn from_section(sect: &Section) -> Result<Self> {
        let payload = sect.ensure_size(Self::SIZE)?;
        Ok(Self {
            centre_id: read_as!(u16, payload, 0),
            subcentre_id: read_as!(u16, payload, 2),
            master_table_version: payload[4],
            local_table_version: payload[5],
            ref_time_significance: payload[6],
            ref_time: create_date_time(
                read_as!(u16, payload, 7).into(),
                payload[9].into(),
                payload[10].into(),
                payload[11].into(),
                payload[12].into(),
                payload[13].into(),
            )?,
            prod_status: payload[14],
            data_type: payload[15],
        })
    }
}

#[inline]
fn create_date_time(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Result<DateTime<Utc>> {
    match Utc.with_ymd_and_hms(year, month, day, hour, minute, second) {
        LocalResult::Single(dt) => Ok(dt),
        _ => Err(FormatError::InvalidValue(format!(
            "invalid date time: {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
        ))
        .into()),
    }
}

/// Section 3. The template body is interpreted by [`crate::grid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GridDefinition<'a> {
    pub(crate) offset: usize,
    pub(crate) num_points: u32,
    pub(crate) template_num: u16,
    pub(crate) template: &'a [u8],
}

impl<'a> GridDefinition<'a> {
    pub(crate) fn from_section(sect: &Section<'a>) -> Result<Self> {
        let payload = sect.ensure_size(9)?;
        Ok(Self {
            offset: sect.offset,
            num_points: read_as!(u32, payload, 1),
            template_num: read_as!(u16, payload, 7),
            template: &payload[9..],
        })
    }
}

/// Section 4, Product Definition Templates 4.0 and 4.8. Both share the
/// layout of octets 10-34 read here.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProdDefinition {
    pub(crate) template_num: u16,
    pub(crate) parameter_category: u8,
    pub(crate) parameter_number: u8,
    pub(crate) time_unit: u8,
    pub(crate) forecast_time: i32,
    pub(crate) first_surface_type: u8,
    pub(crate) first_surface_value: Option<f64>,
}

impl ProdDefinition {
    pub(crate) fn from_section(sect: &Section) -> Result<Self> {
        let payload = sect.ensure_size(4)?;
        let template_num = read_as!(u16, payload, 2);
        if !matches!(template_num, 0 | 8) {
            return Err(UnsupportedEncoding::ProductTemplate(template_num).into());
        }
        let payload = sect.ensure_size(29)?;

        let scale_factor = payload[18];
        let scaled_value = read_as!(u32, payload, 19);
        let first_surface_value = if scale_factor == u8::MAX || scaled_value == u32::MAX {
            None
        } else {
            let scale: i8 = scale_factor.as_grib_int();
            let value: i32 = scaled_value.as_grib_int();
            Some(f64::from(value) / 10_f64.powi(scale.into()))
        };

        Ok(Self {
            template_num,
            parameter_category: payload[4],
            parameter_number: payload[5],
            time_unit: payload[12],
            forecast_time: read_as!(u32, payload, 13).as_grib_int(),
            first_surface_type: payload[17],
            first_surface_value,
        })
    }

    /// Forecast time in seconds.
    pub(crate) fn forecast_seconds(&self) -> Result<i64> {
        let unit = TimeUnit::try_from(self.time_unit)
            .ok()
            .and_then(|u| u.seconds())
            .ok_or(UnsupportedEncoding::TimeUnit(self.time_unit))?;
        Ok(i64::from(self.forecast_time) * unit)
    }
}

/// Section 5. The template body is interpreted by [`crate::decoders`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReprDefinition<'a> {
    pub(crate) offset: usize,
    pub(crate) num_points: u32,
    pub(crate) template_num: u16,
    pub(crate) template: &'a [u8],
}

impl<'a> ReprDefinition<'a> {
    pub(crate) fn from_section(sect: &Section<'a>) -> Result<Self> {
        let payload = sect.ensure_size(6)?;
        Ok(Self {
            offset: sect.offset,
            num_points: read_as!(u32, payload, 0),
            template_num: read_as!(u16, payload, 4),
            template: &payload[6..],
        })
    }
}

/// Section 6, after resolving indicator 254 against earlier bitmaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bitmap<'a> {
    Absent,
    Present { offset: usize, bits: &'a [u8] },
}

impl<'a> Bitmap<'a> {
    pub(crate) fn from_section(sect: &Section<'a>, previous: Option<Bitmap<'a>>) -> Result<Self> {
        let payload = sect.ensure_size(1)?;
        match payload[0] {
            0x00 => Ok(Self::Present {
                offset: sect.offset,
                bits: &payload[1..],
            }),
            0xfe => previous.ok_or_else(|| FormatError::MissingBitmap(sect.offset).into()),
            0xff => Ok(Self::Absent),
            n => Err(UnsupportedEncoding::BitmapIndicator(n).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(num: u8, payload: &[u8]) -> Section<'_> {
        Section {
            num,
            offset: 0,
            payload,
        }
    }

    #[test]
    fn identification_parsing() {
        let payload = [
            0x00, 0x62, 0x00, 0x00, 0x1c, 0x00, 0x01, 0x07, 0xe8, 0x01, 0x02, 0x12, 0x00, 0x00,
            0x00, 0x01,
        ];
        let actual = Identification::from_section(&section(1, &payload)).unwrap();
        assert_eq!(actual.centre_id, 98);
        assert_eq!(actual.master_table_version, 28);
        assert_eq!(
            actual.ref_time,
            Utc.with_ymd_and_hms(2024, 1, 2, 18, 0, 0).unwrap()
        );
        assert_eq!(actual.data_type, 1);
    }

    #[test]
    fn identification_with_invalid_date() {
        let payload = [
            0x00, 0x62, 0x00, 0x00, 0x1c, 0x00, 0x01, 0x07, 0xe8, 0x02, 0x1e, 0x00, 0x00, 0x00,
            0x00, 0x01,
        ];
        let actual = Identification::from_section(&section(1, &payload));
        assert!(matches!(
            actual,
            Err(Error::Format(FormatError::InvalidValue(_)))
        ));
    }

    #[test]
    fn short_identification_is_truncated() {
        let actual = Identification::from_section(&section(1, &[0; 10]));
        assert_eq!(
            actual,
            Err(Error::TruncatedData {
                offset: 0,
                needed: 21,
                available: 15
            })
        );
    }

    #[test]
    fn product_definition_parsing() {
        let mut payload = vec![0u8; 29];
        payload[2..4].copy_from_slice(&0u16.to_be_bytes());
        payload[4] = 0;
        payload[5] = 0;
        payload[12] = 1;
        payload[13..17].copy_from_slice(&6u32.to_be_bytes());
        payload[17] = 103;
        payload[18] = 0;
        payload[19..23].copy_from_slice(&2u32.to_be_bytes());
        let actual = ProdDefinition::from_section(&section(4, &payload)).unwrap();
        assert_eq!(actual.first_surface_type, 103);
        assert_eq!(actual.first_surface_value, Some(2.));
        assert_eq!(actual.forecast_seconds(), Ok(21_600));
    }

    #[test]
    fn product_definition_with_missing_level_and_unsupported_unit() {
        let mut payload = vec![0u8; 29];
        payload[12] = 3;
        payload[18] = 0xff;
        payload[19..23].copy_from_slice(&u32::MAX.to_be_bytes());
        let actual = ProdDefinition::from_section(&section(4, &payload)).unwrap();
        assert_eq!(actual.first_surface_value, None);
        assert_eq!(
            actual.forecast_seconds(),
            Err(Error::UnsupportedEncoding(UnsupportedEncoding::TimeUnit(3)))
        );
    }

    #[test]
    fn unsupported_product_template() {
        let mut payload = vec![0u8; 29];
        payload[2..4].copy_from_slice(&40u16.to_be_bytes());
        let actual = ProdDefinition::from_section(&section(4, &payload));
        assert_eq!(
            actual,
            Err(Error::UnsupportedEncoding(
                UnsupportedEncoding::ProductTemplate(40)
            ))
        );
    }

    #[test]
    fn bitmap_indicators() {
        let present = [0x00, 0b1010_0000];
        let bitmap = Bitmap::from_section(&section(6, &present), None).unwrap();
        assert!(matches!(bitmap, Bitmap::Present { bits, .. } if bits == [0b1010_0000]));

        let reuse = Bitmap::from_section(&section(6, &[0xfe]), Some(bitmap)).unwrap();
        assert_eq!(reuse, bitmap);

        assert_eq!(
            Bitmap::from_section(&section(6, &[0xfe]), None),
            Err(Error::Format(FormatError::MissingBitmap(0)))
        );
        assert_eq!(
            Bitmap::from_section(&section(6, &[0xff]), None),
            Ok(Bitmap::Absent)
        );
        assert_eq!(
            Bitmap::from_section(&section(6, &[0x01]), None),
            Err(Error::UnsupportedEncoding(
                UnsupportedEncoding::BitmapIndicator(1)
            ))
        );
    }
}
