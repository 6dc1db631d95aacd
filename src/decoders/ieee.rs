use crate::{
    decoders::EncodedField,
    error::*,
    sections::{ReprDefinition, SECT_HEADER_SIZE},
    utils::read_as,
};

/// Data Representation Template 5.4: grid point data as IEEE floating point
/// numbers. Octet 12 gives the precision (1: 32-bit, 2: 64-bit).
pub(crate) fn decode(encoded: &EncodedField) -> Result<Vec<f64>> {
    let width = value_width(&encoded.repr)?;

    let num_points = encoded.num_points_encoded();
    let payload = encoded.data.payload;
    let needed = num_points * width;
    if payload.len() < needed {
        return Err(Error::TruncatedData {
            offset: encoded.data.offset,
            needed: needed + SECT_HEADER_SIZE,
            available: payload.len() + SECT_HEADER_SIZE,
        });
    }

    let payload = &payload[..needed];
    let values: Vec<f64> = if width == 4 {
        payload
            .chunks_exact(4)
            .map(|c| f64::from(read_as!(f32, c, 0)))
            .collect()
    } else {
        payload.chunks_exact(8).map(|c| read_as!(f64, c, 0)).collect()
    };
    Ok(values)
}

/// Size in bytes of each value.
pub(crate) fn value_width(repr: &ReprDefinition) -> Result<usize> {
    let precision = *repr.template.first().ok_or(Error::TruncatedData {
        offset: repr.offset,
        needed: 12,
        available: 11,
    })?;
    match precision {
        1 => Ok(4),
        2 => Ok(8),
        3 => Err(UnsupportedEncoding::BitWidth(128).into()),
        n => Err(FormatError::InvalidValue(format!(
            "precision {n} of IEEE floating point data"
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::Section;

    fn encoded<'a>(template: &'a [u8], data: &'a [u8], num_points: u32) -> EncodedField<'a> {
        EncodedField {
            repr: ReprDefinition {
                offset: 0,
                num_points,
                template_num: 4,
                template,
            },
            data: Section {
                num: 7,
                offset: 0,
                payload: data,
            },
        }
    }

    #[test]
    fn decode_ieee_32() {
        let data = [273.15_f32, -3.5]
            .iter()
            .flat_map(|v| v.to_be_bytes())
            .collect::<Vec<_>>();
        let actual = decode(&encoded(&[1], &data, 2)).unwrap();
        assert_eq!(actual, vec![f64::from(273.15_f32), -3.5]);
    }

    #[test]
    fn decode_ieee_64() {
        let data = [273.15_f64, -0.15]
            .iter()
            .flat_map(|v| v.to_be_bytes())
            .collect::<Vec<_>>();
        let actual = decode(&encoded(&[2], &data, 2)).unwrap();
        assert_eq!(actual, vec![273.15, -0.15]);
    }

    #[test]
    fn decode_ieee_128_is_unsupported() {
        let actual = decode(&encoded(&[3], &[0; 16], 1));
        assert_eq!(
            actual,
            Err(Error::UnsupportedEncoding(UnsupportedEncoding::BitWidth(128)))
        );
    }

    #[test]
    fn decode_ieee_with_short_data() {
        let actual = decode(&encoded(&[2], &[0; 12], 2));
        assert!(matches!(actual, Err(Error::TruncatedData { .. })));
    }
}
