//! Decoders for the data representation templates of Section 5.

mod bitmap;
mod ieee;
mod param;
#[cfg(feature = "png-unpack-with-png-crate")]
mod png;
mod simple;

use crate::{
    error::*,
    sections::{Bitmap, ReprDefinition, Section, SECT_HEADER_SIZE},
    utils::packed_len,
};

/// The encoded part of a field: Section 5 and the Section 7 payload it
/// describes.
pub(crate) struct EncodedField<'a> {
    pub(crate) repr: ReprDefinition<'a>,
    pub(crate) data: Section<'a>,
}

impl EncodedField<'_> {
    pub(crate) fn num_points_encoded(&self) -> usize {
        self.repr.num_points as usize
    }
}

/// Fails unless the packing of `repr` can be decoded.
pub(crate) fn check_support(repr: &ReprDefinition) -> Result<()> {
    match repr.template_num {
        0 | 4 => Ok(()),
        #[cfg(feature = "png-unpack-with-png-crate")]
        41 => Ok(()),
        n => Err(UnsupportedEncoding::PackingTemplate(n).into()),
    }
}

/// Checks the counts declared by a field against each other and against the
/// bytes present, before anything is allocated from them.
///
/// The number of encoded values must equal the number of grid points, or the
/// number of points present in the bitmap. Data compressed as PNG is only
/// checked once decompressed.
pub(crate) fn check_lengths(encoded: &EncodedField, bitmap: Bitmap, num_points: usize) -> Result<()> {
    let num_encoded = match bitmap {
        Bitmap::Absent => num_points,
        Bitmap::Present { offset, bits } => {
            let needed = packed_len(num_points, 1);
            if bits.len() < needed {
                return Err(Error::TruncatedData {
                    offset,
                    needed: needed + SECT_HEADER_SIZE + 1,
                    available: bits.len() + SECT_HEADER_SIZE + 1,
                });
            }
            count_set_bits(bits, num_points)
        }
    };

    let bits_per_value = match encoded.repr.template_num {
        0 => Some(usize::from(
            SimplePackingParam::from_template(encoded.repr.template, encoded.repr.offset)?.nbit,
        )),
        4 => Some(ieee::value_width(&encoded.repr)? * 8),
        _ => None,
    };
    if let Some(nbit) = bits_per_value {
        let needed = packed_len(num_encoded, nbit);
        let available = encoded.data.payload.len();
        if available < needed {
            return Err(Error::TruncatedData {
                offset: encoded.data.offset,
                needed: needed + SECT_HEADER_SIZE,
                available: available + SECT_HEADER_SIZE,
            });
        }
    }

    if encoded.num_points_encoded() != num_encoded {
        return Err(FormatError::InvalidValue(format!(
            "{} values encoded for {} grid points present",
            encoded.num_points_encoded(),
            num_encoded
        ))
        .into());
    }
    Ok(())
}

fn count_set_bits(bits: &[u8], len: usize) -> usize {
    let (full, rest) = (len / 8, len % 8);
    let mut count = bits[..full]
        .iter()
        .map(|b| b.count_ones() as usize)
        .sum::<usize>();
    if rest > 0 {
        count += (bits[full] >> (8 - rest)).count_ones() as usize;
    }
    count
}

/// Decodes a field into `num_points` values in scanning order. Points masked
/// by the bitmap are NaN.
pub(crate) fn dispatch(
    encoded: &EncodedField,
    bitmap: Bitmap,
    num_points: usize,
) -> Result<Vec<f64>> {
    check_support(&encoded.repr)?;
    let values = match encoded.repr.template_num {
        4 => ieee::decode(encoded)?,
        #[cfg(feature = "png-unpack-with-png-crate")]
        41 => png::decode(encoded)?,
        _ => simple::decode(encoded)?,
    };

    let values = match bitmap {
        Bitmap::Absent => values,
        Bitmap::Present { offset, bits } => {
            bitmap::apply(offset, bits, values.into_iter(), num_points)?
        }
    };

    if values.len() != num_points {
        return Err(FormatError::InvalidValue(format!(
            "{} values decoded for {} grid points",
            values.len(),
            num_points
        ))
        .into());
    }
    Ok(values)
}

pub(crate) use param::SimplePackingParam;
