use crate::{error::*, sections::SECT_HEADER_SIZE, utils::packed_len};

/// Spreads `values` over `num_points` grid points, placing NaN where the
/// bitmap has a zero bit.
pub(crate) fn apply<I>(offset: usize, bits: &[u8], values: I, num_points: usize) -> Result<Vec<f64>>
where
    I: Iterator<Item = f64>,
{
    let needed = packed_len(num_points, 1);
    if bits.len() < needed {
        return Err(Error::TruncatedData {
            offset,
            needed: needed + SECT_HEADER_SIZE + 1,
            available: bits.len() + SECT_HEADER_SIZE + 1,
        });
    }

    let iter = BitmapDecodeIterator::new(bits, values, num_points);
    let decoded = iter.collect::<Vec<_>>();
    if decoded.len() != num_points {
        return Err(FormatError::InvalidValue(
            "bitmap marks more points than the number of encoded values".to_owned(),
        )
        .into());
    }
    Ok(decoded)
}

pub(crate) struct BitmapDecodeIterator<'b, I> {
    bitmap: &'b [u8],
    values: I,
    pos: usize,
    len: usize,
}

impl<'b, I> BitmapDecodeIterator<'b, I> {
    pub(crate) fn new(bitmap: &'b [u8], values: I, len: usize) -> Self {
        Self {
            bitmap,
            values,
            pos: 0,
            len,
        }
    }
}

impl<I> Iterator for BitmapDecodeIterator<'_, I>
where
    I: Iterator<Item = f64>,
{
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.pos == self.len {
            return None;
        }
        let byte = self.bitmap[self.pos / 8];
        let offset = self.pos % 8;
        self.pos += 1;

        if has_zero_at_offset(byte, offset) {
            Some(f64::NAN)
        } else {
            self.values.next()
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.len - self.pos))
    }
}

const MASK: u8 = 0b10000000;

fn has_zero_at_offset(byte: u8, offset: usize) -> bool {
    let masked = byte & (MASK >> offset);
    masked == 0
}
