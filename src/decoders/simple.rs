use crate::{
    decoders::{EncodedField, SimplePackingParam},
    error::*,
    sections::SECT_HEADER_SIZE,
    utils::{packed_len, NBitwiseIterator},
};

pub(crate) fn decode(encoded: &EncodedField) -> Result<Vec<f64>> {
    let param = SimplePackingParam::from_template(encoded.repr.template, encoded.repr.offset)?;
    let num_points = encoded.num_points_encoded();

    // Based on the implementation of wgrib2, if nbits equals 0, return a
    // constant field where the data value at each grid point is the reference
    // value.
    if param.nbit == 0 {
        return Ok(vec![f64::from(param.ref_val); num_points]);
    }

    let payload = encoded.data.payload;
    let needed = packed_len(num_points, usize::from(param.nbit));
    if payload.len() < needed {
        return Err(Error::TruncatedData {
            offset: encoded.data.offset,
            needed: needed + SECT_HEADER_SIZE,
            available: payload.len() + SECT_HEADER_SIZE,
        });
    }

    let iter = NBitwiseIterator::new(payload, usize::from(param.nbit));
    Ok(SimplePackingDecodeIterator::new(iter, &param)
        .take(num_points)
        .collect())
}

pub(crate) struct SimplePackingDecodeIterator<'p, I> {
    iter: I,
    param: &'p SimplePackingParam,
}

impl<'p, I> SimplePackingDecodeIterator<'p, I> {
    pub(crate) fn new(iter: I, param: &'p SimplePackingParam) -> Self {
        Self { iter, param }
    }
}

impl<I: Iterator<Item = u32>> Iterator for SimplePackingDecodeIterator<'_, I> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        self.iter.next().map(|encoded| self.param.unpack(encoded))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}
