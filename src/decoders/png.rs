use crate::{
    decoders::{simple::SimplePackingDecodeIterator, EncodedField, SimplePackingParam},
    error::*,
    utils::{packed_len, NBitwiseIterator},
};

/// Data Representation Template 5.41: simple packing whose packed values are
/// stored as the pixels of a PNG image.
pub(crate) fn decode(encoded: &EncodedField) -> Result<Vec<f64>> {
    let param = SimplePackingParam::from_template(encoded.repr.template, encoded.repr.offset)?;
    let num_points = encoded.num_points_encoded();

    if param.nbit == 0 {
        return Ok(vec![f64::from(param.ref_val); num_points]);
    }

    let buf = read_image_buffer(encoded.data.payload)
        .map_err(|e| Error::from(UnsupportedEncoding::Png(e.to_string())))?;

    let needed = packed_len(num_points, usize::from(param.nbit));
    if buf.len() < needed {
        return Err(Error::TruncatedData {
            offset: encoded.data.offset,
            needed,
            available: buf.len(),
        });
    }

    let iter = NBitwiseIterator::new(&buf, usize::from(param.nbit));
    Ok(SimplePackingDecodeIterator::new(iter, &param)
        .take(num_points)
        .collect())
}

fn read_image_buffer(buf: &[u8]) -> Result<Vec<u8>, png::DecodingError> {
    let reader = std::io::Cursor::new(buf);
    let decoder = png::Decoder::new(reader);
    let mut reader = decoder.read_info()?;
    let mut out_buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut out_buf)?;
    out_buf.truncate(info.buffer_size());
    Ok(out_buf)
}
