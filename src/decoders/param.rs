use crate::{
    error::*,
    utils::{read_as, GribInt},
};

/// Parameters shared by Data Representation Templates 5.0 and 5.41
/// (octets 12-21 of Section 5).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SimplePackingParam {
    pub(crate) ref_val: f32,
    pub(crate) exp: i16,
    pub(crate) dig: i16,
    pub(crate) nbit: u8,
    pub(crate) value_type: u8,
}

impl SimplePackingParam {
    pub(crate) const SIZE: usize = 10;

    pub(crate) fn new(ref_val: f32, exp: i16, dig: i16, nbit: u8) -> Self {
        Self {
            ref_val,
            exp,
            dig,
            nbit,
            value_type: 0,
        }
    }

    pub(crate) fn from_template(buf: &[u8], offset: usize) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(Error::TruncatedData {
                offset,
                needed: Self::SIZE + 11,
                available: buf.len() + 11,
            });
        }
        let param = Self {
            ref_val: read_as!(f32, buf, 0),
            exp: read_as!(u16, buf, 4).as_grib_int(),
            dig: read_as!(u16, buf, 6).as_grib_int(),
            nbit: buf[8],
            value_type: buf[9],
        };
        if param.value_type > 1 {
            return Err(UnsupportedEncoding::OriginalFieldValueType(param.value_type).into());
        }
        if param.nbit > 32 {
            return Err(UnsupportedEncoding::BitWidth(param.nbit).into());
        }
        Ok(param)
    }

    /// `Y = (R + X * 2^E) * 10^-D`
    #[inline]
    pub(crate) fn unpack(&self, encoded: u32) -> f64 {
        let diff = f64::from(encoded) * 2_f64.powi(self.exp.into());
        (f64::from(self.ref_val) + diff) * 10_f64.powi(-i32::from(self.dig))
    }
}
