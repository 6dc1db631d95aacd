pub(crate) trait GribInt<I> {
    fn as_grib_int(&self) -> I;
}

macro_rules! add_impl_for_ints {
    ($(($ty_src:ty, $ty_dst:ty),)*) => ($(
        impl GribInt<$ty_dst> for $ty_src {
            fn as_grib_int(&self) -> $ty_dst {
                if self.leading_zeros() == 0 {
                    let abs = (self << 1 >> 1) as $ty_dst;
                    -abs
                } else {
                    *self as $ty_dst
                }
            }
        }
    )*);
}

add_impl_for_ints! {
    (u8, i8),
    (u16, i16),
    (u32, i32),
}

/// Inverse of [`GribInt`]: encodes a signed integer in the sign-and-magnitude
/// form GRIB2 uses for signed octets.
pub(crate) trait GribUint<U> {
    fn as_grib_uint(&self) -> U;
}

macro_rules! add_impl_for_uints {
    ($(($ty_src:ty, $ty_dst:ty),)*) => ($(
        impl GribUint<$ty_dst> for $ty_src {
            fn as_grib_uint(&self) -> $ty_dst {
                let sign_bit = 1 << (<$ty_dst>::BITS - 1);
                if *self < 0 {
                    self.unsigned_abs() | sign_bit
                } else {
                    self.unsigned_abs()
                }
            }
        }
    )*);
}

add_impl_for_uints! {
    (i16, u16),
    (i32, u32),
}

macro_rules! read_as {
    ($ty:ty, $buf:ident, $start:expr) => {{
        let end = $start + std::mem::size_of::<$ty>();
        <$ty>::from_be_bytes($buf[$start..end].try_into().unwrap())
    }};
}
pub(crate) use read_as;

/// Reads unsigned integers of `size` bits packed without padding.
#[derive(Clone)]
pub(crate) struct NBitwiseIterator<'a> {
    slice: &'a [u8],
    size: usize,
    pos: usize,
    offset: usize,
}

impl<'a> NBitwiseIterator<'a> {
    pub(crate) fn new(slice: &'a [u8], size: usize) -> Self {
        Self {
            slice,
            size,
            pos: 0,
            offset: 0,
        }
    }
}

impl Iterator for NBitwiseIterator<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.size == 0 {
            return None;
        }
        let new_offset = self.offset + self.size;
        let (new_pos, new_offset) = (self.pos + new_offset / 8, new_offset % 8);

        if self.pos >= self.slice.len()
            || new_pos > self.slice.len()
            || (new_pos == self.slice.len() && new_offset > 0)
        {
            return None;
        }

        let val = self.slice[self.pos] << self.offset >> self.offset;
        let mut val: u32 = u32::from(val);
        if new_pos == self.pos {
            val >>= 8 - new_offset;
        } else {
            let mut pos = self.pos + 1;
            while pos < new_pos {
                val = (val << 8) | u32::from(self.slice[pos]);
                pos += 1;
            }
            if new_offset > 0 {
                let shift = 8 - new_offset;
                let last_val = u32::from(self.slice[pos]) >> shift;
                val = (val << new_offset) | last_val;
            }
        }

        self.pos = new_pos;
        self.offset = new_offset;
        Some(val)
    }
}

/// Number of octets needed to hold `count` values of `nbit` bits each.
pub(crate) fn packed_len(count: usize, nbit: usize) -> usize {
    (count * nbit).div_ceil(8)
}

/// Packs unsigned integers of `size` bits without padding, the counterpart of
/// [`NBitwiseIterator`].
pub(crate) struct NBitwiseWriter {
    buf: Vec<u8>,
    size: usize,
    acc: u64,
    filled: usize,
}

impl NBitwiseWriter {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            buf: Vec::new(),
            size,
            acc: 0,
            filled: 0,
        }
    }

    pub(crate) fn push(&mut self, value: u32) {
        let mask = if self.size == 32 {
            u64::from(u32::MAX)
        } else {
            (1u64 << self.size) - 1
        };
        self.acc = (self.acc << self.size) | (u64::from(value) & mask);
        self.filled += self.size;
        while self.filled >= 8 {
            self.filled -= 8;
            self.buf.push((self.acc >> self.filled) as u8);
        }
        self.acc &= (1u64 << self.filled) - 1;
    }

    pub(crate) fn finish(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.buf.push((self.acc << (8 - self.filled)) as u8);
        }
        self.buf
    }
}
