/// Options controlling how a GRIB2 stream is turned into a [`Dataset`].
///
/// [`Dataset`]: crate::Dataset
///
/// # Examples
///
/// ```
/// let options = grib_dataset::DecodeOptions::default()
///     .variables(["t2m", "msl"])
///     .skip_unsupported(true);
/// assert_eq!(options.variables.as_deref().map(|v| v.len()), Some(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Names of the variables to decode. `None` decodes every variable.
    pub variables: Option<Vec<String>>,
    /// Skips fields using unsupported templates instead of failing.
    pub skip_unsupported: bool,
}

impl DecodeOptions {
    pub fn variables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn skip_unsupported(mut self, skip: bool) -> Self {
        self.skip_unsupported = skip;
        self
    }

    pub(crate) fn wants(&self, name: &str) -> bool {
        self.variables
            .as_ref()
            .map_or(true, |names| names.iter().any(|n| n == name))
    }
}

/// Data representation used when writing fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Packing {
    /// Template 5.4 with 64-bit values. Lossless.
    #[default]
    Ieee64,
    /// Template 5.4 with 32-bit values.
    Ieee32,
    /// Template 5.0 with the given decimal scale factor and bit width.
    Simple { decimal_scale: i16, nbit: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    pub packing: Packing,
    /// Originating centre (Common Code Table C-1). 65535 is missing.
    pub centre: u16,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            packing: Packing::default(),
            centre: u16::MAX,
        }
    }
}

impl EncodeOptions {
    pub fn packing(mut self, packing: Packing) -> Self {
        self.packing = packing;
        self
    }

    pub fn centre(mut self, centre: u16) -> Self {
        self.centre = centre;
        self
    }
}
