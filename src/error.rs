use std::{
    error,
    fmt::{self, Display, Formatter},
    io,
};

/// The error type of every fallible operation in this crate.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The input is not a well-formed GRIB2 stream.
    Format(FormatError),
    /// A declared length points past the end of the available bytes.
    TruncatedData {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// The input uses a template, packing or flag combination this crate
    /// cannot decode.
    UnsupportedEncoding(UnsupportedEncoding),
    /// A coordinate value lies outside the range covered by an axis.
    CoordinateOutOfRange {
        axis: String,
        value: f64,
        min: f64,
        max: f64,
    },
    /// An exact lookup found no axis value equal to the requested one.
    CoordinateNotFound { axis: String, value: f64 },
    Io(String),
    InvalidAxis(String),
    ShapeMismatch {
        variable: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    DimensionNotFound(String),
    DuplicateSelector(String),
    IndexOutOfBounds {
        axis: String,
        index: usize,
        len: usize,
    },
    VariableNotFound(String),
    DuplicateVariable(String),
    CoordinateConflict(String),
    Encode(EncodeError),
}

impl error::Error for Error {}

impl From<FormatError> for Error {
    fn from(e: FormatError) -> Self {
        Self::Format(e)
    }
}

impl From<UnsupportedEncoding> for Error {
    fn from(e: UnsupportedEncoding) -> Self {
        Self::UnsupportedEncoding(e)
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Format(e) => write!(f, "{e}"),
            Self::TruncatedData {
                offset,
                needed,
                available,
            } => write!(
                f,
                "truncated data at {offset}: {needed} bytes declared but only {available} available"
            ),
            Self::UnsupportedEncoding(e) => write!(f, "{e}"),
            Self::CoordinateOutOfRange {
                axis,
                value,
                min,
                max,
            } => write!(
                f,
                "coordinate {value} is out of range [{min}, {max}] of axis '{axis}'"
            ),
            Self::CoordinateNotFound { axis, value } => {
                write!(f, "coordinate {value} not found in axis '{axis}'")
            }
            Self::Io(s) => write!(f, "read error: {s}"),
            Self::InvalidAxis(s) => write!(f, "invalid axis: {s}"),
            Self::ShapeMismatch {
                variable,
                expected,
                actual,
            } => write!(
                f,
                "shape of variable '{variable}' is {actual:?} but its axes require {expected:?}"
            ),
            Self::DimensionNotFound(s) => write!(f, "no such dimension: {s}"),
            Self::DuplicateSelector(s) => write!(f, "dimension '{s}' selected more than once"),
            Self::IndexOutOfBounds { axis, index, len } => {
                write!(f, "index {index} is out of bounds for axis '{axis}' of length {len}")
            }
            Self::VariableNotFound(s) => write!(f, "no such variable: {s}"),
            Self::DuplicateVariable(s) => write!(f, "variable '{s}' defined more than once"),
            Self::CoordinateConflict(s) => write!(f, "conflicting values for coordinate '{s}'"),
            Self::Encode(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormatError {
    Empty,
    NotGrib(usize),
    EditionMismatch(u8),
    UnknownSection { offset: usize, num: u8 },
    InvalidSectionOrder { offset: usize, num: u8 },
    EndSectionMismatch(usize),
    MissingBitmap(usize),
    InvalidValue(String),
    InconsistentGrid,
    DuplicateField(String),
}

impl error::Error for FormatError {}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty GRIB2 data"),
            Self::NotGrib(i) => write!(f, "not GRIB data at {i}"),
            Self::EditionMismatch(i) => write!(f, "not GRIB edition 2: {i}"),
            Self::UnknownSection { offset, num } => {
                write!(f, "unknown section number {num} at {offset}")
            }
            Self::InvalidSectionOrder { offset, num } => {
                write!(f, "section {num} at {offset} is wrongly ordered")
            }
            Self::EndSectionMismatch(i) => write!(f, "content of end section at {i} is not valid"),
            Self::MissingBitmap(i) => {
                write!(f, "previously defined bitmap referenced at {i} does not exist")
            }
            Self::InvalidValue(s) => write!(f, "invalid value: {s}"),
            Self::InconsistentGrid => write!(f, "fields are defined on different grids"),
            Self::DuplicateField(s) => write!(f, "duplicate field: {s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnsupportedEncoding {
    GridTemplate(u16),
    ProductTemplate(u16),
    PackingTemplate(u16),
    BitmapIndicator(u8),
    ScanningMode(u8),
    OriginalFieldValueType(u8),
    TimeUnit(u8),
    BitWidth(u8),
    Png(String),
}

impl error::Error for UnsupportedEncoding {}

impl Display for UnsupportedEncoding {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::GridTemplate(n) => write!(f, "grid definition template 3.{n} is not supported"),
            Self::ProductTemplate(n) => {
                write!(f, "product definition template 4.{n} is not supported")
            }
            Self::PackingTemplate(n) => {
                write!(f, "data representation template 5.{n} is not supported")
            }
            Self::BitmapIndicator(n) => write!(f, "bitmap indicator {n} is not supported"),
            Self::ScanningMode(n) => write!(f, "scanning mode {n:#010b} is not supported"),
            Self::OriginalFieldValueType(n) => {
                write!(f, "original field value type {n} is not supported")
            }
            Self::TimeUnit(n) => write!(f, "time unit {n} is not supported"),
            Self::BitWidth(n) => write!(f, "bit width {n} is not supported"),
            Self::Png(s) => write!(f, "PNG code stream could not be decoded: {s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EncodeError {
    UnknownParameter(String),
    UnsupportedDimensions(String),
    IrregularAxis(String),
    MissingReferenceTime,
    InvalidPacking(String),
}

impl error::Error for EncodeError {}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::UnknownParameter(s) => write!(f, "parameter of variable '{s}' is unknown"),
            Self::UnsupportedDimensions(s) => {
                write!(f, "dimensions of variable '{s}' cannot be encoded")
            }
            Self::IrregularAxis(s) => write!(f, "axis '{s}' is not evenly spaced"),
            Self::MissingReferenceTime => write!(f, "time axis is required"),
            Self::InvalidPacking(s) => write!(f, "invalid packing: {s}"),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
