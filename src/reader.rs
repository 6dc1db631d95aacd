use std::{fs, io::Read, path::Path};

use tracing::debug;

use crate::{
    assemble::assemble,
    config::DecodeOptions,
    dataset::Dataset,
    error::*,
    sections::{
        Identification, Indicator, Section, SECT0_IS_MAGIC, SECT0_IS_SIZE, SECT8_ES_MAGIC,
        SECT8_ES_SIZE, SECT_HEADER_SIZE,
    },
    utils::read_as,
};

/// Reads a GRIB2 file into a [`Dataset`].
///
/// # Examples
///
/// ```no_run
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let ds = grib_dataset::open("era5.grib2")?;
///     for name in ds.names() {
///         println!("{name}");
///     }
///     Ok(())
/// }
/// ```
pub fn open<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    open_with_options(path, &DecodeOptions::default())
}

pub fn open_with_options<P: AsRef<Path>>(path: P, options: &DecodeOptions) -> Result<Dataset> {
    let bytes = fs::read(path)?;
    from_bytes_with_options(&bytes, options)
}

/// Reads all bytes from `reader` and decodes them into a [`Dataset`].
///
/// # Examples
///
/// ```
/// let input: &[u8] = b"not a GRIB2 stream";
/// let result = grib_dataset::from_reader(input);
/// assert!(matches!(
///     result,
///     Err(grib_dataset::Error::Format(grib_dataset::FormatError::NotGrib(0)))
/// ));
/// ```
pub fn from_reader<R: Read>(reader: R) -> Result<Dataset> {
    from_reader_with_options(reader, &DecodeOptions::default())
}

pub fn from_reader_with_options<R: Read>(mut reader: R, options: &DecodeOptions) -> Result<Dataset> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    from_bytes_with_options(&bytes, options)
}

pub fn from_bytes(bytes: &[u8]) -> Result<Dataset> {
    from_bytes_with_options(bytes, &DecodeOptions::default())
}

pub fn from_bytes_with_options(bytes: &[u8], options: &DecodeOptions) -> Result<Dataset> {
    assemble(SubmessageIterator::new(bytes), options)
}

/// One field of a message together with the sections it shares with the
/// other fields of the message.
#[derive(Debug, Clone)]
pub(crate) struct Submessage<'a> {
    pub(crate) message_index: usize,
    pub(crate) submessage_index: usize,
    pub(crate) indicator: Indicator,
    pub(crate) identification: Identification,
    pub(crate) grid: Section<'a>,
    pub(crate) prod: Section<'a>,
    pub(crate) repr: Section<'a>,
    pub(crate) bitmap: Section<'a>,
    /// The latest Section 6 of the message that carried a bitmap itself,
    /// referred to by bitmap indicator 254.
    pub(crate) previous_bitmap: Option<Section<'a>>,
    pub(crate) data: Section<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    StartOfMessage,
    EndOfSect(u8),
    EndOfStream,
}

struct MessageContext<'a> {
    end: usize,
    indicator: Indicator,
    identification: Option<Identification>,
    grid: Option<Section<'a>>,
    prod: Option<Section<'a>>,
    repr: Option<Section<'a>>,
    bitmap: Option<Section<'a>>,
    previous_bitmap: Option<Section<'a>>,
}

/// Walks the messages in a byte slice and yields their submessages. The
/// first error ends the iteration.
pub(crate) struct SubmessageIterator<'a> {
    buf: &'a [u8],
    pos: usize,
    state: State,
    message_count: usize,
    submessage_count: usize,
    context: Option<MessageContext<'a>>,
}

impl<'a> SubmessageIterator<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            state: State::StartOfMessage,
            message_count: 0,
            submessage_count: 0,
            context: None,
        }
    }

    fn read_sect0(&mut self) -> Result<MessageContext<'a>> {
        let rest = &self.buf[self.pos..];
        let magic_size = SECT0_IS_MAGIC.len();
        if rest.len() < magic_size || &rest[..magic_size] != SECT0_IS_MAGIC {
            return Err(FormatError::NotGrib(self.pos).into());
        }
        if rest.len() < SECT0_IS_SIZE {
            return Err(Error::TruncatedData {
                offset: self.pos,
                needed: SECT0_IS_SIZE,
                available: rest.len(),
            });
        }

        let indicator = Indicator::from_slice(rest);
        if indicator.edition != 2 {
            return Err(FormatError::EditionMismatch(indicator.edition).into());
        }
        let total_length = usize::try_from(indicator.total_length).unwrap_or(usize::MAX);
        if total_length > rest.len() {
            return Err(Error::TruncatedData {
                offset: self.pos,
                needed: total_length,
                available: rest.len(),
            });
        }
        if total_length < SECT0_IS_SIZE + SECT8_ES_SIZE {
            return Err(FormatError::InvalidValue(format!(
                "message length {total_length} at {} is too small",
                self.pos
            ))
            .into());
        }

        debug!(
            message = self.message_count,
            offset = self.pos,
            length = total_length,
            discipline = indicator.discipline,
            "found message"
        );
        let end = self.pos + total_length;
        self.pos += SECT0_IS_SIZE;
        Ok(MessageContext {
            end,
            indicator,
            identification: None,
            grid: None,
            prod: None,
            repr: None,
            bitmap: None,
            previous_bitmap: None,
        })
    }

    /// Reads the section starting at the current position. Section 8 is
    /// returned with an empty payload.
    fn read_sect(&mut self, end: usize) -> Result<Section<'a>> {
        let offset = self.pos;
        let rest = &self.buf[offset..end];
        if rest.len() == SECT8_ES_SIZE {
            if rest != SECT8_ES_MAGIC {
                return Err(FormatError::EndSectionMismatch(offset).into());
            }
            self.pos = end;
            return Ok(Section {
                num: 8,
                offset,
                payload: &[],
            });
        }
        if rest.len() < SECT_HEADER_SIZE {
            return Err(FormatError::EndSectionMismatch(offset).into());
        }

        let size = read_as!(u32, rest, 0) as usize;
        let num = rest[4];
        if !(1..=7).contains(&num) {
            return Err(FormatError::UnknownSection { offset, num }.into());
        }
        if size < SECT_HEADER_SIZE || size > rest.len() {
            return Err(Error::TruncatedData {
                offset,
                needed: size.max(SECT_HEADER_SIZE),
                available: rest.len(),
            });
        }

        self.pos += size;
        Ok(Section {
            num,
            offset,
            payload: &rest[SECT_HEADER_SIZE..size],
        })
    }

    fn next_submessage(&mut self) -> Result<Option<Submessage<'a>>> {
        loop {
            if self.state == State::StartOfMessage {
                if self.pos == self.buf.len() {
                    if self.message_count == 0 {
                        return Err(FormatError::Empty.into());
                    }
                    self.state = State::EndOfStream;
                    return Ok(None);
                }
                self.context = Some(self.read_sect0()?);
                self.submessage_count = 0;
                self.state = State::EndOfSect(0);
                continue;
            }
            let State::EndOfSect(prev) = self.state else {
                return Ok(None);
            };

            let Some(mut context) = self.context.take() else {
                return Ok(None);
            };
            let sect = self.read_sect(context.end)?;
            if !follows(prev, sect.num, context.grid.is_some()) {
                return Err(FormatError::InvalidSectionOrder {
                    offset: sect.offset,
                    num: sect.num,
                }
                .into());
            }
            self.state = State::EndOfSect(sect.num);

            match sect.num {
                1 => context.identification = Some(Identification::from_section(&sect)?),
                2 => {}
                3 => context.grid = Some(sect),
                4 => context.prod = Some(sect),
                5 => context.repr = Some(sect),
                6 => context.bitmap = Some(sect),
                7 => {
                    let submessage = self.new_submessage(&mut context, sect)?;
                    self.context = Some(context);
                    return Ok(Some(submessage));
                }
                _ => {
                    self.message_count += 1;
                    self.state = State::StartOfMessage;
                    continue;
                }
            }
            self.context = Some(context);
        }
    }

    fn new_submessage(
        &mut self,
        context: &mut MessageContext<'a>,
        data: Section<'a>,
    ) -> Result<Submessage<'a>> {
        let missing = || FormatError::InvalidSectionOrder {
            offset: data.offset,
            num: data.num,
        };
        let bitmap = context.bitmap.ok_or_else(missing)?;
        let submessage = Submessage {
            message_index: self.message_count,
            submessage_index: self.submessage_count,
            indicator: context.indicator.clone(),
            identification: context.identification.clone().ok_or_else(missing)?,
            grid: context.grid.ok_or_else(missing)?,
            prod: context.prod.ok_or_else(missing)?,
            repr: context.repr.ok_or_else(missing)?,
            bitmap,
            previous_bitmap: context.previous_bitmap,
            data,
        };
        if bitmap.payload.first() == Some(&0x00) {
            context.previous_bitmap = Some(bitmap);
        }
        self.submessage_count += 1;
        Ok(submessage)
    }
}

/// Whether section `next` may follow section `prev` within a message.
fn follows(prev: u8, next: u8, has_grid: bool) -> bool {
    match (prev, next) {
        (0, 1) | (1, 2) | (1, 3) | (2, 3) | (3, 4) | (4, 5) | (5, 6) | (6, 7) => true,
        (7, 2) | (7, 3) | (7, 8) => true,
        (7, 4) => has_grid,
        _ => false,
    }
}

impl<'a> Iterator for SubmessageIterator<'a> {
    type Item = Result<Submessage<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == State::EndOfStream {
            return None;
        }
        match self.next_submessage() {
            Ok(Some(submessage)) => Some(Ok(submessage)),
            Ok(None) => None,
            Err(e) => {
                self.state = State::EndOfStream;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sect(num: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = ((payload.len() + SECT_HEADER_SIZE) as u32)
            .to_be_bytes()
            .to_vec();
        buf.push(num);
        buf.extend_from_slice(payload);
        buf
    }

    fn sect1() -> Vec<u8> {
        sect(
            1,
            &[
                0x00, 0x62, 0x00, 0x00, 0x1c, 0x00, 0x01, 0x07, 0xe8, 0x01, 0x02, 0x00, 0x00,
                0x00, 0x00, 0x01,
            ],
        )
    }

    fn message(nums: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        for num in nums {
            match num {
                1 => body.extend(sect1()),
                6 => body.extend(sect(6, &[0xff])),
                n => body.extend(sect(*n, &[])),
            }
        }
        let total = SECT0_IS_SIZE + body.len() + SECT8_ES_SIZE;
        let mut buf = b"GRIB\x00\x00\x00\x02".to_vec();
        buf.extend_from_slice(&(total as u64).to_be_bytes());
        buf.extend(body);
        buf.extend_from_slice(SECT8_ES_MAGIC);
        buf
    }

    fn digest(buf: &[u8]) -> Vec<Result<(usize, usize, usize), Error>> {
        SubmessageIterator::new(buf)
            .map(|r| r.map(|s| (s.message_index, s.submessage_index, s.prod.offset)))
            .collect()
    }

    #[test]
    fn submessage_stream_from_1_message() {
        let buf = message(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(digest(&buf), vec![Ok((0, 0, 47))]);
    }

    #[test]
    fn submessage_stream_from_multiple_messages() {
        let mut buf = message(&[1, 3, 4, 5, 6, 7]);
        buf.extend(message(&[1, 2, 3, 4, 5, 6, 7]));
        let actual = digest(&buf)
            .into_iter()
            .map(|r| r.map(|(m, s, _)| (m, s)))
            .collect::<Vec<_>>();
        assert_eq!(actual, vec![Ok((0, 0)), Ok((1, 0))]);
    }

    macro_rules! test_submessage_count {
        ($(($name:ident, $nums:expr, $expected:expr),)*) => ($(
            #[test]
            fn $name() {
                let buf = message(&$nums);
                let actual = SubmessageIterator::new(&buf)
                    .map(|r| r.map(|s| s.submessage_index))
                    .collect::<Result<Vec<_>>>();
                assert_eq!(actual, $expected);
            }
        )*);
    }

    test_submessage_count! {
        (
            submessages_repeated_from_sect2,
            [1, 2, 3, 4, 5, 6, 7, 2, 3, 4, 5, 6, 7],
            Ok(vec![0, 1])
        ),
        (
            submessages_repeated_from_sect3,
            [1, 3, 4, 5, 6, 7, 3, 4, 5, 6, 7],
            Ok(vec![0, 1])
        ),
        (
            submessages_repeated_from_sect4,
            [1, 3, 4, 5, 6, 7, 4, 5, 6, 7, 4, 5, 6, 7],
            Ok(vec![0, 1, 2])
        ),
        (
            submessage_stream_wrongly_ordered_after_sect1,
            [1, 4, 5, 6, 7],
            Err(Error::Format(FormatError::InvalidSectionOrder { offset: 37, num: 4 }))
        ),
        (
            submessage_stream_wrongly_ordered_after_sect5,
            [1, 3, 4, 5, 7],
            Err(Error::Format(FormatError::InvalidSectionOrder { offset: 52, num: 7 }))
        ),
        (
            submessage_stream_ending_with_sect4,
            [1, 3, 4],
            Err(Error::Format(FormatError::InvalidSectionOrder { offset: 47, num: 8 }))
        ),
    }

    #[test]
    fn empty_stream() {
        assert_eq!(digest(&[]), vec![Err(Error::Format(FormatError::Empty))]);
    }

    #[test]
    fn non_grib_stream() {
        assert_eq!(
            digest(b"GRIP0123456789abcdef"),
            vec![Err(Error::Format(FormatError::NotGrib(0)))]
        );
    }

    #[test]
    fn trailing_bytes_after_message() {
        let mut buf = message(&[1, 3, 4, 5, 6, 7]);
        let len = buf.len();
        buf.extend_from_slice(b"\0\0");
        let actual = digest(&buf);
        assert_eq!(actual.len(), 2);
        assert_eq!(actual[1], Err(Error::Format(FormatError::NotGrib(len))));
    }

    #[test]
    fn grib_edition_1() {
        let mut buf = message(&[1, 3, 4, 5, 6, 7]);
        buf[7] = 1;
        assert_eq!(
            digest(&buf),
            vec![Err(Error::Format(FormatError::EditionMismatch(1)))]
        );
    }

    #[test]
    fn broken_end_section() {
        let mut buf = message(&[1, 3, 4, 5, 6, 7]);
        let len = buf.len();
        buf[len - 1] = b'8';
        assert_eq!(
            digest(&buf),
            vec![Err(Error::Format(FormatError::EndSectionMismatch(len - 4)))]
        );
    }

    #[test]
    fn unknown_section_number() {
        let buf = message(&[1, 3, 9]);
        assert_eq!(
            digest(&buf),
            vec![Err(Error::Format(FormatError::UnknownSection {
                offset: 42,
                num: 9
            }))]
        );
    }

    #[test]
    fn message_cut_off() {
        let buf = message(&[1, 3, 4, 5, 6, 7]);
        let cut = &buf[..buf.len() - 10];
        assert_eq!(
            digest(cut),
            vec![Err(Error::TruncatedData {
                offset: 0,
                needed: buf.len(),
                available: cut.len()
            })]
        );
    }

    #[test]
    fn section_longer_than_message() {
        let mut buf = message(&[1, 3, 4, 5, 6, 7]);
        // length of Section 3
        buf[37..41].copy_from_slice(&1000_u32.to_be_bytes());
        assert_eq!(
            digest(&buf),
            vec![Err(Error::TruncatedData {
                offset: 37,
                needed: 1000,
                available: buf.len() - 37
            })]
        );
    }

    #[test]
    fn previous_bitmap_is_tracked() {
        let mut body = sect1();
        body.extend(sect(3, &[]));
        body.extend(sect(4, &[]));
        body.extend(sect(5, &[]));
        body.extend(sect(6, &[0x00, 0xff]));
        body.extend(sect(7, &[]));
        body.extend(sect(4, &[]));
        body.extend(sect(5, &[]));
        body.extend(sect(6, &[0xfe]));
        body.extend(sect(7, &[]));
        let total = SECT0_IS_SIZE + body.len() + SECT8_ES_SIZE;
        let mut buf = b"GRIB\x00\x00\x00\x02".to_vec();
        buf.extend_from_slice(&(total as u64).to_be_bytes());
        buf.extend(body);
        buf.extend_from_slice(SECT8_ES_MAGIC);

        let submessages = SubmessageIterator::new(&buf)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(submessages.len(), 2);
        assert_eq!(submessages[0].previous_bitmap, None);
        assert_eq!(
            submessages[1].previous_bitmap.map(|s| s.payload),
            Some(&[0x00, 0xff][..])
        );
    }
}
