/// Numeric record readers for the binary and ASCII encodings
use std::io::{self, BufRead};

use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::take,
    character::complete::{multispace0, multispace1},
    number::complete::{float, le_f32, le_u32},
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::LoadErrorCause;

/// Size of the free-form binary header
pub const HEADER_LEN: usize = 80;
/// Bytes per binary triangle record: normal, three vertices, attribute
pub const RECORD_LEN: usize = 50;
const ATTRIBUTE_LEN: usize = 2;

/// Little-endian cursor over a binary STL body.
///
/// Every read either advances or fails with [`LoadErrorCause::Truncated`];
/// running off the end is never silently papered over.
pub struct RecordReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn run<T>(
        &mut self,
        len: usize,
        parser: impl FnOnce(&'a [u8]) -> IResult<&'a [u8], T>,
    ) -> Result<T, LoadErrorCause> {
        let data = self.data;
        let input = &data[self.offset..];
        match parser(input) {
            Ok((_, value)) => {
                self.offset += len;
                Ok(value)
            }
            Err(_) => Err(LoadErrorCause::Truncated {
                offset: self.offset,
                needed: len - input.len().min(len),
            }),
        }
    }

    pub fn skip(&mut self, len: usize) -> Result<(), LoadErrorCause> {
        self.run(len, |i| take(len)(i)).map(|_| ())
    }

    /// Skip the 80-byte header and read the declared triangle count
    pub fn header(&mut self) -> Result<u32, LoadErrorCause> {
        self.skip(HEADER_LEN)?;
        self.run(4, le_u32)
    }

    fn vec3(&mut self) -> Result<[f32; 3], LoadErrorCause> {
        self.run(12, |i| tuple((le_f32, le_f32, le_f32))(i))
            .map(|(x, y, z)| [x, y, z])
    }

    /// Read one 50-byte triangle record
    pub fn triangle(&mut self) -> Result<(Vector3<f32>, [Point3<f32>; 3]), LoadErrorCause> {
        if self.remaining() < RECORD_LEN {
            return Err(LoadErrorCause::Truncated {
                offset: self.offset,
                needed: RECORD_LEN - self.remaining(),
            });
        }
        let normal = Vector3::from(self.vec3()?);
        let v1 = Point3::from(self.vec3()?);
        let v2 = Point3::from(self.vec3()?);
        let v3 = Point3::from(self.vec3()?);
        self.skip(ATTRIBUTE_LEN)?;
        Ok((normal, [v1, v2, v3]))
    }
}

/// Append one line to `line`, without its terminator.
///
/// A line ends at `\n`, `\r\n` or a lone `\r`, so CR-only files split the
/// same way as Unix and DOS ones. Returns the bytes consumed including the
/// terminator; 0 means end of input.
pub fn read_line<R: BufRead>(reader: &mut R, line: &mut Vec<u8>) -> io::Result<usize> {
    let mut consumed = 0;
    loop {
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            return Ok(consumed);
        }

        match memchr::memchr2(b'\n', b'\r', available) {
            Some(end) => {
                let carriage_return = available[end] == b'\r';
                line.extend_from_slice(&available[..end]);
                reader.consume(end + 1);
                consumed += end + 1;
                if carriage_return && reader.fill_buf()?.first() == Some(&b'\n') {
                    reader.consume(1);
                    consumed += 1;
                }
                return Ok(consumed);
            }
            None => {
                let len = available.len();
                line.extend_from_slice(available);
                reader.consume(len);
                consumed += len;
            }
        }
    }
}

/// Parse three whitespace-separated floats; anything after them is ignored
pub fn parse_vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    tuple((
        preceded(multispace0, float),
        preceded(multispace1, float),
        preceded(multispace1, float),
    ))(input)
}

/// Parse a float triple from a line tail, reporting the 1-based line number on failure
pub fn vector3_on_line(text: &str, line: usize) -> Result<[f32; 3], LoadErrorCause> {
    match parse_vector3(text) {
        Ok((rest, (x, y, z))) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
            Ok([x, y, z])
        }
        _ => Err(LoadErrorCause::Float {
            line,
            text: text.trim().to_string(),
        }),
    }
}
