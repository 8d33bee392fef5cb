// src/readers/loglinereader.rs

//! Implements a [`LogLineReader`], the buffered reader of decoded,
//! newline-terminated [`LogLine`]s from a log file.

use crate::common::{Count, FPath, File, FileOffset, Path, ResultS3};
use crate::readers::helpers::path_to_fpath;

use std::collections::VecDeque;
use std::fmt;
use std::io::{ErrorKind, Read, Result, Seek, SeekFrom};

extern crate encoding_rs;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};

extern crate memchr;

extern crate more_asserts;
use more_asserts::{debug_assert_ge, debug_assert_le};

extern crate si_trace_print;
#[allow(unused_imports)]
use si_trace_print::{defn, defo, defx, defñ};

/// Bytes read from the file at a time.
pub const BLOCKSZ: usize = 8192;

/// Byte order marks that select an encoding.
fn encoding_boms() -> [(&'static [u8], &'static Encoding); 2] {
    [
        (&b"\xFF\xFE"[..], UTF_16LE),
        (&b"\xFE\xFF"[..], UTF_16BE),
    ]
}

/// One decoded line of a log file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogLine {
    /// decoded text including the terminating `'\n'`
    pub text: String,
    /// size of the undecoded line in the file, in bytes
    pub sz: usize,
}

pub type ResultS3LogLine = ResultS3<LogLine, std::io::Error>;

/// A newline is one byte, or an aligned UTF-16 code unit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum NewlineForm {
    Byte,
    Utf16Le,
    Utf16Be,
}

/// Reads a log file line by line from any position.
///
/// Undecoded bytes of a partial last line are held back until the line is
/// complete, so a line still being written is never returned. Lines that
/// were read from the file but not yet taken with [`next_line`] are held in
/// a queue; [`push_back_line`] returns a taken line to the queue.
///
/// _XXX: not a rust "Reader"; does not implement trait [`Read`]._
///
/// [`next_line`]: LogLineReader::next_line
/// [`push_back_line`]: LogLineReader::push_back_line
pub struct LogLineReader {
    file: File,
    path: FPath,
    encoding: &'static Encoding,
    newline: NewlineForm,
    /// length of the byte order mark at the start of the file, if any
    bom_len: FileOffset,
    /// decoded lines not yet taken
    lines: VecDeque<LogLine>,
    /// undecoded bytes after the last complete line
    buffer: Vec<u8>,
    /// end of file was seen with nothing left to return
    reached_end: bool,
    count_bytes_read: Count,
    count_lines_returned: Count,
}

impl fmt::Debug for LogLineReader {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("LogLineReader")
            .field("path", &self.path)
            .field("encoding", &self.encoding.name())
            .field("bom_len", &self.bom_len)
            .field("lines", &self.lines.len())
            .field("buffer", &self.buffer.len())
            .field("reached_end", &self.reached_end)
            .finish()
    }
}

impl LogLineReader {
    /// Open `path` for reading lines.
    ///
    /// Without `encoding`, a UTF-16 byte order mark selects the encoding
    /// (and is skipped), else `fallback_encoding` is used.
    pub fn new(
        path: &Path,
        encoding: Option<&'static Encoding>,
        fallback_encoding: &'static Encoding,
    ) -> Result<LogLineReader> {
        defn!("({:?}, {:?})", path, encoding.map(|e| e.name()));
        let file = File::open(path)?;
        let mut reader = LogLineReader {
            file,
            path: path_to_fpath(path),
            encoding: fallback_encoding,
            newline: NewlineForm::Byte,
            bom_len: 0,
            lines: VecDeque::new(),
            buffer: Vec::with_capacity(BLOCKSZ),
            reached_end: false,
            count_bytes_read: 0,
            count_lines_returned: 0,
        };
        match encoding {
            Some(encoding) => reader.encoding = encoding,
            None => reader.detect_encoding()?,
        }
        reader.newline = if reader.encoding == UTF_16LE {
            NewlineForm::Utf16Le
        } else if reader.encoding == UTF_16BE {
            NewlineForm::Utf16Be
        } else {
            NewlineForm::Byte
        };
        defx!("{:?}", reader);

        Ok(reader)
    }

    /// Read the leading bytes, and use the encoding of a byte order mark
    /// found there.
    fn detect_encoding(&mut self) -> Result<()> {
        let boms = encoding_boms();
        let bom_len_max: usize = boms.iter().map(|(bom, _)| bom.len()).max().unwrap_or(0);
        while self.buffer.len() < bom_len_max {
            if self.read_block(bom_len_max - self.buffer.len())? == 0 {
                break;
            }
        }
        for (bom, encoding) in boms.into_iter() {
            if self.buffer.starts_with(bom) {
                self.buffer.drain(..bom.len());
                self.bom_len = bom.len() as FileOffset;
                self.encoding = encoding;
                ::log::debug!("Detected {} encoding by BOM", encoding.name());
                return Ok(());
            }
        }
        ::log::debug!("Using encoding {} for {:?}", self.encoding.name(), self.path);

        Ok(())
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn path(&self) -> &FPath {
        &self.path
    }

    pub fn count_bytes_read(&self) -> Count {
        self.count_bytes_read
    }

    pub fn count_lines_returned(&self) -> Count {
        self.count_lines_returned
    }

    /// Append up to `sz` bytes from the file to `self.buffer`.
    fn read_block(
        &mut self,
        sz: usize,
    ) -> Result<usize> {
        let len_old = self.buffer.len();
        self.buffer.resize(len_old + sz, 0);
        let result = loop {
            match self.file.read(&mut self.buffer[len_old..]) {
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                result => break result,
            }
        };
        let n = match result {
            Ok(n) => n,
            Err(err) => {
                self.buffer.truncate(len_old);
                return Err(err);
            }
        };
        self.buffer.truncate(len_old + n);
        self.count_bytes_read += n as Count;

        Ok(n)
    }

    /// Length of the first line in `data` including its newline, if `data`
    /// holds a complete line.
    fn find_line_end(
        &self,
        data: &[u8],
    ) -> Option<usize> {
        match self.newline {
            NewlineForm::Byte => memchr::memchr(b'\n', data).map(|i| i + 1),
            NewlineForm::Utf16Le => data
                .chunks_exact(2)
                .position(|unit| unit == [0x0A, 0x00])
                .map(|i| i * 2 + 2),
            NewlineForm::Utf16Be => data
                .chunks_exact(2)
                .position(|unit| unit == [0x00, 0x0A])
                .map(|i| i * 2 + 2),
        }
    }

    /// Read until the buffer holds a complete line or the file ends, then
    /// decode every complete line of the buffer into the queue.
    ///
    /// Undecodable bytes become U+FFFD.
    fn update_lines(&mut self) -> Result<()> {
        while self.find_line_end(&self.buffer).is_none() {
            if self.read_block(BLOCKSZ)? == 0 {
                break;
            }
        }
        let mut start: usize = 0;
        while let Some(len) = self.find_line_end(&self.buffer[start..]) {
            debug_assert_le!(start + len, self.buffer.len());
            let raw: &[u8] = &self.buffer[start..start + len];
            let (text, _had_errors) = self.encoding.decode_without_bom_handling(raw);
            self.lines.push_back(LogLine {
                text: text.into_owned(),
                sz: len,
            });
            start += len;
        }
        self.buffer.drain(..start);

        Ok(())
    }

    /// The next line, or [`ResultS3::Done`] at the end of the file.
    ///
    /// A last line without newline is not returned.
    pub fn next_line(&mut self) -> ResultS3LogLine {
        if self.reached_end && self.lines.is_empty() {
            return ResultS3::Done;
        }
        if self.lines.is_empty() {
            if let Err(err) = self.update_lines() {
                return ResultS3::Err(err);
            }
        }
        match self.lines.pop_front() {
            Some(line) => {
                self.count_lines_returned += 1;
                ResultS3::Found(line)
            }
            None => {
                self.reached_end = true;
                ResultS3::Done
            }
        }
    }

    /// Return `line`, previously returned by [`next_line`], to the front of
    /// the queue.
    ///
    /// [`next_line`]: LogLineReader::next_line
    pub fn push_back_line(
        &mut self,
        line: LogLine,
    ) {
        self.count_lines_returned = self.count_lines_returned.saturating_sub(1);
        self.lines.push_front(line);
    }

    /// Continue reading at byte `position`. `None` keeps the current
    /// position.
    ///
    /// A position within the byte order mark continues after it, so
    /// `set_position(Some(0))` on a file with a two byte mark is followed
    /// by a [`get_position`] of 2.
    ///
    /// [`get_position`]: LogLineReader::get_position
    pub fn set_position(
        &mut self,
        position: Option<FileOffset>,
    ) -> Result<()> {
        defñ!("({:?})", position);
        let position: FileOffset = match position {
            Some(position) => position.max(self.bom_len),
            None => return Ok(()),
        };
        self.buffer.clear();
        self.lines.clear();
        self.reached_end = false;
        self.file.seek(SeekFrom::Start(position))?;

        Ok(())
    }

    /// Position of the first byte not yet taken with [`next_line`], i.e.
    /// where to continue next time.
    ///
    /// [`next_line`]: LogLineReader::next_line
    pub fn get_position(&mut self) -> Result<FileOffset> {
        let pointer: FileOffset = self.file.stream_position()?;
        let unused: usize = self.lines.iter().map(|line| line.sz).sum::<usize>() + self.buffer.len();
        debug_assert_ge!(pointer, unused as FileOffset, "more bytes held than read");

        Ok(pointer - unused as FileOffset)
    }

    /// Drop everything buffered and continue at the end of the file.
    pub fn skip_remaining(&mut self) -> Result<()> {
        defñ!();
        self.buffer.clear();
        self.lines.clear();
        self.file.seek(SeekFrom::End(0))?;

        Ok(())
    }
}
