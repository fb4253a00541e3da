//! Buffer filling helpers for chunked stream copies.

use std::io::{self, Read};

/// Fill `buf` from `reader`, stopping early only at end of stream.
///
/// Returns `(eof, filled)`. `eof` is true when the reader ran dry before the
/// buffer was full. Interrupted reads are retried.
pub fn fill_buf<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<(bool, usize)> {
    let mut filled = 0;

    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Ok((true, filled)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok((false, filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_big_buf_small_input() {
        let mut input = Cursor::new(vec![1, 2]);
        let mut buf = [0u8; 4];

        assert_eq!(fill_buf(&mut input, &mut buf).unwrap(), (true, 2));
        assert_eq!(&buf, &[1, 2, 0, 0]);
    }

    #[test]
    fn test_small_buf_big_input() {
        let mut input = Cursor::new(vec![1, 2, 3, 4]);
        let mut buf = [0u8; 2];

        assert_eq!(fill_buf(&mut input, &mut buf).unwrap(), (false, 2));
        assert_eq!(&buf, &[1, 2]);
        assert_eq!(fill_buf(&mut input, &mut buf).unwrap(), (false, 2));
        assert_eq!(&buf, &[3, 4]);
        assert_eq!(fill_buf(&mut input, &mut buf).unwrap(), (true, 0));
    }

    #[test]
    fn test_same_size() {
        let mut input = Cursor::new(vec![1, 2, 3, 4]);
        let mut buf = [0u8; 4];

        assert_eq!(fill_buf(&mut input, &mut buf).unwrap(), (false, 4));
        assert_eq!(&buf, &[1, 2, 3, 4]);
    }
}
