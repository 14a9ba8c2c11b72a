use num_traits::FromBytes;

use std::io::Read;

/// byte order of the binary payloads in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endian {
    Little,
    Big,
}

/// decode a packed byte slice into numbers of type `T`
///
/// trailing bytes that do not make up a full `T` are ignored
pub(crate) fn decode_values<T>(bytes: &[u8], endian: Endian) -> Vec<T>
where
    T: FromBytes,
    T::Bytes: Default,
{
    let width = std::mem::size_of::<T>();

    bytes
        .chunks_exact(width)
        .map(|chunk| {
            let mut arr: T::Bytes = Default::default();
            arr.as_mut().copy_from_slice(chunk);
            match endian {
                Endian::Little => T::from_le_bytes(&arr),
                Endian::Big => T::from_be_bytes(&arr),
            }
        })
        .collect()
}

/// upper bound of the buffer reserved up front for a payload. Larger payloads
/// grow with the data actually read, so a corrupt size cannot allocate more
/// than the file holds.
const PREALLOCATION_LIMIT: usize = 1 << 24;

/// product of the extents of a shape, `None` when it overflows
pub(crate) fn checked_product(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, dim| acc.checked_mul(*dim))
}

/// read exactly `len` bytes from a reader
pub(crate) fn read_bytes<R: Read>(reader: &mut R, len: usize) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(len.min(PREALLOCATION_LIMIT));
    reader.take(len as u64).read_to_end(&mut buffer)?;

    if buffer.len() != len {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("expected {len} bytes of payload, the file holds {}", buffer.len()),
        ));
    }
    Ok(buffer)
}

/// read exactly `count` values of type `T` from a reader
pub(crate) fn read_values<T, R>(reader: &mut R, count: usize, endian: Endian) -> std::io::Result<Vec<T>>
where
    R: Read,
    T: FromBytes,
    T::Bytes: Default,
{
    let len = count.checked_mul(std::mem::size_of::<T>()).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("a payload of {count} values does not fit in memory"),
        )
    })?;

    let buffer = read_bytes(reader, len)?;
    Ok(decode_values(&buffer, endian))
}

pub(crate) fn read_i32_le<R: Read>(reader: &mut R) -> std::io::Result<i32> {
    let mut arr = [0; 4];
    reader.read_exact(&mut arr)?;
    Ok(i32::from_le_bytes(arr))
}

/// interpret a fixed size field as a string, stopping at the first NUL byte
pub(crate) fn null_terminated(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
