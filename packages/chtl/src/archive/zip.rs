//! Hand-rolled store-mode ZIP reader/writer: local file headers, a central
//! directory, and an end-of-central-directory record. No compression is
//! ever applied — `pack`'s only job is bundling a module tree with
//! per-entry integrity, not shrinking it.

use super::ArchiveError;

const LOCAL_FILE_SIG: u32 = 0x0403_4b50;
const CENTRAL_DIR_SIG: u32 = 0x0201_4b50;
const EOCD_SIG: u32 = 0x0605_4b50;
const VERSION_NEEDED: u16 = 20;
const DOS_DATE_1980_01_01: u16 = 0x0021;

pub struct ZipEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub crc32: u32,
}

pub fn write_store_archive(buf: &mut Vec<u8>, entries: &[(String, Vec<u8>)]) -> Result<(), ArchiveError> {
    let mut local_offsets = Vec::with_capacity(entries.len());
    let mut crcs = Vec::with_capacity(entries.len());

    for (name, data) in entries {
        local_offsets.push(buf.len() as u32);
        let crc = crc32fast::hash(data);
        crcs.push(crc);
        let name_bytes = name.as_bytes();

        buf.extend_from_slice(&LOCAL_FILE_SIG.to_le_bytes());
        buf.extend_from_slice(&VERSION_NEEDED.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // flags
        buf.extend_from_slice(&0u16.to_le_bytes()); // method: store
        buf.extend_from_slice(&0u16.to_le_bytes()); // mod time
        buf.extend_from_slice(&DOS_DATE_1980_01_01.to_le_bytes());
        buf.extend_from_slice(&crc.to_le_bytes());
        buf.extend_from_slice(&(data.len() as u32).to_le_bytes()); // compressed size
        buf.extend_from_slice(&(data.len() as u32).to_le_bytes()); // uncompressed size
        buf.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // extra length
        buf.extend_from_slice(name_bytes);
        buf.extend_from_slice(data);
    }

    let central_dir_start = buf.len() as u32;
    for ((name, data), (offset, crc)) in entries.iter().zip(local_offsets.iter().zip(crcs.iter())) {
        let name_bytes = name.as_bytes();
        buf.extend_from_slice(&CENTRAL_DIR_SIG.to_le_bytes());
        buf.extend_from_slice(&VERSION_NEEDED.to_le_bytes()); // version made by
        buf.extend_from_slice(&VERSION_NEEDED.to_le_bytes()); // version needed
        buf.extend_from_slice(&0u16.to_le_bytes()); // flags
        buf.extend_from_slice(&0u16.to_le_bytes()); // method
        buf.extend_from_slice(&0u16.to_le_bytes()); // mod time
        buf.extend_from_slice(&DOS_DATE_1980_01_01.to_le_bytes());
        buf.extend_from_slice(&crc.to_le_bytes());
        buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // extra length
        buf.extend_from_slice(&0u16.to_le_bytes()); // comment length
        buf.extend_from_slice(&0u16.to_le_bytes()); // disk number start
        buf.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        buf.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        buf.extend_from_slice(&offset.to_le_bytes());
        buf.extend_from_slice(name_bytes);
    }
    let central_dir_size = buf.len() as u32 - central_dir_start;

    buf.extend_from_slice(&EOCD_SIG.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes()); // disk number
    buf.extend_from_slice(&0u16.to_le_bytes()); // disk with central dir
    buf.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    buf.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    buf.extend_from_slice(&central_dir_size.to_le_bytes());
    buf.extend_from_slice(&central_dir_start.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes()); // comment length

    Ok(())
}

pub fn read_store_archive(bytes: &[u8]) -> Result<Vec<ZipEntry>, ArchiveError> {
    let eocd_offset = find_eocd(bytes)?;
    let total_entries = read_u16(bytes, eocd_offset + 10)? as usize;
    let central_dir_offset = read_u32(bytes, eocd_offset + 16)? as usize;

    let mut entries = Vec::with_capacity(total_entries);
    let mut cursor = central_dir_offset;
    for _ in 0..total_entries {
        if read_u32(bytes, cursor)? != CENTRAL_DIR_SIG {
            return Err(ArchiveError::Malformed("bad central directory signature"));
        }
        let crc = read_u32(bytes, cursor + 16)?;
        let compressed_size = read_u32(bytes, cursor + 20)? as usize;
        let name_len = read_u16(bytes, cursor + 28)? as usize;
        let extra_len = read_u16(bytes, cursor + 30)? as usize;
        let comment_len = read_u16(bytes, cursor + 32)? as usize;
        let local_offset = read_u32(bytes, cursor + 42)? as usize;

        let name_start = cursor + 46;
        let name = std::str::from_utf8(slice(bytes, name_start, name_len)?)
            .map_err(|_| ArchiveError::Malformed("entry name is not valid UTF-8"))?
            .to_string();

        let data = read_local_file_data(bytes, local_offset, compressed_size)?;
        entries.push(ZipEntry { name, data, crc32: crc });

        cursor = name_start + name_len + extra_len + comment_len;
    }
    Ok(entries)
}

fn read_local_file_data(bytes: &[u8], local_offset: usize, compressed_size: usize) -> Result<Vec<u8>, ArchiveError> {
    if read_u32(bytes, local_offset)? != LOCAL_FILE_SIG {
        return Err(ArchiveError::Malformed("bad local file header signature"));
    }
    let name_len = read_u16(bytes, local_offset + 26)? as usize;
    let extra_len = read_u16(bytes, local_offset + 28)? as usize;
    let data_start = local_offset + 30 + name_len + extra_len;
    Ok(slice(bytes, data_start, compressed_size)?.to_vec())
}

fn find_eocd(bytes: &[u8]) -> Result<usize, ArchiveError> {
    if bytes.len() < 22 {
        return Err(ArchiveError::Malformed("too small to be a zip archive"));
    }
    let sig = EOCD_SIG.to_le_bytes();
    let search_floor = bytes.len().saturating_sub(22 + 0xFFFF);
    for start in (search_floor..=bytes.len() - 22).rev() {
        if bytes[start..start + 4] == sig {
            return Ok(start);
        }
    }
    Err(ArchiveError::Malformed("end-of-central-directory record not found"))
}

fn slice(bytes: &[u8], start: usize, len: usize) -> Result<&[u8], ArchiveError> {
    bytes.get(start..start + len).ok_or(ArchiveError::Malformed("entry extends past end of archive"))
}

fn read_u16(bytes: &[u8], offset: usize) -> Result<u16, ArchiveError> {
    Ok(u16::from_le_bytes(slice(bytes, offset, 2)?.try_into().unwrap()))
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, ArchiveError> {
    Ok(u32::from_le_bytes(slice(bytes, offset, 4)?.try_into().unwrap()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_two_entries() {
        let entries = vec![("a.txt".to_string(), b"hello".to_vec()), ("dir/b.txt".to_string(), b"world!!".to_vec())];
        let mut buf = Vec::new();
        write_store_archive(&mut buf, &entries).unwrap();
        let read = read_store_archive(&buf).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].name, "a.txt");
        assert_eq!(read[0].data, b"hello");
        assert_eq!(read[0].crc32, crc32fast::hash(b"hello"));
        assert_eq!(read[1].name, "dir/b.txt");
        assert_eq!(read[1].data, b"world!!");
    }
}
