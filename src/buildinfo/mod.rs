//! Build provenance embedded in Go executables.
//!
//! The Go linker stores a small header (magic `\xff Go buildinf:`) followed
//! by the toolchain version and the module listing of the main package.
//! [`read`] recovers both from ELF, Mach-O and PE files, falling back to a
//! raw scan for containers goblin does not map.

mod modinfo;
mod object;

use std::ops::Range;

use anyhow::{Context, Result, anyhow, bail};
use log::debug;

use object::Image;

const MAGIC: &[u8; 14] = b"\xff Go buildinf:";
const HEADER_LEN: usize = 32;
const ALIGN: usize = 16;
/// Strings follow the header inline, each prefixed by a uvarint length.
const FLAG_INLINE: u8 = 0x2;

/// A module as recorded at build time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    pub path: String,
    pub version: String,
    pub sum: String,
    pub replace: Option<Box<Module>>,
}

impl Module {
    pub fn new(path: impl Into<String>, version: impl Into<String>, sum: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
            sum: sum.into(),
            replace: None,
        }
    }
}

/// Everything recovered from one executable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildInfo {
    pub go_version: String,
    /// Import path of the main package.
    pub path: String,
    pub main: Module,
    pub deps: Vec<Module>,
    pub settings: Vec<(String, String)>,
}

/// Read build provenance from the bytes of an executable.
pub fn read(data: &[u8]) -> Result<BuildInfo> {
    let image = Image::parse(data);
    let (go_version, raw) = locate(&image)?;
    if go_version.is_empty() {
        bail!("Not a Go executable");
    }

    let text = String::from_utf8_lossy(modinfo::unframe(&raw));
    let mut info = modinfo::parse(&text).context("Failed to parse module info")?;
    info.go_version = go_version;
    Ok(info)
}

/// Find and decode the header, returning the Go version and raw module info.
fn locate(image: &Image<'_>) -> Result<(String, Vec<u8>)> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    if let Some(section) = image.section.clone() {
        ranges.push(section);
    }
    ranges.push(0..image.data.len());

    let mut last_error = None;
    for range in ranges {
        for offset in magic_offsets(image.data, range) {
            match decode_header(image, offset) {
                Ok(found) => return Ok(found),
                Err(e) => {
                    debug!("Skipping build info candidate at {:#x}: {:#}", offset, e);
                    last_error = Some(e);
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| anyhow!("No build info found"))
        .context("Not a Go executable"))
}

/// Offsets of the magic within `range` that sit on the header alignment.
fn magic_offsets(data: &[u8], range: Range<usize>) -> impl Iterator<Item = usize> + '_ {
    let start = range.start;
    let window = data.get(range).unwrap_or_default();
    window
        .windows(MAGIC.len())
        .enumerate()
        .filter(|(i, w)| i % ALIGN == 0 && *w == MAGIC)
        .map(move |(i, _)| start + i)
}

fn decode_header(image: &Image<'_>, offset: usize) -> Result<(String, Vec<u8>)> {
    let header = image
        .data
        .get(offset..offset + HEADER_LEN)
        .context("Truncated build info header")?;
    let ptr_size = usize::from(header[14]);
    let flags = header[15];

    if flags & FLAG_INLINE != 0 {
        let rest = &image.data[offset + HEADER_LEN..];
        let (version, rest) = decode_bytes(rest).context("Bad Go version")?;
        let (modinfo, _) = decode_bytes(rest).context("Bad module info")?;
        return Ok((String::from_utf8_lossy(version).into_owned(), modinfo.to_vec()));
    }

    if ptr_size != 4 && ptr_size != 8 {
        bail!("Unsupported pointer size {}", ptr_size);
    }
    if !image.has_address_map() {
        bail!("Pointer-format build info needs an address map");
    }
    let big_endian = flags != 0;
    let ptr = |bytes: &[u8]| read_ptr(bytes, ptr_size, big_endian);

    let version_addr = ptr(&header[16..16 + ptr_size]);
    let modinfo_addr = ptr(&header[16 + ptr_size..16 + 2 * ptr_size]);
    let version = read_string(image, ptr_size, big_endian, version_addr).context("Bad Go version")?;
    let modinfo = read_string(image, ptr_size, big_endian, modinfo_addr).context("Bad module info")?;
    Ok((String::from_utf8_lossy(&version).into_owned(), modinfo))
}

/// Follow a Go string header (data pointer, length) at `addr`.
fn read_string(image: &Image<'_>, ptr_size: usize, big_endian: bool, addr: u64) -> Result<Vec<u8>> {
    let header = image
        .read_at(addr, 2 * ptr_size as u64)
        .with_context(|| format!("Unmapped string header at {:#x}", addr))?;
    let data = read_ptr(&header[..ptr_size], ptr_size, big_endian);
    let len = read_ptr(&header[ptr_size..], ptr_size, big_endian);
    if len == 0 {
        return Ok(Vec::new());
    }
    image
        .read_at(data, len)
        .map(<[u8]>::to_vec)
        .with_context(|| format!("Unmapped string data at {:#x}", data))
}

fn read_ptr(bytes: &[u8], ptr_size: usize, big_endian: bool) -> u64 {
    let mut buf = [0u8; 8];
    if big_endian {
        buf[8 - ptr_size..].copy_from_slice(&bytes[..ptr_size]);
        u64::from_be_bytes(buf)
    } else {
        buf[..ptr_size].copy_from_slice(&bytes[..ptr_size]);
        u64::from_le_bytes(buf)
    }
}

/// Split a uvarint-length-prefixed byte string off the front of `buf`.
fn decode_bytes(buf: &[u8]) -> Result<(&[u8], &[u8])> {
    let mut len: u64 = 0;
    let mut shift = 0;
    let mut consumed = 0;
    loop {
        let byte = *buf.get(consumed).context("Truncated length prefix")?;
        consumed += 1;
        if shift >= 64 {
            bail!("Length prefix overflows");
        }
        len |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }
    let len = usize::try_from(len)?;
    let rest = &buf[consumed..];
    if rest.len() < len {
        bail!("String of {} bytes overruns the file", len);
    }
    Ok(rest.split_at(len))
}

/// Build a minimal artifact carrying inline build info.
#[cfg(test)]
pub(crate) fn encode(go_version: &str, text: &str) -> Vec<u8> {
    fn uvarint(out: &mut Vec<u8>, mut n: usize) {
        while n >= 0x80 {
            out.push((n as u8 & 0x7f) | 0x80);
            n >>= 7;
        }
        out.push(n as u8);
    }

    let mut out = vec![0x5au8; 64];
    out.extend_from_slice(MAGIC);
    out.push(8);
    out.push(FLAG_INLINE);
    out.extend_from_slice(&[0u8; 16]);
    uvarint(&mut out, go_version.len());
    out.extend_from_slice(go_version.as_bytes());
    let framed = if text.is_empty() {
        Vec::new()
    } else {
        modinfo::frame(text)
    };
    uvarint(&mut out, framed.len());
    out.extend_from_slice(&framed);
    out.extend_from_slice(&[0u8; 32]);
    out
}

/// Module text for a binary built from `path` at `version`.
#[cfg(test)]
pub(crate) fn module_text(path: &str, version: &str) -> String {
    format!("path\t{path}\nmod\t{path}\t{version}\th1:test=\n")
}
