//! Object file layout: where to look for the build info header, and how to
//! turn virtual addresses into file offsets.

use std::ops::Range;

use goblin::Object;
use goblin::elf::program_header::PT_LOAD;
use goblin::mach::Mach;
use log::debug;

/// A loadable region mapping virtual addresses to file offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Segment {
    pub vaddr: u64,
    pub offset: u64,
    pub size: u64,
}

/// A parsed executable image.
pub(super) struct Image<'a> {
    pub data: &'a [u8],
    /// File range of the section that normally holds the header, if known.
    pub section: Option<Range<usize>>,
    segments: Vec<Segment>,
}

impl<'a> Image<'a> {
    /// Parse the container format with goblin. Unknown or unsupported
    /// containers (fat Mach-O, archives, plain data) still produce an image
    /// that is searched as a whole, without address mapping.
    pub fn parse(data: &'a [u8]) -> Self {
        match Object::parse(data) {
            Ok(Object::Elf(elf)) => {
                let section = elf
                    .section_headers
                    .iter()
                    .find(|sh| elf.shdr_strtab.get_at(sh.sh_name) == Some(".go.buildinfo"))
                    .map(|sh| clamp(data, sh.sh_offset, sh.sh_size));
                let segments = elf
                    .program_headers
                    .iter()
                    .filter(|ph| ph.p_type == PT_LOAD)
                    .map(|ph| Segment {
                        vaddr: ph.p_vaddr,
                        offset: ph.p_offset,
                        size: ph.p_filesz,
                    })
                    .collect();
                Self::from_parts(data, section, segments)
            }
            Ok(Object::Mach(Mach::Binary(macho))) => {
                let mut section = None;
                let mut segments = Vec::new();
                for segment in macho.segments.iter() {
                    segments.push(Segment {
                        vaddr: segment.vmaddr,
                        offset: segment.fileoff,
                        size: segment.filesize,
                    });
                    let Ok(sections) = segment.sections() else {
                        continue;
                    };
                    for (header, _) in sections {
                        if header.name().ok() == Some("__go_buildinfo") {
                            section = Some(clamp(data, u64::from(header.offset), header.size));
                        }
                    }
                }
                Self::from_parts(data, section, segments)
            }
            Ok(Object::PE(pe)) => {
                let image_base = pe.image_base as u64;
                let mut section = None;
                let mut segments = Vec::new();
                for header in &pe.sections {
                    let offset = u64::from(header.pointer_to_raw_data);
                    let size = u64::from(header.size_of_raw_data);
                    segments.push(Segment {
                        vaddr: image_base + u64::from(header.virtual_address),
                        offset,
                        size,
                    });
                    if header.name().ok() == Some(".data") {
                        section = Some(clamp(data, offset, size));
                    }
                }
                Self::from_parts(data, section, segments)
            }
            Ok(_) => Self::from_parts(data, None, Vec::new()),
            Err(e) => {
                debug!("Not a recognised object file ({}), scanning raw bytes", e);
                Self::from_parts(data, None, Vec::new())
            }
        }
    }

    pub fn from_parts(data: &'a [u8], section: Option<Range<usize>>, segments: Vec<Segment>) -> Self {
        Self {
            data,
            section,
            segments,
        }
    }

    /// Read `len` bytes at virtual address `addr`.
    pub fn read_at(&self, addr: u64, len: u64) -> Option<&'a [u8]> {
        let segment = self
            .segments
            .iter()
            .find(|s| addr >= s.vaddr && addr - s.vaddr < s.size)?;
        let within = addr - segment.vaddr;
        if len > segment.size - within {
            return None;
        }
        let start = usize::try_from(segment.offset.checked_add(within)?).ok()?;
        let end = start.checked_add(usize::try_from(len).ok()?)?;
        self.data.get(start..end)
    }

    pub fn has_address_map(&self) -> bool {
        !self.segments.is_empty()
    }
}

fn clamp(data: &[u8], offset: u64, size: u64) -> Range<usize> {
    let len = data.len() as u64;
    let start = offset.min(len);
    let end = offset.saturating_add(size).min(len);
    start as usize..end as usize
}
