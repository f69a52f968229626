//! Scheme detection from image size and the optional A78 header.

use crate::{CartridgeError, MachineFamily, SchemeId};

/// Length of an A78 container header.
pub const A78_HEADER_LEN: usize = 128;

const A78_MAGIC: &[u8] = b"ATARI7800";

/// Cartridge-type word bits in the A78 header.
const A78_SUPER_GAME: u16 = 0x0002;
const A78_RAM_AT_4000: u16 = 0x0004;

/// Parsed A78 header fields we care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A78Header {
    pub title: String,
    pub rom_size: u32,
    pub cart_type: u16,
}

impl A78Header {
    fn parse(header: &[u8]) -> Self {
        let title = header[17..49]
            .iter()
            .take_while(|&&byte| byte != 0)
            .map(|&byte| char::from(byte))
            .collect::<String>()
            .trim_end()
            .to_string();
        Self {
            title,
            rom_size: u32::from_be_bytes([header[49], header[50], header[51], header[52]]),
            cart_type: u16::from_be_bytes([header[53], header[54]]),
        }
    }

    /// Scheme named by the cartridge-type word, when it names one.
    #[must_use]
    pub fn scheme(&self) -> Option<SchemeId> {
        if self.cart_type & A78_SUPER_GAME == 0 {
            return None;
        }
        Some(if self.cart_type & A78_RAM_AT_4000 != 0 {
            SchemeId::SuperGameRam
        } else {
            SchemeId::SuperGame
        })
    }
}

/// Split off an A78 header if the image carries one.
#[must_use]
pub fn strip_a78_header(image: &[u8]) -> (Option<A78Header>, &[u8]) {
    if image.len() >= A78_HEADER_LEN && image[1..1 + A78_MAGIC.len()] == *A78_MAGIC {
        let (header, rom) = image.split_at(A78_HEADER_LEN);
        (Some(A78Header::parse(header)), rom)
    } else {
        (None, image)
    }
}

/// Pick a scheme from the size of a headerless image.
pub fn scheme_for_size(size: usize, family: MachineFamily) -> Result<SchemeId, CartridgeError> {
    let id = match (family, size) {
        (MachineFamily::Atari2600, 0x0800) => SchemeId::A2K,
        (MachineFamily::Atari2600, 0x1000) => SchemeId::A4K,
        (MachineFamily::Atari2600, 0x2000) => SchemeId::F8,
        (MachineFamily::Atari2600, 0x3000) => SchemeId::Fa,
        (MachineFamily::Atari2600, 0x4000) => SchemeId::F6,
        (MachineFamily::Atari2600, 0x8000) => SchemeId::F4,
        (MachineFamily::Atari7800, 0x2000) => SchemeId::A7808,
        (MachineFamily::Atari7800, 0x4000) => SchemeId::A7816,
        (MachineFamily::Atari7800, 0x8000) => SchemeId::A7832,
        (MachineFamily::Atari7800, 0xC000) => SchemeId::A7848,
        (MachineFamily::Atari7800, 0x20000) => SchemeId::SuperGame,
        _ => return Err(CartridgeError::UnrecognizedSize { size, family }),
    };
    Ok(id)
}

/// Strip any A78 header and choose a scheme for the remaining ROM.
///
/// The header's cartridge-type word wins over the size table on a 7800.
pub fn detect(image: &[u8], family: MachineFamily) -> Result<(SchemeId, &[u8]), CartridgeError> {
    let (header, rom) = strip_a78_header(image);
    let from_header = header
        .filter(|_| family == MachineFamily::Atari7800)
        .and_then(|header| header.scheme());
    let id = match from_header {
        Some(id) => id,
        None => scheme_for_size(rom.len(), family)?,
    };
    Ok((id, rom))
}
