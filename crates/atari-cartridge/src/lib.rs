//! Atari 2600 and 7800 cartridges.
//!
//! Supported schemes:
//! - 2600: 2K, 4K, F8, F6, F4 (each with or without Superchip RAM), E0, 3F, FA
//! - 7800: flat 8K/16K/32K/48K, SuperGame, SuperGame with RAM at $4000
//!
//! All of them are tables ([`Scheme`]) read by one device, [`Cartridge`].

mod cartridge;
mod detect;
mod error;
pub mod scheme;

pub use cartridge::Cartridge;
pub use detect::{A78_HEADER_LEN, A78Header, detect, scheme_for_size, strip_a78_header};
pub use error::CartridgeError;
pub use scheme::{MachineFamily, Scheme, SchemeId};
