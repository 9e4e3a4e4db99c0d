// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Known targets, keyed by the device-id word read from 0x3FFFFE.
//!
//! Lookup walks the table in order and the first entry whose masked id matches wins.

/// One entry of the identification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub id: u16,
    /// Bits of the device id that identify the part. The rest encode variant or pin count.
    pub mask: u16,
    pub name: &'static str,
    /// Program flash size in bytes.
    pub flash_size: u32,
}

impl DeviceDescriptor {
    const fn new(id: u16, mask: u16, name: &'static str, flash_size: u32) -> Self {
        Self {
            id,
            mask,
            name,
            flash_size,
        }
    }

    #[inline]
    pub fn matches(&self, device_id: u16) -> bool {
        device_id & self.mask == self.id & self.mask
    }
}

const K42: u16 = 0xFF00;
const Q4X: u16 = 0xFFE0;

pub const DEVICES: &[DeviceDescriptor] = &[
    // PIC18F27K42 family, id upper byte 0x6C
    DeviceDescriptor::new(0x6C20, K42, "PIC18F27K42", 131_072),
    DeviceDescriptor::new(0x6C40, K42, "PIC18F27K42", 131_072),
    DeviceDescriptor::new(0x6C00, K42, "PIC18F26K42", 65_536),
    DeviceDescriptor::new(0x6CE0, K42, "PIC18F25K42", 32_768),
    DeviceDescriptor::new(0x6CC0, K42, "PIC18F24K42", 16_384),
    DeviceDescriptor::new(0x6CA0, K42, "PIC18F47K42", 131_072),
    DeviceDescriptor::new(0x6C80, K42, "PIC18F46K42", 65_536),
    DeviceDescriptor::new(0x6C60, K42, "PIC18F45K42", 32_768),
    // Q41
    DeviceDescriptor::new(0x74E0, Q4X, "PIC18F15Q41", 32_768),
    DeviceDescriptor::new(0x7500, Q4X, "PIC18F05Q41", 16_384),
    DeviceDescriptor::new(0x7520, Q4X, "PIC18F14Q41", 16_384),
    DeviceDescriptor::new(0x7540, Q4X, "PIC18F04Q41", 8_192),
    DeviceDescriptor::new(0x7560, Q4X, "PIC18F16Q41", 65_536),
    DeviceDescriptor::new(0x7580, Q4X, "PIC18F06Q41", 32_768),
    // Q40
    DeviceDescriptor::new(0x75A0, Q4X, "PIC16F16Q40", 16_384),
    DeviceDescriptor::new(0x75C0, Q4X, "PIC18F06Q40", 32_768),
    DeviceDescriptor::new(0x75E0, Q4X, "PIC18F15Q40", 32_768),
    DeviceDescriptor::new(0x7600, Q4X, "PIC18F05Q40", 16_384),
    DeviceDescriptor::new(0x7620, Q4X, "PIC18F14Q40", 16_384),
    DeviceDescriptor::new(0x7640, Q4X, "PIC18F04Q40", 8_192),
];

/// Returned for ids that match no table entry.
pub const UNKNOWN: DeviceDescriptor = DeviceDescriptor::new(0x0000, 0xFFFF, "Unknown", 0);

/// First table entry matching `device_id`, or [`UNKNOWN`].
pub fn identify(device_id: u16) -> &'static DeviceDescriptor {
    DEVICES
        .iter()
        .find(|d| d.matches(device_id))
        .unwrap_or(&UNKNOWN)
}

/// Flash size in bytes, 0 when unknown.
#[inline]
pub fn flash_size(device_id: u16) -> u32 {
    identify(device_id).flash_size
}
