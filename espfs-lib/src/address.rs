//! ESP8266 linked-address to flash-offset translation.
//!
//! Linker scripts place the filesystem in the memory-mapped flash window, so
//! `_FS_start`/`_FS_end` are CPU addresses. esptool addresses flash from 0.

use crate::utils::Utils;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    None,
    Subtract(u32),
    Add(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRangeRule {
    /// Exclusive; `None` matches every remaining address.
    pub upper_bound: Option<u32>,
    pub mask: u32,
    pub correction: Correction,
}

/// Ascending by `upper_bound`, first match wins.
pub const ADDRESS_RANGE_RULES: [AddressRangeRule; 3] = [
    AddressRangeRule {
        upper_bound: Some(0x4030_0000),
        mask: 0x000F_FFFF,
        correction: Correction::None,
    },
    AddressRangeRule {
        upper_bound: Some(0x411F_B000),
        mask: 0x00FF_FFFF,
        correction: Correction::Subtract(0x20_0000),
    },
    AddressRangeRule {
        upper_bound: None,
        mask: 0x00FF_FFFF,
        correction: Correction::Add(0xE0_0000),
    },
];

impl AddressRangeRule {
    fn matches(&self, address: u32) -> bool {
        self.upper_bound.is_none_or(|bound| address < bound)
    }

    fn apply(&self, address: u32) -> Result<u32> {
        let masked = address & self.mask;
        match self.correction {
            Correction::None => Ok(masked),
            Correction::Subtract(delta) => masked.checked_sub(delta).ok_or_else(|| {
                Error::invariant(format!(
                    "address {} translates below flash offset 0",
                    Utils::hex(address)
                ))
            }),
            // Masked to 24 bits, so the add cannot overflow.
            Correction::Add(delta) => Ok(masked + delta),
        }
    }
}

/// Translate a linked address into a flash offset.
pub fn translate(address: u32) -> Result<u32> {
    let rule = ADDRESS_RANGE_RULES
        .iter()
        .find(|rule| rule.matches(address))
        .ok_or_else(|| Error::invariant(format!("no rule for {}", Utils::hex(address))))?;
    let offset = rule.apply(address)?;
    tracing::trace!("Translated {} -> {}", Utils::hex(address), Utils::hex(offset));
    Ok(offset)
}
