//! Device-specific message translations.
//!
//! Some controllers label transport bytes as ordinary CCs; the engine rewrites
//! those on the way in. The tables live here, one per known device, shared
//! across device instances by reference count.

use std::sync::{Arc, OnceLock};

const IDENTIFIER_ATOM_SQ: &str = "ATM SQ ATM SQ";
const IDENTIFIER_SEABOARD_RISE: &str = "Seaboard RISE MIDI";

/// Per-CC replacement bytes. A CC message whose controller number has an
/// entry is substituted wholesale, keeping the original time.
pub struct CcTranslationTable {
    entries: [Option<&'static [u8]>; 128],
}

impl CcTranslationTable {
    fn empty() -> Self {
        Self {
            entries: [None; 128],
        }
    }

    /// The replacement bytes for a CC number, if any.
    #[inline]
    pub fn lookup(&self, cc: u8) -> Option<&'static [u8]> {
        self.entries.get(cc as usize).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }
}

/// The table shared by devices with no translations.
pub fn empty_table() -> Arc<CcTranslationTable> {
    static EMPTY: OnceLock<Arc<CcTranslationTable>> = OnceLock::new();
    Arc::clone(EMPTY.get_or_init(|| Arc::new(CcTranslationTable::empty())))
}

fn atom_sq_table() -> Arc<CcTranslationTable> {
    static TABLE: OnceLock<Arc<CcTranslationTable>> = OnceLock::new();
    Arc::clone(TABLE.get_or_init(|| {
        let mut table = CcTranslationTable::empty();
        // The ATOM SQ reports its stop and start buttons as CC 85 and 86;
        // turn those into the realtime stop and start bytes.
        table.entries[85] = Some(&[0xFC]);
        table.entries[86] = Some(&[0xFA]);
        Arc::new(table)
    }))
}

/// The CC translation table for a device, identified by its human-readable
/// name.
pub fn table_for_device(human_name: &str) -> Arc<CcTranslationTable> {
    if human_name.ends_with(IDENTIFIER_ATOM_SQ) {
        tracing::debug!(human_name, "identified as Presonus ATOM SQ, applying CC translations");
        atom_sq_table()
    } else {
        empty_table()
    }
}

/// The device-master channel convention for a known device, or -1 when the
/// device has no known MPE convention.
pub fn default_master_channel(human_name: &str) -> i8 {
    if human_name.starts_with(IDENTIFIER_SEABOARD_RISE) {
        tracing::debug!(human_name, "identified as ROLI Seaboard RISE, master channel 0");
        0
    } else {
        -1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_sq_translations() {
        let table = table_for_device("PreSonus ATM SQ ATM SQ");
        assert_eq!(table.lookup(85), Some(&[0xFC][..]));
        assert_eq!(table.lookup(86), Some(&[0xFA][..]));
        assert_eq!(table.lookup(84), None);
    }

    #[test]
    fn test_unknown_device_gets_empty_table() {
        let table = table_for_device("Some Keyboard");
        assert!(table.is_empty());
    }

    #[test]
    fn test_default_master_channel() {
        assert_eq!(default_master_channel("Seaboard RISE MIDI 49"), 0);
        assert_eq!(default_master_channel("Some Keyboard"), -1);
    }

    #[test]
    fn test_tables_are_shared() {
        let first = table_for_device("PreSonus ATM SQ ATM SQ");
        let second = table_for_device("PreSonus ATM SQ ATM SQ");
        assert!(Arc::ptr_eq(&first, &second));
    }
}
