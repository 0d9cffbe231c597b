//! Symbolic names for event classes and codes
//!
//! The name data itself is a read-only table service ([`CodeTable`]); the
//! resolver only knows which table belongs to which class and what to show
//! when nothing matches. An unresolved code is a normal outcome, never an error.

use crate::codes;
use evdev::EventType;

/// Name tables a [`CodeTable`] can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Ev,
    Syn,
    Key,
    /// Button aliases, consulted when a KEY code has no `KEY_*` name
    Btn,
    Rel,
    Abs,
    Msc,
    Sw,
    Led,
    Snd,
    Rep,
    FfStatus,
    Bus,
}

/// Read-only mapping from a table and numeric code to a display name.
pub trait CodeTable {
    fn name_for(&self, table: Table, code: u16) -> Option<&str>;
}

/// The kernel's own names, from [`crate::codes`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxCodes;

impl LinuxCodes {
    fn slice(table: Table) -> &'static [(u16, &'static str)] {
        match table {
            Table::Ev => codes::EV_NAMES,
            Table::Syn => codes::SYN_NAMES,
            Table::Key => codes::KEY_NAMES,
            Table::Btn => codes::BTN_NAMES,
            Table::Rel => codes::REL_NAMES,
            Table::Abs => codes::ABS_NAMES,
            Table::Msc => codes::MSC_NAMES,
            Table::Sw => codes::SW_NAMES,
            Table::Led => codes::LED_NAMES,
            Table::Snd => codes::SND_NAMES,
            Table::Rep => codes::REP_NAMES,
            Table::FfStatus => codes::FF_STATUS_NAMES,
            Table::Bus => codes::BUS_NAMES,
        }
    }
}

impl CodeTable for LinuxCodes {
    fn name_for(&self, table: Table, code: u16) -> Option<&str> {
        let entries = Self::slice(table);
        entries
            .binary_search_by_key(&code, |&(c, _)| c)
            .ok()
            .map(|i| entries[i].1)
    }
}

/// Sentinel for a class or bus the tables know nothing about.
pub const UNKNOWN: &str = "unknown";

/// Per-class table and the text shown when a code is missing from it.
fn class_table(class: u16) -> Option<(Table, &'static str)> {
    let entry = match EventType(class) {
        EventType::SYNCHRONIZATION => (Table::Syn, "unknown SYN event"),
        EventType::KEY => (Table::Key, "unknown KEY event"),
        EventType::RELATIVE => (Table::Rel, "unknown REL event"),
        EventType::ABSOLUTE => (Table::Abs, "unknown ABS event"),
        EventType::MISC => (Table::Msc, "unknown MSC event"),
        EventType::SWITCH => (Table::Sw, "unknown SW event"),
        EventType::LED => (Table::Led, "unknown LED event"),
        EventType::SOUND => (Table::Snd, "unknown SND event"),
        EventType::REPEAT => (Table::Rep, "unknown REP event"),
        EventType::FORCEFEEDBACKSTATUS => (Table::FfStatus, "unknown FF status"),
        _ => return None,
    };
    Some(entry)
}

/// Resolves (class, code) pairs to names through an injected [`CodeTable`].
#[derive(Debug, Clone, Default)]
pub struct SymbolResolver<T = LinuxCodes> {
    table: T,
}

impl SymbolResolver<LinuxCodes> {
    /// Resolver over the kernel's own names.
    pub fn linux() -> Self {
        Self::new(LinuxCodes)
    }
}

impl<T: CodeTable> SymbolResolver<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }

    /// Name of an event class, e.g. `EV_KEY`.
    pub fn class_name(&self, class: u16) -> &str {
        self.table.name_for(Table::Ev, class).unwrap_or(UNKNOWN)
    }

    /// Name of a code within `class`.
    ///
    /// KEY codes without a `KEY_*` name fall back to the button alias table.
    /// Classes that have no table at all resolve to [`UNKNOWN`].
    pub fn code_name(&self, class: u16, code: u16) -> &str {
        let Some((table, missing)) = class_table(class) else {
            return UNKNOWN;
        };
        let found = self.table.name_for(table, code).or_else(|| {
            if table == Table::Key {
                self.table.name_for(Table::Btn, code)
            } else {
                None
            }
        });
        found.unwrap_or(missing)
    }

    pub fn bus_name(&self, bus: u16) -> &str {
        self.table.name_for(Table::Bus, bus).unwrap_or(UNKNOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Synthetic(HashMap<(Table, u16), String>);

    impl CodeTable for Synthetic {
        fn name_for(&self, table: Table, code: u16) -> Option<&str> {
            self.0.get(&(table, code)).map(String::as_str)
        }
    }

    fn synthetic() -> SymbolResolver<Synthetic> {
        let mut names = HashMap::new();
        names.insert((Table::Ev, 1), "KEYS".to_string());
        names.insert((Table::Key, 30), "A".to_string());
        names.insert((Table::Key, 0x110), "KEY_SHADOW".to_string());
        names.insert((Table::Btn, 0x110), "LEFT".to_string());
        names.insert((Table::Btn, 0x111), "RIGHT".to_string());
        names.insert((Table::Rel, 0x111), "NOT_A_BUTTON".to_string());
        SymbolResolver::new(Synthetic(names))
    }

    #[test]
    fn test_configured_names_returned() {
        let r = synthetic();
        assert_eq!(r.class_name(1), "KEYS");
        assert_eq!(r.code_name(1, 30), "A");
    }

    #[test]
    fn test_key_falls_back_to_buttons() {
        let r = synthetic();
        // KEY table wins when both have an entry
        assert_eq!(r.code_name(1, 0x110), "KEY_SHADOW");
        assert_eq!(r.code_name(1, 0x111), "RIGHT");
    }

    #[test]
    fn test_button_fallback_is_key_only() {
        let r = synthetic();
        assert_eq!(r.code_name(2, 0x110), "unknown REL event");
        assert_eq!(r.code_name(2, 0x111), "NOT_A_BUTTON");
    }

    #[test]
    fn test_unknown_sentinels() {
        let r = synthetic();
        assert_eq!(r.class_name(9), UNKNOWN);
        assert_eq!(r.code_name(1, 31), "unknown KEY event");
        assert_eq!(r.code_name(0x17, 0), "unknown FF status");
        // EV_FF has no code table
        assert_eq!(r.code_name(0x15, 0), UNKNOWN);
        assert_eq!(r.bus_name(3), UNKNOWN);
    }

    #[test]
    fn test_linux_names() {
        let r = SymbolResolver::linux();
        assert_eq!(r.class_name(0), "EV_SYN");
        assert_eq!(r.class_name(0x17), "EV_FF_STATUS");
        assert_eq!(r.code_name(1, 30), "KEY_A");
        assert_eq!(r.code_name(1, 0x110), "BTN_LEFT");
        assert_eq!(r.code_name(2, 1), "REL_Y");
        assert_eq!(r.code_name(0, 0), "SYN_REPORT");
        assert_eq!(r.code_name(0x11, 1), "LED_CAPSL");
        assert_eq!(r.bus_name(3), "BUS_USB");
    }
}
