//! Three-octet mouse protocol emulation
//!
//! Legacy pointer nodes (`/dev/input/mice`, `/dev/input/mouseN`) deliver bare
//! 3-byte packets: a button mask and signed X/Y deltas. [`MouseTranslator`]
//! turns each packet into the event frame a modern relative pointer would
//! report:
//!
//! - `EV_KEY BTN_LEFT|BTN_RIGHT|BTN_MIDDLE 1|0`, only for buttons that changed
//! - `EV_REL REL_X dx`, if nonzero
//! - `EV_REL REL_Y -dy`, if nonzero (the packet's Y axis points up)
//! - `EV_SYN SYN_REPORT 0`, always

use crate::event::{EventRecord, Timestamp};
use evdev::{EventType, Key, RelativeAxisType, Synchronization};

/// Bytes in one packet.
pub const PACKET_SIZE: usize = 3;

/// Button bit in the packet mask and the key code it becomes.
const BUTTONS: [(u8, Key); 3] = [
    (0x01, Key::BTN_LEFT),
    (0x02, Key::BTN_RIGHT),
    (0x04, Key::BTN_MIDDLE),
];

const BUTTON_MASK: u8 = 0x07;

/// Per-device translator state: the last button mask seen.
#[derive(Debug, Clone, Default)]
pub struct MouseTranslator {
    pressed: u8,
}

impl MouseTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buttons held as of the last packet (bit 0 left, 1 right, 2 middle).
    pub fn pressed(&self) -> u8 {
        self.pressed
    }

    /// Translate one packet stamped with `time`.
    pub fn translate(&mut self, packet: [u8; PACKET_SIZE], time: Timestamp) -> Vec<EventRecord> {
        let buttons = packet[0] & BUTTON_MASK;
        let dx = i32::from(packet[1] as i8);
        let dy = i32::from(packet[2] as i8);

        let mut out = Vec::with_capacity(6);
        let changed = buttons ^ self.pressed;
        for (bit, key) in BUTTONS {
            if changed & bit != 0 {
                let value = i32::from(buttons & bit != 0);
                out.push(EventRecord::new(time, EventType::KEY.0, key.code(), value));
            }
        }
        if dx != 0 {
            out.push(EventRecord::new(
                time,
                EventType::RELATIVE.0,
                RelativeAxisType::REL_X.0,
                dx,
            ));
        }
        if dy != 0 {
            out.push(EventRecord::new(
                time,
                EventType::RELATIVE.0,
                RelativeAxisType::REL_Y.0,
                -dy,
            ));
        }
        out.push(EventRecord::new(
            time,
            EventType::SYNCHRONIZATION.0,
            Synchronization::SYN_REPORT.0,
            0,
        ));

        self.pressed = buttons;
        out
    }
}
