use std::fmt::{Display, Formatter};

bitflags::bitflags! {
  /// Event type bits, laid out as the Linux inotify ABI defines them.
  pub struct EventMask: u32 {
    const ACCESS = 0x0000_0001;
    const MODIFY = 0x0000_0002;
    const ATTRIB = 0x0000_0004;
    const CLOSE_WRITE = 0x0000_0008;
    const CLOSE_NOWRITE = 0x0000_0010;
    const OPEN = 0x0000_0020;
    const MOVED_FROM = 0x0000_0040;
    const MOVED_TO = 0x0000_0080;
    const CREATE = 0x0000_0100;
    const DELETE = 0x0000_0200;
    const DELETE_SELF = 0x0000_0400;
    const MOVE_SELF = 0x0000_0800;
    const UNMOUNT = 0x0000_2000;
    const Q_OVERFLOW = 0x0000_4000;
    const IGNORED = 0x0000_8000;
    const ISDIR = 0x4000_0000;

    const CLOSE = Self::CLOSE_WRITE.bits | Self::CLOSE_NOWRITE.bits;
    const MOVE = Self::MOVED_FROM.bits | Self::MOVED_TO.bits;
    /// Every event a watch can subscribe to.
    const ALL_EVENTS = Self::ACCESS.bits
      | Self::MODIFY.bits
      | Self::ATTRIB.bits
      | Self::CLOSE.bits
      | Self::OPEN.bits
      | Self::MOVE.bits
      | Self::CREATE.bits
      | Self::DELETE.bits
      | Self::DELETE_SELF.bits
      | Self::MOVE_SELF.bits;
  }
}

const NAMES: [(EventMask, &str); 16] = [
    (EventMask::ACCESS, "ACCESS"),
    (EventMask::MODIFY, "MODIFY"),
    (EventMask::ATTRIB, "ATTRIB"),
    (EventMask::CLOSE_WRITE, "CLOSE_WRITE"),
    (EventMask::CLOSE_NOWRITE, "CLOSE_NOWRITE"),
    (EventMask::OPEN, "OPEN"),
    (EventMask::MOVED_FROM, "MOVED_FROM"),
    (EventMask::MOVED_TO, "MOVED_TO"),
    (EventMask::CREATE, "CREATE"),
    (EventMask::DELETE, "DELETE"),
    (EventMask::DELETE_SELF, "DELETE_SELF"),
    (EventMask::MOVE_SELF, "MOVE_SELF"),
    (EventMask::UNMOUNT, "UNMOUNT"),
    (EventMask::Q_OVERFLOW, "Q_OVERFLOW"),
    (EventMask::IGNORED, "IGNORED"),
    (EventMask::ISDIR, "ISDIR"),
];

impl Display for EventMask {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        for (flag, name) in NAMES {
            if self.contains(flag) {
                write!(f, "{} ", name)?;
            }
        }
        write!(f, "")
    }
}

#[cfg(test)]
mod tests {
    use super::EventMask;

    #[test]
    fn must_display_set_flags() {
        let mask = EventMask::CREATE | EventMask::ISDIR;
        assert_eq!(mask.to_string(), "CREATE ISDIR ");
        assert_eq!(EventMask::empty().to_string(), "");
    }

    #[test]
    fn must_exclude_structural_bits_from_all_events() {
        assert!(!EventMask::ALL_EVENTS.intersects(EventMask::IGNORED | EventMask::ISDIR));
        assert_eq!(EventMask::ALL_EVENTS.bits(), 0x0000_0fff);
    }
}
