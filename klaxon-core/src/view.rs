//! Display composition
//!
//! Each mode has one view. Views write whole rows into the shadow
//! [`Screen`]; the screen pads every row to full width and decides which
//! rows actually reach the panel.
//!
//! ```text
//! idle    |UNIT-A          |   peer label or radio banner
//!         |---4 1----  50%*|   remote slots, local slots, quality, recency
//! naming  |BOB           04|
//!         |   ^        EDIT|
//! panic   |**** PANIC **** |
//!         |< UNIT-A        |   > own name, < peer name
//! ```

use core::fmt::Write;

use klaxon_display::{Line, Screen};

use crate::input::BUTTON_COUNT;
use crate::link::{LinkStatus, RemoteLink};
use crate::name::NameBuffer;
use crate::state::PanicOrigin;
use crate::time::Millis;

/// Panic banner row
pub const PANIC_BANNER: &str = "**** PANIC ****";

/// Column where the naming view's `EDIT` tag starts
const EDIT_TAG_COL: usize = 12;

fn slot_char(index: usize, active: bool) -> char {
    if active {
        char::from(b'1' + index as u8)
    } else {
        '-'
    }
}

/// Status row: remote slots, local slots, quality and recency
fn status_line(
    link: &RemoteLink,
    local: [bool; BUTTON_COUNT],
    now: Millis,
    quality_timeout_ms: u32,
) -> Line {
    let mut line = Line::new();
    for (index, live) in link.live().into_iter().enumerate() {
        let _ = line.push(slot_char(index, live));
    }
    let _ = line.push(' ');
    for (index, pressed) in local.into_iter().enumerate() {
        let _ = line.push(slot_char(index, pressed));
    }
    let _ = write!(
        line,
        " {:>3}%{}",
        link.quality().percent,
        link.recency(now, quality_timeout_ms).glyph()
    );
    line
}

/// Compose the idle view
pub fn idle(
    screen: &mut Screen,
    link: &RemoteLink,
    local: [bool; BUTTON_COUNT],
    status: LinkStatus,
    now: Millis,
    quality_timeout_ms: u32,
) {
    let top = match link.peer_label() {
        Some(label) => label.as_str(),
        None => status.banner().unwrap_or(""),
    };
    screen.set_line(0, top);
    screen.set_line(1, &status_line(link, local, now, quality_timeout_ms));
}

/// Compose the name editor view
pub fn naming(screen: &mut Screen, name: &NameBuffer) {
    let mut top = Line::new();
    let _ = write!(top, "{}  {:02}", name.as_str(), name.cursor() + 1);
    screen.set_line(0, &top);

    screen.set_line(1, "");
    screen.write_at(1, name.cursor(), "^");
    screen.write_at(1, EDIT_TAG_COL, "EDIT");
}

/// Compose the panic view
pub fn panic(screen: &mut Screen, origin: PanicOrigin, label: &str) {
    let marker = match origin {
        PanicOrigin::Local => '>',
        PanicOrigin::Remote => '<',
    };
    let mut bottom = Line::new();
    let _ = write!(bottom, "{} {}", marker, label);

    screen.set_line(0, PANIC_BANNER);
    screen.set_line(1, &bottom);
}

/// Compose a transient notice
pub fn notice(screen: &mut Screen, text: &str) {
    screen.set_line(0, text);
    screen.set_line(1, "");
}
