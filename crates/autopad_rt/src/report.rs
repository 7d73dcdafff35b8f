use autopad_core::frame::{AxisLevel, Buttons, Hat, OutputFrame, Stick};

pub const REPORT_LEN: usize = 8;

// Pokken-style gamepad input report.
//
// | byte | field              |
// |------|--------------------|
// | 0..2 | buttons, LE        |
// | 2    | hat (8 = neutral)  |
// | 3..7 | LX, LY, RX, RY     |
// | 7    | vendor, always 0   |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HidReport(pub [u8; REPORT_LEN]);

impl HidReport {
    pub fn as_bytes(&self) -> &[u8; REPORT_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn encode_report(frame: &OutputFrame) -> HidReport {
    let [buttons_lo, buttons_hi] = frame.buttons.bits().to_le_bytes();

    HidReport([
        buttons_lo,
        buttons_hi,
        frame.hat.raw(),
        frame.left.x.raw(),
        frame.left.y.raw(),
        frame.right.x.raw(),
        frame.right.y.raw(),
        0,
    ])
}

pub fn decode_report(report: &HidReport) -> OutputFrame {
    let bytes = report.as_bytes();

    OutputFrame {
        left: Stick {
            x: AxisLevel::from_raw(bytes[3]),
            y: AxisLevel::from_raw(bytes[4]),
        },
        right: Stick {
            x: AxisLevel::from_raw(bytes[5]),
            y: AxisLevel::from_raw(bytes[6]),
        },
        hat: Hat::from_raw(bytes[2]),
        buttons: Buttons::from_bits_truncate(u16::from_le_bytes([bytes[0], bytes[1]])),
    }
}
