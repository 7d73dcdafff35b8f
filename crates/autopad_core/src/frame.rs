use crate::model::Action;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AxisLevel {
    Min,
    #[default]
    Center,
    Max,
}

impl AxisLevel {
    pub fn raw(self) -> u8 {
        match self {
            AxisLevel::Min => 0x00,
            AxisLevel::Center => 0x80,
            AxisLevel::Max => 0xFF,
        }
    }

    pub fn from_raw(value: u8) -> Self {
        match value {
            0x00..=0x3F => AxisLevel::Min,
            0xC0..=0xFF => AxisLevel::Max,
            _ => AxisLevel::Center,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stick {
    pub x: AxisLevel,
    pub y: AxisLevel,
}

impl Stick {
    pub fn is_centered(&self) -> bool {
        self.x == AxisLevel::Center && self.y == AxisLevel::Center
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Hat {
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
    #[default]
    Neutral,
}

impl Hat {
    pub fn raw(self) -> u8 {
        match self {
            Hat::Up => 0,
            Hat::UpRight => 1,
            Hat::Right => 2,
            Hat::DownRight => 3,
            Hat::Down => 4,
            Hat::DownLeft => 5,
            Hat::Left => 6,
            Hat::UpLeft => 7,
            Hat::Neutral => 8,
        }
    }

    pub fn from_raw(value: u8) -> Self {
        match value {
            0 => Hat::Up,
            1 => Hat::UpRight,
            2 => Hat::Right,
            3 => Hat::DownRight,
            4 => Hat::Down,
            5 => Hat::DownLeft,
            6 => Hat::Left,
            7 => Hat::UpLeft,
            _ => Hat::Neutral,
        }
    }
}

// Pressed-button bitset, bit order matching the Pokken pad report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Buttons(u16);

impl Buttons {
    pub const NONE: Buttons = Buttons(0);
    pub const Y: Buttons = Buttons(1 << 0);
    pub const B: Buttons = Buttons(1 << 1);
    pub const A: Buttons = Buttons(1 << 2);
    pub const X: Buttons = Buttons(1 << 3);
    pub const L: Buttons = Buttons(1 << 4);
    pub const R: Buttons = Buttons(1 << 5);
    pub const ZL: Buttons = Buttons(1 << 6);
    pub const ZR: Buttons = Buttons(1 << 7);
    pub const MINUS: Buttons = Buttons(1 << 8);
    pub const PLUS: Buttons = Buttons(1 << 9);
    pub const LCLICK: Buttons = Buttons(1 << 10);
    pub const RCLICK: Buttons = Buttons(1 << 11);
    pub const HOME: Buttons = Buttons(1 << 12);
    pub const CAPTURE: Buttons = Buttons(1 << 13);

    const KNOWN_MASK: u16 = 0x3FFF;

    pub const fn from_bits_truncate(bits: u16) -> Self {
        Buttons(bits & Self::KNOWN_MASK)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub fn insert(&mut self, other: Buttons) {
        self.0 |= other.0;
    }

    pub fn contains(self, other: Buttons) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Buttons {
    type Output = Buttons;

    fn bitor(self, rhs: Buttons) -> Buttons {
        Buttons(self.0 | rhs.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputFrame {
    pub left: Stick,
    pub right: Stick,
    pub hat: Hat,
    pub buttons: Buttons,
}

impl OutputFrame {
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn is_neutral(&self) -> bool {
        self.left.is_centered()
            && self.right.is_centered()
            && self.hat == Hat::Neutral
            && self.buttons.is_empty()
    }
}

pub fn compose(action: Action) -> OutputFrame {
    let mut frame = OutputFrame::neutral();

    match action {
        Action::Nothing => {}
        Action::Up => frame.left.y = AxisLevel::Min,
        Action::Down => frame.left.y = AxisLevel::Max,
        Action::Left => frame.left.x = AxisLevel::Min,
        Action::Right => frame.left.x = AxisLevel::Max,
        Action::RUp => frame.right.y = AxisLevel::Min,
        Action::RDown => frame.right.y = AxisLevel::Max,
        Action::RLeft => frame.right.x = AxisLevel::Min,
        Action::RRight => frame.right.x = AxisLevel::Max,
        Action::DpadUp => frame.hat = Hat::Up,
        Action::DpadDown => frame.hat = Hat::Down,
        Action::DpadLeft => frame.hat = Hat::Left,
        Action::DpadRight => frame.hat = Hat::Right,
        Action::A => frame.buttons.insert(Buttons::A),
        Action::B => frame.buttons.insert(Buttons::B),
        Action::X => frame.buttons.insert(Buttons::X),
        Action::Y => frame.buttons.insert(Buttons::Y),
        Action::L => frame.buttons.insert(Buttons::L),
        Action::R => frame.buttons.insert(Buttons::R),
        Action::Zl => frame.buttons.insert(Buttons::ZL),
        Action::Zr => frame.buttons.insert(Buttons::ZR),
        Action::Minus => frame.buttons.insert(Buttons::MINUS),
        Action::Plus => frame.buttons.insert(Buttons::PLUS),
        Action::LClick => frame.buttons.insert(Buttons::LCLICK),
        Action::RClick => frame.buttons.insert(Buttons::RCLICK),
        Action::Home => frame.buttons.insert(Buttons::HOME),
        Action::Capture => frame.buttons.insert(Buttons::CAPTURE),
        Action::UpA => {
            frame.left.y = AxisLevel::Min;
            frame.buttons.insert(Buttons::A);
        }
        Action::RightA => {
            frame.left.x = AxisLevel::Max;
            frame.buttons.insert(Buttons::A);
        }
        Action::Triggers => frame.buttons.insert(Buttons::L | Buttons::R),
    }

    frame
}
