use crate::frame::OutputFrame;

#[derive(Clone, Debug, Default)]
pub struct EchoBuffer {
    last_frame: OutputFrame,
    remaining_echoes: u32,
}

impl EchoBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_echo(&self) -> bool {
        self.remaining_echoes > 0
    }

    pub fn consume_echo(&mut self) -> Option<OutputFrame> {
        if !self.should_echo() {
            return None;
        }

        self.remaining_echoes -= 1;
        Some(self.last_frame)
    }

    pub fn store(&mut self, frame: OutputFrame, echo_count: u32) {
        self.last_frame = frame;
        self.remaining_echoes = echo_count;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining_echoes
    }

    pub fn last_frame(&self) -> &OutputFrame {
        &self.last_frame
    }
}
