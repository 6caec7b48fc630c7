use std::fmt;

/// Platform virtual-key code of the designated trigger key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerKey {
    code: u32,
}

const VK_BACK: u32 = 0x08;
const VK_TAB: u32 = 0x09;
const VK_RETURN: u32 = 0x0D;
const VK_PAUSE: u32 = 0x13;
const VK_CAPITAL: u32 = 0x14;
const VK_SPACE: u32 = 0x20;
const VK_INSERT: u32 = 0x2D;
const VK_F1: u32 = 0x70;
const VK_SCROLL: u32 = 0x91;
const VK_RCONTROL: u32 = 0xA3;
const VK_RMENU: u32 = 0xA5;

const NAMED_KEYS: &[(&str, u32)] = &[
    ("space", VK_SPACE),
    ("enter", VK_RETURN),
    ("tab", VK_TAB),
    ("backspace", VK_BACK),
    ("pause", VK_PAUSE),
    ("capslock", VK_CAPITAL),
    ("insert", VK_INSERT),
    ("scrolllock", VK_SCROLL),
    ("rightctrl", VK_RCONTROL),
    ("rightalt", VK_RMENU),
];

impl TriggerKey {
    pub const SPACE: Self = Self { code: VK_SPACE };

    pub const fn from_code(code: u32) -> Self {
        Self { code }
    }

    pub const fn code(self) -> u32 {
        self.code
    }

    /// Parses names like `space`, `f3`, `q` or `7`, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return None;
        }

        if let Some((_, code)) = NAMED_KEYS.iter().find(|(key, _)| *key == normalized) {
            return Some(Self::from_code(*code));
        }

        if let Some(number) = normalized.strip_prefix('f') {
            if let Ok(index) = number.parse::<u32>() {
                return (1..=24)
                    .contains(&index)
                    .then(|| Self::from_code(VK_F1 + index - 1));
            }
        }

        let mut chars = normalized.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii_alphanumeric() => {
                Some(Self::from_code(u32::from(ch.to_ascii_uppercase())))
            }
            _ => None,
        }
    }
}

impl Default for TriggerKey {
    fn default() -> Self {
        Self::SPACE
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((name, _)) = NAMED_KEYS.iter().find(|(_, code)| *code == self.code) {
            return f.write_str(name);
        }
        if (VK_F1..VK_F1 + 24).contains(&self.code) {
            return write!(f, "f{}", self.code - VK_F1 + 1);
        }
        match char::from_u32(self.code) {
            Some(ch) if ch.is_ascii_alphanumeric() => write!(f, "{}", ch.to_ascii_lowercase()),
            _ => write!(f, "vk:{:#04x}", self.code),
        }
    }
}
