use crate::sections::SectionName;

/// Which section is currently shown. Exactly one is active at a time.
#[derive(Debug, Clone)]
pub struct SectionNav {
    sections: Vec<SectionName>,
    active: usize,
}

impl SectionNav {
    pub fn new(sections: impl IntoIterator<Item = SectionName>) -> Self {
        Self {
            sections: sections.into_iter().collect(),
            active: 0,
        }
    }

    pub fn active(&self) -> Option<SectionName> {
        self.sections.get(self.active).copied()
    }

    /// Activate the section at `index`. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.sections.len() {
            self.active = index;
            true
        } else {
            false
        }
    }

    /// Number keys `1`-`9` pick sections by position
    pub fn select_key(&mut self, key: char) -> bool {
        match key.to_digit(10) {
            Some(n) if n >= 1 => self.select(n as usize - 1),
            _ => false,
        }
    }
}
