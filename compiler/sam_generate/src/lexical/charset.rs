//! Sets of Unicode scalar values as sorted inclusive ranges.

/// Largest Unicode scalar value.
pub(crate) const MAX_CHAR: u32 = 0x10_FFFF;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct CharSet {
    /// Sorted, non-overlapping, non-adjacent.
    ranges: Vec<(u32, u32)>,
}

impl CharSet {
    pub(crate) fn new() -> Self {
        CharSet::default()
    }

    pub(crate) fn single(c: char) -> Self {
        let c = u32::from(c);
        CharSet { ranges: vec![(c, c)] }
    }

    pub(crate) fn range(start: u32, end: u32) -> Self {
        let mut set = CharSet::new();
        set.add_range(start, end);
        set
    }

    pub(crate) fn add_char(&mut self, c: char) {
        let c = u32::from(c);
        self.add_range(c, c);
    }

    pub(crate) fn add_range(&mut self, start: u32, end: u32) {
        if start > end {
            return;
        }
        self.ranges.push((start, end.min(MAX_CHAR)));
        self.normalize();
    }

    pub(crate) fn add_set(&mut self, other: &CharSet) {
        self.ranges.extend_from_slice(&other.ranges);
        self.normalize();
    }

    fn normalize(&mut self) {
        self.ranges.sort_unstable();
        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(self.ranges.len());
        for &(start, end) in &self.ranges {
            match merged.last_mut() {
                Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }
        self.ranges = merged;
    }

    /// Complement within `0..=MAX_CHAR`.
    pub(crate) fn negated(&self) -> CharSet {
        let mut ranges = Vec::with_capacity(self.ranges.len() + 1);
        let mut next = 0u32;
        for &(start, end) in &self.ranges {
            if start > next {
                ranges.push((next, start - 1));
            }
            next = end + 1;
        }
        if next <= MAX_CHAR {
            ranges.push((next, MAX_CHAR));
        }
        CharSet { ranges }
    }

    pub(crate) fn contains(&self, c: u32) -> bool {
        let idx = self.ranges.partition_point(|&(_, end)| end < c);
        self.ranges.get(idx).is_some_and(|&(start, _)| start <= c)
    }

    pub(crate) fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    /// `\d`
    pub(crate) fn digits() -> Self {
        CharSet::range(u32::from('0'), u32::from('9'))
    }

    /// `\w`
    pub(crate) fn word() -> Self {
        let mut set = CharSet::digits();
        set.add_range(u32::from('A'), u32::from('Z'));
        set.add_range(u32::from('a'), u32::from('z'));
        set.add_char('_');
        set
    }

    /// `\s`, following the JavaScript definition.
    pub(crate) fn whitespace() -> Self {
        let mut set = CharSet::range(0x09, 0x0D);
        for c in [0x20, 0xA0, 0x1680, 0x2028, 0x2029, 0x202F, 0x205F, 0x3000, 0xFEFF] {
            set.add_range(c, c);
        }
        set.add_range(0x2000, 0x200A);
        set
    }
}
