/// What happens when arrow navigation runs off either end of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusPolicy {
    /// Stay in the group and continue from the other end.
    Wrap,
    /// Move to the neighbouring group.
    #[default]
    HandOff,
}

impl std::str::FromStr for FocusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wrap" => Ok(FocusPolicy::Wrap),
            "hand-off" | "handoff" => Ok(FocusPolicy::HandOff),
            other => Err(format!("unknown focus policy '{other}' (expected wrap or hand-off)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusStep {
    Moved(usize),
    /// Ran off the group edge; the owner decides where focus goes.
    Boundary(Direction),
}

/// Focus position inside one group of `len` controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusCursor {
    pub index: usize,
    pub len: usize,
    policy: FocusPolicy,
}

impl FocusCursor {
    pub fn new(len: usize, policy: FocusPolicy) -> Self {
        Self { index: 0, len, policy }
    }

    pub fn step(&mut self, dir: Direction) -> FocusStep {
        if self.len == 0 {
            return FocusStep::Boundary(dir);
        }
        let last = self.len - 1;
        match (dir, self.policy) {
            (Direction::Down, _) if self.index < last => self.index += 1,
            (Direction::Up, _) if self.index > 0 => self.index -= 1,
            (Direction::Down, FocusPolicy::Wrap) => self.index = 0,
            (Direction::Up, FocusPolicy::Wrap) => self.index = last,
            (_, FocusPolicy::HandOff) => return FocusStep::Boundary(dir),
        }
        FocusStep::Moved(self.index)
    }

    pub fn focus_first(&mut self) {
        self.index = 0;
    }

    pub fn focus_last(&mut self) {
        self.index = self.len.saturating_sub(1);
    }

    /// Jump to `index` if it is inside the group.
    pub fn focus(&mut self, index: usize) -> bool {
        if index < self.len {
            self.index = index;
            true
        } else {
            false
        }
    }
}

/// Ordered sibling groups with one active group.
///
/// Resolves boundary steps by handing focus to the next or previous group,
/// wrapping around the whole list.
#[derive(Debug, Clone)]
pub struct FocusRing {
    groups: Vec<FocusCursor>,
    active: usize,
}

impl FocusRing {
    pub fn new(group_lens: &[usize], policy: FocusPolicy) -> Self {
        Self {
            groups: group_lens
                .iter()
                .map(|&len| FocusCursor::new(len, policy))
                .collect(),
            active: 0,
        }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    /// Index of the focused control in `group`.
    pub fn index_in(&self, group: usize) -> usize {
        self.groups.get(group).map_or(0, |c| c.index)
    }

    /// Make `group` active, keeping its previous position.
    pub fn activate(&mut self, group: usize) {
        if group < self.groups.len() {
            self.active = group;
        }
    }

    /// Make `group` active and focus `index` within it.
    pub fn focus(&mut self, group: usize, index: usize) {
        if let Some(cursor) = self.groups.get_mut(group)
            && cursor.focus(index)
        {
            self.active = group;
        }
    }

    /// Arrow-key step from the active group. Returns (group, index) now focused.
    pub fn step(&mut self, dir: Direction) -> (usize, usize) {
        let count = self.groups.len();
        if count == 0 {
            return (0, 0);
        }
        if let FocusStep::Boundary(dir) = self.groups[self.active].step(dir) {
            // Skip empty groups; stop after one full lap.
            for _ in 0..count {
                self.active = match dir {
                    Direction::Down => (self.active + 1) % count,
                    Direction::Up => (self.active + count - 1) % count,
                };
                let target = &mut self.groups[self.active];
                if target.len == 0 {
                    continue;
                }
                match dir {
                    Direction::Down => target.focus_first(),
                    Direction::Up => target.focus_last(),
                }
                break;
            }
        }
        (self.active, self.groups[self.active].index)
    }
}
