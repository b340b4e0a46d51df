//! Lexical construct tracking for control-transfer checks.
//!
//! The stack always holds a root [`ScopeKind::File`] marker whose counter is
//! the number of loops currently open. Loop counters flag a pending
//! `continue`, `Do`/`Guard` counters flag a `return` in their block.

/// Construct a marker was pushed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    File,
    Class,
    /// Function body, also used for `defer` blocks.
    Function,
    /// `for`, `while` and `repeat`.
    Loop,
    If,
    Do,
    Guard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeMarker {
    pub kind: ScopeKind,
    pub name: String,
    pub count: u32,
}

/// Growable stack of [`ScopeMarker`]s owned by one parser.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    markers: Vec<ScopeMarker>,
}

impl ScopeStack {
    #[must_use]
    pub fn new(file_name: &str) -> Self {
        Self {
            markers: vec![ScopeMarker {
                kind: ScopeKind::File,
                name: file_name.to_string(),
                count: 0,
            }],
        }
    }

    pub fn push(&mut self, kind: ScopeKind, name: &str) {
        if kind == ScopeKind::Loop {
            self.markers[0].count += 1;
        }
        self.markers.push(ScopeMarker {
            kind,
            name: name.to_string(),
            count: 0,
        });
    }

    /// Pop the innermost marker. The root marker is never removed.
    pub fn pop(&mut self) -> Option<ScopeMarker> {
        if self.markers.len() <= 1 {
            return None;
        }
        let marker = self.markers.pop()?;
        if marker.kind == ScopeKind::Loop {
            self.markers[0].count = self.markers[0].count.saturating_sub(1);
        }
        Some(marker)
    }

    #[must_use]
    pub fn current(&self) -> &ScopeMarker {
        // The root marker is always present.
        &self.markers[self.markers.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut ScopeMarker {
        let last = self.markers.len() - 1;
        &mut self.markers[last]
    }

    /// Nearest marker of `kind`, searching outwards and giving up at the
    /// first `stop` marker.
    pub fn find_before(&mut self, kind: ScopeKind, stop: ScopeKind) -> Option<&mut ScopeMarker> {
        for marker in self.markers.iter_mut().rev() {
            if marker.kind == kind {
                return Some(marker);
            }
            if marker.kind == stop {
                return None;
            }
        }
        None
    }

    /// Number of loops currently open.
    #[must_use]
    pub fn loop_depth(&self) -> u32 {
        self.markers[0].count
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.markers.len()
    }

    /// Innermost enclosing class, if the current marker is one.
    #[must_use]
    pub fn current_class(&self) -> Option<&str> {
        let current = self.current();
        (current.kind == ScopeKind::Class).then_some(current.name.as_str())
    }
}
