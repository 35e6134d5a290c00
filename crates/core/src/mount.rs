/// Per-instance readiness flag.
///
/// `false` until the owning component's first render commit, then `true`
/// for the rest of the instance's life. Components consult it before
/// producing any time- or geometry-dependent signal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MountGuard {
    mounted: bool,
}

impl MountGuard {
    pub const fn new() -> Self {
        Self { mounted: false }
    }

    /// Record the first render commit. Returns `true` only on the call that
    /// actually flipped the flag.
    pub fn mark_mounted(&mut self) -> bool {
        let first = !self.mounted;
        self.mounted = true;
        first
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// `Some(value)` once mounted, `None` before.
    pub fn gate<T>(&self, value: T) -> Option<T> {
        self.mounted.then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flips_once_and_stays() {
        let mut guard = MountGuard::new();
        assert!(!guard.is_mounted());
        assert_eq!(guard.gate(7), None);
        assert!(guard.mark_mounted());
        assert!(!guard.mark_mounted());
        assert!(guard.is_mounted());
        assert_eq!(guard.gate(7), Some(7));
    }
}
