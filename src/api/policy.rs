use std::collections::HashSet;

/// Read operations a facade may retry against the mock backend.
///
/// Writes have no variant here: they never fall back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadOp {
    List,
    Get,
    Search,
    Filter,
    /// Singleton document fetch.
    Fetch,
}

impl ReadOp {
    pub const ALL: [ReadOp; 5] = [ReadOp::List, ReadOp::Get, ReadOp::Search, ReadOp::Filter, ReadOp::Fetch];
}

/// Which remote read failures are answered from the mock backend instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    ops: HashSet<ReadOp>,
}

impl FallbackPolicy {
    pub fn all_reads() -> Self {
        Self::only(&ReadOp::ALL)
    }

    pub fn none() -> Self {
        Self { ops: HashSet::new() }
    }

    pub fn only(ops: &[ReadOp]) -> Self {
        Self {
            ops: ops.iter().copied().collect(),
        }
    }

    pub fn from_flag(enabled: bool) -> Self {
        if enabled {
            Self::all_reads()
        } else {
            Self::none()
        }
    }

    pub fn applies(&self, op: ReadOp) -> bool {
        self.ops.contains(&op)
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::all_reads()
    }
}
