use core::fmt;

use crate::caveats::Caveat;

/// Enforcer programs compiled to runtime bytecode.
///
/// Each exposes a single `enforce(...)` entry point that returns empty data on acceptance and
/// reverts on rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnforcerKind {
    /// `enforce(address target, address[] allowed)`
    AllowedTargets,
    /// `enforce(bytes4 selector, bytes4[] allowed)`
    AllowedMethods,
    /// `enforce(uint256 amount, uint256 cap)`
    ValueLimit,
}

impl EnforcerKind {
    pub const ALL: [EnforcerKind; 3] = [
        EnforcerKind::AllowedTargets,
        EnforcerKind::AllowedMethods,
        EnforcerKind::ValueLimit,
    ];

    /// Canonical Solidity signature of the entry point.
    pub const fn signature(self) -> &'static str {
        match self {
            EnforcerKind::AllowedTargets => "enforce(address,address[])",
            EnforcerKind::AllowedMethods => "enforce(bytes4,bytes4[])",
            EnforcerKind::ValueLimit => "enforce(uint256,uint256)",
        }
    }

    /// Kebab-case name used in artifacts and on the command line.
    pub const fn name(self) -> &'static str {
        match self {
            EnforcerKind::AllowedTargets => "allowed-targets",
            EnforcerKind::AllowedMethods => "allowed-methods",
            EnforcerKind::ValueLimit => "value-limit",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Enforcer that re-checks `caveat` on-chain. Swap constraints are enforced off-chain only.
    pub const fn for_caveat(caveat: &Caveat) -> Option<Self> {
        match caveat {
            Caveat::AllowedTargets(_) => Some(EnforcerKind::AllowedTargets),
            Caveat::AllowedMethods(_) => Some(EnforcerKind::AllowedMethods),
            Caveat::SpendCap(_) => Some(EnforcerKind::ValueLimit),
            Caveat::SwapConstraints(_) => None,
        }
    }
}

impl fmt::Display for EnforcerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
