//! Branch target parsing and resolution.
//!
//! A target is `<identifier>` or `<identifier>.<n>`, where `n` is the 1-based
//! occurrence of an item. Resolution tries item references first, then
//! sections, then test parts:
//!
//! - an item lands on its `n`-th occurrence (default first), which must sit
//!   in the current test part;
//! - a section lands on its first step, which must sit in the current test
//!   part;
//! - a test part lands on its first step and must not be the current part.

use std::fmt;
use std::str::FromStr;

use crate::definition::{is_valid_identifier, TestPart};
use crate::error::{BranchingViolation, RouteError, RouteResult};
use crate::metrics::METRICS;
use crate::obs;

use super::Route;

/// A parsed branch target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchTarget {
    base: String,
    /// Zero-based occurrence, when the target carried a suffix.
    occurrence: Option<u32>,
}

impl BranchTarget {
    /// Parse `<identifier>` or `<identifier>.<n>` with `n >= 1`.
    ///
    /// A trailing run of digits after the last `.` is always read as an
    /// occurrence suffix.
    pub fn parse(target: &str) -> RouteResult<Self> {
        let malformed = |reason: &str| RouteError::MalformedBranchTarget {
            target: target.to_string(),
            reason: reason.to_string(),
        };

        let (base, occurrence) = match target.rsplit_once('.') {
            Some((base, suffix))
                if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) =>
            {
                let n: u32 = suffix
                    .parse()
                    .map_err(|_| malformed("occurrence number is too large"))?;
                if n == 0 {
                    return Err(malformed("occurrences are numbered from 1"));
                }
                (base, Some(n - 1))
            }
            _ => (target, None),
        };

        if !is_valid_identifier(base) {
            return Err(malformed("not a valid identifier"));
        }
        Ok(Self {
            base: base.to_string(),
            occurrence,
        })
    }

    /// The identifier part of the target.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Zero-based occurrence index, if one was given.
    pub fn occurrence(&self) -> Option<u32> {
        self.occurrence
    }
}

impl FromStr for BranchTarget {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for BranchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.occurrence {
            Some(n) => write!(f, "{}.{}", self.base, n + 1),
            None => f.write_str(&self.base),
        }
    }
}

impl Route {
    /// Move the cursor to `target`.
    ///
    /// Returns the new position. On any error the cursor stays where it was.
    pub fn branch(&mut self, target: &str) -> RouteResult<usize> {
        let resolved = BranchTarget::parse(target).and_then(|parsed| self.resolve_branch(&parsed));
        match resolved {
            Ok(position) => {
                obs::emit_branch_taken(target, self.position, position);
                METRICS.inc_branches_taken();
                self.position = position;
                Ok(position)
            }
            Err(err) => {
                obs::emit_branch_rejected(target, self.position, &err);
                METRICS.inc_branches_rejected();
                Err(err)
            }
        }
    }

    /// Position `target` resolves to from the current step, without moving.
    pub fn resolve_branch(&self, target: &BranchTarget) -> RouteResult<usize> {
        let current = self.current()?;
        let current_part = current.test_part();

        if let Some(positions) = self.index.item_positions(&target.base) {
            let occurrence = target.occurrence.unwrap_or(0);
            let position = positions.get(occurrence as usize).copied().ok_or_else(|| {
                RouteError::UnknownOccurrence {
                    identifier: target.base.clone(),
                    occurrence,
                    count: positions.len() as u32,
                }
            })?;
            return self.within_part(target, current_part, position);
        }

        let suffix_not_allowed = || RouteError::MalformedBranchTarget {
            target: target.to_string(),
            reason: "an occurrence number only applies to item targets".to_string(),
        };

        if let Some(positions) = self.index.section_positions_by_identifier(&target.base) {
            if target.occurrence.is_some() {
                return Err(suffix_not_allowed());
            }
            let position = first(positions, target)?;
            return self.within_part(target, current_part, position);
        }

        if let Some(positions) = self.index.part_positions_by_identifier(&target.base) {
            if target.occurrence.is_some() {
                return Err(suffix_not_allowed());
            }
            let position = first(positions, target)?;
            if self.steps[position].test_part().id() == current_part.id() {
                return Err(BranchingViolation::SameTestPart {
                    target: target.to_string(),
                }
                .into());
            }
            return Ok(position);
        }

        Err(RouteError::UnresolvedBranchTarget {
            target: target.to_string(),
        })
    }

    fn within_part(
        &self,
        target: &BranchTarget,
        current_part: &TestPart,
        position: usize,
    ) -> RouteResult<usize> {
        let target_part = self.steps[position].test_part();
        if target_part.id() != current_part.id() {
            return Err(BranchingViolation::LeavesTestPart {
                target: target.to_string(),
                current_part: current_part.identifier().to_string(),
                target_part: target_part.identifier().to_string(),
            }
            .into());
        }
        Ok(position)
    }
}

fn first(positions: &[usize], target: &BranchTarget) -> RouteResult<usize> {
    positions
        .first()
        .copied()
        .ok_or_else(|| RouteError::UnresolvedBranchTarget {
            target: target.to_string(),
        })
}
