//! Witness rendering (§4.8 "Witness reification"), the human-readable
//! counterpart to [`crate::reify::Assignment`].
//!
//! One binding per reified arbitrary, joined with `, `. The core has no
//! descriptive name for an `ArbitraryId` beyond its numeric identity —
//! callers that track their own names wrap this type rather than extend
//! it.

use crate::ast::ArbitraryId;
use crate::reify::Assignment;
use crate::types::ConstValue;
use std::fmt;

pub struct WitnessBinding {
    pub id: ArbitraryId,
    pub value: ConstValue,
}

impl fmt::Display for WitnessBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${} = {}", self.id, self.value)
    }
}

/// A successful `find`/`maximize`/`minimize` result, rendered for
/// display. Bindings are sorted by arbitrary id so the rendering is
/// deterministic across runs of the same query.
pub struct Witness {
    pub bindings: Vec<WitnessBinding>,
}

impl Witness {
    pub fn from_assignment(assignment: &Assignment) -> Self {
        let mut bindings: Vec<WitnessBinding> = assignment
            .iter()
            .map(|(&id, value)| WitnessBinding { id, value: value.clone() })
            .collect();
        bindings.sort_by_key(|b| b.id);
        Witness { bindings }
    }

    pub fn has_bindings(&self) -> bool {
        !self.bindings.is_empty()
    }
}

impl fmt::Display for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bindings.is_empty() {
            return write!(f, "<no bindings>");
        }
        for (i, binding) in self.bindings.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{binding}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn displays_bindings_sorted_by_arbitrary_id() {
        let mut assignment: Assignment = HashMap::new();
        assignment.insert(2, ConstValue::Bool(true));
        assignment.insert(1, ConstValue::BitVec { value: 7, width: 8, signed: false });
        let witness = Witness::from_assignment(&assignment);
        assert_eq!(witness.to_string(), "$1 = 7, $2 = true");
    }

    #[test]
    fn empty_assignment_has_no_bindings() {
        let assignment: Assignment = HashMap::new();
        let witness = Witness::from_assignment(&assignment);
        assert!(!witness.has_bindings());
        assert_eq!(witness.to_string(), "<no bindings>");
    }
}
