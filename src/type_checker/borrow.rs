use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default)]
struct Counts {
    shared: usize,
    mutable: usize,
}

#[derive(Debug)]
struct Loan {
    target: String,
    mutable: bool,
}

/// Tracks active borrows while checking a single function body.
///
/// Borrows are lexical: each scope records the bindings declared in it so
/// their loans are released when the scope exits. Per-target counters catch
/// shared/mutable conflicts, and a binding-to-loan map lets reassignment or
/// shadowing release the previous loan deterministically.
#[derive(Debug, Default)]
pub struct BorrowTracker {
    scope_stack: Vec<Vec<String>>,
    borrow_counts: HashMap<String, Counts>,
    binding_borrows: HashMap<String, Loan>,
}

pub type BorrowCheck = Result<(), String>;

impl BorrowTracker {
    pub fn new() -> Self {
        BorrowTracker::default()
    }

    pub fn enter_scope(&mut self) {
        self.scope_stack.push(Vec::new());
    }

    pub fn exit_scope(&mut self) {
        if let Some(bindings) = self.scope_stack.pop() {
            for binding in bindings.iter().rev() {
                self.release_binding(binding);
            }
        }
    }

    /// Records that `binding` holds a borrow of `target`, e.g. `let r = &x;`
    /// records ("r", "x", false). Any loan the binding previously held is
    /// released first.
    pub fn record_borrow(&mut self, binding: &str, target: &str, mutable: bool) {
        self.release_binding(binding);
        let counts = self.borrow_counts.entry(target.to_string()).or_default();
        if mutable {
            counts.mutable += 1;
        } else {
            counts.shared += 1;
        }
        self.binding_borrows.insert(
            binding.to_string(),
            Loan {
                target: target.to_string(),
                mutable,
            },
        );
        if let Some(scope) = self.scope_stack.last_mut() {
            scope.push(binding.to_string());
        }
    }

    pub fn release_binding(&mut self, binding: &str) {
        let loan = match self.binding_borrows.remove(binding) {
            Some(loan) => loan,
            None => return,
        };
        let remove = match self.borrow_counts.get_mut(&loan.target) {
            Some(counts) => {
                if loan.mutable {
                    counts.mutable = counts.mutable.saturating_sub(1);
                } else {
                    counts.shared = counts.shared.saturating_sub(1);
                }
                counts.shared == 0 && counts.mutable == 0
            }
            None => return,
        };
        if remove {
            self.borrow_counts.remove(&loan.target);
        }
    }

    pub fn validate_borrow(&self, target: &str, mutable: bool) -> BorrowCheck {
        let counts = match self.borrow_counts.get(target) {
            Some(counts) => counts,
            None => return Ok(()),
        };
        if mutable {
            if counts.shared > 0 || counts.mutable > 0 {
                return Err(format!(
                    "Cannot take mutable borrow of '{}' because it is already borrowed",
                    target
                ));
            }
            return Ok(());
        }
        if counts.mutable > 0 {
            return Err(format!(
                "Cannot take shared borrow of '{}' while a mutable borrow is active",
                target
            ));
        }
        Ok(())
    }

    pub fn validate_move(&self, target: &str) -> BorrowCheck {
        if self.has_active_borrow(target) {
            return Err(format!("Cannot move '{}' while it is borrowed", target));
        }
        Ok(())
    }

    pub fn validate_assignment(&self, target: &str) -> BorrowCheck {
        if self.has_active_borrow(target) {
            return Err(format!("Cannot assign to '{}' while it is borrowed", target));
        }
        Ok(())
    }

    fn has_active_borrow(&self, target: &str) -> bool {
        self.borrow_counts
            .get(target)
            .map_or(false, |counts| counts.shared > 0 || counts.mutable > 0)
    }
}
