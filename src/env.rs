use std::{cell::Cell, collections::HashMap};

use crate::{
    errors::JSONPathError,
    function::MethodRegister,
    node::NodeList,
    standard_functions::{
        Contains, EndsWith, Match, Round, Rounding, StartsWith, ToLowerCase, ToUpperCase, TypeOf,
    },
    Query,
};

pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 100;

/// Methods available to filter predicates, and evaluation limits.
pub struct Environment {
    pub method_register: MethodRegister,
    pub max_recursion_depth: usize,
}

impl Environment {
    pub fn new() -> Self {
        let mut method_register: MethodRegister = HashMap::new();
        method_register.insert("contains".to_string(), Box::new(Contains::new()));
        method_register.insert("includes".to_string(), Box::new(Contains::new()));
        method_register.insert("startsWith".to_string(), Box::new(StartsWith::new()));
        method_register.insert("endsWith".to_string(), Box::new(EndsWith::new()));
        method_register.insert("match".to_string(), Box::new(Match::new()));
        method_register.insert("test".to_string(), Box::new(Match::new()));
        method_register.insert("toLowerCase".to_string(), Box::new(ToLowerCase::new()));
        method_register.insert("toUpperCase".to_string(), Box::new(ToUpperCase::new()));
        method_register.insert("typeof".to_string(), Box::new(TypeOf::new()));
        method_register.insert("floor".to_string(), Box::new(Round::new(Rounding::Floor)));
        method_register.insert("round".to_string(), Box::new(Round::new(Rounding::Round)));
        method_register.insert("ceil".to_string(), Box::new(Round::new(Rounding::Ceil)));

        Self {
            method_register,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
        }
    }

    pub fn with_max_recursion_depth(mut self, max_depth: usize) -> Self {
        self.max_recursion_depth = max_depth;
        self
    }

    /// A fresh recursion budget for one evaluation.
    pub fn budget(&self) -> Budget {
        Budget::new(self.max_recursion_depth)
    }

    pub fn find<'a>(
        &self,
        expr: &str,
        value: &'a serde_json::Value,
    ) -> Result<NodeList<'a>, JSONPathError> {
        let query = Query::new(expr)?;
        query.find(value, self)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts nested recursive descents and nested filter evaluations.
#[derive(Debug)]
pub struct Budget {
    depth: Cell<usize>,
    max_depth: usize,
}

impl Budget {
    pub fn new(max_depth: usize) -> Self {
        Budget {
            depth: Cell::new(0),
            max_depth,
        }
    }

    /// Go one level deeper. The level is released when the returned guard
    /// is dropped.
    pub fn enter(&self) -> Result<BudgetGuard<'_>, JSONPathError> {
        let depth = self.depth.get() + 1;
        if depth > self.max_depth {
            return Err(JSONPathError::limit(format!(
                "maximum recursion depth of {} exceeded",
                self.max_depth
            )));
        }
        self.depth.set(depth);
        Ok(BudgetGuard { budget: self })
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }
}

pub struct BudgetGuard<'b> {
    budget: &'b Budget,
}

impl Drop for BudgetGuard<'_> {
    fn drop(&mut self) {
        self.budget.depth.set(self.budget.depth.get() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_guard_releases_depth() {
        let budget = Budget::new(2);
        {
            let _a = budget.enter().unwrap();
            let _b = budget.enter().unwrap();
            assert_eq!(budget.depth(), 2);
            assert!(budget.enter().is_err());
        }
        assert_eq!(budget.depth(), 0);
        assert!(budget.enter().is_ok());
    }

    #[test]
    fn standard_methods_are_registered() {
        let env = Environment::new();
        for name in ["contains", "includes", "match", "test", "typeof", "round"] {
            assert!(env.method_register.contains_key(name), "{}", name);
        }
    }
}
