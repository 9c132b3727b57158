//! Transaction-State Gate: a weighted-owner confirmation ledger consulted
//! once before evaluation. See spec §3 "Transaction-State" / §4.G.

use std::collections::HashMap;

use crate::error::EngineError;

const MAX_OWNERS: usize = 250;

/// Weighted-owner confirmation predicate. `is_confirmed()` holds iff the
/// summed weight of confirmed owners is at least `min_score`.
#[derive(Debug, Clone)]
pub struct TransactionGate {
    weights: HashMap<String, u32>,
    confirmed: HashMap<String, bool>,
    min_score: u32,
    /// `true` once the caller has explicitly set a min score, so the
    /// default formula stops recomputing on every `add_owner`.
    min_score_explicit: bool,
}

impl TransactionGate {
    pub fn new() -> Self {
        TransactionGate {
            weights: HashMap::new(),
            confirmed: HashMap::new(),
            min_score: 0,
            min_score_explicit: false,
        }
    }

    /// Add an owner with the given weight (default 1). Fails with
    /// [`EngineError::Permission`] if the id is empty or owner count would
    /// exceed 250.
    pub fn add_owner(&mut self, id: impl Into<String>, weight: u32) -> Result<(), EngineError> {
        let id = id.into();
        if id.is_empty() {
            return Err(EngineError::permission("owner id must not be empty"));
        }
        if !self.weights.contains_key(&id) && self.weights.len() >= MAX_OWNERS {
            return Err(EngineError::permission(format!(
                "owner count would exceed the {MAX_OWNERS} limit"
            )));
        }
        self.weights.insert(id.clone(), weight);
        self.confirmed.entry(id).or_insert(false);
        if !self.min_score_explicit {
            self.min_score = self.default_min_score();
        }
        Ok(())
    }

    pub fn remove_owner(&mut self, id: &str) -> Result<(), EngineError> {
        self.require_known(id)?;
        self.weights.remove(id);
        self.confirmed.remove(id);
        if !self.min_score_explicit {
            self.min_score = self.default_min_score();
        }
        Ok(())
    }

    pub fn confirm(&mut self, id: &str) -> Result<(), EngineError> {
        self.require_known(id)?;
        self.confirmed.insert(id.to_string(), true);
        Ok(())
    }

    pub fn revoke(&mut self, id: &str) -> Result<(), EngineError> {
        self.require_known(id)?;
        self.confirmed.insert(id.to_string(), false);
        Ok(())
    }

    /// Reset every owner's confirmation to `false`. Called unconditionally
    /// after every `validate` (spec §8 "Gate clear").
    pub fn revoke_all(&mut self) {
        for confirmed in self.confirmed.values_mut() {
            *confirmed = false;
        }
    }

    /// Requires `n >= 1`.
    pub fn set_min_score(&mut self, n: u32) -> Result<(), EngineError> {
        if n < 1 {
            return Err(EngineError::permission("min_score must be at least 1"));
        }
        self.min_score = n;
        self.min_score_explicit = true;
        Ok(())
    }

    pub fn current_score(&self) -> u32 {
        self.confirmed
            .iter()
            .filter(|(_, confirmed)| **confirmed)
            .filter_map(|(id, _)| self.weights.get(id))
            .sum()
    }

    pub fn min_score(&self) -> u32 {
        self.min_score
    }

    pub fn is_confirmed(&self) -> bool {
        self.current_score() >= self.min_score
    }

    fn default_min_score(&self) -> u32 {
        // floor(|owners| / 2), per spec §3.
        (self.weights.len() as u32) / 2
    }

    fn require_known(&self, id: &str) -> Result<(), EngineError> {
        if id.is_empty() || !self.weights.contains_key(id) {
            return Err(EngineError::permission(format!("unknown owner '{id}'")));
        }
        Ok(())
    }
}

impl Default for TransactionGate {
    fn default() -> Self {
        Self::new()
    }
}
