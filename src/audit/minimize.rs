use crate::model::{Assertion, CandidateId};

/// An assertion together with every tail it has been chosen to rule out.
/// The same NEN can be the best audit for several nodes, and it may only be
/// dropped in favour of something that rules out all of them.
struct Claim {
    assertion: Assertion,
    tails: Vec<Vec<CandidateId>>,
}

impl Claim {
    fn new(assertion: Assertion) -> Self {
        let tails = assertion.rules_out.iter().cloned().collect();
        Self { assertion, tails }
    }

    /// Does `other` rule out every tail this claim stands for?
    fn subsumed_by(&self, other: &Assertion) -> bool {
        if self.tails.is_empty() {
            return other.subsumes_for(&self.assertion, None);
        }
        self.tails
            .iter()
            .all(|tail| other.subsumes_for(&self.assertion, Some(tail)))
    }
}

/// Merge assertions that make the same claim. The first copy is kept, and
/// takes on the tails of the others.
fn dedupe(assertions: Vec<Assertion>) -> Vec<Claim> {
    let mut claims: Vec<Claim> = Vec::with_capacity(assertions.len());
    for assertion in assertions {
        match claims.iter_mut().find(|claim| claim.assertion.same_as(&assertion)) {
            Some(claim) => claim.tails.extend(assertion.rules_out),
            None => claims.push(Claim::new(assertion)),
        }
    }
    claims
}

/// Drop duplicates, then every assertion that some other surviving assertion
/// subsumes.
///
/// Assertions are considered in order, so where two subsume each other the
/// later one is kept, and inherits the tails of the one dropped.
pub fn minimize(assertions: Vec<Assertion>) -> Vec<Assertion> {
    let mut claims = dedupe(assertions);
    let mut dropped = vec![false; claims.len()];
    for i in 0..claims.len() {
        let subsumer = (0..claims.len())
            .find(|&j| j != i && !dropped[j] && claims[i].subsumed_by(&claims[j].assertion));
        if let Some(j) = subsumer {
            debug!(
                "Dropping {} as {} already rules out its outcomes",
                claims[i].assertion, claims[j].assertion
            );
            dropped[i] = true;
            if !claims[j].assertion.is_neb() {
                let tails = std::mem::take(&mut claims[i].tails);
                claims[j].tails.extend(tails);
            }
        }
    }
    claims
        .into_iter()
        .zip(dropped)
        .filter_map(|(claim, dropped)| (!dropped).then_some(claim.assertion))
        .collect()
}
