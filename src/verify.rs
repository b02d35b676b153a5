//! Independent verification of a presented chain.
//!
//! Certificates are processed from the outermost one toward the leaf. Each
//! step checks the signature against the next certificate up the chain, runs
//! a self-signature test, and builds trust paths against the anchors known so
//! far: the system store for the outermost certificate, and the certificates
//! already processed for every other one. The evaluated certificate then joins
//! the pool whatever its own outcome.

use crate::chain::PresentedChain;
use crate::path::{build_paths, PathError, PathOptions, ValidatedPath};
use crate::pool::CertPool;
use crate::types::{AnchorTier, ReportVerdict, TriState, VerificationOutcome};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Name the leaf must be valid for.
    pub hostname: Option<String>,
    /// Evaluation time; defaults to the current time.
    pub now: Option<DateTime<Utc>>,
}

impl VerifyOptions {
    pub fn for_host(hostname: impl Into<String>) -> Self {
        Self {
            hostname: Some(hostname.into()),
            now: None,
        }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateStep {
    /// Position in the presented chain.
    pub index: usize,
    pub outcome: VerificationOutcome,
    pub failure: Option<PathError>,
    pub path_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    /// Outermost certificate first, leaf last.
    pub steps: Vec<CertificateStep>,
    pub verdict: ReportVerdict,
    /// Where the first same-length path diverged from the presented order.
    pub first_order_mismatch: Option<usize>,
}

impl ChainReport {
    pub fn step(&self, index: usize) -> Option<&CertificateStep> {
        self.steps.iter().find(|step| step.index == index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderJudgement {
    pub in_order: bool,
    pub first_mismatch: Option<usize>,
}

/// Whether some path of the chain's length reproduces the presented order.
///
/// Having no path of that length at all counts as out of order.
pub fn judge_order(chain: &PresentedChain, paths: &[ValidatedPath<'_>]) -> OrderJudgement {
    let mut first_mismatch = None;

    for path in paths.iter().filter(|path| path.len() == chain.len()) {
        match path.first_mismatch(chain) {
            None => {
                return OrderJudgement {
                    in_order: true,
                    first_mismatch: None,
                }
            }
            Some(position) => {
                log::debug!("Validated path diverges from presented order at {}", position);
                first_mismatch.get_or_insert(position);
            }
        }
    }

    OrderJudgement {
        in_order: false,
        first_mismatch,
    }
}

/// Whole days from `now` until `not_after`, truncated toward zero.
pub fn days_remaining(not_after: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (not_after - now).num_hours() / 24
}

pub struct ChainVerifier<'s> {
    system_store: &'s CertPool,
    options: VerifyOptions,
}

impl<'s> ChainVerifier<'s> {
    pub fn new(system_store: &'s CertPool, options: VerifyOptions) -> Self {
        Self {
            system_store,
            options,
        }
    }

    pub fn verify(&self, chain: &PresentedChain) -> ChainReport {
        let now = self.options.now.unwrap_or_else(Utc::now);
        let outermost = chain.outermost_index();

        let mut pool = CertPool::new();
        let mut rollup = Rollup::default();
        let mut order = OrderJudgement::default();
        let mut steps = Vec::with_capacity(chain.len());

        for index in (0..chain.len()).rev() {
            let cert = &chain[index];
            let is_leaf = index == 0;
            let mut outcome = VerificationOutcome::default();

            if index != outermost {
                outcome.signed_by_parent = cert.verified_by(&chain[index + 1]).into();
                outcome.self_signed = cert.is_self_signed();
            }

            let (anchors, tier) = if index == outermost {
                (self.system_store, AnchorTier::SystemStore)
            } else {
                (&pool, AnchorTier::PresentedPool)
            };
            outcome.tier = tier;

            let path_options = PathOptions {
                dns_name: if is_leaf {
                    self.options.hostname.as_deref()
                } else {
                    None
                },
                now,
            };

            let (failure, path_count) = match build_paths(cert, anchors, &path_options) {
                Ok(paths) => {
                    if is_leaf {
                        order = judge_order(chain, &paths);
                    }
                    (None, paths.len())
                }
                Err(e) => (Some(e), 0),
            };
            outcome.verify_result = TriState::from(failure.is_none());

            log::debug!(
                "Certificate {} ({}): parent={:?} self={} verify={:?} against {}",
                index,
                cert.subject(),
                outcome.signed_by_parent,
                outcome.self_signed,
                outcome.verify_result,
                tier.name()
            );

            rollup.record(&outcome, is_leaf);
            steps.push(CertificateStep {
                index,
                outcome,
                failure,
                path_count,
            });
            pool.add(cert.clone());
        }

        let is_chain_validated = rollup.chain_validated().and(order.in_order.into());
        let verdict = ReportVerdict {
            is_root_known_cert: rollup.root_known,
            is_chain_validated,
            is_validated: rollup.root_known.and(is_chain_validated),
            is_selfsigned: rollup.self_signed,
            is_chain_in_order: order.in_order,
            not_after_in_days: days_remaining(chain.leaf().not_after(), now),
        };

        ChainReport {
            steps,
            verdict,
            first_order_mismatch: order.first_mismatch,
        }
    }
}

/// Running totals folded from each step.
#[derive(Debug, Default)]
struct Rollup {
    root_known: TriState,
    seen_success: bool,
    seen_failure: bool,
    self_signed: bool,
}

impl Rollup {
    fn record(&mut self, outcome: &VerificationOutcome, is_leaf: bool) {
        if outcome.signed_by_parent == TriState::False {
            self.seen_failure = true;
        }
        if outcome.self_signed {
            self.self_signed = true;
        }

        match outcome.verify_result {
            TriState::True => {
                self.seen_success = true;
                if !is_leaf
                    && outcome.is_trust_anchor_step()
                    && self.root_known == TriState::Unknown
                {
                    self.root_known = TriState::True;
                }
            }
            TriState::False => {
                self.seen_failure = true;
                if !is_leaf {
                    self.root_known = TriState::False;
                }
            }
            TriState::Unknown => {}
        }
    }

    /// A single failure anywhere outweighs any number of successes.
    fn chain_validated(&self) -> TriState {
        if self.seen_failure {
            TriState::False
        } else if self.seen_success {
            TriState::True
        } else {
            TriState::Unknown
        }
    }
}
