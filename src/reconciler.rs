use std::collections::{HashMap, VecDeque};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{ReconcileError, Result};
use crate::models::{
    year_month, CanonicalColumn, MatchTier, Origin, ReconciledRecord, Transaction, TransactionSet,
};

const REQUIRED_DETAIL: &[CanonicalColumn] = &[
    CanonicalColumn::TransactionDate,
    CanonicalColumn::PostDate,
    CanonicalColumn::Description,
    CanonicalColumn::Amount,
];

const REQUIRED_AGGREGATOR: &[CanonicalColumn] = &[
    CanonicalColumn::TransactionDate,
    CanonicalColumn::PostDate,
    CanonicalColumn::Description,
    CanonicalColumn::Amount,
    CanonicalColumn::Account,
    CanonicalColumn::Category,
    CanonicalColumn::Tags,
];

fn require(set: &TransactionSet, role: &str, required: &[CanonicalColumn]) -> Result<()> {
    let missing = set.missing_columns(required);
    if missing.is_empty() {
        return Ok(());
    }
    let labels: Vec<&str> = missing.iter().map(|c| c.label()).collect();
    Err(ReconcileError::ReconciliationInputInvalid(format!(
        "{role} set '{}' is missing required columns: {}",
        set.name,
        labels.join(", ")
    )))
}

// ---------------------------------------------------------------------------
// Availability pool
// ---------------------------------------------------------------------------

type PoolKey = (NaiveDate, Decimal);

/// Aggregator rows not yet consumed, indexed by both tier keys. Each index
/// keeps row positions in original order so duplicates are consumed first
/// come, first served.
struct Pool<'a> {
    rows: &'a [Transaction],
    available: Vec<bool>,
    by_post: HashMap<PoolKey, VecDeque<usize>>,
    by_transaction: HashMap<PoolKey, VecDeque<usize>>,
}

impl<'a> Pool<'a> {
    fn new(rows: &'a [Transaction]) -> Self {
        let mut by_post: HashMap<PoolKey, VecDeque<usize>> = HashMap::new();
        let mut by_transaction: HashMap<PoolKey, VecDeque<usize>> = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            let amount = row.amount.normalize();
            if let Some(date) = row.post_date {
                by_post.entry((date, amount)).or_default().push_back(i);
            }
            if let Some(date) = row.transaction_date {
                by_transaction.entry((date, amount)).or_default().push_back(i);
            }
        }
        Self {
            rows,
            available: vec![true; rows.len()],
            by_post,
            by_transaction,
        }
    }

    /// Consume the first available aggregator row sharing `detail`'s key for
    /// the given tier.
    fn take(&mut self, tier: MatchTier, detail: &Transaction) -> Option<usize> {
        let (index, date) = match tier {
            MatchTier::PostDate => (&mut self.by_post, detail.post_date),
            MatchTier::TransactionDate => (&mut self.by_transaction, detail.transaction_date),
            MatchTier::Unmatched => return None,
        };
        let queue = index.get_mut(&(date?, detail.amount.normalize()))?;
        while let Some(i) = queue.pop_front() {
            if self.available[i] {
                self.available[i] = false;
                return Some(i);
            }
        }
        None
    }

    fn remaining(&self) -> impl Iterator<Item = &'a Transaction> + '_ {
        self.rows
            .iter()
            .zip(&self.available)
            .filter(|(_, available)| **available)
            .map(|(row, _)| row)
    }
}

// ---------------------------------------------------------------------------
// Output rows
// ---------------------------------------------------------------------------

fn matched_record(tier: MatchTier, detail: &Transaction, aggregator: &Transaction) -> ReconciledRecord {
    let date = match tier {
        MatchTier::PostDate => detail.post_date,
        _ => detail.transaction_date,
    };
    ReconciledRecord {
        date,
        year_month: year_month(date),
        account: aggregator.account.clone(),
        description: detail.description.clone(),
        category: aggregator.category.clone(),
        tags: aggregator.tags.clone(),
        amount: detail.amount,
        reconciled_key: tier.key(date, detail.amount),
        matched: true,
        origin: Origin::Matched,
        source_file: detail.source_file.clone(),
    }
}

fn unmatched_record(txn: &Transaction, origin: Origin) -> ReconciledRecord {
    let date = txn.transaction_date.or(txn.post_date);
    let carries_metadata = origin == Origin::UnmatchedAggregator;
    let metadata = |value: &String| {
        if carries_metadata {
            value.clone()
        } else {
            String::new()
        }
    };
    ReconciledRecord {
        date,
        year_month: year_month(date),
        account: metadata(&txn.account),
        description: txn.description.clone(),
        category: metadata(&txn.category),
        tags: metadata(&txn.tags),
        amount: txn.amount,
        reconciled_key: MatchTier::Unmatched.key(date, txn.amount),
        matched: false,
        origin,
        source_file: txn.source_file.clone(),
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Result of one reconciliation pass: matched rows first (in detail order),
/// then unmatched detail rows, then unconsumed aggregator rows.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    records: Vec<ReconciledRecord>,
    matched: usize,
    unmatched_detail: usize,
    unmatched_aggregator: usize,
}

impl Reconciliation {
    pub fn records(&self) -> &[ReconciledRecord] {
        &self.records
    }

    pub fn matched(&self) -> usize {
        self.matched
    }

    pub fn unmatched_detail(&self) -> usize {
        self.unmatched_detail
    }

    pub fn unmatched_aggregator(&self) -> usize {
        self.unmatched_aggregator
    }

    pub fn by_origin(&self, origin: Origin) -> impl Iterator<Item = &ReconciledRecord> {
        self.records.iter().filter(move |r| r.origin == origin)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Match detail rows against the aggregator ledger.
///
/// Per detail set, every row first tries (Post Date, Amount); rows left over
/// then try (Transaction Date, Amount). A matched aggregator row is consumed
/// and can never match again. Detail sets share one pool and are processed
/// in the order given.
pub fn reconcile(aggregator: &TransactionSet, details: &[TransactionSet]) -> Result<Reconciliation> {
    require(aggregator, "aggregator", REQUIRED_AGGREGATOR)?;
    for set in details {
        require(set, "detail", REQUIRED_DETAIL)?;
    }

    let mut pool = Pool::new(&aggregator.transactions);
    let mut matched = Vec::new();
    let mut unmatched_detail = Vec::new();

    for set in details {
        let mut partners: Vec<Option<(MatchTier, usize)>> = vec![None; set.len()];
        for tier in [MatchTier::PostDate, MatchTier::TransactionDate] {
            for (slot, detail) in partners.iter_mut().zip(&set.transactions) {
                if slot.is_none() {
                    *slot = pool.take(tier, detail).map(|i| (tier, i));
                }
            }
        }

        let before = matched.len();
        for (detail, partner) in set.transactions.iter().zip(partners) {
            match partner {
                Some((tier, i)) => {
                    matched.push(matched_record(tier, detail, &aggregator.transactions[i]));
                }
                None => unmatched_detail.push(unmatched_record(detail, Origin::UnmatchedDetail)),
            }
        }
        tracing::debug!(
            "{}: {} of {} rows matched",
            set.name,
            matched.len() - before,
            set.len()
        );
    }

    let unmatched_aggregator: Vec<ReconciledRecord> = pool
        .remaining()
        .map(|t| unmatched_record(t, Origin::UnmatchedAggregator))
        .collect();

    let (m, ud, ua) = (matched.len(), unmatched_detail.len(), unmatched_aggregator.len());
    tracing::info!("Reconciled: {m} matched, {ud} unmatched detail, {ua} unmatched aggregator");

    let mut records = matched;
    records.extend(unmatched_detail);
    records.extend(unmatched_aggregator);

    Ok(Reconciliation {
        records,
        matched: m,
        unmatched_detail: ud,
        unmatched_aggregator: ua,
    })
}
