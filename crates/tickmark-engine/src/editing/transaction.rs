//! Batched edits against a [`Document`].
//!
//! A builder queues operations and callbacks on a [`Transaction`]; the
//! outermost [`Document::run`] then applies them as one batch. Anything that
//! calls `run` while a transaction is active (an op, a callback, a nested
//! helper) joins that transaction instead of starting another one.
//!
//! ```rust
//! use tickmark_engine::editing::{Cmd, Document};
//! use tickmark_engine::position::{Position, Range};
//!
//! let mut doc = Document::from_text("- □ a\n");
//! doc.run(
//!     Range::default(),
//!     |tx| {
//!         tx.apply(Cmd::InsertText {
//!             at: Position::new(1, 0),
//!             text: "- □ b\n".to_string(),
//!         });
//!     },
//!     |_| {},
//! )
//! .unwrap();
//! assert_eq!(doc.text(), "- □ a\n- □ b\n");
//! assert!(!doc.is_transaction_active());
//! ```

use std::collections::VecDeque;
use std::fmt;

use crate::editing::{Cmd, Document};
use crate::error::{EditError, TransactionError};
use crate::position::Range;

type Op = Box<dyn FnOnce(&mut Document) -> Result<(), EditError>>;
type Callback = Box<dyn FnOnce(&mut Document)>;

/// Queued work for one batch.
pub struct Transaction {
    anchor: Range,
    ops: VecDeque<Op>,
    callbacks: VecDeque<Callback>,
    on_complete: Vec<Callback>,
}

impl Transaction {
    fn new(anchor: Range) -> Self {
        Self {
            anchor,
            ops: VecDeque::new(),
            callbacks: VecDeque::new(),
            on_complete: Vec::new(),
        }
    }

    /// The region this transaction is about; re-entrant calls widen it.
    pub fn anchor(&self) -> Range {
        self.anchor
    }

    pub fn add_op<F>(&mut self, op: F)
    where
        F: FnOnce(&mut Document) -> Result<(), EditError> + 'static,
    {
        self.ops.push_back(Box::new(op));
    }

    pub fn apply(&mut self, cmd: Cmd) {
        self.add_op(move |doc| doc.apply(cmd).map(|_| ()));
    }

    pub fn set_text(&mut self, range: Range, lines: Vec<String>) {
        self.apply(Cmd::SetText { range, lines });
    }

    /// Runs after every op queued before it has been applied.
    pub fn add_cb<F>(&mut self, cb: F)
    where
        F: FnOnce(&mut Document) + 'static,
    {
        self.callbacks.push_back(Box::new(cb));
    }

    /// Lets another builder queue into this transaction.
    pub fn run(&mut self, builder: impl FnOnce(&mut Transaction)) {
        builder(self);
    }

    pub fn pending_ops(&self) -> usize {
        self.ops.len()
    }

    fn widen(&mut self, anchor: Range) {
        self.anchor = Range::new(
            self.anchor.start.min(anchor.start),
            self.anchor.end.max(anchor.end),
        );
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("anchor", &self.anchor)
            .field("ops", &self.ops.len())
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl Document {
    pub fn is_transaction_active(&self) -> bool {
        self.transaction.is_some()
    }

    /// Queues edits through `builder` and applies them as one batch.
    ///
    /// Ops run first in FIFO order, then callbacks in FIFO order; ops queued
    /// by callbacks are applied in a further round. `on_complete` runs once
    /// the transaction has been cleared. When a transaction is already active
    /// the builder only queues and `on_complete` waits for the outer batch.
    ///
    /// A failing op stops the batch: later ops and all callbacks are dropped,
    /// earlier ops stay applied, completion handlers are skipped.
    pub fn run<B, C>(&mut self, anchor: Range, builder: B, on_complete: C) -> Result<(), TransactionError>
    where
        B: FnOnce(&mut Transaction),
        C: FnOnce(&mut Document) + 'static,
    {
        if let Some(active) = self.transaction.as_mut() {
            active.widen(anchor);
            builder(active);
            active.on_complete.push(Box::new(on_complete));
            return Ok(());
        }

        let mut tx = Transaction::new(anchor);
        builder(&mut tx);
        tx.on_complete.push(Box::new(on_complete));
        self.transaction = Some(tx);

        let result = self.drain();
        let finished = self.transaction.take();

        match result {
            Ok(applied) => {
                log::debug!("transaction applied {applied} ops at {anchor}");
                for done in finished.into_iter().flat_map(|tx| tx.on_complete) {
                    done(self);
                }
                Ok(())
            }
            Err(e) => {
                log::warn!("{e}");
                Err(e)
            }
        }
    }

    /// Applies queued work until nothing is left. Returns the op count.
    fn drain(&mut self) -> Result<usize, TransactionError> {
        let mut index = 0;
        loop {
            while let Some(op) = self.transaction.as_mut().and_then(|tx| tx.ops.pop_front()) {
                op(self).map_err(|source| TransactionError::OperationFailed { index, source })?;
                index += 1;
            }

            let callbacks = self
                .transaction
                .as_mut()
                .map(|tx| std::mem::take(&mut tx.callbacks))
                .unwrap_or_default();
            if callbacks.is_empty() {
                return Ok(index);
            }
            for cb in callbacks {
                cb(self);
            }
        }
    }
}
