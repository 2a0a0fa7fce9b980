/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger is empty")]
    EmptyLedger,

    #[error("append out of order: {over}.{ball} follows {tail_over}.{tail_ball}")]
    OutOfOrder {
        over: u32,
        ball: u32,
        tail_over: u32,
        tail_ball: u32,
    },

    #[error("invalid ledger position {requested}; ledger holds {len} balls")]
    InvalidPosition { requested: usize, len: usize },
}
