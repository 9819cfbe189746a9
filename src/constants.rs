pub mod paging {

    /// Rows per page when the caller does not pick a size.
    pub const DEFAULT_PAGE_SIZE: u64 = 20;
}

pub mod display {

    /// Child rows printed per section before the rest is elided.
    pub const MAX_CHILD_ROWS: usize = 10;
}
