/// Source of fresh entity ids for a store.
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// `<prefix>-<n>` ids from a monotonic counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new<P: Into<String>>(prefix: P) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }

    /// Continues numbering after the highest `<prefix>-<n>` among `existing`.
    /// Ids in any other shape are ignored.
    pub fn resume<'a, P, I>(prefix: P, existing: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = &'a str>,
    {
        let prefix = prefix.into();
        let marker = format!("{prefix}-");
        let highest = existing
            .into_iter()
            .filter_map(|id| id.strip_prefix(marker.as_str()))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .max()
            .unwrap_or(0);

        Self {
            prefix,
            next: highest.saturating_add(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}
