use tokio::time::Instant;

pub struct Entry {
    pub value: String,
    pub expires_at: Instant,
}

impl Entry {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
