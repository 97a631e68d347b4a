use ballot_core::VoteService;
use ballot_core::results::DEFAULT_LEADERBOARD_SIZE;

/// Largest `limit` accepted by `/hall_of_fame`.
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

/// Shared handler state. Cloning is cheap; the service is reference counted.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: VoteService,
    /// Leaderboard size used when `/hall_of_fame` gets no `limit`.
    pub leaderboard_size: usize,
}

impl AppState {
    #[must_use]
    pub const fn new(service: VoteService) -> Self {
        Self {
            service,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }

    /// Override the default leaderboard size, clamped to `1..=100`.
    #[must_use]
    pub fn with_leaderboard_size(mut self, size: usize) -> Self {
        self.leaderboard_size = size.clamp(1, MAX_LEADERBOARD_LIMIT);
        self
    }
}
