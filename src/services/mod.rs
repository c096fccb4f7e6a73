// Service exports
pub mod cache;
pub mod feed;
pub mod supabase;

pub use cache::{CacheStats, ProfileCache};
pub use feed::{CandidateFeed, FeedError};
pub use supabase::{token_expiry, SupabaseClient, SupabaseError, SupabaseTables};
