//! claimdesk-backend: the hosted Supabase project as a [`Backend`]
//!
//! [`Backend`]: claimdesk_core::Backend

pub mod supabase;

pub use supabase::{SupabaseClient, UPSERT_PREFER};
