// Background jobs

pub mod premium_expiry;
