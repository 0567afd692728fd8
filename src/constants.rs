//! # System Constants
//!
//! Limits imposed by the queue and workflow services.

/// Queue receive limits
pub mod queue {
    /// Smallest batch a receive call may request
    pub const MIN_BATCH_SIZE: u32 = 1;

    /// Largest batch a receive call may request
    pub const MAX_BATCH_SIZE: u32 = 10;

    /// Upper bound on long-poll wait time
    pub const MAX_WAIT_TIME_SECONDS: u32 = 20;

    /// pgmq queue names become table suffixes (`pgmq.q_<name>`)
    pub const MAX_QUEUE_NAME_LENGTH: usize = 47;
}

/// Telemetry freshness policy
pub mod filter {
    /// Largest tolerated producer clock lead (one hour)
    pub const MAX_CLOCK_SKEW_MS: u64 = 3_600_000;
}

/// Workflow execution naming
pub mod execution {
    use uuid::Uuid;

    pub const NAME_PREFIX: &str = "exec-";

    /// Workflow services reject longer execution names
    pub const MAX_NAME_LENGTH: usize = 80;

    /// Namespace for hashed execution names. Changing it changes every hashed
    /// key, which breaks deduplication of in-flight redeliveries.
    pub const NAME_NAMESPACE: Uuid = Uuid::from_u128(0x6b1f_2c3e_8d47_4a09_9e15_c2d8_40f7_a3b1);
}

/// Environment variable names read outside the layered configuration
pub mod env {
    /// Path to the TOML configuration file
    pub const CONFIG_PATH: &str = "TELEMETRY_DISPATCH_CONFIG";

    /// Prefix for configuration overrides (`TELEMETRY_DISPATCH__QUEUE__BATCH_SIZE`)
    pub const CONFIG_PREFIX: &str = "TELEMETRY_DISPATCH";

    /// Deployment environment name used to pick the default log level
    pub const ENVIRONMENT: &str = "TELEMETRY_DISPATCH_ENV";
}
