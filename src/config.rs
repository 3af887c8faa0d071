use std::env;
use dotenvy::dotenv;

use crate::domain::calendar::{DayCountMode, LeavePolicy};

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_decision_per_min: u32,

    pub api_prefix: String,

    // Leave day counting
    pub leave_day_count: DayCountMode,
    pub exclude_weekends: bool,

    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),

            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .expect("RATE_PROTECTED_PER_MIN must be a number"),
            rate_decision_per_min: env::var("RATE_DECISION_PER_MIN")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .expect("RATE_DECISION_PER_MIN must be a number"),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            leave_day_count: env::var("LEAVE_DAY_COUNT")
                .unwrap_or_else(|_| "working".to_string())
                .parse()
                .expect("LEAVE_DAY_COUNT must be `working` or `calendar`"),
            exclude_weekends: env::var("EXCLUDE_WEEKENDS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .expect("EXCLUDE_WEEKENDS must be true or false"),

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        }
    }

    pub fn leave_policy(&self) -> LeavePolicy {
        LeavePolicy {
            mode: self.leave_day_count,
            exclude_weekends: self.exclude_weekends,
        }
    }
}
