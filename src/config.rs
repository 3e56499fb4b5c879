// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

use crate::constants::{config as env_keys, limits};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub log_level: String,
    pub log_format: String, // "json" or "text"
    pub bind_addr: String,
    pub max_body_bytes: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            log_level: env::var(env_keys::ENV_LOG_LEVEL).unwrap_or_else(|_| "info".to_string()),
            log_format: env::var(env_keys::ENV_LOG_FORMAT).unwrap_or_else(|_| "text".to_string()),
            bind_addr: env::var(env_keys::ENV_BIND_ADDR)
                .unwrap_or_else(|_| "127.0.0.1:8545".to_string()),
            max_body_bytes: match env::var(env_keys::ENV_MAX_BODY_BYTES) {
                Ok(raw) => raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    var: env_keys::ENV_MAX_BODY_BYTES,
                    value: raw,
                    reason: e.to_string(),
                })?,
                Err(_) => limits::MAX_BODY_SIZE_BYTES,
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            bind_addr: "127.0.0.1:8545".to_string(),
            max_body_bytes: limits::MAX_BODY_SIZE_BYTES,
        }
    }
}
